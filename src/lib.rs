//! # event-relay
//!
//! A single-process message relay. Payloads POSTed to the ingress endpoint
//! are fanned out, unchanged, to every WebSocket subscriber connected at the
//! time of the broadcast.
//!
//! The interesting part is the [`registry`] (the concurrent set of live
//! subscribers) and the [`broadcast`] engine (snapshot, deliver, drop the
//! failures). The [`server`] module wires both to HTTP and WebSocket
//! transports with axum.
//!
//! ```no_run
//! use event_relay::{RelayServer, ServerConfig};
//!
//! # async fn run() -> event_relay::Result<()> {
//! let config = ServerConfig::default().bind("127.0.0.1:8000".parse().unwrap());
//! let server = RelayServer::new(config);
//! server.run_until(async { tokio::signal::ctrl_c().await.ok(); }).await
//! # }
//! ```
//!
//! Delivery is best-effort: a subscriber whose delivery fails is dropped and
//! has to reconnect. There is no persistence, replay or ordering across
//! subscribers.

pub mod broadcast;
pub mod error;
pub mod registry;
pub mod server;
pub mod stats;

pub use broadcast::Broadcaster;
pub use error::{Error, Result};
pub use registry::{DeliveryError, Subscriber, SubscriberId, SubscriberRegistry};
pub use server::{RelayServer, ServerConfig};
pub use stats::{RelayStats, StatsSnapshot};
