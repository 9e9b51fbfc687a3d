//! Relay server
//!
//! HTTP ingress and WebSocket subscriber adapters around one shared
//! registry and broadcaster.

pub mod config;
pub mod connection;
mod ingress;
pub mod listener;

pub use config::{parse_bind_addr, ServerConfig};
pub use connection::WsSubscriber;
pub use listener::RelayServer;
