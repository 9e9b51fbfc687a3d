//! Subscriber registry for event fan-out
//!
//! The registry is the set of live subscriber connections. Adapters add a
//! subscriber when a connection is established and remove it when the peer
//! goes away; the broadcaster iterates point-in-time snapshots of it.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<SubscriberRegistry<S>>
//!                 ┌──────────────────────────────┐
//!                 │ RwLock<HashMap<              │
//!                 │   SubscriberId, Arc<S>       │
//!                 │ >>                           │
//!                 └──────┬─────────────┬─────────┘
//!             add/remove │             │ snapshot()
//!                (write) │             │ (read, copy Arcs, unlock)
//!                        │             ▼
//!            [Subscriber adapter]   [Broadcaster]
//!            connect / disconnect   deliver() to each member,
//!                                   spawn remove() on failure
//! ```
//!
//! # Lock discipline
//!
//! The write lock is only held for a single map insert or delete. A snapshot
//! holds the read lock just long enough to clone the `Arc` handles, so
//! deliveries (which may wait on slow sockets) never run under the lock.

pub mod error;
pub mod store;
pub mod subscriber;

#[cfg(test)]
pub(crate) mod mock;

pub use error::DeliveryError;
pub use store::SubscriberRegistry;
pub use subscriber::{Subscriber, SubscriberId};
