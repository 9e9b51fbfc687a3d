//! Broadcast engine
//!
//! Fans a payload out to every subscriber in a registry snapshot. Delivery
//! failures are isolated: the failing subscriber is dropped from the registry
//! by a detached task while the rest of the fan-out carries on.
//!
//! ```text
//!  ingress ──► Broadcaster::broadcast(payload)
//!                   │
//!                   ├─ registry.snapshot()            (read lock, released)
//!                   │
//!                   ├─ deliver(payload) ──► sub-1  ok
//!                   ├─ deliver(payload) ──► sub-2  err ──► spawn remove(sub-2) + close
//!                   └─ deliver(payload) ──► sub-3  ok
//! ```
//!
//! The payload is a `bytes::Bytes`, so every subscriber shares one allocation.

pub mod engine;

pub use engine::Broadcaster;
