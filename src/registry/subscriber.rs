//! Subscriber identity and the delivery capability
//!
//! The core never looks inside a subscriber. It needs a stable identity for
//! set membership and a way to hand it a payload; everything else belongs to
//! the adapter that owns the transport.

use std::future::Future;

use bytes::Bytes;

use super::error::DeliveryError;

/// Unique identifier for a subscriber connection
///
/// Identities are never reused: a client that reconnects is a new subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Create a subscriber id from a raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SubscriberId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live outbound delivery channel
///
/// Implemented by transport adapters. `deliver` must be bounded by the
/// adapter (e.g. with a write deadline); a timeout surfaces as an `Err`.
pub trait Subscriber: Send + Sync + 'static {
    /// Identity used for registry membership
    fn id(&self) -> SubscriberId;

    /// Deliver one payload to this subscriber
    fn deliver(&self, payload: &Bytes) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Close the underlying transport
    ///
    /// Called by whoever removed the subscriber from the registry. Must be
    /// safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
