//! Delivery error types
//!
//! Errors a subscriber adapter reports back from a delivery attempt.

use std::time::Duration;

/// Error type for a single delivery to a single subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber's transport is already closed
    Closed,
    /// The write did not complete within the adapter's deadline
    Timeout(Duration),
    /// The transport reported a write error
    Transport(String),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "Subscriber connection closed"),
            DeliveryError::Timeout(after) => {
                write!(f, "Delivery timed out after {}ms", after.as_millis())
            }
            DeliveryError::Transport(reason) => write!(f, "Transport error: {}", reason),
        }
    }
}

impl std::error::Error for DeliveryError {}
