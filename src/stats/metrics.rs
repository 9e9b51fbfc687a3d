//! Relay-wide counters
//!
//! Counters are updated from many tasks at once, so they are plain atomics
//! with relaxed ordering; `snapshot` gives a coherent-enough copy for logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live relay counters
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    payloads_received: AtomicU64,
    bytes_received: AtomicU64,
    deliveries: AtomicU64,
    delivery_failures: AtomicU64,
    subscribers_connected: AtomicU64,
    subscribers_disconnected: AtomicU64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            payloads_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            subscribers_connected: AtomicU64::new(0),
            subscribers_disconnected: AtomicU64::new(0),
        }
    }

    /// Record one payload accepted for broadcast
    pub fn record_payload(&self, len: usize) {
        self.payloads_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record a successful delivery
    pub fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed delivery
    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subscriber connection
    pub fn record_connect(&self) {
        self.subscribers_connected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subscriber disconnection
    pub fn record_disconnect(&self) {
        self.subscribers_disconnected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record several disconnections at once
    pub fn record_disconnects(&self, count: u64) {
        self.subscribers_disconnected.fetch_add(count, Ordering::Relaxed);
    }

    /// Time since the counters were created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            payloads_received: self.payloads_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            subscribers_connected: self.subscribers_connected.load(Ordering::Relaxed),
            subscribers_disconnected: self.subscribers_disconnected.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Payloads accepted on the ingress
    pub payloads_received: u64,
    /// Total payload bytes accepted on the ingress
    pub bytes_received: u64,
    /// Successful deliveries to subscribers
    pub deliveries: u64,
    /// Failed deliveries (each one drops a subscriber)
    pub delivery_failures: u64,
    /// Subscribers that ever connected
    pub subscribers_connected: u64,
    /// Subscribers that disconnected or were dropped
    pub subscribers_disconnected: u64,
    /// Uptime
    pub uptime: Duration,
}

impl StatsSnapshot {
    /// Subscribers still connected according to the counters
    pub fn active_subscribers(&self) -> u64 {
        self.subscribers_connected
            .saturating_sub(self.subscribers_disconnected)
    }
}
