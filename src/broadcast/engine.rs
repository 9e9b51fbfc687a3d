//! Broadcaster implementation

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;

use crate::registry::{Subscriber, SubscriberRegistry};
use crate::stats::RelayStats;

/// Fans payloads out to all registered subscribers
pub struct Broadcaster<S: Subscriber> {
    registry: Arc<SubscriberRegistry<S>>,
    stats: Arc<RelayStats>,
}

impl<S: Subscriber> Broadcaster<S> {
    /// Create a broadcaster over a shared registry
    pub fn new(registry: Arc<SubscriberRegistry<S>>) -> Self {
        Self::with_stats(registry, Arc::new(RelayStats::new()))
    }

    /// Create a broadcaster that records into existing counters
    pub fn with_stats(registry: Arc<SubscriberRegistry<S>>, stats: Arc<RelayStats>) -> Self {
        Self { registry, stats }
    }

    /// Get the registry this broadcaster delivers to
    pub fn registry(&self) -> &Arc<SubscriberRegistry<S>> {
        &self.registry
    }

    /// Get the relay counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Deliver a payload to every currently registered subscriber
    ///
    /// Takes one snapshot and drives all deliveries concurrently. A failed
    /// delivery schedules removal of that subscriber and does not affect the
    /// others. Subscribers added after the snapshot miss this payload.
    pub async fn broadcast(&self, payload: Bytes) {
        self.stats.record_payload(payload.len());

        let subscribers = self.registry.snapshot().await;
        if subscribers.is_empty() {
            tracing::debug!(bytes = payload.len(), "No subscribers, payload dropped");
            return;
        }

        tracing::debug!(
            subscribers = subscribers.len(),
            bytes = payload.len(),
            "Broadcasting payload"
        );
        tracing::trace!(payload = %String::from_utf8_lossy(&payload), "Payload body");

        let payload = &payload;
        let deliveries = subscribers.into_iter().map(|subscriber| async move {
            match subscriber.deliver(payload).await {
                Ok(()) => self.stats.record_delivery(),
                Err(e) => {
                    tracing::warn!(
                        subscriber = %subscriber.id(),
                        error = %e,
                        "Delivery failed, dropping subscriber"
                    );
                    self.stats.record_delivery_failure();
                    self.spawn_removal(subscriber);
                }
            }
        });

        join_all(deliveries).await;
    }

    /// Remove a failed subscriber without holding up the current fan-out
    fn spawn_removal(&self, subscriber: Arc<S>) {
        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            // Only the caller that actually removed it closes the transport
            if registry.remove(subscriber.id()).await.is_some() {
                stats.record_disconnect();
                subscriber.close().await;
            }
        });
    }
}

impl<S: Subscriber> Clone for Broadcaster<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            stats: Arc::clone(&self.stats),
        }
    }
}
