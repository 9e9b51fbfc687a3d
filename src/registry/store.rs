//! Subscriber registry implementation
//!
//! The shared set of live subscribers, keyed by identity.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;

use super::subscriber::{Subscriber, SubscriberId};

/// Concurrent set of live subscribers
///
/// Thread-safe via `RwLock`. Membership changes take the write lock for a
/// single map operation; `snapshot` takes the read lock only to copy handles.
pub struct SubscriberRegistry<S: Subscriber> {
    /// Map of subscriber id to subscriber handle
    subscribers: RwLock<HashMap<SubscriberId, Arc<S>>>,
}

impl<S: Subscriber> SubscriberRegistry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber
    ///
    /// Returns `false` if a subscriber with the same id is already present,
    /// in which case the existing handle is kept.
    pub async fn add(&self, subscriber: Arc<S>) -> bool {
        let id = subscriber.id();
        let mut subscribers = self.subscribers.write().await;

        if subscribers.contains_key(&id) {
            tracing::debug!(subscriber = %id, "Subscriber already registered");
            return false;
        }

        subscribers.insert(id, subscriber);
        let count = subscribers.len();
        drop(subscribers);

        tracing::info!(subscriber = %id, subscribers = count, "Subscriber added");
        true
    }

    /// Unregister a subscriber
    ///
    /// Returns the removed handle, or `None` if it was not registered. Does
    /// not close the transport; that is up to the caller.
    pub async fn remove(&self, id: SubscriberId) -> Option<Arc<S>> {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(&id);
        let count = subscribers.len();
        drop(subscribers);

        if removed.is_some() {
            tracing::info!(subscriber = %id, subscribers = count, "Subscriber removed");
        }

        removed
    }

    /// Point-in-time copy of the current membership
    ///
    /// The lock is released before this returns, so callers may iterate and
    /// deliver without blocking concurrent `add`/`remove`.
    pub async fn snapshot(&self) -> Vec<Arc<S>> {
        self.subscribers.read().await.values().cloned().collect()
    }

    /// Remove every subscriber and close their transports
    ///
    /// Closes run concurrently, so one stuck transport costs its own close
    /// deadline rather than delaying the rest. Returns how many subscribers
    /// this call removed.
    pub async fn close_all(&self) -> usize {
        let subscribers = self.snapshot().await;

        let closes = subscribers.into_iter().map(|subscriber| async move {
            match self.remove(subscriber.id()).await {
                Some(_) => {
                    subscriber.close().await;
                    1
                }
                None => 0,
            }
        });

        join_all(closes).await.into_iter().sum()
    }

    /// Check whether a subscriber is registered
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// Number of registered subscribers
    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Check whether the registry has no subscribers
    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

impl<S: Subscriber> Default for SubscriberRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::registry::mock::MockSubscriber;

    fn ids(snapshot: &[Arc<MockSubscriber>]) -> HashSet<u64> {
        snapshot.iter().map(|s| s.id().as_u64()).collect()
    }

    #[tokio::test]
    async fn test_add_remove() {
        let registry = SubscriberRegistry::new();
        let a = Arc::new(MockSubscriber::new(1));
        let b = Arc::new(MockSubscriber::new(2));

        assert!(registry.add(a.clone()).await);
        assert!(registry.add(b.clone()).await);
        assert_eq!(registry.len().await, 2);

        let removed = registry.remove(a.id()).await;
        assert!(removed.is_some());
        assert!(!registry.contains(a.id()).await);
        assert!(registry.contains(b.id()).await);
        assert_eq!(ids(&registry.snapshot().await), HashSet::from([2]));
    }

    #[tokio::test]
    async fn test_add_twice_is_noop() {
        let registry = SubscriberRegistry::new();
        let a = Arc::new(MockSubscriber::new(1));

        assert!(registry.add(a.clone()).await);
        assert!(!registry.add(a.clone()).await);

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let registry = SubscriberRegistry::new();
        let a = Arc::new(MockSubscriber::new(1));
        registry.add(a).await;

        assert!(registry.remove(SubscriberId::new(42)).await.is_none());
        assert_eq!(ids(&registry.snapshot().await), HashSet::from([1]));

        // Second removal of the same id is also a no-op
        assert!(registry.remove(SubscriberId::new(1)).await.is_some());
        assert!(registry.remove(SubscriberId::new(1)).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let registry = SubscriberRegistry::new();
        registry.add(Arc::new(MockSubscriber::new(1))).await;
        registry.add(Arc::new(MockSubscriber::new(2))).await;

        let snapshot = registry.snapshot().await;

        // Mutations after the snapshot do not affect it, and are not blocked by it
        registry.add(Arc::new(MockSubscriber::new(3))).await;
        registry.remove(SubscriberId::new(1)).await;

        assert_eq!(ids(&snapshot), HashSet::from([1, 2]));
        assert_eq!(ids(&registry.snapshot().await), HashSet::from([2, 3]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_remove() {
        let registry = Arc::new(SubscriberRegistry::<MockSubscriber>::new());
        let mut handles = Vec::new();

        // 64 tasks each add their subscriber; odd ids then remove themselves
        for id in 0..64u64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let sub = Arc::new(MockSubscriber::new(id));
                registry.add(sub.clone()).await;
                registry.add(sub).await;
                if id % 2 == 1 {
                    registry.remove(SubscriberId::new(id)).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let expected: HashSet<u64> = (0..64).filter(|id| id % 2 == 0).collect();
        assert_eq!(ids(&registry.snapshot().await), expected);
    }

    #[tokio::test]
    async fn test_close_all_closes_concurrently() {
        let registry = SubscriberRegistry::new();
        let mut subs = Vec::new();
        for id in 0..5 {
            let sub = Arc::new(MockSubscriber::slow_close(id, Duration::from_millis(100)));
            registry.add(sub.clone()).await;
            subs.push(sub);
        }

        let started = Instant::now();
        let closed = registry.close_all().await;

        // Five 100ms closes overlap instead of queueing behind each other
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(closed, 5);
        assert!(registry.is_empty().await);
        for sub in &subs {
            assert_eq!(sub.close_calls(), 1);
        }

        // Nothing left to close the second time round
        assert_eq!(registry.close_all().await, 0);
        assert_eq!(subs[0].close_calls(), 1);
    }

    #[test]
    fn test_subscriber_id_display() {
        assert_eq!(SubscriberId::new(7).to_string(), "sub-7");
        assert_eq!(SubscriberId::from(9).as_u64(), 9);
    }
}
