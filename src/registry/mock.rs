//! In-memory subscriber used by unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;

use super::error::DeliveryError;
use super::subscriber::{Subscriber, SubscriberId};

/// Records every payload it is handed; can be switched to fail
pub(crate) struct MockSubscriber {
    id: SubscriberId,
    received: Mutex<Vec<Bytes>>,
    failing: AtomicBool,
    delay: Option<Duration>,
    close_delay: Option<Duration>,
    close_calls: AtomicUsize,
}

impl MockSubscriber {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id: SubscriberId::new(id),
            received: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: None,
            close_delay: None,
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Every delivery sleeps for `delay` before recording
    pub(crate) fn slow(id: u64, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(id)
        }
    }

    /// Every close sleeps for `delay` before returning
    pub(crate) fn slow_close(id: u64, delay: Duration) -> Self {
        Self {
            close_delay: Some(delay),
            ..Self::new(id)
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl Subscriber for MockSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    async fn deliver(&self, payload: &Bytes) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.received.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn close(&self) {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
