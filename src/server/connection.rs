//! WebSocket subscriber adapter
//!
//! Upgrades a subscriber request, registers the connection, relays
//! broadcaster deliveries onto the socket and unregisters it when the peer
//! goes away.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, Notify};

use crate::registry::{DeliveryError, Subscriber, SubscriberId, SubscriberRegistry};
use crate::server::listener::RelayState;
use crate::stats::RelayStats;

/// A subscriber backed by the write half of a WebSocket
///
/// Writes are serialized per connection, so one subscriber sees payloads in
/// the order they were delivered to it.
pub struct WsSubscriber {
    id: SubscriberId,
    peer_addr: SocketAddr,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    write_timeout: Duration,
    closed: AtomicBool,
    shutdown: Notify,
}

impl WsSubscriber {
    fn new(
        id: SubscriberId,
        peer_addr: SocketAddr,
        sink: SplitSink<WebSocket, Message>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            id,
            peer_addr,
            sink: Mutex::new(sink),
            write_timeout,
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Check whether the transport has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Subscriber for WsSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    async fn deliver(&self, payload: &Bytes) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }

        let message = to_message(payload);
        let write = async {
            let mut sink = self.sink.lock().await;
            sink.send(message).await
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DeliveryError::Transport(e.to_string())),
            Err(_) => Err(DeliveryError::Timeout(self.write_timeout)),
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Wake the read loop; the permit is kept if it is not waiting yet
        self.shutdown.notify_one();

        let goodbye = async {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Close(None)).await?;
            sink.close().await
        };
        match tokio::time::timeout(self.write_timeout, goodbye).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(subscriber = %self.id, error = %e, "Close frame not sent");
            }
            Err(_) => {
                tracing::debug!(subscriber = %self.id, "Close frame timed out");
            }
        }
    }
}

/// Payloads that are valid UTF-8 go out as text frames, anything else as binary
fn to_message(payload: &Bytes) -> Message {
    match std::str::from_utf8(payload) {
        Ok(text) => Message::Text(text.to_owned()),
        Err(_) => Message::Binary(payload.to_vec()),
    }
}

/// WebSocket upgrade handler for subscribers
pub(crate) async fn subscribe(
    State(state): State<RelayState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    // Check subscriber limit; the permit lives as long as the connection
    let permit = if let Some(ref sem) = state.connection_semaphore {
        match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = %peer_addr, "Subscriber rejected: limit reached");
                return (StatusCode::SERVICE_UNAVAILABLE, "Subscriber limit reached").into_response();
            }
        }
    } else {
        None
    };

    let id = SubscriberId::new(state.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(subscriber = %id, peer = %peer_addr, "WebSocket connection requested");

    ws.on_failed_upgrade(move |e| {
        tracing::warn!(subscriber = %id, peer = %peer_addr, error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| async move {
        handle_socket(socket, id, peer_addr, state).await;
        drop(permit);
    })
}

async fn handle_socket(socket: WebSocket, id: SubscriberId, peer_addr: SocketAddr, state: RelayState) {
    let (sink, mut stream) = socket.split();
    let subscriber = Arc::new(WsSubscriber::new(id, peer_addr, sink, state.write_timeout));
    let registry = state.broadcaster.registry();
    let stats = state.broadcaster.stats();

    registry.add(Arc::clone(&subscriber)).await;
    stats.record_connect();
    tracing::info!(subscriber = %id, peer = %peer_addr, "Client connected");

    // Inbound frames carry nothing for us; reading only detects disconnects
    loop {
        tokio::select! {
            _ = subscriber.shutdown.notified() => {
                tracing::debug!(subscriber = %id, "Connection closed by relay");
                break;
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(subscriber = %id, "Peer closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(subscriber = %id, error = %e, "Read error");
                    break;
                }
            }
        }
    }

    disconnect(registry, stats, &subscriber).await;
    tracing::info!(subscriber = %id, peer = %peer_addr, "Client disconnected");
}

/// Remove a subscriber and close its transport if it was still registered
async fn disconnect(
    registry: &SubscriberRegistry<WsSubscriber>,
    stats: &RelayStats,
    subscriber: &WsSubscriber,
) {
    if registry.remove(subscriber.id()).await.is_some() {
        stats.record_disconnect();
    }
    subscriber.close().await;
}

/// Drop every registered subscriber, closing their sockets concurrently
pub(crate) async fn close_all(registry: &SubscriberRegistry<WsSubscriber>, stats: &RelayStats) {
    let subscribers = registry.len().await;
    tracing::info!(subscribers, "Closing subscriber connections");

    let closed = registry.close_all().await;
    stats.record_disconnects(closed as u64);
}
