//! Publish endpoint
//!
//! Accepts a raw request body and broadcasts it. The response only
//! acknowledges receipt; it says nothing about how many subscribers got it.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use bytes::Bytes;

use crate::server::listener::RelayState;

/// POST handler for published payloads
///
/// Body size is capped by the router's body limit; oversize or unreadable
/// bodies are rejected by the extractor before anything is broadcast.
pub(crate) async fn publish(
    State(state): State<RelayState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> StatusCode {
    tracing::debug!(peer = %peer_addr, bytes = body.len(), "Received publish");

    state.broadcaster.broadcast(body).await;

    tracing::debug!(peer = %peer_addr, "Publish acknowledged");
    StatusCode::OK
}
