//! Relay server listener
//!
//! Owns the registry and broadcaster and serves both adapters on one socket.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::registry::SubscriberRegistry;
use crate::server::config::ServerConfig;
use crate::server::connection::{self, WsSubscriber};
use crate::server::ingress;
use crate::stats::{RelayStats, StatsSnapshot};

/// State shared with every request handler
#[derive(Clone)]
pub(crate) struct RelayState {
    pub(crate) broadcaster: Broadcaster<WsSubscriber>,
    pub(crate) next_subscriber_id: Arc<AtomicU64>,
    pub(crate) connection_semaphore: Option<Arc<Semaphore>>,
    pub(crate) write_timeout: Duration,
}

/// Event relay server
pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<SubscriberRegistry<WsSubscriber>>,
    broadcaster: Broadcaster<WsSubscriber>,
    next_subscriber_id: Arc<AtomicU64>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_subscribers > 0 {
            Some(Arc::new(Semaphore::new(config.max_subscribers)))
        } else {
            None
        };

        let registry = Arc::new(SubscriberRegistry::new());
        let broadcaster =
            Broadcaster::with_stats(Arc::clone(&registry), Arc::new(RelayStats::new()));

        Self {
            config,
            registry,
            broadcaster,
            next_subscriber_id: Arc::new(AtomicU64::new(1)),
            connection_semaphore,
        }
    }

    /// Get a reference to the subscriber registry
    pub fn registry(&self) -> &Arc<SubscriberRegistry<WsSubscriber>> {
        &self.registry
    }

    /// Get the broadcaster feeding the registry
    pub fn broadcaster(&self) -> &Broadcaster<WsSubscriber> {
        &self.broadcaster
    }

    /// Get the relay counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        self.broadcaster.stats()
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the HTTP router for both adapters
    pub fn router(&self) -> Result<Router> {
        self.config.validate()?;

        let state = RelayState {
            broadcaster: self.broadcaster.clone(),
            next_subscriber_id: Arc::clone(&self.next_subscriber_id),
            connection_semaphore: self.connection_semaphore.clone(),
            write_timeout: self.config.write_timeout,
        };

        Ok(Router::new()
            .route(&self.config.ingress_path, post(ingress::publish))
            .route(&self.config.subscribe_path, get(connection::subscribe))
            .layer(DefaultBodyLimit::max(self.config.max_payload_size))
            .with_state(state))
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// On shutdown every subscriber is removed and its socket closed.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        let addr = listener.local_addr()?;

        tracing::info!(
            addr = %addr,
            ingress = %self.config.ingress_path,
            subscribe = %self.config.subscribe_path,
            "Event relay listening"
        );

        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(self.broadcaster.stats());
        let signal = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            // Upgraded sockets are not tracked by the HTTP server, close them here
            connection::close_all(&registry, &stats).await;
        };

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await?;

        log_stopped(&self.stats().snapshot());

        Ok(())
    }
}

/// Final summary line once the server has stopped
fn log_stopped(stats: &StatsSnapshot) {
    tracing::info!(
        payloads = stats.payloads_received,
        bytes = stats.bytes_received,
        deliveries = stats.deliveries,
        failures = stats.delivery_failures,
        subscribers_connected = stats.subscribers_connected,
        subscribers_disconnected = stats.subscribers_disconnected,
        uptime_secs = stats.uptime.as_secs(),
        "Event relay stopped"
    );
}
