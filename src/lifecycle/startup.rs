//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect to storage before anything can accept traffic
//! - Build the request pipeline over the connected storage
//! - Bind the listener and serve until shutdown
//! - Publish each step on a watch channel
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently
//! - The listener is bound last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::routing::RouteTableError;
use crate::storage::{StorageConnector, StorageError};

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Connecting,
    Listening(SocketAddr),
    /// Served and shut down cleanly.
    Stopped,
    Failed,
}

/// Errors that abort startup or serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("storage connection failed: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid route table: {0}")]
    Routes(#[from] RouteTableError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Drives storage connection, listener binding and serving.
pub struct Lifecycle {
    config: AppConfig,
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new(config: AppConfig) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self { config, state }
    }

    /// Subscribe to state transitions.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Connect, bind and serve until `shutdown` fires.
    ///
    /// If storage cannot be reached the listener is never bound and the
    /// error is returned.
    pub async fn run(
        self,
        connector: &dyn StorageConnector,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), StartupError> {
        let result = self.start(connector, shutdown).await;
        match &result {
            Ok(()) => {
                self.state.send_replace(LifecycleState::Stopped);
            }
            Err(e) => {
                tracing::error!(error = %e, "Startup failed");
                self.state.send_replace(LifecycleState::Failed);
            }
        }
        result
    }

    async fn start(
        &self,
        connector: &dyn StorageConnector,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), StartupError> {
        self.state.send_replace(LifecycleState::Connecting);
        let storage = connector.connect(&self.config.storage.uri).await?;
        tracing::info!("Connected to storage");

        let server = HttpServer::new(&self.config, storage)?;

        let address = self.config.listener.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| StartupError::Bind { address, source })?;

        tracing::info!(address = %local_addr, "Server is listening");
        self.state.send_replace(LifecycleState::Listening(local_addr));

        server
            .run(listener, shutdown)
            .await
            .map_err(StartupError::Serve)
    }
}
