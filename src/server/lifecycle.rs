// src/server/lifecycle.rs
use super::acceptor::ConnectionAcceptor;
use super::handler::{ConnectionHandler, DiscardHandler};
use crate::config::ServerConfig;
use crate::executor::create_execution_resource;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// How long in-flight connections get to finish once the listener closes.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Upper bound on how long `start` waits for the bind outcome.
pub const DEFAULT_BIND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Timed out after {0:?} waiting for the listener to bind")]
    BindTimeout(Duration),

    #[error("Server is already running")]
    AlreadyRunning,

    #[error("Acceptor exited before reporting a bind result")]
    AcceptorExited,
}

impl ServerError {
    /// The underlying socket error for bind failures.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ServerError::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct Running {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// A TCP server: one listener, one execution resource per run.
///
/// `start` and `stop` may be repeated; each start builds a fresh listener and
/// execution resource.
pub struct Server<H = DiscardHandler> {
    config: Arc<ServerConfig>,
    handler: Arc<H>,
    grace_period: Duration,
    bind_timeout: Duration,
    running: Option<Running>,
}

impl Server<DiscardHandler> {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_handler(config, DiscardHandler)
    }
}

impl<H: ConnectionHandler> Server<H> {
    pub fn with_handler(config: ServerConfig, handler: H) -> Self {
        Self::from_parts(
            config,
            Arc::new(handler),
            DEFAULT_GRACE_PERIOD,
            DEFAULT_BIND_TIMEOUT,
        )
    }

    pub(crate) fn from_parts(
        config: ServerConfig,
        handler: Arc<H>,
        grace_period: Duration,
        bind_timeout: Duration,
    ) -> Self {
        Self {
            config: Arc::new(config),
            handler,
            grace_period,
            bind_timeout,
            running: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Address actually bound by the current run.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Spawns the acceptor and waits until the listener is bound or the bind
    /// has failed. A bind failure is returned here as a fatal startup error.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let address = self.config.network.address();
        info!("Starting server on {}", address);

        let executor = create_execution_resource(&self.config.worker_pool);
        let (mut acceptor, bound_rx) = ConnectionAcceptor::new(
            self.config.clone(),
            self.handler.clone(),
            executor,
            self.grace_period,
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { acceptor.run(shutdown_rx).await });

        let outcome = match tokio::time::timeout(self.bind_timeout, bound_rx).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let _ = shutdown_tx.send(true);
                task.abort();
                return Err(ServerError::BindTimeout(self.bind_timeout));
            }
        };

        match outcome {
            Ok(Ok(local_addr)) => {
                info!("Server started on {}", local_addr);
                self.running = Some(Running {
                    shutdown_tx,
                    task,
                    local_addr,
                });
                Ok(local_addr)
            }
            Ok(Err(source)) => {
                error!("Failed to bind to server at {}", address);
                let _ = task.await;
                Err(ServerError::Bind { address, source })
            }
            Err(_) => {
                log_task_exit(task.await);
                Err(ServerError::AcceptorExited)
            }
        }
    }

    /// Closes the listener and drains in-flight connections, forcing them
    /// closed after the grace period. Does nothing if not running.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            debug!("Stop requested but server is not running");
            return;
        };

        info!("Stopping server on {}", running.local_addr);
        let _ = running.shutdown_tx.send(true);
        log_task_exit(running.task.await);
        info!("Server stopped");
    }
}

impl<H> Drop for Server<H> {
    fn drop(&mut self) {
        // The acceptor task drains on its own once signalled.
        if let Some(running) = self.running.take() {
            let _ = running.shutdown_tx.send(true);
        }
    }
}

fn log_task_exit(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Acceptor task panicked: {}", e);
        } else {
            debug!("Acceptor task cancelled: {}", e);
        }
    }
}
