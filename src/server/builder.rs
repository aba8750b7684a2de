// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use super::handler::{ConnectionHandler, DiscardHandler};
use super::lifecycle::{Server, DEFAULT_BIND_TIMEOUT, DEFAULT_GRACE_PERIOD};
use crate::config::ServerConfig;
use std::sync::Arc;
use std::time::Duration;

/// Builder so callers can inject their connection handler and tune shutdown.
pub struct ServerBuilder<H = DiscardHandler> {
    config: ServerConfig,
    handler: Arc<H>,
    grace_period: Duration,
    bind_timeout: Duration,
}

impl ServerBuilder<DiscardHandler> {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            handler: Arc::new(DiscardHandler),
            grace_period: DEFAULT_GRACE_PERIOD,
            bind_timeout: DEFAULT_BIND_TIMEOUT,
        }
    }
}

impl<H: ConnectionHandler> ServerBuilder<H> {
    /// Swap in the handler that owns each accepted connection.
    pub fn with_handler<T: ConnectionHandler>(self, handler: T) -> ServerBuilder<T> {
        self.with_shared_handler(Arc::new(handler))
    }

    /// Like `with_handler`, for a handler the caller keeps a reference to.
    pub fn with_shared_handler<T: ConnectionHandler>(self, handler: Arc<T>) -> ServerBuilder<T> {
        ServerBuilder {
            config: self.config,
            handler,
            grace_period: self.grace_period,
            bind_timeout: self.bind_timeout,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_bind_timeout(mut self, bind_timeout: Duration) -> Self {
        self.bind_timeout = bind_timeout;
        self
    }

    pub fn build(self) -> Server<H> {
        Server::from_parts(
            self.config,
            self.handler,
            self.grace_period,
            self.bind_timeout,
        )
    }
}
