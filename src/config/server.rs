// src/config/server.rs
use super::{LoggingConfig, NetworkConfig, WorkerPoolConfig};

/// Everything one server run needs. Sub-configs are validated on their own;
/// this aggregate adds no rules of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub worker_pool: WorkerPoolConfig,
    pub logging: LoggingConfig,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    network: Option<NetworkConfig>,
    worker_pool: Option<WorkerPoolConfig>,
    logging: Option<LoggingConfig>,
}

impl ServerConfigBuilder {
    pub fn network(&mut self, network: NetworkConfig) -> &mut Self {
        self.network = Some(network);
        self
    }

    pub fn worker_pool(&mut self, worker_pool: WorkerPoolConfig) -> &mut Self {
        self.worker_pool = Some(worker_pool);
        self
    }

    pub fn logging(&mut self, logging: LoggingConfig) -> &mut Self {
        self.logging = Some(logging);
        self
    }

    /// Sections that were never supplied fall back to their defaults.
    pub fn build(&self) -> ServerConfig {
        ServerConfig {
            network: self.network.clone().unwrap_or_default(),
            worker_pool: self.worker_pool.clone().unwrap_or_default(),
            logging: self.logging.clone().unwrap_or_default(),
        }
    }
}
