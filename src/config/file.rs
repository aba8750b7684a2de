// src/config/file.rs
//
// On-disk shape of the configuration. Every field is optional; present values
// are pushed through the validating builders so a file gets the same checks
// and messages as code. Integers are read as i64 so an out-of-range number
// fails validation for its field instead of failing to parse.
use super::{
    validate_client_connection_timeout, validate_file_count, validate_max_pool_size,
    validate_min_pool_size, validate_port, validate_queue_size, ConfigValidationError,
    ExecutionStrategy, LogLevel, LoggingConfig, NetworkConfig, ServerConfig, WorkerPoolConfig,
};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfigFile {
    pub network: Option<NetworkSection>,
    pub worker_pool: Option<WorkerPoolSection>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    pub hostname: Option<String>,
    pub port: Option<i64>,
    pub client_connection_timeout_secs: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerPoolSection {
    pub min_pool_size: Option<i64>,
    pub max_pool_size: Option<i64>,
    pub keep_alive_secs: Option<i64>,
    pub queue_size: Option<i64>,
    pub execution_strategy: Option<ExecutionStrategy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub file_logging_enabled: Option<bool>,
    pub file_path: Option<String>,
    /// Absent keeps the default level; an explicit `null` clears it so the
    /// filter falls back to `RUST_LOG`.
    #[serde(deserialize_with = "explicit_null")]
    pub level: Option<Option<LogLevel>>,
    pub file_limit_bytes: Option<i64>,
    pub file_count: Option<i64>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Converts a file integer to the builder's type, handing anything the type
/// cannot hold to `out_of_range` for the field's own error.
fn narrow<T, F>(value: i64, out_of_range: F) -> Result<T, ConfigValidationError>
where
    T: TryFrom<i64>,
    F: FnOnce(i64) -> Result<T, ConfigValidationError>,
{
    T::try_from(value).or_else(|_| out_of_range(value))
}

impl ServerConfigFile {
    pub fn into_config(self) -> Result<ServerConfig, ConfigValidationError> {
        let mut builder = ServerConfig::builder();
        if let Some(network) = self.network {
            builder.network(network.into_config()?);
        }
        if let Some(pool) = self.worker_pool {
            builder.worker_pool(pool.into_config()?);
        }
        if let Some(logging) = self.logging {
            builder.logging(logging.into_config()?);
        }
        Ok(builder.build())
    }
}

impl NetworkSection {
    fn into_config(self) -> Result<NetworkConfig, ConfigValidationError> {
        let mut builder = NetworkConfig::builder();
        if let Some(hostname) = self.hostname {
            builder.hostname(&hostname)?;
        }
        if let Some(port) = self.port {
            builder.port(narrow(port, |_| validate_port(0))?)?;
        }
        if let Some(secs) = self.client_connection_timeout_secs {
            let secs = narrow(secs, |_| validate_client_connection_timeout(0))?;
            builder.client_connection_timeout_secs(secs)?;
        }
        builder.build()
    }
}

impl WorkerPoolSection {
    fn into_config(self) -> Result<WorkerPoolConfig, ConfigValidationError> {
        let mut builder = WorkerPoolConfig::builder();
        if let Some(size) = self.min_pool_size {
            let size = narrow(size, |v| {
                validate_min_pool_size(if v < 0 { 0 } else { u32::MAX })
            })?;
            builder.min_pool_size(size)?;
        }
        if let Some(size) = self.max_pool_size {
            let size = narrow(size, |v| {
                validate_max_pool_size(if v < 0 { 0 } else { u32::MAX })
            })?;
            builder.max_pool_size(size)?;
        }
        if let Some(secs) = self.keep_alive_secs {
            let secs = narrow(secs, |_| {
                Err(ConfigValidationError::new(
                    "keep_alive_seconds",
                    "Keep alive seconds cannot be negative",
                ))
            })?;
            builder.keep_alive_secs(secs)?;
        }
        if let Some(size) = self.queue_size {
            let size = narrow(size, |v| {
                validate_queue_size(if v < 0 { i32::MIN } else { i32::MAX })
            })?;
            builder.queue_size(size)?;
        }
        if let Some(strategy) = self.execution_strategy {
            builder.execution_strategy(strategy);
        }
        builder.build()
    }
}

impl LoggingSection {
    fn into_config(self) -> Result<LoggingConfig, ConfigValidationError> {
        let mut builder = LoggingConfig::builder();
        if let Some(enabled) = self.file_logging_enabled {
            builder.file_logging_enabled(enabled);
        }
        if let Some(path) = self.file_path {
            builder.file_path(&path)?;
        }
        if let Some(level) = self.level {
            builder.level(level);
        }
        if let Some(bytes) = self.file_limit_bytes {
            let bytes = narrow(bytes, |v| {
                Err(ConfigValidationError::new(
                    "file_limit_bytes",
                    format!("File limit must be positive, got: {}", v),
                ))
            })?;
            builder.file_limit_bytes(bytes)?;
        }
        if let Some(count) = self.file_count {
            let count = narrow(count, |v| {
                if v < 0 {
                    Err(ConfigValidationError::new(
                        "file_count",
                        format!("File count must be positive, got: {}", v),
                    ))
                } else {
                    validate_file_count(u32::MAX)
                }
            })?;
            builder.file_count(count)?;
        }
        builder.build()
    }
}
