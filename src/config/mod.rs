// src/config/mod.rs
mod error;
mod file;
mod logging;
mod network;
mod pool;
mod server;

pub use error::{ConfigError, ConfigValidationError};
pub use file::{LoggingSection, NetworkSection, ServerConfigFile, WorkerPoolSection};
pub use logging::*;
pub use network::*;
pub use pool::*;
pub use server::{ServerConfig, ServerConfigBuilder};

use std::path::Path;

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ConfigError> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );

    let config = if is_yaml {
        parse_yaml(&contents)?
    } else {
        parse_json(&contents)?
    };

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn parse_yaml(contents: &str) -> Result<ServerConfig, ConfigError> {
    let file: ServerConfigFile =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(file.into_config()?)
}

pub fn parse_json(contents: &str) -> Result<ServerConfig, ConfigError> {
    let file: ServerConfigFile =
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(file.into_config()?)
}
