// src/config/error.rs
use thiserror::Error;

/// A single rejected configuration value.
///
/// The display form is the bare, field-specific message (for example
/// `Port must be between 1 and 65535`) so it can be shown to operators as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigValidationError {
    field: &'static str,
    message: String,
}

impl ConfigValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending field, e.g. `"max_pool_size"`.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for '{}': {}", .0.field(), .0.message())]
    Validation(#[from] ConfigValidationError),
}
