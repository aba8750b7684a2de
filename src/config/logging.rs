// src/config/logging.rs
use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_FILE_LOGGING_ENABLED: bool = true;
pub const DEFAULT_LOG_FILE_PATH: &str = "/logs/app.log";
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::All;
pub const DEFAULT_FILE_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_FILE_COUNT: u32 = 5;

const MAX_LOG_FILE_PATH_LEN: usize = 255;
const MIN_FILE_LIMIT_BYTES: u64 = 1024;
const MAX_FILE_LIMIT_BYTES: u64 = 1024 * 1024 * 1024;
const MAX_FILE_COUNT: u32 = 100;

/// Minimum severity that reaches the sinks, from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    All,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace | LogLevel::All => LevelFilter::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            "all" => Ok(LogLevel::All),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Console is always on; the rotating file sink is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    file_logging_enabled: bool,
    file_path: String,
    level: Option<LogLevel>,
    file_limit_bytes: u64,
    file_count: u32,
}

impl LoggingConfig {
    pub fn builder() -> LoggingConfigBuilder {
        LoggingConfigBuilder::default()
    }

    pub fn file_logging_enabled(&self) -> bool {
        self.file_logging_enabled
    }

    pub fn file_path(&self) -> &Path {
        Path::new(&self.file_path)
    }

    /// `None` defers to `RUST_LOG`.
    pub fn level(&self) -> Option<LogLevel> {
        self.level
    }

    pub fn file_limit_bytes(&self) -> u64 {
        self.file_limit_bytes
    }

    pub fn file_count(&self) -> u32 {
        self.file_count
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_logging_enabled: DEFAULT_FILE_LOGGING_ENABLED,
            file_path: DEFAULT_LOG_FILE_PATH.to_string(),
            level: Some(DEFAULT_LOG_LEVEL),
            file_limit_bytes: DEFAULT_FILE_LIMIT_BYTES,
            file_count: DEFAULT_FILE_COUNT,
        }
    }
}

/// Trims the path and enforces the length cap. Emptiness is checked at build
/// time, since an empty path is only wrong while file logging is enabled.
pub fn validate_log_file_path(path: &str) -> Result<String, ConfigValidationError> {
    let path = path.trim();
    if path.chars().count() > MAX_LOG_FILE_PATH_LEN {
        return Err(ConfigValidationError::new(
            "log_file_path",
            "Log file path exceeds maximum length of 255 characters",
        ));
    }
    Ok(path.to_string())
}

pub fn validate_file_limit_bytes(bytes: u64) -> Result<u64, ConfigValidationError> {
    if bytes < MIN_FILE_LIMIT_BYTES {
        return Err(ConfigValidationError::new(
            "file_limit_bytes",
            "File limit too small, minimum is 1024 bytes (1KB)",
        ));
    }
    if bytes > MAX_FILE_LIMIT_BYTES {
        return Err(ConfigValidationError::new(
            "file_limit_bytes",
            "File limit too large, maximum is 1GB",
        ));
    }
    Ok(bytes)
}

pub fn validate_file_count(count: u32) -> Result<u32, ConfigValidationError> {
    if count == 0 {
        return Err(ConfigValidationError::new(
            "file_count",
            format!("File count must be positive, got: {}", count),
        ));
    }
    if count > MAX_FILE_COUNT {
        return Err(ConfigValidationError::new(
            "file_count",
            "File count too large, maximum is 100 files",
        ));
    }
    Ok(count)
}

#[derive(Debug, Clone)]
pub struct LoggingConfigBuilder {
    file_logging_enabled: bool,
    file_path: String,
    level: Option<LogLevel>,
    file_limit_bytes: u64,
    file_count: u32,
}

impl Default for LoggingConfigBuilder {
    fn default() -> Self {
        let defaults = LoggingConfig::default();
        Self {
            file_logging_enabled: defaults.file_logging_enabled,
            file_path: defaults.file_path,
            level: defaults.level,
            file_limit_bytes: defaults.file_limit_bytes,
            file_count: defaults.file_count,
        }
    }
}

impl LoggingConfigBuilder {
    pub fn file_logging_enabled(&mut self, enabled: bool) -> &mut Self {
        self.file_logging_enabled = enabled;
        self
    }

    pub fn file_path(&mut self, path: &str) -> Result<&mut Self, ConfigValidationError> {
        self.file_path = validate_log_file_path(path)?;
        Ok(self)
    }

    pub fn level(&mut self, level: Option<LogLevel>) -> &mut Self {
        self.level = level;
        self
    }

    pub fn file_limit_bytes(&mut self, bytes: u64) -> Result<&mut Self, ConfigValidationError> {
        self.file_limit_bytes = validate_file_limit_bytes(bytes)?;
        Ok(self)
    }

    pub fn file_count(&mut self, count: u32) -> Result<&mut Self, ConfigValidationError> {
        self.file_count = validate_file_count(count)?;
        Ok(self)
    }

    pub fn build(&self) -> Result<LoggingConfig, ConfigValidationError> {
        let file_path = validate_log_file_path(&self.file_path)?;
        if self.file_logging_enabled && file_path.is_empty() {
            return Err(ConfigValidationError::new(
                "log_file_path",
                "Log file path must be specified when file logging is enabled",
            ));
        }

        Ok(LoggingConfig {
            file_logging_enabled: self.file_logging_enabled,
            file_path,
            level: self.level,
            file_limit_bytes: validate_file_limit_bytes(self.file_limit_bytes)?,
            file_count: validate_file_count(self.file_count)?,
        })
    }
}
