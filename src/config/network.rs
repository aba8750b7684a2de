// src/config/network.rs
use super::ConfigValidationError;
use std::time::Duration;

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_CLIENT_CONNECTION_TIMEOUT_SECS: u64 = 30;

const MAX_HOSTNAME_LEN: usize = 253;

/// Where the listener binds and how long an accepted socket may sit idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    hostname: String,
    port: u16,
    client_connection_timeout_secs: u64,
}

impl NetworkConfig {
    pub fn builder() -> NetworkConfigBuilder {
        NetworkConfigBuilder::default()
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_connection_timeout(&self) -> Duration {
        Duration::from_secs(self.client_connection_timeout_secs)
    }

    /// `host:port` as used for logging and error messages.
    pub fn address(&self) -> String {
        if self.hostname.contains(':') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            client_connection_timeout_secs: DEFAULT_CLIENT_CONNECTION_TIMEOUT_SECS,
        }
    }
}

/// Trims and checks a hostname, returning the value to store.
pub fn validate_hostname(hostname: &str) -> Result<String, ConfigValidationError> {
    let hostname = hostname.trim();

    if hostname.is_empty() {
        return Err(ConfigValidationError::new(
            "hostname",
            "Hostname cannot be empty",
        ));
    }

    // RFC 1035 upper bound
    if hostname.chars().count() > MAX_HOSTNAME_LEN {
        return Err(ConfigValidationError::new(
            "hostname",
            "Hostname too long (max 253 characters)",
        ));
    }

    if hostname.chars().any(char::is_whitespace) {
        return Err(ConfigValidationError::new(
            "hostname",
            "Hostname cannot contain whitespace",
        ));
    }

    // Letters, digits, dots, colons (IPv6), hyphens, underscores
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '_' | '-');
    if !hostname.chars().all(allowed) {
        return Err(ConfigValidationError::new(
            "hostname",
            "Hostname contains invalid characters",
        ));
    }

    Ok(hostname.to_string())
}

pub fn validate_port(port: u16) -> Result<u16, ConfigValidationError> {
    if port == 0 {
        return Err(ConfigValidationError::new(
            "port",
            "Port must be between 1 and 65535",
        ));
    }
    Ok(port)
}

pub fn validate_client_connection_timeout(secs: u64) -> Result<u64, ConfigValidationError> {
    if secs < 1 {
        return Err(ConfigValidationError::new(
            "client_connection_timeout",
            "Client connection timeout must be at least 1",
        ));
    }
    Ok(secs)
}

#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    hostname: String,
    port: u16,
    client_connection_timeout_secs: u64,
}

impl Default for NetworkConfigBuilder {
    fn default() -> Self {
        let defaults = NetworkConfig::default();
        Self {
            hostname: defaults.hostname,
            port: defaults.port,
            client_connection_timeout_secs: defaults.client_connection_timeout_secs,
        }
    }
}

impl NetworkConfigBuilder {
    pub fn hostname(&mut self, hostname: &str) -> Result<&mut Self, ConfigValidationError> {
        self.hostname = validate_hostname(hostname)?;
        Ok(self)
    }

    pub fn port(&mut self, port: u16) -> Result<&mut Self, ConfigValidationError> {
        self.port = validate_port(port)?;
        Ok(self)
    }

    pub fn client_connection_timeout_secs(
        &mut self,
        secs: u64,
    ) -> Result<&mut Self, ConfigValidationError> {
        self.client_connection_timeout_secs = validate_client_connection_timeout(secs)?;
        Ok(self)
    }

    pub fn build(&self) -> Result<NetworkConfig, ConfigValidationError> {
        Ok(NetworkConfig {
            hostname: validate_hostname(&self.hostname)?,
            port: validate_port(self.port)?,
            client_connection_timeout_secs: validate_client_connection_timeout(
                self.client_connection_timeout_secs,
            )?,
        })
    }
}
