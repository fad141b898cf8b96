//! Configuration traits and common connection settings.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ConnectorResult;

/// Trait for connector-specific configuration.
///
/// Each connector type implements this trait to define its
/// configuration schema and validation rules.
pub trait ConnectorConfig: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid. This is the
    /// point where configuration-time failures (bad base address,
    /// malformed custom-attribute schema) must surface, never at
    /// request time.
    fn validate(&self) -> ConnectorResult<()>;

    /// Create a redacted version of this config for logging/display.
    ///
    /// Sensitive fields are replaced with placeholders.
    fn redacted(&self) -> Self;
}

/// Common connection settings shared across connector types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl ConnectionSettings {
    /// Get connection timeout as a Duration.
    pub fn connection_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get read timeout as a Duration.
    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.read_timeout_secs)
    }
}
