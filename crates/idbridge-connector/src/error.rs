//! Connector error types
//!
//! A small, stable set of error kinds surfaced to the host framework
//! regardless of which target-system dialect produced the failure.

use thiserror::Error;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The requested object does not exist in the target system.
    ///
    /// The original response body (if any) is preserved for diagnostics.
    #[error("object not found: {detail}")]
    NotFound { detail: String },

    /// The target service rejected or failed the request.
    ///
    /// Carries the HTTP status and the raw response body; the body is
    /// not parsed for finer-grained causes.
    #[error("service error (status {status}): {detail}")]
    Service { status: u16, detail: String },

    /// Authentication with the target system failed (credential
    /// acquisition, not a per-request 401 — those surface as
    /// [`ConnectorError::Service`] after retry exhaustion).
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The configured custom-attributes schema document is invalid.
    ///
    /// Fatal at configuration-validation time, never at request time.
    #[error("schema parse error: {message}")]
    SchemaParse { message: String },

    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The operation is not supported for the given object class.
    #[error("unsupported object class for this operation: {object_class}")]
    UnsupportedObjectClass { object_class: String },

    /// Network-level failure talking to the target system.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to serialize or deserialize a payload.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ConnectorError {
    /// Check if this error is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Network { .. } => true,
            ConnectorError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::NotFound { .. } => "NOT_FOUND",
            ConnectorError::Service { .. } => "SERVICE_ERROR",
            ConnectorError::AuthenticationFailed { .. } => "AUTH_FAILED",
            ConnectorError::SchemaParse { .. } => "SCHEMA_PARSE",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::UnsupportedObjectClass { .. } => "UNSUPPORTED_OBJECT_CLASS",
            ConnectorError::Network { .. } => "NETWORK_ERROR",
            ConnectorError::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    // Convenience constructors

    /// Create a not-found error.
    pub fn not_found(detail: impl Into<String>) -> Self {
        ConnectorError::NotFound {
            detail: detail.into(),
        }
    }

    /// Create a service error from a status and response body.
    pub fn service(status: u16, detail: impl Into<String>) -> Self {
        ConnectorError::Service {
            status,
            detail: detail.into(),
        }
    }

    /// Create an authentication failure.
    pub fn auth(message: impl Into<String>) -> Self {
        ConnectorError::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create a schema parse error.
    pub fn schema_parse(message: impl Into<String>) -> Self {
        ConnectorError::SchemaParse {
            message: message.into(),
        }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ConnectorError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        ConnectorError::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::serialization(err.to_string())
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ConnectorError::network("reset").is_transient());
        assert!(ConnectorError::service(503, "unavailable").is_transient());
        assert!(ConnectorError::service(404, "gone").is_permanent());
        assert!(ConnectorError::auth("bad secret").is_permanent());
        assert!(ConnectorError::schema_parse("bad json").is_permanent());
    }

    #[test]
    fn error_codes() {
        assert_eq!(ConnectorError::not_found("x").error_code(), "NOT_FOUND");
        assert_eq!(
            ConnectorError::service(500, "x").error_code(),
            "SERVICE_ERROR"
        );
        assert_eq!(
            ConnectorError::invalid_configuration("x").error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn display_preserves_detail() {
        let err = ConnectorError::service(409, r#"{"Errors":[{"description":"dup"}]}"#);
        let text = err.to_string();
        assert!(text.contains("409"));
        assert!(text.contains("dup"));
    }
}
