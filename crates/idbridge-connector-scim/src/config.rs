//! SCIM connector configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use idbridge_connector::config::{ConnectionSettings, ConnectorConfig};
use idbridge_connector::error::{ConnectorError, ConnectorResult};

use crate::auth::ScimCredentials;
use crate::custom::CustomAttributeSchema;
use crate::resource::ScimVersion;

/// HTTP method used for full-resource updates.
///
/// Both carry the complete serialized resource; the choice exists
/// because some targets accept only one of the two verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateMethod {
    #[default]
    Put,
    Patch,
}

impl UpdateMethod {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMethod::Put => "PUT",
            UpdateMethod::Patch => "PATCH",
        }
    }
}

/// Configuration for the SCIM connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScimConfig {
    /// Base URL of the SCIM service
    /// (e.g., "https://scim.example.com/scim/v2").
    pub base_url: String,

    /// SCIM protocol version spoken by the target.
    #[serde(default = "default_version")]
    pub version: ScimVersion,

    /// Authentication credentials.
    #[serde(default = "default_credentials")]
    pub credentials: ScimCredentials,

    /// Update verb for User resources.
    #[serde(default)]
    pub user_update_method: UpdateMethod,

    /// Update verb for Group resources.
    #[serde(default)]
    pub group_update_method: UpdateMethod,

    /// Optional custom-attributes schema document
    /// (`{id, name, attributes: [...]}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_attributes_schema: Option<Value>,

    /// Page size used when the caller does not request paging.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Content-Type header sent with request bodies.
    #[serde(default = "default_media_type")]
    pub content_type: String,

    /// Accept header sent with every request.
    #[serde(default = "default_media_type")]
    pub accept: String,

    /// Optional HTTP(S) proxy URL routing all target traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Whether redirects from the target are followed.
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Connection settings (timeouts).
    #[serde(default)]
    pub connection: ConnectionSettings,
}

fn default_version() -> ScimVersion {
    ScimVersion::V2
}

fn default_credentials() -> ScimCredentials {
    ScimCredentials::None
}

fn default_page_size() -> u32 {
    100
}

fn default_media_type() -> String {
    "application/scim+json".to_string()
}

fn default_follow_redirects() -> bool {
    true
}

impl ScimConfig {
    /// Create a new config with required fields and defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: default_version(),
            credentials: default_credentials(),
            user_update_method: UpdateMethod::default(),
            group_update_method: UpdateMethod::default(),
            custom_attributes_schema: None,
            default_page_size: default_page_size(),
            content_type: default_media_type(),
            accept: default_media_type(),
            proxy: None,
            follow_redirects: default_follow_redirects(),
            connection: ConnectionSettings::default(),
        }
    }

    /// Set the protocol version.
    pub fn with_version(mut self, version: ScimVersion) -> Self {
        self.version = version;
        self
    }

    /// Set authentication credentials.
    pub fn with_credentials(mut self, credentials: ScimCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set static Bearer token authentication.
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.with_credentials(ScimCredentials::Bearer {
            token: token.into(),
        })
    }

    /// Set HTTP Basic authentication.
    pub fn with_basic_auth(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.with_credentials(ScimCredentials::Basic {
            username: username.into(),
            password: password.into(),
        })
    }

    /// Set the update verb for both resource kinds.
    pub fn with_update_method(mut self, method: UpdateMethod) -> Self {
        self.user_update_method = method;
        self.group_update_method = method;
        self
    }

    /// Set the custom-attributes schema document.
    pub fn with_custom_attributes_schema(mut self, doc: Value) -> Self {
        self.custom_attributes_schema = Some(doc);
        self
    }

    /// Build the full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Parse the configured custom-attributes schema, or an empty
    /// schema when none is configured.
    pub fn parse_custom_schema(&self) -> ConnectorResult<CustomAttributeSchema> {
        match &self.custom_attributes_schema {
            Some(doc) => CustomAttributeSchema::parse(doc, self.version),
            None => Ok(CustomAttributeSchema::empty()),
        }
    }
}

impl ConnectorConfig for ScimConfig {
    fn validate(&self) -> ConnectorResult<()> {
        if self.base_url.is_empty() {
            return Err(ConnectorError::invalid_configuration(
                "base_url is required",
            ));
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            ConnectorError::invalid_configuration(format!("invalid base_url: {e}"))
        })?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(ConnectorError::invalid_configuration(format!(
                "unsupported base_url scheme: {}",
                parsed.scheme()
            )));
        }

        if let ScimCredentials::OAuth2 { token_endpoint, .. } = &self.credentials {
            url::Url::parse(token_endpoint).map_err(|e| {
                ConnectorError::invalid_configuration(format!("invalid token_endpoint: {e}"))
            })?;
        }

        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy).map_err(|e| {
                ConnectorError::invalid_configuration(format!("invalid proxy URL: {e}"))
            })?;
        }

        if self.default_page_size == 0 {
            return Err(ConnectorError::invalid_configuration(
                "default_page_size must be at least 1",
            ));
        }

        // Surfaces a malformed schema document here rather than on the
        // first request that needs it.
        self.parse_custom_schema()?;

        Ok(())
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.credentials = match config.credentials {
            ScimCredentials::None => ScimCredentials::None,
            ScimCredentials::Basic { username, .. } => ScimCredentials::Basic {
                username,
                password: "***REDACTED***".to_string(),
            },
            ScimCredentials::Bearer { .. } => ScimCredentials::Bearer {
                token: "***REDACTED***".to_string(),
            },
            ScimCredentials::OAuth2 {
                client_id,
                token_endpoint,
                token_field,
                username,
                password,
                scopes,
                ..
            } => ScimCredentials::OAuth2 {
                client_id,
                client_secret: "***REDACTED***".to_string(),
                token_endpoint,
                token_field,
                username,
                password: password.map(|_| "***REDACTED***".to_string()),
                scopes,
            },
        };
        config
    }
}
