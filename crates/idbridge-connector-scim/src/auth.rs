//! Target authentication: anonymous, HTTP Basic, static Bearer, and
//! OAuth2 client credentials.

use reqwest::RequestBuilder;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use idbridge_connector::error::{ConnectorError, ConnectorResult};

/// Name of the standard OAuth2 token-response field carrying the access
/// token. Some targets return the token under a different key.
pub const DEFAULT_TOKEN_FIELD: &str = "access_token";

/// Credentials for a SCIM target.
///
/// The [`Debug`] impl redacts sensitive fields (passwords, tokens,
/// secrets) to prevent accidental credential exposure in log output.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ScimCredentials {
    /// No authentication header at all.
    #[serde(rename = "none")]
    None,

    /// HTTP Basic authentication.
    #[serde(rename = "basic")]
    Basic { username: String, password: String },

    /// Static Bearer token authentication.
    #[serde(rename = "bearer")]
    Bearer { token: String },

    /// OAuth2 client credentials grant.
    #[serde(rename = "oauth2")]
    OAuth2 {
        client_id: String,
        client_secret: String,
        token_endpoint: String,
        /// Token-response field carrying the access token; targets that
        /// deviate from RFC 6749 name it here.
        #[serde(default = "default_token_field")]
        token_field: String,
        /// Resource-owner credentials, sent alongside the client
        /// credentials when the target's token endpoint wants them.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(default)]
        scopes: Vec<String>,
    },
}

fn default_token_field() -> String {
    DEFAULT_TOKEN_FIELD.to_string()
}

impl std::fmt::Debug for ScimCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.debug_struct("None").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::OAuth2 {
                client_id,
                token_endpoint,
                token_field,
                username,
                scopes,
                ..
            } => f
                .debug_struct("OAuth2")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("token_endpoint", token_endpoint)
                .field("token_field", token_field)
                .field("username", username)
                .field("password", &"[REDACTED]")
                .field("scopes", scopes)
                .finish(),
        }
    }
}

/// Authentication handler for SCIM targets.
///
/// OAuth2 access tokens are cached behind a lock shared across clones;
/// the other modes are stateless.
#[derive(Debug, Clone)]
pub struct ScimAuth {
    credentials: ScimCredentials,
    cached_token: Arc<RwLock<Option<String>>>,
    /// HTTP client for OAuth2 token requests.
    http_client: reqwest::Client,
}

impl ScimAuth {
    /// Create a new auth handler.
    #[must_use]
    pub fn new(credentials: ScimCredentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Whether a rejected credential can be refreshed and retried.
    ///
    /// Only OAuth2 can mint a new token; a rejected static credential
    /// will be rejected again, so the caller surfaces the 401 at once.
    pub fn can_refresh(&self) -> bool {
        matches!(self.credentials, ScimCredentials::OAuth2 { .. })
    }

    /// Apply authentication to a request builder, acquiring an OAuth2
    /// token first when one is not cached.
    pub async fn apply(&self, builder: RequestBuilder) -> ConnectorResult<RequestBuilder> {
        match &self.credentials {
            ScimCredentials::None => Ok(builder),
            ScimCredentials::Basic { username, password } => {
                Ok(builder.basic_auth(username, Some(password)))
            }
            ScimCredentials::Bearer { token } => Ok(builder.bearer_auth(token)),
            ScimCredentials::OAuth2 { .. } => {
                let token = self.oauth2_token().await?;
                Ok(builder.bearer_auth(token))
            }
        }
    }

    /// Invalidate the cached OAuth2 token (on 401 response). The next
    /// [`ScimAuth::apply`] hits the token endpoint again.
    pub async fn invalidate_cache(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }

    async fn oauth2_token(&self) -> ConnectorResult<String> {
        let ScimCredentials::OAuth2 {
            client_id,
            client_secret,
            token_endpoint,
            token_field,
            username,
            password,
            scopes,
        } = &self.credentials
        else {
            return Err(ConnectorError::auth(
                "token acquisition requires OAuth2 credentials",
            ));
        };

        {
            let cache = self.cached_token.read().await;
            if let Some(token) = cache.as_ref() {
                return Ok(token.clone());
            }
        }

        debug!(endpoint = %token_endpoint, "fetching OAuth2 access token");
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        if let (Some(user), Some(pass)) = (username, password) {
            form.push(("username", user));
            form.push(("password", pass));
        }
        let scope_str = scopes.join(" ");
        if !scopes.is_empty() {
            form.push(("scope", &scope_str));
        }

        let response = self
            .http_client
            .post(token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| ConnectorError::auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ConnectorError::auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ConnectorError::auth(format!("failed to parse token response: {e}")))?;

        let token = body
            .get(token_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConnectorError::auth(format!(
                    "token response carries no string field {token_field:?}"
                ))
            })?
            .to_string();

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(token.clone());
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth2_creds() -> ScimCredentials {
        ScimCredentials::OAuth2 {
            client_id: "cid".to_string(),
            client_secret: "shh".to_string(),
            token_endpoint: "https://idp.example.com/token".to_string(),
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            username: None,
            password: None,
            scopes: vec![],
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let basic = format!(
            "{:?}",
            ScimCredentials::Basic {
                username: "admin".to_string(),
                password: "hunter2".to_string(),
            }
        );
        assert!(basic.contains("admin"));
        assert!(!basic.contains("hunter2"));
        assert!(basic.contains("[REDACTED]"));

        let bearer = format!(
            "{:?}",
            ScimCredentials::Bearer {
                token: "tok-123".to_string()
            }
        );
        assert!(!bearer.contains("tok-123"));

        let oauth = format!("{:?}", oauth2_creds());
        assert!(oauth.contains("cid"));
        assert!(!oauth.contains("shh"));
    }

    #[test]
    fn only_oauth2_can_refresh() {
        let client = reqwest::Client::new();
        assert!(!ScimAuth::new(ScimCredentials::None, client.clone()).can_refresh());
        assert!(!ScimAuth::new(
            ScimCredentials::Bearer {
                token: "t".to_string()
            },
            client.clone()
        )
        .can_refresh());
        assert!(ScimAuth::new(oauth2_creds(), client).can_refresh());
    }

    #[test]
    fn credentials_deserialize_with_default_token_field() {
        let creds: ScimCredentials = serde_json::from_value(serde_json::json!({
            "type": "oauth2",
            "client_id": "cid",
            "client_secret": "shh",
            "token_endpoint": "https://idp.example.com/token"
        }))
        .unwrap();
        match creds {
            ScimCredentials::OAuth2 { token_field, .. } => {
                assert_eq!(token_field, DEFAULT_TOKEN_FIELD);
            }
            other => panic!("unexpected credentials: {other:?}"),
        }
    }
}
