//! SCIM HTTP client (reqwest-based).
//!
//! One logical request per call: the client applies authentication,
//! sends, classifies the response, and — for refreshable credentials —
//! transparently refreshes and retries on 401 up to a fixed bound.
//! Payload shaping lives above this layer; everything here speaks raw
//! JSON values.

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use idbridge_connector::error::{ConnectorError, ConnectorResult};

use crate::auth::ScimAuth;

/// Maximum credential refreshes per logical operation. A target that
/// keeps rejecting freshly minted tokens gets its 401 surfaced after
/// this many refresh attempts.
pub const MAX_AUTH_RETRIES: u32 = 3;

const SCIM_MEDIA_TYPE: &str = "application/scim+json";

/// A classified success response: the HTTP status and the parsed body,
/// when the target sent one.
#[derive(Debug, Clone)]
pub struct ScimResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// SCIM HTTP client for outbound provisioning.
#[derive(Debug, Clone)]
pub struct ScimClient {
    /// Base URL of the SCIM target, without trailing slash.
    base_url: String,
    auth: ScimAuth,
    http_client: Client,
    content_type: String,
    accept: String,
}

impl ScimClient {
    /// Create a new client with the given timeouts.
    pub fn new(
        base_url: impl Into<String>,
        auth: ScimAuth,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> ConnectorResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent(concat!("idbridge-scim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConnectorError::invalid_configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self::with_http_client(base_url, auth, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(base_url: impl Into<String>, auth: ScimAuth, http_client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            auth,
            http_client,
            content_type: SCIM_MEDIA_TYPE.to_string(),
            accept: SCIM_MEDIA_TYPE.to_string(),
        }
    }

    /// Override the media types sent in Content-Type and Accept headers.
    #[must_use]
    pub fn with_media_types(mut self, content_type: impl Into<String>, accept: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self.accept = accept.into();
        self
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET with optional query parameters.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ConnectorResult<Option<Value>> {
        self.execute(Method::GET, path, query, None)
            .await
            .map(|r| r.body)
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> ConnectorResult<ScimResponse> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    /// PUT a JSON body.
    pub async fn put(&self, path: &str, body: &Value) -> ConnectorResult<ScimResponse> {
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    /// PATCH a JSON body.
    pub async fn patch(&self, path: &str, body: &Value) -> ConnectorResult<ScimResponse> {
        self.execute(Method::PATCH, path, &[], Some(body)).await
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> ConnectorResult<()> {
        self.execute(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    /// Execute one logical request with the 401 refresh-and-retry loop.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ConnectorResult<ScimResponse> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut refreshes = 0u32;

        loop {
            debug!(%method, %url, "SCIM request");
            let mut builder = self
                .http_client
                .request(method.clone(), &url)
                .header("Accept", &self.accept);
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(b) = body {
                builder = builder.header("Content-Type", &self.content_type).json(b);
            }
            let builder = self.auth.apply(builder).await?;
            let response = builder.send().await.map_err(map_transport)?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                self.auth.invalidate_cache().await;
                if self.auth.can_refresh() && refreshes < MAX_AUTH_RETRIES {
                    refreshes += 1;
                    warn!(%url, attempt = refreshes, "401 from target, refreshing credentials");
                    continue;
                }
                let detail = read_body(response).await;
                return Err(ConnectorError::service(401, detail));
            }

            if status == StatusCode::NOT_FOUND {
                return Err(ConnectorError::not_found(read_body(response).await));
            }

            if !status.is_success() {
                let detail = read_body(response).await;
                return Err(ConnectorError::service(status.as_u16(), detail));
            }

            let text = response.text().await.map_err(map_transport)?;
            if text.trim().is_empty() {
                return Ok(ScimResponse {
                    status: status.as_u16(),
                    body: None,
                });
            }

            let value: Value = serde_json::from_str(&text)?;
            // Some targets report failure inside a 2xx envelope.
            if has_errors_field(&value) {
                return Err(ConnectorError::service(status.as_u16(), text));
            }
            return Ok(ScimResponse {
                status: status.as_u16(),
                body: Some(value),
            });
        }
    }
}

fn map_transport(err: reqwest::Error) -> ConnectorError {
    ConnectorError::network_with_source(err.to_string(), err)
}

async fn read_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body
    }
}

fn has_errors_field(value: &Value) -> bool {
    match value.get("Errors") {
        Some(Value::Array(errors)) => !errors.is_empty(),
        Some(_) => true,
        None => false,
    }
}

/// Escape a value for use inside a SCIM filter string literal.
///
/// String values in filter expressions are enclosed in double-quotes;
/// backslashes and double-quotes are escaped to prevent filter
/// injection.
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build an equality filter expression for one attribute.
pub fn eq_filter(attribute: &str, value: &str) -> String {
    format!("{attribute} eq \"{}\"", escape_filter_value(value))
}
