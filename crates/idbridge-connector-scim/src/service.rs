//! SCIM provisioning service: flat attributes in, SCIM wire traffic
//! out.
//!
//! Each operation builds a resource from the caller's attributes,
//! merges any custom-attribute fragment into the serialized payload,
//! invokes the target through [`ScimClient`], and projects the response
//! back to flat attributes.

use serde_json::Value;
use tracing::{debug, instrument};

use idbridge_connector::error::{ConnectorError, ConnectorResult};
use idbridge_connector::operation::{AttributeSet, Filter, PageRequest, SearchPage, Uid};

use crate::auth::ScimAuth;
use crate::client::{eq_filter, ScimClient, ScimResponse};
use crate::config::{ScimConfig, UpdateMethod};
use crate::custom::CustomAttributeSchema;
use crate::merge::merge;
use crate::paging::{next_cookie, start_index_from_cookie};
use crate::projector::{
    apply_group_attributes, apply_user_attributes, group_to_attributes, user_to_attributes,
};
use crate::resource::{ListResponse, ScimGroup, ScimUser, ScimVersion};

const USERS_PATH: &str = "Users";
const GROUPS_PATH: &str = "Groups";

/// Attributes requested from the target on every search, regardless of
/// what the caller asked for. The id is needed for uid extraction and
/// userName/name for result identification.
const BASE_RETURNED_ATTRIBUTES: [&str; 3] = ["userName", "id", "name"];

/// One provisioning target's SCIM service.
#[derive(Debug, Clone)]
pub struct ScimService {
    client: ScimClient,
    version: ScimVersion,
    custom_schema: CustomAttributeSchema,
    user_update_method: UpdateMethod,
    group_update_method: UpdateMethod,
    default_page_size: u32,
}

impl ScimService {
    /// Build a service from validated configuration.
    pub fn from_config(config: &ScimConfig) -> ConnectorResult<Self> {
        let custom_schema = config.parse_custom_schema()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connection.connection_timeout())
            .timeout(config.connection.read_timeout())
            .user_agent(concat!("idbridge-scim/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
                ConnectorError::invalid_configuration(format!("invalid proxy URL: {e}"))
            })?;
            builder = builder.proxy(proxy);
        }
        if !config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }
        let http_client = builder.build().map_err(|e| {
            ConnectorError::invalid_configuration(format!("failed to build HTTP client: {e}"))
        })?;
        let auth = ScimAuth::new(config.credentials.clone(), http_client.clone());
        let client = ScimClient::with_http_client(&config.base_url, auth, http_client)
            .with_media_types(&config.content_type, &config.accept);

        Ok(Self {
            client,
            version: config.version,
            custom_schema,
            user_update_method: config.user_update_method,
            group_update_method: config.group_update_method,
            default_page_size: config.default_page_size,
        })
    }

    /// Build a service around an existing client (used by tests to
    /// point at a mock target).
    #[must_use]
    pub fn with_client(client: ScimClient, version: ScimVersion) -> Self {
        Self {
            client,
            version,
            custom_schema: CustomAttributeSchema::empty(),
            user_update_method: UpdateMethod::default(),
            group_update_method: UpdateMethod::default(),
            default_page_size: 100,
        }
    }

    /// Replace the custom-attribute schema.
    #[must_use]
    pub fn with_custom_schema(mut self, schema: CustomAttributeSchema) -> Self {
        self.custom_schema = schema;
        self
    }

    /// The protocol version this service speaks.
    #[must_use]
    pub fn version(&self) -> ScimVersion {
        self.version
    }

    /// The configured custom-attribute schema.
    #[must_use]
    pub fn custom_schema(&self) -> &CustomAttributeSchema {
        &self.custom_schema
    }

    /// Probe the target with a minimal listing request.
    pub async fn probe(&self) -> ConnectorResult<()> {
        let query = [
            ("startIndex", "1".to_string()),
            ("count", "1".to_string()),
        ];
        self.client.get(USERS_PATH, &query).await?;
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────────────

    /// Create a User from flat attributes; returns the server-assigned
    /// id.
    #[instrument(skip(self, attrs))]
    pub async fn create_user(&self, attrs: &AttributeSet) -> ConnectorResult<Uid> {
        let payload = self.user_payload(None, attrs)?;
        let response = self.client.post(USERS_PATH, &payload).await?;
        created_uid(response)
    }

    /// Fetch a User by id, projected to flat attributes.
    #[instrument(skip(self))]
    pub async fn get_user(&self, uid: &Uid) -> ConnectorResult<AttributeSet> {
        let path = format!("{USERS_PATH}/{}", uid.value());
        let response = self
            .client
            .get(&path, &[])
            .await?
            .ok_or_else(|| ConnectorError::not_found(format!("empty response for {uid}")))?;
        let user = self.parse_user(&response)?;
        Ok(user_to_attributes(&user))
    }

    /// Replace a User's attributes (full update).
    ///
    /// A success response with no body is confirmed by one follow-up
    /// GET before the uid is returned.
    #[instrument(skip(self, attrs))]
    pub async fn update_user(&self, uid: &Uid, attrs: &AttributeSet) -> ConnectorResult<Uid> {
        let payload = self.user_payload(Some(uid.value()), attrs)?;
        let path = format!("{USERS_PATH}/{}", uid.value());
        let response = match self.user_update_method {
            UpdateMethod::Put => self.client.put(&path, &payload).await?,
            UpdateMethod::Patch => self.client.patch(&path, &payload).await?,
        };
        match response.body {
            Some(body) => {
                let user = self.parse_user(&body)?;
                user.id.map(Uid::from_id).ok_or_else(|| {
                    ConnectorError::service(response.status, "update response carried no id")
                })
            }
            None => {
                debug!(%uid, "update returned no body, confirming with GET");
                self.get_user(uid).await?;
                Ok(uid.clone())
            }
        }
    }

    /// Delete a User by id.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, uid: &Uid) -> ConnectorResult<()> {
        let path = format!("{USERS_PATH}/{}", uid.value());
        self.client.delete(&path).await
    }

    /// Search Users with an optional equality filter and paging.
    ///
    /// `attributes_to_get` is forwarded to the target in the
    /// `attributes` query parameter, always extended with the id and
    /// naming attributes needed to identify results.
    #[instrument(skip(self))]
    pub async fn search_users(
        &self,
        filter: Option<&Filter>,
        attributes_to_get: Option<&[String]>,
        page: Option<&PageRequest>,
    ) -> ConnectorResult<SearchPage> {
        let count = page
            .map(|p| i64::from(p.page_size))
            .unwrap_or(i64::from(self.default_page_size));
        let start_index = start_index_from_cookie(page.and_then(|p| p.cookie.as_deref()))?;

        let mut query = vec![
            ("startIndex", start_index.to_string()),
            ("count", count.to_string()),
            ("attributes", attributes_param(attributes_to_get)),
        ];
        if let Some(f) = filter {
            query.push(("filter", eq_filter(f.attribute(), f.value())));
        }

        let response = self
            .client
            .get(USERS_PATH, &query)
            .await?
            .ok_or_else(|| ConnectorError::serialization("empty search response"))?;

        let envelope: ListResponse<Value> = serde_json::from_value(response)?;
        let returned = envelope.resources.len();

        let mut objects = Vec::with_capacity(returned);
        for resource in &envelope.resources {
            let user = self.parse_user(resource)?;
            objects.push(user_to_attributes(&user));
        }

        let mut result = SearchPage::new(objects);
        result.next_cookie = next_cookie(start_index, count, returned);
        Ok(result)
    }

    // ── Groups ────────────────────────────────────────────────────────

    /// Create a Group from flat attributes.
    #[instrument(skip(self, attrs))]
    pub async fn create_group(&self, attrs: &AttributeSet) -> ConnectorResult<Uid> {
        let payload = self.group_payload(None, attrs)?;
        let response = self.client.post(GROUPS_PATH, &payload).await?;
        created_uid(response)
    }

    /// Fetch a Group by id, projected to flat attributes.
    #[instrument(skip(self))]
    pub async fn get_group(&self, uid: &Uid) -> ConnectorResult<AttributeSet> {
        let path = format!("{GROUPS_PATH}/{}", uid.value());
        let response = self
            .client
            .get(&path, &[])
            .await?
            .ok_or_else(|| ConnectorError::not_found(format!("empty response for {uid}")))?;
        let group = self.parse_group(&response)?;
        Ok(group_to_attributes(&group))
    }

    /// Replace a Group's attributes (full update).
    #[instrument(skip(self, attrs))]
    pub async fn update_group(&self, uid: &Uid, attrs: &AttributeSet) -> ConnectorResult<Uid> {
        let payload = self.group_payload(Some(uid.value()), attrs)?;
        let path = format!("{GROUPS_PATH}/{}", uid.value());
        let response = match self.group_update_method {
            UpdateMethod::Put => self.client.put(&path, &payload).await?,
            UpdateMethod::Patch => self.client.patch(&path, &payload).await?,
        };
        match response.body {
            Some(body) => {
                let group = self.parse_group(&body)?;
                group.id.map(Uid::from_id).ok_or_else(|| {
                    ConnectorError::service(response.status, "update response carried no id")
                })
            }
            None => {
                debug!(%uid, "update returned no body, confirming with GET");
                self.get_group(uid).await?;
                Ok(uid.clone())
            }
        }
    }

    /// Delete a Group by id.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, uid: &Uid) -> ConnectorResult<()> {
        let path = format!("{GROUPS_PATH}/{}", uid.value());
        self.client.delete(&path).await
    }

    // ── Internals ─────────────────────────────────────────────────────

    /// Build the outgoing User payload: core fields from the attribute
    /// set, extension URNs stamped into `schemas`, and the
    /// custom-attribute fragment merged on top.
    fn user_payload(&self, id: Option<&str>, attrs: &AttributeSet) -> ConnectorResult<Value> {
        let mut user = ScimUser::new(self.version);
        user.id = id.map(str::to_string);
        apply_user_attributes(&mut user, attrs, &self.custom_schema);
        self.finish_payload(serde_json::to_value(&user)?, &user.custom)
    }

    fn group_payload(&self, id: Option<&str>, attrs: &AttributeSet) -> ConnectorResult<Value> {
        let mut group = ScimGroup::new(self.version);
        group.id = id.map(str::to_string);
        apply_group_attributes(&mut group, attrs, &self.custom_schema);
        self.finish_payload(serde_json::to_value(&group)?, &group.custom)
    }

    fn finish_payload(
        &self,
        mut payload: Value,
        custom: &crate::resource::CustomValues,
    ) -> ConnectorResult<Value> {
        if let Some(schemas) = payload
            .get_mut("schemas")
            .and_then(Value::as_array_mut)
        {
            for uri in self.custom_schema.extension_uris(self.version) {
                if !schemas.iter().any(|s| s.as_str() == Some(uri)) {
                    schemas.push(Value::String(uri.to_string()));
                }
            }
        }
        if let Some(fragment) = self.custom_schema.payload_fragment(custom, self.version) {
            merge(&mut payload, &fragment);
        }
        Ok(payload)
    }

    fn parse_user(&self, value: &Value) -> ConnectorResult<ScimUser> {
        let mut user: ScimUser = serde_json::from_value(value.clone())?;
        self.custom_schema
            .read_back(value, &mut user.custom, self.version);
        Ok(user)
    }

    fn parse_group(&self, value: &Value) -> ConnectorResult<ScimGroup> {
        let mut group: ScimGroup = serde_json::from_value(value.clone())?;
        self.custom_schema
            .read_back(value, &mut group.custom, self.version);
        Ok(group)
    }
}

/// Extract the server-assigned id from a create response.
fn created_uid(response: ScimResponse) -> ConnectorResult<Uid> {
    let status = response.status;
    let body = response
        .body
        .ok_or_else(|| ConnectorError::service(status, "create response carried no body"))?;
    body.get("id")
        .and_then(Value::as_str)
        .map(Uid::from_id)
        .ok_or_else(|| ConnectorError::service(status, "create response carried no id"))
}

/// Comma-joined value for the `attributes` query parameter.
fn attributes_param(requested: Option<&[String]>) -> String {
    let mut names: Vec<&str> = BASE_RETURNED_ATTRIBUTES.to_vec();
    for name in requested.unwrap_or_default() {
        if !names.contains(&name.as_str()) {
            names.push(name);
        }
    }
    names.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Option<Value>) -> ScimResponse {
        ScimResponse { status, body }
    }

    #[test]
    fn created_uid_requires_id() {
        let uid = created_uid(response(201, Some(json!({"id": "u-1", "userName": "a"})))).unwrap();
        assert_eq!(uid.value(), "u-1");

        assert!(created_uid(response(204, None)).is_err());
        assert!(created_uid(response(201, Some(json!({"userName": "a"})))).is_err());
    }

    #[test]
    fn created_uid_errors_carry_the_real_status() {
        match created_uid(response(201, Some(json!({"userName": "a"})))).unwrap_err() {
            ConnectorError::Service { status, .. } => assert_eq!(status, 201),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn attributes_param_keeps_identifying_attributes() {
        assert_eq!(attributes_param(None), "userName,id,name");
        assert_eq!(
            attributes_param(Some(&["title".to_string(), "id".to_string()])),
            "userName,id,name,title"
        );
    }
}
