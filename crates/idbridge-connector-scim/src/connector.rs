//! The SCIM connector: capability-trait surface over [`ScimService`].
//!
//! Object-class dispatch is an explicit match per operation; there is
//! no generic resource machinery behind it.

use tracing::debug;

use idbridge_connector::config::ConnectorConfig;
use idbridge_connector::error::{ConnectorError, ConnectorResult};
use idbridge_connector::operation::{AttributeSet, Filter, PageRequest, SearchPage, Uid};
use idbridge_connector::schema::{AttributeDataType, AttributeDescriptor, ConnectorSchema};
use idbridge_connector::traits::{Connector, CreateOp, DeleteOp, SchemaOp, SearchOp, UpdateOp};
use idbridge_connector::types::ObjectClass;
use idbridge_connector::async_trait;

use crate::config::ScimConfig;
use crate::custom::{CustomAttributeSchema, CustomDataType};
use crate::service::ScimService;

/// SCIM provisioning connector for one configured target.
#[derive(Debug)]
pub struct ScimConnector {
    display_name: String,
    service: ScimService,
}

impl ScimConnector {
    /// Create a connector from configuration. Validation failures and a
    /// malformed custom-attribute schema surface here, never later.
    pub fn new(config: ScimConfig) -> ConnectorResult<Self> {
        config.validate()?;
        let service = ScimService::from_config(&config)?;
        debug!(config = ?config.redacted(), "initialized SCIM connector");
        Ok(Self {
            display_name: format!("SCIM ({})", config.base_url),
            service,
        })
    }

    /// The underlying service, for callers that want raw operations.
    #[must_use]
    pub fn service(&self) -> &ScimService {
        &self.service
    }
}

#[async_trait]
impl Connector for ScimConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        self.service.probe().await
    }

    async fn dispose(&self) -> ConnectorResult<()> {
        // Nothing held beyond the HTTP pool and the token cache, both
        // dropped with the instance.
        Ok(())
    }
}

impl SchemaOp for ScimConnector {
    fn schema(&self) -> ConnectorSchema {
        build_schema(self.service.custom_schema())
    }
}

#[async_trait]
impl CreateOp for ScimConnector {
    async fn create(
        &self,
        object_class: ObjectClass,
        attributes: AttributeSet,
    ) -> ConnectorResult<Uid> {
        match object_class {
            ObjectClass::User => self.service.create_user(&attributes).await,
            ObjectClass::Group => self.service.create_group(&attributes).await,
        }
    }
}

#[async_trait]
impl UpdateOp for ScimConnector {
    async fn update(
        &self,
        object_class: ObjectClass,
        uid: &Uid,
        attributes: AttributeSet,
    ) -> ConnectorResult<Uid> {
        match object_class {
            ObjectClass::User => self.service.update_user(uid, &attributes).await,
            ObjectClass::Group => self.service.update_group(uid, &attributes).await,
        }
    }
}

#[async_trait]
impl DeleteOp for ScimConnector {
    async fn delete(&self, object_class: ObjectClass, uid: &Uid) -> ConnectorResult<()> {
        match object_class {
            ObjectClass::User => self.service.delete_user(uid).await,
            ObjectClass::Group => self.service.delete_group(uid).await,
        }
    }
}

#[async_trait]
impl SearchOp for ScimConnector {
    async fn search(
        &self,
        object_class: ObjectClass,
        filter: Option<&Filter>,
        attributes_to_get: Option<&[String]>,
        page: Option<&PageRequest>,
    ) -> ConnectorResult<SearchPage> {
        // Only Users can be listed; Groups are reachable by id through
        // `get`.
        let mut result = match object_class {
            ObjectClass::User => {
                self.service
                    .search_users(filter, attributes_to_get, page)
                    .await?
            }
            ObjectClass::Group => {
                return Err(ConnectorError::UnsupportedObjectClass {
                    object_class: object_class.as_str().to_string(),
                })
            }
        };
        if let Some(names) = attributes_to_get {
            restrict_projection(&mut result, names);
        }
        Ok(result)
    }

    async fn get(
        &self,
        object_class: ObjectClass,
        uid: &Uid,
        attributes_to_get: Option<&[String]>,
    ) -> ConnectorResult<Option<AttributeSet>> {
        // A direct GET beats a filtered listing when the uid is the id.
        let fetched = match object_class {
            ObjectClass::User => self.service.get_user(uid).await,
            ObjectClass::Group => self.service.get_group(uid).await,
        };
        match fetched {
            Ok(mut attrs) => {
                if let Some(names) = attributes_to_get {
                    restrict_attribute_set(&mut attrs, names);
                }
                Ok(Some(attrs))
            }
            Err(ConnectorError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Drop attributes the caller did not ask for. The identifier is always
/// kept so results stay addressable.
fn restrict_projection(page: &mut SearchPage, names: &[String]) {
    for attrs in &mut page.objects {
        restrict_attribute_set(attrs, names);
    }
}

fn restrict_attribute_set(attrs: &mut AttributeSet, names: &[String]) {
    let drop: Vec<String> = attrs
        .names()
        .filter(|n| *n != "id" && !names.iter().any(|w| w == n))
        .map(str::to_string)
        .collect();
    for name in drop {
        attrs.remove(&name);
    }
}

// Canonical type registries, spelled out for schema registration.
const EMAIL_TYPES: &[&str] = &["work", "home", "other"];
const PHONE_TYPES: &[&str] = &["work", "home", "other", "pager", "fax", "mobile"];
const IM_TYPES: &[&str] = &["aim", "xmpp", "skype", "qq", "yahoo", "msn", "icq", "gtalk"];
const PHOTO_TYPES: &[&str] = &["photo", "thumbnail"];
const ADDRESS_TYPES: &[&str] = &["work", "home", "other"];

const ADDRESS_STRING_LEAVES: &[&str] = &[
    "streetAddress",
    "locality",
    "region",
    "postalCode",
    "country",
    "formatted",
    "operation",
];

fn build_schema(custom: &CustomAttributeSchema) -> ConnectorSchema {
    let mut user = Vec::new();

    user.push(AttributeDescriptor::string("id").read_only());
    for leaf in ["created", "lastModified", "location", "version"] {
        user.push(AttributeDescriptor::string(format!("meta.{leaf}")).read_only());
    }

    for name in [
        "userName",
        "externalId",
        "displayName",
        "nickName",
        "profileUrl",
        "title",
        "userType",
        "preferredLanguage",
        "locale",
        "timezone",
        "password",
    ] {
        user.push(AttributeDescriptor::string(name));
    }
    user.push(AttributeDescriptor::boolean("active"));

    for leaf in [
        "formatted",
        "familyName",
        "givenName",
        "middleName",
        "honorificPrefix",
        "honorificSuffix",
    ] {
        user.push(AttributeDescriptor::string(format!("name.{leaf}")));
    }

    for (base, types) in [
        ("emails", EMAIL_TYPES),
        ("phoneNumbers", PHONE_TYPES),
        ("ims", IM_TYPES),
        ("photos", PHOTO_TYPES),
    ] {
        for t in types {
            user.push(AttributeDescriptor::string(format!("{base}.{t}.value")));
            user.push(AttributeDescriptor::string(format!("{base}.{t}.display")));
            user.push(AttributeDescriptor::boolean(format!("{base}.{t}.primary")));
            user.push(AttributeDescriptor::string(format!("{base}.{t}.operation")));
        }
    }

    for t in ADDRESS_TYPES {
        for leaf in ADDRESS_STRING_LEAVES {
            user.push(AttributeDescriptor::string(format!("addresses.{t}.{leaf}")));
        }
        user.push(AttributeDescriptor::boolean(format!("addresses.{t}.primary")));
    }

    for base in ["roles", "entitlements", "groups", "x509Certificates"] {
        user.push(AttributeDescriptor::string(format!("{base}.default.value")).multi());
    }

    append_custom_descriptors(&mut user, custom);

    let mut group = vec![
        AttributeDescriptor::string("id").read_only(),
        AttributeDescriptor::string("displayName"),
        AttributeDescriptor::string("externalId"),
        AttributeDescriptor::string("members.default.value").multi(),
    ];
    for leaf in ["created", "lastModified", "location", "version"] {
        group.push(AttributeDescriptor::string(format!("meta.{leaf}")).read_only());
    }

    ConnectorSchema::new()
        .with_object_class(ObjectClass::User, user)
        .with_object_class(ObjectClass::Group, group)
}

fn append_custom_descriptors(out: &mut Vec<AttributeDescriptor>, custom: &CustomAttributeSchema) {
    for desc in custom.descriptors() {
        if desc.data_type == CustomDataType::Complex {
            for sub in &desc.sub_attributes {
                out.push(custom_descriptor(
                    format!("{}.{}", desc.name, sub.name),
                    sub.data_type,
                    sub.multi_valued,
                    sub.read_only || desc.read_only,
                ));
            }
        } else {
            out.push(custom_descriptor(
                desc.flat_name(),
                desc.data_type,
                desc.multi_valued,
                desc.read_only,
            ));
        }
    }
}

fn custom_descriptor(
    name: String,
    data_type: CustomDataType,
    multi_valued: bool,
    read_only: bool,
) -> AttributeDescriptor {
    AttributeDescriptor {
        name,
        data_type: match data_type {
            CustomDataType::Boolean => AttributeDataType::Boolean,
            CustomDataType::Integer => AttributeDataType::Integer,
            CustomDataType::String | CustomDataType::Complex => AttributeDataType::String,
        },
        multi_valued,
        read_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_covers_core_vocabulary() {
        let schema = build_schema(&CustomAttributeSchema::empty());
        let user = schema.object_class(ObjectClass::User).unwrap();

        let names: Vec<&str> = user.attributes.iter().map(|a| a.name.as_str()).collect();
        assert!(names.contains(&"userName"));
        assert!(names.contains(&"emails.work.value"));
        assert!(names.contains(&"phoneNumbers.pager.value"));
        assert!(names.contains(&"ims.gtalk.value"));
        assert!(names.contains(&"addresses.home.postalCode"));
        assert!(names.contains(&"entitlements.default.value"));
        assert!(names.contains(&"name.honorificPrefix"));

        let id = user.attributes.iter().find(|a| a.name == "id").unwrap();
        assert!(id.read_only);
        let active = user.attributes.iter().find(|a| a.name == "active").unwrap();
        assert_eq!(active.data_type, AttributeDataType::Boolean);
        let roles = user
            .attributes
            .iter()
            .find(|a| a.name == "roles.default.value")
            .unwrap();
        assert!(roles.multi_valued);

        let group = schema.object_class(ObjectClass::Group).unwrap();
        assert!(group
            .attributes
            .iter()
            .any(|a| a.name == "members.default.value" && a.multi_valued));
    }

    #[test]
    fn schema_includes_custom_descriptors() {
        let doc = json!({
            "id": "urn:ietf:params:scim:schemas:extension:acme:2.0:User",
            "name": "Acme",
            "attributes": [
                {"name": "department", "type": "string"},
                {"name": "badges", "type": "string", "multiValued": true},
                {"name": "clearance", "type": "integer", "readOnly": true},
                {
                    "name": "office",
                    "type": "complex",
                    "subAttributes": [
                        {"name": "building", "type": "string"},
                        {"name": "floor", "type": "integer"}
                    ]
                }
            ]
        });
        let custom =
            CustomAttributeSchema::parse(&doc, crate::resource::ScimVersion::V2).unwrap();
        let schema = build_schema(&custom);
        let user = schema.object_class(ObjectClass::User).unwrap();

        let find = |name: &str| user.attributes.iter().find(|a| a.name == name);
        assert!(find("urn:ietf:params:scim:schemas:extension:acme:2.0:User.department").is_some());
        let badges = find("urn:ietf:params:scim:schemas:extension:acme:2.0:User.badges").unwrap();
        assert!(badges.multi_valued);
        let clearance =
            find("urn:ietf:params:scim:schemas:extension:acme:2.0:User.clearance").unwrap();
        assert!(clearance.read_only);
        assert_eq!(clearance.data_type, AttributeDataType::Integer);
        let floor = find("office.floor").unwrap();
        assert_eq!(floor.data_type, AttributeDataType::Integer);
    }

    #[test]
    fn projection_restriction_keeps_id() {
        let mut attrs = idbridge_connector::operation::AttributeSet::new()
            .with("id", "u-1")
            .with("userName", "alice")
            .with("title", "Engineer");
        restrict_attribute_set(&mut attrs, &["userName".to_string()]);
        assert!(attrs.has("id"));
        assert!(attrs.has("userName"));
        assert!(!attrs.has("title"));
    }
}
