//! Deployment-specific custom attribute schemas.
//!
//! A deployment may extend its SCIM resources with custom attributes
//! declared in a configuration-supplied JSON schema document
//! (`{id, name, attributes: [...]}`). This module parses that document
//! into descriptors, answers "is this flat name a custom attribute",
//! builds the extension fragment merged into outgoing payloads, and
//! reads custom values back out of responses.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

use idbridge_connector::error::{ConnectorError, ConnectorResult};

use crate::resource::{CustomValues, ScimVersion};

/// Declared data type of a custom attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomDataType {
    String,
    Boolean,
    Integer,
    /// One level of sub-attributes; deeper nesting is unsupported.
    Complex,
}

impl CustomDataType {
    /// Parse the schema document's type string. Comparison is
    /// case-insensitive because deployments write `BOOLEAN` as often
    /// as `boolean`; anything unrecognized is treated as string.
    fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "boolean" => CustomDataType::Boolean,
            "integer" => CustomDataType::Integer,
            "complex" => CustomDataType::Complex,
            _ => CustomDataType::String,
        }
    }
}

/// One custom attribute declared by the deployment schema.
///
/// Immutable for the lifetime of the service instance.
#[derive(Debug, Clone)]
pub struct CustomAttributeDescriptor {
    pub name: String,
    pub data_type: CustomDataType,
    pub multi_valued: bool,
    /// Read-only descriptors are readable from the target but never
    /// written to it.
    pub read_only: bool,
    /// URI of the owning extension schema; `None` means the attribute
    /// lives at the document root.
    pub owning_schema_uri: Option<String>,
    /// Sub-attributes of a complex descriptor (one level only).
    pub sub_attributes: Vec<CustomAttributeDescriptor>,
}

impl CustomAttributeDescriptor {
    /// The flat name callers use for this attribute:
    /// `owningSchemaURI.name` when an extension owns it, the bare name
    /// otherwise.
    pub fn flat_name(&self) -> String {
        match &self.owning_schema_uri {
            Some(uri) => format!("{uri}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Parsed custom-attribute schema for one deployment.
#[derive(Debug, Clone, Default)]
pub struct CustomAttributeSchema {
    descriptors: Vec<CustomAttributeDescriptor>,
}

impl CustomAttributeSchema {
    /// An empty schema: no flat name is custom.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a configuration-supplied schema document.
    ///
    /// For v2 the document's `id` becomes each attribute's owning
    /// schema URI (v2 dropped per-attribute schema references); for
    /// v1.1 each attribute names its own `schema`. A structurally
    /// invalid document is a configuration-time fatal
    /// [`ConnectorError::SchemaParse`].
    pub fn parse(doc: &Value, version: ScimVersion) -> ConnectorResult<Self> {
        let obj = doc.as_object().ok_or_else(|| {
            ConnectorError::schema_parse("custom attributes schema must be a JSON object")
        })?;

        let doc_id = obj.get("id").and_then(Value::as_str);

        let attributes = obj
            .get("attributes")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ConnectorError::schema_parse(
                    "custom attributes schema must carry an 'attributes' array",
                )
            })?;

        let mut descriptors = Vec::with_capacity(attributes.len());
        for attr in attributes {
            descriptors.push(Self::parse_descriptor(attr, doc_id, version)?);
        }

        Ok(Self { descriptors })
    }

    fn parse_descriptor(
        attr: &Value,
        doc_id: Option<&str>,
        version: ScimVersion,
    ) -> ConnectorResult<CustomAttributeDescriptor> {
        let obj = attr.as_object().ok_or_else(|| {
            ConnectorError::schema_parse("custom attribute entry must be a JSON object")
        })?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ConnectorError::schema_parse("custom attribute is missing 'name'"))?
            .to_string();

        let data_type = obj
            .get("type")
            .and_then(Value::as_str)
            .map(CustomDataType::parse)
            .unwrap_or(CustomDataType::String);

        let multi_valued = obj
            .get("multiValued")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        // v1.1 declares "readOnly": true; v2 declares "mutability".
        let read_only = obj.get("readOnly").and_then(Value::as_bool).unwrap_or(false)
            || obj
                .get("mutability")
                .and_then(Value::as_str)
                .is_some_and(|m| m.eq_ignore_ascii_case("readOnly"));

        let owning_schema_uri = match version {
            ScimVersion::V2 => doc_id.map(str::to_string),
            ScimVersion::V1 => obj
                .get("schema")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| doc_id.map(str::to_string)),
        };

        let sub_attributes = match obj.get("subAttributes").and_then(Value::as_array) {
            Some(subs) => subs
                .iter()
                .map(|s| Self::parse_descriptor(s, doc_id, version))
                .collect::<ConnectorResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(CustomAttributeDescriptor {
            name,
            data_type,
            multi_valued,
            read_only,
            owning_schema_uri,
            sub_attributes,
        })
    }

    /// True when no custom attributes are declared.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All declared descriptors.
    pub fn descriptors(&self) -> &[CustomAttributeDescriptor] {
        &self.descriptors
    }

    /// Resolve a flat attribute name to its descriptor and storage key.
    ///
    /// Callers may address a custom attribute by its bare name, by
    /// `owningSchemaURI.name`, or (for one-level complex attributes) by
    /// `name.subName`. The returned key is the canonical outgoing-map
    /// key.
    pub fn resolve(&self, flat_name: &str) -> Option<(&CustomAttributeDescriptor, String)> {
        for desc in &self.descriptors {
            if flat_name == desc.name || flat_name == desc.flat_name() {
                return Some((desc, desc.name.clone()));
            }
            if desc.data_type == CustomDataType::Complex {
                for sub in &desc.sub_attributes {
                    let dotted = format!("{}.{}", desc.name, sub.name);
                    let qualified = format!("{}.{}", desc.flat_name(), sub.name);
                    if flat_name == dotted || flat_name == qualified {
                        return Some((sub, dotted));
                    }
                }
            }
        }
        None
    }

    /// Whether the flat name addresses a declared custom attribute.
    pub fn is_custom(&self, flat_name: &str) -> bool {
        self.resolve(flat_name).is_some()
    }

    /// URIs of extension schemas that own at least one declared
    /// attribute, for stamping into the resource's `schemas` array.
    pub fn extension_uris(&self, version: ScimVersion) -> BTreeSet<&str> {
        self.descriptors
            .iter()
            .filter_map(|d| d.owning_schema_uri.as_deref())
            .filter(|uri| is_extension_uri(uri, version))
            .collect()
    }

    /// Build the JSON fragment carrying the resource's outgoing custom
    /// values, to be merged into the serialized payload.
    ///
    /// Extension-owned attributes land in an object keyed by their
    /// owning schema URI; root-level attributes are written directly.
    /// Read-only descriptors are never emitted. Returns `None` when
    /// there is nothing to merge.
    pub fn payload_fragment(
        &self,
        custom: &CustomValues,
        version: ScimVersion,
    ) -> Option<Value> {
        let mut fragment = Map::new();

        for desc in &self.descriptors {
            if desc.read_only {
                continue;
            }

            let rendered = match desc.data_type {
                CustomDataType::Complex => self.render_complex(desc, custom),
                _ => custom
                    .outgoing
                    .get(&desc.name)
                    .map(|values| render_values(desc, values)),
            };

            let Some(rendered) = rendered else { continue };

            match desc.owning_schema_uri.as_deref() {
                Some(uri) if is_extension_uri(uri, version) => {
                    let slot = fragment
                        .entry(uri.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(ext) = slot {
                        ext.insert(desc.name.clone(), rendered);
                    }
                }
                _ => {
                    fragment.insert(desc.name.clone(), rendered);
                }
            }
        }

        if fragment.is_empty() {
            None
        } else {
            Some(Value::Object(fragment))
        }
    }

    fn render_complex(
        &self,
        desc: &CustomAttributeDescriptor,
        custom: &CustomValues,
    ) -> Option<Value> {
        let mut obj = Map::new();
        for sub in &desc.sub_attributes {
            if sub.data_type == CustomDataType::Complex {
                // Only one level of nesting is supported; deeper values
                // are dropped, not merged.
                warn!(
                    attribute = %desc.name,
                    sub_attribute = %sub.name,
                    "dropping custom attribute nested more than one level deep"
                );
                continue;
            }
            let key = format!("{}.{}", desc.name, sub.name);
            if let Some(values) = custom.outgoing.get(&key) {
                obj.insert(sub.name.clone(), render_values(sub, values));
            }
        }
        if obj.is_empty() {
            None
        } else {
            Some(Value::Object(obj))
        }
    }

    /// Extract declared custom attributes from a response document into
    /// the resource's returned-values map. Absence is not an error —
    /// the target may omit unset extension attributes.
    pub fn read_back(&self, response: &Value, custom: &mut CustomValues, version: ScimVersion) {
        for desc in &self.descriptors {
            let node = match desc.owning_schema_uri.as_deref() {
                Some(uri) if is_extension_uri(uri, version) => response.get(uri),
                _ => Some(response),
            };
            let Some(node) = node else { continue };
            let Some(raw) = node.get(&desc.name) else { continue };

            match desc.data_type {
                CustomDataType::Complex => {
                    for sub in &desc.sub_attributes {
                        if let Some(sub_raw) = raw.get(&sub.name) {
                            let key = format!("{}.{}", desc.flat_name(), sub.name);
                            custom.returned.insert(key, coerce(sub_raw, sub.data_type));
                        }
                    }
                }
                _ => {
                    custom
                        .returned
                        .insert(desc.flat_name(), coerce(raw, desc.data_type));
                }
            }
        }
    }
}

/// Whether a URI denotes an extension schema (as opposed to the core
/// schema, whose attributes live at the document root).
fn is_extension_uri(uri: &str, version: ScimVersion) -> bool {
    uri.starts_with("urn:") && uri != version.user_schema() && uri != version.group_schema()
}

/// Render outgoing values per the descriptor's cardinality:
/// multi-valued descriptors emit arrays, single-valued ones collapse to
/// the lone value.
fn render_values(desc: &CustomAttributeDescriptor, values: &[Value]) -> Value {
    if desc.multi_valued || values.len() > 1 {
        Value::Array(values.to_vec())
    } else {
        values.first().cloned().unwrap_or(Value::Null)
    }
}

/// Coerce a response node to the descriptor's declared type. Text
/// nodes are parsed; natively typed nodes pass through.
fn coerce(raw: &Value, data_type: CustomDataType) -> Value {
    match raw {
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| coerce(v, data_type)).collect())
        }
        _ => match data_type {
            CustomDataType::Integer => match raw {
                Value::Number(_) => raw.clone(),
                Value::String(s) => s
                    .parse::<i64>()
                    .map(|i| Value::Number(i.into()))
                    .unwrap_or_else(|_| raw.clone()),
                _ => raw.clone(),
            },
            CustomDataType::Boolean => match raw {
                Value::Bool(_) => raw.clone(),
                Value::String(s) => match s.to_lowercase().as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => raw.clone(),
                },
                _ => raw.clone(),
            },
            _ => match raw {
                Value::String(_) => raw.clone(),
                other => Value::String(other.to_string()),
            },
        },
    }
}
