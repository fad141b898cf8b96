//! SCIM wire models for User and Group resources.
//!
//! One concrete struct per resource kind, shared across protocol
//! versions; the version only decides the schema URNs stamped into the
//! `schemas` array and the endpoint layout. Serialization skips unset
//! fields so outgoing payloads contain exactly what the caller set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::{AddressType, CanonicalType, EmailType, ImType, PhotoType, PhoneType};

/// SCIM protocol version spoken by a target service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScimVersion {
    /// SCIM 1.1 (`urn:scim:schemas:core:1.0`).
    #[serde(rename = "v1")]
    V1,
    /// SCIM 2.0 (`urn:ietf:params:scim:schemas:core:2.0:*`).
    #[serde(rename = "v2")]
    V2,
}

impl ScimVersion {
    /// Core schema URN for User resources.
    pub fn user_schema(&self) -> &'static str {
        match self {
            ScimVersion::V1 => "urn:scim:schemas:core:1.0",
            ScimVersion::V2 => "urn:ietf:params:scim:schemas:core:2.0:User",
        }
    }

    /// Core schema URN for Group resources.
    pub fn group_schema(&self) -> &'static str {
        match self {
            ScimVersion::V1 => "urn:scim:schemas:core:1.0",
            ScimVersion::V2 => "urn:ietf:params:scim:schemas:core:2.0:Group",
        }
    }
}

/// Server-owned resource metadata. Never written by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Meta {
    /// True when no server metadata is present.
    pub fn is_empty(&self) -> bool {
        self.created.is_none()
            && self.last_modified.is_none()
            && self.location.is_none()
            && self.version.is_none()
    }
}

/// The `name` single-object field of a User.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub honorific_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub honorific_suffix: Option<String>,
}

impl Name {
    /// True when every component is unset.
    pub fn is_empty(&self) -> bool {
        self.formatted.is_none()
            && self.family_name.is_none()
            && self.given_name.is_none()
            && self.middle_name.is_none()
            && self.honorific_prefix.is_none()
            && self.honorific_suffix.is_none()
    }
}

/// One entry of a canonical-typed multi-valued field (emails,
/// phoneNumbers, ims, photos).
///
/// The mapping layer maintains at most one live entry per canonical
/// type: read-modify operations look an entry up by type and create it
/// only when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedEntry<T> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl<T: CanonicalType> TypedEntry<T> {
    /// Create an entry carrying only its canonical type.
    pub fn of_type(entry_type: T) -> Self {
        Self {
            entry_type: Some(entry_type),
            value: None,
            display: None,
            primary: false,
            operation: None,
        }
    }
}

/// Find the entry with the given canonical type, creating and appending
/// it when absent. This is the lookup-or-create step that keeps each
/// canonical type unique within its list.
pub fn entry_for_type<T: CanonicalType>(
    list: &mut Vec<TypedEntry<T>>,
    entry_type: T,
) -> &mut TypedEntry<T> {
    if let Some(idx) = list.iter().position(|e| e.entry_type == Some(entry_type)) {
        return &mut list[idx];
    }
    list.push(TypedEntry::of_type(entry_type));
    list.last_mut().expect("entry just appended")
}

/// One entry of an `addresses` list. Unlike the other canonical lists,
/// an address has structured sub-fields instead of a single value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEntry {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<AddressType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl AddressEntry {
    /// Create an address entry carrying only its canonical type.
    pub fn of_type(entry_type: AddressType) -> Self {
        Self {
            entry_type: Some(entry_type),
            ..Self::default()
        }
    }
}

/// Find the address entry with the given canonical type, creating and
/// appending it when absent.
pub fn address_for_type(
    list: &mut Vec<AddressEntry>,
    entry_type: AddressType,
) -> &mut AddressEntry {
    if let Some(idx) = list.iter().position(|e| e.entry_type == Some(entry_type)) {
        return &mut list[idx];
    }
    list.push(AddressEntry::of_type(entry_type));
    list.last_mut().expect("entry just appended")
}

/// One entry of a default-typed multi-valued field (roles,
/// entitlements, groups, x509Certificates, group members).
///
/// The owning list is fixed the moment the entry is pushed onto a
/// resource field; serialization never has to search for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultEntry {
    pub value: String,

    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl DefaultEntry {
    /// Create an entry from a bare value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            reference: None,
            display: None,
        }
    }
}

/// Custom-attribute values riding alongside a resource.
///
/// Outgoing values are populated from caller-supplied flat attributes
/// before a write; returned values are populated from the parsed
/// response after a read. They are kept apart because a descriptor may
/// be read-only: readable from the target yet never sent to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomValues {
    /// Values to transmit, keyed by descriptor name.
    pub outgoing: BTreeMap<String, Vec<serde_json::Value>>,

    /// Values read back, keyed by `owningSchemaURI.name` (or the bare
    /// name for root-level custom attributes).
    pub returned: BTreeMap<String, serde_json::Value>,
}

/// SCIM User resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,

    /// Server-assigned identifier. Empty until first successful create;
    /// immutable afterwards from the client's perspective.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Write-only; the target never echoes it back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<TypedEntry<EmailType>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<TypedEntry<PhoneType>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ims: Vec<TypedEntry<ImType>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<TypedEntry<PhotoType>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<AddressEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<DefaultEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entitlements: Vec<DefaultEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<DefaultEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x509_certificates: Vec<DefaultEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    /// Custom-attribute values; not part of the core wire shape. The
    /// payload builder turns outgoing values into an extension fragment
    /// merged into the serialized document.
    #[serde(skip)]
    pub custom: CustomValues,
}

impl ScimUser {
    /// Create an empty User stamped with the core schema URN for the
    /// given protocol version.
    pub fn new(version: ScimVersion) -> Self {
        Self {
            schemas: vec![version.user_schema().to_string()],
            ..Self::default()
        }
    }
}

/// SCIM Group resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<DefaultEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip)]
    pub custom: CustomValues,
}

impl ScimGroup {
    /// Create an empty Group stamped with the core schema URN for the
    /// given protocol version.
    pub fn new(version: ScimVersion) -> Self {
        Self {
            schemas: vec![version.group_schema().to_string()],
            ..Self::default()
        }
    }
}

/// SCIM list-response envelope shared by both protocol versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default)]
    pub total_results: i64,

    #[serde(default)]
    pub items_per_page: i64,

    #[serde(default)]
    pub start_index: i64,

    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}
