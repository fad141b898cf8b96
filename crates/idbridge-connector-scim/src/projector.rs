//! Resource ⇄ flat attribute projection.
//!
//! `*_to_attributes` walks every declared field of a resource through
//! explicit per-field dispatch (no runtime type inspection), skipping
//! unset fields. `apply_*_attributes` is the reverse: each flat name is
//! decoded and routed to a setter, with lookup-or-create semantics for
//! canonical-typed lists.
//!
//! Policy notes carried over from the host framework's tolerance of
//! extra attributes: inbound names that decode to a server-owned field
//! (`id`, `meta.*`) are ignored, and names that are neither core nor
//! declared custom attributes are dropped with a warning rather than
//! rejected.

use serde_json::Value;
use tracing::warn;

use idbridge_connector::operation::{Attribute, AttributeSet, AttributeValue};

use crate::canonical::{
    AddressType, CanonicalType, EmailType, ImType, PhotoType, PhoneType,
};
use crate::codec::{decode, encode, DecodedName};
use crate::custom::CustomAttributeSchema;
use crate::resource::{
    address_for_type, entry_for_type, AddressEntry, DefaultEntry, ScimGroup, ScimUser, TypedEntry,
};

// ── Resource → attributes ─────────────────────────────────────────────

/// Project a User to its flat attribute set.
///
/// Server-owned fields (`id`, `meta.*`) are included so callers can see
/// them; they are simply never settable on the way back in.
pub fn user_to_attributes(user: &ScimUser) -> AttributeSet {
    let mut attrs = AttributeSet::new();

    push_str(&mut attrs, "id", user.id.as_deref());
    push_str(&mut attrs, "externalId", user.external_id.as_deref());
    push_str(&mut attrs, "userName", user.user_name.as_deref());
    push_str(&mut attrs, "displayName", user.display_name.as_deref());
    push_str(&mut attrs, "nickName", user.nick_name.as_deref());
    push_str(&mut attrs, "profileUrl", user.profile_url.as_deref());
    push_str(&mut attrs, "title", user.title.as_deref());
    push_str(&mut attrs, "userType", user.user_type.as_deref());
    push_str(
        &mut attrs,
        "preferredLanguage",
        user.preferred_language.as_deref(),
    );
    push_str(&mut attrs, "locale", user.locale.as_deref());
    push_str(&mut attrs, "timezone", user.timezone.as_deref());
    if let Some(active) = user.active {
        attrs.set(Attribute::single("active", active));
    }

    if let Some(name) = &user.name {
        push_str(&mut attrs, "name.formatted", name.formatted.as_deref());
        push_str(&mut attrs, "name.familyName", name.family_name.as_deref());
        push_str(&mut attrs, "name.givenName", name.given_name.as_deref());
        push_str(&mut attrs, "name.middleName", name.middle_name.as_deref());
        push_str(
            &mut attrs,
            "name.honorificPrefix",
            name.honorific_prefix.as_deref(),
        );
        push_str(
            &mut attrs,
            "name.honorificSuffix",
            name.honorific_suffix.as_deref(),
        );
    }

    emit_typed_entries(&mut attrs, "emails", &user.emails);
    emit_typed_entries(&mut attrs, "phoneNumbers", &user.phone_numbers);
    emit_typed_entries(&mut attrs, "ims", &user.ims);
    emit_typed_entries(&mut attrs, "photos", &user.photos);
    emit_addresses(&mut attrs, &user.addresses);

    emit_default_entries(&mut attrs, "roles", &user.roles);
    emit_default_entries(&mut attrs, "entitlements", &user.entitlements);
    emit_default_entries(&mut attrs, "groups", &user.groups);
    emit_default_entries(&mut attrs, "x509Certificates", &user.x509_certificates);

    if let Some(meta) = &user.meta {
        push_str(&mut attrs, "meta.created", meta.created.as_deref());
        push_str(&mut attrs, "meta.lastModified", meta.last_modified.as_deref());
        push_str(&mut attrs, "meta.location", meta.location.as_deref());
        push_str(&mut attrs, "meta.version", meta.version.as_deref());
    }

    emit_custom_returned(&mut attrs, &user.custom.returned);

    attrs
}

/// Project a Group to its flat attribute set.
pub fn group_to_attributes(group: &ScimGroup) -> AttributeSet {
    let mut attrs = AttributeSet::new();

    push_str(&mut attrs, "id", group.id.as_deref());
    push_str(&mut attrs, "externalId", group.external_id.as_deref());
    push_str(&mut attrs, "displayName", group.display_name.as_deref());
    emit_default_entries(&mut attrs, "members", &group.members);

    if let Some(meta) = &group.meta {
        push_str(&mut attrs, "meta.created", meta.created.as_deref());
        push_str(&mut attrs, "meta.lastModified", meta.last_modified.as_deref());
        push_str(&mut attrs, "meta.location", meta.location.as_deref());
        push_str(&mut attrs, "meta.version", meta.version.as_deref());
    }

    emit_custom_returned(&mut attrs, &group.custom.returned);

    attrs
}

fn push_str(attrs: &mut AttributeSet, name: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.trim().is_empty() {
            attrs.set(Attribute::single(name, v));
        }
    }
}

fn emit_typed_entries<T: CanonicalType>(
    attrs: &mut AttributeSet,
    base: &str,
    entries: &[TypedEntry<T>],
) {
    for entry in entries {
        let Some(entry_type) = entry.entry_type else {
            // An entry with no canonical type has no flat address.
            warn!(base, "skipping multi-valued entry without canonical type");
            continue;
        };
        let t = entry_type.as_str();
        if let Some(value) = entry.value.as_deref() {
            if !value.trim().is_empty() {
                attrs.set(Attribute::single(encode(base, Some(t), "value"), value));
            }
        }
        if let Some(display) = entry.display.as_deref() {
            if !display.trim().is_empty() {
                attrs.set(Attribute::single(encode(base, Some(t), "display"), display));
            }
        }
        if entry.primary {
            attrs.set(Attribute::single(encode(base, Some(t), "primary"), true));
        }
        if let Some(op) = entry.operation.as_deref() {
            if !op.trim().is_empty() {
                attrs.set(Attribute::single(encode(base, Some(t), "operation"), op));
            }
        }
    }
}

fn emit_addresses(attrs: &mut AttributeSet, entries: &[AddressEntry]) {
    for entry in entries {
        let Some(entry_type) = entry.entry_type else {
            warn!("skipping address entry without canonical type");
            continue;
        };
        let t = entry_type.as_str();
        let leaves = [
            ("streetAddress", entry.street_address.as_deref()),
            ("locality", entry.locality.as_deref()),
            ("region", entry.region.as_deref()),
            ("postalCode", entry.postal_code.as_deref()),
            ("country", entry.country.as_deref()),
            ("formatted", entry.formatted.as_deref()),
            ("operation", entry.operation.as_deref()),
        ];
        for (leaf, value) in leaves {
            if let Some(v) = value {
                if !v.trim().is_empty() {
                    attrs.set(Attribute::single(encode("addresses", Some(t), leaf), v));
                }
            }
        }
        if entry.primary {
            attrs.set(Attribute::single(
                encode("addresses", Some(t), "primary"),
                true,
            ));
        }
    }
}

/// Emit a default-typed list as one `<base>.default.value` attribute.
/// A single entry collapses to a scalar value; several entries form a
/// multi-valued attribute. Downstream consumers key off cardinality, so
/// the collapse is load-bearing.
fn emit_default_entries(attrs: &mut AttributeSet, base: &str, entries: &[DefaultEntry]) {
    let values: Vec<AttributeValue> = entries
        .iter()
        .filter(|e| !e.value.trim().is_empty())
        .map(|e| AttributeValue::from(e.value.as_str()))
        .collect();
    if values.is_empty() {
        return;
    }
    attrs.set(Attribute::multi(
        encode(base, Some("default"), "value"),
        values,
    ));
}

fn emit_custom_returned(
    attrs: &mut AttributeSet,
    returned: &std::collections::BTreeMap<String, Value>,
) {
    for (name, value) in returned {
        match value {
            Value::Array(items) => {
                let values: Vec<AttributeValue> =
                    items.iter().filter_map(json_to_attribute_value).collect();
                if !values.is_empty() {
                    attrs.set(Attribute::multi(name.clone(), values));
                }
            }
            other => {
                if let Some(v) = json_to_attribute_value(other) {
                    attrs.set(Attribute::multi(name.clone(), vec![v]));
                }
            }
        }
    }
}

fn json_to_attribute_value(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::String(s) => Some(AttributeValue::String(s.clone())),
        Value::Bool(b) => Some(AttributeValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(AttributeValue::Integer)
            .or_else(|| Some(AttributeValue::String(n.to_string()))),
        _ => None,
    }
}

// ── Attributes → resource ─────────────────────────────────────────────

/// Apply flat attributes to a User in place.
pub fn apply_user_attributes(
    user: &mut ScimUser,
    attrs: &AttributeSet,
    schema: &CustomAttributeSchema,
) {
    for attr in attrs.iter() {
        if attr.is_empty() {
            continue;
        }
        match decode(attr.name()) {
            DecodedName::Simple(name) => apply_user_simple(user, name, attr, schema),
            DecodedName::Nested { base: "name", leaf } => {
                let name = user.name.get_or_insert_with(Default::default);
                let text = first_text(attr);
                match leaf {
                    "formatted" => name.formatted = Some(text),
                    "familyName" => name.family_name = Some(text),
                    "givenName" => name.given_name = Some(text),
                    "middleName" => name.middle_name = Some(text),
                    "honorificPrefix" => name.honorific_prefix = Some(text),
                    "honorificSuffix" => name.honorific_suffix = Some(text),
                    _ => unreachable!("codec admits only known name leaves"),
                }
            }
            // meta is server-owned; inbound values are dropped.
            DecodedName::Nested { base: "meta", .. } => {}
            DecodedName::Nested { .. } => unreachable!("codec admits only name/meta nesting"),
            DecodedName::Canonical {
                base,
                canonical,
                leaf,
            } => apply_user_canonical(user, base, canonical, leaf, attr),
            DecodedName::Default { base, .. } => match base {
                "roles" => user.roles = default_entries(attr),
                "entitlements" => user.entitlements = default_entries(attr),
                "groups" => user.groups = default_entries(attr),
                "x509Certificates" => user.x509_certificates = default_entries(attr),
                _ => warn!(name = attr.name(), "ignoring non-user default-typed attribute"),
            },
            DecodedName::Unknown(name) => apply_custom(&mut user.custom, name, attr, schema),
        }
    }
}

/// Apply flat attributes to a Group in place.
pub fn apply_group_attributes(
    group: &mut ScimGroup,
    attrs: &AttributeSet,
    schema: &CustomAttributeSchema,
) {
    for attr in attrs.iter() {
        if attr.is_empty() {
            continue;
        }
        match decode(attr.name()) {
            DecodedName::Simple("displayName") => {
                group.display_name = Some(first_text(attr));
            }
            DecodedName::Simple("externalId") => {
                group.external_id = Some(first_text(attr));
            }
            DecodedName::Simple("id") | DecodedName::Nested { base: "meta", .. } => {}
            DecodedName::Default { base: "members", .. } => {
                group.members = default_entries(attr);
            }
            DecodedName::Simple(name) => apply_custom(&mut group.custom, name, attr, schema),
            DecodedName::Unknown(name) => apply_custom(&mut group.custom, name, attr, schema),
            other => {
                let _ = other;
                warn!(name = attr.name(), "ignoring attribute not applicable to groups");
            }
        }
    }
}

fn apply_user_simple(
    user: &mut ScimUser,
    name: &str,
    attr: &Attribute,
    schema: &CustomAttributeSchema,
) {
    match name {
        "userName" => user.user_name = Some(first_text(attr)),
        "externalId" => user.external_id = Some(first_text(attr)),
        "displayName" => user.display_name = Some(first_text(attr)),
        "nickName" => user.nick_name = Some(first_text(attr)),
        "profileUrl" => user.profile_url = Some(first_text(attr)),
        "title" => user.title = Some(first_text(attr)),
        "userType" => user.user_type = Some(first_text(attr)),
        "preferredLanguage" => user.preferred_language = Some(first_text(attr)),
        "locale" => user.locale = Some(first_text(attr)),
        "timezone" => user.timezone = Some(first_text(attr)),
        "password" => user.password = Some(first_text(attr)),
        "active" => user.active = first_bool(attr),
        // Server-owned; never settable from attributes.
        "id" | "schemas" => {}
        other => apply_custom(&mut user.custom, other, attr, schema),
    }
}

fn apply_user_canonical(
    user: &mut ScimUser,
    base: &str,
    canonical: &str,
    leaf: &str,
    attr: &Attribute,
) {
    match base {
        "emails" => {
            let t = EmailType::parse(canonical).expect("codec-validated canonical type");
            set_entry_leaf(entry_for_type(&mut user.emails, t), leaf, attr);
        }
        "phoneNumbers" => {
            let t = PhoneType::parse(canonical).expect("codec-validated canonical type");
            set_entry_leaf(entry_for_type(&mut user.phone_numbers, t), leaf, attr);
        }
        "ims" => {
            let t = ImType::parse(canonical).expect("codec-validated canonical type");
            set_entry_leaf(entry_for_type(&mut user.ims, t), leaf, attr);
        }
        "photos" => {
            let t = PhotoType::parse(canonical).expect("codec-validated canonical type");
            set_entry_leaf(entry_for_type(&mut user.photos, t), leaf, attr);
        }
        "addresses" => {
            let t = AddressType::parse(canonical).expect("codec-validated canonical type");
            set_address_leaf(address_for_type(&mut user.addresses, t), leaf, attr);
        }
        _ => unreachable!("codec admits only canonical bases"),
    }
}

fn set_entry_leaf<T: CanonicalType>(entry: &mut TypedEntry<T>, leaf: &str, attr: &Attribute) {
    match leaf {
        "value" => entry.value = Some(first_text(attr)),
        "display" => entry.display = Some(first_text(attr)),
        "primary" => entry.primary = first_bool(attr).unwrap_or(false),
        "operation" => entry.operation = Some(first_text(attr)),
        _ => unreachable!("codec admits only known entry leaves"),
    }
}

fn set_address_leaf(entry: &mut AddressEntry, leaf: &str, attr: &Attribute) {
    match leaf {
        "streetAddress" => entry.street_address = Some(first_text(attr)),
        "locality" => entry.locality = Some(first_text(attr)),
        "region" => entry.region = Some(first_text(attr)),
        "postalCode" => entry.postal_code = Some(first_text(attr)),
        "country" => entry.country = Some(first_text(attr)),
        "formatted" => entry.formatted = Some(first_text(attr)),
        "primary" => entry.primary = first_bool(attr).unwrap_or(false),
        "operation" => entry.operation = Some(first_text(attr)),
        _ => unreachable!("codec admits only known address leaves"),
    }
}

fn apply_custom(
    custom: &mut crate::resource::CustomValues,
    name: &str,
    attr: &Attribute,
    schema: &CustomAttributeSchema,
) {
    match schema.resolve(name) {
        Some((_, key)) => {
            let values: Vec<Value> = attr.values().iter().map(|v| v.to_json()).collect();
            custom.outgoing.insert(key, values);
        }
        None => {
            // Lenient-decode policy: unrecognized names are dropped,
            // matching the host framework's tolerance of extra
            // attributes.
            warn!(name, "ignoring unrecognized flat attribute");
        }
    }
}

fn default_entries(attr: &Attribute) -> Vec<DefaultEntry> {
    attr.values()
        .iter()
        .map(|v| DefaultEntry::new(v.to_text()))
        .filter(|e| !e.value.trim().is_empty())
        .collect()
}

fn first_text(attr: &Attribute) -> String {
    attr.first().map(AttributeValue::to_text).unwrap_or_default()
}

fn first_bool(attr: &Attribute) -> Option<bool> {
    attr.first().and_then(|v| match v {
        AttributeValue::Boolean(b) => Some(*b),
        AttributeValue::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        AttributeValue::Integer(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Meta, ScimVersion};
    use idbridge_connector::operation::AttributeValue;
    use serde_json::json;

    fn sample_attrs() -> AttributeSet {
        AttributeSet::new()
            .with("userName", "alice@example.com")
            .with("displayName", "Alice Smith")
            .with("name.givenName", "Alice")
            .with("name.familyName", "Smith")
            .with("active", true)
            .with("emails.work.value", "alice@example.com")
            .with("emails.work.primary", true)
            .with("emails.home.value", "alice@home.example")
            .with("phoneNumbers.mobile.value", "+15551234")
            .with("addresses.work.streetAddress", "1 Main St")
            .with("addresses.work.locality", "Springfield")
            .with("roles.default.value", "developer")
            .with_multi(
                "entitlements.default.value",
                vec![
                    AttributeValue::from("vpn"),
                    AttributeValue::from("build-server"),
                ],
            )
    }

    #[test]
    fn apply_builds_nested_resource() {
        let mut user = ScimUser::new(ScimVersion::V2);
        apply_user_attributes(&mut user, &sample_attrs(), &CustomAttributeSchema::empty());

        assert_eq!(user.user_name.as_deref(), Some("alice@example.com"));
        assert_eq!(user.name.as_ref().unwrap().given_name.as_deref(), Some("Alice"));
        assert_eq!(user.active, Some(true));
        assert_eq!(user.emails.len(), 2);
        let work = user
            .emails
            .iter()
            .find(|e| e.entry_type == Some(EmailType::Work))
            .unwrap();
        assert_eq!(work.value.as_deref(), Some("alice@example.com"));
        assert!(work.primary);
        assert_eq!(user.addresses[0].street_address.as_deref(), Some("1 Main St"));
        assert_eq!(user.roles.len(), 1);
        assert_eq!(user.entitlements.len(), 2);
    }

    #[test]
    fn round_trip_reproduces_writable_fields() {
        let mut user = ScimUser::new(ScimVersion::V2);
        let attrs = sample_attrs();
        apply_user_attributes(&mut user, &attrs, &CustomAttributeSchema::empty());

        let projected = user_to_attributes(&user);
        let mut rebuilt = ScimUser::new(ScimVersion::V2);
        apply_user_attributes(&mut rebuilt, &projected, &CustomAttributeSchema::empty());

        assert_eq!(user, rebuilt);
        // And the projection itself carries every original name.
        for name in attrs.names() {
            assert!(projected.has(name), "missing {name} after round trip");
        }
    }

    #[test]
    fn read_only_fields_are_never_applied() {
        let mut user = ScimUser::new(ScimVersion::V2);
        let attrs = AttributeSet::new()
            .with("id", "forged")
            .with("meta.created", "2020-01-01T00:00:00Z")
            .with("meta.version", "W/\"1\"")
            .with("userName", "bob");
        apply_user_attributes(&mut user, &attrs, &CustomAttributeSchema::empty());

        assert_eq!(user.id, None);
        assert_eq!(user.meta, None);
        assert_eq!(user.user_name.as_deref(), Some("bob"));
    }

    #[test]
    fn read_only_fields_are_projected_on_read() {
        let mut user = ScimUser::new(ScimVersion::V2);
        user.id = Some("u-1".to_string());
        user.meta = Some(Meta {
            created: Some("2024-01-01T00:00:00Z".to_string()),
            ..Meta::default()
        });
        let attrs = user_to_attributes(&user);
        assert_eq!(attrs.get_str("id"), Some("u-1"));
        assert_eq!(attrs.get_str("meta.created"), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn canonical_type_stays_unique_across_applications() {
        let mut user = ScimUser::new(ScimVersion::V2);
        let schema = CustomAttributeSchema::empty();

        let first = AttributeSet::new().with("emails.work.value", "a@x");
        let second = AttributeSet::new()
            .with("emails.work.value", "b@x")
            .with("emails.work.primary", true);
        apply_user_attributes(&mut user, &first, &schema);
        apply_user_attributes(&mut user, &second, &schema);

        let work: Vec<_> = user
            .emails
            .iter()
            .filter(|e| e.entry_type == Some(EmailType::Work))
            .collect();
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].value.as_deref(), Some("b@x"));
        assert!(work[0].primary);
    }

    #[test]
    fn default_lists_never_swap() {
        let mut user = ScimUser::new(ScimVersion::V2);
        user.roles.push(DefaultEntry::new("developer"));
        user.entitlements.push(DefaultEntry::new("vpn"));

        let attrs = user_to_attributes(&user);
        assert_eq!(attrs.get_str("roles.default.value"), Some("developer"));
        assert_eq!(attrs.get_str("entitlements.default.value"), Some("vpn"));
        assert!(!attrs.has("groups.default.value"));
    }

    #[test]
    fn singleton_default_list_collapses_to_scalar() {
        let mut user = ScimUser::new(ScimVersion::V2);
        user.roles.push(DefaultEntry::new("developer"));
        user.entitlements.push(DefaultEntry::new("vpn"));
        user.entitlements.push(DefaultEntry::new("build-server"));

        let attrs = user_to_attributes(&user);
        assert!(!attrs.get("roles.default.value").unwrap().is_multi_valued());
        assert!(attrs
            .get("entitlements.default.value")
            .unwrap()
            .is_multi_valued());
    }

    #[test]
    fn blank_entry_leaves_are_not_projected() {
        let mut user = ScimUser::new(ScimVersion::V2);
        let mut entry = TypedEntry::of_type(EmailType::Work);
        entry.value = Some("alice@example.com".to_string());
        entry.display = Some("  ".to_string());
        entry.operation = Some(String::new());
        user.emails.push(entry);

        let attrs = user_to_attributes(&user);
        assert_eq!(attrs.get_str("emails.work.value"), Some("alice@example.com"));
        assert!(!attrs.has("emails.work.display"));
        assert!(!attrs.has("emails.work.operation"));
    }

    #[test]
    fn unrecognized_names_are_dropped() {
        let mut user = ScimUser::new(ScimVersion::V2);
        let attrs = AttributeSet::new()
            .with("favoriteColor", "teal")
            .with("emailsArchive", "old@x")
            .with("userName", "carol");
        apply_user_attributes(&mut user, &attrs, &CustomAttributeSchema::empty());

        assert_eq!(user.user_name.as_deref(), Some("carol"));
        assert!(user.custom.outgoing.is_empty());
    }

    #[test]
    fn custom_attributes_route_to_outgoing_map() {
        let doc = json!({
            "id": "urn:acme:ext",
            "name": "Acme",
            "attributes": [{"name": "department", "type": "string"}]
        });
        let schema = CustomAttributeSchema::parse(&doc, ScimVersion::V2).unwrap();

        let mut user = ScimUser::new(ScimVersion::V2);
        let attrs = AttributeSet::new().with("department", "Treasury");
        apply_user_attributes(&mut user, &attrs, &schema);

        assert_eq!(
            user.custom.outgoing.get("department"),
            Some(&vec![json!("Treasury")])
        );
    }

    #[test]
    fn returned_custom_values_are_projected() {
        let mut user = ScimUser::new(ScimVersion::V2);
        user.custom
            .returned
            .insert("urn:acme:ext.department".to_string(), json!("Treasury"));
        user.custom
            .returned
            .insert("urn:acme:ext.badges".to_string(), json!(["b-1", "b-2"]));

        let attrs = user_to_attributes(&user);
        assert_eq!(attrs.get_str("urn:acme:ext.department"), Some("Treasury"));
        assert!(attrs.get("urn:acme:ext.badges").unwrap().is_multi_valued());
    }

    #[test]
    fn group_projection_round_trips() {
        let mut group = ScimGroup::new(ScimVersion::V2);
        let attrs = AttributeSet::new()
            .with("displayName", "Engineers")
            .with_multi(
                "members.default.value",
                vec![AttributeValue::from("u-1"), AttributeValue::from("u-2")],
            );
        apply_group_attributes(&mut group, &attrs, &CustomAttributeSchema::empty());

        assert_eq!(group.display_name.as_deref(), Some("Engineers"));
        assert_eq!(group.members.len(), 2);

        let projected = group_to_attributes(&group);
        assert_eq!(projected.get_str("displayName"), Some("Engineers"));
        assert!(projected.get("members.default.value").unwrap().is_multi_valued());
    }
}
