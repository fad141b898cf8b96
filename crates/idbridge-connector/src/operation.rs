//! Operation types: UIDs, flat attributes, filters, and pagination.
//!
//! The host framework addresses everything through flat name/value
//! attributes with dotted names (`"emails.work.value"`); connectors
//! translate these into whatever the target system expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Unique identifier for an object in a target system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid {
    /// The attribute name used as the identifier (e.g., "id", "userName").
    attribute_name: String,
    /// The actual value of the identifier.
    value: String,
}

impl Uid {
    /// Create a new UID with the given attribute name and value.
    pub fn new(attribute_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            value: value.into(),
        }
    }

    /// Create a UID using the default "id" attribute name.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self::new("id", id)
    }

    /// Get the attribute name.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attribute_name, self.value)
    }
}

/// A single scalar value carried by a flat attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
}

impl AttributeValue {
    /// Get as a string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the scalar as its string form (used when a target field
    /// is declared string-typed regardless of the inbound shape).
    pub fn to_text(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Boolean(b) => b.to_string(),
        }
    }

    /// Convert into a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::String(s) => Value::String(s.clone()),
            AttributeValue::Integer(i) => Value::Number((*i).into()),
            AttributeValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

/// A flat attribute: a dotted name and an ordered sequence of scalars.
///
/// Cardinality is significant: downstream consumers key off whether an
/// attribute carries one value or several, so a singleton list and a
/// scalar are the same thing here — [`Attribute::is_multi_valued`] is
/// true only when more than one value is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    values: Vec<AttributeValue>,
}

impl Attribute {
    /// Create a single-valued attribute.
    pub fn single(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Create an attribute from an ordered sequence of values.
    pub fn multi(
        name: impl Into<String>,
        values: impl IntoIterator<Item = AttributeValue>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    /// The attribute's dotted name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values, in order.
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// The first value, if any.
    pub fn first(&self) -> Option<&AttributeValue> {
        self.values.first()
    }

    /// True when the attribute carries more than one value.
    pub fn is_multi_valued(&self) -> bool {
        self.values.len() > 1
    }

    /// True when the attribute carries no values at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A set of flat attributes keyed by name.
///
/// Attribute identity is the full dotted name; iteration order is the
/// lexicographic name order, which keeps outgoing payloads and test
/// expectations deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(flatten)]
    attributes: BTreeMap<String, Attribute>,
}

impl AttributeSet {
    /// Create a new empty attribute set.
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
        }
    }

    /// Insert an attribute, replacing any previous one of the same name.
    pub fn set(&mut self, attribute: Attribute) {
        self.attributes.insert(attribute.name().to_string(), attribute);
    }

    /// Insert a single-valued attribute using builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(Attribute::single(name, value));
        self
    }

    /// Insert a multi-valued attribute using builder style.
    pub fn with_multi(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = AttributeValue>,
    ) -> Self {
        self.set(Attribute::multi(name, values));
        self
    }

    /// Get an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Get the first value of a single- or multi-valued string attribute.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|a| a.first()).and_then(|v| v.as_str())
    }

    /// Get the first value of a boolean attribute.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|a| a.first()).and_then(|v| v.as_bool())
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    /// Get all attribute names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|s| s.as_str())
    }

    /// Iterate over all attributes in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        let mut set = Self::new();
        for attr in iter {
            set.set(attr);
        }
        set
    }
}

/// Filter for search operations.
///
/// The host framework only ever sends a single equality filter (on the
/// id or the naming attribute), so that is the only shape modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Match objects where attribute equals value.
    Equals { attribute: String, value: String },
}

impl Filter {
    /// Create an equals filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// The attribute this filter constrains.
    pub fn attribute(&self) -> &str {
        match self {
            Filter::Equals { attribute, .. } => attribute,
        }
    }

    /// The value this filter matches.
    pub fn value(&self) -> &str {
        match self {
            Filter::Equals { value, .. } => value,
        }
    }
}

/// Pagination request for search operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of results to return.
    pub page_size: u32,

    /// Opaque cookie from a previous page, echoed back to resume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl PageRequest {
    /// Create a new page request with the given page size.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            cookie: None,
        }
    }

    /// Set the cookie to resume a paged listing.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(100)
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    /// The matching objects, projected to flat attributes.
    pub objects: Vec<AttributeSet>,

    /// Cookie for the next page; `None` means the listing is complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cookie: Option<String>,

    /// Remaining result count, when the target reports a trustworthy
    /// number. Always `None` for targets that do not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
}

impl SearchPage {
    /// Create a page with no continuation.
    pub fn new(objects: Vec<AttributeSet>) -> Self {
        Self {
            objects,
            next_cookie: None,
            remaining: None,
        }
    }

    /// Set the next-page cookie.
    pub fn with_next_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.next_cookie = Some(cookie.into());
        self
    }

    /// Number of objects in this page.
    pub fn count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_display() {
        let uid = Uid::from_id("u-1");
        assert_eq!(uid.attribute_name(), "id");
        assert_eq!(uid.value(), "u-1");
        assert_eq!(uid.to_string(), "id=u-1");
    }

    #[test]
    fn attribute_cardinality() {
        let single = Attribute::single("userName", "alice@example.com");
        assert!(!single.is_multi_valued());
        assert_eq!(single.first().and_then(|v| v.as_str()), Some("alice@example.com"));

        let multi = Attribute::multi(
            "entitlements.default.value",
            vec![AttributeValue::from("a"), AttributeValue::from("b")],
        );
        assert!(multi.is_multi_valued());
        assert_eq!(multi.values().len(), 2);

        // A singleton list is not multi-valued.
        let collapsed = Attribute::multi("roles.default.value", vec![AttributeValue::from("dev")]);
        assert!(!collapsed.is_multi_valued());
    }

    #[test]
    fn attribute_set_access() {
        let attrs = AttributeSet::new()
            .with("userName", "alice")
            .with("active", true)
            .with("loginCount", 3i64);

        assert_eq!(attrs.get_str("userName"), Some("alice"));
        assert_eq!(attrs.get_bool("active"), Some(true));
        assert_eq!(
            attrs.get("loginCount").and_then(|a| a.first()).and_then(|v| v.as_i64()),
            Some(3)
        );
        assert!(!attrs.has("missing"));
    }

    #[test]
    fn attribute_set_iterates_in_name_order() {
        let attrs = AttributeSet::new()
            .with("z", "last")
            .with("a", "first")
            .with("m", "middle");
        let names: Vec<&str> = attrs.names().collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn filter_accessors() {
        let f = Filter::eq("userName", "alice");
        assert_eq!(f.attribute(), "userName");
        assert_eq!(f.value(), "alice");
    }

    #[test]
    fn search_page_continuation() {
        let page = SearchPage::new(vec![AttributeSet::new().with("id", "1")])
            .with_next_cookie("11");
        assert_eq!(page.count(), 1);
        assert_eq!(page.next_cookie.as_deref(), Some("11"));
        assert_eq!(page.remaining, None);
    }
}
