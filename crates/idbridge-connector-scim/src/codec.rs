//! Flat attribute name codec.
//!
//! Maps a dotted flat name (`"emails.work.value"`) to its structural
//! parts and back. Decoding is table-driven over the fixed SCIM base
//! fields; matching is case-sensitive and exact so a custom extension
//! attribute that merely starts with a reserved word (say
//! `emailsArchive`) can never collide with a core field.

use crate::canonical::is_canonical_for;

/// Sub-leaves of the `name` single-object field.
const NAME_LEAVES: &[&str] = &[
    "formatted",
    "familyName",
    "givenName",
    "middleName",
    "honorificPrefix",
    "honorificSuffix",
];

/// Sub-leaves of the server-owned `meta` record.
const META_LEAVES: &[&str] = &["created", "lastModified", "location", "version"];

/// Sub-leaves common to the canonical-typed lists other than addresses.
const ENTRY_LEAVES: &[&str] = &["value", "display", "primary", "operation"];

/// Sub-leaves of `addresses` entries.
const ADDRESS_LEAVES: &[&str] = &[
    "streetAddress",
    "locality",
    "region",
    "postalCode",
    "country",
    "formatted",
    "primary",
    "operation",
];

/// Base fields whose entries carry a canonical `type`.
const CANONICAL_BASES: &[&str] = &["emails", "phoneNumbers", "ims", "photos", "addresses"];

/// Base fields whose entries are plain `{value}` objects addressed with
/// the literal `default` middle segment.
const DEFAULT_BASES: &[&str] = &["roles", "entitlements", "groups", "x509Certificates", "members"];

/// Structural parts of a decoded flat attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedName<'a> {
    /// A one-segment scalar field name (`userName`, `active`).
    Simple(&'a str),

    /// A leaf of a nested single-object field (`name.givenName`,
    /// `meta.created`).
    Nested { base: &'a str, leaf: &'a str },

    /// A leaf of a canonical-typed multi-valued entry
    /// (`emails.work.value`).
    Canonical {
        base: &'a str,
        canonical: &'a str,
        leaf: &'a str,
    },

    /// The value of a default-typed multi-valued entry
    /// (`roles.default.value`).
    Default { base: &'a str, leaf: &'a str },

    /// Not a recognized core name; a custom attribute or pass-through.
    Unknown(&'a str),
}

/// Decode a dotted flat name into its structural parts.
pub fn decode(flat: &str) -> DecodedName<'_> {
    let mut segments = flat.split('.');
    let first = match segments.next() {
        Some(s) if !s.is_empty() => s,
        _ => return DecodedName::Unknown(flat),
    };
    let second = segments.next();
    let third = segments.next();

    // More than three segments is never a core name.
    if segments.next().is_some() {
        return DecodedName::Unknown(flat);
    }

    match (second, third) {
        (None, None) => DecodedName::Simple(first),
        (Some(leaf), None) => {
            let table = match first {
                "name" => NAME_LEAVES,
                "meta" => META_LEAVES,
                _ => return DecodedName::Unknown(flat),
            };
            if table.contains(&leaf) {
                DecodedName::Nested { base: first, leaf }
            } else {
                DecodedName::Unknown(flat)
            }
        }
        (Some(middle), Some(leaf)) => {
            if CANONICAL_BASES.contains(&first) && is_canonical_for(first, middle) {
                let table = if first == "addresses" {
                    ADDRESS_LEAVES
                } else {
                    ENTRY_LEAVES
                };
                if table.contains(&leaf) {
                    return DecodedName::Canonical {
                        base: first,
                        canonical: middle,
                        leaf,
                    };
                }
            }
            if DEFAULT_BASES.contains(&first) && middle == "default" && leaf == "value" {
                return DecodedName::Default { base: first, leaf };
            }
            DecodedName::Unknown(flat)
        }
        (None, Some(_)) => unreachable!("third segment without second"),
    }
}

/// Encode structural parts into a dotted flat name.
pub fn encode(base: &str, canonical: Option<&str>, leaf: &str) -> String {
    match canonical {
        Some(c) => format!("{base}.{c}.{leaf}"),
        None => format!("{base}.{leaf}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_names() {
        assert_eq!(decode("userName"), DecodedName::Simple("userName"));
        assert_eq!(decode("active"), DecodedName::Simple("active"));
    }

    #[test]
    fn decodes_nested_names() {
        assert_eq!(
            decode("name.givenName"),
            DecodedName::Nested {
                base: "name",
                leaf: "givenName"
            }
        );
        assert_eq!(
            decode("meta.lastModified"),
            DecodedName::Nested {
                base: "meta",
                leaf: "lastModified"
            }
        );
        // Unknown leaf of a known base is not a core name.
        assert_eq!(
            decode("name.nickname"),
            DecodedName::Unknown("name.nickname")
        );
    }

    #[test]
    fn decodes_canonical_names() {
        assert_eq!(
            decode("emails.work.value"),
            DecodedName::Canonical {
                base: "emails",
                canonical: "work",
                leaf: "value"
            }
        );
        assert_eq!(
            decode("phoneNumbers.pager.value"),
            DecodedName::Canonical {
                base: "phoneNumbers",
                canonical: "pager",
                leaf: "value"
            }
        );
        assert_eq!(
            decode("addresses.home.postalCode"),
            DecodedName::Canonical {
                base: "addresses",
                canonical: "home",
                leaf: "postalCode"
            }
        );
    }

    #[test]
    fn decodes_default_typed_names() {
        for base in ["roles", "entitlements", "groups", "x509Certificates", "members"] {
            let flat = format!("{base}.default.value");
            match decode(&flat) {
                DecodedName::Default { base: b, leaf } => {
                    assert_eq!(b, base);
                    assert_eq!(leaf, "value");
                }
                other => panic!("expected default decode for {flat}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_invalid_canonical_or_leaf() {
        // "pager" is not an email type.
        assert_eq!(
            decode("emails.pager.value"),
            DecodedName::Unknown("emails.pager.value")
        );
        // addresses have no "display" leaf.
        assert_eq!(
            decode("addresses.work.display"),
            DecodedName::Unknown("addresses.work.display")
        );
        // roles only expose the value leaf.
        assert_eq!(
            decode("roles.default.display"),
            DecodedName::Unknown("roles.default.display")
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(
            decode("Emails.work.value"),
            DecodedName::Unknown("Emails.work.value")
        );
        assert_eq!(
            decode("emails.Work.value"),
            DecodedName::Unknown("emails.Work.value")
        );
    }

    #[test]
    fn custom_prefixes_fall_through() {
        assert_eq!(
            decode("emailsArchive"),
            DecodedName::Simple("emailsArchive")
        );
        assert_eq!(
            decode("urn:custom:attrs.department"),
            DecodedName::Unknown("urn:custom:attrs.department")
        );
        assert_eq!(
            decode("a.b.c.d"),
            DecodedName::Unknown("a.b.c.d")
        );
    }

    #[test]
    fn encode_round_trips() {
        assert_eq!(encode("emails", Some("work"), "value"), "emails.work.value");
        assert_eq!(encode("name", None, "givenName"), "name.givenName");
        assert_eq!(
            encode("entitlements", Some("default"), "value"),
            "entitlements.default.value"
        );
    }
}
