//! Canonical sub-type registry for multi-valued complex attributes.
//!
//! SCIM disambiguates entries of a multi-valued complex field by a fixed
//! enumerated `type` (`emails.work.value` vs `emails.home.value`). The
//! enumerations here are closed: a type string outside the registry is
//! not a canonical type and the owning flat name falls through to
//! custom-attribute handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behavior of every canonical sub-type enumeration.
pub trait CanonicalType: Copy + PartialEq + Sized {
    /// The exact wire string for this type.
    fn as_str(&self) -> &'static str;

    /// Parse the exact (case-sensitive) wire string.
    fn parse(s: &str) -> Option<Self>;
}

/// Canonical types for `emails`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Work,
    Home,
    Other,
}

impl CanonicalType for EmailType {
    fn as_str(&self) -> &'static str {
        match self {
            EmailType::Work => "work",
            EmailType::Home => "home",
            EmailType::Other => "other",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(EmailType::Work),
            "home" => Some(EmailType::Home),
            "other" => Some(EmailType::Other),
            _ => None,
        }
    }
}

/// Canonical types for `phoneNumbers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneType {
    Work,
    Home,
    Other,
    Pager,
    Fax,
    Mobile,
}

impl CanonicalType for PhoneType {
    fn as_str(&self) -> &'static str {
        match self {
            PhoneType::Work => "work",
            PhoneType::Home => "home",
            PhoneType::Other => "other",
            PhoneType::Pager => "pager",
            PhoneType::Fax => "fax",
            PhoneType::Mobile => "mobile",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(PhoneType::Work),
            "home" => Some(PhoneType::Home),
            "other" => Some(PhoneType::Other),
            "pager" => Some(PhoneType::Pager),
            "fax" => Some(PhoneType::Fax),
            "mobile" => Some(PhoneType::Mobile),
            _ => None,
        }
    }
}

/// Canonical types for `ims` (instant messaging handles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImType {
    Aim,
    Xmpp,
    Skype,
    Qq,
    Yahoo,
    Msn,
    Icq,
    Gtalk,
}

impl CanonicalType for ImType {
    fn as_str(&self) -> &'static str {
        match self {
            ImType::Aim => "aim",
            ImType::Xmpp => "xmpp",
            ImType::Skype => "skype",
            ImType::Qq => "qq",
            ImType::Yahoo => "yahoo",
            ImType::Msn => "msn",
            ImType::Icq => "icq",
            ImType::Gtalk => "gtalk",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "aim" => Some(ImType::Aim),
            "xmpp" => Some(ImType::Xmpp),
            "skype" => Some(ImType::Skype),
            "qq" => Some(ImType::Qq),
            "yahoo" => Some(ImType::Yahoo),
            "msn" => Some(ImType::Msn),
            "icq" => Some(ImType::Icq),
            "gtalk" => Some(ImType::Gtalk),
            _ => None,
        }
    }
}

/// Canonical types for `photos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoType {
    Photo,
    Thumbnail,
}

impl CanonicalType for PhotoType {
    fn as_str(&self) -> &'static str {
        match self {
            PhotoType::Photo => "photo",
            PhotoType::Thumbnail => "thumbnail",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(PhotoType::Photo),
            "thumbnail" => Some(PhotoType::Thumbnail),
            _ => None,
        }
    }
}

/// Canonical types for `addresses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Work,
    Home,
    Other,
}

impl CanonicalType for AddressType {
    fn as_str(&self) -> &'static str {
        match self {
            AddressType::Work => "work",
            AddressType::Home => "home",
            AddressType::Other => "other",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(AddressType::Work),
            "home" => Some(AddressType::Home),
            "other" => Some(AddressType::Other),
            _ => None,
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        })*
    };
}

display_as_str!(EmailType, PhoneType, ImType, PhotoType, AddressType);

/// Check whether `candidate` is a valid canonical type string for the
/// given base field. Used by the name codec to decide whether a dotted
/// middle segment is a canonical type or part of a custom name.
pub fn is_canonical_for(base: &str, candidate: &str) -> bool {
    match base {
        "emails" => EmailType::parse(candidate).is_some(),
        "phoneNumbers" => PhoneType::parse(candidate).is_some(),
        "ims" => ImType::parse(candidate).is_some(),
        "photos" => PhotoType::parse(candidate).is_some(),
        "addresses" => AddressType::parse(candidate).is_some(),
        _ => false,
    }
}
