//! Object-class discriminator for provisioning operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of identity object a connector operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    /// A user account.
    User,
    /// A group of users.
    Group,
}

impl ObjectClass {
    /// Get all object classes.
    pub fn all() -> &'static [ObjectClass] {
        &[ObjectClass::User, ObjectClass::Group]
    }

    /// Get the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::User => "user",
            ObjectClass::Group => "group",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = ParseObjectClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ObjectClass::User),
            "group" => Ok(ObjectClass::Group),
            _ => Err(ParseObjectClassError(s.to_string())),
        }
    }
}

/// Error parsing an object class from a string.
#[derive(Debug, Clone)]
pub struct ParseObjectClassError(String);

impl fmt::Display for ParseObjectClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid object class '{}', expected one of: user, group", self.0)
    }
}

impl std::error::Error for ParseObjectClassError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for oc in ObjectClass::all() {
            let parsed: ObjectClass = oc.as_str().parse().unwrap();
            assert_eq!(parsed, *oc);
        }
        assert_eq!("User".parse::<ObjectClass>().unwrap(), ObjectClass::User);
        assert!("robot".parse::<ObjectClass>().is_err());
    }
}
