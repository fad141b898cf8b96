//! Flat-attribute vocabulary descriptors.
//!
//! A connector reports the attributes it understands per object class
//! so the host framework can validate requests and build its own
//! schema registration.

use serde::{Deserialize, Serialize};

use crate::types::ObjectClass;

/// Data type of a flat attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeDataType {
    String,
    Boolean,
    Integer,
}

/// Descriptor for one flat attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// The dotted flat name (e.g., `emails.work.value`).
    pub name: String,

    /// Declared data type.
    pub data_type: AttributeDataType,

    /// Whether the attribute may carry more than one value.
    #[serde(default)]
    pub multi_valued: bool,

    /// Whether the attribute is server-owned and never writable.
    #[serde(default)]
    pub read_only: bool,
}

impl AttributeDescriptor {
    /// Create a writable single-valued string attribute descriptor.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: AttributeDataType::String,
            multi_valued: false,
            read_only: false,
        }
    }

    /// Create a writable boolean attribute descriptor.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: AttributeDataType::Boolean,
            multi_valued: false,
            read_only: false,
        }
    }

    /// Mark the descriptor multi-valued.
    pub fn multi(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Mark the descriptor read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// The attribute vocabulary for one object class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectClassSchema {
    /// The object class this vocabulary describes.
    pub object_class: ObjectClass,

    /// Attribute descriptors.
    pub attributes: Vec<AttributeDescriptor>,
}

/// The full schema a connector registers with the host framework.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorSchema {
    /// Per-object-class vocabularies.
    pub object_classes: Vec<ObjectClassSchema>,
}

impl ConnectorSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object-class vocabulary.
    pub fn with_object_class(
        mut self,
        object_class: ObjectClass,
        attributes: Vec<AttributeDescriptor>,
    ) -> Self {
        self.object_classes.push(ObjectClassSchema {
            object_class,
            attributes,
        });
        self
    }

    /// Look up the vocabulary for an object class.
    pub fn object_class(&self, object_class: ObjectClass) -> Option<&ObjectClassSchema> {
        self.object_classes
            .iter()
            .find(|oc| oc.object_class == object_class)
    }
}
