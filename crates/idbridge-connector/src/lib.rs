//! # Connector Framework Core
//!
//! Shared abstractions for provisioning identity objects to external
//! systems. A connector translates between the host framework's flat
//! name/value attribute model and whatever shape the target system
//! speaks (nested JSON, LDAP entries, database rows).
//!
//! The framework uses a capability-based trait system:
//!
//! - [`traits::Connector`] - lifecycle every connector implements
//! - [`traits::CreateOp`], [`traits::UpdateOp`], [`traits::DeleteOp`] - writes
//! - [`traits::SearchOp`] - lookup and paged listing
//! - [`traits::SchemaOp`] - flat attribute vocabulary registration
//!
//! ## Crate Organization
//!
//! - [`operation`] - `Attribute`, `AttributeSet`, `Uid`, `Filter`, paging
//! - [`types`] - `ObjectClass` discriminator
//! - [`error`] - error taxonomy with transient/permanent classification
//! - [`schema`] - attribute vocabulary descriptors
//! - [`config`] - configuration traits and connection settings

pub mod config;
pub mod error;
pub mod operation;
pub mod schema;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use idbridge_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConnectionSettings, ConnectorConfig};
    pub use crate::error::{ConnectorError, ConnectorResult};
    pub use crate::operation::{
        Attribute, AttributeSet, AttributeValue, Filter, PageRequest, SearchPage, Uid,
    };
    pub use crate::schema::{AttributeDataType, AttributeDescriptor, ConnectorSchema};
    pub use crate::traits::{Connector, CreateOp, DeleteOp, SchemaOp, SearchOp, UpdateOp};
    pub use crate::types::ObjectClass;
}

// Re-export async_trait for connector implementors.
pub use async_trait::async_trait;
