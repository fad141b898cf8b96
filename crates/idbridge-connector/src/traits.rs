//! Capability-based trait definitions for connectors.
//!
//! Connectors only implement the operations the target system supports;
//! the host framework discovers capabilities by downcasting to these
//! traits.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::operation::{AttributeSet, Filter, PageRequest, SearchPage, Uid};
use crate::schema::ConnectorSchema;
use crate::types::ObjectClass;

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test connectivity and credentials against the target system.
    async fn test_connection(&self) -> ConnectorResult<()>;

    /// Dispose of connector resources.
    ///
    /// Called when the connector is being removed; implementations
    /// should drop connections and clear cached credentials.
    async fn dispose(&self) -> ConnectorResult<()>;
}

/// Capability for registering the flat attribute vocabulary.
pub trait SchemaOp: Connector {
    /// The attribute vocabulary this connector understands, including
    /// any configured custom attributes.
    fn schema(&self) -> ConnectorSchema;
}

/// Capability for creating objects in the target system.
#[async_trait]
pub trait CreateOp: Connector {
    /// Create a new object from a set of flat attributes.
    ///
    /// Returns the server-assigned unique identifier.
    async fn create(
        &self,
        object_class: ObjectClass,
        attributes: AttributeSet,
    ) -> ConnectorResult<Uid>;
}

/// Capability for updating objects in the target system.
#[async_trait]
pub trait UpdateOp: Connector {
    /// Update an existing object by applying the given attributes.
    ///
    /// Whether the wire operation is a full replace or a partial patch
    /// is the connector's concern, not the caller's.
    async fn update(
        &self,
        object_class: ObjectClass,
        uid: &Uid,
        attributes: AttributeSet,
    ) -> ConnectorResult<Uid>;
}

/// Capability for deleting objects from the target system.
#[async_trait]
pub trait DeleteOp: Connector {
    /// Delete an object from the target system.
    async fn delete(&self, object_class: ObjectClass, uid: &Uid) -> ConnectorResult<()>;
}

/// Capability for searching objects in the target system.
#[async_trait]
pub trait SearchOp: Connector {
    /// Search for objects, optionally constrained by an equality filter.
    ///
    /// `attributes_to_get` names the flat attributes the caller wants
    /// projected; `None` means the connector's default projection.
    async fn search(
        &self,
        object_class: ObjectClass,
        filter: Option<&Filter>,
        attributes_to_get: Option<&[String]>,
        page: Option<&PageRequest>,
    ) -> ConnectorResult<SearchPage>;

    /// Get a single object by its UID.
    async fn get(
        &self,
        object_class: ObjectClass,
        uid: &Uid,
        attributes_to_get: Option<&[String]>,
    ) -> ConnectorResult<Option<AttributeSet>> {
        let filter = Filter::eq(uid.attribute_name(), uid.value());
        let page = self
            .search(object_class, Some(&filter), attributes_to_get, None)
            .await?;
        Ok(page.objects.into_iter().next())
    }
}
