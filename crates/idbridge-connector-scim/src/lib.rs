//! SCIM provisioning connector.
//!
//! Bridges the host framework's flat name/value attribute model to SCIM
//! v1.1 and v2.0 targets. The translation layer
//! ([`codec`]/[`projector`]) maps dotted flat names like
//! `emails.work.value` onto nested wire resources; the invocation layer
//! ([`client`]/[`auth`]) handles authentication, credential refresh on
//! 401, and response classification.
//!
//! Entry point: build a [`ScimConfig`], then a [`ScimConnector`]; the
//! capability traits from `idbridge-connector` do the rest.

pub mod auth;
pub mod canonical;
pub mod client;
pub mod codec;
pub mod config;
pub mod connector;
pub mod custom;
pub mod merge;
pub mod paging;
pub mod projector;
pub mod resource;
pub mod service;

pub use auth::{ScimAuth, ScimCredentials};
pub use client::ScimClient;
pub use config::{ScimConfig, UpdateMethod};
pub use connector::ScimConnector;
pub use custom::CustomAttributeSchema;
pub use resource::{ScimGroup, ScimUser, ScimVersion};
pub use service::ScimService;
