//! Integration tests for the capability-trait surface: configuration,
//! connection probing, and per-object-class dispatch.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idbridge_connector::operation::{AttributeSet, Uid};
use idbridge_connector::prelude::*;
use idbridge_connector_scim::{ScimConfig, ScimConnector};

fn connector_for(server: &MockServer) -> ScimConnector {
    let config = ScimConfig::new(server.uri()).with_bearer_token("test-token-123");
    ScimConnector::new(config).unwrap()
}

#[tokio::test]
async fn test_connection_probes_with_minimal_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Users"))
        .and(query_param("startIndex", "1"))
        .and(query_param("count", "1"))
        .and(header("Authorization", "Bearer test-token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalResults": 1,
            "itemsPerPage": 1,
            "startIndex": 1,
            "Resources": [{"id": "u-1", "userName": "a"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    connector_for(&server).test_connection().await.unwrap();
}

#[tokio::test]
async fn test_connection_reports_unreachable_target() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Users"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = connector_for(&server).test_connection().await.unwrap_err();
    assert!(err.is_transient(), "503 should be transient: {err:?}");
}

#[tokio::test]
async fn create_dispatches_by_object_class() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Groups"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "g-1",
            "displayName": "Engineers"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector_for(&server);
    let attrs = AttributeSet::new().with("displayName", "Engineers");
    let uid = connector.create(ObjectClass::Group, attrs).await.unwrap();
    assert_eq!(uid.value(), "g-1");
}

#[tokio::test]
async fn get_returns_none_for_missing_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let connector = connector_for(&server);
    let found = connector
        .get(ObjectClass::User, &Uid::from_id("ghost"), None)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn get_restricts_to_requested_attributes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1",
            "userName": "alice@example.com",
            "title": "Engineer",
            "active": true
        })))
        .mount(&server)
        .await;

    let connector = connector_for(&server);
    let attrs = connector
        .get(
            ObjectClass::User,
            &Uid::from_id("u-1"),
            Some(&["userName".to_string()]),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(attrs.get_str("userName"), Some("alice@example.com"));
    assert_eq!(attrs.get_str("id"), Some("u-1"));
    assert!(!attrs.has("title"));
    assert!(!attrs.has("active"));
}

#[tokio::test]
async fn search_supports_users_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Users"))
        .and(query_param("filter", "userName eq \"alice\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalResults": 1,
            "itemsPerPage": 1,
            "startIndex": 1,
            "Resources": [{"id": "u-1", "userName": "alice"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector_for(&server);
    let filter = Filter::eq("userName", "alice");
    let page = connector
        .search(ObjectClass::User, Some(&filter), None, None)
        .await
        .unwrap();
    assert_eq!(page.count(), 1);
    assert_eq!(page.objects[0].get_str("userName"), Some("alice"));

    let err = connector
        .search(ObjectClass::Group, Some(&filter), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_OBJECT_CLASS");
}

#[tokio::test]
async fn delete_dispatches_by_object_class() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/Groups/g-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    connector_for(&server)
        .delete(ObjectClass::Group, &Uid::from_id("g-1"))
        .await
        .unwrap();
}

#[test]
fn construction_rejects_invalid_configuration() {
    let err = ScimConnector::new(ScimConfig::new("not a url")).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");

    let bad_schema = ScimConfig::new("https://scim.example.com/v2")
        .with_custom_attributes_schema(json!({"attributes": "not-an-array"}));
    let err = ScimConnector::new(bad_schema).unwrap_err();
    assert_eq!(err.error_code(), "SCHEMA_PARSE");
}

#[test]
fn schema_registration_covers_both_object_classes() {
    let config = ScimConfig::new("https://scim.example.com/v2");
    let connector = ScimConnector::new(config).unwrap();
    let schema = connector.schema();

    assert!(schema.object_class(ObjectClass::User).is_some());
    assert!(schema.object_class(ObjectClass::Group).is_some());
    assert!(connector.display_name().contains("scim.example.com"));
}
