//! End-to-end tests of the reqwest transport against a mock HTTP server
//!
//! The mock backend issues a `session` cookie on login and rotates it on
//! refresh; protected endpoints only accept the rotated value.

use httpmock::prelude::*;
use millionhuts_core::{Config, NewComplaint, PortalAPI, PortalError};

fn config_for(server: &MockServer) -> Config {
    millionhuts_core::utils::logging::init_logging();
    let mut config = Config::default();
    config.api_base_url = server.url("/api");
    config.request_timeout_ms = 5_000;
    config
}

const ME_BODY: &str = r#"{"tenant":{"id":"t1","fullName":"Asha Rao","email":"asha@example.com"},"stayRecords":null}"#;

/// Stale cookie → 401 → refresh rotates the cookie → replay succeeds
#[tokio::test]
async fn test_cookie_session_is_refreshed_and_replayed() {
    let server = MockServer::start();

    let login_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/auth/login")
            .json_body(serde_json::json!({"identifier": "asha@example.com", "password": "secret123"}));
        then.status(200)
            .header("set-cookie", "session=stale; Path=/")
            .header("content-type", "application/json")
            .body(r#"{"message":"ok"}"#);
    });
    let stale_me = server.mock(|when, then| {
        when.method(GET)
            .path("/api/auth/me")
            .header("cookie", "session=stale");
        then.status(401).body(r#"{"message":"Token expired"}"#);
    });
    let refresh_mock = server.mock(|when, then| {
        when.method(POST).path("/api/auth/refresh");
        then.status(200)
            .header("set-cookie", "session=fresh; Path=/")
            .body(r#"{"message":"refreshed"}"#);
    });
    let fresh_me = server.mock(|when, then| {
        when.method(GET)
            .path("/api/auth/me")
            .header("cookie", "session=fresh");
        then.status(200)
            .header("content-type", "application/json")
            .body(ME_BODY);
    });

    let portal = PortalAPI::from_config(&config_for(&server)).unwrap();
    let snapshot = portal
        .session()
        .login("asha@example.com", "secret123")
        .await
        .unwrap();

    assert_eq!(snapshot.tenant.unwrap().full_name, "Asha Rao");
    login_mock.assert_calls(1);
    stale_me.assert_calls(1);
    refresh_mock.assert_calls(1);
    fresh_me.assert_calls(1);
}

/// Refresh rejected by the server → AuthExpired, no replay
#[tokio::test]
async fn test_rejected_refresh_is_auth_expired() {
    let server = MockServer::start();

    let list_mock = server.mock(|when, then| {
        when.method(GET).path("/api/complaints");
        then.status(401).body(r#"{"message":"Token expired"}"#);
    });
    let refresh_mock = server.mock(|when, then| {
        when.method(POST).path("/api/auth/refresh");
        then.status(401).body(r#"{"message":"Refresh token expired"}"#);
    });

    let portal = PortalAPI::from_config(&config_for(&server)).unwrap();
    let result = portal.complaints().list_for_tenant(None).await;

    assert!(matches!(result, Err(PortalError::AuthExpired(_))));
    list_mock.assert_calls(1);
    refresh_mock.assert_calls(1);
}

/// Complaint drafts travel as multipart with defaults filled in
#[tokio::test]
async fn test_complaint_is_posted_as_multipart() {
    let server = MockServer::start();

    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/complaints")
            .header_exists("content-type")
            .body_includes("WiFi down")
            .body_includes("OTHER")
            .body_includes("MEDIUM");
        then.status(201)
            .header("content-type", "application/json")
            .body(
                r#"{"data":{"id":"c1","title":"WiFi down","description":"No internet",
                    "status":"OPEN","createdAt":"2026-03-01T09:00:00Z"}}"#,
            );
    });

    let portal = PortalAPI::from_config(&config_for(&server)).unwrap();
    let complaint = portal
        .complaints()
        .create(NewComplaint::new("WiFi down", "No internet"))
        .await
        .unwrap();

    assert_eq!(complaint.id, "c1");
    create_mock.assert_calls(1);
}

/// Backend error messages are carried into the error value
#[tokio::test]
async fn test_backend_message_reaches_caller() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/pg/SUNRISE01");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"message":"PG not found"}"#);
    });

    let portal = PortalAPI::from_config(&config_for(&server)).unwrap();
    let result = portal.pg().find_by_code("SUNRISE01").await;

    assert_eq!(result.unwrap_err(), PortalError::NotFound("PG not found".to_string()));
}

/// Unreachable backend is a network error, never a refresh
#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let mut config = Config::default();
    config.api_base_url = "http://127.0.0.1:9/api".to_string();
    config.request_timeout_ms = 2_000;

    let portal = PortalAPI::from_config(&config).unwrap();
    let result = portal.complaints().list_for_tenant(None).await;

    assert!(matches!(result, Err(PortalError::NetworkError(_))));
    assert!(!portal.client().is_refreshing());
}
