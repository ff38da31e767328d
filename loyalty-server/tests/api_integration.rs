// HTTP-level tests for auth, loyalty updates and the loyalty customers list
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::test_app;
use http::StatusCode;
use loyalty_server::Config;
use loyalty_server::peer::{HttpLoyaltyPeer, LoyaltyPeer};
use serde_json::json;
use shared::models::CustomerId;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_health() {
    let app = test_app(Config::for_tests(), None, None);
    let (status, body) = app.get_json("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "loyalty-server");
}

#[tokio::test]
async fn test_register_login_and_list_users() {
    let app = test_app(Config::for_tests(), None, None);

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"username": "ana", "email": "Ana@Example.com", "password": "s3cret"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    let user_id = body["userId"].as_str().unwrap().to_string();

    // Same email, different case
    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"username": "ana2", "email": "ana@example.com", "password": "other"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = app
        .post_json("/api/auth/register", json!({"username": "bob"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing fields");

    let (status, body) = app
        .post_json(
            "/api/auth/login",
            json!({"email": "ana@example.com", "password": "wrong"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app
        .post_json(
            "/api/auth/login",
            json!({"email": "ANA@example.com", "password": "s3cret"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = app.get_json("/api/auth/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_json("/api/auth/users", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get_json("/api/auth/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "ana@example.com");
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_loyalty_update_endpoint_carries_units() {
    let app = test_app(Config::for_tests(), None, None);

    let (status, body) = app
        .post_json(
            "/api/loyalty/update-stamps",
            json!({"customerId": 123, "additionalStamps": 7}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"updatedLoyalty": {"stamps": 1, "count": 2}}));

    let (status, body) = app
        .post_json(
            "/api/loyalty/update-stamps",
            json!({"customerId": "123", "additionalStamps": 12}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"updatedLoyalty": {"stamps": 3, "count": 4}}));

    // Zero is accepted and reports the current counters
    let (status, body) = app
        .post_json(
            "/api/loyalty/update-stamps",
            json!({"customerId": "123", "additionalStamps": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"updatedLoyalty": {"stamps": 3, "count": 4}}));
}

#[tokio::test]
async fn test_loyalty_update_endpoint_rejects_bad_input() {
    let app = test_app(Config::for_tests(), None, None);

    let (status, body) = app
        .post_json(
            "/api/loyalty/update-stamps",
            json!({"customerId": "123", "additionalStamps": -2}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .post_json("/api/loyalty/update-stamps", json!({"additionalStamps": 2}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "customerId is required");

    let (_, list) = app.get_json("/api/loyalty-customers", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_loyalty_customers_list_is_cached_until_expiry() {
    let app = test_app(Config::for_tests(), None, None);

    app.post_json(
        "/api/loyalty/update-stamps",
        json!({"customerId": "123", "additionalStamps": 7}),
    )
    .await;

    let (status, list) = app.get_json("/api/loyalty-customers", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "DC-123");
    assert_eq!(entries[0]["loyalty"], json!({"stamps": 1, "count": 2}));

    // A write that bypasses the HTTP layer does not invalidate the cache
    let id = CustomerId::parse("456").unwrap();
    app.state
        .engine
        .apply_incremental_stamps(&id, 10)
        .await
        .unwrap();

    let (_, list) = app.get_json("/api/loyalty-customers", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    app.clock.advance(Duration::from_secs(24 * 60 * 60 + 1));

    let (_, list) = app.get_json("/api", None).await;
    let ids: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["DC-456", "DC-123"]);
}

#[tokio::test]
async fn test_batch_update_forwards_to_peer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/loyalty/update-stamps"))
        .and(body_json(json!({"customerId": "1", "additionalStamps": 5})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"updatedLoyalty": {"stamps": 1, "count": 0}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/loyalty/update-stamps"))
        .and(body_json(json!({"customerId": "2", "additionalStamps": 3})))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "down"})))
        .expect(1)
        .mount(&server)
        .await;

    let peer: Arc<dyn LoyaltyPeer> = Arc::new(
        HttpLoyaltyPeer::new(format!("{}/api/loyalty/update-stamps", server.uri()), None)
            .unwrap(),
    );
    let app = test_app(Config::for_tests(), None, Some(peer));

    let (status, body) = app
        .post_json(
            "/api/sync/update-stamps-for-members",
            json!({"updates": [
                {"customerId": "1", "additionalStamps": 5},
                {"customerId": "2", "additionalStamps": 3},
                {"customerId": "3", "additionalStamps": "lots"}
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Updated stamps for 2 members.");
    assert_eq!(body["applied"], 2);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["peerFailures"], 1);

    // Local state holds both applied entries even though one peer call failed
    let (_, list) = app.get_json("/api/loyalty-customers", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], "DC-1");

    // Throttle between entries
    assert_eq!(app.clock.sleeps_millis(), vec![50, 50]);
}

#[tokio::test]
async fn test_batch_update_requires_array() {
    let app = test_app(Config::for_tests(), None, None);

    for body in [json!({}), json!({"updates": []}), json!({"updates": {"a": 1}})] {
        let (status, reply) = app
            .post_json("/api/sync/update-stamps-for-members", body)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["error"], "Array of updates required");
    }
}
