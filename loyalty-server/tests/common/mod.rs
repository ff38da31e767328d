// Shared helpers for the loyalty-server integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use loyalty_server::clock::ManualClock;
use loyalty_server::peer::LoyaltyPeer;
use loyalty_server::source::CustomerSource;
use loyalty_server::{AppState, Collaborators, Config, api};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
}

pub fn test_app(
    config: Config,
    source: Option<Arc<dyn CustomerSource>>,
    peer: Option<Arc<dyn LoyaltyPeer>>,
) -> TestApp {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now().timestamp_millis()));
    let state = AppState::in_memory(
        &config,
        Collaborators {
            source,
            peer,
            clock: clock.clone(),
        },
    )
    .unwrap();
    TestApp {
        router: api::create_router(state.clone()),
        state,
        clock,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn get_json(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let (status, body) = self.send(builder.body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let (status, body) = self
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        (status, String::from_utf8(body).unwrap())
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}
