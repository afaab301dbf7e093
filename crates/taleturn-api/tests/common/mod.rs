//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use taleturn_narrative::application::controller::TurnController;
use taleturn_narrative::application::driver::SessionDriver;
use taleturn_test_support::{FixedClock, ScriptedBackend};
use tower::ServiceExt;

use taleturn_api::routes;
use taleturn_api::state::AppState;

/// Build the full app router over `backend` with a fixed clock. Uses the
/// same route structure as `main.rs`.
pub fn build_test_app(backend: &Arc<ScriptedBackend>) -> (Router, Arc<SessionDriver>) {
    let controller = TurnController::new(backend.clone(), Arc::new(FixedClock::default()));
    let driver = Arc::new(SessionDriver::new(Arc::new(controller)));
    (routes::app(AppState::new(Arc::clone(&driver))), driver)
}

/// Wait for the turn the backend just started to settle.
pub async fn settle(backend: &ScriptedBackend, driver: &SessionDriver) {
    backend.started().await;
    let mut state = driver.controller().subscribe();
    state.wait_for(|turn| !turn.is_running()).await.unwrap();
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Empty bodies come back as `Value::Null`.
async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}
