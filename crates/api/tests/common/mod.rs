#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use stockroom_api::config::ServerConfig;
use stockroom_api::middleware::session::SESSION_HEADER;
use stockroom_api::router::build_app_router;
use stockroom_api::state::AppState;
use stockroom_core::clock::{Clock, ManualClock, SystemClock};
use stockroom_core::locking::LockPolicy;

/// Build a test `ServerConfig` with safe defaults and the given lock policy.
pub fn test_config(locks: LockPolicy) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        locks,
    }
}

/// Build the full application router against the system clock and the
/// default lock policy.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(SystemClock), LockPolicy::default())
}

/// Build the full application router with an injected clock and policy, so
/// lock expiry can be simulated.
pub fn build_test_app_with(pool: PgPool, clock: Arc<dyn Clock>, locks: LockPolicy) -> Router {
    let config = test_config(locks);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        clock,
    };
    build_app_router(state, &config)
}

/// A manual clock pinned to the current time, shared between the test and
/// every app built from it.
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::starting_now())
}

/// Send one request through the router.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    session: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_as(app: Router, uri: &str, session: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Some(session)).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(json), None).await
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    session: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(json), Some(session)).await
}

pub async fn put_json_as(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    session: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(json), Some(session)).await
}

pub async fn put_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(json), None).await
}

pub async fn delete_as(app: Router, uri: &str, session: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, Some(session)).await
}

pub async fn delete_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(json), None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a product through the API and return its id.
pub async fn create_product(app: Router, name: &str, quantity: i32) -> String {
    let response = post_json(
        app,
        "/api/v1/products",
        serde_json::json!({"name": name, "unit": "pcs", "quantity": quantity}),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Record a sale through the API and return its id.
pub async fn create_sale(app: Router, product_id: &str, quantity: i32, session: &str) -> String {
    let response = post_json_as(
        app,
        "/api/v1/sales",
        serde_json::json!({"sold_on": "2026-03-01", "product_id": product_id, "quantity": quantity}),
        session,
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Acquire a lock on `resource_id` for `owner`, returning the response.
pub async fn lock(app: Router, kind: &str, resource_id: &str, owner: &str) -> Response<Body> {
    post_json(
        app,
        "/api/v1/locks",
        serde_json::json!({"resource_kind": kind, "resource_id": resource_id, "owner_id": owner}),
    )
    .await
}
