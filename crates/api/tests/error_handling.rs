//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use stockroom_api::error::AppError;
use stockroom_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(AppError::not_found("Product", "PRD_X")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Product with id PRD_X not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let (status, json) = error_to_response(AppError::validation("owner_id is required")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "owner_id is required");
}

#[tokio::test]
async fn locked_error_returns_423_with_holder() {
    let locked_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
    let err = AppError::Core(CoreError::Locked {
        locked_by: "session-a".into(),
        locked_at,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(json["code"], "LOCKED");
    assert_eq!(json["locked_by"], "session-a");
    assert_eq!(json["locked_at"], "2026-03-01T09:30:00Z");
    assert!(json["error"].as_str().unwrap().contains("session-a"));
}

#[tokio::test]
async fn referential_integrity_error_returns_409() {
    let err = AppError::Core(CoreError::ReferentialIntegrity("still referenced".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "REFERENTIAL_INTEGRITY");
    assert_eq!(json["error"], "still referenced");
}

#[tokio::test]
async fn insufficient_stock_error_returns_422() {
    let err = AppError::Core(CoreError::InsufficientStock {
        product_id: "PRD_X".into(),
        requested: 5,
        available: 2,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INSUFFICIENT_STOCK");
}

#[tokio::test]
async fn internal_error_hides_details() {
    let err = AppError::InternalError("connection string leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("bad body".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}
