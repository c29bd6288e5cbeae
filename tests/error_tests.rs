mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
};
use common::{send, spawn_app};
use dealflow::error::AppError;
use http_body_util::BodyExt;
use serde_json::Value;

// Test for AppError Display implementation
#[test]
fn test_app_error_display() {
    let error = AppError::Validation("status is required".to_string());
    assert_eq!(error.to_string(), "status is required");

    let error = AppError::NotFound("Company not found".to_string());
    assert_eq!(error.to_string(), "Company not found");

    let error = AppError::Upstream("connection refused".to_string());
    assert_eq!(error.to_string(), "ML service error: connection refused");

    let error = AppError::Database("disk full".to_string());
    assert_eq!(error.to_string(), "Database error: disk full");

    let error = AppError::InternalError("boom".to_string());
    assert_eq!(error.to_string(), "Internal Server Error: boom");
}

#[test]
fn test_app_error_status_codes() {
    let cases = [
        (AppError::Validation(String::new()), StatusCode::BAD_REQUEST),
        (AppError::NotFound(String::new()), StatusCode::BAD_REQUEST),
        (AppError::InvalidState(String::new()), StatusCode::CONFLICT),
        (AppError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
        (AppError::Upstream(String::new()), StatusCode::BAD_GATEWAY),
        (AppError::Database(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        (AppError::SerializationError(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        (AppError::InternalError(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (error, expected) in cases {
        assert_eq!(error.status_code(), expected, "{:?}", error);
    }
}

// Test for AppError IntoResponse implementation
#[tokio::test]
async fn test_app_error_into_response() {
    let response = AppError::NotFound("Company not found".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["details"], "Company not found");
    assert_eq!(body["data"], "NotFoundError");

    let response = AppError::Database("locked".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["data"], "Internal error");
}

#[test]
fn test_serde_error_conversion() {
    let err = serde_json::from_str::<Value>("{not json").unwrap_err();
    let app_error: AppError = err.into();
    assert!(matches!(app_error, AppError::SerializationError(_)));
}

#[tokio::test]
async fn malformed_json_body_uses_the_error_envelope() {
    let app = spawn_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/companies/draft")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let (code, body) = send(&app.app, request).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"], "ValidationError");
}

#[tokio::test]
async fn missing_content_type_is_a_validation_error() {
    let app = spawn_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/companies")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .body(Body::from("{\"name\": \"Acme\"}"))
        .unwrap();

    let (code, body) = send(&app.app, request).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"], "ValidationError");
}
