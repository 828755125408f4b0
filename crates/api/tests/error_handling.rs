//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use marquee_api::error::AppError;
use marquee_core::error::{CoreError, FieldErrors};

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn validation_error_returns_400_with_fields() {
    let mut errors = FieldErrors::new();
    errors.push("[0].title", "Title must be 1-255 characters.");
    errors.push("[0].rating", "Rating must be between 0.0 and 10.0.");

    let (status, json) = error_to_response(CoreError::Validation(errors).into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["fields"][0]["field"], "[0].title");
    assert_eq!(json["fields"][1]["message"], "Rating must be between 0.0 and 10.0.");
    assert!(json["error"].as_str().unwrap().contains("[0].rating"));
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("Movie", "SID 'MOV1234567'"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Movie with SID 'MOV1234567' not found");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("duplicate title".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "duplicate title");
}

#[tokio::test]
async fn transient_store_error_returns_503() {
    let err = AppError::Core(CoreError::TransientStore("pool exhausted".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn serialization_error_is_sanitized() {
    let err = AppError::Core(CoreError::Serialization(
        "sp_search_movies: missing field `items`".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "SERIALIZATION_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("sp_search_movies"));
}

#[tokio::test]
async fn internal_error_hides_details() {
    let err = AppError::Core(CoreError::Internal("connection string leaked".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid JSON".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid JSON");
    assert!(json.get("fields").is_none());
}
