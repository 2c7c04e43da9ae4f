//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use bookclub_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] bookclub_core::Error),

  #[error("missing or unknown X-User-Id")]
  Unauthenticated,

  #[error("bad request: {0}")]
  BadRequest(String),
}

/// Lift any store error into an [`ApiError`] through the core taxonomy.
pub(crate) fn store<E: Into<bookclub_core::Error>>(e: E) -> ApiError {
  ApiError::Domain(e.into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Domain(e) => {
        let status = match e.kind() {
          ErrorKind::Validation => StatusCode::BAD_REQUEST,
          ErrorKind::NotFound => StatusCode::NOT_FOUND,
          ErrorKind::Capacity | ErrorKind::Conflict => StatusCode::CONFLICT,
          ErrorKind::Forbidden => StatusCode::FORBIDDEN,
          ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = if e.kind() == ErrorKind::Internal {
          tracing::error!(error = %e, "request failed");
          "internal error".to_string()
        } else {
          e.to_string()
        };
        (status, json!({
          "error":     message,
          "kind":      e.kind(),
          "code":      e.code(),
          "retryable": e.is_retryable(),
        }))
      }
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, json!({
        "error":     self.to_string(),
        "kind":      "unauthenticated",
        "code":      "unauthenticated",
        "retryable": false,
      })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({
        "error":     m,
        "kind":      ErrorKind::Validation,
        "code":      "bad_request",
        "retryable": false,
      })),
    };
    (status, Json(body)).into_response()
  }
}
