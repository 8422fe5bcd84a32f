//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use calorice_core::{store::StoreError, user::IncompleteProfile, validate::FieldError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed")]
  Validation(Vec<FieldError>),

  #[error("incomplete profile")]
  IncompleteProfile(IncompleteProfile),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The food lacks the reference data needed to compute calories.
  #[error("{0}")]
  Undeterminable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing the domain errors that callers can act
  /// on.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    use calorice_core::Error as Core;

    let mapped = match e.as_core() {
      Some(Core::DuplicateBarcode(code)) => {
        Some(ApiError::Conflict(format!("a food with barcode {code} already exists")))
      }
      Some(Core::UserNotFound(_)) => Some(ApiError::Unauthorized),
      Some(Core::FoodNotFound(id)) => Some(ApiError::NotFound(format!("food {id} not found"))),
      Some(Core::EntryNotFound(id)) => {
        Some(ApiError::NotFound(format!("entry {id} not found")))
      }
      _ => None,
    };
    mapped.unwrap_or_else(|| ApiError::Store(Box::new(e)))
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "error": "authentication required" }))
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "validation failed", "fields": fields }),
      ),
      ApiError::IncompleteProfile(p) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "incomplete profile", "missing": p.missing }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Undeterminable(m) => (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": m })),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal server error" }))
      }
    };
    (status, Json(body)).into_response()
  }
}
