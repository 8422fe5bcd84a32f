//! Error types and axum `IntoResponse` implementation for the auth routes.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::mailer::MailError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("mail delivery failed: {0}")]
  Mail(#[from] MailError),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Error::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Error::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "invalid or expired sign-in link".to_owned())
      }
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      Error::Mail(e) => {
        tracing::warn!(error = %e, "could not send sign-in email");
        (StatusCode::BAD_GATEWAY, "could not send sign-in email".to_owned())
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
