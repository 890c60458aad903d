//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use lode_core::Error as CoreError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthorized,

  #[error("administrator role required")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A recoverable login/registration failure; the user re-prompts.
  #[error(transparent)]
  Validation(#[from] CoreError),

  /// Backend failure, including a corrupt user store. Fatal to the
  /// operation; logged and surfaced as a 500.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Validation(e) => match e {
        CoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        CoreError::InvalidAdminCode => StatusCode::FORBIDDEN,
        CoreError::DuplicateUsername | CoreError::DuplicateEmail => {
          StatusCode::CONFLICT
        }
        CoreError::PasswordMismatch | CoreError::MissingFields => {
          StatusCode::UNPROCESSABLE_ENTITY
        }
      },
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
