// src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use decorvista::CommerceError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Authentication Failed: {0}")]
  Auth(String),

  /// Malformed input caught in the HTTP layer, before the core is called.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error(transparent)]
  Commerce(#[from] CommerceError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// The message shown to the caller. Internal failures get a generic text.
  fn public_message(&self) -> String {
    match self {
      AppError::Auth(m) | AppError::Validation(m) => m.clone(),
      AppError::Commerce(e) if e.is_client_error() => e.to_string(),
      _ => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Commerce(e) => match e {
        CommerceError::EmptyCheckout
        | CommerceError::InsufficientInventory { .. }
        | CommerceError::SlotUnavailable { .. }
        | CommerceError::Validation(_) => StatusCode::BAD_REQUEST,
        CommerceError::ProductNotFound(_) | CommerceError::DesignerNotFound(_) | CommerceError::OrderNotFound(_) => {
          StatusCode::NOT_FOUND
        }
        CommerceError::Forbidden(_) => StatusCode::FORBIDDEN,
        CommerceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CommerceError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      // Full detail stays in the log; the body is generic.
      tracing::error!(application_error = %self, "Responding with internal error");
    } else {
      tracing::warn!(status = status.as_u16(), application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(json!({
      "success": false,
      "error": self.public_message(),
    }))
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use decorvista::{ProductId, StoreError};

  #[test]
  fn client_errors_keep_their_message() {
    let err = AppError::from(CommerceError::EmptyCheckout);
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.public_message(), "Cart is empty and no consultations selected");

    let err = AppError::from(CommerceError::ProductNotFound(ProductId::new()));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn store_failures_do_not_leak_detail() {
    let err = AppError::from(CommerceError::from(StoreError::backend(anyhow::anyhow!(
      "connection refused to 10.0.0.5:5432"
    ))));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.public_message(), "An internal error occurred");
  }
}
