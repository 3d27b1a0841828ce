// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Signature Verification Failed: {0}")]
  Signature(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  // The commerce platform returned a non-success status. Status and raw body
  // are kept so operators can diagnose without re-sending the request.
  #[error("Upstream Error ({status}): {body}")]
  Upstream { status: u16, body: String },

  // Partial failure: the order exists upstream but payment initiation failed.
  #[error("Payment Initiation Error ({status}): {body}")]
  PaymentInit { status: u16, body: String },

  #[error("Order Store Error: {0}")]
  Store(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers that use `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Internal(err.to_string())
  }
}

impl AppError {
  /// Machine-readable code included in every error body. Checkout callers
  /// branch on this; webhook providers only see the HTTP status.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::Signature(_) => "invalid_signature",
      AppError::NotFound(_) => "not_found",
      AppError::Config(_) => "configuration_error",
      AppError::Upstream { .. } => "upstream_error",
      AppError::PaymentInit { .. } => "payment_init_error",
      AppError::Store(_) => "store_error",
      AppError::Internal(_) => "internal_error",
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, code = self.code(), "Responding with error");
    match self {
      AppError::Validation(m) => {
        HttpResponse::BadRequest().json(json!({"ok": false, "error": m, "code": self.code()}))
      }
      AppError::Signature(m) => {
        HttpResponse::Unauthorized().json(json!({"ok": false, "error": m, "code": self.code()}))
      }
      AppError::NotFound(m) => {
        HttpResponse::NotFound().json(json!({"ok": false, "error": m, "code": self.code()}))
      }
      AppError::Config(m) => HttpResponse::InternalServerError()
        .json(json!({"ok": false, "error": "Configuration issue", "code": self.code(), "detail": m})),
      AppError::Upstream { status, body } => HttpResponse::BadGateway().json(json!({
        "ok": false,
        "error": "Commerce provider error",
        "code": self.code(),
        "status": status,
        "details": body,
      })),
      AppError::PaymentInit { status, body } => HttpResponse::BadGateway().json(json!({
        "ok": false,
        "error": "Order created but payment initiation failed",
        "code": self.code(),
        "status": status,
        "details": body,
      })),
      AppError::Store(m) => HttpResponse::InternalServerError()
        .json(json!({"ok": false, "error": "Order store failure", "code": self.code(), "detail": m})),
      AppError::Internal(m) => HttpResponse::InternalServerError()
        .json(json!({"ok": false, "error": "An internal error occurred", "code": self.code(), "detail": m})),
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
