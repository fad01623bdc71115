// error.rs - Service errors and their mapping onto HTTP responses

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use database::{DatabaseError, HashError};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// Failures raised by the auth and users services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Email already exists.")]
    AlreadyExists,
    #[error("Please confirm your email first.")]
    PreconditionFailed,
    #[error("Invalid OTP.")]
    InvalidOtp,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("{0}")]
    Internal(String),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const ACCESS_DENIED: &str = "Access Denied";

/// Error returned to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal Server Error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "statusCode": status.as_u16(),
            "error": status.canonical_reason().unwrap_or_default(),
            "message": self.to_string(),
        }))
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::AlreadyExists
            | ServiceError::PreconditionFailed
            | ServiceError::InvalidOtp
            | ServiceError::Validation(_) => ApiError::BadRequest(e.to_string()),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg.to_string()),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg.to_string()),
            ServiceError::NotFound => ApiError::NotFound(e.to_string()),
            ServiceError::Database(DatabaseError::DuplicateKey) => {
                ApiError::BadRequest(DatabaseError::DuplicateKey.to_string())
            }
            ServiceError::Database(DatabaseError::Persistence(inner)) => {
                error!("Error persisting document: {}", inner);
                ApiError::BadRequest("An error occurred".to_string())
            }
            other => {
                error!("{}", other);
                ApiError::Internal
            }
        }
    }
}
