use actix_web::{error::ResponseError, HttpResponse};
use std::fmt;
use std::error::Error as StdError;
use serde_json::json;
use log::{warn, error, debug};
use thiserror::Error;

/// Typed failure taxonomy for the booking core. Every rejection a core
/// operation can produce is one of these kinds; handlers never see raw
/// database errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("declared amount {declared:.2} does not match computed amount {computed:.2}")]
    AmountMismatch { declared: f64, computed: f64 },
    #[error("{0}")]
    Unauthorized(String),
    #[error("storage failure: {0}")]
    Store(String),
}

impl From<diesel::result::Error> for CoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => CoreError::NotFound("record not found".to_string()),
            other => CoreError::Store(other.to_string()),
        }
    }
}

// Custom error handling
#[derive(Debug)]
pub enum ApiError {
    DatabaseError(String),
    ValidationError(String),
    AuthError(String),
    ForbiddenError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalError(String),
}

impl StdError for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            ApiError::ForbiddenError(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFoundError(msg) => write!(f, "Not found: {}", msg),
            ApiError::ConflictError(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound(msg) => ApiError::NotFoundError(msg),
            CoreError::InvalidInput(msg) => ApiError::ValidationError(msg),
            CoreError::Conflict(msg) => ApiError::ConflictError(msg),
            CoreError::AmountMismatch { .. } => ApiError::ConflictError(e.to_string()),
            CoreError::Unauthorized(msg) => ApiError::ForbiddenError(msg),
            CoreError::Store(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::DatabaseError(msg) => {
                error!("\x1B[1;31mDATABASE ERROR:\x1B[0m {}", msg);
                HttpResponse::InternalServerError().json(json!({ "error": msg }))
            },
            ApiError::ValidationError(msg) => {
                warn!("\x1B[1;33mVALIDATION ERROR:\x1B[0m {}", msg);
                HttpResponse::BadRequest().json(json!({ "error": msg }))
            },
            ApiError::AuthError(msg) => {
                warn!("\x1B[1;33mAUTHENTICATION ERROR:\x1B[0m {}", msg);
                HttpResponse::Unauthorized().json(json!({ "error": msg }))
            },
            ApiError::ForbiddenError(msg) => {
                warn!("\x1B[1;33mFORBIDDEN:\x1B[0m {}", msg);
                HttpResponse::Forbidden().json(json!({ "error": msg }))
            },
            ApiError::NotFoundError(msg) => {
                debug!("\x1B[1;36mNOT FOUND ERROR:\x1B[0m {}", msg);
                HttpResponse::NotFound().json(json!({ "error": msg }))
            },
            ApiError::ConflictError(msg) => {
                warn!("\x1B[1;33mCONFLICT:\x1B[0m {}", msg);
                HttpResponse::Conflict().json(json!({ "error": msg }))
            },
            ApiError::InternalError(msg) => {
                error!("\x1B[1;31mINTERNAL SERVER ERROR:\x1B[0m {}", msg);
                HttpResponse::InternalServerError().json(json!({ "error": msg }))
            },
        }
    }

    fn status_code(&self) -> actix_web::http::StatusCode {
        match *self {
            ApiError::DatabaseError(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::AuthError(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenError(_) => actix_web::http::StatusCode::FORBIDDEN,
            ApiError::NotFoundError(_) => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::ConflictError(_) => actix_web::http::StatusCode::CONFLICT,
            ApiError::InternalError(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
