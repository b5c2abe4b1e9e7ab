//! Error types for the Ideas Parking Lot API client

use crate::types::ValidationErrors;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// API client errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure
    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    /// 401. The local session has already been invalidated when this is returned.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Any other non-success status
    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Draft rejected locally; no request was sent
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid response body: {message}")]
    Decode { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::HttpClient(err)
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ApiError {
    /// Build the error for a non-success response
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = ErrorBody::message_from(body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            StatusCode::FORBIDDEN => ApiError::Forbidden { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            StatusCode::BAD_REQUEST => ApiError::BadRequest { message },
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimitExceeded,
            _ => ApiError::Http {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Get error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::HttpClient(_) => "PARKINGLOT_API_HTTP_CLIENT_ERROR",
            ApiError::Timeout => "PARKINGLOT_API_TIMEOUT",
            ApiError::Unauthorized { .. } => "PARKINGLOT_API_UNAUTHORIZED",
            ApiError::Forbidden { .. } => "PARKINGLOT_API_FORBIDDEN",
            ApiError::NotFound { .. } => "PARKINGLOT_API_NOT_FOUND",
            ApiError::BadRequest { .. } => "PARKINGLOT_API_BAD_REQUEST",
            ApiError::RateLimitExceeded => "PARKINGLOT_API_RATE_LIMIT",
            ApiError::Http { .. } => "PARKINGLOT_API_HTTP_ERROR",
            ApiError::Validation(_) => "PARKINGLOT_API_VALIDATION_ERROR",
            ApiError::Decode { .. } => "PARKINGLOT_API_DECODE_ERROR",
            ApiError::InvalidRequest { .. } => "PARKINGLOT_API_INVALID_REQUEST",
        }
    }

    /// HTTP status the server answered with, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::BadRequest { .. } => Some(400),
            ApiError::RateLimitExceeded => Some(429),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::HttpClient(_) | ApiError::Timeout | ApiError::RateLimitExceeded => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if error is a client error
    pub fn is_client_error(&self) -> bool {
        match self {
            ApiError::Unauthorized { .. }
            | ApiError::Forbidden { .. }
            | ApiError::NotFound { .. }
            | ApiError::BadRequest { .. }
            | ApiError::RateLimitExceeded
            | ApiError::Validation(_)
            | ApiError::InvalidRequest { .. } => true,
            ApiError::Http { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// Field-level validation error reported by the server
#[derive(Debug, Deserialize)]
pub struct FieldError {
    pub msg: String,
}

impl ErrorBody {
    /// Best message in a response body: `message`, else the first field
    /// error, else `error`, else the raw text
    pub fn message_from(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }

        match serde_json::from_str::<ErrorBody>(trimmed) {
            Ok(parsed) => parsed
                .message
                .filter(|m| !m.is_empty())
                .or_else(|| parsed.errors.into_iter().map(|e| e.msg).find(|m| !m.is_empty()))
                .or_else(|| parsed.error.filter(|e| !e.is_empty()))
                .or_else(|| Some(trimmed.to_string())),
            Err(_) => Some(trimmed.to_string()),
        }
    }
}
