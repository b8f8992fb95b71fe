//! Error types for the acceleration layer
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Header Names ==
pub const HEADER_RETRY_AFTER: &str = "retry-after";
pub const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_RESET: &str = "x-ratelimit-reset";

// == Accel Error Enum ==
/// Unified error type for the acceleration layer.
#[derive(Error, Debug)]
pub enum AccelError {
    /// Client exceeded its request budget for the current window
    #[error("Too many requests")]
    RateLimited {
        /// Configured requests per window
        limit: u32,
        /// Time until the client's window resets
        retry_after: Duration,
    },

    /// A shared structure's mutex was poisoned by a panicking holder
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// A cached value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AccelError {
    /// Whole seconds a limited client should wait, rounded up.
    pub fn retry_after_secs(retry_after: Duration) -> u64 {
        let secs = retry_after.as_secs();
        if retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AccelError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccelError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AccelError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AccelError::LockPoisoned(_) | AccelError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        let mut response = (status, body).into_response();

        if let AccelError::RateLimited { limit, retry_after } = self {
            rate_limited_headers(response.headers_mut(), limit, retry_after);
        }

        response
    }
}

/// Writes the headers that accompany a 429 rejection.
fn rate_limited_headers(headers: &mut HeaderMap, limit: u32, retry_after: Duration) {
    // The window is still closed at its exact edge, so never advertise 0
    let retry_secs = AccelError::retry_after_secs(retry_after).max(1);
    let reset = chrono::Utc::now().timestamp() + retry_secs as i64;

    headers.insert(HEADER_RETRY_AFTER, HeaderValue::from(retry_secs));
    headers.insert(HEADER_RATE_LIMIT, HeaderValue::from(limit));
    headers.insert(HEADER_RATE_REMAINING, HeaderValue::from_static("0"));
    headers.insert(HEADER_RATE_RESET, HeaderValue::from(reset));
}

// == Result Type Alias ==
/// Convenience Result type for the acceleration layer.
pub type Result<T> = std::result::Result<T, AccelError>;
