//! Request DTOs for the operational API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /api/v1/cache/invalidate
///
/// # Fields
/// - `prefix`: Raw key prefix to drop, e.g. `tickets:`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Key prefix whose entries are removed
    pub prefix: String,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    /// An empty prefix would match every key; `DELETE /api/v1/cache` covers that.
    pub fn validate(&self) -> Option<String> {
        if self.prefix.is_empty() {
            return Some("Prefix cannot be empty".to_string());
        }
        None
    }
}
