//! API types and DTOs.

use std::time::{SystemTime, UNIX_EPOCH};

use kerasgen_ops::{OpsContext, OpsError};
use serde::{Deserialize, Serialize};

/// Shared application state for the API.
#[derive(Debug)]
pub struct ApiState {
    /// The operations context.
    pub ctx: OpsContext,
}

/// Response wrapper with timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response data.
    pub data: T,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl<T> ApiResponse<T> {
    /// Create a new API response with current timestamp.
    pub fn new(data: T) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self { data, timestamp }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Error body for failed operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code, e.g. `UNKNOWN_CATEGORY`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl From<&OpsError> for ErrorResponse {
    fn from(err: &OpsError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
