//! Error types for the operations layer.

use std::path::PathBuf;

use kerasgen_codegen::GenerateError;
use thiserror::Error;

/// Result type for operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors that can occur during operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// The request body could not be bound to a project.
    #[error("Invalid request body: {0}")]
    Bind(String),

    /// Script generation failed.
    #[error("Generation failed: {0}")]
    Generate(#[from] GenerateError),

    /// The user id is missing or not a plain path segment.
    #[error("Invalid user id: {id:?}")]
    InvalidUserId { id: String },

    /// The user has no saved model directory to archive.
    #[error("No saved model directory at {path}")]
    ModelDirNotFound { path: PathBuf },

    /// The user has no model archive to download.
    #[error("No model archive at {path}")]
    ArchiveNotFound { path: PathBuf },

    /// Zip archive creation failed.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Talking to the message broker failed.
    #[error("Broker {stage} failed: {message}")]
    Broker { stage: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl OpsError {
    /// Create a new error with additional context.
    pub fn with_context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a broker error for the given stage.
    pub fn broker(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Broker {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            OpsError::Bind(_) => "BIND_ERROR",
            OpsError::Generate(e) => e.code(),
            OpsError::InvalidUserId { .. } => "INVALID_USER_ID",
            OpsError::ModelDirNotFound { .. } => "MODEL_DIR_NOT_FOUND",
            OpsError::ArchiveNotFound { .. } => "ARCHIVE_NOT_FOUND",
            OpsError::Archive(_) => "ARCHIVE_ERROR",
            OpsError::Broker { .. } => "BROKER_ERROR",
            OpsError::Config(_) => "CONFIG_ERROR",
            OpsError::Io(_) => "IO_ERROR",
            OpsError::Json(_) => "JSON_ERROR",
            OpsError::WithContext { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<tokio::task::JoinError> for OpsError {
    fn from(err: tokio::task::JoinError) -> Self {
        OpsError::with_context("Background task failed", err.to_string())
    }
}

impl From<reqwest::Error> for OpsError {
    fn from(err: reqwest::Error) -> Self {
        OpsError::broker("request", err.to_string())
    }
}
