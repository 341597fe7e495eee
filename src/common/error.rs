//! Error handling primitives shared across the service.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes attached to log records.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Model artefact was not found at the configured path.
    ModelMissing = 3,
    /// Request payload failed schema validation. Logged by the HTTP layer,
    /// which answers with field errors rather than a `PredictorError`.
    InvalidInput = 4,
    /// Catch-all for failures inside the inference call.
    Inference = 5,
    /// Artefact could not be read from disk.
    Io = 6,
    /// Artefact was readable but structurally wrong.
    InvalidModel = 7,
    /// Environment carried an unusable configuration value.
    Config = 8,
}

impl ErrorCode {
    pub fn raw(self) -> u32 {
        self as u32
    }
}

/// Canonical error type for the service.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("model artefact not found at {}", .0.display())]
    ModelMissing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid model artefact: {0}")]
    InvalidModel(String),

    /// Message is surfaced verbatim to HTTP callers.
    #[error("{0}")]
    Inference(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type PredictorResult<T> = Result<T, PredictorError>;

impl PredictorError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PredictorError::ModelMissing(_) => ErrorCode::ModelMissing,
            PredictorError::Io { .. } => ErrorCode::Io,
            PredictorError::InvalidModel(_) => ErrorCode::InvalidModel,
            PredictorError::Inference(_) => ErrorCode::Inference,
            PredictorError::Config(_) => ErrorCode::Config,
        }
    }

    /// Inference helper.
    pub fn inference(msg: impl Into<String>) -> Self {
        PredictorError::Inference(msg.into())
    }

    /// Artefact validation helper.
    pub fn invalid_model(msg: impl Into<String>) -> Self {
        PredictorError::InvalidModel(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        PredictorError::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PredictorError::Io {
            path: path.into(),
            source,
        }
    }
}
