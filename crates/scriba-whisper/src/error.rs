//! Error types for the whisper transcription tool.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for transcription operations.
pub type WhisperResult<T> = Result<T, WhisperError>;

/// Errors raised by the transcription client and propagated to the adapter.
#[derive(Error, Debug)]
pub enum WhisperError {
    /// Missing or unusable configuration (no API key, bad HTTP client setup).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("audio file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input rejected before any network call (empty file, oversize file,
    /// negative duration passed to the cost estimator).
    #[error("{0}")]
    Validation(String),

    /// The remote call failed with a non-retryable error, or retries were
    /// exhausted; carries the last underlying failure's message.
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WhisperError {
    /// Stable error-kind tag reported in the tool result envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            WhisperError::Config(_) => "ConfigurationError",
            WhisperError::FileNotFound(_) => "FileNotFoundError",
            WhisperError::Validation(_) => "ValidationError",
            WhisperError::Transcription(_) => "TranscriptionError",
            WhisperError::Io(_) => "IoError",
        }
    }
}
