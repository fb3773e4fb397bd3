//! Error handling for GainKnob
//!
//! The real-time path never returns these; they surface from `prepare`,
//! state loading and file I/O only.

use thiserror::Error;

/// Result type alias for GainKnob operations
pub type Result<T> = std::result::Result<T, GainKnobError>;

/// Main error type for GainKnob operations
#[derive(Error, Debug)]
pub enum GainKnobError {
    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Processor not prepared: call prepare() before {operation}")]
    NotPrepared { operation: String },

    // State Errors
    #[error("Invalid plugin state: {reason}")]
    InvalidState { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GainKnobError {
    /// Shorthand for an `InvalidConfiguration` error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        GainKnobError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            GainKnobError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            GainKnobError::NotPrepared { .. } => "NOT_PREPARED",
            GainKnobError::InvalidState { .. } => "INVALID_STATE",
            GainKnobError::FileNotFound { .. } => "FILE_NOT_FOUND",
            GainKnobError::InvalidAudio { .. } => "INVALID_AUDIO",
            GainKnobError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            GainKnobError::EmptyAudio => "EMPTY_AUDIO",
            GainKnobError::Io(_) => "IO_ERROR",
            GainKnobError::Wav(_) => "WAV_ERROR",
            GainKnobError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GainKnobError::InvalidConfiguration { .. }
                | GainKnobError::NotPrepared { .. }
                | GainKnobError::InvalidState { .. }
                | GainKnobError::FileNotFound { .. }
                | GainKnobError::UnsupportedFormat { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            GainKnobError::InvalidConfiguration { .. } => vec![
                "Sample rate must be a positive, finite number",
                "Channel count and block size must be at least 1",
            ],
            GainKnobError::NotPrepared { .. } => {
                vec!["Call prepare() with a valid configuration first"]
            }
            GainKnobError::InvalidState { .. } | GainKnobError::Serialization(_) => vec![
                "The saved state may be corrupted - defaults are still in effect",
                "Re-save the state from a running instance",
            ],
            GainKnobError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            GainKnobError::InvalidAudio { .. } | GainKnobError::Wav(_) => vec![
                "Check if the file plays in another application",
                "Try re-exporting the file as WAV",
            ],
            GainKnobError::UnsupportedFormat { .. } => vec![
                "Supported input: 16/24/32-bit integer or 32-bit float WAV",
            ],
            _ => vec![],
        }
    }
}
