//! Error handling for Genwave
//!
//! Every failure an invocation can surface maps to one variant here, and
//! each variant carries a stable code for the JSON payload.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Genwave operations
pub type Result<T> = std::result::Result<T, GenwaveError>;

/// Main error type for Genwave operations
#[derive(Error, Debug)]
pub enum GenwaveError {
    // Configuration Errors
    #[error("Missing configuration: {}", missing.join(", "))]
    MissingConfiguration { missing: Vec<&'static str> },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    // Request Errors
    #[error("Invalid request field '{field}': {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    // Generation Errors
    #[error("Generation failed: {reason}")]
    Generation { reason: String },

    #[error("Model runtime unavailable: {reason}")]
    RuntimeUnavailable { reason: String },

    #[error("Model runtime timed out after {timeout_secs}s")]
    RuntimeTimeout { timeout_secs: u64 },

    // Publishing Errors
    #[error("Upload of s3://{bucket}/{key} failed: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Audio encoding error: {0}")]
    Audio(#[from] hound::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification reported to the invocation caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    InvalidRequest,
    Generation,
    Upload,
    Internal,
}

impl GenwaveError {
    pub fn generation(reason: impl Into<String>) -> Self {
        GenwaveError::Generation {
            reason: reason.into(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        GenwaveError::InvalidRequest {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GenwaveError::MissingConfiguration { .. } | GenwaveError::Configuration { .. } => {
                ErrorKind::Configuration
            }
            GenwaveError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            GenwaveError::Generation { .. }
            | GenwaveError::RuntimeUnavailable { .. }
            | GenwaveError::RuntimeTimeout { .. } => ErrorKind::Generation,
            GenwaveError::Upload { .. } => ErrorKind::Upload,
            GenwaveError::Audio(_) | GenwaveError::Io(_) | GenwaveError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            GenwaveError::MissingConfiguration { .. } => "MISSING_CONFIGURATION",
            GenwaveError::Configuration { .. } => "CONFIGURATION_ERROR",
            GenwaveError::InvalidRequest { .. } => "INVALID_REQUEST",
            GenwaveError::Generation { .. } => "GENERATION_ERROR",
            GenwaveError::RuntimeUnavailable { .. } => "RUNTIME_UNAVAILABLE",
            GenwaveError::RuntimeTimeout { .. } => "RUNTIME_TIMEOUT",
            GenwaveError::Upload { .. } => "UPLOAD_ERROR",
            GenwaveError::Audio(_) => "AUDIO_ENCODING_ERROR",
            GenwaveError::Io(_) => "IO_ERROR",
            GenwaveError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            GenwaveError::MissingConfiguration { .. } => vec![
                "Export AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and S3_BUCKET_NAME",
                "Or mount an aws-credentials.json bundle in GENWAVE_SECRETS_DIR",
                "Or add the values to a .env file in the working directory",
            ],
            GenwaveError::Configuration { .. } => vec![
                "Check that secret bundles are flat JSON objects of string values",
            ],
            GenwaveError::InvalidRequest { .. } => vec![
                "Duration must be between 1 and 300 seconds",
                "Prompt cannot be empty",
                "A melody reference needs --model-size melody",
            ],
            GenwaveError::RuntimeUnavailable { .. } | GenwaveError::RuntimeTimeout { .. } => vec![
                "Check that the model runtime is running at GENWAVE_BRIDGE_URL",
                "Raise GENWAVE_BRIDGE_TIMEOUT_SECS for long generations",
            ],
            GenwaveError::Generation { .. } => vec![
                "Try a smaller model size or a shorter duration",
                "Set HUGGING_FACE_TOKEN if the model download was refused",
            ],
            GenwaveError::Upload { .. } => vec![
                "Verify the bucket exists in the configured AWS_REGION",
                "Verify the credentials allow s3:PutObject on the bucket",
            ],
            _ => vec![],
        }
    }
}
