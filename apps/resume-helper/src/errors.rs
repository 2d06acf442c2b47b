use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Every variant is a hard error for the current command; `main` maps it to exit code 1.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    InputNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code for this error. All hard errors exit with 1.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Short machine-readable code, used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InputNotFound(_) => "INPUT_NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::MalformedModelOutput(_) => "MALFORMED_MODEL_OUTPUT",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Conversion(_) => "CONVERSION_FAILURE",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Malformed { .. } => AppError::MalformedModelOutput(err.to_string()),
            LlmError::MissingApiKey { .. } => AppError::Config(err.to_string()),
            other => AppError::Llm(other.to_string()),
        }
    }
}
