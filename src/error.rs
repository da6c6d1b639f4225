//! Error types for Earshot.

use thiserror::Error;

/// Library-level error type for Earshot operations.
#[derive(Error, Debug)]
pub enum EarshotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload has no file part")]
    MissingFilePart,

    #[error("Upload has an empty filename")]
    EmptyFilename,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File processing failed for {asset}: {state}")]
    ProcessingFailed { asset: String, state: String },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Unknown(String),
}

impl EarshotError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EarshotError::Config(_) => "config",
            EarshotError::MissingFilePart => "missing_file_part",
            EarshotError::EmptyFilename => "empty_filename",
            EarshotError::InvalidInput(_) => "invalid_input",
            EarshotError::ProcessingFailed { .. } => "processing_failed",
            EarshotError::Timeout(_) => "timeout",
            EarshotError::Inference(_) => "inference_error",
            EarshotError::Provider { .. } => "provider",
            EarshotError::Io(_) => "io",
            EarshotError::TomlParse(_) => "toml",
            EarshotError::Http(_) => "http",
            EarshotError::Unknown(_) => "unknown_failure",
        }
    }

    /// Whether the error was caused by the client's request rather than by us
    /// or the provider.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EarshotError::MissingFilePart
                | EarshotError::EmptyFilename
                | EarshotError::InvalidInput(_)
        )
    }
}

/// Result type alias for Earshot operations.
pub type Result<T> = std::result::Result<T, EarshotError>;
