//! CLI error types

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Engine error: {0}")]
    EngineError(#[from] beacon_core::AttentionError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CliError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CliError::CommandFailed(_) => "CLI001",
            CliError::InvalidArgument(_) => "CLI002",
            CliError::ConfigError(_) => "CLI003",
            CliError::EngineError(e) => e.code(),
            CliError::JsonError(_) => "CLI006",
            CliError::IoError(_) => "CLI008",
        }
    }
}

/// CLI-specific result type
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::AttentionError;

    #[test]
    fn test_error_codes() {
        assert_eq!(CliError::CommandFailed("test".to_string()).code(), "CLI001");
        assert_eq!(CliError::InvalidArgument("test".to_string()).code(), "CLI002");
        assert_eq!(CliError::ConfigError("test".to_string()).code(), "CLI003");
        assert_eq!(
            CliError::from(AttentionError::UnknownEntity("x".into())).code(),
            "ATTN002"
        );
    }

    #[test]
    fn test_error_display() {
        let error = CliError::InvalidArgument("--meta expects KEY=VALUE".to_string());
        assert_eq!(error.to_string(), "Invalid argument: --meta expects KEY=VALUE");
    }
}
