//! Attention engine error types with categorical error codes.

use thiserror::Error;

/// Engine errors with categorical codes.
#[derive(Debug, Error)]
pub enum AttentionError {
    /// Item rejected at intake (ATTN001)
    #[error("Invalid attention item: {0}")]
    InvalidItem(String),

    /// Dismiss target not tracked by the store (ATTN002)
    #[error("Unknown attention entity: {0}")]
    UnknownEntity(String),

    /// Storage collaborator failed; in-memory state is unaffected (ATTN003)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Snapshot encode/decode failure (ATTN004)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration (ATTN005)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Notification backend failure (ATTN006)
    #[error("Notification error: {0}")]
    Notification(String),
}

impl AttentionError {
    /// Returns the categorical error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidItem(_) => "ATTN001",
            Self::UnknownEntity(_) => "ATTN002",
            Self::Persistence(_) => "ATTN003",
            Self::Serialization(_) => "ATTN004",
            Self::Configuration(_) => "ATTN005",
            Self::Notification(_) => "ATTN006",
        }
    }

    /// Whether the in-memory state still reflects the attempted mutation.
    ///
    /// Only persistence failures happen after the state update.
    #[must_use]
    pub const fn state_applied(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<rusqlite::Error> for AttentionError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AttentionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AttentionError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<toml::de::Error> for AttentionError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(format!("TOML parse error: {err}"))
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AttentionError>;
