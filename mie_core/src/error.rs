//! Engine error taxonomy.
//!
//! Callers branch on [`MemoryError::kind`], so errors carry a stable kind
//! string alongside the human-readable message.

use std::fmt;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, MemoryError>;

/// An engine failure, classified by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryError {
    /// A required field is missing or an enumerated value is out of range.
    InvalidArgument(String),
    /// The referenced node does not exist.
    NotFound(String),
    /// Semantic operation attempted without a configured embedding pipeline.
    EmbeddingsDisabled,
    /// The embedding provider failed; transient, callers may retry.
    Provider(String),
    /// The storage substrate reported a failure.
    Substrate(String),
}

impl MemoryError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        MemoryError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        MemoryError::NotFound(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        MemoryError::Provider(msg.into())
    }

    pub fn substrate(msg: impl Into<String>) -> Self {
        MemoryError::Substrate(msg.into())
    }

    /// Stable kind identifier for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            MemoryError::InvalidArgument(_) => "invalid-argument",
            MemoryError::NotFound(_) => "not-found",
            MemoryError::EmbeddingsDisabled => "embeddings-disabled",
            MemoryError::Provider(_) => "provider-error",
            MemoryError::Substrate(_) => "substrate-error",
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::InvalidArgument(msg) => write!(f, "{msg}"),
            MemoryError::NotFound(msg) => write!(f, "{msg}"),
            MemoryError::EmbeddingsDisabled => {
                write!(f, "semantic search requires embeddings to be enabled")
            }
            MemoryError::Provider(msg) => write!(f, "embedding provider: {msg}"),
            MemoryError::Substrate(msg) => write!(f, "storage: {msg}"),
        }
    }
}

impl std::error::Error for MemoryError {}
