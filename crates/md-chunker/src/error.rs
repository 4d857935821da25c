use thiserror::Error;

/// Result type for chunking operations
pub type Result<T> = std::result::Result<T, ChunkingError>;

/// Errors that can occur while chunking a document
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// A `ChunkConfig` invariant was violated at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The validator detected a hard invariant breach (ordering, empty
    /// chunk, metadata consistency, header-path well-formedness)
    #[error("Chunking invariant violated: {0}")]
    HardInvariantViolation(String),

    /// The validator detected a content-loss gap of 10+ consecutive lines
    #[error("Content loss detected: {0}")]
    ContentLoss(String),

    /// `strategy_override` named an unknown strategy
    #[error("Unknown strategy: {0}")]
    NotFound(String),

    /// IO error surfaced by the `chunk_file` convenience wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChunkingError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn hard_invariant(msg: impl Into<String>) -> Self {
        Self::HardInvariantViolation(msg.into())
    }

    pub fn content_loss(msg: impl Into<String>) -> Self {
        Self::ContentLoss(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
