//! Error types for the projection engine

use thiserror::Error;

/// Result type for projection engine operations
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Errors that can occur while building, adjusting or validating projections
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Referenced player, projection or template does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored value disagrees with its recomputation
    #[error("Inconsistent data: {0}")]
    InconsistentData(String),

    /// Required field absent with no way to derive it
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Unrecognized position, malformed value or out-of-range adjustment
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage collaborator failure
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProjectionError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn missing_data(msg: impl Into<String>) -> Self {
        Self::MissingData(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether the failure is scoped to a single entity and safe to report per item
    pub fn is_entity_scoped(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
