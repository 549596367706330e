//! Error types for the projection service

use projection_engine::ProjectionError;
use thiserror::Error;

/// Result type for projection service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur outside the projection engine
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Engine error: {0}")]
    Engine(#[from] ProjectionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
