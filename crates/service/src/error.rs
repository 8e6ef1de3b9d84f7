//! Process error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the process from starting or running.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Metrics recorder error: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for process results.
pub type Result<T> = std::result::Result<T, ServiceError>;
