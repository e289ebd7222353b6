//! Error types for the store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database errors
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration errors
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An operation required a persisted entity but got one without an id
    #[error("entity not persisted: {0}")]
    NotPersisted(String),

    /// Generic error with context
    #[error("store error: {0}")]
    Generic(String),
}

impl StoreError {
    /// Create a new not-persisted error
    pub fn not_persisted(msg: impl Into<String>) -> Self {
        Self::NotPersisted(msg.into())
    }

    /// Create a new generic error
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }
}
