//! Error types for herbs-core

use thiserror::Error;

/// Result type alias using herbs-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in local herbs-core operations
///
/// Remote suggestion-log failures use [`crate::sync::SyncError`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The reference table does not have the expected shape
    #[error("Reference table schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid process configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
