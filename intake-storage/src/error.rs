//! Error types for the storage layer.

use thiserror::Error;

/// Storage operation result type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (upload directory operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A path outside the upload directory was handed to the file store
    #[error("Path outside upload directory: {0}")]
    OutsideRoot(String),

    /// Could not find a free stored name
    #[error("Stored name collision: {0}")]
    Collision(String),
}

impl StorageError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
