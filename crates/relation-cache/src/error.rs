//! Cache error types.

use thiserror::Error;

/// Cache error type.
#[derive(Error, Debug)]
pub enum CacheError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Invalid data error (unparseable row)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using CacheError.
pub type CacheResult<T> = Result<T, CacheError>;
