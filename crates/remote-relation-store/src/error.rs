//! Remote store error types.

use thiserror::Error;

/// Remote store error type.
///
/// Every variant is retryable from the engine's point of view: the pending
/// cache row stays in place and the sweeper replays it later.
#[derive(Error, Debug)]
pub enum RemoteStoreError {
    /// HTTP transport error (includes request timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected or aborted the transaction
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The store is unreachable
    #[error("Remote store offline")]
    Offline,
}

/// Result type alias using RemoteStoreError.
pub type RemoteStoreResult<T> = Result<T, RemoteStoreError>;
