//! Engine error types.

use relation_cache::CacheError;
use remote_relation_store::RemoteStoreError;
use thiserror::Error;

/// Engine error type.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Local cache I/O failed. Fatal to the current call; no network step
    /// is attempted after a failed local write.
    #[error("Local cache write failed: {0}")]
    LocalWrite(#[from] CacheError),

    /// The remote transaction failed (network, timeout, permission,
    /// conflict). The pending cache row remains and will be replayed.
    #[error("Remote transaction failed: {0}")]
    RemoteTransaction(#[from] RemoteStoreError),

    /// No subject identity was supplied.
    #[error("Not authenticated: no subject identity")]
    NotAuthenticated,

    /// The relation key is malformed (e.g. a nested kind without its
    /// parent id). Caller error; nothing was written.
    #[error("Invalid relation: {0}")]
    InvalidRelation(String),
}

impl EngineError {
    /// True when the failed intent stays queued in the cache and the
    /// sweeper will retry it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::RemoteTransaction(_))
    }
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
