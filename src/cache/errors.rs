//! Cache error types

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The in-flight fetch task panicked or was cancelled before producing a value
    #[error("Cache fetch for '{key}' aborted: {reason}")]
    FetchAborted { key: String, reason: String },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
