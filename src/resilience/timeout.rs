//! # Timeout Guard
//!
//! Bounds an asynchronous call to a maximum duration using tokio's
//! non-blocking timers. Only the waiting caller is suspended; no worker thread
//! is held for the length of the timeout.
//!
//! When the deadline passes first the wrapped future is dropped. Whatever the
//! underlying call would eventually have produced is therefore discarded: it
//! can never be returned to a caller that already received a timeout, and it is
//! never recorded a second time against a circuit breaker.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default per-call deadline for content-service requests
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(10_000);

/// The guarded operation did not settle before its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Request timed out after {limit_ms}ms")]
pub struct TimeoutError {
    pub limit_ms: u64,
}

impl TimeoutError {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit_ms: limit.as_millis() as u64,
        }
    }

    pub fn limit(&self) -> Duration {
        Duration::from_millis(self.limit_ms)
    }
}

/// Race `operation` against a timer of length `limit`.
pub async fn with_timeout<F>(operation: F, limit: Duration) -> Result<F::Output, TimeoutError>
where
    F: Future,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(output) => Ok(output),
        Err(_) => {
            warn!(limit_ms = limit.as_millis() as u64, "⏱️ Guarded call timed out");
            Err(TimeoutError::new(limit))
        }
    }
}
