//! Error types for the content adapter.
//!
//! Every failure on the read path is expressed as a [`ContentError`]. The
//! adapter never lets one escape to its callers: transient, timeout and
//! validation errors are recorded against the service's circuit breaker and
//! answered with fallback data, while [`ContentError::NotConfigured`] is served
//! from fallback without touching the breaker at all.

use crate::resilience::timeout::TimeoutError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    /// Network failure or 5xx from the content service
    #[error("Transient dependency error: {0}")]
    Transient(String),
    #[error("Timeout error: {0}")]
    Timeout(#[from] TimeoutError),
    /// Structurally unusable payload
    #[error("Validation error: {0}")]
    Validation(String),
    /// No content-service credentials were supplied
    #[error("Content source not configured")]
    NotConfigured,
}

impl ContentError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error counts against a circuit breaker.
    ///
    /// A missing configuration is a permanent state rather than a dependency
    /// failure, so it never trips a breaker.
    pub fn is_breaker_failure(&self) -> bool {
        !matches!(self, Self::NotConfigured)
    }

    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Timeout(_) => "timeout",
            Self::Validation(_) => "validation",
            Self::NotConfigured => "not_configured",
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(error: serde_json::Error) -> Self {
        ContentError::Validation(format!("JSON payload error: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
