//! # Publish Notifications
//!
//! The content service calls back when a document is published. The callback
//! carries a shared secret and the published document's type, which selects
//! the cache tag to drop.

use crate::config::PublishSettings;
use crate::constants::cache_tags;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Invalid secret")]
    InvalidSecret,

    #[error("Publish notifications are not configured")]
    NotConfigured,
}

/// Body of a publish notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEvent {
    #[serde(default, rename = "_type", alias = "documentType")]
    pub document_type: Option<String>,
}

impl PublishEvent {
    pub fn for_type(document_type: impl Into<String>) -> Self {
        Self {
            document_type: Some(document_type.into()),
        }
    }

    /// Cache tag covering the published document
    pub fn cache_tag(&self) -> &'static str {
        match self.document_type.as_deref() {
            Some("menuCategory") => cache_tags::CATEGORIES,
            Some("location") => cache_tags::LOCATIONS,
            Some("menuItem") => cache_tags::ITEMS,
            _ => cache_tags::ALL,
        }
    }
}

/// Result of a handled publish notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub tag: &'static str,
    /// Cache entries dropped
    pub removed: usize,
}

/// Shared-secret check for publish notifications
#[derive(Clone)]
pub struct PublishAuthenticator {
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for PublishAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishAuthenticator")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl PublishAuthenticator {
    pub fn from_config(settings: &PublishSettings) -> Self {
        let secret = settings
            .webhook_secret
            .as_ref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| secret.as_bytes().to_vec());

        if secret.is_none() {
            debug!("Publish webhook secret not configured, notifications will be rejected");
        }

        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Compare `provided` against the configured secret.
    ///
    /// Runs over the longer of the two inputs regardless of where they first
    /// differ.
    pub fn verify(&self, provided: &str) -> Result<(), PublishError> {
        let expected = self.secret.as_deref().ok_or(PublishError::NotConfigured)?;
        let provided = provided.as_bytes();

        if provided.is_empty() || !constant_time_eq(expected, provided) {
            warn!("Rejected publish notification with invalid secret");
            return Err(PublishError::InvalidSecret);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = u8::from(a.len() != b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(secret: Option<&str>) -> PublishAuthenticator {
        PublishAuthenticator::from_config(&PublishSettings {
            webhook_secret: secret.map(str::to_string),
        })
    }

    #[test]
    fn document_types_map_to_tags() {
        assert_eq!(PublishEvent::for_type("menuItem").cache_tag(), "items");
        assert_eq!(PublishEvent::for_type("location").cache_tag(), "locations");
        assert_eq!(PublishEvent::for_type("menuCategory").cache_tag(), "categories");
        assert_eq!(PublishEvent::for_type("modifierGroup").cache_tag(), "content");
        assert_eq!(PublishEvent::default().cache_tag(), "content");
    }

    #[test]
    fn event_accepts_either_field_name() {
        let event: PublishEvent = serde_json::from_str(r#"{"_type": "location", "_id": "x"}"#).unwrap();
        assert_eq!(event.document_type.as_deref(), Some("location"));

        let event: PublishEvent = serde_json::from_str(r#"{"documentType": "menuItem"}"#).unwrap();
        assert_eq!(event.cache_tag(), "items");

        let event: PublishEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event.document_type, None);
    }

    #[test]
    fn secret_verification() {
        let auth = authenticator(Some("s3cret"));
        assert!(auth.verify("s3cret").is_ok());
        assert_eq!(auth.verify("s3cre"), Err(PublishError::InvalidSecret));
        assert_eq!(auth.verify("s3cret!"), Err(PublishError::InvalidSecret));
        assert_eq!(auth.verify(""), Err(PublishError::InvalidSecret));
    }

    #[test]
    fn missing_or_empty_secret_rejects_everything() {
        assert_eq!(authenticator(None).verify("anything"), Err(PublishError::NotConfigured));
        assert_eq!(authenticator(Some("")).verify(""), Err(PublishError::NotConfigured));
        assert!(!authenticator(Some("")).is_configured());
    }

    #[test]
    fn length_mismatch_is_never_equal() {
        assert!(!constant_time_eq(b"abc", b"abc\0"));
        assert!(!constant_time_eq(b"", b"\0"));
        assert!(constant_time_eq(b"abc", b"abc"));
    }
}
