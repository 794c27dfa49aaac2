//! # Adapter Configuration
//!
//! Typed configuration for the content adapter. Every field has a default so
//! an empty configuration is valid: it describes an adapter with no content
//! source (configuration-absent mode) and the standard resilience thresholds.
//!
//! Values are layered by [`ConfigLoader`]: built-in defaults, then an optional
//! TOML/YAML/JSON file, then `STOREFRONT_` environment variables using `__` for
//! nesting (`STOREFRONT_CMS__PROJECT_ID`, `STOREFRONT_CACHE__REVALIDATE_SECONDS`).

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::{ConfigLoader, ConfigManager};

use crate::resilience::{CircuitBreakerConfig, DEFAULT_CALL_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root adapter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub cms: CmsSettings,

    #[serde(default)]
    pub circuit_breakers: CircuitBreakerSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub timeouts: TimeoutSettings,

    #[serde(default)]
    pub publish: PublishSettings,
}

impl AdapterConfig {
    /// Run every semantic check and report all problems together
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.cache.revalidate_seconds == 0 {
            errors.push("cache.revalidate_seconds must be greater than 0".to_string());
        }

        if self.timeouts.per_call_timeout_ms == 0 {
            errors.push("timeouts.per_call_timeout_ms must be greater than 0".to_string());
        }

        if let Err(e) = self
            .circuit_breakers
            .default_config
            .to_resilience_config()
            .validate()
        {
            errors.push(format!("circuit_breakers.default_config: {e}"));
        }

        let mut components: Vec<_> = self.circuit_breakers.component_configs.iter().collect();
        components.sort_by(|a, b| a.0.cmp(b.0));
        for (name, component) in components {
            if let Err(e) = component.to_resilience_config().validate() {
                errors.push(format!("circuit_breakers.component_configs.{name}: {e}"));
            }
        }

        if self.cms.brand_name.trim().is_empty() {
            errors.push("cms.brand_name must not be empty".to_string());
        }

        if matches!(&self.publish.webhook_secret, Some(secret) if secret.is_empty()) {
            errors.push("publish.webhook_secret must not be empty when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::validation(errors))
        }
    }
}

/// Content-service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsSettings {
    pub project_id: Option<String>,

    pub dataset: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_true")]
    pub use_cdn: bool,

    /// Display name reported by the adapter
    #[serde(default = "default_brand_name")]
    pub brand_name: String,
}

impl CmsSettings {
    /// A content source exists only when both identifiers are present
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.project_id) && present(&self.dataset)
    }
}

impl Default for CmsSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: None,
            api_version: default_api_version(),
            use_cdn: true,
            brand_name: default_brand_name(),
        }
    }
}

/// System-wide circuit breaker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// When false, reads are still timed out and fall back on failure but no
    /// breaker state is kept
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub default_config: CircuitBreakerComponentConfig,

    /// Per-service overrides keyed by service key
    #[serde(default)]
    pub component_configs: HashMap<String, CircuitBreakerComponentConfig>,
}

impl CircuitBreakerSettings {
    pub fn config_for_component(&self, service_key: &str) -> CircuitBreakerConfig {
        self.component_configs
            .get(service_key)
            .unwrap_or(&self.default_config)
            .to_resilience_config()
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_config: CircuitBreakerComponentConfig::default(),
            component_configs: HashMap::new(),
        }
    }
}

/// Breaker thresholds as written in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerComponentConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,

    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

impl CircuitBreakerComponentConfig {
    pub fn to_resilience_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
            success_threshold: self.success_threshold,
        }
    }
}

impl Default for CircuitBreakerComponentConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            success_threshold: default_success_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Seconds an entry stays fresh before the next read refetches it
    #[serde(default = "default_revalidate_seconds")]
    pub revalidate_seconds: u64,
}

impl CacheSettings {
    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_seconds)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            revalidate_seconds: default_revalidate_seconds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_per_call_timeout_ms")]
    pub per_call_timeout_ms: u64,
}

impl TimeoutSettings {
    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.per_call_timeout_ms)
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            per_call_timeout_ms: default_per_call_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Shared secret expected on publish webhooks; unset disables the webhook
    pub webhook_secret: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_api_version() -> String {
    "2025-10-01".to_string()
}

fn default_brand_name() -> String {
    "The Catch".to_string()
}

fn default_failure_threshold() -> u32 {
    CircuitBreakerConfig::default().failure_threshold
}

fn default_reset_timeout_ms() -> u64 {
    CircuitBreakerConfig::default().reset_timeout.as_millis() as u64
}

fn default_success_threshold() -> u32 {
    CircuitBreakerConfig::default().success_threshold
}

fn default_revalidate_seconds() -> u64 {
    60
}

fn default_per_call_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT.as_millis() as u64
}
