//! Configuration Loader
//!
//! Layered loading with the `config` crate. Later layers override earlier ones:
//!
//! 1. [`AdapterConfig::default`], serialized to JSON as the base layer
//! 2. an optional configuration file (format inferred from its extension)
//! 3. environment variables with the `STOREFRONT_` prefix, `__` for nesting

use super::error::{ConfigResult, ConfigurationError};
use super::AdapterConfig;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "STOREFRONT";

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_VAR: &str = "STOREFRONT_CONFIG_PATH";

const SUPPORTED_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

/// Builder for a layered configuration load
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Override the environment prefix (isolates tests from each other)
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Merge all layers, deserialize and validate
    pub fn load(&self) -> ConfigResult<AdapterConfig> {
        let defaults = serde_json::to_string(&AdapterConfig::default())?;
        let mut builder =
            Config::builder().add_source(File::from_str(&defaults, FileFormat::Json));

        if let Some(path) = &self.config_file {
            Self::check_config_file(path)?;
            debug!(config_file = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()));
        }

        // STOREFRONT_CMS__PROJECT_ID=abc123 → cms.project_id
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AdapterConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn check_config_file(path: &Path) -> ConfigResult<()> {
        if !path.is_file() {
            return Err(ConfigurationError::FileNotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ConfigurationError::invalid_value(
                "config_file",
                path.display().to_string(),
                "expected a .toml, .yaml, .yml or .json file",
            ));
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loaded configuration together with the environment it was loaded for
#[derive(Debug)]
pub struct ConfigManager {
    config: AdapterConfig,
    environment: String,
}

impl ConfigManager {
    /// Load from the process environment, honouring `STOREFRONT_CONFIG_PATH`
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let mut loader = ConfigLoader::new();
        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            loader = loader.with_file(path);
        }
        Self::load_with(&loader, &Self::detect_environment())
    }

    /// Load with an explicit loader and environment name
    pub fn load_with(loader: &ConfigLoader, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        let config = loader.load()?;

        debug!(
            config = %Self::sanitize_config_for_logging(&config),
            "Configuration loaded"
        );
        info!(
            environment = environment,
            cms_configured = config.cms.is_configured(),
            breakers_enabled = config.circuit_breakers.enabled,
            revalidate_seconds = config.cache.revalidate_seconds,
            per_call_timeout_ms = config.timeouts.per_call_timeout_ms,
            "✅ Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
        }))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Configuration as JSON with secrets masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    /// `STOREFRONT_ENV`, then `APP_ENV`, else `development`
    pub fn detect_environment() -> String {
        env::var("STOREFRONT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .map(|value| value.to_lowercase())
            .unwrap_or_else(|_| "development".to_string())
    }

    fn sanitize_config_for_logging(config: &AdapterConfig) -> serde_json::Value {
        let mut config_json = serde_json::to_value(config).unwrap_or_default();
        let sensitive_patterns = ["password", "secret", "token", "credential"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match &*val {
                            serde_json::Value::Null => serde_json::Value::Null,
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
