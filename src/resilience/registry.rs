//! # Circuit Breaker Registry
//!
//! Owns one breaker per service key. Breakers are created lazily on first use,
//! live for the lifetime of the registry and never share state with each other.

use crate::config::CircuitBreakerSettings;
use crate::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitRecord, CircuitState,
    StateChangeHook, SystemCircuitBreakerMetrics,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Registry of circuit breakers keyed by service
pub struct CircuitBreakerRegistry {
    circuit_breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,

    settings: CircuitBreakerSettings,

    /// Attached to every breaker this registry creates
    on_state_change: Option<StateChangeHook>,
}

impl fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("components", &self.list_components())
            .field("settings", &self.settings)
            .finish()
    }
}

impl CircuitBreakerRegistry {
    pub fn new(settings: CircuitBreakerSettings) -> Self {
        info!(
            enabled = settings.enabled,
            component_overrides = settings.component_configs.len(),
            "Initializing circuit breaker registry"
        );

        Self {
            circuit_breakers: RwLock::new(HashMap::new()),
            settings,
            on_state_change: None,
        }
    }

    pub fn with_state_change_hook(mut self, hook: StateChangeHook) -> Self {
        self.on_state_change = Some(hook);
        self
    }

    pub fn settings(&self) -> &CircuitBreakerSettings {
        &self.settings
    }

    /// Get the breaker for `service_key`, creating it with the configured
    /// thresholds for that service
    pub fn get(&self, service_key: &str) -> Arc<CircuitBreaker> {
        self.get_or_create(service_key, self.settings.config_for_component(service_key))
    }

    /// Get the breaker for `service_key`, creating it with `config` if absent.
    ///
    /// `config` is ignored when the breaker already exists.
    pub fn get_or_create(&self, service_key: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        {
            let breakers = self.circuit_breakers.read();
            if let Some(breaker) = breakers.get(service_key) {
                return Arc::clone(breaker);
            }
        }

        let mut breakers = self.circuit_breakers.write();

        // Double-check: another caller may have created it between the locks
        if let Some(breaker) = breakers.get(service_key) {
            return Arc::clone(breaker);
        }

        let mut breaker = CircuitBreaker::new(service_key.to_string(), config);
        if let Some(hook) = &self.on_state_change {
            breaker = breaker.with_state_change_hook(Arc::clone(hook));
        }
        let breaker = Arc::new(breaker);

        breakers.insert(service_key.to_string(), Arc::clone(&breaker));

        info!(
            service_key = service_key,
            total_circuit_breakers = breakers.len(),
            "Created new circuit breaker"
        );

        breaker
    }

    /// Current state for `service_key`; a service with no breaker yet reads
    /// as Closed and none is created
    pub fn state(&self, service_key: &str) -> CircuitState {
        self.circuit_breakers
            .read()
            .get(service_key)
            .map_or(CircuitState::Closed, |breaker| breaker.state())
    }

    /// Get all service keys, sorted
    pub fn list_components(&self) -> Vec<String> {
        let breakers = self.circuit_breakers.read();
        let mut keys: Vec<String> = breakers.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Metrics for one service, if its breaker exists
    pub fn component_metrics(&self, service_key: &str) -> Option<CircuitBreakerMetrics> {
        let breakers = self.circuit_breakers.read();
        breakers.get(service_key).map(|breaker| breaker.metrics())
    }

    /// State-machine snapshot for one service, if its breaker exists
    pub fn component_record(&self, service_key: &str) -> Option<CircuitRecord> {
        let breakers = self.circuit_breakers.read();
        breakers.get(service_key).map(|breaker| breaker.record())
    }

    pub fn system_metrics(&self) -> SystemCircuitBreakerMetrics {
        let breakers = self.circuit_breakers.read();
        let mut system_metrics = SystemCircuitBreakerMetrics::new();

        for (name, breaker) in breakers.iter() {
            system_metrics.add_circuit_breaker(name.clone(), breaker.metrics());
        }

        system_metrics
    }

    /// Force every existing breaker open
    pub fn force_open_all(&self) {
        warn!("🚨 Force opening all circuit breakers");
        for breaker in self.snapshot() {
            breaker.force_open();
        }
    }

    pub fn force_close_all(&self) {
        warn!("🚨 Force closing all circuit breakers");
        for breaker in self.snapshot() {
            breaker.force_closed();
        }
    }

    /// Drop the breaker for `service_key`; the next use starts from Closed.
    ///
    /// Returns whether a breaker existed.
    pub fn reset(&self, service_key: &str) -> bool {
        let removed = self.circuit_breakers.write().remove(service_key).is_some();
        if removed {
            info!(service_key = service_key, "Circuit breaker reset");
        }
        removed
    }

    pub fn reset_all(&self) {
        let mut breakers = self.circuit_breakers.write();
        let count = breakers.len();
        breakers.clear();
        info!(count = count, "All circuit breakers reset");
    }

    // Clone the handles so breaker calls (and their hooks) run without the
    // registry lock held
    fn snapshot(&self) -> Vec<Arc<CircuitBreaker>> {
        self.circuit_breakers.read().values().cloned().collect()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerSettings::default())
    }
}
