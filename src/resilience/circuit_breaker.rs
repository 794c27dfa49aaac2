//! # Circuit Breaker Implementation
//!
//! Per-service failure tracking for content-service reads. The breaker follows
//! the classic three-state pattern: Closed (live calls), Open (failing fast to
//! fallback content) and Half-Open (probing recovery).
//!
//! ```text
//! Closed   --failures >= failure_threshold-->  Open
//! Open     --call after reset_timeout------->  HalfOpen
//! HalfOpen --successes >= success_threshold->  Closed
//! HalfOpen --any failure-------------------->  Open (cooldown restarts)
//! ```
//!
//! The Open → HalfOpen check runs lazily when a call arrives; there is no
//! background timer. During periods with no traffic a recovered service is
//! therefore only noticed on the next request.
//!
//! All counter updates and transitions for one service happen under that
//! breaker's mutex, which is never held across an `.await`. State-change hooks
//! run after the lock is released so they may inspect the breaker.

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - calls are answered by the fallback without executing
    Open,
    /// Testing recovery - calls are executed as trial calls
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        };
        f.write_str(label)
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the operation was not executed
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

/// A single state transition, as delivered to hooks and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitTransition {
    pub service_key: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub timestamp: DateTime<Utc>,
}

/// Observer invoked synchronously on every transition.
///
/// Hooks must return promptly. A panicking hook is logged and does not undo
/// the transition.
///
/// Hooks run after the breaker lock is released. On a multi-threaded runtime
/// two transitions of the same breaker may therefore reach the hook out of
/// order; `CircuitTransition::timestamp` always reflects the order in which
/// they happened.
pub type StateChangeHook = Arc<dyn Fn(&CircuitTransition) + Send + Sync>;

/// Snapshot of a breaker's state-machine fields
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitRecord {
    pub service_key: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub opened_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
    total_calls: u64,
    success_count: u64,
    failure_count: u64,
    short_circuited_count: u64,
    total_duration: Duration,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            short_circuited_count: 0,
            total_duration: Duration::ZERO,
        }
    }

    /// Apply a transition, returning it when the state actually changed
    fn transition(&mut self, service_key: &str, to: CircuitState) -> Option<CircuitTransition> {
        let from = self.state;
        if from == to {
            return None;
        }

        self.state = to;
        match to {
            CircuitState::Open => {
                self.opened_at = Some(Instant::now());
                self.consecutive_successes = 0;
            }
            CircuitState::HalfOpen => {
                self.consecutive_successes = 0;
            }
            CircuitState::Closed => {
                self.consecutive_failures = 0;
                self.consecutive_successes = 0;
                self.opened_at = None;
            }
        }

        Some(CircuitTransition {
            service_key: service_key.to_string(),
            from,
            to,
            timestamp: Utc::now(),
        })
    }
}

/// Circuit breaker guarding one content service
pub struct CircuitBreaker {
    /// Service key for logging and metrics
    name: String,

    config: CircuitBreakerConfig,

    inner: Mutex<BreakerState>,

    on_state_change: Option<StateChangeHook>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .field("has_hook", &self.on_state_change.is_some())
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            service_key = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_ms = config.reset_timeout.as_millis() as u64,
            success_threshold = config.success_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            inner: Mutex::new(BreakerState::new()),
            on_state_change: None,
        }
    }

    /// Attach a hook fired on every state transition
    pub fn with_state_change_hook(mut self, hook: StateChangeHook) -> Self {
        self.on_state_change = Some(hook);
        self
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Snapshot of the state-machine fields
    pub fn record(&self) -> CircuitRecord {
        let inner = self.inner.lock();
        CircuitRecord {
            service_key: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
            opened_at: inner.opened_at,
        }
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_classified(operation, |_| true).await
    }

    /// Like [`call`](Self::call), but errors for which `is_failure` returns
    /// false are passed through without touching the counters.
    pub async fn call_classified<F, T, E, Fut, C>(
        &self,
        operation: F,
        is_failure: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnOnce(&E) -> bool,
    {
        if !self.should_allow_call() {
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let start_time = Instant::now();
        let result = operation().await;
        let duration = start_time.elapsed();

        match &result {
            Ok(_) => self.record_success(duration),
            Err(err) if is_failure(err) => self.record_failure(duration),
            Err(_) => {}
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Execute `primary`, answering with `fallback()` on every failure path.
    ///
    /// The primary's error is logged and recorded, never returned. When the
    /// circuit is open the primary is not invoked at all.
    pub async fn execute<F, Fut, T, E, FB>(&self, primary: F, fallback: FB) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        FB: FnOnce() -> T,
        E: fmt::Display,
    {
        self.execute_classified(primary, fallback, |_| true).await
    }

    /// [`execute`](Self::execute) with an error classifier, see
    /// [`call_classified`](Self::call_classified).
    pub async fn execute_classified<F, Fut, T, E, FB, C>(
        &self,
        primary: F,
        fallback: FB,
        is_failure: C,
    ) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        FB: FnOnce() -> T,
        E: fmt::Display,
        C: FnOnce(&E) -> bool,
    {
        match self.call_classified(primary, is_failure).await {
            Ok(value) => value,
            Err(CircuitBreakerError::CircuitOpen { .. }) => {
                debug!(service_key = %self.name, "Circuit OPEN, returning fallback");
                fallback()
            }
            Err(CircuitBreakerError::OperationFailed(err)) => {
                warn!(
                    service_key = %self.name,
                    error = %err,
                    "Request failed, returning fallback"
                );
                fallback()
            }
        }
    }

    /// Decide whether an arriving call may run, performing the lazy
    /// Open → HalfOpen transition when the cooldown has elapsed.
    fn should_allow_call(&self) -> bool {
        let (allowed, transition) = {
            let mut inner = self.inner.lock();
            match inner.state {
                CircuitState::Closed | CircuitState::HalfOpen => (true, None),
                CircuitState::Open => {
                    let cooled_down = match inner.opened_at {
                        Some(opened_at) => opened_at.elapsed() >= self.config.reset_timeout,
                        None => {
                            warn!(service_key = %self.name, "Circuit open but no timestamp recorded");
                            true
                        }
                    };

                    if cooled_down {
                        (true, inner.transition(&self.name, CircuitState::HalfOpen))
                    } else {
                        inner.short_circuited_count += 1;
                        (false, None)
                    }
                }
            }
        };

        self.emit(transition);
        allowed
    }

    fn record_success(&self, duration: Duration) {
        let transition = {
            let mut inner = self.inner.lock();
            inner.total_calls += 1;
            inner.success_count += 1;
            inner.total_duration += duration;

            match inner.state {
                CircuitState::Closed => {
                    inner.consecutive_failures = 0;
                    None
                }
                CircuitState::HalfOpen => {
                    inner.consecutive_successes += 1;
                    if inner.consecutive_successes >= self.config.success_threshold {
                        inner.transition(&self.name, CircuitState::Closed)
                    } else {
                        None
                    }
                }
                // A call admitted before the circuit opened finished late
                CircuitState::Open => None,
            }
        };

        debug!(
            service_key = %self.name,
            duration_ms = duration.as_millis() as u64,
            "🟢 Operation succeeded"
        );
        self.emit(transition);
    }

    fn record_failure(&self, duration: Duration) {
        let transition = {
            let mut inner = self.inner.lock();
            inner.total_calls += 1;
            inner.failure_count += 1;
            inner.total_duration += duration;

            match inner.state {
                CircuitState::Closed => {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.failure_threshold {
                        inner.transition(&self.name, CircuitState::Open)
                    } else {
                        None
                    }
                }
                CircuitState::HalfOpen => {
                    inner.consecutive_failures += 1;
                    inner.transition(&self.name, CircuitState::Open)
                }
                CircuitState::Open => None,
            }
        };

        debug!(
            service_key = %self.name,
            duration_ms = duration.as_millis() as u64,
            "🔴 Operation failed"
        );
        self.emit(transition);
    }

    /// Log a transition and notify the hook. Called without the lock held.
    fn emit(&self, transition: Option<CircuitTransition>) {
        let Some(transition) = transition else {
            return;
        };

        match transition.to {
            CircuitState::Open => error!(
                service_key = %transition.service_key,
                from_state = %transition.from,
                to_state = %transition.to,
                timestamp = %transition.timestamp.to_rfc3339(),
                failure_threshold = self.config.failure_threshold,
                reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                "🔴 Circuit breaker opened - falling back to static content"
            ),
            CircuitState::HalfOpen => info!(
                service_key = %transition.service_key,
                from_state = %transition.from,
                to_state = %transition.to,
                timestamp = %transition.timestamp.to_rfc3339(),
                success_threshold = self.config.success_threshold,
                "🟡 Circuit breaker half-open (testing recovery)"
            ),
            CircuitState::Closed => info!(
                service_key = %transition.service_key,
                from_state = %transition.from,
                to_state = %transition.to,
                timestamp = %transition.timestamp.to_rfc3339(),
                "🟢 Circuit breaker closed - back to live content"
            ),
        }

        if let Some(hook) = &self.on_state_change {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook(&transition)));
            if outcome.is_err() {
                error!(
                    service_key = %transition.service_key,
                    to_state = %transition.to,
                    "State change hook panicked"
                );
            }
        }
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(service_key = %self.name, "🚨 Circuit breaker forced open");
        let transition = {
            let mut inner = self.inner.lock();
            let transition = inner.transition(&self.name, CircuitState::Open);
            // Restart the cooldown even when already open
            inner.opened_at = Some(Instant::now());
            transition
        };
        self.emit(transition);
    }

    /// Force circuit to closed state, clearing both counters
    pub fn force_closed(&self) {
        warn!(service_key = %self.name, "🚨 Circuit breaker forced closed");
        let transition = {
            let mut inner = self.inner.lock();
            let transition = inner.transition(&self.name, CircuitState::Closed);
            inner.consecutive_failures = 0;
            inner.consecutive_successes = 0;
            transition
        };
        self.emit(transition);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        let mut snapshot = CircuitBreakerMetrics::new();
        snapshot.total_calls = inner.total_calls;
        snapshot.success_count = inner.success_count;
        snapshot.failure_count = inner.failure_count;
        snapshot.short_circuited_count = inner.short_circuited_count;
        snapshot.consecutive_failures = u64::from(inner.consecutive_failures);
        snapshot.consecutive_successes = u64::from(inner.consecutive_successes);
        snapshot.total_duration = inner.total_duration;
        snapshot.current_state = inner.state;

        if inner.total_calls > 0 {
            snapshot.failure_rate = inner.failure_count as f64 / inner.total_calls as f64;
            snapshot.success_rate = inner.success_count as f64 / inner.total_calls as f64;
            let average_nanos = inner.total_duration.as_nanos() / u128::from(inner.total_calls);
            snapshot.average_duration = Duration::from_nanos(u64::try_from(average_nanos).unwrap_or(u64::MAX));
        }

        snapshot
    }

    /// Check if circuit is healthy, by the same rule as [`CircuitBreakerMetrics::is_healthy`]
    pub fn is_healthy(&self) -> bool {
        self.metrics().is_healthy()
    }
}
