//! # Resilience Module
//!
//! Fault tolerance for content-service reads: a timeout guard bounding each
//! call, a circuit breaker per service key, and the metrics those breakers
//! report. A failing content service degrades the storefront to static
//! fallback content instead of erroring the page.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use storefront_content::resilience::{with_timeout, CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::new("categories".to_string(), CircuitBreakerConfig::default());
//!
//! let titles: Vec<String> = breaker
//!     .execute(
//!         || async {
//!             with_timeout(async { Ok::<_, String>(vec!["Starters".to_string()]) }, Duration::from_secs(10))
//!                 .await
//!                 .map_err(|e| e.to_string())?
//!         },
//!         || vec!["Baskets".to_string()],
//!     )
//!     .await;
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;
pub mod registry;
pub mod timeout;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerError, CircuitRecord, CircuitState, CircuitTransition,
    StateChangeHook,
};
pub use config::CircuitBreakerConfig;
pub use metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
pub use registry::CircuitBreakerRegistry;
pub use timeout::{with_timeout, TimeoutError, DEFAULT_CALL_TIMEOUT};
