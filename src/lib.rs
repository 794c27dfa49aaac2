#![allow(clippy::doc_markdown)] // Allow technical terms like GROQ, CMS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Storefront Content
//!
//! Resilient reads of menu, location and pricing content from an external CMS
//! for the online ordering storefront.
//!
//! ## Overview
//!
//! The storefront must render even when the CMS is slow, down, or returning
//! malformed data. Every read goes through the same protection chain:
//!
//! - **Timeout guard**: each call is bounded (10s by default)
//! - **Circuit breaker**: one per content type; after 5 consecutive failures
//!   calls short-circuit for 30s, then two successful trial calls close it
//! - **Schema validation**: payloads are typed strictly at the top level and
//!   cleaned up leniently at the leaves
//! - **Revalidating cache**: live results are kept for 60s, concurrent misses
//!   share one fetch, and publish notifications invalidate by tag
//! - **Static fallback**: a small built-in dataset answers every failed read
//!
//! ## Module Organization
//!
//! - [`content`] - Content types, validation, fallback data and the [`ContentAdapter`]
//! - [`resilience`] - Timeout guard, circuit breakers and their registry
//! - [`cache`] - Revalidating cache with stampede coalescing
//! - [`config`] - Layered configuration
//! - [`error`] - Read-path error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storefront_content::config::ConfigManager;
//! use storefront_content::ContentAdapter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! storefront_content::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let adapter = ContentAdapter::unconfigured(manager.config().clone());
//!
//! for category in adapter.list_categories().await {
//!     println!("{}: {} items", category.title, adapter.items_by_category(&category.slug).await.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod logging;
pub mod resilience;

pub use config::{AdapterConfig, ConfigManager, ConfigurationError};
pub use content::{
    Category, ContentAdapter, ContentQuery, ContentSource, FallbackDataset, HealthReport,
    Location, MenuItem, PublishEvent,
};
pub use error::{ContentError, Result};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
