//! # Content Cache Module
//!
//! In-process, time-bounded caching for content reads.
//!
//! ```text
//! get(key) ──► fresh entry? ──yes──► value
//!                  │ no
//!                  ▼
//!          fetch in flight? ──yes──► await shared fetch
//!                  │ no
//!                  ▼
//!          spawn fetch ──► Fresh: store + return
//!                          Degraded: return only
//! ```
//!
//! Entries expire after a fixed revalidation window or when a tag they carry
//! is invalidated by a publish event.

pub mod errors;
pub mod revalidating;

pub use errors::{CacheError, CacheResult};
pub use revalidating::{CacheEntry, Fetched, RevalidatingCache};
