//! # Content Module
//!
//! Typed storefront content (categories, locations, menu items), the
//! validation that produces it from raw CMS payloads, the static fallback
//! dataset, and the [`ContentAdapter`] that ties them to the resilience and
//! cache layers.

pub mod adapter;
pub mod fallback;
pub mod health;
pub mod normalizers;
pub mod publish;
pub mod schema;
pub mod source;
pub mod types;

pub use adapter::ContentAdapter;
pub use fallback::FallbackDataset;
pub use health::{BreakerHealth, HealthReport, HealthStatus, ProbeResult, ProbeStatus};
pub use publish::{PublishAuthenticator, PublishError, PublishEvent, PublishOutcome};
pub use source::{ContentQuery, ContentSource};
pub use types::{
    format_price, Badge, Category, GeoPoint, Hours, ItemModifierOverride, Location,
    LocationOverride, MenuItem, ModifierGroup, ModifierOption, OrderingUrls, Region,
};
