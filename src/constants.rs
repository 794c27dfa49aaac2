//! # Content Adapter Constants
//!
//! Service keys, cache keys and tags, and the static per-location tables used
//! when content-service data is missing or unusable.

use crate::content::GeoPoint;

/// Circuit breaker service keys, one per protected content query family
pub mod service_keys {
    pub const CATEGORIES: &str = "categories";
    pub const LOCATIONS: &str = "locations";
    pub const ITEMS: &str = "items";

    pub const ALL: [&str; 3] = [CATEGORIES, LOCATIONS, ITEMS];
}

/// Cache invalidation tags
pub mod cache_tags {
    pub const CATEGORIES: &str = "categories";
    pub const LOCATIONS: &str = "locations";
    pub const ITEMS: &str = "items";
    /// Carried by every entry
    pub const ALL: &str = "content";
}

/// Cache keys for the list queries
pub mod cache_keys {
    pub const CATEGORIES: &str = "content-categories";
    pub const LOCATIONS: &str = "content-locations";
    pub const ITEMS: &str = "content-items";
}

/// Slug that bypasses per-location overrides and availability filtering
pub const ALL_LOCATIONS_SLUG: &str = "all";

const FALLBACK_LOCATION_PHOTOGRAPHY: [(&str, &str); 4] = [
    ("conroe", "/images/Location-Conroe.jpg"),
    ("humble", "/images/Location-Humble.jpg"),
    ("s-post-oak", "/images/Location-Post-Oak.jpg"),
    ("willowbrook", "/images/Location-Willowbrook.jpg"),
];

pub const DEFAULT_FALLBACK_HERO: &str = "/images/Location-Humble.jpg";

// (slug, lat, lng)
const FALLBACK_GEO_COORDINATES: [(&str, f64, f64); 17] = [
    // Oklahoma
    ("okc-memorial", 35.610210, -97.550766),
    ("midwest-city", 35.440914, -97.405760),
    ("moore", 35.327000, -97.491210),
    // Texas
    ("arlington", 32.675407, -97.196220),
    ("atascocita", 29.993227, -95.177946),
    ("humble", 29.9988, -95.2622),
    ("burleson", 32.519184, -97.348927),
    ("coit-campbell", 32.977688, -96.770851),
    ("conroe", 30.317270, -95.478130),
    ("denton", 33.229110, -97.150930),
    ("garland", 32.949788, -96.651562),
    ("longview", 32.521200, -94.747800),
    ("lubbock", 33.519250, -101.921089),
    ("s-post-oak", 29.672800, -95.460240),
    ("tyler", 32.331307, -95.289808),
    ("wichita-falls", 33.880000, -98.520000),
    ("willowbrook", 29.963846, -95.543372),
];

/// Hero image for a location slug, defaulting to the Humble photography
pub fn fallback_hero(slug: &str) -> &'static str {
    let key = slug.trim().to_lowercase();
    FALLBACK_LOCATION_PHOTOGRAPHY
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, image)| *image)
        .unwrap_or(DEFAULT_FALLBACK_HERO)
}

/// Static coordinates for a known location slug
pub fn fallback_geo(slug: &str) -> Option<GeoPoint> {
    FALLBACK_GEO_COORDINATES
        .iter()
        .find(|(candidate, _, _)| *candidate == slug)
        .map(|(_, lat, lng)| GeoPoint { lat: *lat, lng: *lng })
}
