//! Content service seam.
//!
//! The adapter never talks to the network itself; it is handed a
//! [`ContentSource`] that runs a query and returns the untyped JSON result.

use crate::error::ContentError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

const Q_CATEGORIES: &str = r#"*[_type=="menuCategory"]|order(position asc){ "slug": slug.current, title, position, description }"#;

const Q_LOCATIONS: &str = r#"*[_type=="location"]{ _id, name, "slug": slug.current, region, addressLine1, addressLine2, city, state, postalCode, phone, hours, revelUrl, doordashUrl, uberEatsUrl, menuUrl, directionsUrl, "heroImage": heroImage.asset->url, "geo": geo }"#;

const Q_ITEMS: &str = r#"*[_type=="menuItem"]{
  _id,
  name,
  "slug": slug.current,
  description,
  "categorySlug": category->slug.current,
  "image": image.asset->url,
  badges,
  "basePrice": basePrice,
  availableEverywhere,
  allowSpecialInstructions,
  "overrides": coalesce(locationOverrides, [])[]{ "loc": location->slug.current, price, available },
  "modifierGroups": modifierGroups[]->{
    _id,
    name,
    "slug": slug.current,
    description,
    required,
    multiSelect,
    minSelections,
    maxSelections,
    displayOrder,
    options[]{ _key, name, price, isDefault, available, calories }
  } | order(displayOrder asc),
  "itemModifierOverrides": itemModifierOverrides[]{
    _key,
    "modifierGroupId": modifierGroup->_id,
    optionName,
    price,
    available
  }
}"#;

const Q_LOCATION_BY_SLUG: &str = r#"*[_type=="location" && slug.current==$s][0]{ _id, name, "slug": slug.current, region, addressLine1, addressLine2, city, state, postalCode, phone, hours, menuUrl, directionsUrl, revelUrl, doordashUrl, uberEatsUrl, "heroImage": heroImage.asset->url, "geo": geo }"#;

const Q_HEALTH_PROBE: &str = r#"count(*[_type == "location"])"#;

/// A read against the content service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentQuery {
    Categories,
    Locations,
    Items,
    LocationBySlug(String),
    /// Cheap connectivity check
    HealthProbe,
}

impl ContentQuery {
    /// Query text understood by the content service
    pub fn groq(&self) -> &'static str {
        match self {
            ContentQuery::Categories => Q_CATEGORIES,
            ContentQuery::Locations => Q_LOCATIONS,
            ContentQuery::Items => Q_ITEMS,
            ContentQuery::LocationBySlug(_) => Q_LOCATION_BY_SLUG,
            ContentQuery::HealthProbe => Q_HEALTH_PROBE,
        }
    }

    /// Bound query parameters
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if let ContentQuery::LocationBySlug(slug) = self {
            params.insert("s".to_string(), Value::String(slug.clone()));
        }
        params
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentQuery::Categories => "categories",
            ContentQuery::Locations => "locations",
            ContentQuery::Items => "items",
            ContentQuery::LocationBySlug(_) => "location_by_slug",
            ContentQuery::HealthProbe => "health_probe",
        }
    }
}

impl fmt::Display for ContentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentQuery::LocationBySlug(slug) => write!(f, "location_by_slug({slug})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Raw transport to the content service.
///
/// Implementations return the query result as-is. Network failures and 5xx
/// responses map to [`ContentError::Transient`]; validation happens in the
/// adapter.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, query: &ContentQuery) -> Result<Value, ContentError>;
}
