//! Validated content records.
//!
//! Every value of these types has passed the schema validator or comes from the
//! static fallback dataset. Serialization uses camelCase to match the payloads
//! the storefront pages render.

use crate::constants::ALL_LOCATIONS_SLUG;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Sales region a location belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Dfw,
    Houston,
    Oklahoma,
    EastTx,
    WestTx,
}

impl Region {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dfw" => Some(Region::Dfw),
            "houston" => Some(Region::Houston),
            "oklahoma" => Some(Region::Oklahoma),
            "east-tx" => Some(Region::EastTx),
            "west-tx" => Some(Region::WestTx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Dfw => "dfw",
            Region::Houston => "houston",
            Region::Oklahoma => "oklahoma",
            Region::EastTx => "east-tx",
            Region::WestTx => "west-tx",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Finite and within latitude/longitude bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Opening hours, one free-form string per weekday
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hours {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thursday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturday: Option<String>,
}

impl Hours {
    /// Same hours Monday-Thursday, Friday-Saturday and Sunday
    pub fn weekly(weekday: &str, weekend: &str, sunday: &str) -> Self {
        Self {
            sunday: Some(sunday.to_string()),
            monday: Some(weekday.to_string()),
            tuesday: Some(weekday.to_string()),
            wednesday: Some(weekday.to_string()),
            thursday: Some(weekday.to_string()),
            friday: Some(weekend.to_string()),
            saturday: Some(weekend.to_string()),
        }
    }
}

/// Online ordering links for a location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingUrls {
    /// First-party ordering, falling back to the menu page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doordash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uber_eats: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<Hours>,
    pub hero_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
    pub ordering_urls: OrderingUrls,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directions_url: Option<String>,
    pub open_today: bool,
}

/// Menu badges. Anything else found in a payload is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "Family Favorite")]
    FamilyFavorite,
    Salvadoran,
    #[serde(rename = "Tex-Mex")]
    TexMex,
    Spicy,
    Vegetarian,
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    Cajun,
    Fried,
    Grilled,
    Boiled,
    #[serde(rename = "Market Price")]
    MarketPrice,
}

impl Badge {
    pub const ALL: [Badge; 11] = [
        Badge::FamilyFavorite,
        Badge::Salvadoran,
        Badge::TexMex,
        Badge::Spicy,
        Badge::Vegetarian,
        Badge::GlutenFree,
        Badge::Cajun,
        Badge::Fried,
        Badge::Grilled,
        Badge::Boiled,
        Badge::MarketPrice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::FamilyFavorite => "Family Favorite",
            Badge::Salvadoran => "Salvadoran",
            Badge::TexMex => "Tex-Mex",
            Badge::Spicy => "Spicy",
            Badge::Vegetarian => "Vegetarian",
            Badge::GlutenFree => "Gluten-Free",
            Badge::Cajun => "Cajun",
            Badge::Fried => "Fried",
            Badge::Grilled => "Grilled",
            Badge::Boiled => "Boiled",
            Badge::MarketPrice => "Market Price",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|badge| badge.as_str() == value)
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-location price and availability for an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierOption {
    pub key: String,
    pub name: String,
    /// Added to the item price when selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub is_default: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierGroup {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub multi_select: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<f64>,
    pub options: Vec<ModifierOption>,
}

/// Item-specific price or availability for one modifier option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemModifierOverride {
    pub key: String,
    pub modifier_group_id: String,
    pub option_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `None` means market price / call for price, never zero
    pub price: Option<f64>,
    pub badges: Vec<Badge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub available_everywhere: bool,
    pub allow_special_instructions: bool,
    pub location_overrides: BTreeMap<String, LocationOverride>,
    pub modifier_groups: Vec<ModifierGroup>,
    pub item_modifier_overrides: Vec<ItemModifierOverride>,
}

impl MenuItem {
    /// Location price if overridden, else the base price
    pub fn effective_price(&self, location_slug: &str) -> Option<f64> {
        if location_slug != ALL_LOCATIONS_SLUG {
            if let Some(price) = self
                .location_overrides
                .get(location_slug)
                .and_then(|o| o.price)
            {
                return Some(price);
            }
        }
        self.price
    }

    /// Opt-in availability: shown only when available everywhere or
    /// explicitly enabled for the location
    pub fn is_available_at(&self, location_slug: &str) -> bool {
        if location_slug == ALL_LOCATIONS_SLUG || self.available_everywhere {
            return true;
        }

        self.location_overrides
            .get(location_slug)
            .and_then(|o| o.available)
            .unwrap_or(false)
    }
}

/// Display a price: `MKT` when absent, whole dollars without decimals
pub fn format_price(price: Option<f64>) -> String {
    match price {
        None => "MKT".to_string(),
        Some(value) if value.fract() == 0.0 => format!("{value:.0}"),
        Some(value) => format!("{value:.2}"),
    }
}
