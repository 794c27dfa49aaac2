//! Static fallback dataset.
//!
//! Served whenever the content service is not configured, its breaker is
//! open, or a fetch fails, times out or does not validate. Built once on first
//! use and never mutated; callers receive clones.

use super::types::{Badge, Category, Hours, Location, MenuItem, OrderingUrls, Region};
use crate::constants::{fallback_geo, fallback_hero};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const MENU_URL: &str = "https://thecatchusa.com/menu";
const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

#[derive(Debug)]
pub struct FallbackDataset {
    categories: Vec<Category>,
    locations: Vec<Location>,
    items: Vec<MenuItem>,
}

static DATASET: OnceLock<FallbackDataset> = OnceLock::new();

impl FallbackDataset {
    /// Process-wide dataset
    pub fn get() -> &'static FallbackDataset {
        DATASET.get_or_init(Self::build)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.clone()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.locations.clone()
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.items.clone()
    }

    pub fn location_by_slug(&self, slug: &str) -> Option<Location> {
        self.locations.iter().find(|l| l.slug == slug).cloned()
    }

    fn build() -> Self {
        Self {
            categories: vec![
                category(
                    "starters",
                    "Starters",
                    1.0,
                    "Begin with something crispy and shareable.",
                ),
                category(
                    "baskets",
                    "Seafood Baskets",
                    2.0,
                    "House favorites served with fries and hushpuppies.",
                ),
            ],
            locations: vec![
                location(
                    "demo-humble",
                    "The Catch – Humble",
                    "humble",
                    ("19325 Timber Forest Dr", "Humble", "77346"),
                    "(281) 812-4010",
                ),
                location(
                    "demo-willowbrook",
                    "The Catch – Willowbrook",
                    "willowbrook",
                    ("17615 Tomball Pkwy", "Houston", "77064"),
                    "(346) 867-5282",
                ),
            ],
            items: vec![
                item(
                    "demo-cajun-fondue",
                    "Cajun Shrimp Fondue",
                    "starters",
                    "Creamy Monterey Jack fondue with blackened shrimp and toasted baguette slices.",
                    12.5,
                    &[Badge::Cajun],
                ),
                item(
                    "demo-fried-green-tomatoes",
                    "Fried Green Tomatoes",
                    "starters",
                    "Cornmeal-dusted tomatoes with remoulade sauce.",
                    9.0,
                    &[Badge::Fried, Badge::Vegetarian],
                ),
                item(
                    "demo-catfish-basket",
                    "Southern Catfish Basket",
                    "baskets",
                    "Cornmeal fried catfish served with seasoned fries, hushpuppies, and jalapeño ranch.",
                    15.0,
                    &[Badge::Fried],
                ),
                item(
                    "demo-grilled-salmon",
                    "Blackened Salmon Plate",
                    "baskets",
                    "Cast-iron blackened salmon with dirty rice and seasonal vegetables.",
                    19.5,
                    &[Badge::Grilled, Badge::Cajun],
                ),
            ],
        }
    }
}

fn category(slug: &str, title: &str, position: f64, description: &str) -> Category {
    Category {
        slug: slug.to_string(),
        title: title.to_string(),
        position: Some(position),
        description: Some(description.to_string()),
    }
}

fn location(
    id: &str,
    name: &str,
    slug: &str,
    (street, city, postal_code): (&str, &str, &str),
    phone: &str,
) -> Location {
    let town = name.rsplit(' ').next().unwrap_or(name);

    Location {
        id: id.to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
        region: Some(Region::Houston),
        address_line1: street.to_string(),
        address_line2: None,
        city: city.to_string(),
        state: "TX".to_string(),
        postal_code: postal_code.to_string(),
        phone: Some(phone.to_string()),
        hours: Some(Hours::weekly("11am – 9pm", "11am – 10pm", "11am – 8pm")),
        hero_image: fallback_hero(slug).to_string(),
        geo: fallback_geo(slug),
        ordering_urls: OrderingUrls {
            order: Some(MENU_URL.to_string()),
            doordash: None,
            uber_eats: None,
        },
        menu_url: Some(MENU_URL.to_string()),
        directions_url: Some(format!(
            "https://maps.apple.com/?q=The%20Catch%20{town}"
        )),
        open_today: true,
    }
}

// Fallback items carry no per-location overrides, so they are offered
// everywhere.
fn item(
    id: &str,
    name: &str,
    category_slug: &str,
    description: &str,
    price: f64,
    badges: &[Badge],
) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        slug: slug_for(name),
        category_slug: category_slug.to_string(),
        description: Some(description.to_string()),
        price: Some(price),
        badges: badges.to_vec(),
        image: Some(PLACEHOLDER_IMAGE.to_string()),
        available_everywhere: true,
        allow_special_instructions: true,
        location_overrides: BTreeMap::new(),
        modifier_groups: Vec::new(),
        item_modifier_overrides: Vec::new(),
    }
}

fn slug_for(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
