//! Raw payload records → validated content records.
//!
//! Leaf-level data is cleaned up individually: malformed modifier groups,
//! options, overrides, URLs, regions and coordinates are dropped or replaced
//! by static defaults without failing the record that contains them.

use super::schema::{RawCategory, RawLocation, RawMenuItem};
use super::types::{
    Badge, Category, GeoPoint, Hours, ItemModifierOverride, Location, LocationOverride,
    MenuItem, ModifierGroup, ModifierOption, OrderingUrls, Region,
};
use crate::constants::{fallback_geo, fallback_hero};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

pub fn category(raw: RawCategory) -> Category {
    Category {
        slug: raw.slug,
        title: raw.title,
        position: raw.position,
        description: raw.description,
    }
}

pub fn location(raw: RawLocation) -> Location {
    let region = raw.region.as_deref().and_then(|value| {
        let region = Region::parse(value);
        if region.is_none() {
            debug!(slug = %raw.slug, region = value, "Dropping unknown region");
        }
        region
    });

    let menu_url = http_url(raw.menu_url);
    let order = http_url(raw.revel_url).or_else(|| menu_url.clone());
    let opening_hours = raw.hours.as_ref().and_then(hours);
    let geo = raw
        .geo
        .as_ref()
        .and_then(geo_point)
        .or_else(|| fallback_geo(&raw.slug));
    let hero_image = raw
        .hero_image
        .filter(|image| !image.trim().is_empty())
        .unwrap_or_else(|| fallback_hero(&raw.slug).to_string());

    Location {
        id: raw.id,
        name: raw.name,
        region,
        address_line1: raw.address_line1.unwrap_or_default(),
        address_line2: raw.address_line2,
        city: raw.city.unwrap_or_default(),
        state: raw.state.unwrap_or_default(),
        postal_code: raw.postal_code.unwrap_or_default(),
        phone: raw.phone,
        open_today: opening_hours.is_some(),
        hours: opening_hours,
        hero_image,
        geo,
        ordering_urls: OrderingUrls {
            order,
            doordash: http_url(raw.doordash_url),
            uber_eats: http_url(raw.uber_eats_url),
        },
        menu_url,
        directions_url: http_url(raw.directions_url),
        slug: raw.slug,
    }
}

pub fn menu_item(raw: RawMenuItem) -> MenuItem {
    MenuItem {
        id: raw.id,
        name: raw.name,
        slug: raw.slug,
        category_slug: raw.category_slug,
        description: raw.description,
        price: raw.base_price,
        badges: raw.badges.as_ref().map(badges).unwrap_or_default(),
        image: raw.image,
        available_everywhere: raw.available_everywhere.unwrap_or(false),
        allow_special_instructions: raw.allow_special_instructions.unwrap_or(true),
        location_overrides: raw.overrides.as_ref().map(location_overrides).unwrap_or_default(),
        modifier_groups: raw.modifier_groups.as_ref().map(modifier_groups).unwrap_or_default(),
        item_modifier_overrides: raw
            .item_modifier_overrides
            .as_ref()
            .map(item_modifier_overrides)
            .unwrap_or_default(),
    }
}

/// Known badge strings, in payload order
pub fn badges(value: &Value) -> Vec<Badge> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .filter_map(Badge::parse)
                .collect()
        })
        .unwrap_or_default()
}

/// `[{loc, price?, available?}]` → map keyed by location slug.
///
/// Entries without a `loc` are dropped; a later entry for the same slug wins.
pub fn location_overrides(value: &Value) -> BTreeMap<String, LocationOverride> {
    let mut overrides = BTreeMap::new();
    for entry in objects(value) {
        let Some(slug) = non_empty_str(entry, "loc") else {
            continue;
        };
        overrides.insert(
            slug.to_string(),
            LocationOverride {
                price: entry.get("price").and_then(Value::as_f64),
                available: entry.get("available").and_then(Value::as_bool),
            },
        );
    }
    overrides
}

/// Groups missing `_id`, `name` or `slug` are dropped, as are options missing
/// `_key` or `name`. Groups are ordered by `displayOrder`, unordered last.
pub fn modifier_groups(value: &Value) -> Vec<ModifierGroup> {
    let mut groups: Vec<ModifierGroup> = objects(value)
        .filter_map(|group| {
            let id = non_empty_str(group, "_id")?;
            let name = non_empty_str(group, "name")?;
            let slug = non_empty_str(group, "slug")?;

            Some(ModifierGroup {
                id: id.to_string(),
                name: name.to_string(),
                slug: slug.to_string(),
                description: non_empty_str(group, "description").map(str::to_string),
                required: flag(group, "required"),
                multi_select: flag(group, "multiSelect"),
                min_selections: count(group, "minSelections"),
                max_selections: count(group, "maxSelections"),
                display_order: group.get("displayOrder").and_then(Value::as_f64),
                options: group
                    .get("options")
                    .map(modifier_options)
                    .unwrap_or_default(),
            })
        })
        .collect();

    groups.sort_by(|a, b| match (a.display_order, b.display_order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    groups
}

fn modifier_options(value: &Value) -> Vec<ModifierOption> {
    objects(value)
        .filter_map(|option| {
            let key = non_empty_str(option, "_key")?;
            let name = non_empty_str(option, "name")?;

            Some(ModifierOption {
                key: key.to_string(),
                name: name.to_string(),
                price: option.get("price").and_then(Value::as_f64),
                is_default: flag(option, "isDefault"),
                available: option.get("available").and_then(Value::as_bool) != Some(false),
                calories: option.get("calories").and_then(Value::as_f64),
            })
        })
        .collect()
}

/// Entries missing `_key`, `modifierGroupId` or `optionName` are dropped
pub fn item_modifier_overrides(value: &Value) -> Vec<ItemModifierOverride> {
    objects(value)
        .filter_map(|entry| {
            Some(ItemModifierOverride {
                key: non_empty_str(entry, "_key")?.to_string(),
                modifier_group_id: non_empty_str(entry, "modifierGroupId")?.to_string(),
                option_name: non_empty_str(entry, "optionName")?.to_string(),
                price: entry.get("price").and_then(Value::as_f64),
                available: entry.get("available").and_then(Value::as_bool) != Some(false),
            })
        })
        .collect()
}

/// Weekday strings from an hours object; anything else is no hours
pub fn hours(value: &Value) -> Option<Hours> {
    let map = value.as_object()?;
    let day = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_string);

    Some(Hours {
        sunday: day("sunday"),
        monday: day("monday"),
        tuesday: day("tuesday"),
        wednesday: day("wednesday"),
        thursday: day("thursday"),
        friday: day("friday"),
        saturday: day("saturday"),
    })
}

/// `{lat, lng}` within coordinate bounds
pub fn geo_point(value: &Value) -> Option<GeoPoint> {
    let point = GeoPoint {
        lat: value.get("lat")?.as_f64()?,
        lng: value.get("lng")?.as_f64()?,
    };
    point.is_valid().then_some(point)
}

/// Absolute http(s) URL, or `None`
pub fn http_url(value: Option<String>) -> Option<String> {
    let candidate = value?;
    match Url::parse(&candidate) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(candidate),
        _ => {
            debug!(url = %candidate, "Dropping malformed URL");
            None
        }
    }
}

fn objects<'a>(value: &'a Value) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    map.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn flag(map: &Map<String, Value>, field: &str) -> bool {
    map.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn count(map: &Map<String, Value>, field: &str) -> Option<u32> {
    map.get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}
