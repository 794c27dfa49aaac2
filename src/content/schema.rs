//! Payload validation.
//!
//! Strict at the top level, tolerant at the leaves. A list payload that is not
//! an array, or any record missing one of its identity fields, rejects the
//! whole payload with [`ContentError::Validation`]. Optional and nested data is
//! deserialized loosely (`serde_json::Value`) and cleaned up record by record
//! in [`super::normalizers`].

use super::normalizers;
use super::types::{Category, Location, MenuItem};
use crate::error::{ContentError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hours: Option<Value>,
    #[serde(default)]
    pub revel_url: Option<String>,
    #[serde(default)]
    pub doordash_url: Option<String>,
    #[serde(default)]
    pub uber_eats_url: Option<String>,
    #[serde(default)]
    pub menu_url: Option<String>,
    #[serde(default)]
    pub directions_url: Option<String>,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub geo: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMenuItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub badges: Option<Value>,
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub available_everywhere: Option<bool>,
    #[serde(default)]
    pub allow_special_instructions: Option<bool>,
    #[serde(default)]
    pub overrides: Option<Value>,
    #[serde(default)]
    pub modifier_groups: Option<Value>,
    #[serde(default)]
    pub item_modifier_overrides: Option<Value>,
}

pub fn parse_categories(payload: Value) -> Result<Vec<Category>> {
    parse_list::<RawCategory>(payload, "categories")
        .map(|records| records.into_iter().map(normalizers::category).collect())
}

pub fn parse_locations(payload: Value) -> Result<Vec<Location>> {
    parse_list::<RawLocation>(payload, "locations")
        .map(|records| records.into_iter().map(normalizers::location).collect())
}

pub fn parse_items(payload: Value) -> Result<Vec<MenuItem>> {
    parse_list::<RawMenuItem>(payload, "items")
        .map(|records| records.into_iter().map(normalizers::menu_item).collect())
}

/// Point query result: `null` means no such location
pub fn parse_location(payload: Value) -> Result<Option<Location>> {
    match payload {
        Value::Null => Ok(None),
        Value::Object(_) => {
            let raw: RawLocation = parse_record(payload, "location")?;
            Ok(Some(normalizers::location(raw)))
        }
        other => Err(ContentError::validation(format!(
            "expected a location object or null, got {}",
            json_type(&other)
        ))),
    }
}

fn parse_list<T: DeserializeOwned>(payload: Value, content_type: &str) -> Result<Vec<T>> {
    let Value::Array(records) = payload else {
        return Err(ContentError::validation(format!(
            "expected an array of {content_type}, got {}",
            json_type(&payload)
        )));
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| parse_record(record, &format!("{content_type}[{index}]")))
        .collect()
}

fn parse_record<T: DeserializeOwned>(record: Value, context: &str) -> Result<T> {
    serde_json::from_value(record)
        .map_err(|e| ContentError::validation(format!("{context}: {e}")))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
