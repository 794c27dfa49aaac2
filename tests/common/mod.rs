//! Shared test doubles for adapter integration tests

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront_content::{ContentError, ContentQuery, ContentSource};

/// How the mock answers one query kind
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond(Value),
    Fail(ContentError),
    /// Never settles within any realistic timeout
    Hang,
    /// Respond after a delay
    Delayed(Duration, Value),
}

/// Programmable content source that counts every fetch
#[derive(Debug, Default)]
pub struct MockContentSource {
    behaviors: Mutex<HashMap<&'static str, MockBehavior>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    total_calls: AtomicUsize,
}

impl MockContentSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve the sample payload for every list query
    pub fn healthy() -> Arc<Self> {
        let source = Self::new();
        source.respond("categories", sample_categories());
        source.respond("locations", Value::Array(sample_locations()));
        source.respond("items", sample_items());
        source.respond("location_by_slug", sample_locations()[0].clone());
        source.respond("health_probe", json!(2));
        source
    }

    pub fn set(&self, query: &'static str, behavior: MockBehavior) {
        self.behaviors.lock().insert(query, behavior);
    }

    pub fn respond(&self, query: &'static str, payload: Value) {
        self.set(query, MockBehavior::Respond(payload));
    }

    pub fn fail(&self, query: &'static str) {
        self.set(
            query,
            MockBehavior::Fail(ContentError::transient("503 Service Unavailable")),
        );
    }

    pub fn calls(&self, query: &'static str) -> usize {
        self.calls.lock().get(query).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for MockContentSource {
    async fn fetch(&self, query: &ContentQuery) -> Result<Value, ContentError> {
        let name = query.name();
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().entry(name).or_insert(0) += 1;

        let behavior = self
            .behaviors
            .lock()
            .get(name)
            .cloned()
            .unwrap_or_else(|| MockBehavior::Fail(ContentError::transient("no mock behavior")));

        match behavior {
            MockBehavior::Respond(payload) => Ok(payload),
            MockBehavior::Fail(error) => Err(error),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Value::Null)
            }
            MockBehavior::Delayed(delay, payload) => {
                tokio::time::sleep(delay).await;
                Ok(payload)
            }
        }
    }
}

pub fn sample_categories() -> Value {
    json!([
        {"slug": "gumbo", "title": "Gumbo & Soups", "position": 1},
        {"slug": "platters", "title": "Platters", "position": 2, "description": "Served with two sides"}
    ])
}

pub fn sample_locations() -> Vec<Value> {
    vec![
        json!({
            "_id": "loc-conroe",
            "name": "The Catch – Conroe",
            "slug": "conroe",
            "region": "houston",
            "addressLine1": "1420 N Loop 336 W",
            "city": "Conroe",
            "state": "TX",
            "postalCode": "77304",
            "hours": {"monday": "11am – 9pm"},
            "revelUrl": "https://order.thecatchusa.com/conroe"
        }),
        json!({
            "_id": "loc-tyler",
            "name": "The Catch – Tyler",
            "slug": "tyler",
            "region": "east-tx"
        }),
    ]
}

pub fn sample_items() -> Value {
    json!([
        {
            "_id": "item-gumbo",
            "name": "Seafood Gumbo",
            "slug": "seafood-gumbo",
            "categorySlug": "gumbo",
            "basePrice": 8.99,
            "availableEverywhere": true
        },
        {
            "_id": "item-platter",
            "name": "Fried Shrimp Platter",
            "slug": "fried-shrimp-platter",
            "categorySlug": "platters",
            "basePrice": 16.99,
            "badges": ["Fried"],
            "overrides": [{"loc": "conroe", "price": 15.99, "available": true}]
        }
    ])
}
