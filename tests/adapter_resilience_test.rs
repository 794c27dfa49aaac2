//! Integration tests for the content adapter's resilience chain

mod common;

use common::{sample_locations, MockBehavior, MockContentSource};
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use storefront_content::config::AdapterConfig;
use storefront_content::content::{HealthStatus, ProbeStatus, PublishError};
use storefront_content::resilience::{CircuitBreakerRegistry, CircuitTransition, StateChangeHook};
use storefront_content::{
    CircuitState, ContentAdapter, ContentError, FallbackDataset, PublishEvent,
};
use tokio::time::Instant;

fn adapter_with(source: Arc<MockContentSource>) -> ContentAdapter {
    ContentAdapter::new(AdapterConfig::default(), source)
}

#[tokio::test]
async fn test_breaker_stops_fetching_after_five_failures() {
    let source = MockContentSource::new();
    source.fail("categories");
    let adapter = adapter_with(source.clone());
    let fallback = FallbackDataset::get().categories();

    for call in 1..=5 {
        assert_eq!(adapter.list_categories().await, fallback);
        assert_eq!(source.calls("categories"), call);
    }
    assert_eq!(adapter.circuit_state("categories"), CircuitState::Open);

    for _ in 0..10 {
        assert_eq!(adapter.list_categories().await, fallback);
    }
    assert_eq!(source.calls("categories"), 5);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_recovery_needs_two_successes() {
    let source = MockContentSource::healthy();
    source.fail("location_by_slug");
    let adapter = adapter_with(source.clone());

    for _ in 0..5 {
        assert!(adapter.get_location_by_slug("humble").await.is_some());
    }
    assert_eq!(adapter.circuit_state("locations"), CircuitState::Open);

    source.respond("location_by_slug", sample_locations()[0].clone());

    // Still cooling down
    tokio::time::advance(Duration::from_millis(29_999)).await;
    let location = adapter.get_location_by_slug("conroe").await;
    assert!(location.is_none(), "conroe is not in the fallback dataset");
    assert_eq!(source.calls("location_by_slug"), 5);

    tokio::time::advance(Duration::from_millis(1)).await;
    let location = adapter.get_location_by_slug("conroe").await.unwrap();
    assert_eq!(location.id, "loc-conroe");
    assert_eq!(adapter.circuit_state("locations"), CircuitState::HalfOpen);

    adapter.get_location_by_slug("conroe").await.unwrap();
    assert_eq!(adapter.circuit_state("locations"), CircuitState::Closed);

    let record = adapter.registry().get("locations").record();
    assert_eq!(record.consecutive_failures, 0);
    assert_eq!(record.consecutive_successes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_failure_restarts_cooldown() {
    let source = MockContentSource::healthy();
    source.fail("location_by_slug");
    let adapter = adapter_with(source.clone());

    for _ in 0..5 {
        adapter.get_location_by_slug("humble").await;
    }
    tokio::time::advance(Duration::from_secs(30)).await;

    adapter.get_location_by_slug("humble").await;
    assert_eq!(adapter.circuit_state("locations"), CircuitState::Open);
    assert_eq!(source.calls("location_by_slug"), 6);

    tokio::time::advance(Duration::from_secs(29)).await;
    adapter.get_location_by_slug("humble").await;
    assert_eq!(source.calls("location_by_slug"), 6);

    tokio::time::advance(Duration::from_secs(1)).await;
    adapter.get_location_by_slug("humble").await;
    assert_eq!(source.calls("location_by_slug"), 7);
}

#[tokio::test]
async fn test_breakers_are_independent() {
    let source = MockContentSource::healthy();
    source.fail("items");
    let adapter = adapter_with(source.clone());

    for _ in 0..6 {
        adapter.list_items().await;
    }

    assert_eq!(adapter.circuit_state("items"), CircuitState::Open);
    assert_eq!(adapter.circuit_state("categories"), CircuitState::Closed);
    assert_eq!(adapter.circuit_state("locations"), CircuitState::Closed);

    let categories = adapter.list_categories().await;
    assert_eq!(categories[0].slug, "gumbo");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_failure() {
    let source = MockContentSource::healthy();
    source.set("categories", MockBehavior::Hang);
    let adapter = adapter_with(source.clone());

    let started = Instant::now();
    let categories = adapter.list_categories().await;
    let waited = started.elapsed();

    assert_eq!(categories, FallbackDataset::get().categories());
    assert!(waited >= Duration::from_secs(10), "waited {waited:?}");
    assert!(waited < Duration::from_secs(11), "waited {waited:?}");
    assert_eq!(
        adapter.registry().get("categories").record().consecutive_failures,
        1
    );
}

#[tokio::test]
async fn test_invalid_payload_counts_as_failure() {
    let source = MockContentSource::healthy();
    source.respond("items", json!({"items": []}));
    let adapter = adapter_with(source.clone());

    assert_eq!(adapter.list_items().await, FallbackDataset::get().items());
    assert_eq!(adapter.registry().get("items").record().consecutive_failures, 1);

    source.respond("items", json!([{"_id": "x", "name": "No slug"}]));
    assert_eq!(adapter.list_items().await, FallbackDataset::get().items());
    assert_eq!(adapter.registry().get("items").record().consecutive_failures, 2);
}

#[tokio::test]
async fn test_not_configured_error_is_not_counted() {
    let source = MockContentSource::healthy();
    source.set("categories", MockBehavior::Fail(ContentError::NotConfigured));
    let adapter = adapter_with(source.clone());

    for _ in 0..7 {
        assert_eq!(adapter.list_categories().await, FallbackDataset::get().categories());
    }
    assert_eq!(source.calls("categories"), 7);
    assert_eq!(adapter.circuit_state("categories"), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_share_one_fetch() {
    let source = MockContentSource::healthy();
    source.set(
        "categories",
        MockBehavior::Delayed(Duration::from_millis(100), common::sample_categories()),
    );
    let adapter = adapter_with(source.clone());

    let results = join_all((0..20).map(|_| adapter.list_categories())).await;

    assert_eq!(source.calls("categories"), 1);
    assert_eq!(results.len(), 20);
    assert!(results.iter().all(|categories| *categories == results[0]));
    assert_eq!(results[0][1].title, "Platters");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_share_one_fetch_across_threads() {
    let source = MockContentSource::healthy();
    source.set(
        "categories",
        MockBehavior::Delayed(Duration::from_millis(100), common::sample_categories()),
    );
    let adapter = Arc::new(adapter_with(source.clone()));

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.list_categories().await })
        })
        .collect();
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(source.calls("categories"), 1);
    assert!(results.iter().all(|categories| categories.len() == 2));
    assert_eq!(adapter.circuit_state("categories"), CircuitState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_open_breaker_once() {
    let transitions: Arc<Mutex<Vec<CircuitTransition>>> = Arc::default();
    let recorded = Arc::clone(&transitions);
    let hook: StateChangeHook = Arc::new(move |transition: &CircuitTransition| {
        recorded.lock().push(transition.clone())
    });

    let config = AdapterConfig::default();
    let registry = CircuitBreakerRegistry::new(config.circuit_breakers.clone()).with_state_change_hook(hook);
    let source = MockContentSource::healthy();
    source.fail("locations");
    let adapter = Arc::new(ContentAdapter::new(config, source.clone()).with_registry(Arc::new(registry)));

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.get_location_by_slug(&format!("store-{i}")).await })
        })
        .collect();
    for task in join_all(tasks).await {
        assert_eq!(task.unwrap(), None);
    }

    let metrics = adapter.registry().component_metrics("locations").unwrap();
    assert_eq!(adapter.circuit_state("locations"), CircuitState::Open);
    assert_eq!(metrics.total_calls as usize, source.calls("location_by_slug"));
    assert_eq!(metrics.total_calls + metrics.short_circuited_count, 32);
    assert_eq!(transitions.lock().len(), 1);
}

#[tokio::test]
async fn test_breakers_created_on_first_use() {
    let source = MockContentSource::healthy();
    let adapter = adapter_with(source.clone());
    assert!(adapter.registry().list_components().is_empty());

    assert_eq!(adapter.circuit_state("items"), CircuitState::Closed);
    assert_eq!(adapter.circuit_state("made-up-key"), CircuitState::Closed);
    assert!(adapter.registry().list_components().is_empty());

    let report = adapter.health().await;
    assert_eq!(
        report.circuit_breakers.keys().cloned().collect::<Vec<_>>(),
        vec!["categories", "items", "locations"]
    );
    assert!(report.circuit_breakers.values().all(|b| b.state == CircuitState::Closed));
    assert!(adapter.registry().list_components().is_empty());

    adapter.list_items().await;
    assert_eq!(adapter.registry().list_components(), vec!["items".to_string()]);
}

#[tokio::test]
async fn test_state_lookup_with_breakers_disabled_leaves_registry_empty() {
    let mut config = AdapterConfig::default();
    config.circuit_breakers.enabled = false;
    let adapter = ContentAdapter::new(config, MockContentSource::healthy());

    assert_eq!(adapter.circuit_state("items"), CircuitState::Closed);
    assert_eq!(adapter.circuit_state("made-up-key"), CircuitState::Closed);
    assert!(adapter.registry().list_components().is_empty());
    assert!(adapter.health().await.circuit_breakers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_revalidation_boundary() {
    let source = MockContentSource::healthy();
    let adapter = adapter_with(source.clone());

    adapter.list_items().await;
    assert_eq!(source.calls("items"), 1);

    tokio::time::advance(Duration::from_secs(60)).await;
    adapter.list_items().await;
    assert_eq!(source.calls("items"), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    adapter.list_items().await;
    assert_eq!(source.calls("items"), 2);

    adapter.list_items().await;
    assert_eq!(source.calls("items"), 2);
}

#[tokio::test]
async fn test_fallback_is_never_cached() {
    let source = MockContentSource::healthy();
    source.fail("items");
    let adapter = adapter_with(source.clone());

    adapter.list_items().await;
    adapter.list_items().await;
    assert_eq!(source.calls("items"), 2);

    source.respond("items", common::sample_items());
    let live = adapter.list_items().await;
    assert_eq!(live.len(), 2);
    assert_eq!(live[0].slug, "seafood-gumbo");

    adapter.list_items().await;
    assert_eq!(source.calls("items"), 3);
}

#[tokio::test]
async fn test_configuration_absent_mode_skips_network_path() {
    let adapter = ContentAdapter::unconfigured(AdapterConfig::default());
    let dataset = FallbackDataset::get();

    assert!(!adapter.is_configured());
    assert_eq!(adapter.list_categories().await, dataset.categories());
    assert_eq!(adapter.list_locations().await, dataset.locations());
    assert_eq!(adapter.list_items().await, dataset.items());
    assert_eq!(adapter.get_location_by_slug("willowbrook").await, dataset.location_by_slug("willowbrook"));
    assert_eq!(adapter.get_location_by_slug("conroe").await, None);

    assert!(adapter.registry().list_components().is_empty());

    let report = adapter.health().await;
    assert_eq!(report.status, HealthStatus::Degraded);
    assert!(report.probe.is_none());
}

#[tokio::test]
async fn test_point_query_not_found_versus_fallback() {
    let source = MockContentSource::healthy();
    let adapter = adapter_with(source.clone());

    let conroe = adapter.get_location_by_slug("conroe").await.unwrap();
    assert_eq!(
        conroe.ordering_urls.order.as_deref(),
        Some("https://order.thecatchusa.com/conroe")
    );
    assert!(conroe.open_today);

    source.respond("location_by_slug", Value::Null);
    assert_eq!(adapter.get_location_by_slug("humble").await, None);

    source.fail("location_by_slug");
    let humble = adapter.get_location_by_slug("humble").await.unwrap();
    assert_eq!(humble.id, "demo-humble");
    assert_eq!(adapter.get_location_by_slug("tyler").await, None);

    // Point queries do not touch the list cache
    assert_eq!(source.calls("locations"), 0);
}

#[tokio::test]
async fn test_locations_are_normalized() {
    let adapter = adapter_with(MockContentSource::healthy());
    let locations = adapter.list_locations().await;

    let tyler = locations.iter().find(|l| l.slug == "tyler").unwrap();
    assert_eq!(tyler.address_line1, "");
    assert!(!tyler.open_today);
    assert_eq!(tyler.hero_image, "/images/Location-Humble.jpg");
    assert!(tyler.geo.is_some());
    assert_eq!(tyler.ordering_urls.order, None);
}

#[tokio::test]
async fn test_menu_helpers_filter_items() {
    let adapter = adapter_with(MockContentSource::healthy());

    let platters = adapter.items_by_category("platters").await;
    assert_eq!(platters.len(), 1);
    assert_eq!(platters[0].effective_price("conroe"), Some(15.99));
    assert_eq!(platters[0].effective_price("all"), Some(16.99));

    assert_eq!(adapter.items_for_location("conroe").await.len(), 2);
    assert_eq!(adapter.items_for_location("all").await.len(), 2);

    let tyler = adapter.items_for_location("tyler").await;
    assert_eq!(tyler.len(), 1);
    assert_eq!(tyler[0].slug, "seafood-gumbo");
}

#[tokio::test]
async fn test_publish_invalidates_matching_tag() {
    let mut config = AdapterConfig::default();
    config.publish.webhook_secret = Some("hook-secret".to_string());
    let source = MockContentSource::healthy();
    let adapter = ContentAdapter::new(config, source.clone());

    adapter.list_items().await;
    adapter.list_categories().await;

    let rejected = adapter.handle_publish("wrong", &PublishEvent::for_type("menuItem"));
    assert_eq!(rejected, Err(PublishError::InvalidSecret));

    let outcome = adapter
        .handle_publish("hook-secret", &PublishEvent::for_type("menuItem"))
        .unwrap();
    assert_eq!(outcome.tag, "items");
    assert_eq!(outcome.removed, 1);

    adapter.list_items().await;
    adapter.list_categories().await;
    assert_eq!(source.calls("items"), 2);
    assert_eq!(source.calls("categories"), 1);

    let outcome = adapter
        .handle_publish("hook-secret", &PublishEvent::default())
        .unwrap();
    assert_eq!(outcome.tag, "content");
    assert_eq!(outcome.removed, 2);
}

#[tokio::test]
async fn test_health_reflects_probe_and_breakers() {
    let source = MockContentSource::healthy();
    let adapter = adapter_with(source.clone());

    let report = adapter.health().await;
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(
        report.circuit_breakers.keys().cloned().collect::<Vec<_>>(),
        vec!["categories", "items", "locations"]
    );

    source.fail("items");
    for _ in 0..5 {
        adapter.list_items().await;
    }
    let report = adapter.health().await;
    assert_eq!(report.status, HealthStatus::Degraded);
    assert_eq!(report.circuit_breakers["items"].state, CircuitState::Open);
    assert_eq!(report.circuit_breakers["items"].failures, 5);

    source.fail("health_probe");
    let report = adapter.health().await;
    assert_eq!(report.status, HealthStatus::Unhealthy);
    let probe = report.probe.unwrap();
    assert_eq!(probe.status, ProbeStatus::Down);
    assert!(probe.error.unwrap().contains("503"));
}

#[tokio::test]
async fn test_state_change_hook_sees_every_transition() {
    let transitions: Arc<Mutex<Vec<CircuitTransition>>> = Arc::default();
    let recorded = Arc::clone(&transitions);
    let hook: StateChangeHook = Arc::new(move |transition: &CircuitTransition| {
        recorded.lock().push(transition.clone())
    });

    let config = AdapterConfig::default();
    let registry = CircuitBreakerRegistry::new(config.circuit_breakers.clone()).with_state_change_hook(hook);
    let source = MockContentSource::healthy();
    source.fail("categories");
    let adapter = ContentAdapter::new(config, source.clone()).with_registry(Arc::new(registry));

    for _ in 0..5 {
        adapter.list_categories().await;
    }
    adapter.registry().get("categories").force_closed();

    let seen: Vec<(CircuitState, CircuitState)> =
        transitions.lock().iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        seen,
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::Closed),
        ]
    );
    assert!(transitions.lock().iter().all(|t| t.service_key == "categories"));
}

#[tokio::test]
async fn test_disabled_breakers_keep_fetching() {
    let mut config = AdapterConfig::default();
    config.circuit_breakers.enabled = false;
    let source = MockContentSource::healthy();
    source.fail("categories");
    let adapter = ContentAdapter::new(config, source.clone());

    for _ in 0..10 {
        assert_eq!(adapter.list_categories().await, FallbackDataset::get().categories());
    }
    assert_eq!(source.calls("categories"), 10);
}
