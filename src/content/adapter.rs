//! # Content Adapter
//!
//! The storefront's single entry point for CMS content. Every read is
//! answered with data: live content when the content service is healthy, the
//! static fallback dataset otherwise.
//!
//! ```text
//! list_*  ──▶ RevalidatingCache ──miss──▶ CircuitBreaker ──▶ with_timeout(fetch) ──▶ schema
//!                    ▲                         │ open / failure
//!                    └──── Fresh only ─────────┴──────────▶ FallbackDataset (Degraded)
//! ```
//!
//! Without a configured content source every read returns the fallback
//! dataset directly, bypassing the cache, breakers and timeouts.

use super::fallback::FallbackDataset;
use super::health::{BreakerHealth, HealthReport, ProbeResult};
use super::publish::{PublishAuthenticator, PublishError, PublishEvent, PublishOutcome};
use super::schema;
use super::source::{ContentQuery, ContentSource};
use super::types::{Category, Location, MenuItem};
use crate::cache::{Fetched, RevalidatingCache};
use crate::config::{AdapterConfig, CmsSettings};
use crate::constants::{cache_keys, cache_tags, service_keys};
use crate::error::{ContentError, Result};
use crate::logging::{log_content_operation, log_error};
use crate::resilience::{with_timeout, CircuitBreaker, CircuitBreakerRegistry, CircuitState};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Where a read was answered from, as reported in logs
const SOURCE_LIVE: &str = "cms";
const SOURCE_FALLBACK: &str = "fallback";
const SOURCE_UNCONFIGURED: &str = "fallback_unconfigured";

/// One of the cached list reads
struct ListRead<T> {
    operation: &'static str,
    service_key: &'static str,
    cache_key: &'static str,
    tag: &'static str,
    query: ContentQuery,
    parse: fn(Value) -> Result<Vec<T>>,
    fallback: fn(&FallbackDataset) -> Vec<T>,
}

pub struct ContentAdapter {
    config: AdapterConfig,
    source: Option<Arc<dyn ContentSource>>,
    registry: Arc<CircuitBreakerRegistry>,
    publish: PublishAuthenticator,
    categories: RevalidatingCache<Vec<Category>>,
    locations: RevalidatingCache<Vec<Location>>,
    items: RevalidatingCache<Vec<MenuItem>>,
}

impl fmt::Debug for ContentAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAdapter")
            .field("configured", &self.is_configured())
            .field("brand_name", &self.config.cms.brand_name)
            .field("registry", &self.registry)
            .field("publish", &self.publish)
            .finish()
    }
}

impl ContentAdapter {
    /// Adapter reading through `source`
    pub fn new(config: AdapterConfig, source: Arc<dyn ContentSource>) -> Self {
        Self::build(config, Some(source))
    }

    /// Adapter in configuration-absent mode: every read is answered from the
    /// fallback dataset
    pub fn unconfigured(config: AdapterConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a source with `factory` when the CMS settings are complete,
    /// otherwise run unconfigured
    pub fn from_config<F>(config: AdapterConfig, factory: F) -> Self
    where
        F: FnOnce(&CmsSettings) -> Arc<dyn ContentSource>,
    {
        if config.cms.is_configured() {
            let source = factory(&config.cms);
            Self::new(config, source)
        } else {
            warn!("Content service not configured - serving static fallback content");
            Self::unconfigured(config)
        }
    }

    /// Replace the breaker registry, e.g. with one carrying a state-change hook
    pub fn with_registry(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    fn build(config: AdapterConfig, source: Option<Arc<dyn ContentSource>>) -> Self {
        let revalidate = config.cache.revalidate();
        let registry = Arc::new(CircuitBreakerRegistry::new(config.circuit_breakers.clone()));
        let publish = PublishAuthenticator::from_config(&config.publish);

        let adapter = Self {
            source,
            registry,
            publish,
            categories: RevalidatingCache::new(cache_keys::CATEGORIES, revalidate),
            locations: RevalidatingCache::new(cache_keys::LOCATIONS, revalidate),
            items: RevalidatingCache::new(cache_keys::ITEMS, revalidate),
            config,
        };

        info!(
            brand_name = %adapter.config.cms.brand_name,
            configured = adapter.is_configured(),
            revalidate_seconds = revalidate.as_secs(),
            per_call_timeout_ms = adapter.per_call_timeout().as_millis() as u64,
            breakers_enabled = adapter.config.circuit_breakers.enabled,
            "✅ Content adapter initialized"
        );
        adapter
    }

    pub async fn list_categories(&self) -> Vec<Category> {
        self.read_list(
            &self.categories,
            ListRead {
                operation: "list_categories",
                service_key: service_keys::CATEGORIES,
                cache_key: cache_keys::CATEGORIES,
                tag: cache_tags::CATEGORIES,
                query: ContentQuery::Categories,
                parse: schema::parse_categories,
                fallback: FallbackDataset::categories,
            },
        )
        .await
    }

    pub async fn list_locations(&self) -> Vec<Location> {
        self.read_list(
            &self.locations,
            ListRead {
                operation: "list_locations",
                service_key: service_keys::LOCATIONS,
                cache_key: cache_keys::LOCATIONS,
                tag: cache_tags::LOCATIONS,
                query: ContentQuery::Locations,
                parse: schema::parse_locations,
                fallback: FallbackDataset::locations,
            },
        )
        .await
    }

    pub async fn list_items(&self) -> Vec<MenuItem> {
        self.read_list(
            &self.items,
            ListRead {
                operation: "list_items",
                service_key: service_keys::ITEMS,
                cache_key: cache_keys::ITEMS,
                tag: cache_tags::ITEMS,
                query: ContentQuery::Items,
                parse: schema::parse_items,
                fallback: FallbackDataset::items,
            },
        )
        .await
    }

    /// Point lookup, uncached, guarded by the locations breaker.
    ///
    /// `None` from a healthy content service means the slug does not exist;
    /// on failure the fallback locations are searched instead.
    pub async fn get_location_by_slug(&self, slug: &str) -> Option<Location> {
        let operation = "get_location_by_slug";
        let fallback_slug = slug.to_string();
        let fallback = move || FallbackDataset::get().location_by_slug(&fallback_slug);

        let Some(source) = &self.source else {
            let location = fallback();
            log_content_operation(
                operation,
                service_keys::LOCATIONS,
                SOURCE_UNCONFIGURED,
                location.record_count(),
                None,
            );
            return location;
        };

        guarded_fetch(
            operation,
            service_keys::LOCATIONS,
            Arc::clone(source),
            self.breaker(service_keys::LOCATIONS),
            self.per_call_timeout(),
            ContentQuery::LocationBySlug(slug.to_string()),
            schema::parse_location,
            fallback,
        )
        .await
        .into_value()
    }

    /// Items in one menu category
    pub async fn items_by_category(&self, category_slug: &str) -> Vec<MenuItem> {
        self.list_items()
            .await
            .into_iter()
            .filter(|item| item.category_slug == category_slug)
            .collect()
    }

    /// Items offered at a location; `"all"` returns every item
    pub async fn items_for_location(&self, location_slug: &str) -> Vec<MenuItem> {
        self.list_items()
            .await
            .into_iter()
            .filter(|item| item.is_available_at(location_slug))
            .collect()
    }

    /// Drop cached content carrying `tag`. Returns the number of entries
    /// removed.
    pub fn invalidate(&self, tag: &str) -> usize {
        let removed =
            self.categories.invalidate(tag) + self.locations.invalidate(tag) + self.items.invalidate(tag);
        info!(tag = tag, removed = removed, "Content cache invalidated");
        removed
    }

    /// Authenticate a publish notification and invalidate the content it
    /// covers
    pub fn handle_publish(&self, secret: &str, event: &PublishEvent) -> std::result::Result<PublishOutcome, PublishError> {
        self.publish.verify(secret)?;

        let tag = event.cache_tag();
        let removed = self.invalidate(tag);
        info!(
            document_type = event.document_type.as_deref().unwrap_or("unknown"),
            tag = tag,
            removed = removed,
            "📣 Publish notification handled"
        );
        Ok(PublishOutcome { tag, removed })
    }

    pub fn circuit_state(&self, service_key: &str) -> CircuitState {
        self.registry.state(service_key)
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    pub fn brand_name(&self) -> &str {
        &self.config.cms.brand_name
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.registry
    }

    /// Probe the content service and report breaker states.
    ///
    /// The probe is bounded by the per-call timeout but bypasses the breakers,
    /// so it reports real connectivity even while a circuit is open.
    pub async fn health(&self) -> HealthReport {
        // Content types not read yet have no breaker and report Closed
        let mut keys: BTreeSet<String> = self.registry.list_components().into_iter().collect();
        if self.source.is_some() && self.config.circuit_breakers.enabled {
            keys.extend(service_keys::ALL.iter().map(|key| key.to_string()));
        }

        let breakers: BTreeMap<String, BreakerHealth> = keys
            .into_iter()
            .map(|key| {
                let health = match self.registry.component_record(&key) {
                    Some(record) => BreakerHealth {
                        state: record.state,
                        failures: record.consecutive_failures,
                    },
                    None => BreakerHealth {
                        state: CircuitState::Closed,
                        failures: 0,
                    },
                };
                (key, health)
            })
            .collect();

        let probe = match &self.source {
            Some(source) => Some(self.probe(&**source).await),
            None => None,
        };

        let report = HealthReport::evaluate(probe, breakers);
        debug!(status = ?report.status, "Content health evaluated");
        report
    }

    async fn probe(&self, source: &dyn ContentSource) -> ProbeResult {
        let started = Instant::now();
        let result = fetch_payload(source, &ContentQuery::HealthProbe, self.per_call_timeout()).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(_) => ProbeResult::up(latency_ms),
            Err(error) => ProbeResult::down(latency_ms, error.to_string()),
        }
    }

    fn per_call_timeout(&self) -> Duration {
        self.config.timeouts.per_call_timeout()
    }

    fn breaker(&self, service_key: &str) -> Option<Arc<CircuitBreaker>> {
        self.config
            .circuit_breakers
            .enabled
            .then(|| self.registry.get(service_key))
    }

    async fn read_list<T>(&self, cache: &RevalidatingCache<Vec<T>>, read: ListRead<T>) -> Vec<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let fallback = read.fallback;

        let Some(source) = &self.source else {
            let records = fallback(FallbackDataset::get());
            log_content_operation(
                read.operation,
                read.service_key,
                SOURCE_UNCONFIGURED,
                records.len(),
                None,
            );
            return records;
        };

        let source = Arc::clone(source);
        let breaker = self.breaker(read.service_key);
        let limit = self.per_call_timeout();
        let (operation, service_key, query, parse) =
            (read.operation, read.service_key, read.query, read.parse);

        let fetcher = move || {
            guarded_fetch(
                operation,
                service_key,
                source,
                breaker,
                limit,
                query,
                parse,
                move || fallback(FallbackDataset::get()),
            )
        };

        match cache
            .get(read.cache_key, &[read.tag, cache_tags::ALL], fetcher)
            .await
        {
            Ok(records) => records,
            Err(error) => {
                log_error(
                    "content_adapter",
                    read.operation,
                    &error.to_string(),
                    Some(read.cache_key),
                );
                fallback(FallbackDataset::get())
            }
        }
    }
}

/// Something a read returns, counted for logs
trait RecordCount {
    fn record_count(&self) -> usize;
}

impl<T> RecordCount for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

impl<T> RecordCount for Option<T> {
    fn record_count(&self) -> usize {
        usize::from(self.is_some())
    }
}

async fn fetch_payload(source: &dyn ContentSource, query: &ContentQuery, limit: Duration) -> Result<Value> {
    with_timeout(source.fetch(query), limit).await?
}

/// Timed, validated fetch behind an optional breaker. Live data comes back
/// `Fresh`; every failure path comes back `Degraded` with fallback data.
#[allow(clippy::too_many_arguments)]
async fn guarded_fetch<T, F>(
    operation: &'static str,
    service_key: &'static str,
    source: Arc<dyn ContentSource>,
    breaker: Option<Arc<CircuitBreaker>>,
    limit: Duration,
    query: ContentQuery,
    parse: fn(Value) -> Result<T>,
    fallback: F,
) -> Fetched<T>
where
    T: RecordCount,
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let (source, query) = (&*source, &query);
    let primary = move || async move {
        fetch_payload(source, query, limit)
            .await
            .and_then(parse)
            .map(Fetched::Fresh)
    };

    let fetched = match breaker {
        Some(breaker) => {
            breaker
                .execute_classified(
                    primary,
                    || Fetched::Degraded(fallback()),
                    ContentError::is_breaker_failure,
                )
                .await
        }
        None => match primary().await {
            Ok(fetched) => fetched,
            Err(error) => {
                warn!(
                    service_key = service_key,
                    error = %error,
                    error_kind = error.kind(),
                    "Content read failed, returning fallback"
                );
                Fetched::Degraded(fallback())
            }
        },
    };

    let (label, count) = match &fetched {
        Fetched::Fresh(value) => (SOURCE_LIVE, value.record_count()),
        Fetched::Degraded(value) => (SOURCE_FALLBACK, value.record_count()),
    };
    log_content_operation(
        operation,
        service_key,
        label,
        count,
        Some(started.elapsed().as_millis() as u64),
    );
    fetched
}
