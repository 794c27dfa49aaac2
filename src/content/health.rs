//! # Content Health
//!
//! Point-in-time view of the content dependency for monitoring and load
//! balancers: a connectivity probe plus the state of every content breaker.

use crate::resilience::CircuitState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Probe up, every breaker closed or recovering
    Healthy,
    /// Serving fallback for at least one content type
    Degraded,
    /// Content service unreachable
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Up,
    Down,
}

/// Result of the connectivity probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn up(latency_ms: u64) -> Self {
        Self {
            status: ProbeStatus::Up,
            latency_ms,
            error: None,
        }
    }

    pub fn down(latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Down,
            latency_ms,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerHealth {
    pub state: CircuitState,
    pub failures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    /// `None` when no content source is configured
    pub probe: Option<ProbeResult>,
    pub circuit_breakers: BTreeMap<String, BreakerHealth>,
}

impl HealthReport {
    pub fn evaluate(
        probe: Option<ProbeResult>,
        circuit_breakers: BTreeMap<String, BreakerHealth>,
    ) -> Self {
        let any_open = circuit_breakers
            .values()
            .any(|breaker| breaker.state == CircuitState::Open);

        let status = match &probe {
            Some(result) if result.status == ProbeStatus::Down => HealthStatus::Unhealthy,
            Some(_) if !any_open => HealthStatus::Healthy,
            // Up with an open breaker, or no source at all
            _ => HealthStatus::Degraded,
        };

        Self {
            status,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
            probe,
            circuit_breakers,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// 200 when healthy, 503 otherwise
    pub fn http_status(&self) -> u16 {
        if self.is_healthy() {
            200
        } else {
            503
        }
    }
}
