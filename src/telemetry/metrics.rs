//! Prometheus metrics for the generation pipeline
//!
//! Raw counters only; every derived rate is recomputed from the raw
//! counters at snapshot time, never stored redundantly. Counters are
//! monotonically non-decreasing for the process lifetime.

use prometheus::{Counter, CounterVec, Opts, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Average remote latency above this many seconds costs health points
const LATENCY_CEILING_SECS: f64 = 10.0;

/// Pipeline metrics registry
pub struct MetricsRegistry {
    registry: Arc<Registry>,

    /// Remote generation attempts (by backend)
    requests_total: CounterVec,

    /// Successful remote generations (by backend)
    successes_total: CounterVec,

    /// Failed remote generations (by backend)
    failures_total: CounterVec,

    /// Template fallback generations
    template_fallbacks_total: Counter,

    /// Cache hits / misses
    cache_hits_total: Counter,
    cache_misses_total: Counter,

    /// Cumulative generation latency in seconds (cache hits excluded)
    response_time_seconds_total: Counter,
}

impl MetricsRegistry {
    /// Create a new registry with all pipeline metrics registered
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let requests_total = CounterVec::new(
            Opts::new(
                "generation_requests_total",
                "Total remote generation attempts",
            )
            .namespace("submission_review"),
            &["backend"],
        )?;

        let successes_total = CounterVec::new(
            Opts::new(
                "generation_successes_total",
                "Total successful remote generations",
            )
            .namespace("submission_review"),
            &["backend"],
        )?;

        let failures_total = CounterVec::new(
            Opts::new(
                "generation_failures_total",
                "Total failed remote generations",
            )
            .namespace("submission_review"),
            &["backend"],
        )?;

        let template_fallbacks_total = Counter::new(
            "submission_review_template_fallbacks_total",
            "Total generations served by the template fallback",
        )?;

        let cache_hits_total = Counter::new(
            "submission_review_cache_hits_total",
            "Total generation cache hits",
        )?;

        let cache_misses_total = Counter::new(
            "submission_review_cache_misses_total",
            "Total generation cache misses",
        )?;

        let response_time_seconds_total = Counter::new(
            "submission_review_response_time_seconds_total",
            "Cumulative generation latency in seconds",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(successes_total.clone()))?;
        registry.register(Box::new(failures_total.clone()))?;
        registry.register(Box::new(template_fallbacks_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(cache_misses_total.clone()))?;
        registry.register(Box::new(response_time_seconds_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            successes_total,
            failures_total,
            template_fallbacks_total,
            cache_hits_total,
            cache_misses_total,
            response_time_seconds_total,
        })
    }

    /// Record a remote generation attempt
    pub fn record_request(&self, backend: &str) {
        self.requests_total.with_label_values(&[backend]).inc();
    }

    /// Record a successful remote generation
    pub fn record_success(&self, backend: &str) {
        self.successes_total.with_label_values(&[backend]).inc();
    }

    /// Record a failed remote generation
    pub fn record_failure(&self, backend: &str) {
        self.failures_total.with_label_values(&[backend]).inc();
    }

    /// Record a template fallback
    pub fn record_template_fallback(&self) {
        self.template_fallbacks_total.inc();
    }

    /// Record a cache hit
    pub fn record_cache_hit(&self) {
        self.cache_hits_total.inc();
    }

    /// Record a cache miss
    pub fn record_cache_miss(&self) {
        self.cache_misses_total.inc();
    }

    /// Add one generation's latency to the cumulative sum
    pub fn add_response_time(&self, elapsed: Duration) {
        self.response_time_seconds_total.inc_by(elapsed.as_secs_f64());
    }

    /// Per-backend raw counts
    pub fn backend_stats(&self, backend: &str) -> BackendStats {
        let requests = self.requests_total.with_label_values(&[backend]).get();
        let successes = self.successes_total.with_label_values(&[backend]).get();
        let failures = self.failures_total.with_label_values(&[backend]).get();
        BackendStats {
            requests: requests as u64,
            successes: successes as u64,
            failures: failures as u64,
            success_rate: if requests > 0.0 { successes / requests } else { 0.0 },
        }
    }

    /// Snapshot of raw counters with the derived rates recomputed
    pub fn snapshot(&self, backend_names: &[&str]) -> MetricsSnapshot {
        let backends: BTreeMap<String, BackendStats> = backend_names
            .iter()
            .map(|name| (name.to_string(), self.backend_stats(name)))
            .collect();

        let total_requests: u64 = backends.values().map(|s| s.requests).sum();
        let total_successes: u64 = backends.values().map(|s| s.successes).sum();
        let total_time = self.response_time_seconds_total.get();
        let hits = self.cache_hits_total.get() as u64;
        let misses = self.cache_misses_total.get() as u64;

        MetricsSnapshot {
            backends,
            template_fallbacks: self.template_fallbacks_total.get() as u64,
            total_remote_requests: total_requests,
            average_response_time_secs: if total_requests > 0 {
                total_time / total_requests as f64
            } else {
                0.0
            },
            overall_success_rate: if total_requests > 0 {
                total_successes as f64 / total_requests as f64
            } else {
                0.0
            },
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }

    /// Encode all metrics in Prometheus text format for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::ReviewError::InternalError(e.to_string()))
    }

    /// Get the underlying Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }
}

/// Raw and derived counts for one backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStats {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub backends: BTreeMap<String, BackendStats>,
    pub template_fallbacks: u64,
    pub total_remote_requests: u64,
    pub average_response_time_secs: f64,
    pub overall_success_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
}

/// Health classification buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Derived system health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Score in [0, 10]
    pub score: f64,

    /// Bucketed status
    pub status: HealthStatus,

    /// One entry per deduction applied
    pub issues: Vec<String>,
}

impl SystemHealth {
    /// Derive health from a metrics snapshot and backend configuration.
    ///
    /// Start at 10, deduct for missing backends, low success rate, and
    /// high latency; clamp at 0 and bucket.
    pub fn derive(
        snapshot: &MetricsSnapshot,
        premium_configured: bool,
        secondary_configured: bool,
    ) -> Self {
        let mut score: f64 = 10.0;
        let mut issues = Vec::new();

        if !premium_configured && !secondary_configured {
            score -= 5.0;
            issues.push("No AI providers available".to_string());
        } else if !premium_configured {
            score -= 2.0;
            issues.push("Primary AI provider (OpenAI) unavailable".to_string());
        }

        if snapshot.overall_success_rate < 0.9 {
            score -= 2.0;
            issues.push(format!(
                "Low success rate: {:.1}%",
                snapshot.overall_success_rate * 100.0
            ));
        }

        if snapshot.average_response_time_secs > LATENCY_CEILING_SECS {
            score -= 1.0;
            issues.push(format!(
                "High average response time: {:.1}s",
                snapshot.average_response_time_secs
            ));
        }

        let score = score.max(0.0);
        let status = if score >= 8.0 {
            HealthStatus::Healthy
        } else if score >= 5.0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        };

        Self {
            score,
            status,
            issues,
        }
    }
}
