//! Telemetry for the review agent
//!
//! Process-lifetime counters for the generation pipeline plus the derived
//! system health score. Counters are Prometheus primitives, safe under
//! concurrent access; derived rates are always recomputed from the raw
//! counters at read time.

pub mod metrics;

pub use metrics::{
    BackendStats, HealthStatus, MetricsRegistry, MetricsSnapshot, SystemHealth,
};
