//! Submission Review Agent
//!
//! Evaluates vendor submission fact sheets against a fixed compliance rule
//! pack and produces two derivative artifacts (a negotiation brief and a
//! client email) through a resilient multi-backend generation pipeline.
//!
//! ## Features
//!
//! - **Rule pack**: fixed identity/registry, code-mapping, past-performance,
//!   pricing, and hygiene rules with administrative removal for resilience
//!   testing
//! - **Checklist engine**: deterministic, evidence-bearing pass/fail
//!   verdicts with problem codes drawn from a closed per-rule vocabulary
//! - **Rule retrieval**: semantic scoring against precomputed rule
//!   embeddings when an embedding backend is configured, keyword-table
//!   fallback otherwise; citations attach only when retrieval agrees with
//!   the rule under evaluation
//! - **Provider chain**: cache, premium backend, high-throughput backend,
//!   then a deterministic template generator that cannot fail — the caller
//!   always receives usable text
//! - **Admission control**: independent per-backend sliding-window rate
//!   limiting
//! - **Caching**: TTL-bounded memoization with bulk oldest-first eviction
//! - **Telemetry**: Prometheus counters, derived rates recomputed on read,
//!   and a bucketed system health score with live backend probes
//!
//! ## Architecture
//!
//! 1. **Rules** (`rules/`): the rule repository and the retriever with its
//!    embedding and keyword scoring paths.
//! 2. **Engine** (`engine/`): per-rule predicates and the checklist
//!    engine that runs them against a fact sheet.
//! 3. **Pipeline** (`pipeline/`): the provider chain with its cache, rate
//!    limiter, remote chat backends, template fallback, and quality scorer.
//! 4. **Telemetry** (`telemetry/`): metrics registry and derived health.
//! 5. **Service** (`service.rs`): the facade the surrounding application
//!    consumes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use submission_review::{ArtifactKind, FactSheet, ReviewService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ReviewService::new(ServiceConfig::from_env()).unwrap();
//!
//!     let facts: FactSheet = serde_json::from_str(r#"{
//!         "company_profile": {
//!             "company_name": "Acme Federal LLC",
//!             "uei": "ABC123DEF456",
//!             "duns": "123456789",
//!             "sam_status": "registered",
//!             "naics": ["541511"],
//!             "contact": {"email": "poc@acme.example", "phone": "(555) 123-4567"}
//!         }
//!     }"#).unwrap();
//!
//!     let (checklist, citations) = service.generate_checklist(&facts).await;
//!     let brief = service
//!         .generate_artifact(ArtifactKind::Brief, &facts, &checklist)
//!         .await;
//!
//!     println!("{} (backend: {})", brief.content, brief.metadata.backend);
//!     println!("{} citations", citations.len());
//! }
//! ```

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod facts;
pub mod pipeline;
pub mod rules;
pub mod service;
pub mod telemetry;

// Re-export the primary API surface
pub use config::{BackendConfig, ServiceConfig, ServiceConfigBuilder};
pub use engine::{ChecklistEngine, ChecklistEntry, Citation};
pub use error::{ReviewError, Result};
pub use facts::{
    CompanyProfile, ContactInfo, ContractValue, FactSheet, PastPerformance, PricingItem,
};
pub use pipeline::{
    quality_score, ArtifactKind, GeneratedArtifact, GenerationBackend, GenerationCache,
    GenerationMetadata, GenerationPipeline, RateLimiter, RemoteChatBackend, TemplateBackend,
};
pub use rules::{
    Embedder, HttpEmbedder, HttpEmbedderConfig, RetrievedRule, Rule, RuleRepository,
    RuleRetriever,
};
pub use service::{AnalysisReport, BackendProbe, HealthReport, ReviewService};
pub use telemetry::{
    BackendStats, HealthStatus, MetricsRegistry, MetricsSnapshot, SystemHealth,
};

/// Agent version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Agent identifier
pub const AGENT_ID: &str = "submission-review-agent";
