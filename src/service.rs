//! Review service facade
//!
//! Owns the rule repository, checklist engine, and generation pipeline,
//! and exposes the operations the surrounding application consumes:
//! checklist evaluation, artifact generation, a combined analysis call
//! that generates both artifacts concurrently, metrics, health, and rule
//! removal for operational fault injection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::engine::{ChecklistEngine, ChecklistEntry, Citation};
use crate::error::Result;
use crate::facts::FactSheet;
use crate::pipeline::{
    ArtifactKind, GeneratedArtifact, GenerationBackend, GenerationMetadata, GenerationPipeline,
};
use crate::rules::{Embedder, Rule, RuleRepository, RuleRetriever};
use crate::telemetry::{MetricsRegistry, MetricsSnapshot, SystemHealth};

/// Combined result of one analysis call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Request identifier
    pub request_id: Uuid,

    /// Checklist entries, one per active evaluable rule
    pub checklist: Vec<ChecklistEntry>,

    /// Citations whose retrieval agreed with the rule under evaluation
    pub citations: Vec<Citation>,

    /// Negotiation prep brief
    pub brief: String,

    /// Metadata for the brief generation
    pub brief_metadata: GenerationMetadata,

    /// Client-facing email
    pub client_email: String,

    /// Metadata for the email generation
    pub email_metadata: GenerationMetadata,

    /// "compliant" when every checklist entry passes
    pub compliance_status: String,

    /// End-to-end processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Probe outcome for one remote backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendProbe {
    /// Backend name
    pub backend: String,

    /// Whether the probe succeeded
    pub healthy: bool,

    /// Observed probe latency, when healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    /// Failure detail, when unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health status with per-backend detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Report time
    pub timestamp: DateTime<Utc>,

    /// Derived system health (score, bucket, issues)
    pub system_health: SystemHealth,

    /// Live probe results for each configured remote backend
    pub backends: Vec<BackendProbe>,
}

/// The review service
pub struct ReviewService {
    repository: RuleRepository,
    retriever: RuleRetriever,
    engine: ChecklistEngine,
    pipeline: GenerationPipeline,
    metrics: Arc<MetricsRegistry>,
}

impl ReviewService {
    /// Build a service with keyword-based rule retrieval
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let repository = RuleRepository::new();
        let retriever = RuleRetriever::new(repository.clone());
        Self::assemble(config, repository, retriever)
    }

    /// Build a service backed by a semantic embedding backend; degrades to
    /// keyword retrieval if precomputing rule embeddings fails
    pub async fn with_embedder(
        config: ServiceConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let repository = RuleRepository::new();
        let retriever = RuleRetriever::with_embedder(repository.clone(), embedder).await;
        Self::assemble(config, repository, retriever)
    }

    fn assemble(
        config: ServiceConfig,
        repository: RuleRepository,
        retriever: RuleRetriever,
    ) -> Result<Self> {
        let metrics = Arc::new(MetricsRegistry::new()?);
        let engine = ChecklistEngine::new(
            repository.clone(),
            retriever.clone(),
            config.min_contract_value,
        );
        let pipeline = GenerationPipeline::new(&config, Arc::clone(&metrics));

        tracing::info!(
            premium = pipeline.premium_configured(),
            high_throughput = pipeline.secondary_configured(),
            rules = repository.len(),
            "Review service initialized"
        );

        Ok(Self {
            repository,
            retriever,
            engine,
            pipeline,
            metrics,
        })
    }

    /// The active rule repository
    pub fn repository(&self) -> &RuleRepository {
        &self.repository
    }

    /// The rule retriever, reusable for ad hoc relevance queries
    pub fn retriever(&self) -> &RuleRetriever {
        &self.retriever
    }

    /// Evaluate the checklist for a fact sheet
    pub async fn generate_checklist(
        &self,
        facts: &FactSheet,
    ) -> (Vec<ChecklistEntry>, Vec<Citation>) {
        self.engine.evaluate(facts).await
    }

    /// Generate one artifact through the provider chain
    pub async fn generate_artifact(
        &self,
        kind: ArtifactKind,
        facts: &FactSheet,
        checklist: &[ChecklistEntry],
    ) -> GeneratedArtifact {
        self.pipeline.generate(kind, facts, checklist).await
    }

    /// Full analysis: checklist plus both artifacts. The two generation
    /// calls run concurrently; they share only the task-safe cache, rate
    /// limiter, and metrics registry.
    pub async fn analyze(&self, facts: &FactSheet) -> AnalysisReport {
        let start = Instant::now();
        let request_id = Uuid::new_v4();

        let (checklist, citations) = self.engine.evaluate(facts).await;

        let (brief, email) = tokio::join!(
            self.pipeline.generate(ArtifactKind::Brief, facts, &checklist),
            self.pipeline.generate(ArtifactKind::Email, facts, &checklist),
        );

        let compliant = checklist.iter().all(|entry| entry.required_ok);
        let report = AnalysisReport {
            request_id,
            compliance_status: if compliant { "compliant" } else { "non_compliant" }.to_string(),
            brief: brief.content,
            brief_metadata: brief.metadata,
            client_email: email.content,
            email_metadata: email.metadata,
            checklist,
            citations,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            request_id = %report.request_id,
            rules_checked = report.checklist.len(),
            brief_backend = %report.brief_metadata.backend,
            email_backend = %report.email_metadata.backend,
            status = %report.compliance_status,
            "Analysis complete"
        );
        report
    }

    /// Remove a rule from the active set (operational fault injection)
    pub fn remove_rule(&self, id: &str) -> Option<Rule> {
        self.repository.remove(id)
    }

    /// Point-in-time metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(&[
            GenerationPipeline::PREMIUM,
            GenerationPipeline::HIGH_THROUGHPUT,
        ])
    }

    /// Prometheus text exposition of the raw counters
    pub fn metrics_text(&self) -> Result<String> {
        self.metrics.encode_text()
    }

    /// Health status: derived score plus a live probe of each configured
    /// remote backend (5s timeout per probe; a timeout is an unhealthy
    /// probe, not an error)
    pub async fn health(&self) -> HealthReport {
        let mut backends = Vec::new();
        for remote in self.pipeline.remotes() {
            let probe = match remote.probe().await {
                Ok(latency) => BackendProbe {
                    backend: remote.name().to_string(),
                    healthy: true,
                    latency_ms: Some(latency.as_millis() as u64),
                    error: None,
                },
                Err(e) => BackendProbe {
                    backend: remote.name().to_string(),
                    healthy: false,
                    latency_ms: None,
                    error: Some(e.to_string()),
                },
            };
            backends.push(probe);
        }

        HealthReport {
            timestamp: Utc::now(),
            system_health: SystemHealth::derive(
                &self.metrics(),
                self.pipeline.premium_configured(),
                self.pipeline.secondary_configured(),
            ),
            backends,
        }
    }
}
