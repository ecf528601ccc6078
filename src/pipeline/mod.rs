//! Generation pipeline
//!
//! Ordered chain of generation backends with fallback semantics: cache,
//! then the premium backend, then the high-throughput backend, then a
//! deterministic template generator that cannot fail. Backend failure,
//! timeout, and rate-limit denial are all ordinary control flow here: the
//! chain moves to its next stage and `generate` never returns an error to
//! its caller.
//!
//! Cache population and metrics updates happen before a result is
//! returned, so a subsequent call with the same key observes them. The
//! remote stages are the only blocking I/O; dropping the returned future
//! cancels an in-flight request.

pub mod backend;
pub mod cache;
pub mod limiter;
pub mod quality;
pub mod template;

pub use backend::{GenerationBackend, RemoteChatBackend};
pub use cache::GenerationCache;
pub use limiter::RateLimiter;
pub use quality::quality_score;
pub use template::TemplateBackend;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServiceConfig;
use crate::engine::ChecklistEntry;
use crate::facts::FactSheet;
use crate::telemetry::MetricsRegistry;

/// Which derivative artifact to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Negotiation prep brief
    Brief,
    /// Client-facing email
    Email,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Brief => "brief",
            ArtifactKind::Email => "email",
        }
    }
}

/// Metadata attached to every generated artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Backend that produced the content ("cache" for cache hits)
    pub backend: String,

    /// Qualitative tier of the producing chain stage; absent on cache hits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_tier: Option<String>,

    /// Deterministic heuristic score of the content, 0-10
    pub quality_score: f64,

    /// Wall-clock latency of this call in milliseconds
    pub response_time_ms: u64,

    /// Whether the content came from the cache
    pub cache_hit: bool,
}

/// A generated artifact plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub content: String,
    pub metadata: GenerationMetadata,
}

/// The provider chain
pub struct GenerationPipeline {
    remotes: Vec<Arc<RemoteChatBackend>>,
    template: TemplateBackend,
    cache: GenerationCache,
    limiter: RateLimiter,
    metrics: Arc<MetricsRegistry>,
    premium_configured: bool,
    secondary_configured: bool,
}

impl GenerationPipeline {
    /// Backend identity of the premium stage
    pub const PREMIUM: &'static str = "openai-gpt4";

    /// Backend identity of the high-throughput stage
    pub const HIGH_THROUGHPUT: &'static str = "groq-llama3";

    /// Assemble the chain from configuration. Unconfigured backends are
    /// skipped silently; the template stage is always present.
    pub fn new(config: &ServiceConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let mut remotes = Vec::new();

        let premium = RemoteChatBackend::from_config(Self::PREMIUM, "premium", &config.premium);
        let premium_configured = premium.is_some();
        if let Some(backend) = premium {
            tracing::info!(backend = Self::PREMIUM, "Premium generation backend configured");
            remotes.push(Arc::new(backend));
        }

        let secondary = RemoteChatBackend::from_config(
            Self::HIGH_THROUGHPUT,
            "high-speed",
            &config.high_throughput,
        );
        let secondary_configured = secondary.is_some();
        if let Some(backend) = secondary {
            tracing::info!(
                backend = Self::HIGH_THROUGHPUT,
                role = if premium_configured { "fallback" } else { "primary" },
                "High-throughput generation backend configured"
            );
            remotes.push(Arc::new(backend));
        }

        Self {
            remotes,
            template: TemplateBackend,
            cache: GenerationCache::new(
                config.cache_ttl,
                config.cache_capacity,
                config.cache_watermark,
            ),
            limiter: RateLimiter::new(),
            metrics,
            premium_configured,
            secondary_configured,
        }
    }

    /// Whether the premium backend is configured
    pub fn premium_configured(&self) -> bool {
        self.premium_configured
    }

    /// Whether the high-throughput backend is configured
    pub fn secondary_configured(&self) -> bool {
        self.secondary_configured
    }

    /// Configured remote backends, in chain order
    pub fn remotes(&self) -> &[Arc<RemoteChatBackend>] {
        &self.remotes
    }

    /// Generate an artifact. Never fails: the terminal template stage
    /// absorbs every upstream failure.
    pub async fn generate(
        &self,
        kind: ArtifactKind,
        facts: &FactSheet,
        checklist: &[ChecklistEntry],
    ) -> GeneratedArtifact {
        let start = Instant::now();
        let key = cache_key(facts, checklist, kind);

        if let Some(hit) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            tracing::debug!(key = %key, backend = %hit.backend, "Generation cache hit");
            let metadata = GenerationMetadata {
                backend: "cache".to_string(),
                quality_tier: None,
                quality_score: quality_score(&hit.content),
                response_time_ms: start.elapsed().as_millis() as u64,
                cache_hit: true,
            };
            return GeneratedArtifact {
                content: hit.content,
                metadata,
            };
        }
        self.metrics.record_cache_miss();

        for remote in &self.remotes {
            if !self.limiter.admit(remote.name(), remote.max_per_minute()) {
                continue;
            }

            self.metrics.record_request(remote.name());
            match remote.generate(kind, facts, checklist).await {
                Ok(content) => {
                    self.metrics.record_success(remote.name());
                    self.cache.put(&key, &content, remote.name());

                    let elapsed = start.elapsed();
                    self.metrics.add_response_time(elapsed);
                    let metadata = GenerationMetadata {
                        backend: remote.name().to_string(),
                        quality_tier: Some(remote.quality_tier().to_string()),
                        quality_score: quality_score(&content),
                        response_time_ms: elapsed.as_millis() as u64,
                        cache_hit: false,
                    };
                    tracing::info!(
                        kind = kind.as_str(),
                        backend = remote.name(),
                        response_time_ms = metadata.response_time_ms,
                        quality_score = metadata.quality_score,
                        "Artifact generated"
                    );
                    return GeneratedArtifact { content, metadata };
                }
                Err(e) => {
                    self.metrics.record_failure(remote.name());
                    tracing::warn!(
                        kind = kind.as_str(),
                        backend = remote.name(),
                        error = %e,
                        "Backend failed, trying next chain stage"
                    );
                }
            }
        }

        // Terminal stage: pure string composition, cannot fail
        self.metrics.record_template_fallback();
        let content = self.template.render(kind, facts, checklist);
        let elapsed = start.elapsed();
        self.metrics.add_response_time(elapsed);

        let metadata = GenerationMetadata {
            backend: TemplateBackend::NAME.to_string(),
            quality_tier: Some("reliable".to_string()),
            quality_score: quality_score(&content),
            response_time_ms: elapsed.as_millis() as u64,
            cache_hit: false,
        };
        tracing::info!(
            kind = kind.as_str(),
            backend = TemplateBackend::NAME,
            "Artifact generated by template fallback"
        );
        GeneratedArtifact { content, metadata }
    }
}

#[derive(Serialize)]
struct KeyMaterial<'a> {
    analysis: &'a FactSheet,
    checklist: Vec<KeyEntry<'a>>,
    kind: &'static str,
}

#[derive(Serialize)]
struct KeyEntry<'a> {
    rule_id: &'a str,
    required_ok: bool,
    problems: &'a [String],
}

/// Stable cache key over the facts, the checklist verdicts, and the
/// artifact kind
pub fn cache_key(facts: &FactSheet, checklist: &[ChecklistEntry], kind: ArtifactKind) -> String {
    let material = KeyMaterial {
        analysis: facts,
        checklist: checklist
            .iter()
            .map(|entry| KeyEntry {
                rule_id: &entry.rule_id,
                required_ok: entry.required_ok,
                problems: &entry.problems,
            })
            .collect(),
        kind: kind.as_str(),
    };

    let serialized =
        serde_json::to_vec(&material).unwrap_or_else(|_| kind.as_str().as_bytes().to_vec());
    let mut hasher = Sha256::new();
    hasher.update(&serialized);
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Compact context summary sent to remote backends instead of raw
/// documents: identity fields, pass/fail counts, and the problem codes of
/// failing entries. Bounds prompt size and keeps unredacted input out of
/// the prompt.
pub fn context_summary(facts: &FactSheet, checklist: &[ChecklistEntry]) -> String {
    let mut parts = Vec::new();

    let profile = &facts.company_profile;
    parts.push(format!(
        "Company: {}",
        profile.company_name.as_deref().unwrap_or("Unknown")
    ));
    if let Some(uei) = &profile.uei {
        parts.push(format!("UEI: {uei}"));
    }
    if !profile.naics.is_empty() {
        parts.push(format!("NAICS: {}", profile.naics.join(", ")));
    }

    let compliant = checklist.iter().filter(|e| e.required_ok).count();
    let non_compliant = checklist.len() - compliant;
    parts.push(format!("Compliant Requirements: {compliant}"));
    parts.push(format!("Non-Compliant Requirements: {non_compliant}"));

    let problems: Vec<String> = checklist
        .iter()
        .filter(|e| !e.required_ok)
        .flat_map(|e| {
            e.problems
                .iter()
                .map(move |p| format!("{p} (Rule {})", e.rule_id))
        })
        .collect();
    if !problems.is_empty() {
        parts.push(format!("Issues Found: {}", problems.join(", ")));
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::CompanyProfile;

    fn entry(rule_id: &str, ok: bool, problems: &[&str]) -> ChecklistEntry {
        ChecklistEntry {
            rule_id: rule_id.to_string(),
            description: format!("{rule_id} requirements"),
            required_ok: ok,
            problems: problems.iter().map(|p| p.to_string()).collect(),
            evidence: Vec::new(),
        }
    }

    #[test]
    fn test_cache_key_stability() {
        let facts = FactSheet::default();
        let checklist = vec![entry("R1", false, &["missing_uei"])];
        let k1 = cache_key(&facts, &checklist, ArtifactKind::Brief);
        let k2 = cache_key(&facts, &checklist, ArtifactKind::Brief);
        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 16);
    }

    #[test]
    fn test_cache_key_varies_by_kind_and_inputs() {
        let facts = FactSheet::default();
        let checklist = vec![entry("R1", false, &["missing_uei"])];

        let brief = cache_key(&facts, &checklist, ArtifactKind::Brief);
        let email = cache_key(&facts, &checklist, ArtifactKind::Email);
        assert_ne!(brief, email);

        let other_checklist = vec![entry("R1", true, &[])];
        assert_ne!(brief, cache_key(&facts, &other_checklist, ArtifactKind::Brief));

        let other_facts = FactSheet {
            company_profile: CompanyProfile {
                uei: Some("ABC123DEF456".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_ne!(brief, cache_key(&other_facts, &checklist, ArtifactKind::Brief));
    }

    #[test]
    fn test_cache_key_ignores_evidence() {
        let facts = FactSheet::default();
        let mut with_evidence = vec![entry("R1", false, &["missing_uei"])];
        with_evidence[0].evidence.push("UEI not found".to_string());
        let without = vec![entry("R1", false, &["missing_uei"])];

        assert_eq!(
            cache_key(&facts, &with_evidence, ArtifactKind::Brief),
            cache_key(&facts, &without, ArtifactKind::Brief)
        );
    }

    #[test]
    fn test_context_summary_bounds_content() {
        let facts = FactSheet {
            company_profile: CompanyProfile {
                company_name: Some("Acme Federal LLC".to_string()),
                uei: Some("ABC123DEF456".to_string()),
                naics: vec!["541511".to_string(), "518210".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let checklist = vec![
            entry("R1", true, &[]),
            entry("R4", false, &["pricing_incomplete"]),
        ];

        let summary = context_summary(&facts, &checklist);
        assert!(summary.contains("Company: Acme Federal LLC"));
        assert!(summary.contains("UEI: ABC123DEF456"));
        assert!(summary.contains("NAICS: 541511, 518210"));
        assert!(summary.contains("Compliant Requirements: 1"));
        assert!(summary.contains("Non-Compliant Requirements: 1"));
        assert!(summary.contains("pricing_incomplete (Rule R4)"));
    }

    #[test]
    fn test_context_summary_omits_contact_details() {
        let facts = FactSheet {
            company_profile: CompanyProfile {
                company_name: Some("Acme Federal LLC".to_string()),
                contact: crate::facts::ContactInfo {
                    name: Some("Jordan Smith".to_string()),
                    email: Some("jordan@acmefederal.com".to_string()),
                    phone: Some("(555) 123-4567".to_string()),
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let summary = context_summary(&facts, &[]);
        assert!(!summary.contains("jordan@acmefederal.com"));
        assert!(!summary.contains("555"));
    }
}
