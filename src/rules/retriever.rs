//! Rule retrieval
//!
//! Ranks rules by relevance to a natural-language query. When a semantic
//! embedding backend is configured, rules are scored by cosine similarity
//! against precomputed embeddings of their descriptive text; otherwise (or
//! on any embedding failure) retrieval falls back to a fixed keyword table.
//! Either way the ordering is deterministic: score descending, rule id
//! ascending on ties.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ReviewError, Result};
use crate::rules::RuleRepository;

/// Nominal score assigned to rules with no keyword hits, so `top_k` is
/// always satisfiable while rules exist
const NOMINAL_SCORE: f64 = 0.1;

/// One ranked retrieval result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedRule {
    /// Rule id
    pub rule_id: String,

    /// The rule's full text (title + content)
    pub text: String,

    /// Relevance score in [0, 1]
    pub score: f64,
}

/// Embedding backend abstraction
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend identifier for logging
    fn name(&self) -> &str;

    /// Embed a single text into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Configuration for the HTTP embedding client
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Embeddings API base URL
    pub base_url: String,

    /// API key, sent as a bearer token
    pub api_key: String,

    /// Embedding model identifier
    pub model: String,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for an OpenAI-compatible embeddings endpoint
pub struct HttpEmbedder {
    client: Client,
    config: HttpEmbedderConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create a new embedder with the given configuration
    pub fn new(config: HttpEmbedderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        "http-embeddings"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request = EmbeddingRequest {
            input: vec![text],
            model: &self.config.model,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReviewError::EmbeddingError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviewError::EmbeddingError(format!(
                "Embedding request failed: {status}"
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ReviewError::EmbeddingError(format!("Malformed response: {e}")))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ReviewError::EmbeddingError("Empty embedding response".to_string()))
    }
}

/// Ranks active rules by relevance to a query
#[derive(Clone)]
pub struct RuleRetriever {
    repository: RuleRepository,
    embedder: Option<Arc<dyn Embedder>>,
    rule_embeddings: Arc<RwLock<HashMap<String, Vec<f32>>>>,
}

impl RuleRetriever {
    /// Create a retriever using keyword-table matching only
    pub fn new(repository: RuleRepository) -> Self {
        Self {
            repository,
            embedder: None,
            rule_embeddings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a retriever backed by a semantic embedding backend.
    ///
    /// Rule-text embeddings are precomputed here. If any rule fails to
    /// embed, the backend is abandoned and the retriever degrades to
    /// keyword matching.
    pub async fn with_embedder(repository: RuleRepository, embedder: Arc<dyn Embedder>) -> Self {
        let mut embeddings = HashMap::new();
        for rule in repository.all() {
            match embedder.embed(&rule.full_text()).await {
                Ok(vector) => {
                    embeddings.insert(rule.id.clone(), vector);
                }
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        backend = embedder.name(),
                        error = %e,
                        "Could not embed rule text, falling back to keyword retrieval"
                    );
                    return Self::new(repository);
                }
            }
        }

        tracing::info!(
            backend = embedder.name(),
            rules = embeddings.len(),
            "Rule embeddings precomputed"
        );

        Self {
            repository,
            embedder: Some(embedder),
            rule_embeddings: Arc::new(RwLock::new(embeddings)),
        }
    }

    /// Whether semantic scoring is active
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Retrieve the `top_k` most relevant active rules for a query.
    ///
    /// Removed rules are never returned, even if their embeddings are
    /// still cached.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedRule> {
        if let Some(embedder) = &self.embedder {
            match embedder.embed(query).await {
                Ok(query_vector) => return self.semantic_retrieval(&query_vector, top_k),
                Err(e) => {
                    tracing::warn!(
                        backend = embedder.name(),
                        error = %e,
                        "Query embedding failed, using keyword retrieval"
                    );
                }
            }
        }
        self.keyword_retrieval(query, top_k)
    }

    fn semantic_retrieval(&self, query_vector: &[f32], top_k: usize) -> Vec<RetrievedRule> {
        let embeddings = self
            .rule_embeddings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut scored: Vec<RetrievedRule> = self
            .repository
            .all()
            .into_iter()
            .filter_map(|rule| {
                let vector = embeddings.get(&rule.id)?;
                Some(RetrievedRule {
                    score: cosine_similarity(query_vector, vector),
                    text: rule.full_text(),
                    rule_id: rule.id,
                })
            })
            .collect();

        sort_ranked(&mut scored);
        scored.truncate(top_k);
        scored
    }

    /// Fixed keyword → rule table. Each keyword present in the lowercased
    /// query adds one hit to that rule's score.
    fn keyword_table() -> &'static [(&'static str, &'static str)] {
        &[
            ("uei", "R1"),
            ("duns", "R1"),
            ("sam", "R1"),
            ("contact", "R1"),
            ("email", "R1"),
            ("phone", "R1"),
            ("naics", "R2"),
            ("sin", "R2"),
            ("mapping", "R2"),
            ("performance", "R3"),
            ("past", "R3"),
            ("customer", "R3"),
            ("value", "R3"),
            ("25000", "R3"),
            ("pricing", "R4"),
            ("labor", "R4"),
            ("rate", "R4"),
            ("catalog", "R4"),
            ("pii", "R5"),
            ("redact", "R5"),
            ("personal", "R5"),
            ("identifiable", "R5"),
        ]
    }

    fn keyword_retrieval(&self, query: &str, top_k: usize) -> Vec<RetrievedRule> {
        let query_lower = query.to_lowercase();

        let mut hits: HashMap<&str, usize> = HashMap::new();
        for &(keyword, rule_id) in Self::keyword_table() {
            if query_lower.contains(keyword) {
                *hits.entry(rule_id).or_insert(0) += 1;
            }
        }

        let mut results: Vec<RetrievedRule> = Vec::new();
        let mut matched: Vec<RetrievedRule> = hits
            .iter()
            .filter_map(|(rule_id, count)| {
                let rule = self.repository.get(rule_id)?;
                Some(RetrievedRule {
                    rule_id: rule.id.clone(),
                    text: rule.full_text(),
                    score: *count as f64 / 10.0,
                })
            })
            .collect();
        sort_ranked(&mut matched);
        results.extend(matched);

        // Pad with non-matching rules at a nominal score so top_k is
        // always satisfiable while rules exist
        for rule in self.repository.all() {
            if results.len() >= top_k {
                break;
            }
            if results.iter().any(|r| r.rule_id == rule.id) {
                continue;
            }
            results.push(RetrievedRule {
                text: rule.full_text(),
                rule_id: rule.id,
                score: NOMINAL_SCORE,
            });
        }

        results.truncate(top_k);
        results
    }
}

fn sort_ranked(results: &mut [RetrievedRule]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

/// Cosine similarity with a zero-norm guard
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|y| (*y as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedder for tests: maps known substrings to axes
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn name(&self) -> &str {
            "stub"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            let axes = ["uei", "naics", "performance", "pricing", "redacted"];
            Ok(axes
                .iter()
                .map(|term| if lower.contains(term) { 1.0 } else { 0.0 })
                .collect())
        }
    }

    /// Embedder that always fails
    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        fn name(&self) -> &str {
            "broken"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ReviewError::EmbeddingError("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_keyword_retrieval_ranks_by_hits() {
        let retriever = RuleRetriever::new(RuleRepository::new());
        let results = retriever
            .retrieve("UEI DUNS SAM registration contact email phone", 3)
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].rule_id, "R1");
        assert_eq!(results[0].score, 0.6);
        // Padding entries carry the nominal score
        assert_eq!(results[1].score, NOMINAL_SCORE);
    }

    #[tokio::test]
    async fn test_keyword_retrieval_pads_to_top_k() {
        let retriever = RuleRetriever::new(RuleRepository::new());
        let results = retriever.retrieve("nothing relevant here", 5).await;
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.score == NOMINAL_SCORE));
        // Padding is id-ordered, hence deterministic
        let ids: Vec<_> = results.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "R3", "R4", "R5"]);
    }

    #[tokio::test]
    async fn test_removed_rule_never_returned() {
        let repo = RuleRepository::new();
        let retriever = RuleRetriever::new(repo.clone());
        repo.remove("R1");

        let results = retriever
            .retrieve("UEI DUNS SAM registration contact email phone", 5)
            .await;
        assert!(results.iter().all(|r| r.rule_id != "R1"));
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_semantic_retrieval_with_stub_embedder() {
        let retriever =
            RuleRetriever::with_embedder(RuleRepository::new(), Arc::new(StubEmbedder)).await;
        assert!(retriever.has_embedder());

        let results = retriever.retrieve("past performance history", 2).await;
        assert_eq!(results[0].rule_id, "R3");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_broken_embedder_degrades_to_keywords() {
        let retriever =
            RuleRetriever::with_embedder(RuleRepository::new(), Arc::new(BrokenEmbedder)).await;
        assert!(!retriever.has_embedder());

        let results = retriever.retrieve("NAICS SIN mapping", 1).await;
        assert_eq!(results[0].rule_id, "R2");
    }

    #[test]
    fn test_cosine_similarity() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
