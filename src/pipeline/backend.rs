//! Generation backends
//!
//! The remote backends speak an OpenAI-compatible chat completions API.
//! Every request carries an explicit timeout; timeouts, throttling, and
//! malformed responses all surface as recoverable errors so the provider
//! chain can fall through to its next stage.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::BackendConfig;
use crate::engine::ChecklistEntry;
use crate::error::{ReviewError, Result};
use crate::facts::FactSheet;
use crate::pipeline::{context_summary, ArtifactKind};

/// A generation backend: one stage of the provider chain
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend identifier reported in metadata ("openai-gpt4", ...)
    fn name(&self) -> &str;

    /// Qualitative tier label ("premium", "high-speed", "reliable")
    fn quality_tier(&self) -> &str;

    /// Generate an artifact from the fact sheet and checklist
    async fn generate(
        &self,
        kind: ArtifactKind,
        facts: &FactSheet,
        checklist: &[ChecklistEntry],
    ) -> Result<String>;

    /// Cheap liveness probe; returns observed latency
    async fn probe(&self) -> Result<Duration>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Remote chat-completions backend
pub struct RemoteChatBackend {
    name: String,
    tier: String,
    client: Client,
    config: BackendConfig,
}

impl RemoteChatBackend {
    /// Build a backend from its configuration. Returns `None` when the
    /// backend has no credentials: not an error, the chain simply skips it.
    pub fn from_config(name: &str, tier: &str, config: &BackendConfig) -> Option<Self> {
        config.api_key.as_ref()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Some(Self {
            name: name.to_string(),
            tier: tier.to_string(),
            client,
            config: config.clone(),
        })
    }

    /// Configured rate ceiling (requests per minute)
    pub fn max_per_minute(&self) -> usize {
        self.config.max_per_minute
    }

    fn system_prompt(kind: ArtifactKind) -> &'static str {
        match kind {
            ArtifactKind::Brief => "You are a GSA contracting specialist.",
            ArtifactKind::Email => "You are a professional GSA contracting officer.",
        }
    }

    fn user_prompt(kind: ArtifactKind, context: &str) -> String {
        match kind {
            ArtifactKind::Brief => format!(
                "You are a GSA contracting specialist preparing a negotiation brief.\n\n\
                 Based on the following analysis:\n{context}\n\n\
                 Generate a comprehensive negotiation prep brief (2-3 paragraphs) that:\n\
                 1. Summarizes the vendor's strengths and weaknesses\n\
                 2. Identifies key negotiation points and leverage areas\n\
                 3. Provides specific recommendations for pricing discussions\n\
                 4. Cites relevant GSA rules (R1-R5) where applicable\n\n\
                 Be professional, concise, and focus on actionable insights."
            ),
            ArtifactKind::Email => format!(
                "You are a GSA contracting officer writing to a vendor about their submission.\n\n\
                 Based on the following analysis:\n{context}\n\n\
                 Generate a professional, polite client email that:\n\
                 1. Thanks them for their submission\n\
                 2. Lists specific missing items or issues found\n\
                 3. Provides clear next steps and deadlines\n\
                 4. Maintains a collaborative tone\n\n\
                 Keep it concise and actionable."
            ),
        }
    }

    fn sampling(kind: ArtifactKind) -> (u32, f64) {
        match kind {
            ArtifactKind::Brief => (500, 0.7),
            ArtifactKind::Email => (400, 0.5),
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>, timeout: Duration) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ReviewError::unavailable(format!("{} has no API key", self.name)))?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ReviewError::backend(format!(
                "{} throttled upstream: {status}",
                self.name
            )));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ReviewError::backend(format!(
                "{} authentication failed: {status}",
                self.name
            )));
        }
        if !status.is_success() {
            return Err(ReviewError::backend(format!(
                "{} returned {status}",
                self.name
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReviewError::backend(format!("{} malformed response: {e}", self.name)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ReviewError::backend(format!(
                "{} returned empty content",
                self.name
            )));
        }
        Ok(content)
    }
}

#[async_trait]
impl GenerationBackend for RemoteChatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn quality_tier(&self) -> &str {
        &self.tier
    }

    async fn generate(
        &self,
        kind: ArtifactKind,
        facts: &FactSheet,
        checklist: &[ChecklistEntry],
    ) -> Result<String> {
        let context = context_summary(facts, checklist);
        let prompt = Self::user_prompt(kind, &context);
        let (max_tokens, temperature) = Self::sampling(kind);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_prompt(kind),
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        self.chat(&request, self.config.request_timeout).await
    }

    async fn probe(&self) -> Result<Duration> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: "Health check",
            }],
            max_tokens: 5,
            temperature: 0.0,
        };

        let start = Instant::now();
        self.chat(&request, self.config.probe_timeout).await?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    #[test]
    fn test_unconfigured_backend_is_skipped() {
        let config = ServiceConfig::default();
        assert!(RemoteChatBackend::from_config("openai-gpt4", "premium", &config.premium).is_none());
    }

    #[test]
    fn test_configured_backend_reports_identity() {
        let config = ServiceConfig::builder()
            .premium_api_key("sk-0123456789abcdefghij")
            .build();
        let backend =
            RemoteChatBackend::from_config("openai-gpt4", "premium", &config.premium).unwrap();
        assert_eq!(backend.name(), "openai-gpt4");
        assert_eq!(backend.quality_tier(), "premium");
        assert_eq!(backend.max_per_minute(), 50);
    }

    #[test]
    fn test_sampling_differs_per_kind() {
        assert_eq!(RemoteChatBackend::sampling(ArtifactKind::Brief), (500, 0.7));
        assert_eq!(RemoteChatBackend::sampling(ArtifactKind::Email), (400, 0.5));
    }
}
