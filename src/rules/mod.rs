//! Compliance rule pack
//!
//! Holds the fixed set of compliance rules (R1–R5). Rules are loaded once
//! at construction and live for the repository's lifetime; removal is an
//! explicit administrative operation used for resilience testing. The
//! repository is constructed and injected, never ambient global state.

pub mod retriever;

pub use retriever::{Embedder, HttpEmbedder, HttpEmbedderConfig, RetrievedRule, RuleRetriever};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// One named compliance requirement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Stable short code ("R1".."R5")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Descriptive text, used for both display and retrieval scoring
    pub content: String,
}

impl Rule {
    fn new(id: &str, title: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    /// Title and content joined the way retrieval scores and citations
    /// present the rule
    pub fn full_text(&self) -> String {
        format!("{}: {}", self.title, self.content)
    }
}

/// Repository of active compliance rules
///
/// Iteration order is deterministic (ascending rule id). Cloning shares the
/// underlying rule set, so a removal through any handle is visible to all.
#[derive(Clone)]
pub struct RuleRepository {
    rules: Arc<RwLock<BTreeMap<String, Rule>>>,
}

impl Default for RuleRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRepository {
    /// Create a repository holding the standard GSA rules pack (R1–R5)
    pub fn new() -> Self {
        let mut rules = BTreeMap::new();
        for rule in Self::default_pack() {
            rules.insert(rule.id.clone(), rule);
        }
        Self {
            rules: Arc::new(RwLock::new(rules)),
        }
    }

    /// Create an empty repository (no rules)
    pub fn empty() -> Self {
        Self {
            rules: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    fn default_pack() -> Vec<Rule> {
        vec![
            Rule::new(
                "R1",
                "Identity & Registry",
                "Required: UEI (12 chars), DUNS (9 digits), and active SAM.gov registration.\n\
                 Primary contact must have valid email and phone.",
            ),
            Rule::new(
                "R2",
                "NAICS & SIN Mapping",
                "NAICS to SIN mapping (subset for test):\n\
                 541511 \u{2192} 54151S\n\
                 541512 \u{2192} 54151S\n\
                 541611 \u{2192} 541611\n\
                 518210 \u{2192} 518210C",
            ),
            Rule::new(
                "R3",
                "Past Performance",
                "At least 1 past performance \u{2265} $25,000 within last 36 months.\n\
                 Must include customer name, value, period, and contact email.",
            ),
            Rule::new(
                "R4",
                "Pricing & Catalog",
                "Provide labor categories and rates in a structured sheet.\n\
                 If missing rate basis or units, flag \"pricing_incomplete\".",
            ),
            Rule::new(
                "R5",
                "Submission Hygiene",
                "All personally identifiable info must be stored in redacted form;\n\
                 only derived fields and hashes are stored by default.",
            ),
        ]
    }

    /// Get a rule by id, if still active
    pub fn get(&self, id: &str) -> Option<Rule> {
        self.read().get(id).cloned()
    }

    /// Whether a rule id is still in the active set
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// All active rules, ascending by id
    pub fn all(&self) -> Vec<Rule> {
        self.read().values().cloned().collect()
    }

    /// Active rule ids, ascending
    pub fn ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of active rules
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the repository has no active rules
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove a rule from the active set (administrative fault-injection
    /// lever). Subsequent retrieval and checklist evaluation skip it.
    /// Returns the removed rule, if it was present.
    pub fn remove(&self, id: &str) -> Option<Rule> {
        let removed = self
            .rules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id);
        if let Some(rule) = &removed {
            tracing::info!(rule_id = %rule.id, "Rule removed from active set");
        }
        removed
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Rule>> {
        self.rules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
