//! Checklist engine
//!
//! Evaluates a fact sheet against every rule still present in the active
//! set, producing one verdict per rule plus the citations whose retrieval
//! agreed with the rule under evaluation. Evaluation is deterministic:
//! identical facts and identical active rule set produce identical entries
//! and citations.

pub mod checks;

use serde::{Deserialize, Serialize};

use crate::facts::FactSheet;
use crate::rules::{RuleRepository, RuleRetriever};
use checks::{
    CodeMappingCheck, ComplianceCheck, IdentityCheck, PastPerformanceCheck, PricingCheck,
};

/// Verdict for one rule against one fact sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    /// Rule id
    pub rule_id: String,

    /// Human description of the requirement
    pub description: String,

    /// Whether the requirement is satisfied
    pub required_ok: bool,

    /// Problem codes, drawn from the rule's closed vocabulary
    #[serde(default)]
    pub problems: Vec<String>,

    /// Evidence lines, in the order the checks ran
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// A rule's descriptive text attached to a checklist run because retrieval
/// ranked that rule first for its canonical query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Rule id
    pub rule_id: String,

    /// Cited text snippet
    pub chunk: String,

    /// Relevance score in [0, 1]
    pub relevance_score: f64,
}

/// Evaluates the active rule set against fact sheets
pub struct ChecklistEngine {
    repository: RuleRepository,
    retriever: RuleRetriever,
    checks: Vec<Box<dyn ComplianceCheck>>,
}

impl ChecklistEngine {
    /// Create an engine with the standard checks
    pub fn new(
        repository: RuleRepository,
        retriever: RuleRetriever,
        min_contract_value: f64,
    ) -> Self {
        let checks: Vec<Box<dyn ComplianceCheck>> = vec![
            Box::new(IdentityCheck),
            Box::new(CodeMappingCheck),
            Box::new(PastPerformanceCheck::new(min_contract_value)),
            Box::new(PricingCheck),
        ];
        Self {
            repository,
            retriever,
            checks,
        }
    }

    /// Evaluate every active rule against the fact sheet.
    ///
    /// Rules removed from the repository are skipped entirely: no entry, no
    /// citation. A citation is attached only when the retriever's top
    /// result for the rule's canonical query is the rule itself; with the
    /// keyword fallback this can legitimately omit citations for rules
    /// whose canonical phrases share keywords.
    pub async fn evaluate(&self, facts: &FactSheet) -> (Vec<ChecklistEntry>, Vec<Citation>) {
        let mut entries = Vec::new();
        let mut citations = Vec::new();

        for check in &self.checks {
            let rule_id = check.rule_id();
            if !self.repository.contains(rule_id) {
                continue;
            }

            let ranked = self.retriever.retrieve(check.canonical_query(), 1).await;
            if let Some(top) = ranked.first() {
                if top.rule_id == rule_id {
                    citations.push(Citation {
                        rule_id: top.rule_id.clone(),
                        chunk: top.text.clone(),
                        relevance_score: top.score,
                    });
                }
            }

            let outcome = check.evaluate(facts);
            entries.push(ChecklistEntry {
                rule_id: rule_id.to_string(),
                description: check.description().to_string(),
                required_ok: outcome.problems.is_empty(),
                problems: outcome.problems,
                evidence: outcome.evidence,
            });
        }

        (entries, citations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{CompanyProfile, ContactInfo, ContractValue, PastPerformance, PricingItem};

    fn engine() -> ChecklistEngine {
        let repo = RuleRepository::new();
        let retriever = RuleRetriever::new(repo.clone());
        ChecklistEngine::new(repo, retriever, 25_000.0)
    }

    fn compliant_facts() -> FactSheet {
        FactSheet {
            company_profile: CompanyProfile {
                company_name: Some("Acme Federal LLC".to_string()),
                uei: Some("ABC123DEF456".to_string()),
                duns: Some("123456789".to_string()),
                sam_status: Some("registered".to_string()),
                naics: vec!["541511".to_string()],
                contact: ContactInfo {
                    name: Some("Jordan Smith".to_string()),
                    email: Some("jordan@acmefederal.com".to_string()),
                    phone: Some("(555) 123-4567".to_string()),
                },
            },
            past_performance: vec![PastPerformance {
                customer: Some("City of Austin".to_string()),
                contract: Some("IT modernization".to_string()),
                value: Some(ContractValue::Amount(125_000.0)),
                period: Some("2022-2024".to_string()),
                contact_email: Some("cio@austintexas.gov".to_string()),
                source_document: Some("pp_austin.txt".to_string()),
            }],
            pricing: vec![PricingItem {
                category: Some("Senior Developer".to_string()),
                rate: Some("185".to_string()),
                unit: Some("hour".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_compliant_factsheet_all_pass() {
        let (entries, citations) = engine().evaluate(&compliant_facts()).await;
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.required_ok));
        assert_eq!(entries.iter().map(|e| e.problems.len()).sum::<usize>(), 0);
        // Every canonical query ranks its own rule first under keyword
        // fallback, so all four rules are cited
        assert_eq!(citations.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_factsheet_fails_everything() {
        let (entries, _) = engine().evaluate(&FactSheet::default()).await;
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| !e.required_ok));
    }

    #[tokio::test]
    async fn test_evaluation_is_deterministic() {
        let engine = engine();
        let facts = compliant_facts();
        let (entries1, citations1) = engine.evaluate(&facts).await;
        let (entries2, citations2) = engine.evaluate(&facts).await;
        assert_eq!(entries1, entries2);
        assert_eq!(citations1, citations2);
    }

    #[tokio::test]
    async fn test_removed_rule_skipped() {
        let repo = RuleRepository::new();
        let retriever = RuleRetriever::new(repo.clone());
        let engine = ChecklistEngine::new(repo.clone(), retriever, 25_000.0);

        repo.remove("R1");
        let (entries, citations) = engine.evaluate(&compliant_facts()).await;
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.rule_id != "R1"));
        assert!(citations.iter().all(|c| c.rule_id != "R1"));
    }

    #[tokio::test]
    async fn test_mixed_factsheet_scenario() {
        // 11-char UEI, valid DUNS, active status, both contacts, one
        // below-threshold contract, one pricing item missing its unit,
        // no codes
        let facts = FactSheet {
            company_profile: CompanyProfile {
                company_name: Some("Acme Federal LLC".to_string()),
                uei: Some("ABC123DEF45".to_string()),
                duns: Some("123456789".to_string()),
                sam_status: Some("active".to_string()),
                naics: vec![],
                contact: ContactInfo {
                    name: None,
                    email: Some("jordan@acmefederal.com".to_string()),
                    phone: Some("(555) 123-4567".to_string()),
                },
            },
            past_performance: vec![PastPerformance {
                customer: Some("City of Austin".to_string()),
                contract: Some("Helpdesk".to_string()),
                value: Some(ContractValue::Amount(18_000.0)),
                period: Some("2023".to_string()),
                contact_email: None,
                source_document: Some("pp.txt".to_string()),
            }],
            pricing: vec![PricingItem {
                category: Some("Senior Developer".to_string()),
                rate: Some("185".to_string()),
                unit: Some("".to_string()),
            }],
        };

        let (entries, _) = engine().evaluate(&facts).await;
        assert_eq!(entries.len(), 4);

        let by_id = |id: &str| entries.iter().find(|e| e.rule_id == id).unwrap();
        assert_eq!(by_id("R1").problems, vec!["missing_uei"]);
        assert_eq!(by_id("R2").problems, vec!["missing_naics"]);
        assert_eq!(by_id("R3").problems, vec!["past_performance_min_value_not_met"]);
        assert_eq!(by_id("R4").problems, vec!["pricing_incomplete"]);
    }
}
