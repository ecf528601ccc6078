//! Template generation
//!
//! The terminal chain stage: pure string composition from the fact sheet
//! and checklist. No I/O and no failure mode, which is what guarantees the
//! pipeline always returns usable text.

use async_trait::async_trait;
use std::time::Duration;

use crate::engine::ChecklistEntry;
use crate::error::Result;
use crate::facts::FactSheet;
use crate::pipeline::backend::GenerationBackend;
use crate::pipeline::ArtifactKind;

/// Deterministic template-based generator
pub struct TemplateBackend;

impl TemplateBackend {
    /// Backend name reported in metadata
    pub const NAME: &'static str = "expert-template";

    /// Compose an artifact. Infallible by construction; the provider chain
    /// relies on this as its terminal guarantee.
    pub fn render(
        &self,
        kind: ArtifactKind,
        facts: &FactSheet,
        checklist: &[ChecklistEntry],
    ) -> String {
        match kind {
            ArtifactKind::Brief => Self::brief(facts, checklist),
            ArtifactKind::Email => Self::email(facts, checklist),
        }
    }

    fn brief(facts: &FactSheet, checklist: &[ChecklistEntry]) -> String {
        let company_name = facts
            .company_profile
            .company_name
            .as_deref()
            .unwrap_or("The vendor");

        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        let mut negotiation_points: Vec<&str> = Vec::new();

        for entry in checklist {
            if entry.required_ok {
                strengths.push(format!("\u{2713} {} (Rule {})", entry.description, entry.rule_id));
            } else {
                weaknesses.push(format!(
                    "\u{2717} {} - {} (Rule {})",
                    entry.description,
                    entry.problems.join(", "),
                    entry.rule_id
                ));

                if entry.problems.iter().any(|p| p == "pricing_incomplete") {
                    negotiation_points
                        .push("Request detailed pricing breakdown with clear rate basis and units");
                }
                if entry
                    .problems
                    .iter()
                    .any(|p| p == "past_performance_min_value_not_met")
                {
                    negotiation_points
                        .push("Require additional past performance examples or accept higher risk");
                }
                if entry.problems.iter().any(|p| p.contains("missing")) {
                    negotiation_points.push("Obtain missing documentation before contract award");
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        negotiation_points.retain(|point| seen.insert(*point));

        let mut parts = Vec::new();

        // Overall assessment keyed on the pass/fail split
        if !strengths.is_empty() && !weaknesses.is_empty() {
            parts.push(format!(
                "**Overall Assessment**: {company_name} presents a mixed profile with both \
                 compliant and deficient areas. While they meet {} key requirements, there are \
                 {} areas requiring attention before contract award.",
                strengths.len(),
                weaknesses.len()
            ));
        } else if !strengths.is_empty() {
            parts.push(format!(
                "**Overall Assessment**: {company_name} demonstrates strong compliance across \
                 all reviewed areas, meeting {} key GSA requirements. This positions them as a \
                 low-risk vendor.",
                strengths.len()
            ));
        } else {
            parts.push(format!(
                "**Overall Assessment**: {company_name} has significant compliance gaps that \
                 must be addressed. High risk profile requiring substantial remediation before \
                 contract consideration."
            ));
        }

        // Findings: up to three strengths and three weaknesses
        let mut findings = String::from("**Key Findings**: ");
        if !strengths.is_empty() {
            findings.push_str(&format!(
                "Strengths include: {}. ",
                strengths.iter().take(3).cloned().collect::<Vec<_>>().join("; ")
            ));
        }
        if !weaknesses.is_empty() {
            findings.push_str(&format!(
                "Critical gaps: {}. ",
                weaknesses.iter().take(3).cloned().collect::<Vec<_>>().join("; ")
            ));
        }
        parts.push(findings);

        // Strategy keyed on the problem-code families present
        let weaknesses_text = weaknesses.join(" ").to_lowercase();
        let strategy = if !negotiation_points.is_empty() {
            let mut strategy = format!(
                "**Negotiation Strategy**: {}. ",
                negotiation_points.iter().take(3).copied().collect::<Vec<_>>().join(" ")
            );
            if weaknesses_text.contains("pricing") {
                strategy.push_str("Focus negotiations on pricing transparency and competitive rates. ");
            }
            if weaknesses_text.contains("performance") {
                strategy.push_str("Consider requiring performance guarantees or additional references. ");
            }
            strategy
        } else {
            "**Negotiation Strategy**: Vendor meets all requirements. Focus on competitive \
             pricing and favorable terms."
                .to_string()
        };
        parts.push(strategy);

        parts.join("\n\n")
    }

    fn email(facts: &FactSheet, checklist: &[ChecklistEntry]) -> String {
        let company_name = facts
            .company_profile
            .company_name
            .as_deref()
            .unwrap_or("your organization");

        let mut missing_items = Vec::new();
        for entry in checklist {
            if entry.required_ok {
                continue;
            }
            for problem in &entry.problems {
                let bullet = if problem.contains("missing") {
                    format!(
                        "\u{2022} {} (per GSA Rule {})",
                        title_case(&problem.replace('_', " ")),
                        entry.rule_id
                    )
                } else if problem.contains("incomplete") {
                    format!(
                        "\u{2022} Complete {} information (per GSA Rule {})",
                        title_case(&problem.replace("_incomplete", "").replace('_', " ")),
                        entry.rule_id
                    )
                } else if problem.contains("not_met") {
                    format!(
                        "\u{2022} Address {} requirements (per GSA Rule {})",
                        title_case(&problem.replace("_not_met", "").replace('_', " ")),
                        entry.rule_id
                    )
                } else {
                    format!(
                        "\u{2022} Resolve {} (per GSA Rule {})",
                        title_case(&problem.replace('_', " ")),
                        entry.rule_id
                    )
                };
                missing_items.push(bullet);
            }
        }

        if !missing_items.is_empty() {
            format!(
                "Subject: GSA Submission Review - Additional Information Required\n\n\
                 Dear {company_name} Team,\n\n\
                 Thank you for your recent GSA submission. Our review team has completed the \
                 initial analysis of your documentation.\n\n\
                 To proceed with your application, we need the following items to be addressed:\n\n\
                 {}\n\n\
                 Please provide the missing information within 10 business days. Once we receive \
                 these items, we will complete our review and provide next steps.\n\n\
                 We appreciate your interest in working with GSA and look forward to your \
                 response.\n\n\
                 Best regards,\n\
                 GSA Contracting Team",
                missing_items.join("\n")
            )
        } else {
            format!(
                "Subject: GSA Submission Review - Complete\n\n\
                 Dear {company_name} Team,\n\n\
                 Thank you for your GSA submission. Our review team has completed the analysis \
                 of your documentation.\n\n\
                 We are pleased to inform you that your submission meets all initial \
                 requirements. We will proceed with the next phase of the evaluation process \
                 and will contact you within 5 business days with further instructions.\n\n\
                 Thank you for your thoroughness in preparing your submission.\n\n\
                 Best regards,\n\
                 GSA Contracting Team"
            )
        }
    }
}

#[async_trait]
impl GenerationBackend for TemplateBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn quality_tier(&self) -> &str {
        "reliable"
    }

    async fn generate(
        &self,
        kind: ArtifactKind,
        facts: &FactSheet,
        checklist: &[ChecklistEntry],
    ) -> Result<String> {
        Ok(self.render(kind, facts, checklist))
    }

    async fn probe(&self) -> Result<Duration> {
        Ok(Duration::ZERO)
    }
}

/// Capitalize the first letter of each whitespace-separated word
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
