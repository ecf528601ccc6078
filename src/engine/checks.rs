//! Rule predicates
//!
//! One deterministic check per evaluable rule. Checks are pure functions of
//! the fact sheet: no I/O, no clock, no randomness.

use regex::Regex;
use std::sync::OnceLock;

use crate::facts::{ContractValue, FactSheet};

/// Problems and evidence accumulated by one rule predicate
#[derive(Debug, Default, Clone)]
pub struct CheckOutcome {
    /// Problem codes, in the order the checks ran
    pub problems: Vec<String>,

    /// Human-readable evidence lines, in the order the checks ran
    pub evidence: Vec<String>,
}

impl CheckOutcome {
    fn problem(&mut self, code: &str, evidence: impl Into<String>) {
        self.problems.push(code.to_string());
        self.evidence.push(evidence.into());
    }

    fn note(&mut self, evidence: impl Into<String>) {
        self.evidence.push(evidence.into());
    }
}

/// A deterministic compliance predicate for one rule
pub trait ComplianceCheck: Send + Sync {
    /// Rule id this check evaluates
    fn rule_id(&self) -> &str;

    /// Human description attached to the checklist entry
    fn description(&self) -> &str;

    /// Canonical retrieval phrase used for citation agreement
    fn canonical_query(&self) -> &str;

    /// Evaluate the fact sheet
    fn evaluate(&self, facts: &FactSheet) -> CheckOutcome;
}

/// R1: UEI, DUNS, SAM registration, and contact details
pub struct IdentityCheck;

impl ComplianceCheck for IdentityCheck {
    fn rule_id(&self) -> &str {
        "R1"
    }

    fn description(&self) -> &str {
        "Identity & Registry requirements"
    }

    fn canonical_query(&self) -> &str {
        "UEI DUNS SAM registration contact email phone"
    }

    fn evaluate(&self, facts: &FactSheet) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();
        let profile = &facts.company_profile;

        match profile.uei.as_deref() {
            Some(uei) if uei.len() == 12 => outcome.note(format!("UEI on file: {uei}")),
            _ => outcome.problem(
                "missing_uei",
                "UEI not found or invalid format (requires 12 characters)",
            ),
        }

        static DUNS: OnceLock<Regex> = OnceLock::new();
        let duns_re = DUNS.get_or_init(|| Regex::new(r"^\d{9}$").expect("static pattern compiles"));
        match profile.duns.as_deref() {
            Some(duns) if duns_re.is_match(duns) => {
                outcome.note(format!("DUNS on file: {duns}"));
            }
            _ => outcome.problem(
                "missing_duns",
                "DUNS not found or invalid format (requires 9 digits)",
            ),
        }

        match profile.sam_status.as_deref() {
            Some(status)
                if status.eq_ignore_ascii_case("active")
                    || status.eq_ignore_ascii_case("registered") =>
            {
                outcome.note(format!("SAM.gov status: {status}"));
            }
            other => outcome.problem(
                "sam_not_active",
                format!("SAM.gov status: {}", other.unwrap_or("unknown")),
            ),
        }

        match profile.contact.email.as_deref() {
            Some(email) if !email.trim().is_empty() => {
                outcome.note(format!("Primary contact email: {email}"));
            }
            _ => outcome.problem("missing_contact_email", "Primary contact email not found"),
        }

        match profile.contact.phone.as_deref() {
            Some(phone) if !phone.trim().is_empty() => {
                outcome.note(format!("Primary contact phone: {phone}"));
            }
            _ => outcome.problem("missing_contact_phone", "Primary contact phone not found"),
        }

        outcome
    }
}

/// R2: at least one classification code maps to an approved category
pub struct CodeMappingCheck;

impl CodeMappingCheck {
    /// Approved NAICS → SIN mapping (fixed subset)
    pub fn sin_for(naics: &str) -> Option<&'static str> {
        match naics {
            "541511" | "541512" => Some("54151S"),
            "541611" => Some("541611"),
            "518210" => Some("518210C"),
            _ => None,
        }
    }
}

impl ComplianceCheck for CodeMappingCheck {
    fn rule_id(&self) -> &str {
        "R2"
    }

    fn description(&self) -> &str {
        "NAICS & SIN Mapping verification"
    }

    fn canonical_query(&self) -> &str {
        "NAICS SIN mapping"
    }

    fn evaluate(&self, facts: &FactSheet) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();
        let codes = &facts.company_profile.naics;

        if codes.is_empty() {
            outcome.problem("missing_naics", "No NAICS codes found");
            return outcome;
        }

        let mut mapped = 0usize;
        for code in codes {
            match Self::sin_for(code) {
                Some(sin) => {
                    mapped += 1;
                    outcome.note(format!("NAICS {code} maps to SIN {sin}"));
                }
                None => outcome.note(format!("NAICS {code} not in approved SIN mapping")),
            }
        }

        // Unmapped codes alone do not fail the rule; the rule fails only
        // when no code maps at all
        if mapped == 0 {
            outcome
                .problems
                .push("invalid_naics_mapping".to_string());
        }

        outcome
    }
}

/// R3: at least one past-performance contract at or above the threshold,
/// with required sub-fields on every qualifying record
pub struct PastPerformanceCheck {
    min_value: f64,
}

impl PastPerformanceCheck {
    pub fn new(min_value: f64) -> Self {
        Self { min_value }
    }
}

impl ComplianceCheck for PastPerformanceCheck {
    fn rule_id(&self) -> &str {
        "R3"
    }

    fn description(&self) -> &str {
        "Past Performance requirements"
    }

    fn canonical_query(&self) -> &str {
        "past performance $25000 36 months customer"
    }

    fn evaluate(&self, facts: &FactSheet) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();
        let mut qualifying = Vec::new();

        for record in &facts.past_performance {
            let amount = record.value.as_ref().map(ContractValue::as_amount).unwrap_or(0.0);

            if let Some(value) = &record.value {
                if value.is_unparsable() {
                    outcome.note(format!(
                        "Unparsable contract value treated as $0: \"{}\"",
                        value.raw()
                    ));
                }
            }

            if amount >= self.min_value {
                outcome.note(format!(
                    "Valid performance: {} - ${}",
                    record.customer.as_deref().unwrap_or("Unknown"),
                    format_amount(amount)
                ));
                qualifying.push(record);
            }
        }

        if qualifying.is_empty() {
            outcome.problem(
                "past_performance_min_value_not_met",
                format!(
                    "No past performance contracts \u{2265} ${} found",
                    format_amount(self.min_value)
                ),
            );
        }

        for record in qualifying {
            if record.contract.as_deref().map(str::trim).unwrap_or("").is_empty() {
                outcome.problems.push("missing_pp_contract".to_string());
            }
            if record.period.as_deref().map(str::trim).unwrap_or("").is_empty() {
                outcome.problems.push("missing_pp_period".to_string());
            }
            if record
                .source_document
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
            {
                outcome.problems.push("missing_pp_source".to_string());
            }
        }

        outcome
    }
}

/// R4: at least one pricing line item with both rate and unit
pub struct PricingCheck;

impl ComplianceCheck for PricingCheck {
    fn rule_id(&self) -> &str {
        "R4"
    }

    fn description(&self) -> &str {
        "Pricing & Catalog requirements"
    }

    fn canonical_query(&self) -> &str {
        "pricing labor categories rates structured"
    }

    fn evaluate(&self, facts: &FactSheet) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();

        if facts.pricing.is_empty() {
            outcome.problem("pricing_incomplete", "No pricing information found");
            return outcome;
        }

        let mut complete = 0usize;
        for item in &facts.pricing {
            if item.is_complete() {
                complete += 1;
            } else {
                outcome.note(format!(
                    "Missing rate basis or units for {}",
                    item.category.as_deref().unwrap_or("Unknown category")
                ));
            }
        }

        // One aggregate flag, and only when no item is usable
        if complete == 0 {
            outcome
                .problems
                .push("pricing_incomplete".to_string());
        }

        outcome
    }
}

/// Format an amount with thousands separators ("45,000", "125,000.5")
fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let abs = value.abs();
    let int_part = abs.trunc() as u64;
    let frac = abs.fract();

    let digits = int_part.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if frac > 0.0 {
        // Up to two decimal places, trailing zeros trimmed
        let frac_str = format!("{:.2}", frac);
        let trimmed = frac_str.trim_start_matches("0.").trim_end_matches('0');
        if !trimmed.is_empty() {
            out.push('.');
            out.push_str(trimmed);
        }
    }
    out
}
