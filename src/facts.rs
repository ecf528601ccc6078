//! Fact sheet data model
//!
//! The normalized, extracted representation of one vendor submission.
//! Produced by the document-extraction collaborator; this crate only reads
//! it. Absence of a field is a first-class value (`Option`), never a
//! missing-key lookup.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Normalized extracted data for one vendor submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactSheet {
    /// Company identity block
    #[serde(default)]
    pub company_profile: CompanyProfile,

    /// Past performance records, in extraction order
    #[serde(default)]
    pub past_performance: Vec<PastPerformance>,

    /// Pricing line items, in extraction order
    #[serde(default)]
    pub pricing: Vec<PricingItem>,
}

/// Company identity fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Unique Entity Identifier (12 alphanumeric characters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uei: Option<String>,

    /// DUNS number (9 digits)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duns: Option<String>,

    /// SAM.gov registration status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sam_status: Option<String>,

    /// Classification codes (NAICS)
    #[serde(default)]
    pub naics: Vec<String>,

    /// Primary point of contact
    #[serde(default)]
    pub contact: ContactInfo,
}

/// Primary contact sub-block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One past-performance record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PastPerformance {
    /// Customer organization name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    /// Contract label/description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,

    /// Contract value; extraction may deliver a number or raw text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ContractValue>,

    /// Period of performance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,

    /// Customer contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    /// Document the record was extracted from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
}

/// One pricing line item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingItem {
    /// Labor category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Rate basis, as extracted (e.g. "185", "$185.00")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,

    /// Unit (e.g. "hour")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl PricingItem {
    /// A line item is complete when both rate and unit carry non-blank text
    pub fn is_complete(&self) -> bool {
        fn present(v: &Option<String>) -> bool {
            v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
        }
        present(&self.rate) && present(&self.unit)
    }
}

/// Monetary value as extracted: either already numeric or raw text
/// ("$45,000", "approx. 30000").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractValue {
    Amount(f64),
    Text(String),
}

fn strip_non_numeric(text: &str) -> std::borrow::Cow<'_, str> {
    static NON_NUMERIC: OnceLock<Regex> = OnceLock::new();
    NON_NUMERIC
        .get_or_init(|| Regex::new(r"[^\d.]").expect("static pattern compiles"))
        .replace_all(text, "")
}

impl ContractValue {
    /// Coerce to a numeric amount. Text values are stripped of everything
    /// except digits and the decimal point; unparsable text coerces to 0.0.
    pub fn as_amount(&self) -> f64 {
        match self {
            ContractValue::Amount(v) => *v,
            ContractValue::Text(s) => strip_non_numeric(s).parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Whether coercion had to fall back to 0.0 because the text held no
    /// parsable number
    pub fn is_unparsable(&self) -> bool {
        match self {
            ContractValue::Amount(_) => false,
            ContractValue::Text(s) => strip_non_numeric(s).parse::<f64>().is_err(),
        }
    }

    /// Raw representation for evidence lines
    pub fn raw(&self) -> String {
        match self {
            ContractValue::Amount(v) => format!("{v}"),
            ContractValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for ContractValue {
    fn from(v: f64) -> Self {
        ContractValue::Amount(v)
    }
}

impl From<&str> for ContractValue {
    fn from(s: &str) -> Self {
        ContractValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_passthrough() {
        assert_eq!(ContractValue::Amount(45000.0).as_amount(), 45000.0);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(ContractValue::from("$45,000").as_amount(), 45000.0);
        assert_eq!(ContractValue::from("approx 30000 USD").as_amount(), 30000.0);
        assert_eq!(ContractValue::from("125,000.50").as_amount(), 125000.50);
    }

    #[test]
    fn test_unparsable_text_coerces_to_zero() {
        assert_eq!(ContractValue::from("TBD").as_amount(), 0.0);
        assert_eq!(ContractValue::from("").as_amount(), 0.0);
        assert!(ContractValue::from("TBD").is_unparsable());
        assert!(!ContractValue::from("$0").is_unparsable());
        assert!(!ContractValue::Amount(0.0).is_unparsable());
    }

    #[test]
    fn test_pricing_item_completeness() {
        let complete = PricingItem {
            category: Some("Senior Developer".to_string()),
            rate: Some("185".to_string()),
            unit: Some("hour".to_string()),
        };
        assert!(complete.is_complete());

        let missing_unit = PricingItem {
            category: Some("Senior Developer".to_string()),
            rate: Some("185".to_string()),
            unit: None,
        };
        assert!(!missing_unit.is_complete());

        let blank_rate = PricingItem {
            category: None,
            rate: Some("   ".to_string()),
            unit: Some("hour".to_string()),
        };
        assert!(!blank_rate.is_complete());
    }

    #[test]
    fn test_untagged_value_deserialization() {
        let facts: FactSheet = serde_json::from_str(
            r#"{
                "past_performance": [
                    {"customer": "City of Austin", "value": 45000},
                    {"customer": "State of Ohio", "value": "$30,000"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(facts.past_performance[0].value.as_ref().unwrap().as_amount(), 45000.0);
        assert_eq!(facts.past_performance[1].value.as_ref().unwrap().as_amount(), 30000.0);
    }
}
