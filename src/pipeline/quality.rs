//! Quality scoring
//!
//! Deterministic heuristic score in [0, 10] for generated text. Used only
//! for observability metadata; never gates or retries generation.

/// Professional vocabulary rewarded by the scorer
const PROFESSIONAL_TERMS: [&str; 5] = [
    "assessment",
    "compliance",
    "requirements",
    "analysis",
    "recommendation",
];

/// Score generated content.
///
/// Base 5.0, +1.0 for a substantial-but-not-bloated length, +0.2 per
/// professional term found, +1.0 for rule-pack citations, +0.5 for
/// structural formatting markers; capped at 10.0.
pub fn quality_score(content: &str) -> f64 {
    let mut score: f64 = 5.0;

    if (200..=1000).contains(&content.len()) {
        score += 1.0;
    }

    let lower = content.to_lowercase();
    for term in PROFESSIONAL_TERMS {
        if lower.contains(term) {
            score += 0.2;
        }
    }

    if content.contains("Rule R") || content.contains("GSA") {
        score += 1.0;
    }

    if content.contains("**") || content.contains('\u{2022}') {
        score += 0.5;
    }

    score.min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_score() {
        assert_eq!(quality_score(""), 5.0);
        assert_eq!(quality_score("short note"), 5.0);
    }

    #[test]
    fn test_length_band() {
        let substantial = "x".repeat(400);
        assert_eq!(quality_score(&substantial), 6.0);

        let bloated = "x".repeat(2000);
        assert_eq!(quality_score(&bloated), 5.0);
    }

    #[test]
    fn test_professional_vocabulary_increments() {
        let content = "Compliance assessment and analysis";
        // 5.0 base + 0.2 * 3 terms
        assert!((quality_score(content) - 5.6).abs() < 1e-9);
    }

    #[test]
    fn test_citation_and_structure_bonuses() {
        let content = format!(
            "**Overall Assessment**: strong compliance posture per Rule R1.{}",
            " Detailed requirements analysis follows with a recommendation.".repeat(3)
        );
        let score = quality_score(&content);
        // Length band + 5 possible terms + citation + structure, capped
        assert!(score > 7.0);
        assert!(score <= 10.0);
    }

    #[test]
    fn test_determinism() {
        let content = "**Key Findings**: compliance analysis per Rule R4.";
        assert_eq!(quality_score(content), quality_score(content));
    }
}
