//! Scoring engine: converts severity-tagged findings into a verdict outcome.

use crate::domain::entities::Finding;
use crate::domain::value_objects::{Rating, Severity};

/// Outcome of scoring a list of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub score: u8,
    pub rating: Rating,
    pub passed: bool,
}

/// Pure scoring over a findings list. No side effects.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Start at 100 and deduct a fixed weight per finding by severity.
    /// Deductions are summed without a per-finding floor; the running total
    /// is clamped to [0, 100] only at the end.
    ///
    /// A single CRITICAL finding forces `passed = false` regardless of the
    /// numeric score.
    pub fn score(findings: &[Finding]) -> ScoreOutcome {
        let mut total: i32 = 100;
        for finding in findings {
            total -= i32::from(finding.severity().weight());
        }
        let score = total.clamp(0, 100) as u8;
        let has_critical = findings
            .iter()
            .any(|f| f.severity() == Severity::Critical);

        ScoreOutcome {
            score,
            rating: Rating::from_score(score),
            passed: !has_critical && score >= 75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detailed(severity: Severity) -> Finding {
        Finding::detailed(severity, "finding", "description")
    }

    #[test]
    fn empty_findings_score_perfect() {
        let outcome = ScoringEngine::score(&[]);
        assert_eq!(outcome.score, 100);
        assert_eq!(outcome.rating, Rating::A);
        assert!(outcome.passed);
    }

    #[test]
    fn single_critical_fails_despite_passing_score() {
        let outcome = ScoringEngine::score(&[detailed(Severity::Critical)]);
        assert_eq!(outcome.score, 60);
        assert_eq!(outcome.rating, Rating::C);
        assert!(!outcome.passed);
    }

    #[test]
    fn three_highs_score_forty() {
        let findings = vec![
            detailed(Severity::High),
            detailed(Severity::High),
            detailed(Severity::High),
        ];
        let outcome = ScoringEngine::score(&findings);
        assert_eq!(outcome.score, 40);
        assert_eq!(outcome.rating, Rating::D);
        assert!(!outcome.passed);
    }

    #[test]
    fn score_clamps_to_zero() {
        let findings = vec![detailed(Severity::Critical); 4];
        let outcome = ScoringEngine::score(&findings);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.rating, Rating::F);
        assert!(!outcome.passed);
    }

    #[test]
    fn passed_never_co_occurs_with_critical() {
        // Info findings do not deduct; only the critical override applies.
        let findings = vec![detailed(Severity::Critical), detailed(Severity::Info)];
        let outcome = ScoringEngine::score(&findings);
        assert!(!outcome.passed);
    }

    #[test]
    fn bare_title_findings_do_not_deduct() {
        let findings = vec![Finding::titled("Unable to complete full audit")];
        let outcome = ScoringEngine::score(&findings);
        assert_eq!(outcome.score, 100);
    }

    #[test]
    fn boundary_at_seventy_five() {
        // Low + High = 25 deducted -> exactly 75 still passes.
        let findings = vec![detailed(Severity::High), detailed(Severity::Low)];
        let outcome = ScoringEngine::score(&findings);
        assert_eq!(outcome.score, 75);
        assert_eq!(outcome.rating, Rating::B);
        assert!(outcome.passed);
    }
}
