//! Deterministic ranking of candidates for the four cost-share fields.
//!
//! Primary-care candidates are those whose service text contains one of the
//! rule set's primary-care keywords; they are scored on exact keyword match,
//! network indicators and visit-type hints in the detail text. Urgent-care
//! candidates only get the network and tier bonuses.
//!
//! Selection keeps one running best per category, in scan order. A
//! candidate must strictly beat the current best to take over, so ties keep
//! the first candidate seen, and a negative score never wins. Each new best
//! writes its amount into the copay or coinsurance field depending on its
//! kind; a field written by an earlier best is left as it was.

use crate::models::{Candidate, ScoredCandidate};
use crate::registry::PatternRule;
use tracing::debug;

pub mod weights {
    pub const EXACT_SERVICE_MATCH: i32 = 100;
    pub const NETWORK_INDICATOR: i32 = 10;
    pub const PRIMARY_CARE_PHYSICIAN: i32 = 15;
    pub const PRIMARY_CARE_MENTION: i32 = 5;
    pub const INFUSION: i32 = -50;
    pub const SPECIALIST: i32 = -100;
    pub const OFFICE_VISIT: i32 = 20;
    pub const PREFERRED_TIER: i32 = 3;
    pub const PARTICIPATING_TIER: i32 = 1;
}

/// Field values written while selecting for one service category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldWinners {
    pub copay: Option<ScoredCandidate>,
    pub coinsurance: Option<ScoredCandidate>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateScorer;

impl CandidateScorer {
    pub fn new() -> Self {
        Self
    }

    /// `None` when the service is not a primary-care line for this rule set
    pub fn score_primary(&self, rule: &PatternRule, candidate: &Candidate) -> Option<ScoredCandidate> {
        let service = candidate.service.to_uppercase();
        if !contains_any(&service, &rule.primary_care_keywords) {
            return None;
        }

        let details = candidate.details.to_uppercase();
        let mut score = 0;

        let exact_match = rule
            .primary_care_keywords
            .iter()
            .any(|keyword| service == keyword.to_uppercase());
        if exact_match {
            score += weights::EXACT_SERVICE_MATCH;
        }

        if contains_any(&details, &rule.network_indicators) {
            score += weights::NETWORK_INDICATOR;
        }

        if details.contains("PRIMARY CARE PHYSICIAN") {
            score += weights::PRIMARY_CARE_PHYSICIAN;
        } else if details.contains("PRIMARY CARE") || details.contains("PCP") {
            score += weights::PRIMARY_CARE_MENTION;
        }

        if details.contains("INFUSION") {
            score += weights::INFUSION;
        }

        if details.contains("SPECIALIST") {
            score += weights::SPECIALIST;
        }

        if details.contains("OFFICE VISIT") || details.contains("CLINIC") || details.contains("HOME VISIT") {
            score += weights::OFFICE_VISIT;
        }

        score += tier_bonus(&details);

        debug!(
            service = %candidate.service,
            details = %candidate.details,
            score,
            exact_match,
            amount = %candidate.display_amount(),
            "primary care candidate"
        );

        Some(ScoredCandidate {
            candidate: candidate.clone(),
            score,
            exact_match,
        })
    }

    /// `None` when the service is not an urgent-care line for this rule set
    pub fn score_urgent(&self, rule: &PatternRule, candidate: &Candidate) -> Option<ScoredCandidate> {
        let service = candidate.service.to_uppercase();
        if !contains_any(&service, &rule.urgent_care_keywords) {
            return None;
        }

        let details = candidate.details.to_uppercase();
        let mut score = 0;
        if contains_any(&details, &rule.network_indicators) {
            score += weights::NETWORK_INDICATOR;
        }
        score += tier_bonus(&details);

        debug!(
            service = %candidate.service,
            details = %candidate.details,
            score,
            amount = %candidate.display_amount(),
            "urgent care candidate"
        );

        Some(ScoredCandidate {
            candidate: candidate.clone(),
            score,
            exact_match: false,
        })
    }

    pub fn rank_primary(&self, rule: &PatternRule, candidates: &[Candidate]) -> Vec<ScoredCandidate> {
        candidates
            .iter()
            .filter_map(|c| self.score_primary(rule, c))
            .collect()
    }

    pub fn rank_urgent(&self, rule: &PatternRule, candidates: &[Candidate]) -> Vec<ScoredCandidate> {
        candidates
            .iter()
            .filter_map(|c| self.score_urgent(rule, c))
            .collect()
    }

    /// Walk scored candidates in scan order, keeping a single running best
    pub fn select(&self, scored: &[ScoredCandidate]) -> FieldWinners {
        let mut winners = FieldWinners::default();
        let mut best_score: Option<i32> = None;

        for entry in scored.iter().filter(|s| s.score >= 0) {
            if best_score.is_some_and(|best| entry.score <= best) {
                continue;
            }
            best_score = Some(entry.score);
            if entry.candidate.is_percentage {
                winners.coinsurance = Some(entry.clone());
            } else {
                winners.copay = Some(entry.clone());
            }
        }
        winners
    }
}

fn contains_any(haystack_upper: &str, terms: &[String]) -> bool {
    terms
        .iter()
        .any(|term| haystack_upper.contains(term.to_uppercase().as_str()))
}

fn tier_bonus(details_upper: &str) -> i32 {
    if details_upper.contains("PREFERRED") {
        weights::PREFERRED_TIER
    } else if details_upper.contains("PARTICIPATING") {
        weights::PARTICIPATING_TIER
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_rule;

    fn candidate(service: &str, details: &str, amount: f64, is_percentage: bool) -> Candidate {
        Candidate {
            service: service.into(),
            details: details.into(),
            amount,
            is_percentage,
        }
    }

    #[test]
    fn test_primary_weights() {
        let rule = default_rule().unwrap();
        let scorer = CandidateScorer::new();

        let exact = scorer.score_primary(&rule, &candidate("PCP", "", 10.0, false)).unwrap();
        assert_eq!(exact.score, 100);
        assert!(exact.exact_match);

        let office = scorer
            .score_primary(&rule, &candidate("Office Visit Sick", "IN NETWORK OFFICE VISIT PREFERRED", 10.0, false))
            .unwrap();
        assert_eq!(office.score, 10 + 20 + 3);

        let specialist = scorer
            .score_primary(&rule, &candidate("Physician Visit Office", "SPECIALIST PARTICIPATING", 10.0, false))
            .unwrap();
        assert_eq!(specialist.score, 10 - 100 + 1);
    }

    #[test]
    fn test_non_matching_service_is_not_scored() {
        let rule = default_rule().unwrap();
        assert!(CandidateScorer::new()
            .score_primary(&rule, &candidate("Chiropractic", "IN NETWORK", 10.0, false))
            .is_none());
    }

    #[test]
    fn test_urgent_ignores_visit_type_hints() {
        let rule = default_rule().unwrap();
        let scored = CandidateScorer::new()
            .score_urgent(&rule, &candidate("Urgent Care", "SPECIALIST OFFICE VISIT PREFERRED", 75.0, false))
            .unwrap();
        assert_eq!(scored.score, 10 + 3);
    }

    fn scored(service: &str, amount: f64, is_percentage: bool, score: i32) -> ScoredCandidate {
        ScoredCandidate {
            candidate: candidate(service, "", amount, is_percentage),
            score,
            exact_match: false,
        }
    }

    #[test]
    fn test_ties_keep_first_and_negative_never_wins() {
        let scorer = CandidateScorer::new();
        let entries = vec![
            scored("A", 1.0, false, -40),
            scored("B", 2.0, false, 10),
            scored("C", 3.0, false, 10),
            scored("D", 20.0, true, 0),
        ];
        let winners = scorer.select(&entries);
        assert_eq!(winners.copay.unwrap().candidate.service, "B");
        assert!(winners.coinsurance.is_none());

        let only_negative = scorer.select(&entries[..1]);
        assert_eq!(only_negative, FieldWinners::default());
    }

    #[test]
    fn test_lower_scoring_percentage_never_sets_coinsurance() {
        let winners = CandidateScorer::new().select(&[scored("A", 25.0, false, 130), scored("B", 50.0, true, 0)]);
        assert_eq!(winners.copay.unwrap().candidate.service, "A");
        assert!(winners.coinsurance.is_none());
    }

    #[test]
    fn test_later_best_keeps_earlier_written_field() {
        let winners = CandidateScorer::new().select(&[
            scored("A", 25.0, false, 10),
            scored("B", 20.0, true, 30),
            scored("C", 40.0, false, 20),
        ]);
        assert_eq!(winners.copay.unwrap().candidate.service, "A");
        assert_eq!(winners.coinsurance.unwrap().candidate.service, "B");
    }
}
