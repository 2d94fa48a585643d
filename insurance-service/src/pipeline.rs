use crate::detector::InsurerDetector;
use crate::extractor::{normalize_whitespace, FieldExtractor};
use crate::models::{ExtractionOutcome, ExtractionResult, Money, Percent};
use crate::registry::InsurerPatternRegistry;
use crate::scoring::CandidateScorer;
use crate::error::InsuranceResult;
use config_engine::ExtractionConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Detector → extractor → scorer. A pure function of the input text.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    detector: InsurerDetector,
    extractor: FieldExtractor,
    scorer: CandidateScorer,
}

impl ExtractionPipeline {
    pub fn new(detector: InsurerDetector, extractor: FieldExtractor, scorer: CandidateScorer) -> Self {
        Self {
            detector,
            extractor,
            scorer,
        }
    }

    /// Standard carrier table with the given limits
    pub fn from_config(config: &ExtractionConfig) -> InsuranceResult<Self> {
        let registry = Arc::new(InsurerPatternRegistry::standard()?);
        Ok(Self::new(
            InsurerDetector::new(registry),
            FieldExtractor::from_config(config),
            CandidateScorer::new(),
        ))
    }

    pub fn detector(&self) -> &InsurerDetector {
        &self.detector
    }

    pub fn extract(&self, raw_text: &str) -> ExtractionResult {
        let normalized = normalize_whitespace(raw_text);
        let mut rule = self.detector.detect(raw_text);
        let mut candidates = self.extractor.extract(&rule, &normalized);
        let mut used_default_fallback = false;

        if candidates.is_empty() && !Arc::ptr_eq(&rule, &self.detector.default_rule()) {
            warn!(rule_set = %rule.name, "no lines matched, retrying with default rules");
            let default_rule = self.detector.default_rule();
            let fallback = self.extractor.extract(&default_rule, &normalized);
            if !fallback.is_empty() {
                rule = default_rule;
                candidates = fallback;
                used_default_fallback = true;
            }
        }

        if candidates.is_empty() {
            logger_redacted::redacted_warn!(normalized, rule_set = %rule.name, "no cost-share lines found");
            return ExtractionResult::empty(rule.name.clone());
        }

        let primary_scored = self.scorer.rank_primary(&rule, &candidates);
        let urgent_scored = self.scorer.rank_urgent(&rule, &candidates);
        let primary = self.scorer.select(&primary_scored);
        let urgent = self.scorer.select(&urgent_scored);

        let result = ExtractionResult {
            primary_copay: primary.copay.map(|w| Money::from_amount(w.candidate.amount)),
            primary_coinsurance: primary.coinsurance.map(|w| Percent::from_amount(w.candidate.amount)),
            urgent_copay: urgent.copay.map(|w| Money::from_amount(w.candidate.amount)),
            urgent_coinsurance: urgent.coinsurance.map(|w| Percent::from_amount(w.candidate.amount)),
            candidates,
            outcome: ExtractionOutcome::Matched,
            rule_set: rule.name.clone(),
            used_default_fallback,
            primary_scored,
            urgent_scored,
        };

        info!(
            rule_set = %result.rule_set,
            candidates = result.candidates.len(),
            primary_copay = ?result.primary_copay,
            primary_coinsurance = ?result.primary_coinsurance,
            urgent_copay = ?result.urgent_copay,
            urgent_coinsurance = ?result.urgent_coinsurance,
            "extraction complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_valid_empty_result() {
        let pipeline = ExtractionPipeline::from_config(&ExtractionConfig::default()).unwrap();
        let result = pipeline.extract("");
        assert_eq!(result.outcome, ExtractionOutcome::NoCandidates);
        assert!(!result.has_primary());
        assert_eq!(result.rule_set, "DEFAULT");
    }
}
