use crate::registry::{InsurerPatternRegistry, PatternRule};
use std::sync::Arc;
use tracing::debug;

/// Picks the carrier rule set for a document. Pure and total.
#[derive(Debug, Clone)]
pub struct InsurerDetector {
    registry: Arc<InsurerPatternRegistry>,
}

impl InsurerDetector {
    pub fn new(registry: Arc<InsurerPatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<InsurerPatternRegistry> {
        &self.registry
    }

    /// First matching fingerprint wins, else the default rule set
    pub fn detect(&self, raw_text: &str) -> Arc<PatternRule> {
        let upper = raw_text.to_uppercase();
        let rule = self
            .registry
            .entries()
            .iter()
            .find(|(fingerprint, _)| fingerprint.matches(&upper))
            .map(|(_, rule)| rule)
            .unwrap_or_else(|| self.registry.default_rule());
        debug!(rule_set = %rule.name, "insurer detected");
        Arc::clone(rule)
    }

    pub fn default_rule(&self) -> Arc<PatternRule> {
        Arc::clone(self.registry.default_rule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> InsurerDetector {
        InsurerDetector::new(Arc::new(InsurerPatternRegistry::standard().unwrap()))
    }

    #[test]
    fn test_medicare_advantage_variant_needs_both_tokens() {
        let d = detector();
        assert_eq!(d.detect("Cigna plan PRIMARY CARE[Seq#1 IN NETWORK]:$0").name, "CIGNA");
        assert_eq!(d.detect("Humana Gold PRIMARY CARE[Seq#4 IN NETWORK]:$0").name, "HUMANA");
        // Humana without coded lines is not the Seq# layout
        assert_eq!(d.detect("Humana commercial Office Visit[IN NETWORK]:$20").name, "DEFAULT");
    }

    #[test]
    fn test_specific_carrier_checked_first() {
        let d = detector();
        // Mentions both; CareFirst sits earlier in the table
        assert_eq!(d.detect("CareFirst BlueChoice administered with Aetna").name, "CAREFIRST");
        assert_eq!(d.detect("uhc choice plus").name, "UNITED");
        assert_eq!(d.detect("Price varies by location").name, "SUREST");
    }

    #[test]
    fn test_unknown_carrier_gets_default() {
        assert_eq!(detector().detect("Acme Health Plan").name, "DEFAULT");
        assert_eq!(detector().detect("").name, "DEFAULT");
    }
}
