use crate::models::{Candidate, ParsedLine};
use crate::registry::PatternRule;
use config_engine::ExtractionConfig;
use tracing::{trace, warn};

/// Collapse every whitespace run to a single space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Applies a rule set's grammars to normalized text
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    max_iterations_per_grammar: usize,
    max_amount: f64,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldExtractor {
    pub fn new(max_iterations_per_grammar: usize, max_amount: f64) -> Self {
        Self {
            max_iterations_per_grammar,
            max_amount,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.max_iterations_per_grammar, config.max_amount)
    }

    /// Every valid candidate from every grammar, in grammar then scan order
    pub fn extract(&self, rule: &PatternRule, normalized: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for grammar in &rule.grammars {
            for (index, caps) in grammar.regex().captures_iter(normalized).enumerate() {
                if index >= self.max_iterations_per_grammar {
                    warn!(
                        rule_set = %rule.name,
                        grammar = grammar.name(),
                        cap = self.max_iterations_per_grammar,
                        "grammar iteration cap reached"
                    );
                    break;
                }

                let Some(line) = grammar.parse(&caps) else {
                    continue;
                };
                match self.to_candidate(&line) {
                    Some(candidate) => candidates.push(candidate),
                    None => trace!(
                        grammar = grammar.name(),
                        amount = line.raw_amount(),
                        "discarding out-of-range amount"
                    ),
                }
            }
        }

        candidates
    }

    pub fn to_candidate(&self, line: &ParsedLine) -> Option<Candidate> {
        let (amount, is_percentage) = self.parse_amount(line.raw_amount())?;
        Some(Candidate {
            service: line.service().to_string(),
            details: line.details(),
            amount,
            is_percentage,
        })
    }

    /// `"1,250.00"` → `(1250.0, false)`, `"20%"` → `(20.0, true)`.
    /// `None` when unparseable or outside `[0, max_amount]`.
    pub fn parse_amount(&self, raw: &str) -> Option<(f64, bool)> {
        let cleaned = raw.replace(',', "");
        let is_percentage = cleaned.ends_with('%');
        let amount: f64 = cleaned.trim_end_matches('%').parse().ok()?;
        if amount.is_nan() || amount < 0.0 || amount > self.max_amount {
            return None;
        }
        Some((amount, is_percentage))
    }
}
