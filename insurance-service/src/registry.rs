//! Carrier rule sets.
//!
//! Each carrier that prints its eligibility report in a distinctive layout
//! gets a [`PatternRule`]: the grammars that recognise its cost-share lines
//! and the keyword lists the scorer uses. The registry pairs every rule with
//! a [`Fingerprint`] and keeps them in specificity order, so a Medicare
//! Advantage variant is checked before the commercial plan of the same
//! carrier. Anything unrecognised falls through to the default rule set.

use crate::error::{InsuranceError, InsuranceResult};
use crate::models::ParsedLine;
use regex::{Captures, Regex};
use std::sync::Arc;

/// `:` then an optional `$`, then the amount with optional thousands
/// separators, cents and `%` suffix
const AMOUNT: &str = r":\$?([\d,]+(?:\.\d{2})?%?)";

const BRACKET: &str = r"([^\[\]]+)\[([^\]]+)\]";
const COLON: &str = r"([^:]+)";
const UHC_BRACKET: &str = r"([^\[\]]+)\[([^\]]+UHC[^\]]*)\]";
const OFFICE_BRACKET: &str = r"([^\[\]]+)\[([^\]]+OFFICE VISIT[^\]]*)\]";
const SEQ_BRACKET: &str = r"([^\[\]]+)\[Seq#\d+\s+([^\]]+)\]";
const BCBS_BRACKET: &str = r"([^\[\]]+)\[([^\]]+BCBS PROVIDERS[^\]]*)\]";
const CODED_BRACKET: &str = r"([^\[\]]+)\[([^\]]+)\s+\((\d+)\)[^\]]*IN NETWORK[^\]]*\]";
const LABELED_BRACKET: &str = r"([^\[\]:]+):\s*[^\[\]]*\[([^\]]+)\]";
const BARE_COLON: &str = r"([^:\[\]]+)";
const VARIES_BRACKET: &str = r"([^\[\]]+)\[([^\]]+VARIES BY[^\]]*)\]";

/// How a grammar's capture groups map onto a [`ParsedLine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// service, amount
    Simple,
    /// service, detail, amount
    Bracketed,
    /// service, detail, code, amount
    Coded,
}

impl LineShape {
    pub fn capture_slots(self) -> usize {
        match self {
            LineShape::Simple => 2,
            LineShape::Bracketed => 3,
            LineShape::Coded => 4,
        }
    }
}

/// A compiled cost-share line pattern with a known capture layout
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    regex: Regex,
    shape: LineShape,
}

impl Grammar {
    /// Compile `pattern` and check it has exactly the groups `shape` needs
    pub fn new(name: impl Into<String>, pattern: &str, shape: LineShape) -> InsuranceResult<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| InsuranceError::InvalidGrammar {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        let slots = regex.captures_len() - 1;
        if slots != shape.capture_slots() {
            return Err(InsuranceError::InvalidGrammar {
                reason: format!(
                    "{:?} lines need {} capture groups, pattern has {}",
                    shape,
                    shape.capture_slots(),
                    slots
                ),
                name,
            });
        }

        Ok(Self { name, regex, shape })
    }

    fn line(name: &str, prefix: &str, shape: LineShape) -> InsuranceResult<Self> {
        Self::new(name, &format!("{}{}", prefix, AMOUNT), shape)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn shape(&self) -> LineShape {
        self.shape
    }

    /// Turn one match into a line; service and detail are trimmed
    pub fn parse(&self, caps: &Captures<'_>) -> Option<ParsedLine> {
        let group = |i: usize| caps.get(i).map(|m| m.as_str());
        let line = match self.shape {
            LineShape::Simple => ParsedLine::Simple {
                service: group(1)?.trim().to_string(),
                amount: group(2)?.to_string(),
            },
            LineShape::Bracketed => ParsedLine::Bracketed {
                service: group(1)?.trim().to_string(),
                detail: group(2)?.trim().to_string(),
                amount: group(3)?.to_string(),
            },
            LineShape::Coded => ParsedLine::Coded {
                service: group(1)?.trim().to_string(),
                detail: group(2)?.trim().to_string(),
                code: group(3)?.to_string(),
                amount: group(4)?.to_string(),
            },
        };
        Some(line)
    }
}

/// One carrier's extraction configuration
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub grammars: Vec<Grammar>,
    pub network_indicators: Vec<String>,
    pub primary_care_keywords: Vec<String>,
    pub urgent_care_keywords: Vec<String>,
}

impl PatternRule {
    pub fn new(name: impl Into<String>, grammars: Vec<Grammar>) -> Self {
        Self {
            name: name.into(),
            grammars,
            network_indicators: Vec::new(),
            primary_care_keywords: Vec::new(),
            urgent_care_keywords: Vec::new(),
        }
    }

    pub fn with_network_indicators(mut self, terms: &[&str]) -> Self {
        self.network_indicators = terms.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_primary_care_keywords(mut self, terms: &[&str]) -> Self {
        self.primary_care_keywords = terms.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_urgent_care_keywords(mut self, terms: &[&str]) -> Self {
        self.urgent_care_keywords = terms.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Disjunction of token conjunctions, matched against upper-cased text.
///
/// `Fingerprint::any(&[&["CIGNA HEALTHSPRING"], &["CIGNA", "SEQ#"]])` matches
/// text containing either the first phrase, or both of the other tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    alternatives: Vec<Vec<String>>,
}

impl Fingerprint {
    pub fn any(alternatives: &[&[&str]]) -> Self {
        Self {
            alternatives: alternatives
                .iter()
                .map(|all| all.iter().map(|t| t.to_uppercase()).collect())
                .collect(),
        }
    }

    pub fn token(token: &str) -> Self {
        Self::any(&[&[token]])
    }

    pub fn matches(&self, upper_text: &str) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|token| upper_text.contains(token.as_str())))
    }
}

/// Ordered `(fingerprint, rule)` pairs plus the default rule.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct InsurerPatternRegistry {
    entries: Vec<(Fingerprint, Arc<PatternRule>)>,
    default_rule: Arc<PatternRule>,
}

impl InsurerPatternRegistry {
    pub fn new(default_rule: PatternRule) -> Self {
        Self {
            entries: Vec::new(),
            default_rule: Arc::new(default_rule),
        }
    }

    /// Append a carrier; earlier entries take precedence
    pub fn register(mut self, fingerprint: Fingerprint, rule: PatternRule) -> Self {
        self.entries.push((fingerprint, Arc::new(rule)));
        self
    }

    pub fn entries(&self) -> &[(Fingerprint, Arc<PatternRule>)] {
        &self.entries
    }

    pub fn default_rule(&self) -> &Arc<PatternRule> {
        &self.default_rule
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|(_, rule)| rule.name.as_str())
            .chain(std::iter::once(self.default_rule.name.as_str()))
            .collect()
    }

    /// The carrier table for the supported eligibility reports
    pub fn standard() -> InsuranceResult<Self> {
        let registry = Self::new(default_rule()?)
            .register(
                Fingerprint::any(&[&["CIGNA HEALTHSPRING"], &["CIGNA", "SEQ#"]]),
                seq_rule("CIGNA", &["PHYSICIAN OFFICE VISIT PCP", "PRIMARY CARE", "PCP"])?,
            )
            .register(
                Fingerprint::any(&[&["HUMANA", "SEQ#"]]),
                seq_rule("HUMANA", &["PHYSICIAN OFFICE VISIT PCP", "PRIMARY CARE"])?,
            )
            .register(
                Fingerprint::any(&[&["CAREFIRST"], &["BCBS PROVIDERS"]]),
                PatternRule::new(
                    "CAREFIRST",
                    vec![
                        Grammar::line("carefirst-bcbs", BCBS_BRACKET, LineShape::Bracketed)?,
                        Grammar::line("carefirst-coded", CODED_BRACKET, LineShape::Coded)?,
                        Grammar::line("bracket", BRACKET, LineShape::Bracketed)?,
                        Grammar::line("carefirst-labeled", LABELED_BRACKET, LineShape::Bracketed)?,
                    ],
                )
                .with_network_indicators(&["BCBS PROVIDERS", "IN NETWORK", "BLUECHOICE"])
                .with_primary_care_keywords(&[
                    "Physician Visit - Office",
                    "Professional (Physician) Visit - Office",
                    "PRIMARY CARE PHYSICIAN",
                    "PCP",
                    "OFFICE VISIT",
                ])
                .with_urgent_care_keywords(&["Urgent Care", "URGENT CARE"]),
            )
            .register(
                Fingerprint::any(&[&["UNITED HEALTHCARE"], &["UHC CHOICE"], &["ALL SAVERS"]]),
                PatternRule::new(
                    "UNITED",
                    vec![
                        Grammar::line("uhc-bracket", UHC_BRACKET, LineShape::Bracketed)?,
                        Grammar::line("uhc-office", OFFICE_BRACKET, LineShape::Bracketed)?,
                        Grammar::line("colon", COLON, LineShape::Simple)?,
                    ],
                )
                .with_network_indicators(&["UHC CHOICE", "IN NETWORK"])
                .with_primary_care_keywords(&[
                    "PCP OFFICE VISIT",
                    "Professional (Physician) Visit - Office",
                    "OFFICE VISIT PRIMARY",
                ])
                .with_urgent_care_keywords(&["Urgent Care"]),
            )
            .register(
                Fingerprint::any(&[&["SUREST"], &["VARIES BY LOCATION"]]),
                PatternRule::new(
                    "SUREST",
                    vec![
                        Grammar::line("surest-colon", BARE_COLON, LineShape::Simple)?,
                        Grammar::line("surest-varies", VARIES_BRACKET, LineShape::Bracketed)?,
                    ],
                )
                .with_network_indicators(&["VARIES BY LOCATION", "VARIES BY PRACTITIONER"])
                .with_primary_care_keywords(&[
                    "Physician Visit - Office: Sick",
                    "Physician Visit - Office: Well",
                    "Office Visit",
                ])
                .with_urgent_care_keywords(&["Urgent Care"]),
            )
            .register(
                Fingerprint::token("TRICARE"),
                PatternRule::new("TRICARE", vec![Grammar::line("colon", COLON, LineShape::Simple)?])
                    .with_network_indicators(&["IN NETWORK"])
                    .with_primary_care_keywords(&["Professional (Physician) Visit - Office"])
                    .with_urgent_care_keywords(&["Urgent Care"]),
            )
            .register(
                Fingerprint::token("AETNA"),
                PatternRule::new(
                    "AETNA",
                    vec![
                        Grammar::line("bracket", BRACKET, LineShape::Bracketed)?,
                        Grammar::line("colon", COLON, LineShape::Simple)?,
                    ],
                )
                .with_network_indicators(&["IN NETWORK", "PARTICIPATING"])
                .with_primary_care_keywords(&[
                    "PCP",
                    "Primary Care",
                    "Professional (Physician) Visit - Office",
                ])
                .with_urgent_care_keywords(&["Urgent Care"]),
            )
            .register(
                Fingerprint::token("ALLEGIANCE"),
                PatternRule::new("ALLEGIANCE", vec![Grammar::line("bracket", BRACKET, LineShape::Bracketed)?])
                    .with_network_indicators(&["JOHNS HOPKINS", "IN NETWORK"])
                    .with_primary_care_keywords(&[
                        "PCP",
                        "Office Visit",
                        "Professional (Physician) Visit - Office",
                    ])
                    .with_urgent_care_keywords(&["Urgent Care"]),
            );

        Ok(registry)
    }
}

fn seq_rule(name: &str, primary_care: &[&str]) -> InsuranceResult<PatternRule> {
    Ok(PatternRule::new(name, vec![Grammar::line("seq", SEQ_BRACKET, LineShape::Bracketed)?])
        .with_network_indicators(&["IN NETWORK", "PARTICIPATING"])
        .with_primary_care_keywords(primary_care)
        .with_urgent_care_keywords(&["PHYSICIAN OFFICE URGENT CARE", "URGENT CARE"]))
}

pub const DEFAULT_RULE_NAME: &str = "DEFAULT";

/// Generic bracket and colon grammars with the broadest keyword lists
pub fn default_rule() -> InsuranceResult<PatternRule> {
    Ok(PatternRule::new(
        DEFAULT_RULE_NAME,
        vec![
            Grammar::line("bracket", BRACKET, LineShape::Bracketed)?,
            Grammar::line("colon", COLON, LineShape::Simple)?,
        ],
    )
    .with_network_indicators(&[
        "PREFERRED",
        "PARTICIPATING",
        "IN NETWORK",
        "IN-NETWORK",
        "BCBS PROVIDERS",
        "IN NET",
    ])
    .with_primary_care_keywords(&[
        "Professional (Physician) Visit - Office",
        "Professional (Physician) Visit-Office",
        "PRIMARY CARE",
        "PCP",
        "Office Visit",
        "Primary care",
        "Physician Visit",
        "PHYSICIAN OFFICE VISIT PCP",
        "Primary Care Physician",
        "PRIMARY CARE PHYSICIAN SERVICES",
    ])
    .with_urgent_care_keywords(&[
        "Emergency Room",
        "Urgent Care",
        "URGENT CARE",
        "PHYSICIAN OFFICE URGENT CARE",
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_rejects_wrong_group_count() {
        let err = Grammar::new("broken", r"([^:]+):\$?([\d.]+)", LineShape::Bracketed).unwrap_err();
        assert!(matches!(err, InsuranceError::InvalidGrammar { .. }));
    }

    #[test]
    fn test_grammar_rejects_bad_pattern() {
        assert!(Grammar::new("broken", r"([^:]+", LineShape::Simple).is_err());
    }

    #[test]
    fn test_coded_grammar_parses_code() {
        let grammar = Grammar::line("coded", CODED_BRACKET, LineShape::Coded).unwrap();
        let text = "Office Visit[PCP Copay (120) IN NETWORK]:$30.00";
        let caps = grammar.regex().captures(text).unwrap();
        assert_eq!(
            grammar.parse(&caps),
            Some(ParsedLine::Coded {
                service: "Office Visit".into(),
                detail: "PCP Copay".into(),
                code: "120".into(),
                amount: "30.00".into(),
            })
        );
    }

    #[test]
    fn test_seq_grammar_strips_sequence_number() {
        let grammar = Grammar::line("seq", SEQ_BRACKET, LineShape::Bracketed).unwrap();
        let caps = grammar
            .regex()
            .captures("PRIMARY CARE[Seq#12 IN NETWORK]:$0.00")
            .unwrap();
        assert_eq!(
            grammar.parse(&caps),
            Some(ParsedLine::Bracketed {
                service: "PRIMARY CARE".into(),
                detail: "IN NETWORK".into(),
                amount: "0.00".into(),
            })
        );
    }

    #[test]
    fn test_fingerprint_conjunction() {
        let fp = Fingerprint::any(&[&["CIGNA HEALTHSPRING"], &["CIGNA", "SEQ#"]]);
        assert!(fp.matches("CIGNA HEALTHSPRING PLAN"));
        assert!(fp.matches("CIGNA ... [SEQ#1 IN NETWORK]"));
        assert!(!fp.matches("CIGNA OPEN ACCESS"));
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = InsurerPatternRegistry::standard().unwrap();
        assert_eq!(
            registry.rule_names(),
            vec!["CIGNA", "HUMANA", "CAREFIRST", "UNITED", "SUREST", "TRICARE", "AETNA", "ALLEGIANCE", "DEFAULT"]
        );
    }
}
