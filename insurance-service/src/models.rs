use serde::{Deserialize, Serialize};
use std::fmt;

/// Dollar copay, always rendered with two decimals (`"25.00"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(String);

impl Money {
    pub fn from_amount(amount: f64) -> Self {
        Self(format!("{:.2}", (amount * 100.0).round() / 100.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coinsurance percentage, rendered without decimals (`"20"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(String);

impl Percent {
    pub fn from_amount(amount: f64) -> Self {
        Self(format!("{:.0}", amount.round()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One grammar match before amount validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// `SERVICE:$AMOUNT`
    Simple { service: String, amount: String },
    /// `SERVICE[DETAIL]:$AMOUNT`
    Bracketed { service: String, detail: String, amount: String },
    /// `SERVICE[DETAIL (CODE)]:$AMOUNT`
    Coded { service: String, detail: String, code: String, amount: String },
}

impl ParsedLine {
    pub fn service(&self) -> &str {
        match self {
            ParsedLine::Simple { service, .. }
            | ParsedLine::Bracketed { service, .. }
            | ParsedLine::Coded { service, .. } => service,
        }
    }

    /// Detail text as the scorer sees it; coded lines fold the code back in
    pub fn details(&self) -> String {
        match self {
            ParsedLine::Simple { .. } => String::new(),
            ParsedLine::Bracketed { detail, .. } => detail.clone(),
            ParsedLine::Coded { detail, code, .. } => format!("{} ({})", detail, code),
        }
    }

    pub fn raw_amount(&self) -> &str {
        match self {
            ParsedLine::Simple { amount, .. }
            | ParsedLine::Bracketed { amount, .. }
            | ParsedLine::Coded { amount, .. } => amount,
        }
    }
}

/// A validated cost-share line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub service: String,
    pub details: String,
    /// Always within `[0, max_amount]`
    pub amount: f64,
    pub is_percentage: bool,
}

impl Candidate {
    pub fn display_amount(&self) -> String {
        if self.is_percentage {
            format!("{}%", Percent::from_amount(self.amount))
        } else {
            format!("${}", Money::from_amount(self.amount))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: i32,
    pub exact_match: bool,
}

/// Whether the document yielded any usable line at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Matched,
    /// No grammar matched, even after the default rule set was tried
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub primary_copay: Option<Money>,
    pub primary_coinsurance: Option<Percent>,
    pub urgent_copay: Option<Money>,
    pub urgent_coinsurance: Option<Percent>,
    pub candidates: Vec<Candidate>,
    pub outcome: ExtractionOutcome,
    /// Name of the rule set that produced `candidates`
    pub rule_set: String,
    pub used_default_fallback: bool,
    pub primary_scored: Vec<ScoredCandidate>,
    pub urgent_scored: Vec<ScoredCandidate>,
}

impl ExtractionResult {
    pub fn empty(rule_set: impl Into<String>) -> Self {
        Self {
            primary_copay: None,
            primary_coinsurance: None,
            urgent_copay: None,
            urgent_coinsurance: None,
            candidates: Vec::new(),
            outcome: ExtractionOutcome::NoCandidates,
            rule_set: rule_set.into(),
            used_default_fallback: false,
            primary_scored: Vec::new(),
            urgent_scored: Vec::new(),
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary_copay.is_some() || self.primary_coinsurance.is_some()
    }
}

/// Which payer on the patient's record a verification targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceLevel {
    #[default]
    Primary,
    Secondary,
}

impl InsuranceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceLevel::Primary => "primary",
            InsuranceLevel::Secondary => "secondary",
        }
    }
}

impl fmt::Display for InsuranceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
