use regex::Regex;
use lazy_static::lazy_static;
use sha2::{Sha256, Digest};
use base64::{Engine as _, engine::general_purpose};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"(?:\+1[-.\s]?)?\(?\b([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b").unwrap();
    static ref SSN_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
    static ref DOB_REGEX: Regex = Regex::new(r"(?i)\b(DOB|DATE OF BIRTH|BIRTH DATE)(\s*:?\s*)\d{1,2}/\d{1,2}/\d{2,4}").unwrap();
    static ref MEMBER_ID_REGEX: Regex = Regex::new(r"(?i)\b((?:MEMBER|SUBSCRIBER|POLICY)\s*(?:ID|#|NUMBER|NO\.?))(\s*:?\s*)[A-Z0-9][A-Z0-9-]{3,}").unwrap();
    static ref MRN_REGEX: Regex = Regex::new(r"(?i)\b(MRN)(\s*[:#]?\s*)\d+").unwrap();
    static ref PATIENT_NAME_REGEX: Regex = Regex::new(r"\b((?i:PATIENT NAME|PATIENT|SUBSCRIBER NAME|MEMBER NAME))(\s*:\s*)[A-Z][A-Za-z'-]+(?:,?\s+[A-Z][A-Za-z'-]+){0,2}").unwrap();
}

/// PHI/PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_dates_of_birth: bool,
    pub redact_member_ids: bool,
    pub redact_mrn: bool,
    pub redact_patient_names: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_dates_of_birth: true,
            redact_member_ids: true,
            redact_mrn: true,
            redact_patient_names: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// PHI/PII redactor for log messages and document snippets
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Labelled identifiers go first so their digits are not claimed by
        // the phone/SSN patterns.
        if self.config.redact_patient_names {
            result = self.redact_labelled(&PATIENT_NAME_REGEX, &result, "NAME");
        }

        if self.config.redact_member_ids {
            result = self.redact_labelled(&MEMBER_ID_REGEX, &result, "ID");
        }

        if self.config.redact_mrn {
            result = self.redact_labelled(&MRN_REGEX, &result, "MRN");
        }

        if self.config.redact_dates_of_birth {
            result = self.redact_labelled(&DOB_REGEX, &result, "DOB");
        }

        if self.config.redact_ssn {
            result = self.redact_whole(&SSN_REGEX, &result, "SSN", "***-**-****");
        }

        if self.config.redact_phones {
            result = self.redact_whole(&PHONE_REGEX, &result, "PHONE", "(***) ***-****");
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Redact, then cut to at most `max_chars` characters.
    pub fn redact_snippet(&self, text: &str, max_chars: usize) -> String {
        truncate_chars(self.redact(text), max_chars)
    }

    /// Patterns whose first group is a label and second the separator; the
    /// label survives so log readers still know what was removed.
    fn redact_labelled(&self, pattern: &Regex, text: &str, tag: &str) -> String {
        pattern.replace_all(text, |caps: &regex::Captures| {
            let label = caps.get(1).map_or("", |m| m.as_str());
            let separator = caps.get(2).map_or("", |m| m.as_str());
            let whole = caps.get(0).map_or("", |m| m.as_str());
            if self.config.hash_for_correlation {
                format!("{}{}{}[{}]", label, separator, tag, self.hash_value(whole))
            } else {
                format!("{}{}[REDACTED]", label, separator)
            }
        }).to_string()
    }

    fn redact_whole(&self, pattern: &Regex, text: &str, tag: &str, mask: &str) -> String {
        pattern.replace_all(text, |caps: &regex::Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            if self.config.hash_for_correlation {
                format!("{}[{}]", tag, self.hash_value(whole))
            } else {
                mask.to_string()
            }
        }).to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX.replace_all(text, |caps: &regex::Captures| {
            let email = caps.get(0).map_or("", |m| m.as_str());
            if self.config.hash_for_correlation {
                format!("EMAIL[{}]", self.hash_value(email))
            } else {
                match email.split_once('@') {
                    Some((user, domain)) => format!(
                        "{}***@{}***",
                        user.chars().next().unwrap_or('*'),
                        domain.chars().next().unwrap_or('*')
                    ),
                    None => "***@***.com".to_string(),
                }
            }
        }).to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        // First 8 bytes keep the tag short
        general_purpose::STANDARD.encode(result.get(..8).unwrap_or(result.as_slice()))
    }
}

pub(crate) fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut snippet: String = text.chars().take(max_chars).collect();
    snippet.push_str("...");
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masking_redactor() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_member_id_redaction_keeps_label() {
        let text = "Member ID: XEH123456789 Group 0042 Urgent Care[IN NETWORK]:$50.00";
        let redacted = masking_redactor().redact(text);
        assert!(redacted.starts_with("Member ID: [REDACTED]"));
        assert!(!redacted.contains("XEH123456789"));
        assert!(redacted.contains("Urgent Care[IN NETWORK]:$50.00"));
    }

    #[test]
    fn test_date_of_birth_redaction() {
        let redacted = masking_redactor().redact("DOB: 04/12/1961 Plan: PPO");
        assert_eq!(redacted, "DOB: [REDACTED] Plan: PPO");
    }

    #[test]
    fn test_patient_name_redaction() {
        let redacted = masking_redactor().redact("Patient: Doe, Jane Coverage Active");
        assert!(!redacted.contains("Doe"));
        assert!(redacted.starts_with("Patient: [REDACTED]"));
    }

    #[test]
    fn test_phone_and_ssn_redaction() {
        let redacted = masking_redactor().redact("Call (555) 123-4567 re 123-45-6789");
        assert!(redacted.contains("(***) ***-****"));
        assert!(redacted.contains("***-**-****"));
    }

    #[test]
    fn test_dollar_amounts_survive() {
        let text = "Professional (Physician) Visit - Office[PREFERRED]:$1,250.00";
        assert_eq!(masking_redactor().redact(text), text);
    }

    #[test]
    fn test_hashing_is_stable_for_correlation() {
        let redactor = PiiRedactor::default();
        let first = redactor.redact("MRN 445566");
        let second = redactor.redact("MRN 445566");
        assert_eq!(first, second);
        assert!(first.starts_with("MRN MRN["));
    }

    #[test]
    fn test_snippet_is_truncated_after_redaction() {
        let snippet = masking_redactor().redact_snippet("SSN 123-45-6789 and more text", 10);
        assert_eq!(snippet, "SSN ***-**...");
    }
}
