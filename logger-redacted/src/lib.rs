//! Tracing setup with PHI/PII redaction for eligibility document text.
//!
//! Eligibility documents carry member identifiers, dates of birth and names.
//! Anything derived from document text goes through [`redact`] or one of the
//! `redacted_*!` macros before it reaches a log line.
//!
//! ```rust
//! use logger_redacted::redact;
//!
//! let line = redact("Member ID: XEH123456789 Urgent Care[IN NETWORK]:$50.00");
//! assert!(!line.contains("XEH123456789"));
//! assert!(line.contains("$50.00"));
//! ```

pub mod config;
pub mod error;
pub mod macros;
pub mod redactor;
pub mod subscriber;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use redactor::{PiiRedactor, RedactionConfig};
pub use subscriber::init_logging;

#[doc(hidden)]
pub use tracing;

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};

/// Longest document excerpt the macros attach to a log line
pub const SNIPPET_CHARS: usize = 200;

lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::default();
}

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn set_redaction_enabled(enabled: bool) {
    REDACTION_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn redaction_enabled() -> bool {
    REDACTION_ENABLED.load(Ordering::Relaxed)
}

/// Redact with the process-wide default redactor
pub fn redact(text: &str) -> String {
    if redaction_enabled() {
        DEFAULT_REDACTOR.redact(text)
    } else {
        text.to_string()
    }
}

pub fn redact_snippet(text: &str, max_chars: usize) -> String {
    if redaction_enabled() {
        DEFAULT_REDACTOR.redact_snippet(text, max_chars)
    } else {
        redactor::truncate_chars(text.to_string(), max_chars)
    }
}
