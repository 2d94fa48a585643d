use serde::{Deserialize, Serialize};
use std::fmt;

/// Implemented by every error enum in the workspace.
///
/// `code` must be one of the constants in [`crate::codes`]. Transient errors
/// are the ones a caller may retry locally (fetch and format errors inside the
/// document source); everything else is fatal for the current workflow run.
pub trait CodedError: std::error::Error {
    fn code(&self) -> &'static str;

    fn is_transient(&self) -> bool {
        false
    }

    /// Short text for the operator's status panel.
    fn status_message(&self) -> String {
        self.to_string()
    }
}

/// Coarse severity used when a report is surfaced to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

