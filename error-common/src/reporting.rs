// Error reporting utilities
// Turns coded errors into operator-facing reports and logs them

use crate::context::ErrorContext;
use crate::types::{CodedError, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serializable record of a failure, suitable for a status panel or a log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub transient: bool,
    pub context: ErrorContext,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, error: &dyn CodedError, context: &ErrorContext) -> ErrorReport {
        let severity = if error.is_transient() {
            Severity::Warning
        } else {
            Severity::Error
        };

        let report = ErrorReport {
            code: error.code().to_string(),
            message: error.status_message(),
            severity,
            transient: error.is_transient(),
            context: context.clone(),
            occurred_at: Utc::now(),
        };

        match severity {
            Severity::Warning => tracing::warn!(
                error_code = %report.code,
                run_id = report.context.run_id.as_deref().unwrap_or("-"),
                step = report.context.step.as_deref().unwrap_or("-"),
                "{}",
                report.message
            ),
            Severity::Error => tracing::error!(
                error_code = %report.code,
                run_id = report.context.run_id.as_deref().unwrap_or("-"),
                step = report.context.step.as_deref().unwrap_or("-"),
                "{}",
                report.message
            ),
        }

        report
    }

    /// Report as JSON, used by the CLI's `--json` output
    pub fn report_json(
        &self,
        error: &dyn CodedError,
        context: &ErrorContext,
    ) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.report(error, context))
    }
}
