use error_common::ErrorReport;
use tracing::{error, info};

/// Operator-facing status line (the host's status panel)
pub trait StatusReporter: Send + Sync {
    fn status(&self, message: &str);

    fn failure(&self, report: &ErrorReport);
}

/// Status sink that only logs
#[derive(Debug, Clone, Default)]
pub struct TracingStatusReporter;

impl StatusReporter for TracingStatusReporter {
    fn status(&self, message: &str) {
        info!(target: "copay_status", "{}", message);
    }

    fn failure(&self, report: &ErrorReport) {
        error!(target: "copay_status", error_code = %report.code, "{}", report.message);
    }
}
