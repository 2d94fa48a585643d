// Configuration validation
use crate::error::{ConfigError, Result};
use crate::settings::{AutomationConfig, DocumentFetchConfig, ExtractionConfig, PollingConfig, WorkflowConfig};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for AutomationConfig {
    fn validate(&self) -> Result<()> {
        self.document_fetch.validate()?;
        self.polling.validate()?;
        self.extraction.validate()?;
        self.workflow.validate()
    }
}

impl Validate for DocumentFetchConfig {
    fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(ConfigError::invalid("document_fetch.attempts", "must be at least 1"));
        }
        if !(self.backoff >= 1.0) {
            return Err(ConfigError::invalid(
                "document_fetch.backoff",
                format!("must be >= 1.0, got {}", self.backoff),
            ));
        }
        if self.timeout_per_try_ms == 0 {
            return Err(ConfigError::invalid("document_fetch.timeout_per_try_ms", "must be positive"));
        }
        Ok(())
    }
}

impl Validate for PollingConfig {
    fn validate(&self) -> Result<()> {
        check_interval(
            "polling.element_interval_ms",
            self.element_interval_ms,
            self.element_timeout_ms,
        )?;
        check_interval(
            "polling.document_poll_interval_ms",
            self.document_poll_interval_ms,
            self.primary_document_timeout_ms,
        )?;
        check_interval(
            "polling.document_poll_interval_ms",
            self.document_poll_interval_ms,
            self.secondary_document_timeout_ms,
        )?;
        if self.navigation_timeout_ms == 0 {
            return Err(ConfigError::invalid("polling.navigation_timeout_ms", "must be positive"));
        }
        // The page location is polled at the element interval
        check_interval(
            "polling.element_interval_ms",
            self.element_interval_ms,
            self.navigation_timeout_ms,
        )
    }
}

impl Validate for ExtractionConfig {
    fn validate(&self) -> Result<()> {
        if self.max_iterations_per_grammar == 0 {
            return Err(ConfigError::invalid(
                "extraction.max_iterations_per_grammar",
                "must be at least 1",
            ));
        }
        if !(self.max_amount > 0.0) {
            return Err(ConfigError::invalid("extraction.max_amount", "must be positive"));
        }
        Ok(())
    }
}

impl Validate for WorkflowConfig {
    fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::invalid("workflow.namespace", "must not be empty"));
        }
        Ok(())
    }
}

fn check_interval(field: &'static str, interval_ms: u64, timeout_ms: u64) -> Result<()> {
    if interval_ms == 0 {
        return Err(ConfigError::invalid(field, "must be positive"));
    }
    if interval_ms > timeout_ms {
        return Err(ConfigError::invalid(
            field,
            format!("interval {}ms exceeds timeout {}ms", interval_ms, timeout_ms),
        ));
    }
    Ok(())
}
