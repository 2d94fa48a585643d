// Typed configuration sections
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the copay autofill automation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub document_fetch: DocumentFetchConfig,
    pub polling: PollingConfig,
    pub extraction: ExtractionConfig,
    pub workflow: WorkflowConfig,
    pub alert_note: AlertNoteConfig,
    pub logging: LoggerConfig,
}

/// Retry policy for fetching an eligibility document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFetchConfig {
    pub attempts: u32,
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff: f64,
    pub timeout_per_try_ms: u64,
}

impl Default for DocumentFetchConfig {
    fn default() -> Self {
        Self {
            attempts: 6,
            initial_delay_ms: 500,
            backoff: 1.6,
            timeout_per_try_ms: 12_000,
        }
    }
}

impl DocumentFetchConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn timeout_per_try(&self) -> Duration {
        Duration::from_millis(self.timeout_per_try_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub element_interval_ms: u64,
    pub element_timeout_ms: u64,
    pub document_poll_interval_ms: u64,
    pub primary_document_timeout_ms: u64,
    pub secondary_document_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            element_interval_ms: 200,
            element_timeout_ms: 15_000,
            document_poll_interval_ms: 2_000,
            primary_document_timeout_ms: 45_000,
            secondary_document_timeout_ms: 30_000,
            navigation_timeout_ms: 10_000,
        }
    }
}

impl PollingConfig {
    pub fn element_interval(&self) -> Duration {
        Duration::from_millis(self.element_interval_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn document_poll_interval(&self) -> Duration {
        Duration::from_millis(self.document_poll_interval_ms)
    }

    pub fn primary_document_timeout(&self) -> Duration {
        Duration::from_millis(self.primary_document_timeout_ms)
    }

    pub fn secondary_document_timeout(&self) -> Duration {
        Duration::from_millis(self.secondary_document_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Upper bound on matches consumed from one grammar over one document
    pub max_iterations_per_grammar: usize,
    /// Amounts above this are treated as misparses and discarded
    pub max_amount: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_grammar: 500,
            max_amount: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Prefix for every persisted key
    pub namespace: String,
    pub max_resume_attempts: u32,
    /// JSON file backing the key-value store; in-memory when unset
    pub state_file: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            namespace: "tmCopayAutofill".to_string(),
            max_resume_attempts: 3,
            state_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertNoteConfig {
    pub enabled: bool,
    pub alert_on_scheduling: bool,
    pub alert_on_billing: bool,
}

impl Default for AlertNoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alert_on_scheduling: true,
            alert_on_billing: true,
        }
    }
}
