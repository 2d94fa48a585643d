// Logger configuration
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    pub level: String,
    /// Emit bunyan-style JSON instead of human readable lines
    pub json: bool,
    pub redaction_enabled: bool,
    /// When set, logs also go to a daily rolling file in this directory
    pub log_dir: Option<PathBuf>,
    pub file_prefix: String,
    pub service_name: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            redaction_enabled: true,
            log_dir: None,
            file_prefix: "copay-autofill.log".to_string(),
            service_name: "copay-autofill".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}
