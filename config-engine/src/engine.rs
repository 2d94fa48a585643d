// Layered configuration loading
use crate::error::{ConfigError, Result};
use crate::providers::{default_sources, ConfigSource, ENV_SEPARATOR};
use crate::settings::AutomationConfig;
use crate::validation::Validate;
use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, info};

/// Builds an [`AutomationConfig`] from defaults plus an ordered list of sources
#[derive(Debug, Clone, Default)]
pub struct ConfigEngine {
    sources: Vec<ConfigSource>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, the user's config directory, then `COPAY_*` variables
    pub fn with_default_sources() -> Self {
        Self { sources: default_sources() }
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(AutomationConfig::default()));

        for source in &self.sources {
            figment = match source {
                ConfigSource::Yaml { path, required } => {
                    if !path.exists() {
                        if *required {
                            return Err(ConfigError::SourceNotFound(path.clone()));
                        }
                        continue;
                    }
                    debug!(path = %path.display(), "merging yaml config");
                    figment.merge(Yaml::file(path))
                }
                ConfigSource::Toml { path, required } => {
                    if !path.exists() {
                        if *required {
                            return Err(ConfigError::SourceNotFound(path.clone()));
                        }
                        continue;
                    }
                    debug!(path = %path.display(), "merging toml config");
                    figment.merge(Toml::file(path))
                }
                ConfigSource::Env { prefix } => {
                    figment.merge(Env::prefixed(prefix).split(ENV_SEPARATOR))
                }
            };
        }

        Ok(figment)
    }

    /// Extract and validate
    pub fn load(&self) -> Result<AutomationConfig> {
        let config: AutomationConfig = self.figment()?.extract()?;
        config.validate()?;
        info!(
            sources = self.sources.len(),
            namespace = %config.workflow.namespace,
            "configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        let config = ConfigEngine::new().load().unwrap();
        assert_eq!(config, AutomationConfig::default());
    }

    #[test]
    fn test_yaml_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "copay.yaml",
                r#"
document_fetch:
  attempts: 3
  backoff: 2.0
workflow:
  namespace: clinicA
"#,
            )?;
            jail.set_env("COPAY_DOCUMENT_FETCH__ATTEMPTS", "4");
            jail.set_env("COPAY_POLLING__ELEMENT_TIMEOUT_MS", "5000");

            let config = ConfigEngine::new()
                .add_source(ConfigSource::file("copay.yaml"))
                .add_source(ConfigSource::env())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.document_fetch.attempts, 4);
            assert_eq!(config.document_fetch.backoff, 2.0);
            assert_eq!(config.document_fetch.initial_delay_ms, 500);
            assert_eq!(config.polling.element_timeout_ms, 5000);
            assert_eq!(config.workflow.namespace, "clinicA");
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_and_state_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "copay.toml",
                r#"
[workflow]
state_file = "state.json"
max_resume_attempts = 5

[alert_note]
alert_on_billing = false
"#,
            )?;
            let config = ConfigEngine::new()
                .add_source(ConfigSource::file("copay.toml"))
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.workflow.max_resume_attempts, 5);
            assert_eq!(config.workflow.state_file.as_deref(), Some(std::path::Path::new("state.json")));
            assert!(!config.alert_note.alert_on_billing);
            assert!(config.alert_note.alert_on_scheduling);
            Ok(())
        });
    }

    #[test]
    fn test_missing_required_file() {
        let err = ConfigEngine::new()
            .add_source(ConfigSource::yaml("/nonexistent/copay.yaml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotFound(_)));
    }

    #[test]
    fn test_missing_optional_file_is_skipped() {
        let config = ConfigEngine::new()
            .add_source(ConfigSource::optional_file("/nonexistent/copay.toml"))
            .load()
            .unwrap();
        assert_eq!(config.extraction.max_iterations_per_grammar, 500);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("COPAY_DOCUMENT_FETCH__ATTEMPTS", "0");
            let err = ConfigEngine::new()
                .add_source(ConfigSource::env())
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));
            Ok(())
        });
    }
}
