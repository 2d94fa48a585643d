use error_common::{codes, CodedError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Configuration parsing failed: {0}")]
    ParseError(Box<figment::Error>),

    #[error("Configuration validation failed: {field}: {reason}")]
    ValidationError { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(Box::new(err))
    }
}

impl CodedError for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            ConfigError::SourceNotFound(_) | ConfigError::ParseError(_) => codes::config::LOAD_FAILED,
            ConfigError::ValidationError { .. } => codes::config::VALIDATION_FAILED,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
