use error_common::{codes, CodedError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("cannot create log directory: {0}")]
    LogDirectory(#[from] std::io::Error),
}

impl CodedError for LoggerError {
    fn code(&self) -> &'static str {
        codes::logging::INIT_FAILED
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
