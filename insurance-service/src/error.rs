use error_common::{codes, CodedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsuranceError {
    #[error("Document fetch timed out after {attempts} attempts: {url}")]
    DocumentFetchTimeout { url: String, attempts: u32 },

    #[error("Document never became available as a PDF after {attempts} attempts: {url}")]
    DocumentFormatUnavailable { url: String, attempts: u32 },

    #[error("Document fetch failed after {attempts} attempts: {reason}")]
    DocumentFetchExhausted { attempts: u32, reason: String },

    #[error("Document could not be decoded: {0}")]
    DocumentDecode(String),

    #[error("Invalid grammar '{name}': {reason}")]
    InvalidGrammar { name: String, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network error: HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },
}

impl CodedError for InsuranceError {
    fn code(&self) -> &'static str {
        match self {
            InsuranceError::DocumentFetchTimeout { .. } => codes::document::FETCH_TIMEOUT,
            InsuranceError::DocumentFormatUnavailable { .. } => codes::document::FORMAT_UNAVAILABLE,
            InsuranceError::DocumentFetchExhausted { .. } => codes::document::FETCH_EXHAUSTED,
            InsuranceError::DocumentDecode(_) => codes::document::DECODE_FAILED,
            InsuranceError::InvalidGrammar { .. } => codes::extraction::INVALID_GRAMMAR,
            InsuranceError::Network(_) | InsuranceError::HttpStatus { .. } => codes::document::NETWORK,
        }
    }

    fn is_transient(&self) -> bool {
        matches!(
            self,
            InsuranceError::DocumentFetchTimeout { .. }
                | InsuranceError::DocumentFormatUnavailable { .. }
                | InsuranceError::Network(_)
                | InsuranceError::HttpStatus { .. }
        )
    }

    fn status_message(&self) -> String {
        match self {
            InsuranceError::DocumentFetchTimeout { .. } => "Eligibility document timed out".to_string(),
            InsuranceError::DocumentFormatUnavailable { .. } => {
                "Eligibility document was not ready".to_string()
            }
            InsuranceError::DocumentFetchExhausted { .. } => {
                "Could not download eligibility document".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type InsuranceResult<T> = Result<T, InsuranceError>;
