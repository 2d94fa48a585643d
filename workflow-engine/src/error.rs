use crate::context::WorkflowStep;
use crate::store::StoreError;
use error_common::{codes, CodedError};
use insurance_service::InsuranceError;
use thiserror::Error;

/// Failure reported by a host collaborator (page reader, form writer, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{action}: {message}")]
pub struct HostError {
    pub action: String,
    pub message: String,
}

impl HostError {
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
        }
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    ElementWaitTimeout { what: String, waited_ms: u64 },

    #[error("Step {step} was resumed {attempts} times without progress")]
    WorkflowMaxRetriesExceeded { step: WorkflowStep, attempts: u32 },

    #[error("Workflow cancelled")]
    WorkflowCancelled,

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Step {step} failed: {source}")]
    StepFailed {
        step: WorkflowStep,
        #[source]
        source: HostError,
    },

    #[error("Workflow state error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Insurance(#[from] InsuranceError),
}

impl WorkflowError {
    pub fn step_failed(step: WorkflowStep) -> impl FnOnce(HostError) -> WorkflowError {
        move |source| WorkflowError::StepFailed { step, source }
    }
}

impl CodedError for WorkflowError {
    fn code(&self) -> &'static str {
        match self {
            WorkflowError::ElementWaitTimeout { .. } => codes::workflow::ELEMENT_WAIT_TIMEOUT,
            WorkflowError::WorkflowMaxRetriesExceeded { .. } => codes::workflow::MAX_RETRIES_EXCEEDED,
            WorkflowError::WorkflowCancelled => codes::workflow::CANCELLED,
            WorkflowError::CapabilityUnavailable(_) => codes::workflow::CAPABILITY_UNAVAILABLE,
            WorkflowError::StepFailed { .. } => codes::workflow::HOST_ACTION_FAILED,
            WorkflowError::Store(e) => e.code(),
            WorkflowError::Insurance(e) => e.code(),
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            WorkflowError::Insurance(e) => e.is_transient(),
            _ => false,
        }
    }

    fn status_message(&self) -> String {
        match self {
            WorkflowError::WorkflowCancelled => "Stopped".to_string(),
            WorkflowError::ElementWaitTimeout { what, .. } => format!("Timed out waiting for {}", what),
            WorkflowError::WorkflowMaxRetriesExceeded { step, .. } => {
                format!("Gave up: page kept reloading at {}", step)
            }
            WorkflowError::Insurance(e) => e.status_message(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
