//! Host capabilities the workflow drives but does not implement.
//!
//! Every call may be slow, and any call that submits or navigates may tear the
//! page down before it returns. Steps that invoke such calls checkpoint their
//! successor first.

use crate::error::HostResult;
use crate::note::AlertNote;
use async_trait::async_trait;
use insurance_service::InsuranceLevel;
use std::fmt;
use std::sync::Arc;

/// Result of an action the host may not be able to offer on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Performed,
    Unavailable,
}

#[async_trait]
pub trait VerificationTrigger: Send + Sync {
    /// Fire-and-forget; the host usually reloads afterwards
    async fn trigger_verification(&self, level: InsuranceLevel) -> HostResult<ActionOutcome>;

    /// URL of the eligibility document once the host has one to offer
    async fn eligibility_document_url(&self, level: InsuranceLevel) -> HostResult<Option<String>>;
}

/// One row of the patient's appointment list, as displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRow {
    /// `MM/DD/YYYY hh:mm AM`
    pub date_time: String,
    pub appointment_type: String,
    pub resource: String,
}

#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read_labeled_value(&self, label: &str) -> HostResult<Option<String>>;

    async fn appointments(&self) -> HostResult<Vec<AppointmentRow>>;
}

/// Billing form fields written by the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Copay,
    Coinsurance,
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Copay => "COPAY",
            FormField::Coinsurance => "CO_INS",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait FormWriter: Send + Sync {
    async fn open_editor(&self, level: InsuranceLevel) -> HostResult<ActionOutcome>;

    async fn field_present(&self, field: FormField) -> HostResult<bool>;

    /// An empty value clears the field
    async fn write_field(&self, field: FormField, value: &str) -> HostResult<()>;

    async fn submit(&self) -> HostResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    PatientDetails,
    InsuranceInformation,
    PatientChart,
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::PatientDetails => write!(f, "patient details"),
            NavigationTarget::InsuranceInformation => write!(f, "insurance information"),
            NavigationTarget::PatientChart => write!(f, "patient chart"),
        }
    }
}

#[async_trait]
pub trait Navigator: Send + Sync {
    /// Page the host is currently showing; `None` while it has not settled
    async fn location(&self) -> HostResult<Option<NavigationTarget>>;

    async fn navigate(&self, target: NavigationTarget) -> HostResult<()>;
}

#[async_trait]
pub trait NoteWriter: Send + Sync {
    async fn open_note_editor(&self) -> HostResult<ActionOutcome>;

    async fn note_editor_ready(&self) -> HostResult<bool>;

    async fn save_note(&self, note: &AlertNote) -> HostResult<()>;
}

/// Everything the step functions call out to
#[derive(Clone)]
pub struct Collaborators {
    pub verification: Arc<dyn VerificationTrigger>,
    pub page: Arc<dyn PageReader>,
    pub form: Arc<dyn FormWriter>,
    pub navigator: Arc<dyn Navigator>,
    /// Alert notes are skipped when the host offers no note editor
    pub notes: Option<Arc<dyn NoteWriter>>,
}
