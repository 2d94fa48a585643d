use chrono::{DateTime, Utc};
use insurance_service::{ExtractionResult, InsuranceLevel, Money, Percent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a workflow run currently is. `Idle` is both initial and terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    #[default]
    Idle,
    VerifyingPrimary,
    ExtractingPrimary,
    VerifyingSecondary,
    ExtractingSecondary,
    RecordingBalance,
    CreatingNote,
    FillingNote,
    NavigatingToForm,
    OpeningFormEditor,
    FillingAndSaving,
    ReturningHome,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Idle => "idle",
            WorkflowStep::VerifyingPrimary => "verifying_primary",
            WorkflowStep::ExtractingPrimary => "extracting_primary",
            WorkflowStep::VerifyingSecondary => "verifying_secondary",
            WorkflowStep::ExtractingSecondary => "extracting_secondary",
            WorkflowStep::RecordingBalance => "recording_balance",
            WorkflowStep::CreatingNote => "creating_note",
            WorkflowStep::FillingNote => "filling_note",
            WorkflowStep::NavigatingToForm => "navigating_to_form",
            WorkflowStep::OpeningFormEditor => "opening_form_editor",
            WorkflowStep::FillingAndSaving => "filling_and_saving",
            WorkflowStep::ReturningHome => "returning_home",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowStep::Idle)
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four cost-share fields carried between page loads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostShare {
    pub primary_copay: Option<Money>,
    pub primary_coinsurance: Option<Percent>,
    pub urgent_copay: Option<Money>,
    pub urgent_coinsurance: Option<Percent>,
}

impl CostShare {
    pub fn has_primary(&self) -> bool {
        self.primary_copay.is_some() || self.primary_coinsurance.is_some()
    }

    /// Fill only the fields that are still empty. Returns whether anything
    /// was taken from `other`.
    pub fn back_fill(&mut self, other: &CostShare) -> bool {
        let mut used = false;
        used |= fill(&mut self.primary_copay, &other.primary_copay);
        used |= fill(&mut self.primary_coinsurance, &other.primary_coinsurance);
        used |= fill(&mut self.urgent_copay, &other.urgent_copay);
        used |= fill(&mut self.urgent_coinsurance, &other.urgent_coinsurance);
        used
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) -> bool {
    if slot.is_none() && value.is_some() {
        *slot = value.clone();
        true
    } else {
        false
    }
}

impl From<&ExtractionResult> for CostShare {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            primary_copay: result.primary_copay.clone(),
            primary_coinsurance: result.primary_coinsurance.clone(),
            urgent_copay: result.urgent_copay.clone(),
            urgent_coinsurance: result.urgent_coinsurance.clone(),
        }
    }
}

/// Everything a workflow run needs to survive a full page reload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub run_id: String,
    pub current_step: WorkflowStep,
    pub extraction: CostShare,
    /// Which insurance row the billing form edit targets
    pub insurance_level: InsuranceLevel,
    pub guarantor_balance: Option<String>,
    pub next_appointment: Option<String>,
    /// Consecutive resumes of `current_step`
    pub retry_count: u32,
    pub started_at: Option<DateTime<Utc>>,
}

impl WorkflowContext {
    /// A fresh run positioned at primary verification
    pub fn new_run() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            current_step: WorkflowStep::VerifyingPrimary,
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Move to `step`; the retry counter restarts when the step changes
    pub fn advance_to(&mut self, step: WorkflowStep) {
        if self.current_step != step {
            self.retry_count = 0;
        }
        self.current_step = step;
    }

    pub fn is_active(&self) -> bool {
        !self.current_step.is_idle()
    }
}
