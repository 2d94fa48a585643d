//! Step functions.
//!
//! Each step receives its own copy of the context and either hands the next
//! context straight back ([`Transition::Continue`]) or checkpoints its
//! successor and asks the host for something that reloads the page
//! ([`Transition::AwaitReload`]). Nothing a step holds survives a reload
//! except what it saved.

use crate::collaborators::{
    ActionOutcome, Collaborators, FormField, FormWriter, NavigationTarget, Navigator, NoteWriter,
    VerificationTrigger,
};
use crate::context::{CostShare, WorkflowContext, WorkflowStep};
use crate::error::{HostResult, Result, WorkflowError};
use crate::note::{format_alert_note, AlertNote};
use crate::page_values::{next_appointment_summary, parse_guarantor_balance, GUARANTOR_BALANCE_LABEL};
use crate::runtime::WorkflowRuntime;
use crate::status::StatusReporter;
use crate::store::WorkflowStateStore;
use crate::wait::{try_wait_until, WaitError};
use chrono::NaiveDate;
use config_engine::AutomationConfig;
use insurance_service::{InsuranceLevel, InsuranceService};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Run the next step in this page load
    Continue(WorkflowContext),
    /// The successor is persisted; it runs on the next resume
    AwaitReload(WorkflowStep),
    /// Terminal success; persisted state is already gone
    Complete,
}

/// Everything a step may touch
pub struct StepEnv<'a> {
    pub collaborators: &'a Collaborators,
    pub store: &'a WorkflowStateStore,
    pub insurance: &'a InsuranceService,
    pub config: &'a AutomationConfig,
    pub status: &'a dyn StatusReporter,
    pub runtime: &'a WorkflowRuntime,
    pub today: NaiveDate,
}

impl StepEnv<'_> {
    /// Save `ctx` unless a stop was requested since the step started. A
    /// stop clears the store, so writing after it would revive the run.
    async fn persist(&self, ctx: &WorkflowContext) -> Result<()> {
        if self.runtime.is_cancelled() {
            return Err(WorkflowError::WorkflowCancelled);
        }
        self.store.save(ctx).await?;
        Ok(())
    }

    async fn checkpoint(&self, ctx: &mut WorkflowContext, next: WorkflowStep) -> Result<()> {
        ctx.advance_to(next);
        self.persist(ctx).await
    }
}

/// Dispatch to the function for `step`
pub async fn run_step(step: WorkflowStep, ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    match step {
        WorkflowStep::Idle => Ok(Transition::Complete),
        WorkflowStep::VerifyingPrimary => verifying_primary(ctx, env).await,
        WorkflowStep::ExtractingPrimary => extracting_primary(ctx, env).await,
        WorkflowStep::VerifyingSecondary => verifying_secondary(ctx, env).await,
        WorkflowStep::ExtractingSecondary => extracting_secondary(ctx, env).await,
        WorkflowStep::RecordingBalance => recording_balance(ctx, env).await,
        WorkflowStep::CreatingNote => creating_note(ctx, env).await,
        WorkflowStep::FillingNote => filling_note(ctx, env).await,
        WorkflowStep::NavigatingToForm => navigating_to_form(ctx, env).await,
        WorkflowStep::OpeningFormEditor => opening_form_editor(ctx, env).await,
        WorkflowStep::FillingAndSaving => filling_and_saving(ctx, env).await,
        WorkflowStep::ReturningHome => returning_home(ctx, env).await,
    }
}

/// Poll a host probe, mapping timeout and probe failure to workflow errors
async fn wait_for<T, F, Fut>(
    step: WorkflowStep,
    what: &str,
    interval: Duration,
    timeout: Duration,
    probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HostResult<Option<T>>>,
{
    try_wait_until(interval, timeout, probe)
        .await
        .map_err(|e| match e {
            WaitError::TimedOut(t) => WorkflowError::ElementWaitTimeout {
                what: what.to_string(),
                waited_ms: t.waited_ms(),
            },
            WaitError::Probe(source) => WorkflowError::StepFailed { step, source },
        })
}

async fn document_url(
    step: WorkflowStep,
    env: &StepEnv<'_>,
    level: InsuranceLevel,
    timeout: Duration,
) -> Result<String> {
    let trigger: &dyn VerificationTrigger = env.collaborators.verification.as_ref();
    wait_for(
        step,
        &format!("{} eligibility document", level),
        env.config.polling.document_poll_interval(),
        timeout,
        move || trigger.eligibility_document_url(level),
    )
    .await
}

async fn verifying_primary(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::VerifyingPrimary;
    env.status.status("Verifying primary insurance...");
    env.checkpoint(&mut ctx, WorkflowStep::ExtractingPrimary).await?;

    let outcome = env
        .collaborators
        .verification
        .trigger_verification(InsuranceLevel::Primary)
        .await
        .map_err(WorkflowError::step_failed(step))?;

    match outcome {
        ActionOutcome::Performed => Ok(Transition::AwaitReload(WorkflowStep::ExtractingPrimary)),
        ActionOutcome::Unavailable => Err(WorkflowError::CapabilityUnavailable(
            "primary insurance verification".to_string(),
        )),
    }
}

async fn extracting_primary(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::ExtractingPrimary;
    env.status.status("Reading primary eligibility document...");

    let url = document_url(
        step,
        env,
        InsuranceLevel::Primary,
        env.config.polling.primary_document_timeout(),
    )
    .await?;
    let result = env.insurance.verify_document(&url).await?;

    ctx.extraction = CostShare::from(&result);
    ctx.insurance_level = InsuranceLevel::Primary;

    if ctx.extraction.has_primary() {
        ctx.advance_to(WorkflowStep::RecordingBalance);
    } else {
        info!(run_id = %ctx.run_id, rule_set = %result.rule_set, "no primary cost share found, trying secondary");
        ctx.advance_to(WorkflowStep::VerifyingSecondary);
    }
    Ok(Transition::Continue(ctx))
}

async fn verifying_secondary(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::VerifyingSecondary;
    env.status.status("Verifying secondary insurance...");
    env.checkpoint(&mut ctx, WorkflowStep::ExtractingSecondary).await?;

    let outcome = env
        .collaborators
        .verification
        .trigger_verification(InsuranceLevel::Secondary)
        .await
        .map_err(WorkflowError::step_failed(step))?;

    match outcome {
        ActionOutcome::Performed => Ok(Transition::AwaitReload(WorkflowStep::ExtractingSecondary)),
        ActionOutcome::Unavailable => {
            warn!(run_id = %ctx.run_id, "no secondary insurance on record");
            ctx.advance_to(WorkflowStep::RecordingBalance);
            Ok(Transition::Continue(ctx))
        }
    }
}

/// Secondary results are optional: a missing or unreadable document leaves
/// the primary values as they were.
async fn extracting_secondary(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::ExtractingSecondary;
    env.status.status("Reading secondary eligibility document...");

    let url = document_url(
        step,
        env,
        InsuranceLevel::Secondary,
        env.config.polling.secondary_document_timeout(),
    )
    .await;

    let secondary = match url {
        Ok(url) => match env.insurance.verify_document(&url).await {
            Ok(result) => Some(CostShare::from(&result)),
            Err(e) => {
                warn!(run_id = %ctx.run_id, error = %e, "secondary document unreadable");
                None
            }
        },
        Err(e) => {
            warn!(run_id = %ctx.run_id, error = %e, "secondary document unavailable");
            None
        }
    };

    if let Some(secondary) = secondary {
        if ctx.extraction.back_fill(&secondary) {
            ctx.insurance_level = InsuranceLevel::Secondary;
        }
    }

    ctx.advance_to(WorkflowStep::RecordingBalance);
    Ok(Transition::Continue(ctx))
}

async fn recording_balance(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::RecordingBalance;
    let page = &env.collaborators.page;

    let raw = page
        .read_labeled_value(GUARANTOR_BALANCE_LABEL)
        .await
        .map_err(WorkflowError::step_failed(step))?;
    let balance = parse_guarantor_balance(raw.as_deref());

    let rows = page.appointments().await.map_err(WorkflowError::step_failed(step))?;
    let next_appointment = next_appointment_summary(&rows, env.today);

    env.status.status(&format!("Patient Balance: {}", balance));
    ctx.guarantor_balance = Some(balance);
    ctx.next_appointment = Some(next_appointment);

    let next = if env.config.alert_note.enabled && env.collaborators.notes.is_some() {
        WorkflowStep::CreatingNote
    } else {
        WorkflowStep::NavigatingToForm
    };
    ctx.advance_to(next);
    Ok(Transition::Continue(ctx))
}

fn note_writer<'a>(env: &StepEnv<'a>) -> Option<&'a dyn NoteWriter> {
    env.collaborators.notes.as_deref()
}

async fn creating_note(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::CreatingNote;
    let Some(notes) = note_writer(env) else {
        ctx.advance_to(WorkflowStep::NavigatingToForm);
        return Ok(Transition::Continue(ctx));
    };

    // The editor may open in place or after a reload; either way the note
    // is filled by the next step.
    env.checkpoint(&mut ctx, WorkflowStep::FillingNote).await?;
    match notes.open_note_editor().await.map_err(WorkflowError::step_failed(step))? {
        ActionOutcome::Performed => Ok(Transition::Continue(ctx)),
        ActionOutcome::Unavailable => {
            warn!(run_id = %ctx.run_id, "alert note editor unavailable, skipping note");
            ctx.advance_to(WorkflowStep::NavigatingToForm);
            Ok(Transition::Continue(ctx))
        }
    }
}

async fn filling_note(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::FillingNote;
    let Some(notes) = note_writer(env) else {
        ctx.advance_to(WorkflowStep::NavigatingToForm);
        return Ok(Transition::Continue(ctx));
    };

    wait_for(
        step,
        "alert note editor",
        env.config.polling.element_interval(),
        env.config.polling.element_timeout(),
        move || async move { notes.note_editor_ready().await.map(|ready| ready.then_some(())) },
    )
    .await?;

    let body = format_alert_note(
        &ctx.extraction,
        ctx.guarantor_balance.as_deref(),
        ctx.next_appointment.as_deref(),
        env.today,
    );
    let note = AlertNote::new(body, &env.config.alert_note);

    env.checkpoint(&mut ctx, WorkflowStep::NavigatingToForm).await?;
    notes.save_note(&note).await.map_err(WorkflowError::step_failed(step))?;
    env.status.status("Alert note saved");
    Ok(Transition::Continue(ctx))
}

/// Chart → patient details → insurance information, one reload per hop
async fn navigating_to_form(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::NavigatingToForm;
    let navigator: &dyn Navigator = env.collaborators.navigator.as_ref();

    let location = wait_for(
        step,
        "page location",
        env.config.polling.element_interval(),
        env.config.polling.navigation_timeout(),
        move || navigator.location(),
    )
    .await?;
    let target = match location {
        NavigationTarget::InsuranceInformation => {
            ctx.advance_to(WorkflowStep::OpeningFormEditor);
            return Ok(Transition::Continue(ctx));
        }
        NavigationTarget::PatientDetails => {
            // Reaching the details page is progress
            ctx.retry_count = 0;
            NavigationTarget::InsuranceInformation
        }
        NavigationTarget::PatientChart => NavigationTarget::PatientDetails,
    };

    env.status.status(&format!("Opening {}...", target));
    env.persist(&ctx).await?;
    navigator
        .navigate(target)
        .await
        .map_err(WorkflowError::step_failed(step))?;
    Ok(Transition::AwaitReload(step))
}

async fn opening_form_editor(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::OpeningFormEditor;
    let form: &dyn FormWriter = env.collaborators.form.as_ref();

    env.checkpoint(&mut ctx, WorkflowStep::FillingAndSaving).await?;
    let mut outcome = form
        .open_editor(ctx.insurance_level)
        .await
        .map_err(WorkflowError::step_failed(step))?;

    if outcome == ActionOutcome::Unavailable && ctx.insurance_level == InsuranceLevel::Secondary {
        warn!(run_id = %ctx.run_id, "secondary insurance editor unavailable, using primary");
        outcome = form
            .open_editor(InsuranceLevel::Primary)
            .await
            .map_err(WorkflowError::step_failed(step))?;
    }

    match outcome {
        ActionOutcome::Performed => Ok(Transition::Continue(ctx)),
        ActionOutcome::Unavailable => Err(WorkflowError::CapabilityUnavailable(
            "billing form editor".to_string(),
        )),
    }
}

async fn filling_and_saving(mut ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::FillingAndSaving;
    let form: &dyn FormWriter = env.collaborators.form.as_ref();

    wait_for(
        step,
        "COPAY field",
        env.config.polling.element_interval(),
        env.config.polling.element_timeout(),
        move || async move { form.field_present(FormField::Copay).await.map(|p| p.then_some(())) },
    )
    .await?;

    let share = &ctx.extraction;
    if share.has_primary() {
        if let Some(copay) = &share.primary_copay {
            form.write_field(FormField::Copay, copay.as_str())
                .await
                .map_err(WorkflowError::step_failed(step))?;
        }
        if let Some(coinsurance) = &share.primary_coinsurance {
            form.write_field(FormField::Coinsurance, coinsurance.as_str())
                .await
                .map_err(WorkflowError::step_failed(step))?;
        }
    } else {
        for field in [FormField::Copay, FormField::Coinsurance] {
            form.write_field(field, "")
                .await
                .map_err(WorkflowError::step_failed(step))?;
        }
    }

    env.status.status("Saving billing form...");
    env.checkpoint(&mut ctx, WorkflowStep::ReturningHome).await?;
    form.submit().await.map_err(WorkflowError::step_failed(step))?;
    Ok(Transition::AwaitReload(WorkflowStep::ReturningHome))
}

async fn returning_home(ctx: WorkflowContext, env: &StepEnv<'_>) -> Result<Transition> {
    let step = WorkflowStep::ReturningHome;
    env.store.clear().await?;
    info!(run_id = %ctx.run_id, level = %ctx.insurance_level, "copay autofill finished");
    env.collaborators
        .navigator
        .navigate(NavigationTarget::PatientChart)
        .await
        .map_err(WorkflowError::step_failed(step))?;
    Ok(Transition::Complete)
}
