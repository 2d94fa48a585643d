use crate::collaborators::Collaborators;
use crate::context::{WorkflowContext, WorkflowStep};
use crate::error::{Result, WorkflowError};
use crate::runtime::WorkflowRuntime;
use crate::status::{StatusReporter, TracingStatusReporter};
use crate::steps::{run_step, StepEnv, Transition};
use crate::store::WorkflowStateStore;
use chrono::{Local, NaiveDate};
use config_engine::AutomationConfig;
use error_common::{ErrorContext, ErrorReporter};
use insurance_service::InsuranceService;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a call to [`WorkflowStateMachine::resume`] or `start` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Nothing persisted; nothing to do
    Idle,
    /// Another resume held the guard; this call did nothing
    Skipped,
    /// Stopped at a step that waits for the host to reload the page
    AwaitingReload(WorkflowStep),
    Completed,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Drives the persisted workflow, one page load at a time
pub struct WorkflowStateMachine {
    config: Arc<AutomationConfig>,
    store: WorkflowStateStore,
    runtime: Arc<WorkflowRuntime>,
    collaborators: Collaborators,
    insurance: InsuranceService,
    status: Arc<dyn StatusReporter>,
    reporter: ErrorReporter,
    today: fn() -> NaiveDate,
}

impl WorkflowStateMachine {
    pub fn new(
        config: Arc<AutomationConfig>,
        store: WorkflowStateStore,
        collaborators: Collaborators,
        insurance: InsuranceService,
    ) -> Self {
        Self {
            config,
            store,
            runtime: WorkflowRuntime::new(),
            collaborators,
            insurance,
            status: Arc::new(TracingStatusReporter),
            reporter: ErrorReporter::new(),
            today: local_today,
        }
    }

    /// Share a runtime with timers that must respect the reentrancy guard
    pub fn with_runtime(mut self, runtime: Arc<WorkflowRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_status_reporter(mut self, status: Arc<dyn StatusReporter>) -> Self {
        self.status = status;
        self
    }

    /// Date printed on the alert note and used to filter appointments
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn runtime(&self) -> &Arc<WorkflowRuntime> {
        &self.runtime
    }

    pub fn store(&self) -> &WorkflowStateStore {
        &self.store
    }

    /// Begin a new run from the first step, discarding any stale state
    pub async fn start(&self) -> Result<ResumeOutcome> {
        let Some(_guard) = self.runtime.try_enter() else {
            debug!("start ignored, a step is already in flight");
            return Ok(ResumeOutcome::Skipped);
        };

        self.runtime.reset();
        let mut ctx = WorkflowContext::new_run();
        info!(run_id = %ctx.run_id, "starting copay autofill");
        if let Err(e) = self.store.clear().await {
            return self.fail(&ctx, e.into()).await;
        }
        self.drive(&mut ctx).await
    }

    /// Entry point for every page load
    pub async fn resume(&self) -> Result<ResumeOutcome> {
        let Some(_guard) = self.runtime.try_enter() else {
            debug!("resume ignored, a step is already in flight");
            return Ok(ResumeOutcome::Skipped);
        };

        let mut ctx = match self.store.load().await {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(&WorkflowContext::default(), e.into()).await,
        };
        if ctx.current_step.is_idle() {
            return Ok(ResumeOutcome::Idle);
        }

        info!(run_id = %ctx.run_id, step = %ctx.current_step, "resuming workflow");
        self.drive(&mut ctx).await
    }

    /// Cooperative stop: the running step finishes its current host call,
    /// then fails its next save or the next step entry. Persisted state is
    /// dropped immediately and nothing in flight writes it back.
    pub async fn stop(&self) -> Result<()> {
        self.runtime.request_cancel();
        self.store.clear().await?;
        self.status.status("Stopped");
        Ok(())
    }

    async fn drive(&self, ctx: &mut WorkflowContext) -> Result<ResumeOutcome> {
        match self.run_steps(ctx).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => self.fail(ctx, e).await,
        }
    }

    async fn run_steps(&self, ctx: &mut WorkflowContext) -> Result<ResumeOutcome> {
        let max_attempts = self.config.workflow.max_resume_attempts;

        loop {
            if self.runtime.is_cancelled() {
                return Err(WorkflowError::WorkflowCancelled);
            }

            ctx.retry_count += 1;
            if ctx.retry_count > max_attempts {
                return Err(WorkflowError::WorkflowMaxRetriesExceeded {
                    step: ctx.current_step,
                    attempts: max_attempts,
                });
            }
            self.store.save(ctx).await?;

            let step = ctx.current_step;
            info!(run_id = %ctx.run_id, step = %step, attempt = ctx.retry_count, "entering step");

            let env = StepEnv {
                collaborators: &self.collaborators,
                store: &self.store,
                insurance: &self.insurance,
                config: &self.config,
                status: self.status.as_ref(),
                runtime: self.runtime.as_ref(),
                today: (self.today)(),
            };

            match run_step(step, ctx.clone(), &env).await? {
                Transition::Continue(next) => *ctx = next,
                Transition::AwaitReload(next) => {
                    // A stop during the host call already cleared the store
                    if self.runtime.is_cancelled() {
                        return Err(WorkflowError::WorkflowCancelled);
                    }
                    debug!(run_id = %ctx.run_id, next = %next, "waiting for page reload");
                    return Ok(ResumeOutcome::AwaitingReload(next));
                }
                Transition::Complete => {
                    self.store.clear().await?;
                    self.status.status("Copay autofill complete");
                    return Ok(ResumeOutcome::Completed);
                }
            }
        }
    }

    /// Clear persisted state, surface the failure, hand the error back
    async fn fail(&self, ctx: &WorkflowContext, error: WorkflowError) -> Result<ResumeOutcome> {
        if let Err(clear_err) = self.store.clear().await {
            warn!(error = %clear_err, "failed to clear workflow state after error");
        }

        let mut context = ErrorContext::new()
            .with_step(ctx.current_step.as_str())
            .with_insurance_level(ctx.insurance_level.as_str());
        if !ctx.run_id.is_empty() {
            context = context.with_run_id(ctx.run_id.clone());
        }

        let report = self.reporter.report(&error, &context);
        self.status.failure(&report);
        Err(error)
    }
}
