//! Reload-surviving copay autofill workflow
//!
//! The host application performs a full page navigation after most of the
//! actions this workflow asks of it, destroying everything in memory. The
//! workflow therefore keeps its whole pending computation as data: a
//! [`WorkflowContext`] naming the current [`WorkflowStep`], persisted through
//! a [`WorkflowStateStore`] and re-entered by [`WorkflowStateMachine::resume`]
//! on every page load.
//!
//! # Steps
//!
//! `Idle → VerifyingPrimary → ExtractingPrimary → (VerifyingSecondary →
//! ExtractingSecondary) → RecordingBalance → (CreatingNote → FillingNote) →
//! NavigatingToForm → OpeningFormEditor → FillingAndSaving → ReturningHome →
//! Idle`
//!
//! The secondary branch runs only when the primary document carries neither
//! a primary-care copay nor coinsurance, and it only fills fields the primary
//! left empty.
//!
//! # Example
//!
//! ```rust
//! use workflow_engine::{WorkflowContext, WorkflowStateStore, WorkflowStep};
//!
//! # tokio_test::block_on(async {
//! let store = WorkflowStateStore::in_memory("tmCopayAutofill");
//! let mut ctx = WorkflowContext::new_run();
//! ctx.advance_to(WorkflowStep::ExtractingPrimary);
//! store.save(&ctx).await.unwrap();
//!
//! // ...the page reloads...
//! let restored = store.load().await.unwrap();
//! assert_eq!(restored.current_step, WorkflowStep::ExtractingPrimary);
//! # });
//! ```

pub mod collaborators;
pub mod context;
pub mod error;
pub mod machine;
pub mod note;
pub mod page_values;
pub mod runtime;
pub mod status;
pub mod steps;
pub mod store;
pub mod wait;

pub use collaborators::*;
pub use context::{CostShare, WorkflowContext, WorkflowStep};
pub use error::{HostError, HostResult, Result, WorkflowError};
pub use machine::{ResumeOutcome, WorkflowStateMachine};
pub use note::{format_alert_note, AlertNote};
pub use runtime::{InFlightGuard, WorkflowRuntime};
pub use status::{StatusReporter, TracingStatusReporter};
pub use steps::{StepEnv, Transition};
pub use store::{
    JsonFileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError, StoreResult,
    WorkflowStateStore,
};
pub use wait::{try_wait_until, wait_until, WaitError, WaitTimeout};
