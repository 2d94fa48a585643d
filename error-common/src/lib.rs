//! Common error handling utilities for the copay autofill workspace
//!
//! Every crate in the workspace defines its own `thiserror` enum. This crate
//! gives those enums a shared vocabulary so the workflow can turn any failure
//! into a stable error code and a short status line for the operator.
//!
//! # Key Features
//!
//! - **Error Codes**: Stable string codes grouped by subsystem
//! - **Coded Errors**: The [`CodedError`] trait implemented by every error enum
//! - **Context Preservation**: Run, step and insurance level attached to reports
//! - **Reporting**: [`ErrorReporter`] logs through `tracing` and returns a
//!   serializable [`ErrorReport`]
//!
//! # Example
//!
//! ```rust
//! use error_common::{CodedError, ErrorContext, ErrorReporter};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("eligibility document never became available")]
//! struct Unavailable;
//!
//! impl CodedError for Unavailable {
//!     fn code(&self) -> &'static str {
//!         error_common::codes::document::FORMAT_UNAVAILABLE
//!     }
//! }
//!
//! let report = ErrorReporter::new().report(
//!     &Unavailable,
//!     &ErrorContext::new().with_step("extracting_primary"),
//! );
//! assert_eq!(report.code, "DOC_1002");
//! ```

pub mod types;
pub mod context;
pub mod codes;
pub mod reporting;

pub use types::*;
pub use context::*;
pub use reporting::*;
