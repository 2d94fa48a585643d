//! Layered configuration for the copay autofill workspace.
//!
//! Values come from built-in defaults, then optional YAML/TOML files, then
//! `COPAY_`-prefixed environment variables using `__` for nesting
//! (`COPAY_DOCUMENT_FETCH__ATTEMPTS=4`). The result is validated before use.
//!
//! ```rust,no_run
//! use config_engine::{ConfigEngine, ConfigSource};
//!
//! let config = ConfigEngine::new()
//!     .add_source(ConfigSource::optional_file("copay.yaml"))
//!     .add_source(ConfigSource::env())
//!     .load()?;
//! assert_eq!(config.workflow.namespace, "tmCopayAutofill");
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod engine;
pub mod error;
pub mod providers;
pub mod settings;
pub mod validation;

pub use engine::ConfigEngine;
pub use error::{ConfigError, Result};
pub use providers::ConfigSource;
pub use settings::*;
pub use validation::Validate;
