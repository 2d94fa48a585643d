//! Operator tooling for the copay autofill engine
//!
//! ```bash
//! copay extract eligibility.pdf
//! copay extract dump.txt --text --json
//! copay detect eligibility.pdf
//! copay fetch "https://portal.example/eligibility/123.pdf"
//! copay state show --state-file ~/.local/share/copay-autofill/state.json
//! copay state clear
//! ```

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
