use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "copay")]
#[command(about = "Eligibility document extraction and copay workflow tooling", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Extra configuration file (YAML or TOML), layered over the defaults
    #[arg(short, long, global = true, env = "COPAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as bunyan JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract copay and coinsurance from an eligibility PDF or text file
    Extract(ExtractArgs),

    /// Show which carrier rule set a document selects
    Detect(DocumentArgs),

    /// Fetch an eligibility document by URL and extract from it
    Fetch(FetchArgs),

    /// Inspect or reset persisted workflow state
    State(StateArgs),
}

#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// PDF or plain-text document
    pub file: PathBuf,

    /// Treat the file as already-extracted text, even if it starts with a PDF header
    #[arg(long)]
    pub text: bool,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    pub url: String,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub action: StateAction,

    /// JSON state file; defaults to `workflow.state_file` from configuration
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum StateAction {
    /// Print the persisted workflow context
    Show,
    /// Remove every persisted workflow key
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_flags_parse() {
        let cli = Cli::try_parse_from(["copay", "extract", "doc.pdf", "--text", "--json"]).unwrap();
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.document.file, PathBuf::from("doc.pdf"));
                assert!(args.document.text);
                assert!(args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_state_file_accepted_after_action() {
        let cli = Cli::try_parse_from(["copay", "state", "show", "--state-file", "s.json"]).unwrap();
        match cli.command {
            Commands::State(args) => {
                assert!(matches!(args.action, StateAction::Show));
                assert_eq!(args.state_file, Some(PathBuf::from("s.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
