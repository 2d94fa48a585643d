use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use error_common::{CodedError, ErrorContext, ErrorReporter};
use logger_redacted::init_logging;
use ops_cli::cli::{Cli, Commands};
use ops_cli::commands;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(err) => {
            if let Some(coded) = coded_cause(&err) {
                let report = ErrorReporter::new().report(coded, &ErrorContext::new());
                eprintln!("{} [{}] {}", "error:".red().bold(), report.code, report.message);
            }
            Err(err)
        }
    }
}

async fn run(cli: &Cli) -> Result<String> {
    let mut config = commands::load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    let _log_guard = init_logging(&config.logging)?;
    debug!(command = ?cli.command, config = ?cli.config, "dispatching");

    match &cli.command {
        Commands::Extract(args) => commands::run_extract(&config, args),
        Commands::Detect(args) => commands::run_detect(&config, args),
        Commands::Fetch(args) => commands::run_fetch(&config, args).await,
        Commands::State(args) => commands::run_state(&config, args).await,
    }
}

/// First error in the chain that carries a stable code
fn coded_cause(err: &anyhow::Error) -> Option<&dyn CodedError> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<insurance_service::InsuranceError>() {
            return Some(e as &dyn CodedError);
        }
        if let Some(e) = cause.downcast_ref::<config_engine::ConfigError>() {
            return Some(e as &dyn CodedError);
        }
        if let Some(e) = cause.downcast_ref::<workflow_engine::StoreError>() {
            return Some(e as &dyn CodedError);
        }
        None
    })
}
