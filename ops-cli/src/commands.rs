use crate::cli::{DocumentArgs, ExtractArgs, FetchArgs, StateAction, StateArgs};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use config_engine::{AutomationConfig, ConfigEngine, ConfigSource};
use insurance_service::{
    is_pdf, ExtractionOutcome, ExtractionResult, InsuranceService, PdfTextDecoder, ScoredCandidate,
    TextDecoder,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use workflow_engine::{JsonFileKeyValueStore, WorkflowStateStore};

/// Defaults, user config dir, `COPAY_` environment, then `--config`
pub fn load_config(extra: Option<&Path>) -> Result<AutomationConfig> {
    let mut engine = ConfigEngine::with_default_sources();
    if let Some(path) = extra {
        engine = engine.add_source(ConfigSource::file(path));
    }
    engine.load().context("failed to load configuration")
}

/// Decoded text of a document on disk. PDFs are decoded unless `--text` was given.
pub fn read_document(args: &DocumentArgs) -> Result<String> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    if !args.text && is_pdf(&bytes) {
        debug!(file = %args.file.display(), bytes = bytes.len(), "decoding pdf");
        return PdfTextDecoder
            .decode(&bytes)
            .with_context(|| format!("failed to decode {}", args.file.display()));
    }

    String::from_utf8(bytes).with_context(|| format!("{} is neither a PDF nor UTF-8 text", args.file.display()))
}

pub fn run_extract(config: &AutomationConfig, args: &ExtractArgs) -> Result<String> {
    let service = InsuranceService::from_config(config)?;
    let text = read_document(&args.document)?;
    let result = service.extract(&text);
    render_result(&result, args.json)
}

pub fn run_detect(config: &AutomationConfig, args: &DocumentArgs) -> Result<String> {
    let service = InsuranceService::from_config(config)?;
    let text = read_document(args)?;
    let rule = service.pipeline().detector().detect(&text);
    Ok(format!("{} ({} grammars)", rule.name.bold(), rule.grammars.len()))
}

pub async fn run_fetch(config: &AutomationConfig, args: &FetchArgs) -> Result<String> {
    let service = InsuranceService::from_config(config)?;
    let result = service
        .verify_document(&args.url)
        .await
        .with_context(|| format!("failed to verify {}", args.url))?;
    render_result(&result, args.json)
}

pub async fn run_state(config: &AutomationConfig, args: &StateArgs) -> Result<String> {
    let path = state_file(config, args.state_file.as_deref())?;
    let store = WorkflowStateStore::new(
        Arc::new(JsonFileKeyValueStore::new(&path)),
        config.workflow.namespace.clone(),
    );

    match args.action {
        StateAction::Show => {
            let ctx = store.load().await?;
            let mut out = format!("{} {}\n", "state file:".dimmed(), path.display());
            if ctx.current_step.is_idle() {
                out.push_str("no workflow in progress");
                return Ok(out);
            }
            out.push_str(&serde_json::to_string_pretty(&ctx)?);
            Ok(out)
        }
        StateAction::Clear => {
            store.clear().await?;
            info!(path = %path.display(), namespace = %store.namespace(), "workflow state cleared");
            Ok(format!("cleared workflow state in {}", path.display()))
        }
    }
}

fn state_file(config: &AutomationConfig, flag: Option<&Path>) -> Result<PathBuf> {
    match flag.map(Path::to_path_buf).or_else(|| config.workflow.state_file.clone()) {
        Some(path) => Ok(path),
        None => bail!("no state file: pass --state-file or set workflow.state_file"),
    }
}

fn field(value: Option<&str>, prefix: &str, suffix: &str) -> String {
    value.map_or_else(
        || "N/A".dimmed().to_string(),
        |v| format!("{}{}{}", prefix, v, suffix).green().to_string(),
    )
}

fn scored_lines(out: &mut String, title: &str, scored: &[ScoredCandidate]) -> std::fmt::Result {
    if scored.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n{}", title.bold())?;
    for s in scored {
        let c = &s.candidate;
        writeln!(
            out,
            "  {:>5}{} {} [{}] {}",
            s.score,
            if s.exact_match { "*" } else { " " },
            c.service,
            c.details,
            c.display_amount()
        )?;
    }
    Ok(())
}

pub fn render_result(result: &ExtractionResult, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }

    let mut out = String::new();
    let fallback = if result.used_default_fallback { " (default fallback)" } else { "" };
    writeln!(out, "{} {}{}", "rule set:".dimmed(), result.rule_set, fallback)?;

    if result.outcome == ExtractionOutcome::NoCandidates {
        writeln!(out, "{}", "no cost-share lines found".yellow())?;
    }

    writeln!(
        out,
        "PRIMARY CARE  | Copay: {} | Coinsurance: {}",
        field(result.primary_copay.as_ref().map(|m| m.as_str()), "$", ""),
        field(result.primary_coinsurance.as_ref().map(|p| p.as_str()), "", "%"),
    )?;
    writeln!(
        out,
        "URGENT CARE   | Copay: {} | Coinsurance: {}",
        field(result.urgent_copay.as_ref().map(|m| m.as_str()), "$", ""),
        field(result.urgent_coinsurance.as_ref().map(|p| p.as_str()), "", "%"),
    )?;

    scored_lines(&mut out, "primary care candidates", &result.primary_scored)?;
    scored_lines(&mut out, "urgent care candidates", &result.urgent_scored)?;
    writeln!(out, "\n{} {}", result.candidates.len(), "candidate lines".dimmed())?;

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use workflow_engine::{WorkflowContext, WorkflowStep};

    fn document(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_extract_json_from_text_file() {
        colored::control::set_override(false);
        let file = document(b"PCP[IN NETWORK]:$25.00\nUrgent Care[IN NETWORK]:$75.00\n");
        let args = ExtractArgs {
            document: DocumentArgs {
                file: file.path().to_path_buf(),
                text: false,
            },
            json: true,
        };

        let out = run_extract(&AutomationConfig::default(), &args).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["primary_copay"], "25.00");
        assert_eq!(value["urgent_copay"], "75.00");
        assert_eq!(value["primary_coinsurance"], serde_json::Value::Null);
    }

    #[test]
    fn test_human_output_lists_fields() {
        colored::control::set_override(false);
        let service = InsuranceService::from_config(&AutomationConfig::default()).unwrap();
        let result = service.extract("PCP[IN NETWORK]:20%");
        let out = render_result(&result, false).unwrap();
        assert!(out.contains("PRIMARY CARE  | Copay: N/A | Coinsurance: 20%"));
        assert!(out.contains("primary care candidates"));
    }

    #[test]
    fn test_state_requires_a_file() {
        let err = state_file(&AutomationConfig::default(), None).unwrap_err();
        assert!(err.to_string().contains("--state-file"));
    }

    #[tokio::test]
    async fn test_state_show_and_clear() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = AutomationConfig::default();

        let mut ctx = WorkflowContext::new_run();
        ctx.advance_to(WorkflowStep::FillingAndSaving);
        WorkflowStateStore::new(Arc::new(JsonFileKeyValueStore::new(&path)), config.workflow.namespace.clone())
            .save(&ctx)
            .await
            .unwrap();

        let show = |action| StateArgs {
            action,
            state_file: Some(path.clone()),
        };

        let out = run_state(&config, &show(StateAction::Show)).await.unwrap();
        assert!(out.contains("filling_and_saving"));

        run_state(&config, &show(StateAction::Clear)).await.unwrap();
        let out = run_state(&config, &show(StateAction::Show)).await.unwrap();
        assert!(out.ends_with("no workflow in progress"));
    }
}
