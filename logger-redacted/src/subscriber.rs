// Global subscriber installation
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter, writer::MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` overrides `config.level`. When a log directory is configured the
/// returned guard must be held for the life of the process, dropping it
/// flushes and stops the background file writer.
pub fn init_logging(config: &LoggerConfig) -> Result<Option<WorkerGuard>> {
    crate::set_redaction_enabled(config.redaction_enabled);

    let env_filter = build_filter(&config.level)?;
    let (writer, guard) = build_writer(config)?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.json {
        registry
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(config.service_name.clone(), writer))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(config.log_dir.is_none())
                    .with_writer(writer),
            )
            .try_init()
    };
    installed.map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::debug!(
        level = %config.level,
        json = config.json,
        redaction = config.redaction_enabled,
        "logging initialized"
    );
    Ok(guard)
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggerError::InvalidFilter {
        directive: level.to_string(),
        reason: e.to_string(),
    })
}

fn build_writer(config: &LoggerConfig) -> Result<(BoxMakeWriter, Option<WorkerGuard>)> {
    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            Ok((BoxMakeWriter::new(std::io::stderr.and(file_writer)), Some(guard)))
        }
        None => Ok((BoxMakeWriter::new(std::io::stderr), None)),
    }
}
