//! Subscriber setup for binaries, benches and tests.
//!
//! Library callers normally install their own subscriber and only see the
//! spans and events emitted by the stages. `init_logging` is the shortcut for
//! everything else: one fmt layer (JSON or pretty) behind an `EnvFilter`,
//! written through a non-blocking appender.

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// File written under `LoggingConfig::log_dir` when logging to a file.
pub const LOG_FILE_NAME: &str = "rdf-validation.log";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Only read when `output` is `LogOutput::File`.
    pub log_dir: PathBuf,
    /// Lowers the default level from `info` to `debug`. `RUST_LOG` wins over both.
    pub verbose: bool,
    /// Roll the log file daily instead of appending to a single file.
    pub rotate_daily: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            verbose: false,
            rotate_daily: true,
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `PIPELINE_LOG_FORMAT`, `PIPELINE_LOG_OUTPUT`,
    /// `PIPELINE_LOG_DIR` and `PIPELINE_LOG_VERBOSE`. Unrecognized values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(format) = env_lowercase("PIPELINE_LOG_FORMAT") {
            match format.as_str() {
                "json" => config.format = LogFormat::Json,
                "pretty" => config.format = LogFormat::Pretty,
                _ => {}
            }
        }
        if let Some(output) = env_lowercase("PIPELINE_LOG_OUTPUT") {
            match output.as_str() {
                "stdout" => config.output = LogOutput::Stdout,
                "stderr" => config.output = LogOutput::Stderr,
                "file" => config.output = LogOutput::File,
                _ => {}
            }
        }
        if let Ok(dir) = env::var("PIPELINE_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(verbose) = env_lowercase("PIPELINE_LOG_VERBOSE") {
            config.verbose = matches!(verbose.as_str(), "1" | "true" | "yes");
        }

        config
    }

    fn default_directive(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

fn env_lowercase(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.to_lowercase())
}

/// Install the global subscriber.
///
/// Hold the returned guard until shutdown; dropping it flushes buffered
/// events. Fails when a global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).with_context(|| {
                format!("failed to create log directory {}", config.log_dir.display())
            })?;
            let appender = if config.rotate_daily {
                tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_NAME)
            } else {
                tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME)
            };
            tracing_appender::non_blocking(appender)
        }
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(
        format = ?config.format,
        output = ?config.output,
        version = env!("CARGO_PKG_VERSION"),
        "logging initialized"
    );

    Ok(guard)
}

/// Log a stage that ran longer than expected.
#[macro_export]
macro_rules! log_slow_stage {
    ($duration:expr, $threshold_ms:expr, $stage:expr) => {{
        let duration_ms = $duration.as_millis() as u64;
        if duration_ms > $threshold_ms {
            tracing::warn!(
                stage = $stage,
                duration_ms = duration_ms,
                threshold_ms = $threshold_ms,
                "slow validation stage"
            );
        } else {
            tracing::debug!(stage = $stage, duration_ms = duration_ms, "stage finished");
        }
    }};
}
