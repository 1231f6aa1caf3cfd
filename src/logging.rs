use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Prefix of the daily log files
pub const LOG_PREFIX: &str = "record-rename";

/// Log filter: `RUST_LOG` if set, otherwise debug or info.
fn build_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Daily rolling file appender in `log_dir`, created if missing.
fn file_writer(
    log_dir: &Utf8Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }

    let file_appender = rolling::daily(log_dir, LOG_PREFIX);
    Ok(tracing_appender::non_blocking(file_appender))
}

/// Setup logging with a rotating file appender.
///
/// The host process may already own a global subscriber; in that case this
/// returns an error and the plugin keeps logging through the host's one.
///
/// # Arguments
/// * `log_dir` - Directory for log files
/// * `debug_mode` - If true, use debug level; otherwise use info level
///
/// # Returns
/// A guard that must be held while the plugin is loaded to keep logging active
pub fn setup_logging(log_dir: &Utf8Path, debug_mode: bool) -> Result<WorkerGuard> {
    setup_logging_with_console(log_dir, debug_mode, false, false)
}

/// Setup logging with optional console output and JSON file records.
///
/// # Arguments
/// * `log_dir` - Directory for log files
/// * `debug_mode` - If true, use debug level; otherwise use info level
/// * `console_output` - If true, also log to stderr
/// * `json` - If true, write one JSON object per line to the log file
pub fn setup_logging_with_console(
    log_dir: &Utf8Path,
    debug_mode: bool,
    console_output: bool,
    json: bool,
) -> Result<WorkerGuard> {
    let (non_blocking, guard) = file_writer(log_dir)?;

    let file_layer: Box<dyn Layer<Registry> + Send + Sync> = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_thread_ids(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false) // No ANSI codes in log files
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let console_layer = console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(build_filter(debug_mode))
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    tracing::info!(
        "Logging initialized: dir={}, debug={}, console={}, json={}",
        log_dir,
        debug_mode,
        console_output,
        json
    );

    Ok(guard)
}
