//! Logging infrastructure for scenesync.
//!
//! Provides structured logging with file output and optional console output:
//! - Writes to the configured log file (cleared on session start)
//! - Optionally prints to stdout for CLI tailing
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Console and verbosity options.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOptions {
    /// Mirror log output to stdout.
    pub stdout: bool,
    /// Force `debug` level regardless of RUST_LOG.
    pub debug: bool,
}

/// Initialize the global tracing subscriber.
///
/// Creates the log file's directory if needed and truncates the file.
///
/// # Errors
///
/// Returns an error if the log file cannot be prepared or a global
/// subscriber is already installed.
pub fn init_logging(log_file: &Path, options: LoggingOptions) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_file)?;

    let (dir, name) = match (log_file.parent(), log_file.file_name()) {
        (Some(dir), Some(name)) => (dir, name),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid log file path '{}'", log_file.display()),
            ))
        }
    };

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_names(true);

    let stdout_layer = options.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(options.debug))
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Filter from RUST_LOG, defaulting to `info`; `debug` forces debug level.
fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Create the parent directory and clear any previous log content.
fn prepare_log_file(log_file: &Path) -> Result<(), io::Error> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(log_file, "")
}
