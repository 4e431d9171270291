//! Tracing setup for the CLI.
//!
//! Events always go to a daily rolling file under the log directory through a
//! non-blocking writer. With `verbose` they are mirrored to stderr as well.
//! `RUST_LOG` overrides the default `info` filter.

use color_eyre::{eyre::WrapErr, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "easycorkage.log";

/// Installs the global subscriber. The returned guard flushes the file writer
/// when dropped, so `main` has to hold it for the life of the process.
///
/// Fails when `log_dir` cannot be created or a global subscriber is already set.
pub fn initialize_logging(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Cannot create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(stderr_layer)
        .try_init()
        .wrap_err("A global tracing subscriber is already installed")?;

    tracing::info!(log_dir = %log_dir.display(), verbose, "Logging started");
    Ok(guard)
}
