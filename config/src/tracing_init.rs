//! Logging initialization: logs go to a file (or are dropped), never to stdout.
//!
//! stdout is the bridge's protocol channel, so the only console-safe choice is no
//! console at all. The filter comes from `RUST_LOG` (default `info`).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(thiserror::Error, Debug)]
pub enum TracingInitError {
    #[error("log file path has no file name: {0}")]
    NoFileName(String),
    #[error("create log directory: {0}")]
    CreateDir(std::io::Error),
    #[error("install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber.
///
/// - `log_file` set: plain-text logs (no ANSI) are appended there through a non-blocking
///   writer. Keep the returned guard alive for the process lifetime so the tail is flushed.
/// - `log_file` unset: a sink layer is installed so instrumented code stays cheap and silent.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, TracingInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = log_file else {
        let sink_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(sink_layer).try_init()?;
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| TracingInitError::NoFileName(path.display().to_string()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(TracingInitError::CreateDir)?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(file_layer).try_init()?;
    tracing::info!(path = %path.display(), "llm-bridge logging to file");
    Ok(Some(guard))
}
