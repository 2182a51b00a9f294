//! Global tracing subscriber setup
//!
//! `log` records from the crawl engine are forwarded through the
//! `tracing-log` bridge that `try_init` installs. In silent mode lines go to a
//! size-rotated log file whose backups are gzipped.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::Context;
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::utils::DEFAULT_LOG_FILE;

/// Rotate the log file once it reaches 500 MiB
pub const LOG_MAX_BYTES: usize = 500 * 1024 * 1024;
/// Rotated files kept next to the live one, oldest dropped first
pub const LOG_MAX_BACKUPS: usize = 3;

/// Output encoding of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Text,
    #[default]
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" | "" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected 'text' or 'json'")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Lower the default level to `debug`
    pub debug: bool,
    /// Write to `log_file` instead of stdout
    pub silent: bool,
    pub log_file: Option<PathBuf>,
    pub format: LogFormat,
}

impl LoggingOptions {
    fn default_directive(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    #[must_use]
    pub fn log_file(&self) -> &Path {
        self.log_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_LOG_FILE))
    }
}

/// Append-mode writer for `path` that rotates at `max_bytes`.
///
/// Backups are named `<file>.1` (newest) to `<file>.3` and gzipped on rotation.
///
/// # Errors
///
/// The file or its parent directory cannot be created.
pub fn rotating_file(path: &Path, max_bytes: usize) -> anyhow::Result<FileRotate<AppendCount>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Ok(FileRotate::new(
        path,
        AppendCount::new(LOG_MAX_BACKUPS),
        ContentLimit::Bytes(max_bytes),
        Compression::OnRotate(0),
        #[cfg(unix)]
        None,
    ))
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .boxed(),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
///
/// # Errors
///
/// The log file cannot be created, or a global subscriber is already set.
pub fn init(options: &LoggingOptions) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let output = if options.silent {
        let file = rotating_file(options.log_file(), LOG_MAX_BYTES)?;
        format_layer(options.format, Mutex::new(file), false)
    } else {
        format_layer(options.format, std::io::stdout, true)
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
