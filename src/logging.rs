//! File logging.
//!
//! The terminal is in raw mode while the UI runs, so log lines go to a
//! size-rotated file in the data directory instead of stderr.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "notepin";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level `{0}`")]
    InvalidLevel(String),
    #[error("Failed to create log directory {path}: {reason}")]
    Directory { path: String, reason: String },
    #[error("Failed to start logger: {0}")]
    Start(String),
}

/// Start logging into `log_dir`. Calling again is a no-op.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), LoggingError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }

    let level = normalize_level(level)?;
    std::fs::create_dir_all(log_dir).map_err(|e| LoggingError::Directory {
        path: log_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let handle = Logger::try_with_str(level)
        .map_err(|e| LoggingError::Start(e.to_string()))?
        .log_to_file(FileSpec::default().directory(log_dir).basename(LOG_FILE_BASENAME))
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|e| LoggingError::Start(e.to_string()))?;

    // Lost race: another caller already installed a logger.
    let _ = LOGGER.set(handle);

    info!(
        "event=app_start module=logging status=ok platform={} version={} level={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "error" => Ok("error"),
        "warn" | "warning" => Ok("warn"),
        "info" => Ok("info"),
        "debug" => Ok("debug"),
        "trace" => Ok("trace"),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}
