//! Logging configuration for text2sql.
//!
//! Logs go to stderr by default so stdout carries only the answers. A log file
//! can be requested instead for long unattended batch runs.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to the given file.
///
/// The file is truncated on each run. If it cannot be created, a warning is
/// printed and logging falls back to stderr.
pub fn init_file_logging(log_path: &Path) {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging();
            return;
        }
    }

    let log_file = match File::create(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
}
