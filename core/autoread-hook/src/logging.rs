//! Diagnostic logging for the hook binary.
//!
//! Stdout carries the hook protocol, so logs go to a daily rolling file under
//! `~/.autoread/logs` (or `AUTOREAD_LOG_DIR`). Without a usable log directory
//! they fall back to stderr.
//!
//! `AUTOREAD_DEBUG_LOG=1` forces debug level; otherwise `RUST_LOG` applies,
//! defaulting to `info`.

use std::env;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_DIR_ENV: &str = "AUTOREAD_LOG_DIR";
const DEBUG_ENV: &str = "AUTOREAD_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "autoread-hook.log";

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of `main` so buffered lines are flushed on exit.
pub fn init() -> Option<WorkerGuard> {
    let filter = env_filter();

    if let Some(dir) = log_dir() {
        if fs_err::create_dir_all(&dir).is_ok() {
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let installed = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .is_ok();
            return installed.then_some(guard);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    None
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn log_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|h| h.join(".autoread").join("logs"))
}
