//! Append-only diagnostic log sink.
//!
//! Process-wide state with an explicit configure step and no teardown.
//! The file handle is scoped per write call (acquired, written, released
//! immediately), so every line already written survives a crash mid-run.
//! Only the configured path sits behind a mutex; the loader itself is
//! single-threaded by contract.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static LOG_PATH: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

/// Set the active log path. No validation and no I/O until a write occurs.
pub fn configure(path: impl Into<PathBuf>) {
    *LOG_PATH.lock() = Some(path.into());
}

/// Clear the configured path; subsequent writes become no-ops.
pub fn reset() {
    *LOG_PATH.lock() = None;
}

/// Currently configured log path, if any.
pub fn path() -> Option<PathBuf> {
    LOG_PATH.lock().clone()
}

/// Append one line to the log. Silently does nothing when unconfigured;
/// a failed write is downgraded to a tracing event and never propagates.
pub fn log(message: &str) {
    let Some(path) = path() else { return };
    if let Err(e) = append_line(&path, message) {
        tracing::warn!("log write to {} failed: {}", path.display(), e);
    }
}

/// Append one line prefixed with the local wall-clock time.
pub fn log_with_timestamp(message: &str) {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    log(&format!("{} - {}", stamp, message));
}

fn append_line(path: &Path, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", message)
}
