//! XDG-compliant log directory management
//!
//! Logs are stored in `$XDG_STATE_HOME/doctree/logs/` (typically
//! `~/.local/state/doctree/logs/`). Each run writes a PID-based log file so
//! concurrent runs don't clobber each other; old files from other runs are
//! removed on startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Minimum age for log files to be cleaned up (24 hours)
const CLEANUP_AGE: Duration = Duration::from_secs(24 * 60 * 60);

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the log directory, creating it if necessary.
///
/// Falls back to the system temp directory when the state directory can't
/// be resolved or created.
pub fn log_dir() -> &'static PathBuf {
    LOG_DIR.get_or_init(|| {
        let fallback = std::env::temp_dir().join("doctree-logs");
        let dir = xdg_log_dir().unwrap_or_else(|| fallback.clone());

        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create log directory {:?}: {}", dir, e);
            return fallback;
        }

        dir
    })
}

fn xdg_log_dir() -> Option<PathBuf> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(state_home);
        if path.is_absolute() {
            return Some(path.join("doctree").join("logs"));
        }
    }

    let state = dirs::state_dir().or_else(|| dirs::home_dir().map(|h| h.join(".local").join("state")))?;
    Some(state.join("doctree").join("logs"))
}

/// Path of the log file for this process: `{log_dir}/doctree-{PID}.log`
pub fn main_log_path() -> PathBuf {
    log_dir().join(log_file_name(std::process::id()))
}

fn log_file_name(pid: u32) -> String {
    format!("doctree-{pid}.log")
}

/// Remove log files left behind by other runs more than a day ago
pub fn cleanup_stale_logs() {
    cleanup_stale_logs_in_dir(log_dir(), std::process::id(), CLEANUP_AGE);
}

fn cleanup_stale_logs_in_dir(dir: &Path, current_pid: u32, age: Duration) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let Some(pid) = extract_pid_from_filename(&name) else {
            continue;
        };
        if pid == current_pid {
            continue;
        }

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_file_older_than(&entry.path(), age) {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    tracing::debug!("Cleaned up stale log file: {:?}", entry.path());
                    removed += 1;
                }
                Err(e) => tracing::debug!("Failed to clean up stale log {:?}: {}", entry.path(), e),
            }
        }
    }
    removed
}

fn is_file_older_than(path: &Path, age: Duration) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };

    SystemTime::now()
        .duration_since(modified)
        .map(|elapsed| elapsed > age)
        .unwrap_or(false)
}

/// PID of a log file named `doctree-{PID}.log`
fn extract_pid_from_filename(name: &str) -> Option<u32> {
    name.strip_prefix("doctree-")?.strip_suffix(".log")?.parse().ok()
}
