//! File-based logging for chatrec.
//!
//! The chat window owns the terminal, so log output goes to daily-rotated
//! files under the XDG state directory and never to stdout/stderr. Old log
//! files are pruned at startup. Log level comes from `RUST_LOG` and
//! defaults to "info".

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_PREFIX: &str = "chatrec.log";
const KEEP_DAYS: usize = 7;

/// Keeps the non-blocking appender alive for the life of the process.
static APPENDER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initializes daily-rotated file logging.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> Result<()> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;
    prune_old_logs(&log_dir);

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&log_dir, LOG_PREFIX));
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow!("Logging already initialized"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    tracing::debug!("Logging to {}", log_dir.display());
    Ok(())
}

/// `$XDG_STATE_HOME/chatrec`, falling back to `~/.local/state/chatrec`.
fn log_dir() -> Result<PathBuf> {
    let state = dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .ok_or_else(|| anyhow!("Could not determine state directory"))?;
    Ok(state.join("chatrec"))
}

/// Removes dated log files beyond the newest [`KEEP_DAYS`].
///
/// Best effort: a failed prune never blocks startup. Runs before the
/// subscriber is installed, so complaints go to stderr.
fn prune_old_logs(log_dir: &Path) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    // Rolled files are named chatrec.log.YYYY-MM-DD, so a lexicographic
    // sort is also a chronological sort.
    let mut dated: Vec<PathBuf> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            let date = name.strip_prefix("chatrec.log.")?;
            (date.len() == 10).then(|| path.clone())
        })
        .collect();
    dated.sort();

    for path in dated.iter().rev().skip(KEEP_DAYS) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "Warning: failed to remove old log file {}: {e}",
                path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_newest_seven_dated_files() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=9 {
            let name = format!("chatrec.log.2024-01-{day:02}");
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        prune_old_logs(dir.path());

        assert!(!dir.path().join("chatrec.log.2024-01-01").exists());
        assert!(!dir.path().join("chatrec.log.2024-01-02").exists());
        assert!(dir.path().join("chatrec.log.2024-01-03").exists());
        assert!(dir.path().join("chatrec.log.2024-01-09").exists());
    }

    #[test]
    fn test_prune_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chatrec.log"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        for day in 1..=8 {
            let name = format!("chatrec.log.2024-02-{day:02}");
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        prune_old_logs(dir.path());

        assert!(dir.path().join("chatrec.log").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("chatrec.log.2024-02-01").exists());
        assert!(dir.path().join("chatrec.log.2024-02-02").exists());
    }

    #[test]
    fn test_prune_on_missing_directory_is_a_noop() {
        prune_old_logs(Path::new("/nonexistent/chatrec-logs"));
    }
}
