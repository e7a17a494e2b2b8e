//! File logging for wavetide sessions.
//!
//! The terminal belongs to the waveform surface, so every event goes to a
//! daily file `wavetide.log.YYYY-MM-DD` in the XDG state directory. The
//! newest [`RETAINED_DAYS`] files are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Base name of the daily log files.
pub const LOG_FILE_PREFIX: &str = "wavetide.log";

/// Number of daily files kept on startup.
pub const RETAINED_DAYS: usize = 7;

/// Used when RUST_LOG is unset; keeps audio backend chatter out.
const DEFAULT_FILTER: &str = "warn,wavetide=info";

static WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber writing to today's log file.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> anyhow::Result<()> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)?;

    let pruned = match prune_logs(&dir, RETAINED_DAYS) {
        Ok(pruned) => pruned,
        Err(e) => {
            eprintln!("Warning: Failed to prune old logs: {e}");
            0
        }
    };

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX));
    WRITER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::debug!(
        "Logging to {} ({} old file(s) pruned)",
        dir.display(),
        pruned
    );
    Ok(())
}

/// Log directory: `$XDG_STATE_HOME/wavetide` or `~/.local/state/wavetide`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg_state).join("wavetide"));
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local/state/wavetide"))
}

/// Dated log files in `dir`, newest first.
///
/// The date is read from the file name, so the order does not depend on
/// modification times.
///
/// # Errors
/// - If the directory cannot be read
pub fn dated_logs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut logs: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let date = log_date(path.file_name()?.to_str()?)?.to_string();
            Some((date, path))
        })
        .collect();

    logs.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(logs.into_iter().map(|(_, path)| path).collect())
}

/// `YYYY-MM-DD` suffix of a `wavetide.log.YYYY-MM-DD` file name.
fn log_date(file_name: &str) -> Option<&str> {
    let date = file_name
        .strip_prefix(LOG_FILE_PREFIX)?
        .strip_prefix('.')?;
    let shaped = date.len() == 10
        && date.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    shaped.then_some(date)
}

/// Deletes dated logs beyond the newest `keep`. Returns how many went.
fn prune_logs(dir: &Path, keep: usize) -> anyhow::Result<usize> {
    let mut removed = 0;
    for path in dated_logs(dir)?.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Failed to delete old log file {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_date_requires_full_date() {
        assert_eq!(log_date("wavetide.log.2026-01-09"), Some("2026-01-09"));
        assert_eq!(log_date("wavetide.log"), None);
        assert_eq!(log_date("wavetide.log.2026-1-9"), None);
        assert_eq!(log_date("other.log.2026-01-09"), None);
    }

    #[test]
    fn test_prune_keeps_newest_dates() {
        let dir = tempfile::tempdir().expect("temp dir");
        for day in 1..=10 {
            let name = format!("{LOG_FILE_PREFIX}.2026-01-{day:02}");
            fs::write(dir.path().join(name), "line\n").expect("write");
        }
        fs::write(dir.path().join("unrelated.txt"), "keep").expect("write");

        assert_eq!(prune_logs(dir.path(), RETAINED_DAYS).expect("prune"), 3);

        let logs = dated_logs(dir.path()).expect("list");
        assert_eq!(logs.len(), RETAINED_DAYS);
        assert!(logs[0].ends_with(format!("{LOG_FILE_PREFIX}.2026-01-10")));
        assert!(dir.path().join("unrelated.txt").exists());
    }
}
