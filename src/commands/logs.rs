//! Display recent log entries from the application.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{dated_logs, log_dir};

const DEFAULT_LINES: usize = 50;

/// Prints the tail of the most recent log file.
///
/// # Errors
/// - If the log directory cannot be determined or read
/// - If the log file cannot be read
pub fn handle_logs() -> anyhow::Result<()> {
    let log_dir = log_dir()?;

    if !log_dir.exists() {
        println!("Log directory does not exist yet: {}", log_dir.display());
        println!("Logs will be created when the application runs.");
        return Ok(());
    }

    let Some(log_file) = find_latest_log(&log_dir)? else {
        println!("No log files found in: {}", log_dir.display());
        println!("Run 'wavetide' or 'wavetide simulate' to generate logs.");
        return Ok(());
    };

    let content = fs::read_to_string(&log_file)
        .with_context(|| format!("Failed to read log file {}", log_file.display()))?;
    if content.is_empty() {
        println!("Log file is empty: {}", log_file.display());
        return Ok(());
    }

    let (shown, total) = tail_lines(&content, DEFAULT_LINES);
    println!();
    if shown.len() < total {
        println!("Showing last {} of {} lines:", shown.len(), total);
    } else {
        println!("Showing all {total} lines:");
    }
    println!("Full log file at: {}", log_file.display());
    println!();

    for line in shown {
        println!("{line}");
    }

    Ok(())
}

/// Last `count` lines of `content`, plus the total line count.
fn tail_lines(content: &str, count: usize) -> (Vec<&str>, usize) {
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();
    let start = total.saturating_sub(count);
    (lines[start..].to_vec(), total)
}

/// Newest dated wavetide log file in `log_dir`.
fn find_latest_log(log_dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let logs = dated_logs(log_dir)
        .with_context(|| format!("Failed to read log directory {}", log_dir.display()))?;
    Ok(logs.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LOG_FILE_PREFIX;

    #[test]
    fn test_tail_lines_limits_output() {
        let content = (1..=80).map(|i| format!("line {i}\n")).collect::<String>();
        let (shown, total) = tail_lines(&content, DEFAULT_LINES);
        assert_eq!(total, 80);
        assert_eq!(shown.len(), DEFAULT_LINES);
        assert_eq!(shown[0], "line 31");

        let (shown, total) = tail_lines("a\nb", DEFAULT_LINES);
        assert_eq!((shown, total), (vec!["a", "b"], 2));
    }

    #[test]
    fn test_find_latest_log_picks_newest_date() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(find_latest_log(dir.path()).expect("read"), None);

        fs::write(dir.path().join("notes.txt"), "x").expect("write");
        fs::write(dir.path().join(format!("{LOG_FILE_PREFIX}.2026-02-28")), "old").expect("write");
        let log = dir.path().join(format!("{LOG_FILE_PREFIX}.2026-03-01"));
        fs::write(&log, "entry").expect("write");

        assert_eq!(find_latest_log(dir.path()).expect("read"), Some(log));
    }
}
