//! Logging init: one file per run under the configured log directory, or
//! graceful fallback to stderr.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,distimport=debug,distimport_core=debug";

/// Run log names, e.g. `10-19-2026_14h03m55s`.
const LOG_NAME_FORMAT: &str = "%m-%d-%Y_%Hh%Mm%Ss";

/// Writer that is either a file or stderr (used when file clone fails).
enum FileOrStderr {
    File(std::fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// File name for a run started at `now`.
pub fn run_log_name(now: chrono::DateTime<chrono::Local>) -> String {
    now.format(LOG_NAME_FORMAT).to_string()
}

/// Create `dir` (mode 0775 when newly created).
fn ensure_log_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o775))
            .with_context(|| format!("chmod log dir {}", dir.display()))?;
    }
    Ok(())
}

/// Remove the oldest regular files in `dir` so that at most `keep` remain.
/// Returns how many files were removed.
pub fn prune_old_logs(dir: &Path, keep: usize) -> Result<usize> {
    let mut logs: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read log dir {}", dir.display()))? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
        logs.push((modified, entry.path()));
    }
    if logs.len() <= keep {
        return Ok(0);
    }
    // Oldest first; names sort chronologically within a year as a tie-breaker.
    logs.sort();
    let excess = logs.len() - keep;
    let mut removed = 0;
    for (_, path) in logs.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::debug!(path = %path.display(), "failed to prune log: {}", e),
        }
    }
    Ok(removed)
}

/// Initialize structured logging to a fresh file in `log_dir`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging(log_dir: &Path, retention: usize) -> Result<PathBuf> {
    ensure_log_dir(log_dir)?;
    // Leave room for the file about to be created.
    let pruned = prune_old_logs(log_dir, retention.saturating_sub(1))?;

    let log_file_path = log_dir.join(run_log_name(chrono::Local::now()));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("open log file {}", log_file_path.display()))?;

    struct FileMakeWriter(std::fs::File);

    impl<'a> MakeWriter<'a> for FileMakeWriter {
        type Writer = FileOrStderr;

        fn make_writer(&'a self) -> Self::Writer {
            self.0
                .try_clone()
                .map(FileOrStderr::File)
                .unwrap_or(FileOrStderr::Stderr)
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(FileMakeWriter(file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("logging to {}", log_file_path.display());
    if pruned > 0 {
        tracing::debug!(pruned, "removed old run logs");
    }

    Ok(log_file_path)
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_log_name_format() {
        let t = chrono::Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(run_log_name(t), "03-07-2026_09h05m01s");
    }

    #[test]
    fn prune_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let base = std::time::SystemTime::now() - std::time::Duration::from_secs(1000);
        for i in 0..5u64 {
            let p = dir.path().join(format!("log{i}"));
            fs::write(&p, b"x").unwrap();
            let f = fs::File::options().write(true).open(&p).unwrap();
            f.set_modified(base + std::time::Duration::from_secs(i * 10))
                .unwrap();
        }
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let removed = prune_old_logs(dir.path(), 2).unwrap();
        assert_eq!(removed, 3);
        assert!(!dir.path().join("log0").exists());
        assert!(!dir.path().join("log2").exists());
        assert!(dir.path().join("log3").exists());
        assert!(dir.path().join("log4").exists());
        assert!(dir.path().join("subdir").is_dir());
    }

    #[test]
    fn prune_below_limit_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("only"), b"x").unwrap();
        assert_eq!(prune_old_logs(dir.path(), 50).unwrap(), 0);
        assert!(dir.path().join("only").exists());
    }

    #[test]
    fn ensure_log_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        ensure_log_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn log_dir_mode_is_0775() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        ensure_log_dir(&logs).unwrap();
        let mode = fs::metadata(&logs).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o775);
    }
}
