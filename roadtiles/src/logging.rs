//! Logging infrastructure.
//!
//! Structured logging to a file and to stderr:
//! - Writes to `<directory>/<file>` (cleared on session start)
//! - Mirrors to stderr so stdout stays free for command output
//! - Filter from `RUST_LOG`, falling back to the configured level

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files, created if missing
/// * `log_file` - Log filename
/// * `default_level` - Filter directive used when `RUST_LOG` is unset
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file cannot be cleared.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    default_level: &str,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Creates the directory and truncates the previous session's log.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_directory_and_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let log_dir = temp.path().join("logs");

        prepare_log_file(&log_dir, "test.log").unwrap();

        assert!(log_dir.exists());
        assert_eq!(fs::read_to_string(log_dir.join("test.log")).unwrap(), "");
    }

    #[test]
    fn test_clears_existing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let log_path = temp.path().join("test.log");
        fs::write(&log_path, "old log data").unwrap();

        prepare_log_file(temp.path(), "test.log").unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        // Builds without panicking whatever RUST_LOG holds.
        let _ = env_filter("not a [valid directive");
    }
}
