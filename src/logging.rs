//! Log sinks.
//!
//! Each bot writes two files in its working directory: a detailed log fed
//! by `tracing` and a terse one-line-per-run log written by [`SimpleLog`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tracing::{debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::BotConfig;

/// Timestamp format shared by both log files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber for `config`'s bot.
///
/// INFO and above go to the detailed log; stderr gets whatever `RUST_LOG`
/// asks for, `warn` by default. An already installed subscriber is kept.
pub fn init(config: &BotConfig) -> io::Result<()> {
    fs::create_dir_all(&config.workdir)?;
    let file = open_append(&config.detail_log())?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_filter(LevelFilter::INFO);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        debug!("Keeping existing subscriber: {e}");
    }
    Ok(())
}

/// Render one terse log line.
pub fn simple_line(at: DateTime<Local>, message: &str) -> String {
    format!("{} | {message}", at.format(TIMESTAMP_FORMAT))
}

/// Append-only terse log: one timestamped line per run outcome.
#[derive(Debug, Clone)]
pub struct SimpleLog {
    path: PathBuf,
}

impl SimpleLog {
    /// Log to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message`. Write failures are reported through `tracing` only.
    pub fn append(&self, message: &str) {
        if let Err(e) = self.try_append(message) {
            error!("Failed to write {}: {e}", self.path.display());
        }
    }

    fn try_append(&self, message: &str) -> io::Result<()> {
        let mut file = open_append(&self.path)?;
        writeln!(file, "{}", simple_line(Local::now(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_simple_line_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            simple_line(at, "BOT1 | Proc:3 Likes:4 | Shard 0/1"),
            "2024-03-09 07:05:01 | BOT1 | Proc:3 Likes:4 | Shard 0/1"
        );
    }

    #[test]
    fn test_simple_log_appends() {
        let temp = TempDir::new().unwrap();
        let log = SimpleLog::new(temp.path().join("autolike_simple.log"));

        log.append("first");
        log.append("second");

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" | first"));
        assert!(lines[1].ends_with(" | second"));
    }

    #[test]
    fn test_simple_log_failure_is_swallowed() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let log = SimpleLog::new(temp.path());
        log.append("ignored");
        assert!(temp.path().is_dir());
    }
}
