use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use glob::{glob, Pattern};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::LoggingError;

/// # Logging Options
///
/// Where and how the process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Prefix of every log file name.
    pub app_name: String,
    /// Directory holding the log files. Created if missing.
    pub log_dir: PathBuf,
    /// Default filter directive, e.g. `info` or `lib_trials=debug,info`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Also log to stdout.
    pub console: bool,
    /// Write the file as JSON lines instead of plain text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: "trial_feed".to_string(),
            log_dir: PathBuf::from("./logs"),
            level: "info".to_string(),
            console: true,
            json: false,
        }
    }
}

/// Keeps the background file writer alive. Dropping it flushes and closes
/// the log file, so hold it for the life of the process.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _writer: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// The file this process logs to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Installs the global tracing subscriber: an env filter, an optional
/// console layer and a non-blocking file layer writing to
/// `<log_dir>/<app_name>-<YYYYmmdd_HHMMSS>.log`.
///
/// Older log files of the same app are rotated first so that only the most
/// recent previous file survives next to the new one.
///
/// # Errors
/// [`LoggingError::Io`] if the directory cannot be prepared,
/// [`LoggingError::Subscriber`] for a bad filter or when a subscriber is
/// already installed.
pub fn setup_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(&config.level)?;

    fs::create_dir_all(&config.log_dir)?;
    rotate_logs(&config.app_name, &config.log_dir)?;

    let file_name = log_file_name(&config.app_name, Local::now());
    let path = config.log_dir.join(&file_name);
    let appender = tracing_appender::rolling::never(&config.log_dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    };
    let console_layer = config
        .console
        .then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|error| LoggingError::Subscriber(error.to_string()))?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(LoggingGuard {
        _writer: guard,
        path,
    })
}

/// `RUST_LOG` when set, otherwise `level`.
fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|error| LoggingError::Subscriber(format!("bad log level '{level}': {error}"))),
    }
}

/// Name of the log file opened at `now`.
pub fn log_file_name(app_name: &str, now: DateTime<Local>) -> String {
    format!("{}-{}.log", app_name, now.format("%Y%m%d_%H%M%S"))
}

/// Deletes every `<app_name>-*.log` in `log_dir` except the newest one, by
/// the timestamp embedded in the name. Returns how many files were deleted.
///
/// A file that cannot be deleted is reported on stderr and skipped, since
/// no subscriber is installed yet.
///
/// # Errors
/// [`LoggingError::Subscriber`] if the directory yields an unusable pattern.
pub fn rotate_logs(app_name: &str, log_dir: &Path) -> Result<usize, LoggingError> {
    let pattern = format!(
        "{}/{}-*.log",
        Pattern::escape(&log_dir.to_string_lossy()),
        Pattern::escape(app_name)
    );
    let entries = glob(&pattern).map_err(|error| LoggingError::Subscriber(error.to_string()))?;

    let mut log_files: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut deleted = 0;
    for old_file in log_files.iter().skip(1) {
        match fs::remove_file(old_file) {
            Ok(()) => deleted += 1,
            Err(error) => {
                eprintln!("Error deleting old log file {}: {}", old_file.display(), error)
            }
        }
    }
    Ok(deleted)
}
