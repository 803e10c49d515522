//! Logging module for devrun.
//!
//! Provides file-based logging with retention cleanup, plus an optional
//! stderr mirror for `-v`. Logs are stored in ~/.devrun/logs/ by default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Default log retention in hours.
pub const DEFAULT_LOG_RETENTION_HOURS: u32 = 24;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log retention period in hours.
    pub retention_hours: u32,
    /// Log level (trace, debug, info, warn, error, off).
    pub level: String,
    /// Whether file logging is enabled.
    pub enabled: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            retention_hours: DEFAULT_LOG_RETENTION_HOURS,
            level: DEFAULT_LOG_LEVEL.to_string(),
            enabled: true,
        }
    }
}

impl LogConfig {
    /// Parses log level from string.
    #[must_use]
    pub fn parse_level(value: &str) -> String {
        match value.to_lowercase().as_str() {
            "trace" => "trace".to_string(),
            "debug" => "debug".to_string(),
            "info" => "info".to_string(),
            "warn" | "warning" => "warn".to_string(),
            "error" => "error".to_string(),
            "off" | "none" | "disabled" => "off".to_string(),
            _ => DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Parses retention hours from string.
    #[must_use]
    pub fn parse_retention(value: &str) -> u32 {
        value.parse().unwrap_or(DEFAULT_LOG_RETENTION_HOURS)
    }

    /// Returns true if the log file should be written.
    #[must_use]
    pub fn file_enabled(&self) -> bool {
        self.enabled && self.level != "off"
    }
}

/// Maps `-v` occurrences to a stderr level.
#[must_use]
pub fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Returns the log directory path (~/.devrun/logs/).
#[must_use]
pub fn log_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devrun")
        .join("logs")
}

/// Returns the log file name for a run starting now.
#[must_use]
pub fn current_log_name() -> String {
    let now = chrono::Local::now();
    format!("devrun_{}", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Deletes `.log` files in `log_dir` older than the retention period.
///
/// # Errors
/// Returns error if the directory cannot be read.
pub fn cleanup_old_logs(log_dir: &Path, retention_hours: u32) -> io::Result<u32> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let retention_duration = Duration::from_secs(u64::from(retention_hours) * 3600);
    let now = SystemTime::now();
    let mut deleted_count = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        // Only process .log files
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if let Some(age) = age {
            if age > retention_duration && fs::remove_file(&path).is_ok() {
                deleted_count += 1;
            }
        }
    }

    Ok(deleted_count)
}

/// Initializes the logging system.
///
/// Writes to a timestamped file under [`log_directory`] when file logging
/// is enabled, and to stderr when `verbose > 0`. `RUST_LOG` overrides the
/// level. Does nothing when neither output is wanted.
///
/// # Errors
/// Returns error if the log directory or file cannot be set up, or a
/// global subscriber is already installed.
pub fn init(config: &LogConfig, verbose: u8) -> io::Result<()> {
    let stderr_level = verbosity_level(verbose);
    if !config.file_enabled() && stderr_level.is_none() {
        return Ok(());
    }

    let level = stderr_level.unwrap_or(config.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut deleted = 0;
    let mut log_path = None;
    let file_layer = if config.file_enabled() {
        let log_dir = log_directory();
        fs::create_dir_all(&log_dir)?;
        deleted = cleanup_old_logs(&log_dir, config.retention_hours)?;

        let name = current_log_name();
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(&name)
            .filename_suffix("log")
            .build(&log_dir)
            .map_err(io::Error::other)?;
        log_path = Some(log_dir.join(format!("{}.log", name)));

        Some(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(false),
        )
    } else {
        None
    };

    let stderr_layer = stderr_level.map(|_| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .without_time()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(io::Error::other)?;

    tracing::info!("devrun v{} logging initialized", env!("CARGO_PKG_VERSION"));
    if let Some(path) = log_path {
        tracing::info!("Log file: {}", path.display());
    }
    tracing::info!("Log level: {}", level);
    if deleted > 0 {
        tracing::info!("Cleaned up {} old log file(s)", deleted);
    }

    Ok(())
}
