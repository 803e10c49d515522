//! Configuration module.
//!
//! Handles loading and parsing the .devrunrc configuration file and
//! layering command-line flags on top of it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;
use crate::devices::DEFAULT_DEVICE_LIST;
use crate::logging::LogConfig;
use crate::ssh::runner::{
    DEFAULT_BUFFER_SIZE, DEFAULT_PAGINATION_COMMAND, DEFAULT_SETTLE, MAX_BUFFER_SIZE,
};
use crate::ssh::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
use crate::ssh::{ConnectOptions, RunnerOptions};

/// Config file name in the home directory.
const CONFIG_FILE_NAME: &str = ".devrunrc";

/// Example .devrunrc content with every setting documented.
pub const EXAMPLE_DEVRUNRC: &str = r#"# devrun configuration file
# ==========================
# Lines starting with '#' are comments. A '#' preceded by whitespace
# starts an inline comment; a '#' inside a value is kept. Command-line
# flags win over anything set here.
#
# Connection
# ----------
# port = 22                 # SSH port
# timeout = 4               # Connection timeout in seconds (above 0)
#
# Session script
# --------------
# settle = 4                # Seconds to wait after each send (fractions allowed)
# buffer_size = 524280      # Maximum bytes captured per read (up to 16777216)
# pagination_command = term len 0
#
# Devices and login
# -----------------
# device_list = device-list.txt
# username = netops
#
# Logging Configuration
# ---------------------
# Logs are stored in ~/.devrun/logs/ with automatic cleanup.
#
# log_enabled = true        # Enable/disable file logging (true/false)
# log_level = info          # trace, debug, info, warn, error, off
# log_retention = 24        # Hours to keep log files
"#;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but cannot be read.
    #[error("Cannot read config {}: {source}", .path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// A known key has a value that cannot be used.
    #[error("{}:{line}: invalid value '{value}' for '{key}': {reason}", .path.display())]
    InvalidValue {
        /// Config file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Setting name.
        key: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SSH port.
    pub port: u16,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Wait after each send.
    pub settle: Duration,
    /// Maximum bytes per read.
    pub buffer_size: usize,
    /// Command that disables the remote pager.
    pub pagination_command: String,
    /// Device list file used with --uselist.
    pub device_list: PathBuf,
    /// Username that skips the prompt.
    pub username: Option<String>,
    /// Logging configuration.
    pub log_config: LogConfig,
    /// Path the file settings came from.
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            settle: DEFAULT_SETTLE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            pagination_command: DEFAULT_PAGINATION_COMMAND.to_string(),
            device_list: PathBuf::from(DEFAULT_DEVICE_LIST),
            username: None,
            log_config: LogConfig::default(),
            config_path: Self::default_config_path(),
        }
    }
}

impl Config {
    /// Returns the default config file path (~/.devrunrc).
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE_NAME)
    }

    /// Loads the file named by `--config` (or the default), then applies
    /// the remaining flags on top.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(Self::default_config_path);
        let mut config = Self::load_from(&path)?;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self {
            config_path: path.to_path_buf(),
            ..Self::default()
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(config),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        config.parse(&content)?;
        Ok(config)
    }

    /// Parses the config file content.
    fn parse(&mut self, content: &str) -> Result<(), ConfigError> {
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key = value
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                let value = strip_inline_comment(value);

                self.apply_setting(key, value)
                    .map_err(|reason| ConfigError::InvalidValue {
                        path: self.config_path.clone(),
                        line: index + 1,
                        key: key.to_string(),
                        value: value.to_string(),
                        reason,
                    })?;
            }
        }
        Ok(())
    }

    /// Applies a single setting. Unknown keys are ignored.
    fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "port" => {
                self.port = value
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| "expected a port number between 1 and 65535".to_string())?;
            }
            "timeout" | "connect_timeout" => {
                self.connect_timeout = parse_timeout(value)?;
            }
            "settle" | "settle_time" => {
                self.settle = parse_seconds(value)?;
            }
            "buffer_size" => {
                self.buffer_size = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=MAX_BUFFER_SIZE).contains(n))
                    .ok_or_else(|| {
                        format!("expected a byte count between 1 and {}", MAX_BUFFER_SIZE)
                    })?;
            }
            "pagination_command" => {
                if value.is_empty() {
                    return Err("pagination command cannot be empty".to_string());
                }
                self.pagination_command = value.to_string();
            }
            "device_list" => {
                self.device_list = PathBuf::from(value);
            }
            "username" => {
                self.username = (!value.is_empty()).then(|| value.to_string());
            }
            "log_level" => {
                self.log_config.level = LogConfig::parse_level(value);
            }
            "log_retention" | "log_retention_hours" => {
                self.log_config.retention_hours = LogConfig::parse_retention(value);
            }
            "log_enabled" | "logging" => {
                self.log_config.enabled = parse_bool(value);
            }
            _ => {}
        }
        Ok(())
    }

    /// Overrides file settings with any flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(timeout) = cli.timeout {
            self.connect_timeout = timeout;
        }
        if let Some(settle) = cli.settle {
            self.settle = settle;
        }
        if let Some(buffer_size) = cli.buffer_size {
            self.buffer_size = buffer_size as usize;
        }
        if let Some(list_file) = &cli.list_file {
            self.device_list = list_file.clone();
        }
        if let Some(username) = &cli.username {
            self.username = Some(username.clone());
        }
    }

    /// Options for the SSH connector.
    ///
    /// Blocking reads are bounded by the connect timeout plus the settle
    /// time, and never less than one second.
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            port: self.port,
            connect_timeout: self.connect_timeout,
            io_timeout: (self.connect_timeout + self.settle).max(Duration::from_secs(1)),
        }
    }

    /// Options for the session runner.
    #[must_use]
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            settle: self.settle,
            buffer_size: self.buffer_size,
            pagination_command: self.pagination_command.clone(),
        }
    }
}

/// Parses a non-negative number of seconds, fractions allowed.
pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{}' is not a valid duration", value))
}

/// Parses a connection timeout in seconds. Zero is rejected.
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let timeout = parse_seconds(value)?;
    if timeout.is_zero() {
        return Err("timeout must be greater than 0 seconds".to_string());
    }
    Ok(timeout)
}

/// Cuts a trailing comment: a `#` at the start or after whitespace.
fn strip_inline_comment(value: &str) -> &str {
    let mut after_blank = true;
    for (i, c) in value.char_indices() {
        if c == '#' && after_blank {
            return value[..i].trim_end();
        }
        after_blank = c.is_whitespace();
    }
    value
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1" | "on")
}
