//! Device set resolution.
//!
//! Turns the operator's choice (one address, a list file, or an
//! interactive answer) into an ordered, non-empty list of [`Target`]s.

use std::fmt;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::prompt::{PromptError, Prompter};

/// Default device list file, relative to the working directory.
pub const DEFAULT_DEVICE_LIST: &str = "device-list.txt";

/// Maximum device list size in bytes (1MB).
const MAX_LIST_SIZE: u64 = 1024 * 1024;

/// Errors that can occur while resolving targets.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A directly supplied address is not an IPv4 literal.
    #[error("'{input}' does not appear to be an IPv4 address")]
    InvalidAddress {
        /// What the operator typed.
        input: String,
    },

    /// The device list file does not exist.
    #[error("Device list not found: {}", .0.display())]
    DeviceListNotFound(PathBuf),

    /// The device list file has no usable lines.
    #[error("Device list is empty: {}", .0.display())]
    EmptyDeviceList(PathBuf),

    /// The device list file exceeds the size limit.
    #[error("Device list too large: {} (max {MAX_LIST_SIZE} bytes)", .0.display())]
    DeviceListTooLarge(PathBuf),

    /// The device list file could not be read.
    #[error("Cannot read device list {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The interactive address prompt failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// One device address to run the command against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// Parses a directly supplied address, which must be IPv4.
    ///
    /// # Errors
    /// Returns `ResolveError::InvalidAddress` for anything else.
    pub fn parse_ipv4(input: &str) -> Result<Self, ResolveError> {
        let trimmed = input.trim();
        trimmed
            .parse::<Ipv4Addr>()
            .map(|addr| Self(addr.to_string()))
            .map_err(|_| ResolveError::InvalidAddress {
                input: trimmed.to_string(),
            })
    }

    /// Builds a target from a device list line.
    ///
    /// List entries may be hostnames and are not validated beyond being
    /// non-empty once trimmed.
    #[must_use]
    pub fn from_list_entry(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Host name or address to connect to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the targets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// A single address given on the command line.
    Single(String),
    /// Every entry in a newline-delimited file.
    List(PathBuf),
    /// An address typed at a prompt.
    Interactive,
}

impl DeviceSource {
    /// Returns true if resolving this source asks the operator.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Resolves a source into an ordered, non-empty target list.
pub fn resolve<P: Prompter + ?Sized>(
    source: &DeviceSource,
    prompter: &mut P,
) -> Result<Vec<Target>, ResolveError> {
    let targets = match source {
        DeviceSource::Single(address) => vec![Target::parse_ipv4(address)?],
        DeviceSource::List(path) => load_device_list(path)?,
        DeviceSource::Interactive => {
            let answer = prompter.ask("Provide device in IPv4 format (e.g. 10.0.0.1): ")?;
            vec![Target::parse_ipv4(&answer)?]
        }
    };
    info!("Resolved {} target(s)", targets.len());
    Ok(targets)
}

/// Parses device list content: one target per non-empty line, in order.
#[must_use]
pub fn parse_device_list(content: &str) -> Vec<Target> {
    content.lines().filter_map(Target::from_list_entry).collect()
}

/// Loads and parses a device list file.
pub fn load_device_list(path: &Path) -> Result<Vec<Target>, ResolveError> {
    let io_err = |source: io::Error| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ResolveError::DeviceListNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(io_err(e)),
    };
    if metadata.len() > MAX_LIST_SIZE {
        return Err(ResolveError::DeviceListTooLarge(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(io_err)?;
    let targets = parse_device_list(&content);
    debug!("Loaded {} target(s) from {}", targets.len(), path.display());

    if targets.is_empty() {
        return Err(ResolveError::EmptyDeviceList(path.to_path_buf()));
    }
    Ok(targets)
}
