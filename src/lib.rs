//! devrun
//!
//! Runs a single command against one or more network devices over
//! interactive SSH shells and prints what each device answers.
//!
//! # Architecture
//!
//! - **Devices Module**: resolves the ordered list of targets
//! - **Credentials / Prompt Modules**: operator input (username, password, command)
//! - **SSH Module**: per-device session runner over an interactive shell
//! - **Driver Module**: sequential loop with per-device failure containment
//!
//! # Usage
//!
//! ```no_run
//! use devrun::config::Config;
//! use devrun::devices::DeviceSource;
//! use devrun::driver;
//! use devrun::prompt::ConsolePrompter;
//! use devrun::ssh::Ssh2Connector;
//!
//! let config = Config::default();
//! let connector = Ssh2Connector::new(config.connect_options());
//! let source = DeviceSource::Single("10.0.0.1".to_string());
//! let mut prompter = ConsolePrompter::new();
//! let summary = driver::run(
//!     &config,
//!     &source,
//!     Some("show version"),
//!     &mut prompter,
//!     &connector,
//!     &mut std::io::stdout(),
//!     &mut std::io::stderr(),
//! );
//! ```

// Clippy configuration - allow common patterns
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod cli;
pub mod command;
pub mod config;
pub mod credentials;
pub mod devices;
pub mod driver;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod ssh;

// Re-export main types
pub use cli::Cli;
pub use command::RemoteCommand;
pub use config::Config;
pub use credentials::Credentials;
pub use devices::{DeviceSource, Target};
pub use driver::RunSummary;
pub use error::AppError;
pub use ssh::{CapturedOutput, SessionError, SessionRunner};
