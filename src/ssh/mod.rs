//! SSH session module.
//!
//! Provides functionality for:
//! - Opening password-authenticated SSH transports to devices
//! - Driving one interactive shell per device through a fixed script
//! - Guaranteed teardown of every transport, success or failure
//!
//! # Host keys
//!
//! Host keys are accepted without verification against a known-hosts
//! store. The fingerprint of every accepted key is logged at `warn`.

pub mod error;
pub mod runner;
pub mod transport;

pub use error::{SessionError, SessionErrorKind, SessionState};
pub use runner::{CapturedOutput, RunnerOptions, SessionRunner};
pub use transport::{ConnectOptions, Connector, ShellChannel, Ssh2Connector, Transport};
