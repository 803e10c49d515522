//! Top-level errors that end a run.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::devices::ResolveError;
use crate::prompt::PromptError;

/// Errors that stop devrun before or after the device loop.
///
/// Per-device session failures are not here; the driver reports them and
/// moves on.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Targets could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Operator input failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Writing results to the console failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),

    /// No device produced output.
    #[error("All {0} device(s) failed")]
    AllDevicesFailed(usize),
}

impl AppError {
    /// Returns true if the operator aborted input.
    #[must_use]
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            Self::Prompt(PromptError::Interrupted)
                | Self::Resolve(ResolveError::Prompt(PromptError::Interrupted))
        )
    }
}
