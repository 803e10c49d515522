//! Run orchestration.
//!
//! Gathers operator input, then walks the targets one at a time. A failed
//! device is reported and skipped; it never stops the remaining devices.

use std::io::Write;

use tracing::{error, info};

use crate::command::RemoteCommand;
use crate::config::Config;
use crate::credentials::{Credentials, collect_credentials};
use crate::devices::{self, DeviceSource, Target};
use crate::error::AppError;
use crate::prompt::{self, Prompter};
use crate::ssh::{Connector, SessionError, SessionRunner};

/// Outcome of a run across all targets.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Targets that returned output, in order.
    pub succeeded: Vec<Target>,
    /// Targets that failed, in order, with the reason.
    pub failed: Vec<(Target, SessionError)>,
}

impl RunSummary {
    /// Total targets attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Ok if at least one target succeeded.
    pub fn into_result(self) -> Result<Self, AppError> {
        if self.succeeded.is_empty() {
            Err(AppError::AllDevicesFailed(self.attempted()))
        } else {
            Ok(self)
        }
    }
}

/// Runs `command` against every target in order.
///
/// Output for each success goes to `out`, preceded by a header when there
/// is more than one target. Each failure is one line on `err`.
pub fn run_targets<C, W, E>(
    runner: &SessionRunner<'_, C>,
    targets: &[Target],
    credentials: &Credentials,
    command: &RemoteCommand,
    out: &mut W,
    err: &mut E,
) -> Result<RunSummary, AppError>
where
    C: Connector,
    W: Write + ?Sized,
    E: Write + ?Sized,
{
    let mut summary = RunSummary::default();
    let with_headers = targets.len() > 1;

    for target in targets {
        match runner.run(target, credentials, command) {
            Ok(output) => {
                if with_headers {
                    writeln!(out, "--- {} ---", target)?;
                }
                writeln!(out, "{}", output)?;
                out.flush()?;
                summary.succeeded.push(target.clone());
            }
            Err(e) => {
                error!("{}: {}", target, e);
                writeln!(err, "{}: {}", target, e)?;
                summary.failed.push((target.clone(), e));
            }
        }
    }

    info!(
        "Run complete: {} succeeded, {} failed",
        summary.succeeded.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Runs a full invocation: resolve targets, collect input, execute.
///
/// Non-interactive sources are resolved before the first prompt so bad
/// input fails without asking for a password. `command` skips the command
/// prompt when given.
pub fn run<P, C, W, E>(
    config: &Config,
    source: &DeviceSource,
    command: Option<&str>,
    prompter: &mut P,
    connector: &C,
    out: &mut W,
    err: &mut E,
) -> Result<RunSummary, AppError>
where
    P: Prompter + ?Sized,
    C: Connector,
    W: Write + ?Sized,
    E: Write + ?Sized,
{
    let early_targets = if source.is_interactive() {
        None
    } else {
        Some(devices::resolve(source, prompter)?)
    };

    let credentials = collect_credentials(prompter, config.username.as_deref())?;

    let targets = match early_targets {
        Some(targets) => targets,
        None => devices::resolve(source, prompter)?,
    };

    let command = match command {
        Some(text) => RemoteCommand::new(text)?,
        None => prompt::ask_command(prompter)?,
    };

    info!(
        "Running '{}' against {} device(s) as {}",
        command,
        targets.len(),
        credentials.username()
    );
    writeln!(out, "Gathering data...\n")?;

    let runner = SessionRunner::new(connector, config.runner_options());
    run_targets(&runner, &targets, &credentials, &command, out, err)
}
