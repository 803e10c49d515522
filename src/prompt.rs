//! Operator prompts.
//!
//! Everything the tool asks the operator goes through the [`Prompter`]
//! trait so the collectors can be driven by scripted input in tests.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::command::RemoteCommand;

/// Message printed when the operator aborts input.
pub const INTERRUPT_MESSAGE: &str = "User exited by keyboard interrupt";

/// Set while a masked prompt has the terminal in no-echo mode.
static MASKED_INPUT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Returns true while a masked prompt owns the terminal.
///
/// The prompt restores the terminal itself and reports
/// [`PromptError::Interrupted`] on Ctrl+C, so a signal watcher must not
/// exit the process underneath it.
#[must_use]
pub fn masked_input_active() -> bool {
    MASKED_INPUT_ACTIVE.load(Ordering::SeqCst)
}

/// Marks a masked prompt as active until dropped.
struct MaskedInputGuard;

impl MaskedInputGuard {
    fn enter() -> Self {
        MASKED_INPUT_ACTIVE.store(true, Ordering::SeqCst);
        Self
    }
}

impl Drop for MaskedInputGuard {
    fn drop(&mut self) {
        MASKED_INPUT_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Errors that can occur while prompting.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The operator closed input or interrupted a prompt.
    #[error("User exited by keyboard interrupt")]
    Interrupted,

    /// The command prompt was answered with nothing.
    #[error("No command given")]
    EmptyCommand,

    /// Terminal I/O failed.
    #[error("Prompt I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PromptError {
    /// Maps a terminal read error, treating EOF and interrupts as an abort.
    fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted => Self::Interrupted,
            _ => Self::Io(err),
        }
    }
}

/// Source of operator input.
pub trait Prompter {
    /// Asks a question with echoed input. The line terminator is stripped.
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Asks a question with masked input.
    fn ask_secret(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Shows a notice to the operator.
    fn notify(&mut self, message: &str);
}

/// Prompter backed by stdin/stderr, with masked input through `rpassword`.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    /// Creates a console prompter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for ConsolePrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(PromptError::from_read)?;
        if read == 0 {
            return Err(PromptError::Interrupted);
        }
        Ok(strip_line_ending(&line).to_string())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String, PromptError> {
        // Echo is restored when rpassword returns, including on Ctrl+C
        let _guard = MaskedInputGuard::enter();
        rpassword::prompt_password(prompt).map_err(PromptError::from_read)
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Strips one trailing `\n` or `\r\n`.
fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Asks for the command to run against every device.
pub fn ask_command<P: Prompter + ?Sized>(prompter: &mut P) -> Result<RemoteCommand, PromptError> {
    let line = prompter.ask("Provide command to run against device: ")?;
    RemoteCommand::new(&line)
}
