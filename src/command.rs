//! The single command sent to every device.

use std::fmt;

use crate::prompt::PromptError;

/// A command line ready for transmission to a remote shell.
///
/// Always ends with exactly one `\n`; the text before it is reused
/// verbatim for every target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand(String);

impl RemoteCommand {
    /// Builds a command from operator input.
    ///
    /// Trailing line terminators are normalized to a single `\n`.
    ///
    /// # Errors
    /// Returns `PromptError::EmptyCommand` if nothing but whitespace was given.
    pub fn new(input: &str) -> Result<Self, PromptError> {
        let line = input.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(PromptError::EmptyCommand);
        }
        Ok(Self(format!("{}\n", line)))
    }

    /// The command text without its line terminator.
    #[must_use]
    pub fn text(&self) -> &str {
        self.0.trim_end_matches('\n')
    }

    /// The bytes written to the channel, terminator included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
