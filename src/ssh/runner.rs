//! Per-device session runner.
//!
//! Drives one interactive shell through a fixed script: disable
//! pagination, drain the banner, send the command, capture one bounded
//! read of output. Synchronization is timing based; the runner waits a
//! settle duration after each send instead of detecting the prompt.

use std::fmt;
use std::io;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::{SessionError, SessionErrorKind, SessionState};
use super::transport::{Connector, ShellChannel, Transport};
use crate::command::RemoteCommand;
use crate::credentials::Credentials;
use crate::devices::Target;

/// Default wait after each send.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(4);

/// Default bound on each read, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 524_280;

/// Largest accepted read bound, in bytes (16MB).
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Default pagination-disable command.
pub const DEFAULT_PAGINATION_COMMAND: &str = "term len 0";

/// Script parameters for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Wait after each send before reading.
    pub settle: Duration,
    /// Upper bound on each read.
    pub buffer_size: usize,
    /// Command that turns off the remote pager.
    pub pagination_command: String,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            pagination_command: DEFAULT_PAGINATION_COMMAND.to_string(),
        }
    }
}

/// Text a device returned for the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    text: String,
    bytes_read: usize,
    filled_buffer: bool,
}

impl CapturedOutput {
    fn from_bytes(bytes: &[u8], buffer_size: usize) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
            bytes_read: bytes.len(),
            filled_buffer: bytes.len() >= buffer_size,
        }
    }

    /// The decoded output. Invalid UTF-8 is replaced.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of raw bytes captured.
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Returns true if the read filled the buffer, so more output may
    /// have been left unread.
    #[must_use]
    pub fn may_be_truncated(&self) -> bool {
        self.filled_buffer
    }
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Closes a transport exactly once, on every exit path.
struct TransportGuard<'t, T: Transport> {
    transport: T,
    target: &'t Target,
    closed: bool,
}

impl<'t, T: Transport> TransportGuard<'t, T> {
    fn new(transport: T, target: &'t Target) -> Self {
        Self {
            transport,
            target,
            closed: false,
        }
    }

    fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.transport.close() {
            debug!("Error while closing session to {}: {}", self.target, e);
        }
        debug!("{}: {}", self.target, SessionState::Closed);
    }
}

impl<T: Transport> Drop for TransportGuard<'_, T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs the command script against one device at a time.
#[derive(Debug)]
pub struct SessionRunner<'c, C: Connector> {
    connector: &'c C,
    options: RunnerOptions,
}

impl<'c, C: Connector> SessionRunner<'c, C> {
    /// Creates a runner over `connector`.
    #[must_use]
    pub fn new(connector: &'c C, options: RunnerOptions) -> Self {
        Self { connector, options }
    }

    /// Executes `command` on `target` and returns what the device printed.
    ///
    /// The transport is closed before this returns, whether or not the
    /// session succeeded. A short or truncated reply is returned as-is.
    pub fn run(
        &self,
        target: &Target,
        credentials: &Credentials,
        command: &RemoteCommand,
    ) -> Result<CapturedOutput, SessionError> {
        info!("Opening session to {} as {}", target, credentials.username());

        let transport = self.connector.connect(target, credentials)?;
        let mut guard = TransportGuard::new(transport, target);
        let mut state = SessionState::Connected;
        debug!("{}: {}", target, state);

        let result = self.script(guard.transport_mut(), target, command, &mut state);
        guard.close();

        match &result {
            Ok(output) => info!(
                "Captured {} bytes from {}{}",
                output.bytes_read(),
                target,
                if output.may_be_truncated() {
                    " (buffer full, output may be truncated)"
                } else {
                    ""
                }
            ),
            Err(e) => warn!("Session to {} failed while {}: {}", target, e.state(), e),
        }
        result
    }

    fn script(
        &self,
        transport: &mut C::Transport,
        target: &Target,
        command: &RemoteCommand,
        state: &mut SessionState,
    ) -> Result<CapturedOutput, SessionError> {
        let mut shell = transport.open_shell().map_err(|e| e.at(*state))?;
        advance(state, SessionState::ShellOpened, target);

        let pagination = format!("{}\n", self.options.pagination_command);
        self.send(&mut shell, pagination.as_bytes(), *state)?;
        self.settle();
        advance(state, SessionState::PaginationDisabled, target);

        let buffer_size = self.options.buffer_size.min(MAX_BUFFER_SIZE);
        let mut buf = vec![0u8; buffer_size];
        let discarded = read_once(&mut shell, &mut buf, *state)?;
        debug!("{}: discarded {} bytes of banner", target, discarded);
        advance(state, SessionState::BufferCleared, target);

        self.send(&mut shell, command.as_bytes(), *state)?;
        self.settle();
        advance(state, SessionState::CommandSent, target);

        let read = read_once(&mut shell, &mut buf, *state)?;
        let output = CapturedOutput::from_bytes(&buf[..read], buffer_size);
        advance(state, SessionState::OutputReceived, target);

        Ok(output)
    }

    fn send<S: ShellChannel>(
        &self,
        shell: &mut S,
        data: &[u8],
        state: SessionState,
    ) -> Result<(), SessionError> {
        shell
            .send(data)
            .map_err(|e| SessionError::from_io(SessionErrorKind::Io, &e).at(state))
    }

    fn settle(&self) {
        if !self.options.settle.is_zero() {
            thread::sleep(self.options.settle);
        }
    }
}

fn advance(state: &mut SessionState, next: SessionState, target: &Target) {
    *state = next;
    debug!("{}: {}", target, next);
}

/// Performs one read of at most `buf.len()` bytes.
///
/// A read that times out with nothing pending counts as zero bytes.
fn read_once<S: ShellChannel>(
    shell: &mut S,
    buf: &mut [u8],
    state: SessionState,
) -> Result<usize, SessionError> {
    loop {
        match shell.recv(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                debug!("Read while {} returned nothing before timeout", state);
                return Ok(0);
            }
            Err(e) => return Err(SessionError::from_io(SessionErrorKind::Io, &e).at(state)),
        }
    }
}
