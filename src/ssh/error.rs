//! Per-device session errors.

use std::fmt;
use std::io;

use thiserror::Error;

/// Where a device session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No transport yet.
    #[default]
    Disconnected,
    /// Transport established and authenticated.
    Connected,
    /// Interactive shell channel open.
    ShellOpened,
    /// Pagination-disable command sent and settled.
    PaginationDisabled,
    /// Banner and echo noise drained.
    BufferCleared,
    /// Operator command sent and settled.
    CommandSent,
    /// Command output captured.
    OutputReceived,
    /// Transport torn down.
    Closed,
}

impl SessionState {
    /// Returns a display string for the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::ShellOpened => "shell opened",
            Self::PaginationDisabled => "pagination disabled",
            Self::BufferCleared => "buffer cleared",
            Self::CommandSent => "command sent",
            Self::OutputReceived => "output received",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// TCP connection could not be made (refused, unreachable, DNS).
    Connect,
    /// An operation exceeded its time bound.
    Timeout,
    /// SSH protocol negotiation failed.
    Handshake,
    /// The device rejected the credentials.
    Authentication,
    /// The interactive channel could not be opened.
    Channel,
    /// Sending or receiving failed mid-session.
    Io,
}

impl SessionErrorKind {
    /// Returns a display string for the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "Connection failed",
            Self::Timeout => "Timed out",
            Self::Handshake => "SSH handshake failed",
            Self::Authentication => "Authentication failed",
            Self::Channel => "Shell channel failed",
            Self::Io => "Session I/O failed",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure while talking to one device.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct SessionError {
    kind: SessionErrorKind,
    state: SessionState,
    message: String,
}

impl SessionError {
    /// Creates an error raised before any transport existed.
    #[must_use]
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            state: SessionState::Disconnected,
            message: message.into(),
        }
    }

    /// Classifies an I/O error, keeping timeouts distinct.
    #[must_use]
    pub fn from_io(fallback: SessionErrorKind, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::TimedOut => SessionErrorKind::Timeout,
            _ => fallback,
        };
        Self::new(kind, err.to_string())
    }

    /// Records the state the session was in when this error happened.
    #[must_use]
    pub fn at(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> SessionErrorKind {
        self.kind
    }

    /// The session state at the time of failure.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The descriptive message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
