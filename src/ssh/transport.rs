//! Transport seam and its `ssh2` implementation.
//!
//! The session runner only sees the [`Connector`], [`Transport`] and
//! [`ShellChannel`] traits. [`Ssh2Connector`] is the production backend.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ssh2::{ErrorCode, HashType, Session};
use tracing::{debug, warn};

use super::error::{SessionError, SessionErrorKind};
use crate::credentials::Credentials;
use crate::devices::Target;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Terminal type requested for the interactive shell.
const TERMINAL_TYPE: &str = "vt100";

/// Terminal size requested for the interactive shell (cols, rows).
const TERMINAL_SIZE: (u32, u32) = (80, 24);

/// libssh2 error code for a timed out blocking call.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

/// Opens authenticated transports to targets.
pub trait Connector {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Connects to `target` and authenticates with `credentials`.
    fn connect(
        &self,
        target: &Target,
        credentials: &Credentials,
    ) -> Result<Self::Transport, SessionError>;
}

/// One authenticated connection to one device.
pub trait Transport {
    /// Shell channel produced by this transport.
    type Shell: ShellChannel;

    /// Opens an interactive shell channel.
    fn open_shell(&mut self) -> Result<Self::Shell, SessionError>;

    /// Tears the connection down.
    fn close(&mut self) -> Result<(), SessionError>;
}

/// An interactive remote terminal with no message framing.
pub trait ShellChannel {
    /// Writes all of `data` as keystrokes.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Reads whatever is pending, at most `buf.len()` bytes.
    ///
    /// `Ok(0)` means the remote closed the channel.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Connection parameters for [`Ssh2Connector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// SSH port.
    pub port: u16,
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on any single blocking SSH operation afterwards.
    pub io_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_CONNECT_TIMEOUT * 2,
        }
    }
}

/// Password-authenticated SSH connector built on `ssh2`.
///
/// Host keys are not verified: whatever key the device presents is
/// accepted and its fingerprint logged.
#[derive(Debug, Clone, Default)]
pub struct Ssh2Connector {
    options: ConnectOptions,
}

impl Ssh2Connector {
    /// Creates a connector with the given options.
    #[must_use]
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }

    /// Opens a TCP stream to the first reachable resolved address.
    fn open_tcp(&self, target: &Target) -> Result<TcpStream, SessionError> {
        let addrs = (target.host(), self.options.port)
            .to_socket_addrs()
            .map_err(|e| SessionError::from_io(SessionErrorKind::Connect, &e))?;

        let mut last_error = None;
        for addr in addrs {
            debug!("Connecting to {} (timeout {:?})", addr, self.options.connect_timeout);
            match TcpStream::connect_timeout(&addr, self.options.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => SessionError::from_io(SessionErrorKind::Connect, &e),
            None => SessionError::new(
                SessionErrorKind::Connect,
                format!("No addresses resolved for {}", target),
            ),
        })
    }
}

impl Connector for Ssh2Connector {
    type Transport = Ssh2Transport;

    fn connect(
        &self,
        target: &Target,
        credentials: &Credentials,
    ) -> Result<Ssh2Transport, SessionError> {
        let tcp = self.open_tcp(target)?;

        // Set read/write timeouts to prevent indefinite hangs
        let io_timeout = Some(self.options.io_timeout);
        let _ = tcp.set_read_timeout(io_timeout);
        let _ = tcp.set_write_timeout(io_timeout);

        let mut session =
            Session::new().map_err(|e| ssh_error(SessionErrorKind::Handshake, &e))?;
        session.set_timeout(timeout_millis(self.options.io_timeout));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ssh_error(SessionErrorKind::Handshake, &e))?;

        match session.host_key_hash(HashType::Sha256) {
            Some(hash) => warn!(
                "Accepting unverified host key for {}: SHA256 {}",
                target,
                fingerprint(hash)
            ),
            None => warn!("Accepting unverified host key for {}", target),
        }

        session
            .userauth_password(credentials.username(), credentials.password())
            .map_err(|e| ssh_error(SessionErrorKind::Authentication, &e))?;
        if !session.authenticated() {
            return Err(SessionError::new(
                SessionErrorKind::Authentication,
                format!("Server did not accept credentials for {}", credentials.username()),
            ));
        }

        Ok(Ssh2Transport {
            session,
            target: target.clone(),
        })
    }
}

/// An authenticated `ssh2` session.
pub struct Ssh2Transport {
    session: Session,
    target: Target,
}

impl Transport for Ssh2Transport {
    type Shell = Ssh2Shell;

    fn open_shell(&mut self) -> Result<Ssh2Shell, SessionError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| ssh_error(SessionErrorKind::Channel, &e))?;
        channel
            .request_pty(
                TERMINAL_TYPE,
                None,
                Some((TERMINAL_SIZE.0, TERMINAL_SIZE.1, 0, 0)),
            )
            .map_err(|e| ssh_error(SessionErrorKind::Channel, &e))?;
        channel
            .shell()
            .map_err(|e| ssh_error(SessionErrorKind::Channel, &e))?;
        Ok(Ssh2Shell { channel })
    }

    fn close(&mut self) -> Result<(), SessionError> {
        debug!("Disconnecting from {}", self.target);
        self.session
            .disconnect(None, "devrun session complete", None)
            .map_err(|e| ssh_error(SessionErrorKind::Io, &e))
    }
}

/// An interactive shell on an `ssh2` channel.
pub struct Ssh2Shell {
    channel: ssh2::Channel,
}

impl ShellChannel for Ssh2Shell {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.channel.write_all(data)?;
        self.channel.flush()
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.channel.read(buf)
    }
}

/// Maps an `ssh2` error, keeping timeouts distinct.
fn ssh_error(fallback: SessionErrorKind, err: &ssh2::Error) -> SessionError {
    let kind = match err.code() {
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => SessionErrorKind::Timeout,
        _ => fallback,
    };
    SessionError::new(kind, err.message().to_string())
}

/// Converts a timeout to libssh2 milliseconds, saturating.
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

/// Formats a host key hash as colon-separated hex.
fn fingerprint(hash: &[u8]) -> String {
    hash.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
