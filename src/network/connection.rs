//! Connection
//!
//! Owns one transport stream and runs strict request/reply exchanges on it.

use std::fmt;
use std::io::{self, BufReader, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};

use crate::config::Config;
use crate::error::{RespError, Result};
use crate::protocol::{read_reply, write_command, Command, Reply, ToArg};
use super::Transport;

/// Lifecycle of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport established, handshake not started
    Connecting,

    /// AUTH / SELECT in flight
    Authenticating,

    /// Accepting calls
    Ready,

    /// Transport released; every call fails with `RespError::Closed`
    Closed,
}

/// A single server connection
///
/// One exchange is in flight at a time: `call` writes the whole command and
/// reads exactly one reply before returning. Any transport or framing error
/// closes the connection, since the stream offset is then unknown.
pub struct Connection<T: Transport = TcpStream> {
    /// Buffered stream; `None` once released
    stream: Option<BufReader<T>>,

    state: ConnectionState,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection<TcpStream> {
    /// Connect over TCP and run the handshake
    ///
    /// Every resolved address is tried in turn with the configured connect
    /// timeout; the error carries the last failure reason.
    ///
    /// The connect timeout bounds each TCP connect attempt only. Host name
    /// resolution goes through the system resolver first and may block for
    /// as long as the resolver's own timeout.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let addr = config.addr();

        let socket_addrs = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| RespError::Connection(format!("failed to resolve {}: {}", addr, e)))?;

        let mut last_error = None;
        let mut connected = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, config.connect_timeout()) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", socket_addr, e);
                    last_error = Some(e);
                }
            }
        }

        let stream = connected.ok_or_else(|| {
            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string());
            RespError::Connection(format!("failed to connect to {}: {}", addr, reason))
        })?;

        configure_socket(&stream, config).map_err(|e| {
            RespError::Connection(format!("failed to configure socket for {}: {}", addr, e))
        })?;

        tracing::debug!("Connected to {}", addr);
        Self::from_transport(stream, config)
    }
}

/// Disable Nagle's algorithm and apply per-call timeouts
fn configure_socket(stream: &TcpStream, config: &Config) -> io::Result<()> {
    stream.set_nodelay(true)?;
    stream.set_read_timeout(config.read_timeout())?;
    stream.set_write_timeout(config.write_timeout())?;
    Ok(())
}

impl<T: Transport> Connection<T> {
    /// Wrap an established transport and run the handshake
    ///
    /// With a non-empty password, AUTH must answer `+OK`; with a non-zero
    /// database, SELECT must answer `+OK`. On any failure the transport is
    /// released before the error is returned.
    pub fn from_transport(transport: T, config: &Config) -> Result<Self> {
        let peer_addr = transport.peer_addr_string();
        let mut connection = Self {
            stream: Some(BufReader::new(transport)),
            state: ConnectionState::Connecting,
            peer_addr,
        };

        if let Err(e) = connection.handshake(config) {
            tracing::warn!("Handshake with {} failed: {}", connection.peer_addr, e);
            connection.close();
            return Err(e);
        }

        Ok(connection)
    }

    fn handshake(&mut self, config: &Config) -> Result<()> {
        let password = config.auth_password();
        if password.is_none() && config.database == 0 {
            self.state = ConnectionState::Ready;
            return Ok(());
        }

        self.state = ConnectionState::Authenticating;

        if let Some(password) = password {
            tracing::debug!("Authenticating with {}", self.peer_addr);
            let reply = self.exchange("AUTH", &[password])?;
            if !reply.is_ok() {
                return Err(RespError::Authentication(describe(&reply)));
            }
        }

        if config.database != 0 {
            tracing::debug!("Selecting database {} on {}", config.database, self.peer_addr);
            let reply = self.exchange("SELECT", &[config.database])?;
            if !reply.is_ok() {
                return Err(RespError::Server(format!(
                    "SELECT {} failed: {}",
                    config.database,
                    describe(&reply)
                )));
            }
        }

        self.state = ConnectionState::Ready;
        Ok(())
    }

    /// Send a command and read its reply
    ///
    /// Error replies come back as `Ok(Reply::Error(..))` and leave the
    /// connection ready.
    pub fn call<A: ToArg>(&mut self, name: &str, args: &[A]) -> Result<Reply> {
        if self.state != ConnectionState::Ready {
            return Err(RespError::Closed);
        }
        self.exchange(name, args)
    }

    /// Send a prepared command and read its reply
    pub fn execute(&mut self, command: &Command) -> Result<Reply> {
        self.call(&command.name, command.args.as_slice())
    }

    /// One write-then-read turn; closes the connection on failure
    fn exchange<A: ToArg>(&mut self, name: &str, args: &[A]) -> Result<Reply> {
        let stream = self.stream.as_mut().ok_or(RespError::Closed)?;

        tracing::trace!("Sending {} to {}", name, self.peer_addr);

        match round_trip(stream, name, args) {
            Ok(reply) => {
                tracing::trace!("Received {} reply from {}", reply.kind(), self.peer_addr);
                Ok(reply)
            }
            Err(e) => {
                let e = into_connection_error(e);
                tracing::warn!("Closing connection to {} after {}: {}", self.peer_addr, name, e);
                self.close();
                Err(e)
            }
        }
    }

    /// Release the transport
    ///
    /// Safe to call any number of times; only the first call does anything.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.get_mut().shutdown() {
                tracing::trace!("Shutdown of {} reported: {}", self.peer_addr, e);
            }
            tracing::debug!("Connection to {} closed", self.peer_addr);
        }
        self.state = ConnectionState::Closed;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("state", &self.state)
            .finish()
    }
}

fn round_trip<T: Transport, A: ToArg>(
    stream: &mut BufReader<T>,
    name: &str,
    args: &[A],
) -> Result<Reply> {
    write_command(stream.get_mut(), name, args)?;
    read_reply(stream)
}

/// Report transport failures as connection errors with their reason
fn into_connection_error(error: RespError) -> RespError {
    match error {
        RespError::Io(e) => match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                RespError::Connection(format!("timed out: {}", e))
            }
            ErrorKind::UnexpectedEof => {
                RespError::Connection("server closed the connection".to_string())
            }
            _ => RespError::Connection(e.to_string()),
        },
        other => other,
    }
}

/// Text of a handshake reply for error messages
fn describe(reply: &Reply) -> String {
    match reply.as_str() {
        Some(text) => text.to_string(),
        None => format!("unexpected {} reply", reply.kind()),
    }
}
