//! Client
//!
//! The public entry point: a connection behind a mutex, the server error
//! policy, and typed wrappers for common commands.
//!
//! ## Error policy
//! `call` and `execute` follow `Config::error_policy`. With
//! `ErrorPolicy::Return` an `-ERR` reply comes back as `Reply::Error`; with
//! `ErrorPolicy::Raise` it becomes `RespError::Server`. Typed wrappers such
//! as `get` always raise, since their return type has no room for it.

use std::net::TcpStream;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::{Config, ConfigSet, ErrorPolicy};
use crate::error::{RespError, Result};
use crate::network::{Connection, Transport};
use crate::protocol::{Command, Reply, ToArg};

/// Client for one server
///
/// Calls take `&self`; the inner mutex keeps exactly one exchange in flight.
/// Share it between threads with `Arc<Client>` or give each caller its own.
pub struct Client<T: Transport = TcpStream> {
    connection: Mutex<Connection<T>>,
    error_policy: ErrorPolicy,
}

impl Client<TcpStream> {
    /// Connect to the server described by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let connection = Connection::open(config)?;
        Ok(Self::from_connection(connection, config.error_policy))
    }

    /// Connect using the named configuration, or the set's default
    pub fn from_config_set(set: &ConfigSet, name: Option<&str>) -> Result<Self> {
        Self::open(set.select(name)?)
    }
}

impl<T: Transport> Client<T> {
    /// Wrap an already established connection
    pub fn from_connection(connection: Connection<T>, error_policy: ErrorPolicy) -> Self {
        Self {
            connection: Mutex::new(connection),
            error_policy,
        }
    }

    // =========================================================================
    // Generic Entry Points
    // =========================================================================

    /// Send any command by name
    pub fn call<A: ToArg>(&self, name: &str, args: &[A]) -> Result<Reply> {
        let reply = self.connection.lock().call(name, args)?;
        self.apply_policy(reply)
    }

    /// Send a prepared command
    pub fn execute(&self, command: &Command) -> Result<Reply> {
        let reply = self.connection.lock().execute(command)?;
        self.apply_policy(reply)
    }

    fn apply_policy(&self, reply: Reply) -> Result<Reply> {
        match (self.error_policy, reply) {
            (ErrorPolicy::Raise, Reply::Error(message)) => Err(RespError::Server(message)),
            (_, reply) => Ok(reply),
        }
    }

    /// Call and raise error replies regardless of policy
    fn checked(&self, command: Command) -> Result<Reply> {
        match self.connection.lock().execute(&command)? {
            Reply::Error(message) => Err(RespError::Server(message)),
            reply => Ok(reply),
        }
    }

    // =========================================================================
    // Typed Wrappers
    // =========================================================================

    /// PING; returns the status text (normally `PONG`)
    pub fn ping(&self) -> Result<String> {
        match self.checked(Command::new("PING"))? {
            Reply::Status(text) => Ok(text),
            other => Err(unexpected("PING", &other)),
        }
    }

    /// ECHO; returns the message as sent back
    pub fn echo<M: ToArg + ?Sized>(&self, message: &M) -> Result<Bytes> {
        match self.checked(Command::new("ECHO").arg(message))? {
            Reply::BulkString(Some(bytes)) => Ok(bytes),
            other => Err(unexpected("ECHO", &other)),
        }
    }

    /// GET; `None` when the key does not exist
    pub fn get<K: ToArg + ?Sized>(&self, key: &K) -> Result<Option<Bytes>> {
        match self.checked(Command::new("GET").arg(key))? {
            Reply::BulkString(value) => Ok(value),
            other => Err(unexpected("GET", &other)),
        }
    }

    /// SET without expiry
    pub fn set<K: ToArg + ?Sized, V: ToArg + ?Sized>(&self, key: &K, value: &V) -> Result<()> {
        expect_ok("SET", self.checked(Command::new("SET").arg(key).arg(value))?)
    }

    /// SET with an expiry in seconds
    pub fn set_ex<K: ToArg + ?Sized, V: ToArg + ?Sized>(
        &self,
        key: &K,
        value: &V,
        seconds: u64,
    ) -> Result<()> {
        let command = Command::new("SET").arg(key).arg(value).arg("EX").arg(&seconds);
        expect_ok("SET", self.checked(command)?)
    }

    /// DEL; returns how many keys were removed
    pub fn del<K: ToArg>(&self, keys: &[K]) -> Result<i64> {
        expect_integer("DEL", self.checked(Command::new("DEL").args(keys))?)
    }

    /// EXISTS for a single key
    pub fn exists<K: ToArg + ?Sized>(&self, key: &K) -> Result<bool> {
        expect_integer("EXISTS", self.checked(Command::new("EXISTS").arg(key))?).map(|n| n > 0)
    }

    /// INCRBY; returns the new value
    pub fn incr_by<K: ToArg + ?Sized>(&self, key: &K, delta: i64) -> Result<i64> {
        expect_integer("INCRBY", self.checked(Command::new("INCRBY").arg(key).arg(&delta))?)
    }

    /// EXPIRE; false when the key does not exist
    pub fn expire<K: ToArg + ?Sized>(&self, key: &K, seconds: u64) -> Result<bool> {
        expect_integer("EXPIRE", self.checked(Command::new("EXPIRE").arg(key).arg(&seconds))?)
            .map(|n| n == 1)
    }

    /// TTL in seconds; `None` when the key is missing or has no expiry
    pub fn ttl<K: ToArg + ?Sized>(&self, key: &K) -> Result<Option<i64>> {
        let ttl = expect_integer("TTL", self.checked(Command::new("TTL").arg(key))?)?;
        Ok((ttl >= 0).then_some(ttl))
    }

    /// KEYS matching a glob pattern
    pub fn keys<P: ToArg + ?Sized>(&self, pattern: &P) -> Result<Vec<Bytes>> {
        match self.checked(Command::new("KEYS").arg(pattern))? {
            Reply::Array(items) => items
                .unwrap_or_default()
                .into_iter()
                .map(|item| match item {
                    Reply::BulkString(Some(key)) => Ok(key),
                    other => Err(unexpected("KEYS", &other)),
                })
                .collect(),
            other => Err(unexpected("KEYS", &other)),
        }
    }

    /// FLUSHDB on the selected database
    pub fn flush_db(&self) -> Result<()> {
        expect_ok("FLUSHDB", self.checked(Command::new("FLUSHDB"))?)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the connection; later calls fail with `RespError::Closed`
    pub fn close(&self) {
        self.connection.lock().close();
    }

    pub fn is_ready(&self) -> bool {
        self.connection.lock().is_ready()
    }
}

fn expect_ok(command: &str, reply: Reply) -> Result<()> {
    if reply.is_ok() {
        Ok(())
    } else {
        Err(unexpected(command, &reply))
    }
}

fn expect_integer(command: &str, reply: Reply) -> Result<i64> {
    reply.as_integer().ok_or_else(|| unexpected(command, &reply))
}

fn unexpected(command: &str, reply: &Reply) -> RespError {
    RespError::Protocol(format!("Unexpected {} reply to {}", reply.kind(), command))
}
