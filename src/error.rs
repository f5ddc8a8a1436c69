//! Error types for resplite
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using RespError
pub type Result<T> = std::result::Result<T, RespError>;

/// Unified error type for resplite operations
#[derive(Debug, Error)]
pub enum RespError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Connect, DNS, timeout or mid-exchange failure of the transport
    #[error("Connection error: {0}")]
    Connection(String),

    /// Raw I/O failure from the codec on an arbitrary reader or writer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before this call
    #[error("Connection is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Handshake Errors
    // -------------------------------------------------------------------------
    #[error("Authentication failed: {0}")]
    Authentication(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Server Errors
    // -------------------------------------------------------------------------
    /// An error reply raised by the client's error policy
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RespError {
    /// Whether the connection that produced this error must be discarded.
    ///
    /// Server and configuration errors leave framing intact; everything else
    /// leaves the stream at an unknown offset or never had a stream at all.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RespError::Server(_) | RespError::Config(_))
    }
}
