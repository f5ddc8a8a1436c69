//! Transport
//!
//! The byte stream a connection owns.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A bidirectional byte stream that can be shut down explicitly
///
/// Dropping the value must release the underlying resource; `shutdown` only
/// tells the peer no more traffic is coming.
pub trait Transport: Read + Write {
    fn shutdown(&mut self) -> io::Result<()>;

    /// Peer address for logging
    fn peer_addr_string(&self) -> String {
        "unknown".to_string()
    }
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }

    fn peer_addr_string(&self) -> String {
        self.peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
}
