//! Network Module
//!
//! TCP connection handling.
//!
//! ## Architecture
//! - `Transport`: the byte stream a connection owns (TCP in production)
//! - `Connection`: handshake plus one blocking request/reply exchange at a time

mod transport;
mod connection;

pub use transport::Transport;
pub use connection::{Connection, ConnectionState};
