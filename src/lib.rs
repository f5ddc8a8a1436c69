//! # resplite
//!
//! A minimal, blocking client for the Redis serialization protocol (RESP):
//! - Binary-safe command encoding
//! - Streaming decoder for every reply kind, nested arrays included
//! - Connection lifecycle with an optional AUTH / SELECT handshake
//! - Thin client facade with a generic `call(name, args)` entry point
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Client                              │
//! │           call(name, args) / typed wrappers                  │
//! │              (mutex, server error policy)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Connection                            │
//! │          handshake, one exchange in flight, close            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Encoder   │          │   Decoder   │
//!   │  (Command)  │          │   (Reply)   │
//!   └──────┬──────┘          └──────▲──────┘
//!          │                        │
//!          ▼                        │
//!   ┌─────────────────────────────────────┐
//!   │        Transport (TcpStream)        │
//!   └─────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use resplite::{Client, Config, Reply};
//!
//! let client = Client::open(&Config::builder().host("127.0.0.1").port(6379).build())?;
//! client.set("greeting", "hello")?;
//! let reply = client.call("GET", &["greeting"])?;
//! assert_eq!(reply, Reply::bulk("hello"));
//! # Ok::<(), resplite::RespError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RespError, Result};
pub use config::{Config, ConfigSet, ErrorPolicy};
pub use protocol::{Command, Reply, ToArg};
pub use network::{Connection, ConnectionState, Transport};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of resplite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
