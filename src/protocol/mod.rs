//! Protocol Module
//!
//! Defines the wire protocol spoken with the server (RESP).
//!
//! ## Request Format
//! Every command is an array of bulk strings, the name first:
//! ```text
//! *3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n
//! ```
//!
//! ## Reply Markers
//! - `+`: status line
//! - `-`: error line
//! - `:`: signed 64-bit integer
//! - `$`: length-prefixed bulk string (`$-1` is nil)
//! - `*`: array of replies, possibly nested (`*-1` is nil)

mod command;
mod reply;
mod codec;

pub use command::{Command, ToArg};
pub use reply::Reply;
pub use codec::{
    decode_reply, encode_command, encode_reply, read_reply, write_command, write_reply, CRLF,
    MAX_BULK_LEN, MAX_LINE_LEN, MAX_NESTING_DEPTH,
};
