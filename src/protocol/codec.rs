//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<name>\r\n
//! $<len>\r\n<arg 1>\r\n
//! ...
//! ```
//!
//! ### Reply Format (first byte selects the kind)
//! ```text
//! +<status>\r\n
//! -<error>\r\n
//! :<integer>\r\n
//! $<len>\r\n<len bytes>\r\n        $-1\r\n  (nil)
//! *<count>\r\n<count replies>       *-1\r\n  (nil)
//! ```
//!
//! Bulk payloads are read by their declared length, never by line, so they
//! may contain any byte including `\r\n`.

use std::io::{BufRead, Cursor, ErrorKind, Read, Write};

use bytes::Bytes;

use crate::error::{RespError, Result};
use super::{Reply, ToArg};

/// Line terminator used by every frame
pub const CRLF: &[u8] = b"\r\n";

/// Largest bulk string accepted (512 MB, the server's own ceiling)
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Longest header or status line accepted, terminator included
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Deepest array nesting accepted
pub const MAX_NESTING_DEPTH: usize = 64;

// Upper bound on speculative preallocation driven by a declared length
const PREALLOC_LIMIT: usize = 64 * 1024;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command to bytes
///
/// The name is upper-cased and framed as the first bulk string; every
/// argument follows as its own bulk string, prefixed with its byte length.
pub fn encode_command<A: ToArg>(name: &str, args: &[A]) -> Vec<u8> {
    let name = name.to_ascii_uppercase();
    let args: Vec<Bytes> = args.iter().map(ToArg::to_arg).collect();

    let payload_len: usize = args.iter().map(|a| a.len() + 16).sum();
    let mut message = Vec::with_capacity(32 + name.len() + payload_len);

    push_header(&mut message, b'*', args.len() as i64 + 1);
    push_bulk(&mut message, name.as_bytes());
    for arg in &args {
        push_bulk(&mut message, arg);
    }

    message
}

/// Write a command to a stream
pub fn write_command<W: Write, A: ToArg>(writer: &mut W, name: &str, args: &[A]) -> Result<()> {
    let bytes = encode_command(name, args);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn push_header(buf: &mut Vec<u8>, marker: u8, n: i64) {
    buf.push(marker);
    buf.extend_from_slice(n.to_string().as_bytes());
    buf.extend_from_slice(CRLF);
}

fn push_bulk(buf: &mut Vec<u8>, bytes: &[u8]) {
    push_header(buf, b'$', bytes.len() as i64);
    buf.extend_from_slice(bytes);
    buf.extend_from_slice(CRLF);
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Read one complete reply from a stream
///
/// Blocks until the whole reply, nested arrays included, has been read.
/// A stream that ends early yields `RespError::Io` with `UnexpectedEof`.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    read_reply_at_depth(reader, 0)
}

/// Decode one reply from a buffer
///
/// Returns the reply and the number of bytes it occupied.
pub fn decode_reply(bytes: &[u8]) -> Result<(Reply, usize)> {
    let mut cursor = Cursor::new(bytes);
    match read_reply(&mut cursor) {
        Ok(reply) => Ok((reply, cursor.position() as usize)),
        Err(RespError::Io(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(RespError::Protocol(format!(
                "Incomplete reply: {} bytes buffered",
                bytes.len()
            )))
        }
        Err(e) => Err(e),
    }
}

fn read_reply_at_depth<R: BufRead>(reader: &mut R, depth: usize) -> Result<Reply> {
    let line = read_line(reader)?;

    let (marker, rest) = match line.split_first() {
        Some((marker, rest)) => (*marker, rest),
        None => return Err(RespError::Protocol("Empty reply line".to_string())),
    };

    match marker {
        b'+' => Ok(Reply::Status(parse_text(rest)?)),
        b'-' => Ok(Reply::Error(parse_text(rest)?)),
        b':' => Ok(Reply::Integer(parse_integer(rest)?)),
        b'$' => read_bulk(reader, parse_integer(rest)?),
        b'*' => read_array(reader, parse_integer(rest)?, depth),
        _ => Err(RespError::Protocol(format!(
            "Unknown reply marker: 0x{:02x}",
            marker
        ))),
    }
}

/// Read a CRLF-terminated line and strip the terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)?;

    if !line.ends_with(b"\n") {
        if line.len() >= MAX_LINE_LEN {
            return Err(RespError::Protocol(format!(
                "Reply line exceeds {} bytes",
                MAX_LINE_LEN
            )));
        }
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "stream closed before end of reply line",
        )
        .into());
    }

    if !line.ends_with(CRLF) {
        return Err(RespError::Protocol(
            "Reply line not terminated by CRLF".to_string(),
        ));
    }

    line.truncate(line.len() - CRLF.len());
    Ok(line)
}

/// Status and error text; a CR may only appear as part of the terminator
fn parse_text(text: &[u8]) -> Result<String> {
    if text.contains(&b'\r') {
        return Err(RespError::Protocol(
            "Bare CR inside status or error line".to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(text).into_owned())
}

/// Signed decimal: optional `-` then digits; no `+` and no `-0`
fn parse_integer(digits: &[u8]) -> Result<i64> {
    let well_formed = !digits.starts_with(b"+") && digits != b"-0";
    std::str::from_utf8(digits)
        .ok()
        .filter(|_| well_formed)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            RespError::Protocol(format!(
                "Invalid integer: {:?}",
                String::from_utf8_lossy(digits)
            ))
        })
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> Result<Reply> {
    if len == -1 {
        return Ok(Reply::BulkString(None));
    }
    if !(0..=MAX_BULK_LEN).contains(&len) {
        return Err(RespError::Protocol(format!(
            "Invalid bulk string length: {} (max {})",
            len, MAX_BULK_LEN
        )));
    }

    let len = len as usize;
    let mut payload = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if payload.len() < len {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("stream closed after {} of {} bulk bytes", payload.len(), len),
        )
        .into());
    }

    let mut terminator = [0u8; 2];
    reader.read_exact(&mut terminator)?;
    if terminator != CRLF {
        return Err(RespError::Protocol(
            "Bulk string not terminated by CRLF".to_string(),
        ));
    }

    Ok(Reply::BulkString(Some(Bytes::from(payload))))
}

fn read_array<R: BufRead>(reader: &mut R, count: i64, depth: usize) -> Result<Reply> {
    if count == -1 {
        return Ok(Reply::Array(None));
    }
    if count < 0 {
        return Err(RespError::Protocol(format!("Invalid array length: {}", count)));
    }
    if depth >= MAX_NESTING_DEPTH {
        return Err(RespError::Protocol(format!(
            "Array nesting exceeds {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    let count = count as usize;
    let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        items.push(read_reply_at_depth(reader, depth + 1)?);
    }

    Ok(Reply::Array(Some(items)))
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Encode a reply to bytes (the server side of the exchange)
///
/// Status and error text is written verbatim and must not contain CRLF.
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    let mut message = Vec::new();
    push_reply(&mut message, reply);
    message
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    let bytes = encode_reply(reply);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn push_reply(buf: &mut Vec<u8>, reply: &Reply) {
    match reply {
        Reply::Status(text) => push_line(buf, b'+', text.as_bytes()),
        Reply::Error(text) => push_line(buf, b'-', text.as_bytes()),
        Reply::Integer(n) => push_header(buf, b':', *n),
        Reply::BulkString(Some(bytes)) => push_bulk(buf, bytes),
        Reply::BulkString(None) => push_header(buf, b'$', -1),
        Reply::Array(Some(items)) => {
            push_header(buf, b'*', items.len() as i64);
            for item in items {
                push_reply(buf, item);
            }
        }
        Reply::Array(None) => push_header(buf, b'*', -1),
    }
}

fn push_line(buf: &mut Vec<u8>, marker: u8, text: &[u8]) {
    buf.push(marker);
    buf.extend_from_slice(text);
    buf.extend_from_slice(CRLF);
}
