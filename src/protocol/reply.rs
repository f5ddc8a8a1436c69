//! Reply definitions
//!
//! Represents every reply shape a server can send back.

use bytes::Bytes;

/// A decoded server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`
    Status(String),

    /// `:42`
    Integer(i64),

    /// `$3\r\nfoo`, or `$-1` (nil)
    BulkString(Option<Bytes>),

    /// `*2\r\n...`, or `*-1` (nil); elements may be arrays themselves
    Array(Option<Vec<Reply>>),

    /// `-ERR message`, kept as data
    Error(String),
}

impl Reply {
    /// `+OK`
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// A non-nil bulk string
    pub fn bulk(bytes: impl Into<Bytes>) -> Self {
        Reply::BulkString(Some(bytes.into()))
    }

    /// A non-nil array
    pub fn array(items: Vec<Reply>) -> Self {
        Reply::Array(Some(items))
    }

    /// Short name of the variant, for logs and mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Integer(_) => "integer",
            Reply::BulkString(Some(_)) => "bulk string",
            Reply::BulkString(None) => "nil bulk string",
            Reply::Array(Some(_)) => "array",
            Reply::Array(None) => "nil array",
            Reply::Error(_) => "error",
        }
    }

    /// True for `$-1` and `*-1` only; an empty array is not nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::BulkString(None) | Reply::Array(None))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// True for the `+OK` status
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Status(s) if s == "OK")
    }

    /// Raw payload of a non-nil bulk string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::BulkString(Some(b)) => Some(b),
            _ => None,
        }
    }

    /// Text of a status, error, or UTF-8 bulk string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) | Reply::Error(s) => Some(s),
            Reply::BulkString(Some(b)) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Take the payload of a non-nil bulk string
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Reply::BulkString(b) => b,
            _ => None,
        }
    }

    /// Take the elements of a non-nil array
    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Reply::Array(items) => items,
            _ => None,
        }
    }
}
