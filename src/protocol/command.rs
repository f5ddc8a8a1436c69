//! Command definitions
//!
//! A command is a name plus ordered byte-string arguments, built per call.

use bytes::Bytes;

use super::codec::encode_command;

/// Conversion of a command argument into the raw bytes sent on the wire
///
/// Numbers are sent as their decimal text, which is how the server expects
/// every numeric argument.
pub trait ToArg {
    fn to_arg(&self) -> Bytes;
}

impl ToArg for str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl<const N: usize> ToArg for [u8; N] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Bytes {
        (**self).to_arg()
    }
}

macro_rules! numeric_to_arg {
    ($($ty:ty),*) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

numeric_to_arg!(i32, i64, u32, u64, usize, f64);

/// A command ready to be framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name as given; upper-cased when framed
    pub name: String,

    /// Arguments in order
    pub args: Vec<Bytes>,
}

impl Command {
    /// Start a command with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg<A: ToArg + ?Sized>(mut self, arg: &A) -> Self {
        self.args.push(arg.to_arg());
        self
    }

    /// Append several arguments
    pub fn args<A: ToArg>(mut self, args: &[A]) -> Self {
        self.args.extend(args.iter().map(ToArg::to_arg));
        self
    }

    /// Frame the command for the wire
    pub fn encode(&self) -> Vec<u8> {
        encode_command(&self.name, self.args.as_slice())
    }
}
