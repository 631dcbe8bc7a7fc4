//! Error types for the wire codec.

use std::error::Error;
use std::fmt;

/// Errors arising while decoding a packed payload.
///
/// Encoding into a `Vec<u8>` cannot fail, so only decode paths return
/// this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireError {
    /// The input ended before a complete value was read.
    Truncated {
        /// Bytes required by the value being read.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// The bytes were read but do not form a valid value.
    Malformed {
        /// Description of the problem.
        detail: String,
    },
    /// A length prefix does not fit the platform's `usize` or the
    /// remaining input.
    LengthOverflow {
        /// The length that was announced.
        len: u64,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, remaining } => {
                write!(f, "truncated payload: need {needed} bytes, {remaining} remaining")
            }
            Self::Malformed { detail } => write!(f, "malformed payload: {detail}"),
            Self::LengthOverflow { len } => write!(f, "length prefix {len} overflows input"),
        }
    }
}

impl Error for WireError {}
