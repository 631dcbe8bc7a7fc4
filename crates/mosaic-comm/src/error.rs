//! Communication error types.

use std::error::Error;
use std::fmt;

use mosaic_core::{Rank, WireError};

/// Errors from transports and collectives.
///
/// Every variant is fatal for the communicator that produced it: the
/// communicator is poisoned and refuses further work.
#[derive(Debug, Clone, PartialEq)]
pub enum CommError {
    /// The peer's end of the channel is gone.
    Disconnected {
        /// The unreachable peer.
        peer: Rank,
    },
    /// A payload exceeds the configured maximum.
    PayloadTooLarge {
        /// Announced or actual payload size.
        bytes: u64,
        /// The configured limit.
        max: u64,
    },
    /// A received message does not have the announced size.
    SizeMismatch {
        /// The sending rank.
        peer: Rank,
        /// The size that was announced.
        expected: u64,
        /// The size that arrived.
        found: u64,
    },
    /// A rank index is outside the communicator.
    RankOutOfRange {
        /// The offending rank.
        rank: Rank,
        /// Number of ranks.
        size: usize,
    },
    /// The root of a rooted collective is outside the communicator.
    InvalidRoot {
        /// The requested root.
        root: Rank,
        /// Number of ranks.
        size: usize,
    },
    /// A caller-supplied list has the wrong length.
    ArityMismatch {
        /// Which argument.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        found: usize,
    },
    /// A payload could not be decoded.
    Wire(WireError),
    /// Configuration values are invalid.
    InvalidConfig {
        /// What went wrong.
        reason: String,
    },
    /// An earlier error left the communicator unusable.
    Poisoned {
        /// Description of the first error.
        cause: String,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { peer } => write!(f, "rank {peer} disconnected"),
            Self::PayloadTooLarge { bytes, max } => {
                write!(f, "payload of {bytes} bytes exceeds limit of {max}")
            }
            Self::SizeMismatch {
                peer,
                expected,
                found,
            } => write!(
                f,
                "rank {peer} announced {expected} bytes but sent {found}"
            ),
            Self::RankOutOfRange { rank, size } => {
                write!(f, "rank {rank} out of range for {size} ranks")
            }
            Self::InvalidRoot { root, size } => {
                write!(f, "root {root} out of range for {size} ranks")
            }
            Self::ArityMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what}: expected {expected} entries, got {found}"),
            Self::Wire(e) => write!(f, "payload: {e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid comm config: {reason}"),
            Self::Poisoned { cause } => {
                write!(f, "communicator poisoned by earlier failure: {cause}")
            }
        }
    }
}

impl Error for CommError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WireError> for CommError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}
