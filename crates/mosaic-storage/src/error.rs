//! Storage-specific error types.

use std::error::Error;
use std::fmt;

use mosaic_core::{WireError, WireType};
use mosaic_space::GeometryError;

use crate::storage::StorageKind;

/// Errors that can occur during storage operations.
///
/// Absent data is never an error: lookups of missing objects return
/// `None` or an empty slice.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageError {
    /// A point lies outside the storage's shape.
    OutOfBounds {
        /// The offending point.
        point: String,
        /// The storage shape.
        shape: String,
    },
    /// The operation is not meaningful for this storage variant.
    Unsupported {
        /// Name of the operation.
        op: &'static str,
        /// The variant it was invoked on.
        kind: StorageKind,
    },
    /// A transfer descriptor was built for a different shape.
    DescriptorMismatch {
        /// The storage's current shape.
        expected: String,
        /// The shape the descriptor was built against.
        found: String,
    },
    /// A transfer descriptor carries a different element datatype.
    WireTypeMismatch {
        /// The storage's datatype.
        expected: WireType,
        /// The descriptor's datatype.
        found: WireType,
    },
    /// A geometric contract violation.
    Geometry(GeometryError),
    /// A payload could not be decoded.
    Wire(WireError),
    /// Configuration values are invalid.
    InvalidConfig {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { point, shape } => {
                write!(f, "point {point} out of bounds for shape {shape}")
            }
            Self::Unsupported { op, kind } => {
                write!(f, "{op} is not supported by {kind} storage")
            }
            Self::DescriptorMismatch { expected, found } => {
                write!(
                    f,
                    "transfer descriptor built for {found}, storage shape is {expected}"
                )
            }
            Self::WireTypeMismatch { expected, found } => {
                write!(f, "wire type mismatch: storage {expected:?}, descriptor {found:?}")
            }
            Self::Geometry(e) => write!(f, "geometry: {e}"),
            Self::Wire(e) => write!(f, "payload: {e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid storage config: {reason}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Geometry(e) => Some(e),
            Self::Wire(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeometryError> for StorageError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

impl From<WireError> for StorageError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}
