//! Error types for geometric operations.

use std::fmt;

use crate::point::Coords;

/// Contract violations in point and rectangle operations.
///
/// These are programmer errors: callers are expected to propagate them
/// and fail rather than substitute a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Two operands have different dimensionality.
    DimensionMismatch {
        /// Dimensionality of the receiver.
        expected: usize,
        /// Dimensionality of the argument.
        found: usize,
    },
    /// A rectangle's lower corner exceeds its upper corner on some axis.
    InvalidBounds {
        /// Inclusive lower corner.
        ul: Coords,
        /// Exclusive upper corner.
        br: Coords,
    },
    /// A region does not lie inside the rectangle it must be relative to.
    NotContained {
        /// The offending region.
        region: String,
        /// The enclosing rectangle.
        bounds: String,
    },
    /// An axis index is not below the dimensionality.
    AxisOutOfRange {
        /// The requested axis.
        axis: usize,
        /// Dimensionality of the value.
        nd: usize,
    },
    /// An operation needs a non-empty extent on every axis.
    Empty {
        /// Which operation.
        op: &'static str,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Self::InvalidBounds { ul, br } => {
                write!(f, "invalid bounds: ul {ul:?} exceeds br {br:?}")
            }
            Self::NotContained { region, bounds } => {
                write!(f, "region {region} is not contained in {bounds}")
            }
            Self::AxisOutOfRange { axis, nd } => {
                write!(f, "axis {axis} out of range for {nd}-dimensional value")
            }
            Self::Empty { op } => write!(f, "{op} requires a non-empty extent"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Fail with [`GeometryError::DimensionMismatch`] unless `expected == found`.
pub(crate) fn check_nd(expected: usize, found: usize) -> Result<(), GeometryError> {
    if expected == found {
        Ok(())
    } else {
        Err(GeometryError::DimensionMismatch { expected, found })
    }
}

/// Fail with [`GeometryError::AxisOutOfRange`] unless `axis < nd`.
pub(crate) fn check_axis(axis: usize, nd: usize) -> Result<(), GeometryError> {
    if axis < nd {
        Ok(())
    } else {
        Err(GeometryError::AxisOutOfRange { axis, nd })
    }
}
