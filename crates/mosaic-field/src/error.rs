//! Error types for halo fields.

use std::error::Error;
use std::fmt;

use mosaic_comm::CommError;
use mosaic_space::GeometryError;
use mosaic_storage::StorageError;
use mosaic_topology::TopologyError;

/// Errors from building or driving a [`HaloField`](crate::HaloField).
///
/// Communication errors are fatal: the communicator that produced one is
/// poisoned, and the field's contents are unspecified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// A geometric operation failed.
    Geometry(GeometryError),
    /// The backing storage rejected an operation.
    Storage(StorageError),
    /// The partition graph could not be built.
    Topology(TopologyError),
    /// A collective failed.
    Comm(CommError),
    /// Construction parameters are inconsistent.
    InvalidConfig {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry(e) => write!(f, "geometry: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Topology(e) => write!(f, "topology: {e}"),
            Self::Comm(e) => write!(f, "comm: {e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid field config: {reason}"),
        }
    }
}

impl Error for FieldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Geometry(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::Topology(e) => Some(e),
            Self::Comm(e) => Some(e),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl From<GeometryError> for FieldError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

impl From<StorageError> for FieldError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<TopologyError> for FieldError {
    fn from(e: TopologyError) -> Self {
        Self::Topology(e)
    }
}

impl From<CommError> for FieldError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}
