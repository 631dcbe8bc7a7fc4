//! Error types for topology construction.

use std::error::Error;
use std::fmt;

use mosaic_core::{PartitionId, Rank};
use mosaic_space::GeometryError;

/// Errors arising while building graphs, colorings or decompositions.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// `a` lists `b` as a neighbor but not the reverse.
    Asymmetric {
        /// The rank holding the one-sided edge.
        a: Rank,
        /// The rank it points to.
        b: Rank,
    },
    /// A rank lists itself as a neighbor.
    SelfLoop {
        /// The offending rank.
        rank: Rank,
    },
    /// A rank index is outside `0..size`.
    RankOutOfRange {
        /// The offending rank.
        rank: Rank,
        /// Number of ranks.
        size: usize,
    },
    /// The halo is wider than half a partition.
    AoiTooLarge {
        /// The partition that is too small.
        partition: PartitionId,
        /// Its smallest extent.
        extent: i32,
        /// The requested area of interest.
        aoi: i32,
    },
    /// The area of interest is negative.
    NegativeAoi {
        /// The requested area of interest.
        aoi: i32,
    },
    /// A decomposition asks for more pieces than an axis has cells, or
    /// for none.
    InvalidSplit {
        /// The axis.
        axis: usize,
        /// Requested number of pieces.
        splits: i32,
        /// Extent of the world on that axis.
        extent: i32,
    },
    /// A geometric operation failed.
    Geometry(GeometryError),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asymmetric { a, b } => {
                write!(f, "rank {a} lists {b} as a neighbor, but {b} does not list {a}")
            }
            Self::SelfLoop { rank } => write!(f, "rank {rank} lists itself as a neighbor"),
            Self::RankOutOfRange { rank, size } => {
                write!(f, "rank {rank} out of range for {size} ranks")
            }
            Self::AoiTooLarge {
                partition,
                extent,
                aoi,
            } => write!(
                f,
                "aoi {aoi} too large for partition {partition} with extent {extent} (need extent >= 2 * aoi)"
            ),
            Self::NegativeAoi { aoi } => write!(f, "aoi must be >= 0, got {aoi}"),
            Self::InvalidSplit {
                axis,
                splits,
                extent,
            } => write!(
                f,
                "cannot split axis {axis} of extent {extent} into {splits} pieces"
            ),
            Self::Geometry(e) => write!(f, "geometry: {e}"),
        }
    }
}

impl Error for TopologyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeometryError> for TopologyError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}
