//! Geometry for Mosaic partitioned grids.
//!
//! This crate defines the integer and real points ([`IntPoint`],
//! [`RealPoint`]), the half-open axis-aligned [`HyperRect`], the world
//! [`EdgeBehavior`] used for toroidal wrap-around, and the
//! [`TransferDescriptor`]: the decomposition of an overlap region into
//! contiguous runs through which every pack and unpack passes.
//!
//! All operations are pure. Operations combining two values of different
//! dimensionality return [`GeometryError::DimensionMismatch`] rather than
//! truncating.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod edge;
pub mod error;
pub mod point;
pub mod rect;
pub mod transfer;

pub use edge::EdgeBehavior;
pub use error::GeometryError;
pub use point::{Coords, IntPoint, RealCoords, RealPoint, EPSILON};
pub use rect::{HyperRect, RectIter};
pub use transfer::{row_major_strides, Run, TransferDescriptor};
