//! Mosaic: partitioned grid storage and halo exchange for distributed
//! spatial simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Mosaic sub-crates. For most users, adding `mosaic` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use mosaic::prelude::*;
//!
//! // One rank owning the whole 4×4 world.
//! let world = HyperRect::xy(PartitionId(0), 0, 0, 4, 4).unwrap();
//! let parts = uniform_decomposition(&world, &[1, 1]).unwrap();
//! let config = FieldConfig { edge: EdgeBehavior::Wrap, ..Default::default() };
//! let mut field: HaloField<ObjectId> =
//!     HaloField::new(StorageKind::Int, world, parts, Rank(0), config).unwrap();
//!
//! field.storage_mut().as_int_mut().unwrap().add_object(&IntPoint::xy(0, 0), 7).unwrap();
//!
//! let transport = LocalCluster::new(1).into_transports().remove(0);
//! let mut comm = Communicator::with_defaults(transport);
//! field.sync_halo(&mut comm, &WireCodec).unwrap();
//!
//! // The torus wraps cell (0, 0) into the halo corner at (4, 4).
//! let storage = field.storage().as_int().unwrap();
//! assert_eq!(storage.get(&IntPoint::xy(4, 4)).unwrap(), 7);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `mosaic-core` | ids, `Identified`, wire codec |
//! | [`space`] | `mosaic-space` | points, rectangles, transfer descriptors |
//! | [`storage`] | `mosaic-storage` | storage variants, pack/unpack, reshape |
//! | [`topology`] | `mosaic-topology` | partition graph, coloring, decompositions |
//! | [`comm`] | `mosaic-comm` | transports and collectives |
//! | [`field`] | `mosaic-field` | halo fields |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers and the wire codec (`mosaic-core`).
pub use mosaic_core as types;

/// Geometry (`mosaic-space`).
///
/// [`space::IntPoint`], [`space::RealPoint`], [`space::HyperRect`] and the
/// [`space::TransferDescriptor`] that every pack and unpack runs over.
pub use mosaic_space as space;

/// Grid storages (`mosaic-storage`).
///
/// The five variants and the [`storage::AnyStorage`] sum type over them.
pub use mosaic_storage as storage;

/// Partition graphs and coloring (`mosaic-topology`).
pub use mosaic_topology as topology;

/// Transports and collectives (`mosaic-comm`).
///
/// [`comm::Communicator`] over any [`comm::Transport`]; the in-process
/// [`comm::LocalCluster`] runs one rank per thread.
pub use mosaic_comm as comm;

/// Halo fields (`mosaic-field`).
pub use mosaic_field as field;

/// Common imports for typical Mosaic usage.
///
/// ```rust
/// use mosaic::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use mosaic_core::{Codec, Identified, ObjectId, PartitionId, Rank, Wire, WireCodec};

    // Geometry
    pub use mosaic_space::{EdgeBehavior, HyperRect, IntPoint, RealPoint, TransferDescriptor};

    // Storage
    pub use mosaic_storage::{AnyStorage, GridStorage, StorageConfig, StorageKind};

    // Topology
    pub use mosaic_topology::{uniform_decomposition, Coloring, Neighborhood, PartitionGraph};

    // Communication
    pub use mosaic_comm::{CommConfig, Communicator, LocalCluster, Transport};

    // Fields
    pub use mosaic_field::{FieldConfig, HaloField};

    // Errors
    pub use mosaic_comm::CommError;
    pub use mosaic_field::FieldError;
    pub use mosaic_space::GeometryError;
    pub use mosaic_storage::StorageError;
    pub use mosaic_topology::TopologyError;
}
