//! Grid storage for Mosaic partitions.
//!
//! Every storage owns a shape ([`HyperRect`](mosaic_space::HyperRect)) and a
//! backing buffer laid out by [`GridLayout`]. Five layouts exist:
//!
//! | Variant | Cell contents | `remove_object` |
//! |---------|---------------|-----------------|
//! | [`IntStorage`] | one `i32` | reset to sentinel |
//! | [`DoubleStorage`] | one `f64` | reset to sentinel |
//! | [`ObjectStorage`] | at most one object | empty the slot |
//! | [`DenseStorage`] | ordered bag of objects | structural removal |
//! | [`ContinuousStorage`] | bucket of objects at real locations | structural removal |
//!
//! They share the [`GridStorage`] contract (clear, reshape, pack, unpack)
//! and are gathered into the closed sum type [`AnyStorage`], which
//! dispatches that contract exhaustively by variant.
//!
//! # Architecture
//!
//! ```text
//! TransferDescriptor ──runs──▶ pack  ──bytes──▶ (network) ──bytes──▶ unpack ──runs──▶ storage
//!         │
//!         └──────────runs (old shape, new shape)──────────▶ reshape
//! ```
//!
//! Serialization of element values goes through an explicit
//! [`Codec`](mosaic_core::Codec) argument; scalar storages use fixed-width
//! little-endian values instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod continuous;
pub mod dense;
pub mod error;
pub mod layout;
pub mod object;
pub mod scalar;
pub mod storage;

mod payload;
mod reshape;

pub use config::StorageConfig;
pub use continuous::ContinuousStorage;
pub use dense::DenseStorage;
pub use error::StorageError;
pub use layout::GridLayout;
pub use object::ObjectStorage;
pub use scalar::{DoubleStorage, IntStorage, Scalar, ScalarStorage};
pub use storage::{AnyStorage, GridStorage, StorageKind};
