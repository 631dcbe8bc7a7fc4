//! Core types and traits for the Mosaic partitioned grid layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers shared by every other crate ([`Rank`], [`PartitionId`],
//! [`ObjectId`]), the [`Identified`] trait for object-bearing storages, and
//! the little-endian wire codec ([`Wire`], [`Codec`], [`WireType`]) through
//! which every packed payload passes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;
pub mod wire;

pub use error::WireError;
pub use id::{ObjectId, PartitionId, Rank};
pub use traits::Identified;
pub use wire::{Codec, Wire, WireCodec, WireType};
