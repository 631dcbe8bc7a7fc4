//! Partition topology for Mosaic.
//!
//! Each rank owns one partition. This crate derives which ranks must talk
//! to each other ([`PartitionGraph`]), and a greedy coloring of that graph
//! ([`Coloring`]) that staggers neighbor exchanges into rounds. The
//! coloring is a pure function of the adjacency, so every rank computes the
//! same one without communicating.
//!
//! [`Neighborhood`] is one rank's view of both, and is what the
//! communicator consumes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coloring;
pub mod decomposition;
pub mod error;
pub mod graph;

pub use coloring::{Coloring, Neighborhood};
pub use decomposition::{check_aoi, uniform_decomposition};
pub use error::TopologyError;
pub use graph::PartitionGraph;
