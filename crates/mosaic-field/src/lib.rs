//! Halo-exchanged partitioned fields for Mosaic.
//!
//! A [`HaloField`] ties the lower crates together for one rank: it owns a
//! storage shaped like its partition plus a halo of width
//! [`FieldConfig::aoi`], knows which regions it exchanges with each
//! neighbor, and drives the collectives that keep the halo current.
//!
//! # Operations
//!
//! | Method | Collective | Effect |
//! |--------|------------|--------|
//! | [`sync_halo`](HaloField::sync_halo) | scheduled neighbor exchange | refresh halo cells |
//! | [`collect`](HaloField::collect) | gather | world-shaped storage at the root |
//! | [`distribute`](HaloField::distribute) | scatter | overwrite partitions from the root |
//! | [`rebalance`](HaloField::rebalance) | neighbor exchange | move to new partitions |
//!
//! # Torus
//!
//! Under [`EdgeBehavior::Wrap`](mosaic_space::EdgeBehavior::Wrap) overlaps
//! are computed against every periodic image of each neighbor. When a
//! single partition spans an axis, it is its own neighbor across the
//! boundary; that part of the halo is filled by a local copy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod field;
pub mod metrics;
pub mod overlap;

pub use config::FieldConfig;
pub use error::FieldError;
pub use field::{HaloField, NeighborLink};
pub use metrics::FieldMetrics;
pub use overlap::Overlap;
