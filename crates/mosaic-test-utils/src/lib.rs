//! Test utilities and mock types for Mosaic development.
//!
//! Provides a small agent type ([`TestAgent`]) that satisfies the storage
//! bounds, rectangle shorthands, and the fixtures in [`fixtures`] for
//! driving several ranks from one test.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{run_ranks, CountingCodec, FailingCodec};

use mosaic_core::wire::{put_u32_le, take_u32_le};
use mosaic_core::{Identified, ObjectId, PartitionId, Wire, WireError};
use mosaic_space::{HyperRect, IntPoint, RealPoint};

/// A minimal mobile agent.
///
/// Equality covers every field, so round-trip tests catch a payload that
/// keeps the id but loses the state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestAgent {
    pub id: ObjectId,
    pub energy: u32,
}

impl TestAgent {
    pub fn new(id: u64, energy: u32) -> Self {
        Self {
            id: ObjectId(id),
            energy,
        }
    }
}

impl Identified for TestAgent {
    fn id(&self) -> ObjectId {
        self.id
    }
}

impl Wire for TestAgent {
    fn encode(&self, out: &mut Vec<u8>) {
        self.id.encode(out);
        put_u32_le(out, self.energy);
    }

    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        Ok(Self {
            id: ObjectId::decode(input)?,
            energy: take_u32_le(input)?,
        })
    }
}

/// A 2D rectangle `[x0, x1) × [y0, y1)` with partition id 0.
///
/// # Panics
///
/// Panics if the corners are inverted.
pub fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> HyperRect {
    rect_id(0, x0, y0, x1, y1)
}

/// A 2D rectangle with an explicit partition id.
pub fn rect_id(id: u32, x0: i32, y0: i32, x1: i32, y1: i32) -> HyperRect {
    HyperRect::xy(PartitionId(id), x0, y0, x1, y1).expect("test rectangle corners are ordered")
}

/// A 2D integer point.
pub fn ip(x: i32, y: i32) -> IntPoint {
    IntPoint::xy(x, y)
}

/// A 2D real point.
pub fn rp(x: f64, y: f64) -> RealPoint {
    RealPoint::xy(x, y)
}
