//! Benchmark profiles and utilities for the Mosaic partitioned grid layer.
//!
//! Provides pre-built worlds and populations for benchmarking:
//!
//! - [`reference_world`]: 100x100 grid (10K cells)
//! - [`stress_world`]: 316x316 grid (~100K cells)
//! - [`init_agent_locations`]: deterministic agent placement via seed
//! - [`populated_continuous`] and [`filled_int`]: ready-made storages

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use mosaic_core::{ObjectId, PartitionId};
use mosaic_space::{HyperRect, RealPoint};
use mosaic_storage::{ContinuousStorage, IntStorage, StorageError};

/// A 100x100 world (10K cells).
pub fn reference_world() -> HyperRect {
    square(100)
}

/// A 316x316 world (~100K cells).
pub fn stress_world() -> HyperRect {
    square(316)
}

fn square(side: i32) -> HyperRect {
    match HyperRect::from_size(PartitionId(0), &[side, side]) {
        Ok(r) => r,
        Err(e) => panic!("square world of side {side}: {e}"),
    }
}

/// Generate deterministic agent locations inside `world`.
///
/// Coordinates come from a multiplicative hash of the seed and index, so
/// the same arguments always give the same population.
pub fn init_agent_locations(world: &HyperRect, n: u64, seed: u64) -> Vec<(ObjectId, RealPoint)> {
    let size = world.size();
    let ul = world.ul();
    (0..n)
        .map(|i| {
            let hx = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407));
            let hy = hx.rotate_left(29) ^ 0x9E37_79B9_7F4A_7C15;
            // 16 fractional bits per axis.
            let fx = (hx >> 16) % (size[0] as u64 * 65536);
            let fy = (hy >> 16) % (size[1] as u64 * 65536);
            let p = RealPoint::xy(
                f64::from(ul[0]) + fx as f64 / 65536.0,
                f64::from(ul[1]) + fy as f64 / 65536.0,
            );
            (ObjectId(i), p)
        })
        .collect()
}

/// A continuous storage over `world` holding [`init_agent_locations`].
pub fn populated_continuous(
    world: &HyperRect,
    n: u64,
    seed: u64,
    discretization: f64,
) -> Result<ContinuousStorage<ObjectId>, StorageError> {
    let mut storage = ContinuousStorage::new(world.clone(), discretization)?;
    for (id, p) in init_agent_locations(world, n, seed) {
        storage.set_location(id, p)?;
    }
    Ok(storage)
}

/// An int storage over `shape` with every cell set to its flat index.
pub fn filled_int(shape: &HyperRect) -> Result<IntStorage, StorageError> {
    let mut storage = IntStorage::new(shape.clone(), -1);
    for (i, p) in shape.iter().enumerate() {
        storage.add_object(&p, i as i32)?;
    }
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_locations_are_inside_and_deterministic() {
        let world = reference_world();
        let a = init_agent_locations(&world, 500, 42);
        let b = init_agent_locations(&world, 500, 42);
        assert_eq!(a.len(), 500);
        for ((ia, pa), (ib, pb)) in a.iter().zip(&b) {
            assert_eq!(ia, ib);
            assert!(pa.approx_eq(pb).unwrap());
            assert!(world.contains_real(pa).unwrap(), "{pa} outside {world}");
        }
    }

    #[test]
    fn populated_storage_keeps_every_agent() {
        let world = reference_world();
        let s = populated_continuous(&world, 1000, 7, 2.0).unwrap();
        assert_eq!(s.len(), 1000);
        assert!(s.verify_buckets());
    }

    #[test]
    fn filled_int_counts_up() {
        let shape = HyperRect::from_size(PartitionId(0), &[3, 4]).unwrap();
        let s = filled_int(&shape).unwrap();
        assert_eq!(s.values(), (0..12).collect::<Vec<i32>>().as_slice());
    }
}
