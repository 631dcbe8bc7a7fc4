//! Regular grid decompositions of a world rectangle.

use mosaic_core::PartitionId;
use mosaic_space::{Coords, HyperRect, IntPoint};

use crate::error::TopologyError;

/// Split `world` into `splits[i]` pieces along each axis.
///
/// Piece boundaries on axis `i` sit at `ul + extent * k / splits[i]`, so
/// piece sizes differ by at most one. Partition ids follow row-major order
/// of the piece index, last axis fastest, and equal the position in the
/// returned vector.
pub fn uniform_decomposition(world: &HyperRect, splits: &[i32]) -> Result<Vec<HyperRect>, TopologyError> {
    if splits.len() != world.nd() {
        return Err(mosaic_space::GeometryError::DimensionMismatch {
            expected: world.nd(),
            found: splits.len(),
        }
        .into());
    }
    let size = world.size();
    for (axis, (&n, &extent)) in splits.iter().zip(size.iter()).enumerate() {
        if n <= 0 || n > extent {
            return Err(TopologyError::InvalidSplit {
                axis,
                splits: n,
                extent,
            });
        }
    }
    let bounds: Vec<Vec<i32>> = (0..world.nd())
        .map(|axis| {
            let ul = world.ul()[axis];
            let extent = i64::from(size[axis]);
            let n = i64::from(splits[axis]);
            (0..=n).map(|k| ul + (extent * k / n) as i32).collect()
        })
        .collect();

    let counts = HyperRect::from_size(PartitionId::default(), splits)?;
    let mut parts = Vec::with_capacity(counts.area());
    for (index, piece) in counts.iter().enumerate() {
        let ul: Coords = (0..piece.nd()).map(|a| bounds[a][piece[a] as usize]).collect();
        let br: Coords = (0..piece.nd()).map(|a| bounds[a][piece[a] as usize + 1]).collect();
        parts.push(HyperRect::new(
            PartitionId(index as u32),
            IntPoint::new(ul),
            IntPoint::new(br),
        )?);
    }
    Ok(parts)
}

/// Check that a halo of width `aoi` fits every partition.
///
/// Each extent must be at least `2 * aoi`, so that the private region
/// (the partition shrunk by `aoi`) is never inverted.
pub fn check_aoi(parts: &[HyperRect], aoi: i32) -> Result<(), TopologyError> {
    if aoi < 0 {
        return Err(TopologyError::NegativeAoi { aoi });
    }
    for part in parts {
        let extent = part.size().iter().copied().min().unwrap_or(0);
        if extent < 2 * aoi {
            return Err(TopologyError::AoiTooLarge {
                partition: part.id(),
                extent,
                aoi,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(w: i32, h: i32) -> HyperRect {
        HyperRect::xy(PartitionId(0), 0, 0, w, h).unwrap()
    }

    #[test]
    fn pieces_tile_the_world() {
        let w = world(10, 7);
        let parts = uniform_decomposition(&w, &[3, 2]).unwrap();
        assert_eq!(parts.len(), 6);
        assert_eq!(parts.iter().map(HyperRect::area).sum::<usize>(), w.area());
        for (i, a) in parts.iter().enumerate() {
            assert_eq!(a.id(), PartitionId(i as u32));
            for b in &parts[i + 1..] {
                assert!(!a.intersects(b).unwrap());
            }
        }
        // Row-major: the second piece is further along the last axis.
        assert_eq!(parts[0], HyperRect::xy(PartitionId(0), 0, 0, 3, 3).unwrap());
        assert_eq!(parts[1], HyperRect::xy(PartitionId(1), 0, 3, 3, 7).unwrap());
        assert_eq!(parts[5], HyperRect::xy(PartitionId(5), 6, 3, 10, 7).unwrap());
    }

    #[test]
    fn too_many_splits_rejected() {
        assert_eq!(
            uniform_decomposition(&world(4, 4), &[5, 1]).unwrap_err(),
            TopologyError::InvalidSplit {
                axis: 0,
                splits: 5,
                extent: 4
            }
        );
        assert!(uniform_decomposition(&world(4, 4), &[0, 1]).is_err());
        assert!(uniform_decomposition(&world(4, 4), &[2]).is_err());
    }

    #[test]
    fn aoi_must_fit_twice() {
        let parts = uniform_decomposition(&world(8, 6), &[2, 2]).unwrap();
        assert!(check_aoi(&parts, 1).is_ok());
        assert!(check_aoi(&parts, 3).is_err());
        assert!(matches!(
            check_aoi(&parts, 2),
            Err(TopologyError::AoiTooLarge { extent: 3, aoi: 2, .. })
        ));
        assert_eq!(check_aoi(&parts, -1), Err(TopologyError::NegativeAoi { aoi: -1 }));
    }
}
