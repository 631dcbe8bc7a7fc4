//! Transfer descriptors: overlap regions decomposed into contiguous runs.
//!
//! A [`TransferDescriptor`] is the single description of "which cells move"
//! used by every pack and unpack, whether for a halo refresh, a gather to
//! root, or a reshape. It is built against the shape of the storage it
//! will be applied to (the *with-respect-to* rectangle) and records that
//! shape, so applying it to a storage of a different shape is detectable.
//!
//! Runs are expressed as flat offsets into the row-major (last axis
//! fastest) buffer of the with-respect-to rectangle. When a region spans
//! the full extent of every trailing axis, consecutive rows are merged
//! into one run.

use mosaic_core::WireType;

use crate::error::{check_nd, GeometryError};
use crate::point::Coords;
use crate::rect::HyperRect;

/// A contiguous span of cells in the with-respect-to buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// Index of the region this run belongs to.
    pub region: usize,
    /// Flat offset of the first cell.
    pub start: usize,
    /// Number of cells.
    pub len: usize,
}

/// The cells of one or more regions, in the order they are packed.
///
/// Immutable once built; rebuild it whenever the geometry changes.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferDescriptor {
    wrt: HyperRect,
    regions: Vec<HyperRect>,
    runs: Vec<Run>,
    count: usize,
    wire_type: WireType,
}

impl TransferDescriptor {
    /// Decompose `regions` into runs relative to `wrt`.
    ///
    /// Regions keep their order; runs are grouped by region and ordered
    /// row-major within each. Empty regions are kept (so region indices
    /// line up with a peer's) but contribute no runs.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` or `NotContained` if a region is not a
    /// subset of `wrt`.
    pub fn new(
        regions: Vec<HyperRect>,
        wrt: &HyperRect,
        wire_type: WireType,
    ) -> Result<Self, GeometryError> {
        let strides = row_major_strides(&wrt.size());
        let mut runs = Vec::new();
        let mut count = 0;

        for (index, region) in regions.iter().enumerate() {
            check_nd(wrt.nd(), region.nd())?;
            if region.is_empty() {
                continue;
            }
            if !wrt.contains_rect(region)? {
                return Err(GeometryError::NotContained {
                    region: region.to_string(),
                    bounds: wrt.to_string(),
                });
            }
            count += region.area();
            push_region_runs(index, region, wrt, &strides, &mut runs)?;
        }

        Ok(Self {
            wrt: wrt.clone(),
            regions,
            runs,
            count,
            wire_type,
        })
    }

    /// A descriptor that moves nothing.
    pub fn empty(wrt: &HyperRect, wire_type: WireType) -> Self {
        Self {
            wrt: wrt.clone(),
            regions: Vec::new(),
            runs: Vec::new(),
            count: 0,
            wire_type,
        }
    }

    /// The rectangle the runs are relative to.
    pub fn wrt(&self) -> &HyperRect {
        &self.wrt
    }

    /// The regions, in packing order.
    pub fn regions(&self) -> &[HyperRect] {
        &self.regions
    }

    /// All runs, grouped by region.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Runs belonging to one region.
    pub fn region_runs(&self, region: usize) -> impl Iterator<Item = &Run> + '_ {
        self.runs.iter().filter(move |r| r.region == region)
    }

    /// Total number of cells covered.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Element datatype of the payload.
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// True if no cells are covered. Packing an empty descriptor is a
    /// legal no-op.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Row-major strides for a buffer of the given extents, last axis fastest.
pub fn row_major_strides(size: &[i32]) -> Coords {
    let nd = size.len();
    let mut strides = Coords::from_elem(1, nd);
    for i in (0..nd.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * size[i + 1];
    }
    strides
}

fn push_region_runs(
    index: usize,
    region: &HyperRect,
    wrt: &HyperRect,
    strides: &[i32],
    runs: &mut Vec<Run>,
) -> Result<(), GeometryError> {
    let nd = wrt.nd();
    if nd == 0 {
        return Ok(());
    }
    let origin = region.ul().offsets(wrt.ul())?;
    let extent = region.size();
    let full = wrt.size();

    // `merge_from` is the outermost axis a single run may span: every axis
    // after it is covered end to end.
    let mut merge_from = nd - 1;
    while merge_from > 0 && extent[merge_from] == full[merge_from] {
        merge_from -= 1;
    }
    let run_len: usize = extent[merge_from..].iter().map(|&e| e as usize).product();
    let base: i32 = (merge_from..nd).map(|j| origin[j] * strides[j]).sum();

    // Odometer over the outer axes `0..merge_from`.
    let mut idx = Coords::from_elem(0, merge_from);
    loop {
        let outer: i32 = (0..merge_from)
            .map(|j| (origin[j] + idx[j]) * strides[j])
            .sum();
        runs.push(Run {
            region: index,
            start: (outer + base) as usize,
            len: run_len,
        });

        let mut axis = merge_from;
        loop {
            if axis == 0 {
                return Ok(());
            }
            axis -= 1;
            idx[axis] += 1;
            if idx[axis] < extent[axis] {
                break;
            }
            idx[axis] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::IntPoint;
    use mosaic_core::PartitionId;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> HyperRect {
        HyperRect::xy(PartitionId(0), x0, y0, x1, y1).unwrap()
    }

    #[test]
    fn strides_are_row_major_last_axis_fastest() {
        assert_eq!(row_major_strides(&[4, 5]).as_slice(), &[5, 1]);
        assert_eq!(row_major_strides(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
        assert_eq!(row_major_strides(&[7]).as_slice(), &[1]);
    }

    #[test]
    fn interior_block_yields_one_run_per_row() {
        let wrt = rect(0, 0, 4, 5);
        let d = TransferDescriptor::new(vec![rect(1, 1, 3, 4)], &wrt, WireType::Int32).unwrap();
        assert_eq!(
            d.runs(),
            &[
                Run { region: 0, start: 6, len: 3 },
                Run { region: 0, start: 11, len: 3 },
            ]
        );
        assert_eq!(d.count(), 6);
    }

    #[test]
    fn full_width_rows_merge() {
        let wrt = rect(0, 0, 4, 5);
        let d = TransferDescriptor::new(vec![rect(1, 0, 3, 5)], &wrt, WireType::Int32).unwrap();
        assert_eq!(d.runs(), &[Run { region: 0, start: 5, len: 10 }]);
        let whole = TransferDescriptor::new(vec![wrt.clone()], &wrt, WireType::Int32).unwrap();
        assert_eq!(whole.runs(), &[Run { region: 0, start: 0, len: 20 }]);
    }

    #[test]
    fn offsets_are_relative_to_wrt() {
        let wrt = rect(10, 20, 14, 25);
        let d = TransferDescriptor::new(vec![rect(11, 21, 12, 22)], &wrt, WireType::Float64).unwrap();
        assert_eq!(d.runs(), &[Run { region: 0, start: 6, len: 1 }]);
        assert_eq!(d.wire_type(), WireType::Float64);
    }

    #[test]
    fn zero_area_region_is_a_legal_noop() {
        let wrt = rect(0, 0, 4, 4);
        let d = TransferDescriptor::new(vec![rect(2, 2, 2, 4)], &wrt, WireType::Object).unwrap();
        assert!(d.is_empty());
        assert!(d.runs().is_empty());
        assert_eq!(d.regions().len(), 1);
    }

    #[test]
    fn region_outside_wrt_is_rejected() {
        let wrt = rect(0, 0, 4, 4);
        let err = TransferDescriptor::new(vec![rect(3, 3, 5, 4)], &wrt, WireType::Int32).unwrap_err();
        assert!(matches!(err, GeometryError::NotContained { .. }));
    }

    #[test]
    fn runs_cover_exactly_the_region_cells() {
        let wrt = HyperRect::new(
            PartitionId(0),
            IntPoint::from_slice(&[0, 0, 0]),
            IntPoint::from_slice(&[3, 4, 5]),
        )
        .unwrap();
        let region = HyperRect::new(
            PartitionId(0),
            IntPoint::from_slice(&[1, 1, 0]),
            IntPoint::from_slice(&[3, 3, 5]),
        )
        .unwrap();
        let d = TransferDescriptor::new(vec![region.clone()], &wrt, WireType::Int32).unwrap();
        let strides = row_major_strides(&wrt.size());
        let mut from_runs: Vec<usize> = d
            .runs()
            .iter()
            .flat_map(|r| r.start..r.start + r.len)
            .collect();
        let from_cells: Vec<usize> = region
            .iter()
            .map(|p| (0..3).map(|i| (p[i] * strides[i]) as usize).sum())
            .collect();
        from_runs.sort_unstable();
        assert_eq!(from_runs, from_cells);
        // Trailing axis is full, so each x-row of the region is one run.
        assert_eq!(d.runs().len(), 2);
    }

    #[test]
    fn runs_are_grouped_by_region_in_order() {
        let wrt = rect(0, 0, 4, 4);
        let d = TransferDescriptor::new(
            vec![rect(3, 0, 4, 1), rect(0, 0, 1, 1)],
            &wrt,
            WireType::Int32,
        )
        .unwrap();
        assert_eq!(d.runs()[0], Run { region: 0, start: 12, len: 1 });
        assert_eq!(d.runs()[1], Run { region: 1, start: 0, len: 1 });
        assert_eq!(d.region_runs(1).count(), 1);
    }
}
