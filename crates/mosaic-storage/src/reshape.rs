//! Shared steps of the reshape protocol.
//!
//! A reshape from shape `S` to `S'` keeps exactly the cells of `S ∩ S'`.
//! The overlap is described twice, once relative to each shape; both
//! descriptors list the same cells in the same row-major order, so walking
//! them in lockstep pairs each old buffer index with its new one.

use mosaic_core::WireType;
use mosaic_space::{HyperRect, TransferDescriptor};

use crate::error::StorageError;

/// What a reshape has to do.
pub(crate) enum ReshapePlan {
    /// The shape is unchanged.
    Keep,
    /// No overlap: start empty.
    Drop,
    /// Move the overlap.
    Transfer {
        /// Overlap relative to the old shape.
        src: TransferDescriptor,
        /// Overlap relative to the new shape.
        dst: TransferDescriptor,
    },
}

pub(crate) fn plan(
    old: &HyperRect,
    new: &HyperRect,
    wire_type: WireType,
) -> Result<ReshapePlan, StorageError> {
    if old.ul() == new.ul() && old.br() == new.br() {
        return Ok(ReshapePlan::Keep);
    }
    match old.intersection(new)? {
        None => Ok(ReshapePlan::Drop),
        Some(overlap) => {
            let src = TransferDescriptor::new(vec![overlap.clone()], old, wire_type)?;
            let dst = TransferDescriptor::new(vec![overlap], new, wire_type)?;
            Ok(ReshapePlan::Transfer { src, dst })
        }
    }
}

/// Flat indices covered by a descriptor, in packing order.
pub(crate) fn cells(desc: &TransferDescriptor) -> impl Iterator<Item = usize> + '_ {
    desc.runs().iter().flat_map(|r| r.start..r.start + r.len)
}

/// `(old_index, new_index)` for every overlap cell.
pub(crate) fn paired_cells<'a>(
    src: &'a TransferDescriptor,
    dst: &'a TransferDescriptor,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    cells(src).zip(cells(dst))
}

/// Move slot contents from `old` into a fresh buffer for the new shape.
pub(crate) fn move_slots<V: Default>(
    old: &mut [V],
    new_len: usize,
    src: &TransferDescriptor,
    dst: &TransferDescriptor,
) -> Vec<V> {
    let mut fresh: Vec<V> = std::iter::repeat_with(V::default).take(new_len).collect();
    for (from, to) in paired_cells(src, dst) {
        fresh[to] = std::mem::take(&mut old[from]);
    }
    fresh
}
