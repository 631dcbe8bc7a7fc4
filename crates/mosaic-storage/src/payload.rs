//! Pack/unpack of object-bearing grid storages.
//!
//! Payload layout, per descriptor region in order:
//!
//! ```text
//! u32 pair_count
//! pair_count × (codec(value), IntPoint relative to region.ul)
//! ```
//!
//! Pairs are emitted in run order, and within a cell in bag order.
//! Unpack clears every cell of a region before inserting its pairs, so a
//! region is overwritten rather than merged.

use mosaic_core::wire::{put_u32_le, take_len};
use mosaic_core::{Codec, Wire};
use mosaic_space::{IntPoint, TransferDescriptor};

use crate::error::StorageError;
use crate::layout::GridLayout;

/// Cell-level access shared by object and dense storage.
pub(crate) trait CellStore<T> {
    fn layout(&self) -> &GridLayout;
    fn cell(&self, flat: usize) -> &[T];
    fn clear_cell(&mut self, flat: usize);
    fn insert_cell(&mut self, flat: usize, value: T);
}

/// Check that a descriptor was built for this storage.
pub(crate) fn check_descriptor(
    layout: &GridLayout,
    desc: &TransferDescriptor,
    wire_type: mosaic_core::WireType,
) -> Result<(), StorageError> {
    if !layout.same_shape(desc.wrt()) {
        return Err(StorageError::DescriptorMismatch {
            expected: layout.shape().to_string(),
            found: desc.wrt().to_string(),
        });
    }
    if desc.wire_type() != wire_type {
        return Err(StorageError::WireTypeMismatch {
            expected: wire_type,
            found: desc.wire_type(),
        });
    }
    Ok(())
}

pub(crate) fn pack_pairs<T, S, C>(
    store: &S,
    desc: &TransferDescriptor,
    codec: &C,
    out: &mut Vec<u8>,
) -> Result<(), StorageError>
where
    S: CellStore<T>,
    C: Codec<T>,
{
    for (index, region) in desc.regions().iter().enumerate() {
        let count_at = out.len();
        put_u32_le(out, 0);
        let mut pairs: u32 = 0;
        for run in desc.region_runs(index) {
            for flat in run.start..run.start + run.len {
                let items = store.cell(flat);
                if items.is_empty() {
                    continue;
                }
                let rel = store.layout().point_at(flat).offsets(region.ul())?;
                let rel = IntPoint::new(rel);
                for value in items {
                    codec.encode(value, out);
                    rel.encode(out);
                    pairs += 1;
                }
            }
        }
        out[count_at..count_at + 4].copy_from_slice(&pairs.to_le_bytes());
    }
    Ok(())
}

pub(crate) fn unpack_pairs<T, S, C>(
    store: &mut S,
    desc: &TransferDescriptor,
    codec: &C,
    input: &mut &[u8],
) -> Result<usize, StorageError>
where
    S: CellStore<T>,
    C: Codec<T>,
{
    // Decode everything before touching the store, so a bad payload
    // leaves it unchanged.
    let mut staged = Vec::new();
    for region in desc.regions() {
        // A pair is at least the 4-byte point header.
        let pairs = take_len(input, 4)?;
        for _ in 0..pairs {
            let value = codec.decode(input)?;
            let rel = IntPoint::decode(input)?;
            let p = rel.shift(region.ul().coords())?;
            if !region.contains(&p)? {
                return Err(StorageError::OutOfBounds {
                    point: p.to_string(),
                    shape: region.to_string(),
                });
            }
            staged.push((store.layout().flat_index(&p)?, value));
        }
    }

    for index in 0..desc.regions().len() {
        for run in desc.region_runs(index) {
            for flat in run.start..run.start + run.len {
                store.clear_cell(flat);
            }
        }
    }
    let total = staged.len();
    for (flat, value) in staged {
        store.insert_cell(flat, value);
    }
    Ok(total)
}
