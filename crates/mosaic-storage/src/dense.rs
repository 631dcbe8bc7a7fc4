//! Ordered bags of objects per cell, used for mobile agents.

use log::debug;
use mosaic_core::{Codec, Identified, ObjectId};
use mosaic_space::{HyperRect, IntPoint, TransferDescriptor};

use crate::error::StorageError;
use crate::layout::GridLayout;
use crate::payload::{check_descriptor, pack_pairs, unpack_pairs, CellStore};
use crate::reshape::{self, ReshapePlan};
use crate::storage::{GridStorage, StorageKind};

/// One ordered bag per cell.
///
/// Objects keep insertion order within a bag, and removal preserves the
/// order of the rest. With `remove_empty_bags` set, a bag that becomes
/// empty gives its allocation back.
#[derive(Clone, Debug)]
pub struct DenseStorage<T> {
    layout: GridLayout,
    bags: Vec<Vec<T>>,
    remove_empty_bags: bool,
}

impl<T: Identified> DenseStorage<T> {
    /// Create an empty storage.
    pub fn new(shape: HyperRect, remove_empty_bags: bool) -> Self {
        let layout = GridLayout::new(shape);
        let bags = std::iter::repeat_with(Vec::new).take(layout.len()).collect();
        Self {
            layout,
            bags,
            remove_empty_bags,
        }
    }

    /// Replace the halo bounds used by the `*_global` accessors.
    pub fn set_halo_bounds(&mut self, halo: HyperRect) -> Result<(), StorageError> {
        self.layout.set_halo_bounds(halo)
    }

    /// Append `value` to the bag at `p`.
    pub fn add_object(&mut self, p: &IntPoint, value: T) -> Result<(), StorageError> {
        let i = self.layout.flat_index(p)?;
        self.bags[i].push(value);
        Ok(())
    }

    /// The first object in the bag at `p` with id `id`.
    pub fn get_object(&self, p: &IntPoint, id: ObjectId) -> Result<Option<&T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(self.bags[i].iter().find(|v| v.id() == id))
    }

    /// The bag at `p`, in insertion order.
    pub fn get_all_objects(&self, p: &IntPoint) -> Result<&[T], StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(&self.bags[i])
    }

    /// Remove the first object with id `id` from the bag at `p`.
    pub fn remove_object(&mut self, p: &IntPoint, id: ObjectId) -> Result<Option<T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        let bag = &mut self.bags[i];
        let Some(pos) = bag.iter().position(|v| v.id() == id) else {
            return Ok(None);
        };
        let removed = bag.remove(pos);
        if bag.is_empty() && self.remove_empty_bags {
            *bag = Vec::new();
        }
        Ok(Some(removed))
    }

    /// Empty the bag at `p`, returning its contents.
    pub fn clear_at(&mut self, p: &IntPoint) -> Result<Vec<T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(self.take_bag(i))
    }

    /// Total number of objects.
    pub fn len(&self) -> usize {
        self.bags.iter().map(Vec::len).sum()
    }

    /// True if every bag is empty.
    pub fn is_empty(&self) -> bool {
        self.bags.iter().all(Vec::is_empty)
    }

    /// Capacity held by bags, in elements.
    pub fn allocated(&self) -> usize {
        self.bags.iter().map(Vec::capacity).sum()
    }

    /// [`add_object`](Self::add_object) at a global point.
    pub fn add_object_global(&mut self, p: &IntPoint, value: T) -> Result<(), StorageError> {
        let local = self.layout.to_local(p)?;
        self.add_object(&local, value)
    }

    /// [`get_object`](Self::get_object) at a global point.
    pub fn get_object_global(&self, p: &IntPoint, id: ObjectId) -> Result<Option<&T>, StorageError> {
        self.get_object(&self.layout.to_local(p)?, id)
    }

    /// [`get_all_objects`](Self::get_all_objects) at a global point.
    pub fn get_all_objects_global(&self, p: &IntPoint) -> Result<&[T], StorageError> {
        self.get_all_objects(&self.layout.to_local(p)?)
    }

    /// [`remove_object`](Self::remove_object) at a global point.
    pub fn remove_object_global(
        &mut self,
        p: &IntPoint,
        id: ObjectId,
    ) -> Result<Option<T>, StorageError> {
        let local = self.layout.to_local(p)?;
        self.remove_object(&local, id)
    }

    /// [`clear_at`](Self::clear_at) at a global point.
    pub fn clear_at_global(&mut self, p: &IntPoint) -> Result<Vec<T>, StorageError> {
        let local = self.layout.to_local(p)?;
        self.clear_at(&local)
    }

    fn take_bag(&mut self, flat: usize) -> Vec<T> {
        if self.remove_empty_bags {
            std::mem::take(&mut self.bags[flat])
        } else {
            self.bags[flat].drain(..).collect()
        }
    }
}

impl<T: Identified> CellStore<T> for DenseStorage<T> {
    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn cell(&self, flat: usize) -> &[T] {
        &self.bags[flat]
    }

    fn clear_cell(&mut self, flat: usize) {
        self.take_bag(flat);
    }

    fn insert_cell(&mut self, flat: usize, value: T) {
        self.bags[flat].push(value);
    }
}

impl<T: Identified> GridStorage<T> for DenseStorage<T> {
    fn kind(&self) -> StorageKind {
        StorageKind::Dense
    }

    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn clear(&mut self) {
        for flat in 0..self.bags.len() {
            self.take_bag(flat);
        }
    }

    fn reshape(&mut self, new_shape: HyperRect) -> Result<(), StorageError> {
        let plan = reshape::plan(self.layout.shape(), &new_shape, StorageKind::Dense.wire_type())?;
        let layout = match plan {
            ReshapePlan::Keep => return Ok(()),
            _ => self.layout.reshaped(new_shape)?,
        };
        let bags = match plan {
            ReshapePlan::Transfer { src, dst } => {
                reshape::move_slots(&mut self.bags, layout.len(), &src, &dst)
            }
            _ => std::iter::repeat_with(Vec::new).take(layout.len()).collect(),
        };
        self.layout = layout;
        self.bags = bags;
        debug!(
            "reshape dense storage to {}, {} objects kept",
            self.layout.shape(),
            self.len()
        );
        Ok(())
    }

    fn pack<C: Codec<T>>(
        &self,
        desc: &TransferDescriptor,
        codec: &C,
        out: &mut Vec<u8>,
    ) -> Result<(), StorageError> {
        check_descriptor(&self.layout, desc, StorageKind::Dense.wire_type())?;
        pack_pairs(self, desc, codec, out)
    }

    fn unpack<C: Codec<T>>(
        &mut self,
        desc: &TransferDescriptor,
        codec: &C,
        input: &mut &[u8],
    ) -> Result<usize, StorageError> {
        check_descriptor(&self.layout, desc, StorageKind::Dense.wire_type())?;
        unpack_pairs(self, desc, codec, input)
    }
}
