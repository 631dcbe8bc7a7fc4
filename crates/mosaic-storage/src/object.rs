//! At most one object per cell.

use log::debug;
use mosaic_core::{Codec, Identified, ObjectId};
use mosaic_space::{HyperRect, IntPoint, TransferDescriptor};

use crate::error::StorageError;
use crate::layout::GridLayout;
use crate::payload::{check_descriptor, pack_pairs, unpack_pairs, CellStore};
use crate::reshape::{self, ReshapePlan};
use crate::storage::{GridStorage, StorageKind};

/// One optional object per cell.
///
/// `remove_object` is structural: the slot becomes empty.
#[derive(Clone, Debug)]
pub struct ObjectStorage<T> {
    layout: GridLayout,
    slots: Vec<Option<T>>,
}

impl<T: Identified> ObjectStorage<T> {
    /// Create an empty storage.
    pub fn new(shape: HyperRect) -> Self {
        let layout = GridLayout::new(shape);
        let slots = std::iter::repeat_with(|| None).take(layout.len()).collect();
        Self { layout, slots }
    }

    /// Replace the halo bounds used by the `*_global` accessors.
    pub fn set_halo_bounds(&mut self, halo: HyperRect) -> Result<(), StorageError> {
        self.layout.set_halo_bounds(halo)
    }

    /// Put `value` in the cell at `p`, returning the object it displaced.
    pub fn add_object(&mut self, p: &IntPoint, value: T) -> Result<Option<T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(self.slots[i].replace(value))
    }

    /// The object at `p` if its id is `id`.
    pub fn get_object(&self, p: &IntPoint, id: ObjectId) -> Result<Option<&T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(self.slots[i].as_ref().filter(|v| v.id() == id))
    }

    /// Zero or one objects at `p`.
    pub fn get_all_objects(&self, p: &IntPoint) -> Result<&[T], StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(self.slots[i].as_slice())
    }

    /// Empty the slot at `p` if it holds `id`.
    pub fn remove_object(&mut self, p: &IntPoint, id: ObjectId) -> Result<Option<T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        let slot = &mut self.slots[i];
        if slot.as_ref().is_some_and(|v| v.id() == id) {
            Ok(slot.take())
        } else {
            Ok(None)
        }
    }

    /// Empty the slot at `p`.
    pub fn clear_at(&mut self, p: &IntPoint) -> Result<Option<T>, StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(self.slots[i].take())
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// [`add_object`](Self::add_object) at a global point.
    pub fn add_object_global(&mut self, p: &IntPoint, value: T) -> Result<Option<T>, StorageError> {
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
    pub fn clear_at_global(&mut self, p: &IntPoint) -> Result<Option<T>, StorageError> {
        let local = self.layout.to_local(p)?;
        self.clear_at(&local)
    }
}

impl<T> CellStore<T> for ObjectStorage<T> {
    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn cell(&self, flat: usize) -> &[T] {
        self.slots[flat].as_slice()
    }

    fn clear_cell(&mut self, flat: usize) {
        self.slots[flat] = None;
    }

    fn insert_cell(&mut self, flat: usize, value: T) {
        self.slots[flat] = Some(value);
    }
}

impl<T: Identified> GridStorage<T> for ObjectStorage<T> {
    fn kind(&self) -> StorageKind {
        StorageKind::Object
    }

    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    fn reshape(&mut self, new_shape: HyperRect) -> Result<(), StorageError> {
        let plan = reshape::plan(self.layout.shape(), &new_shape, StorageKind::Object.wire_type())?;
        let layout = match plan {
            ReshapePlan::Keep => return Ok(()),
            _ => self.layout.reshaped(new_shape)?,
        };
        let slots = match plan {
            ReshapePlan::Transfer { src, dst } => {
                reshape::move_slots(&mut self.slots, layout.len(), &src, &dst)
            }
            _ => std::iter::repeat_with(|| None).take(layout.len()).collect(),
        };
        debug!("reshape object storage {} -> {}", self.layout.shape(), layout.shape());
        self.layout = layout;
        self.slots = slots;
        Ok(())
    }

    fn pack<C: Codec<T>>(
        &self,
        desc: &TransferDescriptor,
        codec: &C,
        out: &mut Vec<u8>,
    ) -> Result<(), StorageError> {
        check_descriptor(&self.layout, desc, StorageKind::Object.wire_type())?;
        pack_pairs(self, desc, codec, out)
    }

    fn unpack<C: Codec<T>>(
        &mut self,
        desc: &TransferDescriptor,
        codec: &C,
        input: &mut &[u8],
    ) -> Result<usize, StorageError> {
        check_descriptor(&self.layout, desc, StorageKind::Object.wire_type())?;
        unpack_pairs(self, desc, codec, input)
    }
}
