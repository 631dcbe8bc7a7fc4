//! Fixed-slot scalar storage for int and double fields.

use std::fmt;

use log::debug;
use mosaic_core::wire::{put_f64_le, put_i32_le, take_f64_le, take_i32_le};
use mosaic_core::{Codec, WireError, WireType};
use mosaic_space::{HyperRect, IntPoint, TransferDescriptor};

use crate::error::StorageError;
use crate::layout::GridLayout;
use crate::payload::check_descriptor;
use crate::reshape::{self, ReshapePlan};
use crate::storage::{GridStorage, StorageKind};

/// A fixed-width cell value.
pub trait Scalar: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The storage variant holding this type.
    const KIND: StorageKind;

    /// Append the little-endian encoding.
    fn put(self, out: &mut Vec<u8>);

    /// Read one value from the front of `input`.
    fn take(input: &mut &[u8]) -> Result<Self, WireError>;
}

impl Scalar for i32 {
    const KIND: StorageKind = StorageKind::Int;

    fn put(self, out: &mut Vec<u8>) {
        put_i32_le(out, self);
    }

    fn take(input: &mut &[u8]) -> Result<Self, WireError> {
        take_i32_le(input)
    }
}

impl Scalar for f64 {
    const KIND: StorageKind = StorageKind::Double;

    fn put(self, out: &mut Vec<u8>) {
        put_f64_le(out, self);
    }

    fn take(input: &mut &[u8]) -> Result<Self, WireError> {
        take_f64_le(input)
    }
}

/// Int field storage.
pub type IntStorage = ScalarStorage<i32>;

/// Double field storage.
pub type DoubleStorage = ScalarStorage<f64>;

/// One scalar per cell.
///
/// There is no separate notion of absence: an empty cell holds the
/// caller-supplied sentinel, and `remove_object` writes the sentinel back.
#[derive(Clone, Debug)]
pub struct ScalarStorage<S: Scalar> {
    layout: GridLayout,
    data: Vec<S>,
    sentinel: S,
}

impl<S: Scalar> ScalarStorage<S> {
    /// Create a storage with every cell set to `sentinel`.
    pub fn new(shape: HyperRect, sentinel: S) -> Self {
        let layout = GridLayout::new(shape);
        let data = vec![sentinel; layout.len()];
        Self {
            layout,
            data,
            sentinel,
        }
    }

    /// The value meaning "empty".
    pub fn sentinel(&self) -> S {
        self.sentinel
    }

    /// The raw buffer in row-major order.
    pub fn values(&self) -> &[S] {
        &self.data
    }

    /// Replace the halo bounds used by the `*_global` accessors.
    pub fn set_halo_bounds(&mut self, halo: HyperRect) -> Result<(), StorageError> {
        self.layout.set_halo_bounds(halo)
    }

    /// Store `value` at `p`, returning the previous value.
    pub fn add_object(&mut self, p: &IntPoint, value: S) -> Result<S, StorageError> {
        let i = self.layout.flat_index(p)?;
        Ok(std::mem::replace(&mut self.data[i], value))
    }

    /// The value at `p`.
    pub fn get(&self, p: &IntPoint) -> Result<S, StorageError> {
        Ok(self.data[self.layout.flat_index(p)?])
    }

    /// Reset `p` to the sentinel, returning the previous value.
    pub fn remove_object(&mut self, p: &IntPoint) -> Result<S, StorageError> {
        let sentinel = self.sentinel;
        self.add_object(p, sentinel)
    }

    /// Reset `p` to the sentinel.
    pub fn clear_at(&mut self, p: &IntPoint) -> Result<(), StorageError> {
        self.remove_object(p).map(|_| ())
    }

    /// [`add_object`](Self::add_object) at a global point.
    pub fn add_object_global(&mut self, p: &IntPoint, value: S) -> Result<S, StorageError> {
        let local = self.layout.to_local(p)?;
        self.add_object(&local, value)
    }

    /// [`get`](Self::get) at a global point.
    pub fn get_global(&self, p: &IntPoint) -> Result<S, StorageError> {
        self.get(&self.layout.to_local(p)?)
    }

    /// [`remove_object`](Self::remove_object) at a global point.
    pub fn remove_object_global(&mut self, p: &IntPoint) -> Result<S, StorageError> {
        let local = self.layout.to_local(p)?;
        self.remove_object(&local)
    }

    /// Write the described cells as fixed-width values in run order.
    pub fn pack_values(&self, desc: &TransferDescriptor, out: &mut Vec<u8>) -> Result<(), StorageError> {
        check_descriptor(&self.layout, desc, S::KIND.wire_type())?;
        out.reserve(desc.count() * S::KIND.wire_type().fixed_width().unwrap_or(0));
        for flat in reshape::cells(desc) {
            self.data[flat].put(out);
        }
        Ok(())
    }

    /// Read fixed-width values into the described cells in run order.
    pub fn unpack_values(
        &mut self,
        desc: &TransferDescriptor,
        input: &mut &[u8],
    ) -> Result<usize, StorageError> {
        check_descriptor(&self.layout, desc, S::KIND.wire_type())?;
        let values = (0..desc.count())
            .map(|_| S::take(input))
            .collect::<Result<Vec<S>, _>>()?;
        for (flat, value) in reshape::cells(desc).zip(values) {
            self.data[flat] = value;
        }
        Ok(desc.count())
    }
}

impl<S: Scalar> GridStorage<S> for ScalarStorage<S> {
    fn kind(&self) -> StorageKind {
        S::KIND
    }

    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn clear(&mut self) {
        self.data.fill(self.sentinel);
    }

    fn reshape(&mut self, new_shape: HyperRect) -> Result<(), StorageError> {
        let old_shape = self.layout.shape().clone();
        let plan = reshape::plan(&old_shape, &new_shape, S::KIND.wire_type())?;
        let layout = match plan {
            ReshapePlan::Keep => return Ok(()),
            _ => self.layout.reshaped(new_shape)?,
        };
        let mut data = vec![self.sentinel; layout.len()];
        let mut kept = 0;
        if let ReshapePlan::Transfer { src, dst } = plan {
            for (from, to) in reshape::paired_cells(&src, &dst) {
                data[to] = self.data[from];
            }
            kept = src.count();
        }
        debug!(
            "reshape {} storage {} -> {}, kept {} cells",
            S::KIND,
            old_shape,
            layout.shape(),
            kept
        );
        self.layout = layout;
        self.data = data;
        Ok(())
    }

    fn pack<C: Codec<S>>(
        &self,
        desc: &TransferDescriptor,
        _codec: &C,
        out: &mut Vec<u8>,
    ) -> Result<(), StorageError> {
        self.pack_values(desc, out)
    }

    fn unpack<C: Codec<S>>(
        &mut self,
        desc: &TransferDescriptor,
        _codec: &C,
        input: &mut &[u8],
    ) -> Result<usize, StorageError> {
        self.unpack_values(desc, input)
    }
}
