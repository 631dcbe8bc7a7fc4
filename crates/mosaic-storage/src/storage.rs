//! The shared storage contract and the closed set of variants.

use std::fmt;

use mosaic_core::{Codec, Identified, WireType};
use mosaic_space::{HyperRect, TransferDescriptor};

use crate::config::StorageConfig;
use crate::continuous::ContinuousStorage;
use crate::dense::DenseStorage;
use crate::error::StorageError;
use crate::layout::GridLayout;
use crate::object::ObjectStorage;
use crate::scalar::{DoubleStorage, IntStorage};

/// Which backing layout a storage uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// One `i32` per cell.
    Int,
    /// One `f64` per cell.
    Double,
    /// At most one object per cell.
    Object,
    /// An ordered bag of objects per cell.
    Dense,
    /// Objects at real-valued locations.
    Continuous,
}

impl StorageKind {
    /// The datatype carried by descriptors for this variant.
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Int => WireType::Int32,
            Self::Double => WireType::Float64,
            Self::Object | Self::Dense => WireType::Object,
            Self::Continuous => WireType::LocatedObject,
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::Object => "object",
            Self::Dense => "dense",
            Self::Continuous => "continuous",
        })
    }
}

/// Operations every storage variant supports.
///
/// `T` is the element type as seen by the codec. Scalar storages ignore
/// the codec and write fixed-width values.
pub trait GridStorage<T> {
    /// The backing layout kind.
    fn kind(&self) -> StorageKind;

    /// Shape, halo bounds and strides.
    fn layout(&self) -> &GridLayout;

    /// Payload datatype of descriptors for this storage.
    fn wire_type(&self) -> WireType {
        self.kind().wire_type()
    }

    /// Empty every cell.
    fn clear(&mut self);

    /// Change the shape, keeping the contents of the overlap.
    ///
    /// Identical shapes are a no-op. Disjoint shapes leave an empty
    /// storage. The halo translation offset is preserved.
    fn reshape(&mut self, new_shape: HyperRect) -> Result<(), StorageError>;

    /// A descriptor for `regions` relative to this storage's shape.
    fn descriptor(&self, regions: Vec<HyperRect>) -> Result<TransferDescriptor, StorageError> {
        Ok(TransferDescriptor::new(
            regions,
            self.layout().shape(),
            self.wire_type(),
        )?)
    }

    /// Append the described cells to `out`.
    fn pack<C: Codec<T>>(
        &self,
        desc: &TransferDescriptor,
        codec: &C,
        out: &mut Vec<u8>,
    ) -> Result<(), StorageError>;

    /// Overwrite the described cells from `input`, advancing it past the
    /// consumed bytes. Returns the number of elements read.
    ///
    /// The whole payload is decoded before any cell is written: on error
    /// the storage is unchanged, though `input` may have been partly
    /// consumed.
    fn unpack<C: Codec<T>>(
        &mut self,
        desc: &TransferDescriptor,
        codec: &C,
        input: &mut &[u8],
    ) -> Result<usize, StorageError>;
}

/// Any storage variant, for callers that choose the layout at runtime.
///
/// Object-bearing variants hold `T`; the scalar variants ignore it.
/// Payloads for scalar variants are fixed-width and never touch the codec.
#[derive(Clone, Debug)]
pub enum AnyStorage<T> {
    /// Int storage.
    Int(IntStorage),
    /// Double storage.
    Double(DoubleStorage),
    /// Object storage.
    Object(ObjectStorage<T>),
    /// Dense storage.
    Dense(DenseStorage<T>),
    /// Continuous storage.
    Continuous(ContinuousStorage<T>),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            AnyStorage::Int($s) => $body,
            AnyStorage::Double($s) => $body,
            AnyStorage::Object($s) => $body,
            AnyStorage::Dense($s) => $body,
            AnyStorage::Continuous($s) => $body,
        }
    };
}

macro_rules! accessor {
    ($name:ident, $name_mut:ident, $variant:ident, $ty:ty, $op:literal) => {
        #[doc = concat!("The inner storage if this is `", stringify!($variant), "`.")]
        pub fn $name(&self) -> Result<&$ty, StorageError> {
            match self {
                Self::$variant(s) => Ok(s),
                other => Err(StorageError::Unsupported {
                    op: $op,
                    kind: other.kind(),
                }),
            }
        }

        #[doc = concat!("The inner storage, mutably, if this is `", stringify!($variant), "`.")]
        pub fn $name_mut(&mut self) -> Result<&mut $ty, StorageError> {
            match self {
                Self::$variant(s) => Ok(s),
                other => Err(StorageError::Unsupported {
                    op: $op,
                    kind: other.kind(),
                }),
            }
        }
    };
}

impl<T: Identified> AnyStorage<T> {
    /// Build an empty storage of `kind` over `shape`.
    pub fn new(kind: StorageKind, shape: HyperRect, config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate()?;
        Ok(match kind {
            StorageKind::Int => Self::Int(IntStorage::new(shape, config.int_sentinel)),
            StorageKind::Double => Self::Double(DoubleStorage::new(shape, config.double_sentinel)),
            StorageKind::Object => Self::Object(ObjectStorage::new(shape)),
            StorageKind::Dense => Self::Dense(DenseStorage::new(shape, config.remove_empty_bags)),
            StorageKind::Continuous => {
                Self::Continuous(ContinuousStorage::new(shape, config.discretization)?)
            }
        })
    }

    /// Replace the halo bounds used by global-coordinate accessors.
    pub fn set_halo_bounds(&mut self, halo: HyperRect) -> Result<(), StorageError> {
        dispatch!(self, s => s.set_halo_bounds(halo))
    }

    accessor!(as_int, as_int_mut, Int, IntStorage, "as_int");
    accessor!(as_double, as_double_mut, Double, DoubleStorage, "as_double");
    accessor!(as_object, as_object_mut, Object, ObjectStorage<T>, "as_object");
    accessor!(as_dense, as_dense_mut, Dense, DenseStorage<T>, "as_dense");
    accessor!(as_continuous, as_continuous_mut, Continuous, ContinuousStorage<T>, "as_continuous");
}

impl<T: Identified> GridStorage<T> for AnyStorage<T> {
    fn kind(&self) -> StorageKind {
        match self {
            Self::Int(_) => StorageKind::Int,
            Self::Double(_) => StorageKind::Double,
            Self::Object(_) => StorageKind::Object,
            Self::Dense(_) => StorageKind::Dense,
            Self::Continuous(_) => StorageKind::Continuous,
        }
    }

    fn layout(&self) -> &GridLayout {
        dispatch!(self, s => s.layout())
    }

    fn clear(&mut self) {
        dispatch!(self, s => s.clear())
    }

    fn reshape(&mut self, new_shape: HyperRect) -> Result<(), StorageError> {
        dispatch!(self, s => s.reshape(new_shape))
    }

    fn pack<C: Codec<T>>(
        &self,
        desc: &TransferDescriptor,
        codec: &C,
        out: &mut Vec<u8>,
    ) -> Result<(), StorageError> {
        match self {
            Self::Int(s) => s.pack_values(desc, out),
            Self::Double(s) => s.pack_values(desc, out),
            Self::Object(s) => s.pack(desc, codec, out),
            Self::Dense(s) => s.pack(desc, codec, out),
            Self::Continuous(s) => s.pack(desc, codec, out),
        }
    }

    fn unpack<C: Codec<T>>(
        &mut self,
        desc: &TransferDescriptor,
        codec: &C,
        input: &mut &[u8],
    ) -> Result<usize, StorageError> {
        match self {
            Self::Int(s) => s.unpack_values(desc, input),
            Self::Double(s) => s.unpack_values(desc, input),
            Self::Object(s) => s.unpack(desc, codec, input),
            Self::Dense(s) => s.unpack(desc, codec, input),
            Self::Continuous(s) => s.unpack(desc, codec, input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{ObjectId, PartitionId, WireCodec};
    use mosaic_space::IntPoint;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> HyperRect {
        HyperRect::xy(PartitionId(0), x0, y0, x1, y1).unwrap()
    }

    #[test]
    fn wrong_variant_accessor_is_unsupported() {
        let s: AnyStorage<ObjectId> =
            AnyStorage::new(StorageKind::Dense, rect(0, 0, 2, 2), &StorageConfig::default()).unwrap();
        assert!(s.as_dense().is_ok());
        assert_eq!(
            s.as_object().unwrap_err(),
            StorageError::Unsupported {
                op: "as_object",
                kind: StorageKind::Dense
            }
        );
    }

    #[test]
    fn any_storage_dispatches_pack_by_variant() {
        let shape = rect(0, 0, 3, 3);
        let config = StorageConfig {
            int_sentinel: -1,
            ..Default::default()
        };
        let mut a: AnyStorage<ObjectId> = AnyStorage::new(StorageKind::Int, shape.clone(), &config).unwrap();
        a.as_int_mut().unwrap().add_object(&IntPoint::xy(2, 2), 8).unwrap();
        let desc = a.descriptor(vec![rect(2, 0, 3, 3)]).unwrap();
        assert_eq!(desc.wire_type(), WireType::Int32);
        let mut buf = Vec::new();
        a.pack(&desc, &WireCodec, &mut buf).unwrap();

        let mut b: AnyStorage<ObjectId> = AnyStorage::new(StorageKind::Int, shape, &config).unwrap();
        assert_eq!(b.unpack(&desc, &WireCodec, &mut buf.as_slice()).unwrap(), 3);
        assert_eq!(b.as_int().unwrap().get(&IntPoint::xy(2, 2)).unwrap(), 8);
        assert_eq!(b.as_int().unwrap().get(&IntPoint::xy(2, 0)).unwrap(), -1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StorageConfig {
            discretization: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            AnyStorage::<ObjectId>::new(StorageKind::Continuous, rect(0, 0, 2, 2), &config),
            Err(StorageError::InvalidConfig { .. })
        ));
    }
}
