//! Shape, halo bounds and flat indexing of a storage buffer.

use mosaic_space::{row_major_strides, Coords, GeometryError, HyperRect, IntPoint, RealPoint};

use crate::error::StorageError;

/// Maps points in a storage's shape to flat buffer indices.
///
/// The buffer is row-major with the last axis fastest, so in 2D
/// `flat_index((x, y)) = (x - ul.x) * height + (y - ul.y)` where `height`
/// is the current shape's extent on axis 1. Strides are derived from the
/// shape at construction and never updated in place: a reshape builds a
/// new layout, so strides cannot drift out of sync with the shape.
///
/// The halo bounds translate externally addressed (global) points into
/// the shape's frame: `local = global - halo.ul + shape.ul`. By default
/// they equal the shape and the translation is the identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridLayout {
    shape: HyperRect,
    halo_bounds: HyperRect,
    strides: Coords,
}

impl GridLayout {
    /// A layout whose halo bounds coincide with the shape.
    pub fn new(shape: HyperRect) -> Self {
        let strides = row_major_strides(&shape.size());
        Self {
            halo_bounds: shape.clone(),
            shape,
            strides,
        }
    }

    /// A layout with distinct halo bounds.
    pub fn with_halo_bounds(shape: HyperRect, halo_bounds: HyperRect) -> Result<Self, StorageError> {
        if shape.nd() != halo_bounds.nd() {
            return Err(GeometryError::DimensionMismatch {
                expected: shape.nd(),
                found: halo_bounds.nd(),
            }
            .into());
        }
        let mut layout = Self::new(shape);
        layout.halo_bounds = halo_bounds;
        Ok(layout)
    }

    /// The storage's shape.
    pub fn shape(&self) -> &HyperRect {
        &self.shape
    }

    /// The rectangle global coordinates are measured against.
    pub fn halo_bounds(&self) -> &HyperRect {
        &self.halo_bounds
    }

    /// Replace the halo bounds. The shape is unchanged.
    pub fn set_halo_bounds(&mut self, halo_bounds: HyperRect) -> Result<(), StorageError> {
        *self = Self::with_halo_bounds(self.shape.clone(), halo_bounds)?;
        Ok(())
    }

    /// Row-major strides of the buffer.
    pub fn strides(&self) -> &[i32] {
        &self.strides
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.shape.area()
    }

    /// True if the shape holds no cells.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Extent of axis 1, the stride of axis 0 in 2D.
    pub fn height(&self) -> usize {
        self.shape.size().get(1).map_or(1, |&h| h as usize)
    }

    /// Flat buffer index of a point in the shape's frame.
    pub fn flat_index(&self, p: &IntPoint) -> Result<usize, StorageError> {
        if !self.shape.contains(p)? {
            return Err(self.out_of_bounds(p));
        }
        let ul = self.shape.ul();
        Ok((0..p.nd())
            .map(|i| ((p[i] - ul[i]) * self.strides[i]) as usize)
            .sum())
    }

    /// The point at a flat buffer index. Inverse of [`flat_index`](Self::flat_index).
    pub fn point_at(&self, mut flat: usize) -> IntPoint {
        let ul = self.shape.ul();
        let mut c = Coords::from_elem(0, self.strides.len());
        for i in 0..self.strides.len() {
            let stride = self.strides[i] as usize;
            c[i] = ul[i] + (flat / stride) as i32;
            flat %= stride;
        }
        IntPoint::new(c)
    }

    /// Translate a global point into the shape's frame.
    pub fn to_local(&self, global: &IntPoint) -> Result<IntPoint, StorageError> {
        let offset = self.halo_offset()?;
        Ok(global.rshift(&offset)?)
    }

    /// Translate a global real point into the shape's frame.
    pub fn to_local_real(&self, global: &RealPoint) -> Result<RealPoint, StorageError> {
        let offset = self.halo_offset()?;
        Ok(global.rshift_int(&offset)?)
    }

    /// Translate a point in the shape's frame to global coordinates.
    pub fn to_global(&self, local: &IntPoint) -> Result<IntPoint, StorageError> {
        let offset = self.halo_offset()?;
        Ok(local.shift(&offset)?)
    }

    /// Translate a global rectangle into the shape's frame.
    pub fn to_local_rect(&self, global: &HyperRect) -> Result<HyperRect, StorageError> {
        let offset = self.halo_offset()?;
        Ok(global.rshift(&offset)?)
    }

    /// A layout for `new_shape` that keeps the current global-to-local
    /// translation. The halo bounds take the new shape's extents.
    pub fn reshaped(&self, new_shape: HyperRect) -> Result<Self, StorageError> {
        let offset = self.halo_offset()?;
        let halo = new_shape.shift(&offset)?.with_id(self.halo_bounds.id());
        Self::with_halo_bounds(new_shape, halo)
    }

    /// True if `desc_shape` describes the same cells as this layout's shape.
    pub(crate) fn same_shape(&self, other: &HyperRect) -> bool {
        self.shape.ul() == other.ul() && self.shape.br() == other.br()
    }

    pub(crate) fn out_of_bounds(&self, p: &IntPoint) -> StorageError {
        StorageError::OutOfBounds {
            point: p.to_string(),
            shape: self.shape.to_string(),
        }
    }

    fn halo_offset(&self) -> Result<Coords, GeometryError> {
        self.halo_bounds.ul().offsets(self.shape.ul())
    }
}
