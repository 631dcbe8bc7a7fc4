//! Half-open axis-aligned hyper-rectangles.

use std::cmp::Ordering;
use std::fmt;

use mosaic_core::{PartitionId, Wire, WireError};

use crate::error::{check_axis, check_nd, GeometryError};
use crate::point::{Coords, IntPoint, RealPoint};

/// An axis-aligned rectangle `[ul, br)` on the integer lattice.
///
/// `ul` is inclusive and `br` exclusive on every axis, and `ul <= br`
/// holds per axis. A rectangle with a zero extent on any axis is empty:
/// it contains nothing and intersects nothing.
///
/// The [`PartitionId`] is carried along but never affects geometry; it
/// only breaks ties in ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HyperRect {
    id: PartitionId,
    ul: IntPoint,
    br: IntPoint,
}

impl HyperRect {
    /// Create a rectangle from its corners.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the corners disagree on `nd`, or
    /// `InvalidBounds` if `ul[i] > br[i]` on any axis.
    pub fn new(id: PartitionId, ul: IntPoint, br: IntPoint) -> Result<Self, GeometryError> {
        check_nd(ul.nd(), br.nd())?;
        if ul.coords().iter().zip(br.coords()).any(|(a, b)| a > b) {
            return Err(GeometryError::InvalidBounds {
                ul: Coords::from_slice(ul.coords()),
                br: Coords::from_slice(br.coords()),
            });
        }
        Ok(Self { id, ul, br })
    }

    /// A rectangle at the origin with the given extents.
    pub fn from_size(id: PartitionId, size: &[i32]) -> Result<Self, GeometryError> {
        let ul = IntPoint::zeros(size.len());
        let br = IntPoint::from_slice(size);
        Self::new(id, ul, br)
    }

    /// A 2D rectangle from corner coordinates.
    pub fn xy(id: PartitionId, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Self, GeometryError> {
        Self::new(id, IntPoint::xy(x0, y0), IntPoint::xy(x1, y1))
    }

    /// The attached partition id.
    pub fn id(&self) -> PartitionId {
        self.id
    }

    /// The same rectangle with a different id.
    pub fn with_id(mut self, id: PartitionId) -> Self {
        self.id = id;
        self
    }

    /// Inclusive lower corner.
    pub fn ul(&self) -> &IntPoint {
        &self.ul
    }

    /// Exclusive upper corner.
    pub fn br(&self) -> &IntPoint {
        &self.br
    }

    /// Number of axes.
    pub fn nd(&self) -> usize {
        self.ul.nd()
    }

    /// Extent per axis.
    pub fn size(&self) -> Coords {
        self.br
            .coords()
            .iter()
            .zip(self.ul.coords())
            .map(|(b, a)| b - a)
            .collect()
    }

    /// Number of cells. Zero if any extent is zero.
    pub fn area(&self) -> usize {
        self.size().iter().map(|&s| s as usize).product()
    }

    /// True if the rectangle holds no cells.
    pub fn is_empty(&self) -> bool {
        self.size().iter().any(|&s| s == 0)
    }

    /// True if `ul <= p < br` on every axis.
    pub fn contains(&self, p: &IntPoint) -> Result<bool, GeometryError> {
        Ok(p.all_geq(&self.ul)? && p.all_lt(&self.br)?)
    }

    /// True if the real point lies in `[ul, br)`, with tolerance at `ul`.
    pub fn contains_real(&self, p: &RealPoint) -> Result<bool, GeometryError> {
        Ok(p.all_geq(&self.ul)? && p.all_lt(&self.br)?)
    }

    /// True if `other` lies entirely inside `self`.
    ///
    /// An empty `other` is contained when its corners are within bounds.
    pub fn contains_rect(&self, other: &HyperRect) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(other.ul.all_geq(&self.ul)? && self.br.all_geq(&other.br)?)
    }

    /// True if the two rectangles share at least one cell.
    pub fn intersects(&self, other: &HyperRect) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.ul.all_lt(&other.br)? && other.ul.all_lt(&self.br)?)
    }

    /// The shared region, keeping `self`'s id, or `None` if it is empty.
    pub fn intersection(&self, other: &HyperRect) -> Result<Option<HyperRect>, GeometryError> {
        if !self.intersects(other)? {
            return Ok(None);
        }
        let ul = self.ul.component_max(&other.ul)?;
        let br = self.br.component_min(&other.br)?;
        Ok(Some(Self { id: self.id, ul, br }))
    }

    /// Translate by `+offsets`.
    pub fn shift(&self, offsets: &[i32]) -> Result<Self, GeometryError> {
        Ok(Self {
            id: self.id,
            ul: self.ul.shift(offsets)?,
            br: self.br.shift(offsets)?,
        })
    }

    /// Translate by `-offsets`.
    pub fn rshift(&self, offsets: &[i32]) -> Result<Self, GeometryError> {
        Ok(Self {
            id: self.id,
            ul: self.ul.rshift(offsets)?,
            br: self.br.rshift(offsets)?,
        })
    }

    /// Grow every side by `delta` cells, or shrink if `delta` is negative.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if shrinking would invert an axis.
    pub fn resize(&self, delta: i32) -> Result<Self, GeometryError> {
        Self::new(self.id, self.ul.shift_all(-delta), self.br.shift_all(delta))
    }

    /// Grow both sides of one axis by `delta`.
    pub fn resize_dim(&self, dim: usize, delta: i32) -> Result<Self, GeometryError> {
        Self::new(
            self.id,
            self.ul.shift_dim(dim, -delta)?,
            self.br.shift_dim(dim, delta)?,
        )
    }

    /// Drop axis `dim`.
    pub fn reduce_dim(&self, dim: usize) -> Result<Self, GeometryError> {
        Ok(Self {
            id: self.id,
            ul: self.ul.reduce_dim(dim)?,
            br: self.br.reduce_dim(dim)?,
        })
    }

    /// True if the two rectangles coincide once axis `dim` is ignored.
    pub fn is_aligned(&self, other: &HyperRect, dim: usize) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        let a = self.reduce_dim(dim)?;
        let b = other.reduce_dim(dim)?;
        Ok(a.ul == b.ul && a.br == b.br)
    }

    /// The `2^nd` corners, bit `i` of the index selecting `br` on axis `i`.
    pub fn vertices(&self) -> Vec<IntPoint> {
        let nd = self.nd();
        (0..1usize << nd)
            .map(|mask| {
                IntPoint::new(
                    (0..nd)
                        .map(|i| {
                            if mask & (1 << i) == 0 {
                                self.ul[i]
                            } else {
                                self.br[i]
                            }
                        })
                        .collect(),
                )
            })
            .collect()
    }

    /// Cut the rectangle along every axis at each of `points`.
    ///
    /// Points must lie inside the closed rectangle. Empty pieces are
    /// dropped, so the result tiles `self` exactly. Pieces come out in
    /// row-major order of their lower corners.
    pub fn split(&self, points: &[IntPoint]) -> Result<Vec<HyperRect>, GeometryError> {
        let nd = self.nd();
        for p in points {
            if !(p.all_geq(&self.ul)? && self.br.all_geq(p)?) {
                return Err(GeometryError::NotContained {
                    region: p.to_string(),
                    bounds: self.to_string(),
                });
            }
        }

        let delims: Vec<Vec<i32>> = (0..nd)
            .map(|i| {
                let mut d: Vec<i32> = std::iter::once(self.ul[i])
                    .chain(points.iter().map(|p| p[i]))
                    .chain(std::iter::once(self.br[i]))
                    .collect();
                d.sort_unstable();
                d.dedup();
                d
            })
            .collect();

        let pieces_per_axis: Vec<usize> = delims.iter().map(|d| d.len().saturating_sub(1)).collect();
        let total: usize = pieces_per_axis.iter().product();
        let mut out = Vec::with_capacity(total);
        for k in 0..total {
            let mut rem = k;
            let mut ul = Coords::from_elem(0, nd);
            let mut br = Coords::from_elem(0, nd);
            for i in (0..nd).rev() {
                let idx = rem % pieces_per_axis[i];
                rem /= pieces_per_axis[i];
                ul[i] = delims[i][idx];
                br[i] = delims[i][idx + 1];
            }
            let piece = Self {
                id: self.id,
                ul: IntPoint::new(ul),
                br: IntPoint::new(br),
            };
            if !piece.is_empty() {
                out.push(piece);
            }
        }
        Ok(out)
    }

    /// Fold a rectangle that sticks out of `world` back into it.
    ///
    /// The rectangle is split at the world's corners and every piece lying
    /// outside is shifted by one world extent on the offending axes. The
    /// pieces together cover the same cells of the torus as `self`, which
    /// must not be larger than the world on any axis.
    pub fn to_toroidal(&self, world: &HyperRect) -> Result<Vec<HyperRect>, GeometryError> {
        check_nd(self.nd(), world.nd())?;
        let size = world.size();
        let cuts: Vec<IntPoint> = world
            .vertices()
            .into_iter()
            .map(|v| v.component_max(&self.ul)?.component_min(&self.br))
            .collect::<Result<_, _>>()?;

        let mut out = Vec::new();
        for piece in self.split(&cuts)? {
            let offsets: Coords = (0..self.nd())
                .map(|i| {
                    if piece.br[i] > world.br[i] {
                        -size[i]
                    } else if piece.ul[i] < world.ul[i] {
                        size[i]
                    } else {
                        0
                    }
                })
                .collect();
            out.push(piece.shift(&offsets)?);
        }
        Ok(out)
    }

    /// Iterate the cells in row-major order, last axis fastest.
    pub fn iter(&self) -> RectIter {
        RectIter {
            ul: self.ul.clone(),
            br: self.br.clone(),
            next: if self.is_empty() || self.nd() == 0 {
                None
            } else {
                Some(self.ul.clone())
            },
        }
    }
}

impl Ord for HyperRect {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ul
            .cmp(&other.ul)
            .then_with(|| self.br.cmp(&other.br))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for HyperRect {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HyperRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})#{}", self.ul, self.br, self.id)
    }
}

impl<'a> IntoIterator for &'a HyperRect {
    type Item = IntPoint;
    type IntoIter = RectIter;
    fn into_iter(self) -> RectIter {
        self.iter()
    }
}

impl Wire for HyperRect {
    fn encode(&self, out: &mut Vec<u8>) {
        self.id.encode(out);
        self.ul.encode(out);
        self.br.encode(out);
    }

    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let id = PartitionId::decode(input)?;
        let ul = IntPoint::decode(input)?;
        let br = IntPoint::decode(input)?;
        Self::new(id, ul, br).map_err(|e| WireError::Malformed {
            detail: e.to_string(),
        })
    }
}

/// Row-major cell iterator over a [`HyperRect`].
#[derive(Clone, Debug)]
pub struct RectIter {
    ul: IntPoint,
    br: IntPoint,
    next: Option<IntPoint>,
}

impl Iterator for RectIter {
    type Item = IntPoint;

    fn next(&mut self) -> Option<IntPoint> {
        let current = self.next.take()?;
        let mut c = Coords::from_slice(current.coords());
        // Odometer increment from the last axis.
        let mut axis = c.len();
        while axis > 0 {
            axis -= 1;
            c[axis] += 1;
            if c[axis] < self.br[axis] {
                self.next = Some(IntPoint::new(c));
                return Some(current);
            }
            c[axis] = self.ul[axis];
        }
        Some(current)
    }
}
