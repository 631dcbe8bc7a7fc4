//! Integer and real points.

use std::fmt;
use std::ops::Index;

use mosaic_core::wire::{put_u32_le, take_len};
use mosaic_core::{Wire, WireError};
use smallvec::SmallVec;

use crate::error::{check_axis, check_nd, GeometryError};
use crate::rect::HyperRect;

/// Integer coordinate storage. Inline up to 4 axes.
pub type Coords = SmallVec<[i32; 4]>;

/// Real coordinate storage. Inline up to 4 axes.
pub type RealCoords = SmallVec<[f64; 4]>;

/// Per-axis tolerance for comparisons involving real coordinates.
pub const EPSILON: f64 = 1e-7;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// ── IntPoint ────────────────────────────────────────────────────

/// An immutable point on the integer lattice.
///
/// Ordering is lexicographic over the coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntPoint {
    c: Coords,
}

impl IntPoint {
    /// Create a point from its coordinates.
    pub fn new(c: Coords) -> Self {
        Self { c }
    }

    /// Create a point from a coordinate slice.
    pub fn from_slice(c: &[i32]) -> Self {
        Self { c: Coords::from_slice(c) }
    }

    /// A 2D point.
    pub fn xy(x: i32, y: i32) -> Self {
        Self::from_slice(&[x, y])
    }

    /// The origin in `nd` dimensions.
    pub fn zeros(nd: usize) -> Self {
        Self {
            c: smallvec::smallvec![0; nd],
        }
    }

    /// Number of axes.
    pub fn nd(&self) -> usize {
        self.c.len()
    }

    /// The coordinates as a slice.
    pub fn coords(&self) -> &[i32] {
        &self.c
    }

    /// Translate by `+offsets`.
    pub fn shift(&self, offsets: &[i32]) -> Result<Self, GeometryError> {
        check_nd(self.nd(), offsets.len())?;
        Ok(Self {
            c: self.c.iter().zip(offsets).map(|(a, b)| a + b).collect(),
        })
    }

    /// Translate by `-offsets`.
    pub fn rshift(&self, offsets: &[i32]) -> Result<Self, GeometryError> {
        check_nd(self.nd(), offsets.len())?;
        Ok(Self {
            c: self.c.iter().zip(offsets).map(|(a, b)| a - b).collect(),
        })
    }

    /// Translate a single axis.
    pub fn shift_dim(&self, dim: usize, offset: i32) -> Result<Self, GeometryError> {
        check_axis(dim, self.nd())?;
        let mut c = self.c.clone();
        c[dim] += offset;
        Ok(Self { c })
    }

    /// Translate every axis by the same amount.
    pub fn shift_all(&self, offset: i32) -> Self {
        Self {
            c: self.c.iter().map(|a| a + offset).collect(),
        }
    }

    /// Drop axis `dim`.
    pub fn reduce_dim(&self, dim: usize) -> Result<Self, GeometryError> {
        check_axis(dim, self.nd())?;
        let mut c = self.c.clone();
        c.remove(dim);
        Ok(Self { c })
    }

    /// Per-axis signed distance `self - other`.
    pub fn offsets(&self, other: &IntPoint) -> Result<Coords, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(&other.c).map(|(a, b)| a - b).collect())
    }

    /// Squared Euclidean distance.
    pub fn distance_sq(&self, other: &IntPoint) -> Result<i64, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self
            .c
            .iter()
            .zip(&other.c)
            .map(|(a, b)| {
                let d = i64::from(*a) - i64::from(*b);
                d * d
            })
            .sum())
    }

    /// True if every coordinate is `>=` the other's.
    pub fn all_geq(&self, other: &IntPoint) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(&other.c).all(|(a, b)| a >= b))
    }

    /// True if every coordinate is `<` the other's.
    pub fn all_lt(&self, other: &IntPoint) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(&other.c).all(|(a, b)| a < b))
    }

    /// Per-axis maximum.
    pub fn component_max(&self, other: &IntPoint) -> Result<Self, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(Self {
            c: self.c.iter().zip(&other.c).map(|(a, b)| *a.max(b)).collect(),
        })
    }

    /// Per-axis minimum.
    pub fn component_min(&self, other: &IntPoint) -> Result<Self, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(Self {
            c: self.c.iter().zip(&other.c).map(|(a, b)| *a.min(b)).collect(),
        })
    }

    /// Exact conversion to a real point.
    pub fn to_real(&self) -> RealPoint {
        RealPoint {
            c: self.c.iter().map(|&a| f64::from(a)).collect(),
        }
    }

    /// Fold into `[bounds.ul, bounds.br)` on every axis, treating the
    /// bounds as a torus.
    pub fn to_toroidal(&self, bounds: &HyperRect) -> Result<Self, GeometryError> {
        check_nd(self.nd(), bounds.nd())?;
        let ul = bounds.ul().coords();
        let size = bounds.size();
        if size.iter().any(|&s| s <= 0) {
            return Err(GeometryError::Empty { op: "to_toroidal" });
        }
        Ok(Self {
            c: (0..self.nd())
                .map(|i| ul[i] + (self.c[i] - ul[i]).rem_euclid(size[i]))
                .collect(),
        })
    }

    /// Tolerant per-axis equality against a real point.
    pub fn approx_eq(&self, other: &RealPoint) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self
            .c
            .iter()
            .zip(other.coords())
            .all(|(a, b)| approx(f64::from(*a), *b)))
    }
}

impl Index<usize> for IntPoint {
    type Output = i32;
    fn index(&self, i: usize) -> &i32 {
        &self.c[i]
    }
}

impl From<Coords> for IntPoint {
    fn from(c: Coords) -> Self {
        Self { c }
    }
}

impl From<Vec<i32>> for IntPoint {
    fn from(v: Vec<i32>) -> Self {
        Self { c: Coords::from_vec(v) }
    }
}

/// Mixed comparison. Points of different dimensionality are never equal.
impl PartialEq<RealPoint> for IntPoint {
    fn eq(&self, other: &RealPoint) -> bool {
        self.approx_eq(other).unwrap_or(false)
    }
}

impl fmt::Display for IntPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.c.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

impl Wire for IntPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u32_le(out, self.nd() as u32);
        for v in &self.c {
            v.encode(out);
        }
    }

    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let nd = take_len(input, 4)?;
        let mut c = Coords::with_capacity(nd);
        for _ in 0..nd {
            c.push(i32::decode(input)?);
        }
        Ok(Self { c })
    }
}

// ── RealPoint ───────────────────────────────────────────────────

/// An immutable point with real-valued coordinates.
///
/// `==` is exact; use [`RealPoint::approx_eq`] for tolerant comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct RealPoint {
    c: RealCoords,
}

impl RealPoint {
    /// Create a point from its coordinates.
    pub fn new(c: RealCoords) -> Self {
        Self { c }
    }

    /// Create a point from a coordinate slice.
    pub fn from_slice(c: &[f64]) -> Self {
        Self {
            c: RealCoords::from_slice(c),
        }
    }

    /// A 2D point.
    pub fn xy(x: f64, y: f64) -> Self {
        Self::from_slice(&[x, y])
    }

    /// Number of axes.
    pub fn nd(&self) -> usize {
        self.c.len()
    }

    /// The coordinates as a slice.
    pub fn coords(&self) -> &[f64] {
        &self.c
    }

    /// Translate by `+offsets`.
    pub fn shift(&self, offsets: &[f64]) -> Result<Self, GeometryError> {
        check_nd(self.nd(), offsets.len())?;
        Ok(Self {
            c: self.c.iter().zip(offsets).map(|(a, b)| a + b).collect(),
        })
    }

    /// Translate by `-offsets`.
    pub fn rshift(&self, offsets: &[f64]) -> Result<Self, GeometryError> {
        check_nd(self.nd(), offsets.len())?;
        Ok(Self {
            c: self.c.iter().zip(offsets).map(|(a, b)| a - b).collect(),
        })
    }

    /// Translate by an integer offset vector.
    pub fn shift_int(&self, offsets: &[i32]) -> Result<Self, GeometryError> {
        check_nd(self.nd(), offsets.len())?;
        Ok(Self {
            c: self
                .c
                .iter()
                .zip(offsets)
                .map(|(a, b)| a + f64::from(*b))
                .collect(),
        })
    }

    /// Translate by the negation of an integer offset vector.
    pub fn rshift_int(&self, offsets: &[i32]) -> Result<Self, GeometryError> {
        check_nd(self.nd(), offsets.len())?;
        Ok(Self {
            c: self
                .c
                .iter()
                .zip(offsets)
                .map(|(a, b)| a - f64::from(*b))
                .collect(),
        })
    }

    /// Translate a single axis.
    pub fn shift_dim(&self, dim: usize, offset: f64) -> Result<Self, GeometryError> {
        check_axis(dim, self.nd())?;
        let mut c = self.c.clone();
        c[dim] += offset;
        Ok(Self { c })
    }

    /// Drop axis `dim`.
    pub fn reduce_dim(&self, dim: usize) -> Result<Self, GeometryError> {
        check_axis(dim, self.nd())?;
        let mut c = self.c.clone();
        c.remove(dim);
        Ok(Self { c })
    }

    /// Per-axis signed distance `self - other`.
    pub fn offsets(&self, other: &RealPoint) -> Result<RealCoords, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(&other.c).map(|(a, b)| a - b).collect())
    }

    /// Squared Euclidean distance.
    pub fn distance_sq(&self, other: &RealPoint) -> Result<f64, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self
            .c
            .iter()
            .zip(&other.c)
            .map(|(a, b)| (a - b) * (a - b))
            .sum())
    }

    /// True if every coordinate is `>=` the integer point's, within tolerance.
    pub fn all_geq(&self, other: &IntPoint) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(other.coords()).all(|(a, b)| {
            let b = f64::from(*b);
            *a > b || approx(*a, b)
        }))
    }

    /// True if every coordinate is strictly `<` the integer point's,
    /// outside tolerance.
    pub fn all_lt(&self, other: &IntPoint) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(other.coords()).all(|(a, b)| {
            let b = f64::from(*b);
            *a < b && !approx(*a, b)
        }))
    }

    /// Per-axis maximum.
    pub fn component_max(&self, other: &RealPoint) -> Result<Self, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(Self {
            c: self.c.iter().zip(&other.c).map(|(a, b)| a.max(*b)).collect(),
        })
    }

    /// Per-axis minimum.
    pub fn component_min(&self, other: &RealPoint) -> Result<Self, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(Self {
            c: self.c.iter().zip(&other.c).map(|(a, b)| a.min(*b)).collect(),
        })
    }

    /// Conversion to the integer lattice, truncating toward zero.
    pub fn to_int(&self) -> IntPoint {
        IntPoint {
            c: self.c.iter().map(|&a| a as i32).collect(),
        }
    }

    /// Fold into `[bounds.ul, bounds.br)` on every axis, treating the
    /// bounds as a torus.
    pub fn to_toroidal(&self, bounds: &HyperRect) -> Result<Self, GeometryError> {
        check_nd(self.nd(), bounds.nd())?;
        let ul = bounds.ul().coords();
        let size = bounds.size();
        if size.iter().any(|&s| s <= 0) {
            return Err(GeometryError::Empty { op: "to_toroidal" });
        }
        Ok(Self {
            c: (0..self.nd())
                .map(|i| {
                    let lo = f64::from(ul[i]);
                    lo + (self.c[i] - lo).rem_euclid(f64::from(size[i]))
                })
                .collect(),
        })
    }

    /// Tolerant per-axis equality.
    pub fn approx_eq(&self, other: &RealPoint) -> Result<bool, GeometryError> {
        check_nd(self.nd(), other.nd())?;
        Ok(self.c.iter().zip(&other.c).all(|(a, b)| approx(*a, *b)))
    }
}

impl Index<usize> for RealPoint {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.c[i]
    }
}

impl From<&IntPoint> for RealPoint {
    fn from(p: &IntPoint) -> Self {
        p.to_real()
    }
}

impl From<Vec<f64>> for RealPoint {
    fn from(v: Vec<f64>) -> Self {
        Self {
            c: RealCoords::from_vec(v),
        }
    }
}

/// Mixed comparison. Points of different dimensionality are never equal.
impl PartialEq<IntPoint> for RealPoint {
    fn eq(&self, other: &IntPoint) -> bool {
        other.approx_eq(self).unwrap_or(false)
    }
}

impl fmt::Display for RealPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.c.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

impl Wire for RealPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u32_le(out, self.nd() as u32);
        for v in &self.c {
            v.encode(out);
        }
    }

    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let nd = take_len(input, 8)?;
        let mut c = RealCoords::with_capacity(nd);
        for _ in 0..nd {
            c.push(f64::decode(input)?);
        }
        Ok(Self { c })
    }
}
