//! World edge behavior: bounded or toroidal.

use crate::error::GeometryError;
use crate::point::Coords;
use crate::rect::HyperRect;

/// How the world treats its outer boundary.
///
/// # Examples
///
/// ```
/// use mosaic_core::PartitionId;
/// use mosaic_space::{EdgeBehavior, HyperRect};
///
/// let world = HyperRect::from_size(PartitionId(0), &[8, 8]).unwrap();
///
/// // Absorb: only the identity image of a rectangle exists.
/// assert_eq!(EdgeBehavior::Absorb.world_shifts(&world).unwrap().len(), 1);
///
/// // Wrap: a rectangle has an image in every neighbouring copy of the world.
/// assert_eq!(EdgeBehavior::Wrap.world_shifts(&world).unwrap().len(), 9);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// Cells beyond the world edge do not exist.
    #[default]
    Absorb,
    /// The world is a torus; leaving one side enters the opposite one.
    Wrap,
}

impl EdgeBehavior {
    /// True for a toroidal world.
    pub fn is_toroidal(self) -> bool {
        matches!(self, Self::Wrap)
    }

    /// Translations under which a region of `world` may reappear.
    ///
    /// `Absorb` yields only the zero shift. `Wrap` yields all `3^nd`
    /// combinations of `{-size, 0, +size}` per axis, in row-major order
    /// with the last axis fastest. The order is fixed so that two ranks
    /// walking the list independently pair up the same images.
    pub fn world_shifts(self, world: &HyperRect) -> Result<Vec<Coords>, GeometryError> {
        let nd = world.nd();
        match self {
            Self::Absorb => Ok(vec![Coords::from_elem(0, nd)]),
            Self::Wrap => {
                let size = world.size();
                if size.iter().any(|&s| s <= 0) {
                    return Err(GeometryError::Empty { op: "world_shifts" });
                }
                let count = 3usize.pow(nd as u32);
                let mut shifts = Vec::with_capacity(count);
                for k in 0..count {
                    let mut rem = k;
                    let mut s = Coords::from_elem(0, nd);
                    for i in (0..nd).rev() {
                        let step = (rem % 3) as i32 - 1;
                        rem /= 3;
                        s[i] = step * size[i];
                    }
                    shifts.push(s);
                }
                Ok(shifts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::PartitionId;

    #[test]
    fn wrap_shifts_are_ordered_and_symmetric() {
        let world = HyperRect::from_size(PartitionId(0), &[4, 6]).unwrap();
        let shifts = EdgeBehavior::Wrap.world_shifts(&world).unwrap();
        assert_eq!(shifts[0].as_slice(), &[-4, -6]);
        assert_eq!(shifts[4].as_slice(), &[0, 0]);
        assert_eq!(shifts[8].as_slice(), &[4, 6]);
        // Shift k and shift 8 - k are negations of each other.
        for k in 0..9 {
            let neg: Coords = shifts[8 - k].iter().map(|v| -v).collect();
            assert_eq!(shifts[k], neg);
        }
    }

    #[test]
    fn absorb_has_only_identity() {
        let world = HyperRect::from_size(PartitionId(0), &[4, 6]).unwrap();
        let shifts = EdgeBehavior::Absorb.world_shifts(&world).unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].as_slice(), &[0, 0]);
        assert!(!EdgeBehavior::Absorb.is_toroidal());
    }
}
