//! Strongly-typed identifiers.

use std::fmt;

/// Index of a participant in a communication group.
///
/// Ranks are dense: a group of `n` participants uses ranks `0..n`.
/// One rank owns exactly one partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub u32);

impl Rank {
    /// The rank as a `usize` index into per-rank tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Indices above `u32::MAX` saturate to `Rank(u32::MAX)`, which no
/// group can contain, so range checks reject them instead of aliasing a
/// lower rank.
impl From<usize> for Rank {
    fn from(v: usize) -> Self {
        Self(u32::try_from(v).unwrap_or(u32::MAX))
    }
}

/// Opaque identifier attached to a rectangle.
///
/// The decomposition assigns one per partition; rectangles derived from
/// a partition (halo, overlaps) inherit it. It takes part in rectangle
/// ordering but never in geometric predicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionId(pub u32);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PartitionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identity of a stored object.
///
/// Continuous storage keys its location map by this id, and bag storages
/// use it to pick one object out of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ObjectId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_index_roundtrip() {
        let r = Rank::from(7usize);
        assert_eq!(r.index(), 7);
        assert_eq!(r, Rank(7));
        assert_eq!(r.to_string(), "7");
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_index_saturates_instead_of_wrapping() {
        let r = Rank::from(u32::MAX as usize + 5);
        assert_eq!(r, Rank(u32::MAX));
        assert_ne!(r, Rank(4));
    }

    #[test]
    fn object_id_display_is_prefixed() {
        assert_eq!(ObjectId(42).to_string(), "#42");
    }

    #[test]
    fn partition_id_orders_numerically() {
        assert!(PartitionId(1) < PartitionId(2));
        assert_eq!(PartitionId::default(), PartitionId(0));
    }
}
