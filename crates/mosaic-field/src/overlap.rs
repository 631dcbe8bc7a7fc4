//! Send and receive regions between partitions.
//!
//! All rectangles are in the global frame. For a neighbor partition `N`
//! and a world shift `s`:
//!
//! ```text
//! send(s) = local ∩ (N.resize(aoi) + s)
//! recv(s) = halo  ∩ (N - s)
//! ```
//!
//! `recv(s)` on one rank is `send(s) - s` on the other, so two ranks that
//! walk the same shift list pair their regions up one to one.

use mosaic_space::{Coords, GeometryError, HyperRect};

/// Region lists for one peer.
///
/// `send[i]` on this rank pairs with `recv[i]` on the peer, and the peer's
/// `send[i]` with this rank's `recv[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overlap {
    /// Cells of the local partition the peer needs.
    pub send: Vec<HyperRect>,
    /// Cells of the local halo the peer owns.
    pub recv: Vec<HyperRect>,
}

impl Overlap {
    /// True if nothing is exchanged in either direction.
    pub fn is_empty(&self) -> bool {
        self.send.is_empty() && self.recv.is_empty()
    }
}

/// Regions exchanged with `neighbor` across every image in `shifts`.
pub fn neighbor_overlap(
    local: &HyperRect,
    halo: &HyperRect,
    neighbor: &HyperRect,
    aoi: i32,
    shifts: &[Coords],
) -> Result<Overlap, GeometryError> {
    let grown = neighbor.resize(aoi)?;
    let mut overlap = Overlap::default();
    for s in shifts {
        push_pair(local, halo, &grown, neighbor, s, &mut overlap)?;
    }
    Ok(overlap)
}

/// Regions a partition exchanges with its own periodic images.
///
/// Non-empty only on a torus whose extent on some axis is covered by a
/// single partition. The zero shift is skipped.
pub fn self_overlap(local: &HyperRect, halo: &HyperRect, shifts: &[Coords]) -> Result<Overlap, GeometryError> {
    let mut overlap = Overlap::default();
    for s in shifts.iter().filter(|s| s.iter().any(|&c| c != 0)) {
        push_pair(local, halo, halo, local, s, &mut overlap)?;
    }
    Ok(overlap)
}

fn push_pair(
    local: &HyperRect,
    halo: &HyperRect,
    grown_peer: &HyperRect,
    peer: &HyperRect,
    s: &Coords,
    overlap: &mut Overlap,
) -> Result<(), GeometryError> {
    // The two lists are filtered independently: each only has to line up
    // with the peer's opposite list.
    if let Some(send) = local.intersection(&grown_peer.shift(s)?)? {
        overlap.send.push(send);
    }
    if let Some(recv) = halo.intersection(&peer.rshift(s)?)? {
        overlap.recv.push(recv);
    }
    Ok(())
}

/// Cells that move from `from` to `to` when ownership changes.
pub fn migration(from: &HyperRect, to: &HyperRect) -> Result<Option<HyperRect>, GeometryError> {
    from.intersection(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::PartitionId;
    use mosaic_space::EdgeBehavior;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> HyperRect {
        HyperRect::xy(PartitionId(0), x0, y0, x1, y1).unwrap()
    }

    #[test]
    fn absorb_neighbors_share_a_strip() {
        let world = rect(0, 0, 8, 4);
        let shifts = EdgeBehavior::Absorb.world_shifts(&world).unwrap();
        let left = rect(0, 0, 4, 4);
        let right = rect(4, 0, 8, 4);
        let o = neighbor_overlap(&left, &left.resize(1).unwrap(), &right, 1, &shifts).unwrap();
        assert_eq!(o.send, vec![rect(3, 0, 4, 4)]);
        assert_eq!(o.recv, vec![rect(4, 0, 5, 4)]);
    }

    #[test]
    fn regions_pair_up_across_ranks() {
        let world = rect(0, 0, 8, 4);
        let shifts = EdgeBehavior::Wrap.world_shifts(&world).unwrap();
        let a = rect(0, 0, 4, 4);
        let b = rect(4, 0, 8, 4);
        let ab = neighbor_overlap(&a, &a.resize(1).unwrap(), &b, 1, &shifts).unwrap();
        let ba = neighbor_overlap(&b, &b.resize(1).unwrap(), &a, 1, &shifts).unwrap();
        assert_eq!(ab.send.len(), ba.recv.len());
        for (sent, received) in ab.send.iter().zip(&ba.recv) {
            assert_eq!(sent.size(), received.size());
            assert_eq!(sent.area(), received.area());
        }
        // Both sides of a 2-wide torus touch: left edge and right edge.
        assert!(ab.send.contains(&rect(3, 0, 4, 4)));
        assert!(ab.send.contains(&rect(0, 0, 1, 4)));
    }

    #[test]
    fn single_partition_torus_wraps_onto_itself() {
        let world = rect(0, 0, 4, 4);
        let shifts = EdgeBehavior::Wrap.world_shifts(&world).unwrap();
        let halo = world.resize(1).unwrap();
        let o = self_overlap(&world, &halo, &shifts).unwrap();
        // Four edges and four corners.
        assert_eq!(o.send.len(), 8);
        let received: usize = o.recv.iter().map(HyperRect::area).sum();
        assert_eq!(received, halo.area() - world.area());
        for r in &o.recv {
            assert!(!r.intersects(&world).unwrap());
        }
    }

    #[test]
    fn absorb_has_no_self_overlap() {
        let world = rect(0, 0, 4, 4);
        let shifts = EdgeBehavior::Absorb.world_shifts(&world).unwrap();
        let o = self_overlap(&world, &world.resize(1).unwrap(), &shifts).unwrap();
        assert!(o.is_empty());
    }

    #[test]
    fn migration_is_the_intersection() {
        assert_eq!(
            migration(&rect(0, 0, 4, 4), &rect(2, 0, 6, 4)).unwrap(),
            Some(rect(2, 0, 4, 4))
        );
        assert_eq!(migration(&rect(0, 0, 2, 2), &rect(2, 2, 4, 4)).unwrap(), None);
    }
}
