//! The partition neighbor graph.

use log::debug;
use mosaic_core::Rank;
use mosaic_space::{EdgeBehavior, HyperRect};

use crate::coloring::Coloring;
use crate::error::TopologyError;

/// Undirected graph with one node per rank.
///
/// Neighbor lists are sorted ascending and free of duplicates and self
/// loops. The graph is built once from a decomposition and only read
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionGraph {
    adjacency: Vec<Vec<Rank>>,
}

impl PartitionGraph {
    /// Build from per-rank neighbor lists.
    ///
    /// Lists are sorted and deduplicated. Every edge must appear in both
    /// directions.
    pub fn from_adjacency(lists: Vec<Vec<Rank>>) -> Result<Self, TopologyError> {
        let size = lists.len();
        let mut adjacency = lists;
        for (i, list) in adjacency.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            for &n in list.iter() {
                if n.index() >= size {
                    return Err(TopologyError::RankOutOfRange { rank: n, size });
                }
                if n.index() == i {
                    return Err(TopologyError::SelfLoop { rank: n });
                }
            }
        }
        for (i, list) in adjacency.iter().enumerate() {
            let a = Rank::from(i);
            for &b in list {
                if adjacency[b.index()].binary_search(&a).is_err() {
                    return Err(TopologyError::Asymmetric { a, b });
                }
            }
        }
        Ok(Self { adjacency })
    }

    /// Link every pair of partitions whose halos touch.
    ///
    /// Partition `i` and `j` are neighbors when `parts[i]` grown by `aoi`
    /// intersects `parts[j]`, directly or, under
    /// [`EdgeBehavior::Wrap`], through one of the world's periodic images.
    /// With `aoi >= 1` diagonal contact counts.
    pub fn from_partitions(
        parts: &[HyperRect],
        world: &HyperRect,
        aoi: i32,
        edge: EdgeBehavior,
    ) -> Result<Self, TopologyError> {
        if aoi < 0 {
            return Err(TopologyError::NegativeAoi { aoi });
        }
        let shifts = edge.world_shifts(world)?;
        let mut adjacency = vec![Vec::new(); parts.len()];
        for i in 0..parts.len() {
            let grown = parts[i].resize(aoi)?;
            for j in (i + 1)..parts.len() {
                let mut touching = false;
                for s in &shifts {
                    if grown.intersects(&parts[j].shift(s)?)? {
                        touching = true;
                        break;
                    }
                }
                if touching {
                    adjacency[i].push(Rank::from(j));
                    adjacency[j].push(Rank::from(i));
                }
            }
        }
        let graph = Self::from_adjacency(adjacency)?;
        debug!(
            "partition graph: {} ranks, max degree {}",
            graph.len(),
            graph.max_degree()
        );
        Ok(graph)
    }

    /// Number of ranks.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Neighbors of `rank`, ascending.
    pub fn neighbors(&self, rank: Rank) -> Result<&[Rank], TopologyError> {
        self.adjacency
            .get(rank.index())
            .map(Vec::as_slice)
            .ok_or(TopologyError::RankOutOfRange {
                rank,
                size: self.len(),
            })
    }

    /// Number of neighbors of `rank`.
    pub fn degree(&self, rank: Rank) -> Result<usize, TopologyError> {
        self.neighbors(rank).map(<[Rank]>::len)
    }

    /// Largest degree in the graph, or 0 if it is empty.
    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// True if `a` and `b` are adjacent.
    pub fn are_neighbors(&self, a: Rank, b: Rank) -> bool {
        self.adjacency
            .get(a.index())
            .is_some_and(|list| list.binary_search(&b).is_ok())
    }

    /// Iterate all ranks in order.
    pub fn ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        (0..self.len()).map(Rank::from)
    }

    /// Greedy coloring. See [`Coloring::greedy`].
    pub fn color(&self) -> Coloring {
        Coloring::greedy(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::PartitionId;

    fn r(v: u32) -> Rank {
        Rank(v)
    }

    fn rect(id: u32, x0: i32, y0: i32, x1: i32, y1: i32) -> HyperRect {
        HyperRect::xy(PartitionId(id), x0, y0, x1, y1).unwrap()
    }

    #[test]
    fn lists_are_sorted_and_deduplicated() {
        let g = PartitionGraph::from_adjacency(vec![
            vec![r(2), r(1), r(2)],
            vec![r(0)],
            vec![r(0)],
        ])
        .unwrap();
        assert_eq!(g.neighbors(r(0)).unwrap(), &[r(1), r(2)]);
        assert_eq!(g.degree(r(0)).unwrap(), 2);
        assert_eq!(g.max_degree(), 2);
        assert!(g.are_neighbors(r(2), r(0)));
        assert!(!g.are_neighbors(r(1), r(2)));
    }

    #[test]
    fn asymmetric_edge_is_rejected() {
        let err = PartitionGraph::from_adjacency(vec![vec![r(1)], vec![]]).unwrap_err();
        assert_eq!(err, TopologyError::Asymmetric { a: r(0), b: r(1) });
    }

    #[test]
    fn self_loop_and_range_are_checked() {
        assert_eq!(
            PartitionGraph::from_adjacency(vec![vec![r(0)]]).unwrap_err(),
            TopologyError::SelfLoop { rank: r(0) }
        );
        assert_eq!(
            PartitionGraph::from_adjacency(vec![vec![r(3)]]).unwrap_err(),
            TopologyError::RankOutOfRange { rank: r(3), size: 1 }
        );
        let g = PartitionGraph::from_adjacency(vec![vec![]]).unwrap();
        assert!(g.neighbors(r(1)).is_err());
    }

    #[test]
    fn diagonal_partitions_touch_through_the_halo() {
        let world = rect(0, 0, 0, 4, 4);
        let parts = [rect(0, 0, 0, 2, 2), rect(1, 2, 2, 4, 4)];
        let g = PartitionGraph::from_partitions(&parts, &world, 1, EdgeBehavior::Absorb).unwrap();
        assert!(g.are_neighbors(r(0), r(1)));
        let g = PartitionGraph::from_partitions(&parts, &world, 0, EdgeBehavior::Absorb).unwrap();
        assert!(!g.are_neighbors(r(0), r(1)));
    }

    #[test]
    fn wrap_links_opposite_edges() {
        let world = rect(0, 0, 0, 9, 3);
        let parts = [rect(0, 0, 0, 3, 3), rect(1, 3, 0, 6, 3), rect(2, 6, 0, 9, 3)];
        let absorb = PartitionGraph::from_partitions(&parts, &world, 1, EdgeBehavior::Absorb).unwrap();
        assert!(!absorb.are_neighbors(r(0), r(2)));
        let wrap = PartitionGraph::from_partitions(&parts, &world, 1, EdgeBehavior::Wrap).unwrap();
        assert!(wrap.are_neighbors(r(0), r(2)));
        assert_eq!(wrap.max_degree(), 2);
    }
}
