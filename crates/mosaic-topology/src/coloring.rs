//! Deterministic greedy coloring and per-rank neighborhoods.

use mosaic_core::Rank;

use crate::error::TopologyError;
use crate::graph::PartitionGraph;

/// A proper coloring of a [`PartitionGraph`].
///
/// Colors are dense in `0..num_colors`. Adjacent ranks never share a color,
/// so all ranks of one color can exchange with their neighbors in the same
/// round without any of them being needed by two partners at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coloring {
    colors: Vec<u32>,
    num_colors: u32,
}

impl Coloring {
    /// Greedy coloring in a fixed order.
    ///
    /// Ranks are visited by degree descending, ties by rank ascending. Each
    /// takes the smallest color not already held by a colored neighbor. The
    /// result depends only on the adjacency, so every rank can compute it
    /// locally. It uses at most `max_degree + 1` colors.
    pub fn greedy(graph: &PartitionGraph) -> Self {
        let mut order: Vec<Rank> = graph.ranks().collect();
        order.sort_by_key(|&r| {
            let degree = graph.degree(r).unwrap_or(0);
            (std::cmp::Reverse(degree), r)
        });

        let mut colors: Vec<Option<u32>> = vec![None; graph.len()];
        let mut taken: Vec<bool> = Vec::new();
        for rank in order {
            taken.clear();
            taken.resize(graph.max_degree() + 1, false);
            for n in graph.neighbors(rank).unwrap_or(&[]) {
                if let Some(c) = colors[n.index()] {
                    if let Some(slot) = taken.get_mut(c as usize) {
                        *slot = true;
                    }
                }
            }
            let color = taken.iter().position(|t| !t).unwrap_or(taken.len());
            colors[rank.index()] = Some(color as u32);
        }

        let colors: Vec<u32> = colors.into_iter().map(|c| c.unwrap_or(0)).collect();
        let num_colors = colors.iter().max().map_or(0, |&m| m + 1);
        Self { colors, num_colors }
    }

    /// Color of `rank`.
    pub fn color_of(&self, rank: Rank) -> Option<u32> {
        self.colors.get(rank.index()).copied()
    }

    /// Number of distinct colors, which is also the number of rounds.
    pub fn num_colors(&self) -> u32 {
        self.num_colors
    }

    /// Colors in rank order.
    pub fn as_slice(&self) -> &[u32] {
        &self.colors
    }

    /// True if the coloring covers `graph` and no edge joins equal colors.
    pub fn is_valid(&self, graph: &PartitionGraph) -> bool {
        if self.colors.len() != graph.len() {
            return false;
        }
        graph.ranks().all(|r| {
            graph
                .neighbors(r)
                .unwrap_or(&[])
                .iter()
                .all(|n| self.colors[n.index()] != self.colors[r.index()])
        })
    }
}

/// One rank's view of the graph and its coloring.
///
/// This is what a communicator needs to select partners per round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    rank: Rank,
    color: u32,
    num_colors: u32,
    neighbors: Vec<Rank>,
    neighbor_colors: Vec<u32>,
}

impl Neighborhood {
    /// Extract `rank`'s neighborhood.
    pub fn new(graph: &PartitionGraph, coloring: &Coloring, rank: Rank) -> Result<Self, TopologyError> {
        let out_of_range = TopologyError::RankOutOfRange {
            rank,
            size: graph.len(),
        };
        let neighbors = graph.neighbors(rank)?.to_vec();
        let color = coloring.color_of(rank).ok_or(out_of_range.clone())?;
        let neighbor_colors = neighbors
            .iter()
            .map(|&n| coloring.color_of(n).ok_or(out_of_range.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rank,
            color,
            num_colors: coloring.num_colors(),
            neighbors,
            neighbor_colors,
        })
    }

    /// A neighborhood from explicit parts, mainly for tests and callers
    /// that obtained the lists elsewhere.
    pub fn from_parts(
        rank: Rank,
        color: u32,
        num_colors: u32,
        neighbors: Vec<Rank>,
        neighbor_colors: Vec<u32>,
    ) -> Self {
        Self {
            rank,
            color,
            num_colors,
            neighbors,
            neighbor_colors,
        }
    }

    /// The owning rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The owning rank's color.
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Number of exchange rounds.
    pub fn rounds(&self) -> u32 {
        self.num_colors
    }

    /// Neighbors, ascending by rank.
    pub fn neighbors(&self) -> &[Rank] {
        &self.neighbors
    }

    /// Color of each neighbor, parallel to [`neighbors`](Self::neighbors).
    pub fn neighbor_colors(&self) -> &[u32] {
        &self.neighbor_colors
    }

    /// Position of `rank` in the neighbor list.
    pub fn position(&self, rank: Rank) -> Option<usize> {
        self.neighbors.binary_search(&rank).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: u32) -> PartitionGraph {
        PartitionGraph::from_adjacency(
            (0..n)
                .map(|i| vec![Rank((i + 1) % n), Rank((i + n - 1) % n)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn five_ring_uses_at_most_three_colors() {
        let g = ring(5);
        let c = g.color();
        assert!(c.num_colors() <= 3);
        assert!(c.is_valid(&g));
    }

    #[test]
    fn coloring_is_deterministic() {
        let g = ring(7);
        assert_eq!(g.color(), g.color());
        assert_eq!(g.color().as_slice(), ring(7).color().as_slice());
    }

    #[test]
    fn highest_degree_goes_first() {
        // Star: the hub has degree 3 and takes color 0.
        let g = PartitionGraph::from_adjacency(vec![
            vec![Rank(3)],
            vec![Rank(3)],
            vec![Rank(3)],
            vec![Rank(0), Rank(1), Rank(2)],
        ])
        .unwrap();
        let c = g.color();
        assert_eq!(c.as_slice(), &[1, 1, 1, 0]);
        assert_eq!(c.num_colors(), 2);
    }

    #[test]
    fn isolated_nodes_share_color_zero() {
        let g = PartitionGraph::from_adjacency(vec![vec![], vec![]]).unwrap();
        let c = g.color();
        assert_eq!(c.as_slice(), &[0, 0]);
        assert_eq!(c.num_colors(), 1);
    }

    #[test]
    fn neighborhood_mirrors_graph_and_coloring() {
        let g = ring(5);
        let c = g.color();
        let n = Neighborhood::new(&g, &c, Rank(0)).unwrap();
        assert_eq!(n.neighbors(), &[Rank(1), Rank(4)]);
        assert_eq!(n.color(), c.color_of(Rank(0)).unwrap());
        assert_eq!(
            n.neighbor_colors(),
            &[c.color_of(Rank(1)).unwrap(), c.color_of(Rank(4)).unwrap()]
        );
        assert_eq!(n.position(Rank(4)), Some(1));
        assert!(Neighborhood::new(&g, &c, Rank(5)).is_err());
    }
}
