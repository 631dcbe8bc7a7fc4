//! Greedy coloring properties over random graphs and decompositions.

use mosaic_core::Rank;
use mosaic_space::EdgeBehavior;
use mosaic_test_utils::rect;
use mosaic_topology::{uniform_decomposition, Neighborhood, PartitionGraph};
use proptest::prelude::*;

fn random_graph() -> impl Strategy<Value = PartitionGraph> {
    (1usize..24).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n), 0..(n * 3)).prop_map(move |edges| {
            let mut lists = vec![Vec::new(); n];
            for (a, b) in edges {
                if a != b {
                    lists[a].push(Rank::from(b));
                    lists[b].push(Rank::from(a));
                }
            }
            PartitionGraph::from_adjacency(lists).unwrap()
        })
    })
}

proptest! {
    #[test]
    fn greedy_coloring_is_proper_and_bounded(g in random_graph()) {
        let c = g.color();
        prop_assert!(c.is_valid(&g));
        prop_assert!(c.num_colors() as usize <= g.max_degree() + 1);
        prop_assert_eq!(&c, &g.clone().color());
    }

    #[test]
    fn neighborhood_colors_differ_from_own(g in random_graph()) {
        let c = g.color();
        for r in g.ranks() {
            let n = Neighborhood::new(&g, &c, r).unwrap();
            prop_assert!(n.neighbor_colors().iter().all(|&nc| nc != n.color()));
            prop_assert!(n.color() < n.rounds());
        }
    }
}

#[test]
fn torus_of_four_is_fully_connected() {
    let world = rect(0, 0, 8, 8);
    let parts = uniform_decomposition(&world, &[2, 2]).unwrap();
    let g = PartitionGraph::from_partitions(&parts, &world, 1, EdgeBehavior::Wrap).unwrap();
    for r in g.ranks() {
        assert_eq!(g.degree(r).unwrap(), 3);
    }
    let c = g.color();
    assert_eq!(c.num_colors(), 4);
    assert!(c.is_valid(&g));
}

#[test]
fn grid_of_nine_without_wrap_has_corner_degree_three() {
    let world = rect(0, 0, 9, 9);
    let parts = uniform_decomposition(&world, &[3, 3]).unwrap();
    let g = PartitionGraph::from_partitions(&parts, &world, 1, EdgeBehavior::Absorb).unwrap();
    assert_eq!(g.degree(Rank(0)).unwrap(), 3);
    assert_eq!(g.degree(Rank(4)).unwrap(), 8);
    assert!(g.color().is_valid(&g));
}
