//! Multi-rank collective tests over the in-process transport.

use mosaic_comm::{CommConfig, CommError, CommScratch, Communicator, LocalCluster};
use mosaic_core::{Rank, WireCodec};
use mosaic_test_utils::{run_ranks, CountingCodec, FailingCodec, TestAgent};
use mosaic_topology::{Neighborhood, PartitionGraph};

fn cluster(n: usize) -> Vec<Communicator<mosaic_comm::ThreadTransport>> {
    LocalCluster::new(n)
        .into_iter()
        .map(Communicator::with_defaults)
        .collect()
}

fn ring(n: u32) -> PartitionGraph {
    PartitionGraph::from_adjacency(
        (0..n)
            .map(|i| vec![Rank((i + 1) % n), Rank((i + n - 1) % n)])
            .collect(),
    )
    .unwrap()
}

#[test]
fn scatter_then_gather_variable_sizes() {
    // Rank i receives a vector of length i + 1 and sends it back.
    let n = 4;
    let out = run_ranks(cluster(n), |mut c| {
        let root = Rank(0);
        let values: Vec<Vec<u32>> = (0..n as u32).map(|i| (0..=i).collect()).collect();
        let mine: Vec<u32> = c
            .scatter(&WireCodec, (c.rank() == root).then_some(values.as_slice()), root)
            .unwrap();
        assert_eq!(mine.len(), c.rank().index() + 1);
        c.gather(&WireCodec, &mine, root).unwrap()
    });
    let gathered = out[0].as_ref().unwrap();
    assert_eq!(gathered.len(), n);
    for (i, v) in gathered.iter().enumerate() {
        assert_eq!(v, &(0..=i as u32).collect::<Vec<_>>());
    }
    assert!(out[1..].iter().all(Option::is_none));
}

#[test]
fn scatter_encodes_once_per_value_and_decodes_once_per_rank() {
    let out = run_ranks(cluster(3), |mut c| {
        let codec = CountingCodec::new();
        let agents = [TestAgent::new(1, 10), TestAgent::new(2, 20), TestAgent::new(3, 30)];
        let root = Rank(1);
        let got = c
            .scatter(&codec, (c.rank() == root).then_some(&agents[..]), root)
            .unwrap();
        (got, codec.encoded(), codec.decoded())
    });
    assert_eq!(out[0], (TestAgent::new(1, 10), 0, 1));
    assert_eq!(out[1], (TestAgent::new(2, 20), 3, 1));
    assert_eq!(out[2], (TestAgent::new(3, 30), 0, 1));
}

#[test]
fn broadcast_and_all_gather_agree_everywhere() {
    let out = run_ranks(cluster(5), |mut c| {
        let seed = (c.rank() == Rank(3)).then(|| TestAgent::new(99, 7));
        let b = c.broadcast(&WireCodec, seed.as_ref(), Rank(3)).unwrap();
        let all: Vec<u32> = c.all_gather(&WireCodec, &(c.rank().0 * 2)).unwrap();
        c.barrier().unwrap();
        (b, all)
    });
    for (b, all) in out {
        assert_eq!(b, TestAgent::new(99, 7));
        assert_eq!(all, vec![0, 2, 4, 6, 8]);
    }
}

#[test]
fn neighbor_exchange_on_a_ring() {
    let g = ring(4);
    let out = run_ranks(cluster(4), |mut c| {
        let me = c.rank();
        let neighbors = g.neighbors(me).unwrap().to_vec();
        let values: Vec<(u32, u32)> = neighbors.iter().map(|n| (me.0, n.0)).collect();
        let got: Vec<Vec<u32>> = c
            .neighbor_exchange(
                &WireCodec,
                &neighbors,
                &values.iter().map(|&(a, b)| vec![a, b]).collect::<Vec<_>>(),
            )
            .unwrap();
        let echoed: Vec<u32> = c.neighbor_all_gather(&WireCodec, &neighbors, &me.0).unwrap();
        (neighbors, got, echoed)
    });
    for (rank, (neighbors, got, echoed)) in out.into_iter().enumerate() {
        for ((n, msg), e) in neighbors.iter().zip(&got).zip(&echoed) {
            // Each neighbor addressed its message to us.
            assert_eq!(msg, &vec![n.0, rank as u32]);
            assert_eq!(*e, n.0);
        }
    }
}

#[test]
fn scheduled_exchange_matches_unscheduled() {
    let g = ring(5);
    let coloring = g.color();
    let out = run_ranks(cluster(5), |mut c| {
        let hood = Neighborhood::new(&g, &coloring, c.rank()).unwrap();
        let payloads: Vec<Vec<u8>> = hood
            .neighbors()
            .iter()
            .map(|n| vec![c.rank().0 as u8, n.0 as u8, 0xAB])
            .collect();
        let scheduled = c.scheduled_exchange_bytes(&hood, &payloads).unwrap();
        let plain = c.neighbor_exchange_bytes(hood.neighbors(), &payloads).unwrap();
        (hood, scheduled, plain, c.metrics().rounds)
    });
    for (hood, scheduled, plain, rounds) in out {
        assert_eq!(scheduled, plain);
        for (n, bytes) in hood.neighbors().iter().zip(&scheduled) {
            assert_eq!(bytes, &vec![n.0 as u8, hood.rank().0 as u8, 0xAB]);
        }
        assert_eq!(rounds, u64::from(coloring.num_colors()));
    }
}

#[test]
fn oversized_payload_poisons_the_receiver() {
    let small = CommConfig {
        max_message_bytes: 16,
        initial_scratch_bytes: 0,
    };
    let comms: Vec<_> = LocalCluster::new(2)
        .into_iter()
        .map(|t| {
            let config = if t_is_rank_one(&t) {
                small.clone()
            } else {
                CommConfig::default()
            };
            Communicator::new(t, CommScratch::default(), config).unwrap()
        })
        .collect();
    let out = run_ranks(comms, |mut c| {
        let me = c.rank();
        let peer = Rank(1 - me.0);
        let payload = if me == Rank(0) { vec![7u8; 100] } else { vec![1u8; 4] };
        let first = c.neighbor_exchange_bytes(&[peer], &[payload]);
        let second = if c.is_poisoned() { Some(c.barrier()) } else { None };
        (first, second)
    });
    assert_eq!(out[0].0, Ok(vec![vec![1u8; 4]]));
    assert_eq!(out[0].1, None);
    assert_eq!(out[1].0, Err(CommError::PayloadTooLarge { bytes: 100, max: 16 }));
    assert!(matches!(out[1].1, Some(Err(CommError::Poisoned { .. }))));
}

fn t_is_rank_one(t: &mosaic_comm::ThreadTransport) -> bool {
    use mosaic_comm::Transport;
    t.rank() == Rank(1)
}

#[test]
fn decode_failure_poisons_every_rank() {
    let out = run_ranks(cluster(3), |mut c| {
        let codec = FailingCodec::new(1);
        let err = c.all_gather(&codec, &c.rank().0).unwrap_err();
        (err, c.is_poisoned())
    });
    for (err, poisoned) in out {
        assert!(matches!(err, CommError::Wire(_)));
        assert!(poisoned);
    }
}

#[test]
fn scratch_is_reused_across_collectives() {
    let out = run_ranks(cluster(2), |mut c| {
        for round in 0..10u32 {
            let v: Vec<u32> = c.all_gather(&WireCodec, &round).unwrap();
            assert_eq!(v, vec![round, round]);
        }
        (c.scratch().high_water(), c.metrics().collectives)
    });
    for (high_water, collectives) in out {
        assert!(high_water <= 8);
        assert_eq!(collectives, 10);
    }
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn all_gather_returns_every_payload(
            payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..200), 1..5)
        ) {
            let n = payloads.len();
            let out = run_ranks(cluster(n), |mut c| {
                c.all_gather(&WireCodec, &payloads[c.rank().index()]).unwrap()
            });
            for got in out {
                prop_assert_eq!(&got, &payloads);
            }
        }
    }
}
