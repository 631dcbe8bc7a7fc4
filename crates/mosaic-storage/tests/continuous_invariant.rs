//! The location map and the bucket grid agree after any sequence of
//! mutations.

use mosaic_core::ObjectId;
use mosaic_storage::{ContinuousStorage, GridStorage};
use mosaic_test_utils::{rect, rp};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Set(u64, f64, f64),
    Move(u64, f64, f64),
    Remove(u64),
    ClearIn(i32, i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..16, 0.0f64..12.0, 0.0f64..8.0).prop_map(|(id, x, y)| Op::Set(id, x, y)),
        2 => (0u64..16, 0.0f64..12.0, 0.0f64..8.0).prop_map(|(id, x, y)| Op::Move(id, x, y)),
        2 => (0u64..16).prop_map(Op::Remove),
        1 => (0i32..10, 0i32..6).prop_map(|(x, y)| Op::ClearIn(x, y)),
    ]
}

proptest! {
    #[test]
    fn buckets_match_locations(
        disc in prop_oneof![Just(0.5), Just(1.0), Just(2.5)],
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut s = ContinuousStorage::<ObjectId>::new(rect(0, 0, 12, 8), disc).unwrap();
        for op in ops {
            match op {
                Op::Set(id, x, y) => {
                    s.set_location(ObjectId(id), rp(x, y)).unwrap();
                }
                Op::Move(id, x, y) => {
                    let existed = s.get_object(ObjectId(id)).is_some();
                    prop_assert_eq!(s.move_object(ObjectId(id), rp(x, y)).unwrap(), existed);
                }
                Op::Remove(id) => {
                    s.remove_object(ObjectId(id));
                }
                Op::ClearIn(x, y) => {
                    s.remove_objects_in(&rect(x, y, x + 2, y + 2)).unwrap();
                }
            }
            prop_assert!(s.verify_buckets());
        }
        for (id, loc) in s.iter().map(|(v, l)| (*v, l.clone())).collect::<Vec<_>>() {
            let found = s.get_objects_at(&loc).unwrap();
            prop_assert!(found.contains(&&id));
        }
    }

    #[test]
    fn radius_query_matches_brute_force(
        points in prop::collection::vec((0.0f64..12.0, 0.0f64..8.0), 1..40),
        cx in 0.0f64..12.0,
        cy in 0.0f64..8.0,
        radius in 0.0f64..5.0,
    ) {
        let mut s = ContinuousStorage::<ObjectId>::new(rect(0, 0, 12, 8), 1.0).unwrap();
        for (i, (x, y)) in points.iter().enumerate() {
            s.set_location(ObjectId(i as u64), rp(*x, *y)).unwrap();
        }
        let mut got: Vec<ObjectId> = s
            .within_distance(&rp(cx, cy), radius, None)
            .unwrap()
            .into_iter()
            .copied()
            .collect();
        got.sort();
        let mut expected: Vec<ObjectId> = points
            .iter()
            .enumerate()
            .filter(|(_, (x, y))| (x - cx).powi(2) + (y - cy).powi(2) <= radius * radius)
            .map(|(i, _)| ObjectId(i as u64))
            .collect();
        expected.sort();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn reshape_keeps_exactly_the_overlap(
        points in prop::collection::vec((0.0f64..12.0, 0.0f64..8.0), 0..30),
        x0 in -4i32..10,
        y0 in -4i32..6,
        w in 1i32..10,
        h in 1i32..10,
    ) {
        let mut s = ContinuousStorage::<ObjectId>::new(rect(0, 0, 12, 8), 1.0).unwrap();
        for (i, (x, y)) in points.iter().enumerate() {
            s.set_location(ObjectId(i as u64), rp(*x, *y)).unwrap();
        }
        let next = rect(x0, y0, x0 + w, y0 + h);
        s.reshape(next.clone()).unwrap();
        prop_assert!(s.verify_buckets());
        for (i, (x, y)) in points.iter().enumerate() {
            let kept = s.get_location(ObjectId(i as u64)).is_some();
            prop_assert_eq!(kept, next.contains_real(&rp(*x, *y)).unwrap());
        }
    }
}
