//! Reshape and pack/unpack behaviour across every storage variant.

use mosaic_core::{ObjectId, WireCodec};
use mosaic_space::HyperRect;
use mosaic_storage::{
    ContinuousStorage, DenseStorage, GridStorage, IntStorage, ObjectStorage, StorageKind,
};
use mosaic_test_utils::{ip, rect, rp, TestAgent};

fn filled_dense(shape: &HyperRect) -> DenseStorage<TestAgent> {
    let mut s = DenseStorage::new(shape.clone(), false);
    let mut next = 0;
    for p in shape.iter() {
        for _ in 0..(p[0] + p[1]) % 3 {
            next += 1;
            s.add_object(&p, TestAgent::new(next, (p[0] * 100 + p[1]) as u32))
                .unwrap();
        }
    }
    s
}

fn filled_continuous(shape: &HyperRect) -> ContinuousStorage<TestAgent> {
    let mut s = ContinuousStorage::new(shape.clone(), 1.5).unwrap();
    let mut next = 0;
    for p in shape.iter() {
        next += 1;
        let loc = rp(f64::from(p[0]) + 0.25, f64::from(p[1]) + 0.75);
        s.set_location(TestAgent::new(next, next as u32), loc).unwrap();
    }
    s
}

// ── Idempotence ─────────────────────────────────────────────────

#[test]
fn reshape_to_same_shape_changes_nothing() {
    let shape = rect(2, 3, 7, 9);
    let mut dense = filled_dense(&shape);
    let before = dense.clone();
    dense.reshape(shape.clone()).unwrap();
    for p in shape.iter() {
        assert_eq!(
            dense.get_all_objects(&p).unwrap(),
            before.get_all_objects(&p).unwrap()
        );
    }

    let mut cont = filled_continuous(&shape);
    let locs: Vec<_> = cont.iter().map(|(a, l)| (a.clone(), l.clone())).collect();
    cont.reshape(shape.clone()).unwrap();
    for (agent, loc) in locs {
        assert_eq!(cont.get_location(agent.id), Some(&loc));
    }
}

// ── Safety ──────────────────────────────────────────────────────

#[test]
fn reshape_to_disjoint_shape_empties_every_variant() {
    let shape = rect(0, 0, 4, 4);
    let far = rect(10, 10, 13, 15);

    let mut ints = IntStorage::new(shape.clone(), -1);
    ints.add_object(&ip(1, 1), 5).unwrap();
    ints.reshape(far.clone()).unwrap();
    assert_eq!(ints.layout().shape(), &far);
    assert!(ints.values().iter().all(|&v| v == -1));

    let mut objects = ObjectStorage::<ObjectId>::new(shape.clone());
    objects.add_object(&ip(0, 0), ObjectId(1)).unwrap();
    objects.reshape(far.clone()).unwrap();
    assert!(objects.is_empty());

    let mut dense = filled_dense(&shape);
    dense.reshape(far.clone()).unwrap();
    assert!(dense.is_empty());
    assert_eq!(dense.layout().len(), far.area());

    let mut cont = filled_continuous(&shape);
    cont.reshape(far.clone()).unwrap();
    assert!(cont.is_empty());
    assert!(cont.verify_buckets());
}

#[test]
fn reshape_to_subset_keeps_inner_and_drops_outer() {
    let shape = rect(0, 0, 6, 6);
    let inner = rect(1, 2, 4, 6);

    let mut dense = filled_dense(&shape);
    let before = dense.clone();
    dense.reshape(inner.clone()).unwrap();
    for p in inner.iter() {
        assert_eq!(
            dense.get_all_objects(&p).unwrap(),
            before.get_all_objects(&p).unwrap()
        );
    }
    let kept: usize = inner.iter().map(|p| before.get_all_objects(&p).unwrap().len()).sum();
    assert_eq!(dense.len(), kept);
    assert!(dense.get_all_objects(&ip(0, 0)).is_err());

    let mut cont = filled_continuous(&shape);
    let before: Vec<_> = cont.iter().map(|(a, l)| (a.clone(), l.clone())).collect();
    cont.reshape(inner.clone()).unwrap();
    for (agent, loc) in before {
        let inside = inner.contains_real(&loc).unwrap();
        assert_eq!(cont.get_location(agent.id).is_some(), inside, "{loc}");
    }
    assert!(cont.verify_buckets());
}

#[test]
fn reshape_to_taller_shape_reindexes_with_new_height() {
    let mut s = ObjectStorage::<TestAgent>::new(rect(0, 0, 3, 2));
    for p in rect(0, 0, 3, 2).iter() {
        s.add_object(&p, TestAgent::new((p[0] * 10 + p[1]) as u64, 0)).unwrap();
    }
    s.reshape(rect(0, 0, 3, 5)).unwrap();
    for p in rect(0, 0, 3, 2).iter() {
        let id = ObjectId((p[0] * 10 + p[1]) as u64);
        assert!(s.get_object(&p, id).unwrap().is_some(), "lost {p}");
    }
    for p in rect(0, 2, 3, 5).iter() {
        assert!(s.get_all_objects(&p).unwrap().is_empty());
    }
}

#[test]
fn reshape_preserves_global_translation() {
    let mut s = IntStorage::new(rect(0, 0, 4, 4), 0);
    s.set_halo_bounds(rect(100, 100, 104, 104)).unwrap();
    s.add_object_global(&ip(102, 103), 9).unwrap();
    s.reshape(rect(1, 1, 6, 6)).unwrap();
    assert_eq!(s.get_global(&ip(102, 103)).unwrap(), 9);
}

// ── Round trip ──────────────────────────────────────────────────

#[test]
fn dense_round_trip_reproduces_region() {
    let shape = rect(0, 0, 8, 8);
    let src = filled_dense(&shape);
    let region = rect(2, 1, 7, 5);
    let desc = src.descriptor(vec![region.clone()]).unwrap();
    assert_eq!(desc.wire_type(), StorageKind::Dense.wire_type());

    let mut buf = Vec::new();
    src.pack(&desc, &WireCodec, &mut buf).unwrap();
    let mut dst = DenseStorage::<TestAgent>::new(shape, false);
    let mut input = buf.as_slice();
    dst.unpack(&desc, &WireCodec, &mut input).unwrap();
    assert!(input.is_empty());
    for p in region.iter() {
        assert_eq!(
            dst.get_all_objects(&p).unwrap(),
            src.get_all_objects(&p).unwrap()
        );
    }
}

#[test]
fn continuous_round_trip_into_shifted_frame() {
    // Sender and receiver agree on global coordinates; the receiver's
    // shape is larger, so relative offsets must be resolved per region.
    let src = filled_continuous(&rect(0, 0, 6, 6));
    let region = rect(3, 0, 6, 6);
    let desc = src.descriptor(vec![region.clone()]).unwrap();
    let mut buf = Vec::new();
    src.pack(&desc, &WireCodec, &mut buf).unwrap();

    let mut dst = ContinuousStorage::<TestAgent>::new(rect(0, 0, 6, 6), 0.5).unwrap();
    let n = dst.unpack(&desc, &WireCodec, &mut buf.as_slice()).unwrap();
    assert_eq!(n, src.get_objects_in(&region).unwrap().len());
    for agent in src.get_objects_in(&region).unwrap() {
        assert_eq!(dst.get_object(agent.id), Some(agent));
        assert_eq!(dst.get_location(agent.id), src.get_location(agent.id));
    }
    assert!(dst.verify_buckets());
}

#[test]
fn empty_region_is_a_no_op() {
    let src = filled_dense(&rect(0, 0, 4, 4));
    let desc = src.descriptor(vec![rect(2, 2, 2, 4)]).unwrap();
    assert!(desc.is_empty());
    let mut buf = Vec::new();
    src.pack(&desc, &WireCodec, &mut buf).unwrap();
    let mut dst = DenseStorage::<TestAgent>::new(rect(0, 0, 4, 4), false);
    assert_eq!(dst.unpack(&desc, &WireCodec, &mut buf.as_slice()).unwrap(), 0);
}
