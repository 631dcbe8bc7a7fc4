//! Objects at real-valued locations, bucketed for neighbor queries.
//!
//! Two structures describe the same population:
//!
//! - the location map, `ObjectId -> (value, location)`
//! - the bucket grid, one `IndexSet<ObjectId>` per discretized cell
//!
//! Every mutation updates both before returning, so an object with
//! location `p` is always a member of exactly the bucket `discretize(p)`.
//! [`ContinuousStorage::verify_buckets`] checks this.
//!
//! Locations live in the shape's frame. Bucket coordinates are
//! `trunc((p - ul) / discretization)` per axis, and the grid carries one
//! spare bucket per axis so that points on the far edge still land in a
//! bucket.

use indexmap::{IndexMap, IndexSet};
use log::debug;
use mosaic_core::wire::{put_u32_le, take_len};
use mosaic_core::{Codec, Identified, ObjectId, PartitionId, Wire};
use mosaic_space::{
    row_major_strides, Coords, GeometryError, HyperRect, IntPoint, RealCoords, RealPoint, TransferDescriptor,
};
use smallvec::smallvec;

use crate::error::StorageError;
use crate::layout::GridLayout;
use crate::payload::check_descriptor;
use crate::storage::{GridStorage, StorageKind};

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    loc: RealPoint,
}

/// Continuous-space storage over a bucket grid.
#[derive(Clone, Debug)]
pub struct ContinuousStorage<T> {
    layout: GridLayout,
    disc: RealCoords,
    dsize: Coords,
    bucket_strides: Coords,
    entries: IndexMap<ObjectId, Located<T>>,
    buckets: Vec<IndexSet<ObjectId>>,
}

impl<T: Identified> ContinuousStorage<T> {
    /// Create an empty storage with the same bucket edge on every axis.
    pub fn new(shape: HyperRect, discretization: f64) -> Result<Self, StorageError> {
        let disc: RealCoords = smallvec![discretization; shape.nd()];
        Self::with_discretization(shape, &disc)
    }

    /// Create an empty storage with a per-axis bucket edge.
    pub fn with_discretization(shape: HyperRect, disc: &[f64]) -> Result<Self, StorageError> {
        if disc.len() != shape.nd() {
            return Err(GeometryError::DimensionMismatch {
                expected: shape.nd(),
                found: disc.len(),
            }
            .into());
        }
        if let Some(bad) = disc.iter().find(|d| !d.is_finite() || **d <= 0.0) {
            return Err(StorageError::InvalidConfig {
                reason: format!("discretization must be finite and > 0, got {bad}"),
            });
        }
        let (dsize, bucket_strides) = bucket_grid(&shape, disc);
        let buckets = std::iter::repeat_with(IndexSet::new)
            .take(bucket_count(&dsize))
            .collect();
        Ok(Self {
            layout: GridLayout::new(shape),
            disc: disc.iter().copied().collect(),
            dsize,
            bucket_strides,
            entries: IndexMap::new(),
            buckets,
        })
    }

    /// Replace the halo bounds used by the `*_global` accessors.
    pub fn set_halo_bounds(&mut self, halo: HyperRect) -> Result<(), StorageError> {
        self.layout.set_halo_bounds(halo)
    }

    /// Bucket edge length per axis.
    pub fn discretization(&self) -> &[f64] {
        &self.disc
    }

    /// Number of buckets per axis.
    pub fn bucket_dims(&self) -> &[i32] {
        &self.dsize
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bucket coordinates of a location.
    pub fn discretize(&self, p: &RealPoint) -> Result<Coords, StorageError> {
        check_nd(self.layout.shape().nd(), p.nd())?;
        Ok(self
            .raw_bucket(p)
            .iter()
            .zip(&self.dsize)
            .map(|(&b, &d)| b.clamp(0, d - 1))
            .collect())
    }

    /// Real-valued corners `[ul, br)` of a bucket.
    pub fn bucket_bounds(&self, bucket: &[i32]) -> Result<(RealPoint, RealPoint), StorageError> {
        check_nd(self.dsize.len(), bucket.len())?;
        let ul = self.layout.shape().ul();
        let lo: RealCoords = (0..bucket.len())
            .map(|i| f64::from(ul[i]) + f64::from(bucket[i]) * self.disc[i])
            .collect();
        let hi: RealCoords = lo.iter().zip(&self.disc).map(|(l, d)| l + d).collect();
        Ok((RealPoint::new(lo), RealPoint::new(hi)))
    }

    /// Insert `value` at `p`, or move it there if its id is already
    /// present. Returns the previous location.
    pub fn set_location(&mut self, value: T, p: RealPoint) -> Result<Option<RealPoint>, StorageError> {
        let to = self.bucket_for_location(&p)?;
        let id = value.id();
        let old = self
            .entries
            .insert(id, Located { value, loc: p })
            .map(|prev| prev.loc);
        if let Some(prev) = &old {
            let from = self.bucket_flat(&self.raw_bucket_clamped(prev));
            if from != to {
                self.buckets[from].swap_remove(&id);
            }
        }
        self.buckets[to].insert(id);
        Ok(old)
    }

    /// Move an existing object. Returns false if `id` is not stored.
    pub fn move_object(&mut self, id: ObjectId, p: RealPoint) -> Result<bool, StorageError> {
        let to = self.bucket_for_location(&p)?;
        let Some(entry) = self.entries.get_mut(&id) else {
            return Ok(false);
        };
        let prev = std::mem::replace(&mut entry.loc, p);
        let from = self.bucket_flat(&self.raw_bucket_clamped(&prev));
        if from != to {
            self.buckets[from].swap_remove(&id);
            self.buckets[to].insert(id);
        }
        Ok(true)
    }

    /// Location of an object.
    pub fn get_location(&self, id: ObjectId) -> Option<&RealPoint> {
        self.entries.get(&id).map(|e| &e.loc)
    }

    /// An object by id.
    pub fn get_object(&self, id: ObjectId) -> Option<&T> {
        self.entries.get(&id).map(|e| &e.value)
    }

    /// The object `id` if it sits at `p`.
    pub fn get_object_at(&self, p: &RealPoint, id: ObjectId) -> Result<Option<&T>, StorageError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(None);
        };
        Ok(entry.loc.approx_eq(p)?.then_some(&entry.value))
    }

    /// Objects located at `p`, within tolerance.
    pub fn get_objects_at(&self, p: &RealPoint) -> Result<Vec<&T>, StorageError> {
        let bucket = self.bucket_flat(&self.discretize(p)?);
        let mut out = Vec::new();
        for id in &self.buckets[bucket] {
            let entry = self.entry(id);
            if entry.loc.approx_eq(p)? {
                out.push(&entry.value);
            }
        }
        Ok(out)
    }

    /// Objects whose location lies in `rect` (half-open, shape frame).
    pub fn get_objects_in(&self, rect: &HyperRect) -> Result<Vec<&T>, StorageError> {
        Ok(self
            .ids_in(rect)?
            .into_iter()
            .map(|id| &self.entry(&id).value)
            .collect())
    }

    /// Remove an object.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<T> {
        let entry = self.entries.swap_remove(&id)?;
        let bucket = self.bucket_flat(&self.raw_bucket_clamped(&entry.loc));
        self.buckets[bucket].swap_remove(&id);
        Some(entry.value)
    }

    /// Remove every object located in `rect`.
    pub fn remove_objects_in(&mut self, rect: &HyperRect) -> Result<Vec<T>, StorageError> {
        let ids = self.ids_in(rect)?;
        Ok(ids.into_iter().filter_map(|id| self.remove_object(id)).collect())
    }

    /// Remove every object located at `p`.
    pub fn clear_at(&mut self, p: &RealPoint) -> Result<Vec<T>, StorageError> {
        let ids: Vec<ObjectId> = self.get_objects_at(p)?.into_iter().map(|v| v.id()).collect();
        Ok(ids.into_iter().filter_map(|id| self.remove_object(id)).collect())
    }

    /// Up to `k` objects nearest to object `id`, excluding itself,
    /// nearest first.
    ///
    /// The search widens one Chebyshev ring of buckets at a time. The own
    /// bucket seeds the candidates and is ranked together with ring 1, so
    /// a closer object just across a bucket edge wins. Each round sorts
    /// the accumulated candidates by true squared distance and takes as
    /// many as are still needed; the rest are dropped. Equal distances
    /// keep bucket iteration order. An unknown id yields nothing.
    pub fn nearest_neighbors(&self, id: ObjectId, k: usize) -> Result<Vec<&T>, StorageError> {
        let Some(center) = self.get_location(id) else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        let dloc = self.discretize(center)?;
        let max_layer = dloc
            .iter()
            .zip(&self.dsize)
            .map(|(&l, &d)| l.max(d - l))
            .max()
            .unwrap_or(0);

        let mut found: Vec<&T> = Vec::with_capacity(k);
        let mut candidates: Vec<(f64, ObjectId)> = Vec::new();
        for layer in 0..=max_layer {
            let lo: Coords = dloc.iter().map(|&c| c - layer).collect();
            let hi: Coords = dloc.iter().map(|&c| c + layer).collect();
            for cell in self.bucket_window(&lo, &hi)? {
                let ring = cell
                    .coords()
                    .iter()
                    .zip(&dloc)
                    .map(|(a, b)| (a - b).abs())
                    .max()
                    .unwrap_or(0);
                if ring != layer {
                    continue;
                }
                for other in &self.buckets[self.bucket_flat(cell.coords())] {
                    if *other == id {
                        continue;
                    }
                    candidates.push((self.entry(other).loc.distance_sq(center)?, *other));
                }
            }
            if layer == 0 && max_layer > 0 {
                continue;
            }
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
            let need = k - found.len();
            found.extend(
                candidates
                    .drain(..)
                    .take(need)
                    .map(|(_, other)| &self.entry(&other).value),
            );
            if found.len() >= k {
                break;
            }
        }
        Ok(found)
    }

    /// Objects within Euclidean distance `radius` of `center`.
    ///
    /// Scans `ceil(radius / discretization)` buckets either side of the
    /// center's bucket, clipped to the grid.
    pub fn within_distance(
        &self,
        center: &RealPoint,
        radius: f64,
        exclude: Option<ObjectId>,
    ) -> Result<Vec<&T>, StorageError> {
        check_nd(self.layout.shape().nd(), center.nd())?;
        let dloc = self.raw_bucket(center);
        let reach: Coords = self
            .disc
            .iter()
            .map(|d| (radius / d).ceil() as i32)
            .collect();
        let lo: Coords = dloc.iter().zip(&reach).map(|(c, r)| c.saturating_sub(*r)).collect();
        let hi: Coords = dloc.iter().zip(&reach).map(|(c, r)| c.saturating_add(*r)).collect();
        let r2 = radius * radius;
        let mut out = Vec::new();
        for cell in self.bucket_window(&lo, &hi)? {
            for id in &self.buckets[self.bucket_flat(cell.coords())] {
                if Some(*id) == exclude {
                    continue;
                }
                let entry = self.entry(id);
                if entry.loc.distance_sq(center)? <= r2 {
                    out.push(&entry.value);
                }
            }
        }
        Ok(out)
    }

    /// Iterate `(value, location)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &RealPoint)> + '_ {
        self.entries.values().map(|e| (&e.value, &e.loc))
    }

    /// True if the location map and the bucket grid agree.
    pub fn verify_buckets(&self) -> bool {
        let members: usize = self.buckets.iter().map(IndexSet::len).sum();
        if members != self.entries.len() {
            return false;
        }
        self.entries.iter().all(|(id, e)| {
            let b = self.bucket_flat(&self.raw_bucket_clamped(&e.loc));
            self.buckets[b].contains(id)
        })
    }

    /// [`set_location`](Self::set_location) at a global location.
    pub fn set_location_global(
        &mut self,
        value: T,
        p: &RealPoint,
    ) -> Result<Option<RealPoint>, StorageError> {
        let local = self.layout.to_local_real(p)?;
        self.set_location(value, local)
    }

    /// [`move_object`](Self::move_object) to a global location.
    pub fn move_object_global(&mut self, id: ObjectId, p: &RealPoint) -> Result<bool, StorageError> {
        let local = self.layout.to_local_real(p)?;
        self.move_object(id, local)
    }

    /// [`get_objects_at`](Self::get_objects_at) a global location.
    pub fn get_objects_at_global(&self, p: &RealPoint) -> Result<Vec<&T>, StorageError> {
        self.get_objects_at(&self.layout.to_local_real(p)?)
    }

    /// [`get_objects_in`](Self::get_objects_in) a global rectangle.
    pub fn get_objects_in_global(&self, rect: &HyperRect) -> Result<Vec<&T>, StorageError> {
        self.get_objects_in(&self.layout.to_local_rect(rect)?)
    }

    fn entry(&self, id: &ObjectId) -> &Located<T> {
        // Bucket members always have an entry.
        &self.entries[id]
    }

    fn bucket_for_location(&self, p: &RealPoint) -> Result<usize, StorageError> {
        if !self.layout.shape().contains_real(p)? {
            return Err(StorageError::OutOfBounds {
                point: p.to_string(),
                shape: self.layout.shape().to_string(),
            });
        }
        Ok(self.bucket_flat(&self.raw_bucket_clamped(p)))
    }

    fn raw_bucket(&self, p: &RealPoint) -> Coords {
        let ul = self.layout.shape().ul();
        (0..p.nd())
            .map(|i| ((p[i] - f64::from(ul[i])) / self.disc[i]).trunc() as i32)
            .collect()
    }

    fn raw_bucket_clamped(&self, p: &RealPoint) -> Coords {
        self.raw_bucket(p)
            .iter()
            .zip(&self.dsize)
            .map(|(&b, &d)| b.clamp(0, d - 1))
            .collect()
    }

    fn bucket_flat(&self, bucket: &[i32]) -> usize {
        bucket
            .iter()
            .zip(&self.bucket_strides)
            .map(|(b, s)| (b * s) as usize)
            .sum()
    }

    /// Bucket coordinates in `[lo, hi]`, clipped to the grid, row-major.
    fn bucket_window(&self, lo: &[i32], hi: &[i32]) -> Result<Vec<IntPoint>, StorageError> {
        let lo: Coords = lo.iter().map(|&v| v.max(0)).collect();
        let hi: Coords = hi
            .iter()
            .zip(&self.dsize)
            .map(|(&v, &d)| v.saturating_add(1).min(d))
            .collect();
        if lo.iter().zip(&hi).any(|(l, h)| l >= h) {
            return Ok(Vec::new());
        }
        let window = HyperRect::new(PartitionId::default(), IntPoint::new(lo), IntPoint::new(hi))?;
        Ok(window.iter().collect())
    }

    fn ids_in(&self, rect: &HyperRect) -> Result<Vec<ObjectId>, StorageError> {
        let Some(clip) = rect.intersection(self.layout.shape())? else {
            return Ok(Vec::new());
        };
        let lo = self.raw_bucket(&clip.ul().to_real());
        let hi = self.raw_bucket(&clip.br().to_real());
        let mut out = Vec::new();
        for cell in self.bucket_window(&lo, &hi)? {
            for id in &self.buckets[self.bucket_flat(cell.coords())] {
                if rect.contains_real(&self.entry(id).loc)? {
                    out.push(*id);
                }
            }
        }
        Ok(out)
    }
}

impl<T: Identified> GridStorage<T> for ContinuousStorage<T> {
    fn kind(&self) -> StorageKind {
        StorageKind::Continuous
    }

    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.buckets.iter_mut().for_each(IndexSet::clear);
    }

    fn reshape(&mut self, new_shape: HyperRect) -> Result<(), StorageError> {
        let old = self.layout.shape();
        if old.ul() == new_shape.ul() && old.br() == new_shape.br() {
            return Ok(());
        }
        let overlap = old.intersection(&new_shape)?;
        let layout = self.layout.reshaped(new_shape)?;
        let (dsize, bucket_strides) = bucket_grid(layout.shape(), &self.disc);
        let entries = std::mem::take(&mut self.entries);
        let before = entries.len();

        self.buckets = std::iter::repeat_with(IndexSet::new)
            .take(bucket_count(&dsize))
            .collect();
        self.layout = layout;
        self.dsize = dsize;
        self.bucket_strides = bucket_strides;

        if let Some(overlap) = overlap {
            for (id, entry) in entries {
                if overlap.contains_real(&entry.loc)? {
                    let b = self.bucket_flat(&self.raw_bucket_clamped(&entry.loc));
                    self.buckets[b].insert(id);
                    self.entries.insert(id, entry);
                }
            }
        }
        debug!(
            "reshape continuous storage to {}, kept {}/{} objects",
            self.layout.shape(),
            self.entries.len(),
            before
        );
        Ok(())
    }

    fn pack<C: Codec<T>>(
        &self,
        desc: &TransferDescriptor,
        codec: &C,
        out: &mut Vec<u8>,
    ) -> Result<(), StorageError> {
        check_descriptor(&self.layout, desc, StorageKind::Continuous.wire_type())?;
        for region in desc.regions() {
            let ids = self.ids_in(region)?;
            put_u32_le(out, ids.len() as u32);
            for id in ids {
                let entry = self.entry(&id);
                codec.encode(&entry.value, out);
                entry.loc.rshift_int(region.ul().coords())?.encode(out);
            }
        }
        Ok(())
    }

    fn unpack<C: Codec<T>>(
        &mut self,
        desc: &TransferDescriptor,
        codec: &C,
        input: &mut &[u8],
    ) -> Result<usize, StorageError> {
        check_descriptor(&self.layout, desc, StorageKind::Continuous.wire_type())?;
        let mut staged = Vec::new();
        for region in desc.regions() {
            // A pair is at least the 4-byte point header.
            let pairs = take_len(input, 4)?;
            for _ in 0..pairs {
                let value = codec.decode(input)?;
                let p = RealPoint::decode(input)?.shift_int(region.ul().coords())?;
                let shape = self.layout.shape();
                if !shape.contains_real(&p)? {
                    return Err(StorageError::OutOfBounds {
                        point: p.to_string(),
                        shape: shape.to_string(),
                    });
                }
                staged.push((value, p));
            }
        }

        for region in desc.regions() {
            self.remove_objects_in(region)?;
        }
        let total = staged.len();
        for (value, p) in staged {
            self.set_location(value, p)?;
        }
        Ok(total)
    }
}

fn check_nd(expected: usize, found: usize) -> Result<(), StorageError> {
    if expected != found {
        return Err(GeometryError::DimensionMismatch { expected, found }.into());
    }
    Ok(())
}

fn bucket_grid(shape: &HyperRect, disc: &[f64]) -> (Coords, Coords) {
    let dsize: Coords = shape
        .size()
        .iter()
        .zip(disc)
        .map(|(&s, d)| (f64::from(s) / d).ceil() as i32 + 1)
        .collect();
    let strides = row_major_strides(&dsize);
    (dsize, strides)
}

fn bucket_count(dsize: &[i32]) -> usize {
    dsize.iter().map(|&d| d as usize).product()
}
