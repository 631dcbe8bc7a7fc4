//! A partitioned storage with a halo kept in sync with its neighbors.

use log::debug;
use mosaic_comm::{Communicator, Transport};
use mosaic_core::{Codec, Identified, Rank, WireCodec, WireError};
use mosaic_space::{Coords, GeometryError, HyperRect, IntPoint, TransferDescriptor};
use mosaic_storage::{AnyStorage, GridStorage, StorageError, StorageKind};
use mosaic_topology::{check_aoi, Neighborhood, PartitionGraph};

use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::metrics::FieldMetrics;
use crate::overlap::{migration, neighbor_overlap, self_overlap, Overlap};

/// Descriptors for exchanging with one peer.
#[derive(Clone, Debug)]
pub struct NeighborLink {
    rank: Rank,
    send: TransferDescriptor,
    recv: TransferDescriptor,
}

impl NeighborLink {
    /// The peer.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Cells of the local partition sent to the peer.
    pub fn send(&self) -> &TransferDescriptor {
        &self.send
    }

    /// Halo cells refreshed from the peer.
    pub fn recv(&self) -> &TransferDescriptor {
        &self.recv
    }
}

/// One rank's partition of a world, plus a halo mirrored from neighbors.
///
/// The storage's shape is the halo: the local partition grown by
/// `config.aoi` on every side, in global coordinates. Cells of the local
/// partition are owned here; halo cells are copies refreshed by
/// [`sync_halo`](Self::sync_halo).
///
/// ```text
/// ┌──────────── halo ────────────┐
/// │  ┌───────── local ───────┐   │
/// │  │  ┌──── private ────┐  │   │
/// │  │  │                 │  │   │
/// │  │  └─────────────────┘  │   │
/// │  └───────────────────────┘   │
/// └──────────────────────────────┘
/// ```
///
/// The private region is the part of the partition no neighbor reads.
/// Cells between private and local are shared: they are sent during halo
/// refresh.
///
/// Every rank of the communicator must build its field from the same
/// world, partition list and config.
pub struct HaloField<T> {
    storage: AnyStorage<T>,
    world: HyperRect,
    partitions: Vec<HyperRect>,
    rank: Rank,
    config: FieldConfig,
    local: HyperRect,
    halo: HyperRect,
    private: HyperRect,
    shifts: Vec<Coords>,
    graph: PartitionGraph,
    neighborhood: Neighborhood,
    links: Vec<NeighborLink>,
    wrap_self: Option<NeighborLink>,
    metrics: FieldMetrics,
}

impl<T: Identified> HaloField<T> {
    /// Build the field for `rank`, owning `partitions[rank]`.
    ///
    /// Partitions must lie inside `world` and each must be at least
    /// `2 * aoi` cells wide on every axis.
    pub fn new(
        kind: StorageKind,
        world: HyperRect,
        partitions: Vec<HyperRect>,
        rank: Rank,
        config: FieldConfig,
    ) -> Result<Self, FieldError> {
        config.validate()?;
        check_partitions(&world, &partitions, rank)?;
        check_aoi(&partitions, config.aoi)?;

        let local = partitions[rank.index()].clone();
        let halo = local.resize(config.aoi)?;
        let private = local.resize(-config.aoi)?;
        let storage = AnyStorage::new(kind, halo.clone(), &config.storage_config())?;
        let shifts = config.edge.world_shifts(&world)?;
        let graph = PartitionGraph::from_partitions(&partitions, &world, config.aoi, config.edge)?;
        let coloring = graph.color();
        let neighborhood = Neighborhood::new(&graph, &coloring, rank)?;

        let mut field = Self {
            storage,
            world,
            partitions,
            rank,
            config,
            local,
            halo,
            private,
            shifts,
            graph,
            neighborhood,
            links: Vec::new(),
            wrap_self: None,
            metrics: FieldMetrics::default(),
        };
        field.build_links()?;
        debug!(
            "rank {} field: local {}, halo {}, {} neighbors, {} rounds",
            field.rank,
            field.local,
            field.halo,
            field.links.len(),
            field.neighborhood.rounds()
        );
        Ok(field)
    }

    // ── Accessors ───────────────────────────────────────────────

    /// This field's rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The whole world.
    pub fn world(&self) -> &HyperRect {
        &self.world
    }

    /// Every rank's partition, indexed by rank.
    pub fn partitions(&self) -> &[HyperRect] {
        &self.partitions
    }

    /// The owned partition.
    pub fn local(&self) -> &HyperRect {
        &self.local
    }

    /// The partition grown by the halo width; the storage's shape.
    pub fn halo(&self) -> &HyperRect {
        &self.halo
    }

    /// The partition shrunk by the halo width.
    pub fn private(&self) -> &HyperRect {
        &self.private
    }

    /// The active configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The backing storage, addressed in global coordinates.
    pub fn storage(&self) -> &AnyStorage<T> {
        &self.storage
    }

    /// The backing storage, mutably.
    pub fn storage_mut(&mut self) -> &mut AnyStorage<T> {
        &mut self.storage
    }

    /// The partition graph over all ranks.
    pub fn graph(&self) -> &PartitionGraph {
        &self.graph
    }

    /// This rank's neighbors and coloring.
    pub fn neighborhood(&self) -> &Neighborhood {
        &self.neighborhood
    }

    /// Exchange descriptors, parallel to the neighborhood's neighbor list.
    pub fn neighbors(&self) -> &[NeighborLink] {
        &self.links
    }

    /// Descriptors for copying the partition into its own wrapped halo.
    pub fn wrap_self(&self) -> Option<&NeighborLink> {
        self.wrap_self.as_ref()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &FieldMetrics {
        &self.metrics
    }

    // ── Stabbing queries ────────────────────────────────────────

    /// True if `p` is in the owned partition.
    pub fn in_local(&self, p: &IntPoint) -> Result<bool, FieldError> {
        Ok(self.local.contains(p)?)
    }

    /// True if `p` is in the private region.
    pub fn in_private(&self, p: &IntPoint) -> Result<bool, FieldError> {
        Ok(self.private.contains(p)?)
    }

    /// True if `p` is anywhere in the storage, partition included.
    pub fn in_halo(&self, p: &IntPoint) -> Result<bool, FieldError> {
        Ok(self.halo.contains(p)?)
    }

    /// True if `p` is owned here and read by some neighbor.
    pub fn in_shared(&self, p: &IntPoint) -> Result<bool, FieldError> {
        Ok(self.in_local(p)? && !self.in_private(p)?)
    }

    /// Map `p` into the world.
    ///
    /// On a torus every point has an image inside the world. Under
    /// `Absorb` points are returned unchanged.
    pub fn to_toroidal(&self, p: &IntPoint) -> Result<IntPoint, FieldError> {
        if self.config.edge.is_toroidal() {
            Ok(p.to_toroidal(&self.world)?)
        } else {
            Ok(p.clone())
        }
    }

    /// Fold `rect` into the world.
    ///
    /// On a torus the pieces sticking out are shifted back in. Under
    /// `Absorb` they are clipped away.
    pub fn to_toroidal_rect(&self, rect: &HyperRect) -> Result<Vec<HyperRect>, FieldError> {
        if self.config.edge.is_toroidal() {
            Ok(rect.to_toroidal(&self.world)?)
        } else {
            Ok(rect.intersection(&self.world)?.into_iter().collect())
        }
    }

    // ── Exchange ────────────────────────────────────────────────

    /// Refresh the halo from the neighbors' partitions.
    ///
    /// Packs every neighbor's send regions, exchanges them in coloring
    /// rounds and unpacks into the halo. On a torus covered by a single
    /// partition along some axis, the wrapped halo is copied locally.
    /// Returns the number of elements written into the halo.
    pub fn sync_halo<Tr: Transport, C: Codec<T>>(
        &mut self,
        comm: &mut Communicator<Tr>,
        codec: &C,
    ) -> Result<usize, FieldError> {
        self.check_comm(comm)?;
        let mut payloads = Vec::with_capacity(self.links.len());
        for link in &self.links {
            let mut buf = Vec::new();
            self.storage.pack(&link.send, codec, &mut buf)?;
            payloads.push(buf);
        }
        let received = comm.scheduled_exchange_bytes(&self.neighborhood, &payloads)?;

        let mut count = 0;
        for (link, bytes) in self.links.iter().zip(&received) {
            count += unpack_all(&mut self.storage, &link.recv, codec, bytes)?;
        }
        self.metrics.halo_elements_received += count as u64;

        if let Some(link) = &self.wrap_self {
            let mut buf = Vec::new();
            self.storage.pack(&link.send, codec, &mut buf)?;
            let copied = unpack_all(&mut self.storage, &link.recv, codec, &buf)?;
            self.metrics.self_copied_elements += copied as u64;
            count += copied;
        }

        self.metrics.syncs += 1;
        debug!(
            "rank {} sync_halo: {} elements from {} neighbors",
            self.rank,
            count,
            self.links.len()
        );
        Ok(count)
    }

    /// Gather every partition into one world-shaped storage at the root.
    ///
    /// Only partition cells are sent; halos are ignored. The root gets
    /// `Some`, other ranks `None`.
    pub fn collect<Tr: Transport, C: Codec<T>>(
        &mut self,
        comm: &mut Communicator<Tr>,
        codec: &C,
    ) -> Result<Option<AnyStorage<T>>, FieldError> {
        self.check_comm(comm)?;
        let desc = self.storage.descriptor(vec![self.local.clone()])?;
        let mut bytes = Vec::new();
        self.storage.pack(&desc, codec, &mut bytes)?;

        let gathered = comm.gather(&WireCodec, &bytes, self.config.root)?;
        let Some(gathered) = gathered else {
            return Ok(None);
        };
        let mut world = AnyStorage::new(
            self.storage.kind(),
            self.world.clone(),
            &self.config.storage_config(),
        )?;
        let mut count = 0;
        for (part, bytes) in self.partitions.iter().zip(&gathered) {
            let desc = world.descriptor(vec![part.clone()])?;
            count += unpack_all(&mut world, &desc, codec, bytes)?;
        }
        debug!("rank {} collect: {} elements at root", self.rank, count);
        Ok(Some(world))
    }

    /// Scatter a world-shaped storage from the root into every partition.
    ///
    /// Only the root's `world` is read, and it must be `Some` and of this
    /// field's kind and world shape. Each rank's partition cells are
    /// overwritten; halos are left alone. Returns the number of elements
    /// written on this rank.
    pub fn distribute<Tr: Transport, C: Codec<T>>(
        &mut self,
        comm: &mut Communicator<Tr>,
        codec: &C,
        world: Option<&AnyStorage<T>>,
    ) -> Result<usize, FieldError> {
        self.check_comm(comm)?;
        let payloads = if comm.rank() == self.config.root {
            let world = world.ok_or_else(|| FieldError::InvalidConfig {
                reason: "distribute root has no world storage".into(),
            })?;
            let mut payloads = Vec::with_capacity(self.partitions.len());
            for part in &self.partitions {
                let desc = world.descriptor(vec![part.clone()])?;
                let mut buf = Vec::new();
                world.pack(&desc, codec, &mut buf)?;
                payloads.push(buf);
            }
            Some(payloads)
        } else {
            None
        };

        let bytes: Vec<u8> = comm.scatter(&WireCodec, payloads.as_deref(), self.config.root)?;
        let desc = self.storage.descriptor(vec![self.local.clone()])?;
        let count = unpack_all(&mut self.storage, &desc, codec, &bytes)?;
        debug!("rank {} distribute: {} elements", self.rank, count);
        Ok(count)
    }

    /// Move to a new decomposition, keeping every partition cell.
    ///
    /// Cells of the old partition now owned by another rank are sent to
    /// it; cells this rank keeps survive the reshape in place. Halo
    /// contents are unspecified until the next [`sync_halo`](Self::sync_halo).
    /// Returns the number of elements received from other ranks.
    pub fn rebalance<Tr: Transport, C: Codec<T>>(
        &mut self,
        comm: &mut Communicator<Tr>,
        codec: &C,
        new_partitions: Vec<HyperRect>,
    ) -> Result<usize, FieldError> {
        self.check_comm(comm)?;
        check_partitions(&self.world, &new_partitions, self.rank)?;
        check_aoi(&new_partitions, self.config.aoi)?;
        if new_partitions.len() != self.partitions.len() {
            return Err(FieldError::InvalidConfig {
                reason: format!(
                    "rebalance to {} partitions, field has {}",
                    new_partitions.len(),
                    self.partitions.len()
                ),
            });
        }

        let me = self.rank.index();
        let old_local = self.local.clone();
        let new_local = new_partitions[me].clone();

        // Peers whose old or new partition touches ours in either epoch.
        let mut peers = Vec::new();
        let mut outgoing = Vec::new();
        let mut incoming = Vec::new();
        for (r, (old, new)) in self.partitions.iter().zip(&new_partitions).enumerate() {
            if r == me {
                continue;
            }
            let give = migration(&old_local, new)?;
            let take = migration(old, &new_local)?;
            if give.is_none() && take.is_none() {
                continue;
            }
            peers.push(Rank::from(r));
            outgoing.push(give);
            incoming.push(take);
        }

        let mut payloads = Vec::with_capacity(peers.len());
        for give in &outgoing {
            let desc = self.storage.descriptor(give.iter().cloned().collect())?;
            let mut buf = Vec::new();
            self.storage.pack(&desc, codec, &mut buf)?;
            payloads.push(buf);
        }

        let new_halo = new_local.resize(self.config.aoi)?;
        self.storage.reshape(new_halo.clone())?;

        let received = comm.neighbor_exchange_bytes(&peers, &payloads)?;
        let mut count = 0;
        for (take, bytes) in incoming.iter().zip(&received) {
            let desc = self.storage.descriptor(take.iter().cloned().collect())?;
            count += unpack_all(&mut self.storage, &desc, codec, bytes)?;
        }

        self.private = new_local.resize(-self.config.aoi)?;
        self.local = new_local;
        self.halo = new_halo;
        self.partitions = new_partitions;
        self.graph = PartitionGraph::from_partitions(
            &self.partitions,
            &self.world,
            self.config.aoi,
            self.config.edge,
        )?;
        self.neighborhood = Neighborhood::new(&self.graph, &self.graph.color(), self.rank)?;
        self.build_links()?;

        self.metrics.rebalances += 1;
        self.metrics.migrated_elements += count as u64;
        debug!(
            "rank {} rebalance: local {}, {} peers, {} elements received, {} neighbors now",
            self.rank,
            self.local,
            peers.len(),
            count,
            self.links.len()
        );
        Ok(count)
    }

    // ── Internals ───────────────────────────────────────────────

    /// Recompute the exchange descriptors from the current geometry.
    fn build_links(&mut self) -> Result<(), FieldError> {
        let mut links = Vec::with_capacity(self.neighborhood.neighbors().len());
        for &n in self.neighborhood.neighbors() {
            let overlap = neighbor_overlap(
                &self.local,
                &self.halo,
                &self.partitions[n.index()],
                self.config.aoi,
                &self.shifts,
            )?;
            links.push(self.link(n, overlap)?);
        }
        self.links = links;

        let own = self_overlap(&self.local, &self.halo, &self.shifts)?;
        self.wrap_self = if own.is_empty() {
            None
        } else {
            Some(self.link(self.rank, own)?)
        };
        Ok(())
    }

    fn link(&self, rank: Rank, overlap: Overlap) -> Result<NeighborLink, FieldError> {
        Ok(NeighborLink {
            rank,
            send: self.storage.descriptor(overlap.send)?,
            recv: self.storage.descriptor(overlap.recv)?,
        })
    }

    fn check_comm<Tr: Transport>(&self, comm: &Communicator<Tr>) -> Result<(), FieldError> {
        if comm.size() != self.partitions.len() || comm.rank() != self.rank {
            return Err(FieldError::InvalidConfig {
                reason: format!(
                    "communicator is rank {} of {}, field is rank {} of {}",
                    comm.rank(),
                    comm.size(),
                    self.rank,
                    self.partitions.len()
                ),
            });
        }
        Ok(())
    }
}

/// Unpack a whole payload, rejecting trailing bytes.
fn unpack_all<T: Identified, C: Codec<T>>(
    storage: &mut AnyStorage<T>,
    desc: &TransferDescriptor,
    codec: &C,
    bytes: &[u8],
) -> Result<usize, FieldError> {
    let mut input = bytes;
    let count = storage.unpack(desc, codec, &mut input)?;
    if !input.is_empty() {
        return Err(StorageError::Wire(WireError::Malformed {
            detail: format!("{} trailing bytes after region payload", input.len()),
        })
        .into());
    }
    Ok(count)
}

fn check_partitions(world: &HyperRect, partitions: &[HyperRect], rank: Rank) -> Result<(), FieldError> {
    if rank.index() >= partitions.len() {
        return Err(FieldError::InvalidConfig {
            reason: format!("rank {rank} has no partition among {}", partitions.len()),
        });
    }
    for part in partitions {
        if !world.contains_rect(part)? {
            return Err(GeometryError::NotContained {
                region: part.to_string(),
                bounds: world.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{ObjectId, PartitionId};
    use mosaic_space::EdgeBehavior;
    use mosaic_topology::uniform_decomposition;

    fn world(w: i32, h: i32) -> HyperRect {
        HyperRect::xy(PartitionId(0), 0, 0, w, h).unwrap()
    }

    fn field(edge: EdgeBehavior, splits: &[i32], rank: u32) -> HaloField<ObjectId> {
        let w = world(8, 8);
        let parts = uniform_decomposition(&w, splits).unwrap();
        let config = FieldConfig {
            edge,
            ..Default::default()
        };
        HaloField::new(StorageKind::Int, w, parts, Rank(rank), config).unwrap()
    }

    #[test]
    fn regions_nest() {
        let f = field(EdgeBehavior::Absorb, &[2, 2], 3);
        assert_eq!(f.local(), &HyperRect::xy(PartitionId(3), 4, 4, 8, 8).unwrap());
        assert_eq!(f.halo(), &HyperRect::xy(PartitionId(3), 3, 3, 9, 9).unwrap());
        assert_eq!(f.private(), &HyperRect::xy(PartitionId(3), 5, 5, 7, 7).unwrap());
        assert_eq!(f.storage().layout().shape(), f.halo());
    }

    #[test]
    fn stabbing_queries() {
        let f = field(EdgeBehavior::Absorb, &[2, 2], 0);
        let p = |x, y| IntPoint::xy(x, y);
        assert!(f.in_private(&p(1, 1)).unwrap());
        assert!(!f.in_shared(&p(1, 1)).unwrap());
        assert!(f.in_shared(&p(3, 0)).unwrap());
        assert!(!f.in_local(&p(4, 0)).unwrap());
        assert!(f.in_halo(&p(4, 0)).unwrap());
        assert!(!f.in_halo(&p(5, 0)).unwrap());
    }

    #[test]
    fn toroidal_mapping_depends_on_edge() {
        let wrap = field(EdgeBehavior::Wrap, &[2, 2], 0);
        assert_eq!(wrap.to_toroidal(&IntPoint::xy(-1, 8)).unwrap(), IntPoint::xy(7, 0));
        let absorb = field(EdgeBehavior::Absorb, &[2, 2], 0);
        assert_eq!(absorb.to_toroidal(&IntPoint::xy(-1, 8)).unwrap(), IntPoint::xy(-1, 8));
        assert_eq!(
            absorb.to_toroidal_rect(absorb.halo()).unwrap(),
            vec![HyperRect::xy(PartitionId(0), 0, 0, 5, 5).unwrap()]
        );
        let pieces = wrap.to_toroidal_rect(wrap.halo()).unwrap();
        assert_eq!(pieces.iter().map(HyperRect::area).sum::<usize>(), 36);
    }

    #[test]
    fn torus_neighbors_and_self_wrap() {
        let f = field(EdgeBehavior::Wrap, &[2, 2], 0);
        assert_eq!(f.neighbors().len(), 3);
        assert!(f.wrap_self().is_none());

        let strip = field(EdgeBehavior::Wrap, &[2, 1], 0);
        assert_eq!(strip.neighbors().len(), 1);
        assert!(strip.wrap_self().is_some());

        let absorb = field(EdgeBehavior::Absorb, &[2, 1], 0);
        assert!(absorb.wrap_self().is_none());
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let w = world(8, 8);
        let parts = uniform_decomposition(&w, &[2, 2]).unwrap();
        let err = HaloField::<ObjectId>::new(
            StorageKind::Int,
            w.clone(),
            parts.clone(),
            Rank(4),
            FieldConfig::default(),
        );
        assert!(matches!(err, Err(FieldError::InvalidConfig { .. })));

        let too_wide = FieldConfig {
            aoi: 3,
            ..Default::default()
        };
        let err = HaloField::<ObjectId>::new(StorageKind::Int, w.clone(), parts, Rank(0), too_wide);
        assert!(matches!(err, Err(FieldError::Topology(_))));

        let outside = vec![HyperRect::xy(PartitionId(0), 0, 0, 9, 8).unwrap()];
        let err = HaloField::<ObjectId>::new(StorageKind::Int, w, outside, Rank(0), FieldConfig::default());
        assert!(matches!(err, Err(FieldError::Geometry(GeometryError::NotContained { .. }))));
    }
}
