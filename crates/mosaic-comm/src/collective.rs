//! Collective operations over a [`Transport`].

use std::ops::Range;

use log::{trace, warn};
use mosaic_core::wire::{put_u64_le, take_u64_le};
use mosaic_core::{Codec, Rank, WireError};
use mosaic_topology::Neighborhood;

use crate::config::CommConfig;
use crate::error::CommError;
use crate::metrics::CommMetrics;
use crate::scratch::CommScratch;
use crate::transport::Transport;

/// Collective operations for one rank.
///
/// Every method is a collective unless stated otherwise: all ranks of the
/// group must call it, in the same order relative to other collectives.
/// Methods take `&mut self`, so one communicator runs one operation at a
/// time and its scratch buffers are never shared between operations.
///
/// Payloads are serialized through an explicit [`Codec`]. Every rank,
/// roots included, decodes its results from bytes, so post-conditions are
/// identical on all ranks.
pub struct Communicator<Tr> {
    transport: Tr,
    scratch: CommScratch,
    config: CommConfig,
    metrics: CommMetrics,
    poisoned: Option<String>,
}

impl<Tr: Transport> Communicator<Tr> {
    /// Wrap a transport with caller-supplied scratch buffers.
    pub fn new(transport: Tr, scratch: CommScratch, config: CommConfig) -> Result<Self, CommError> {
        config.validate()?;
        Ok(Self {
            transport,
            scratch,
            config,
            metrics: CommMetrics::default(),
            poisoned: None,
        })
    }

    /// Wrap a transport with the default configuration and fresh scratch.
    pub fn with_defaults(transport: Tr) -> Self {
        let config = CommConfig::default();
        Self {
            transport,
            scratch: CommScratch::with_capacity(config.initial_scratch_bytes),
            config,
            metrics: CommMetrics::default(),
            poisoned: None,
        }
    }

    /// This rank. Not a collective.
    pub fn rank(&self) -> Rank {
        self.transport.rank()
    }

    /// Number of ranks. Not a collective.
    pub fn size(&self) -> usize {
        self.transport.size()
    }

    /// Traffic counters. Not a collective.
    pub fn metrics(&self) -> &CommMetrics {
        &self.metrics
    }

    /// The scratch arenas. Not a collective.
    pub fn scratch(&self) -> &CommScratch {
        &self.scratch
    }

    /// The active configuration. Not a collective.
    pub fn config(&self) -> &CommConfig {
        &self.config
    }

    /// True once any operation has failed. Not a collective.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Release the transport and scratch. Not a collective.
    pub fn into_parts(self) -> (Tr, CommScratch) {
        (self.transport, self.scratch)
    }

    // ── Collectives ─────────────────────────────────────────────

    /// Send `value` from `root` to every rank.
    ///
    /// Only the root's `value` is read and it must be `Some`. The root
    /// encodes once and decodes its own bytes like every other rank.
    pub fn broadcast<T, C: Codec<T>>(
        &mut self,
        codec: &C,
        value: Option<&T>,
        root: Rank,
    ) -> Result<T, CommError> {
        self.run("broadcast", |c| {
            c.check_root(root)?;
            if c.rank() == root {
                let value = value.ok_or(CommError::ArityMismatch {
                    what: "broadcast root value",
                    expected: 1,
                    found: 0,
                })?;
                codec.encode(value, &mut c.scratch.send);
                let all = 0..c.scratch.send.len();
                for peer in c.peers_except(root) {
                    c.send_framed(peer, all.clone())?;
                }
                decode_exact(codec, &c.scratch.send[all])
            } else {
                let range = c.recv_framed(root)?;
                decode_exact(codec, &c.scratch.recv[range])
            }
        })
    }

    /// Send `values[i]` from `root` to rank `i`.
    ///
    /// Only the root's `values` is read; it must hold one value per rank.
    /// The root encodes each value separately and sends every rank exactly
    /// its own slice.
    pub fn scatter<T, C: Codec<T>>(
        &mut self,
        codec: &C,
        values: Option<&[T]>,
        root: Rank,
    ) -> Result<T, CommError> {
        self.run("scatter", |c| {
            c.check_root(root)?;
            if c.rank() != root {
                let range = c.recv_framed(root)?;
                return decode_exact(codec, &c.scratch.recv[range]);
            }
            let values = values.unwrap_or(&[]);
            c.check_arity("scatter values", c.size(), values.len())?;
            let displs = c.encode_each(codec, values);
            for peer in c.peers_except(root) {
                c.send_framed(peer, displs[peer.index()].clone())?;
            }
            let own = displs[root.index()].clone();
            decode_exact(codec, &c.scratch.send[own])
        })
    }

    /// Collect one value from every rank at `root`, in rank order.
    ///
    /// Non-root ranks get `None`.
    pub fn gather<T, C: Codec<T>>(
        &mut self,
        codec: &C,
        value: &T,
        root: Rank,
    ) -> Result<Option<Vec<T>>, CommError> {
        self.run("gather", |c| {
            c.check_root(root)?;
            codec.encode(value, &mut c.scratch.send);
            let own = 0..c.scratch.send.len();
            if c.rank() != root {
                c.send_framed(root, own)?;
                return Ok(None);
            }
            let ranges = c.recv_from_all(root)?;
            c.decode_per_rank(codec, ranges, own).map(Some)
        })
    }

    /// Every rank ends with every rank's value, in rank order.
    pub fn all_gather<T, C: Codec<T>>(&mut self, codec: &C, value: &T) -> Result<Vec<T>, CommError> {
        self.run("all_gather", |c| {
            let me = c.rank();
            codec.encode(value, &mut c.scratch.send);
            let own = 0..c.scratch.send.len();
            for peer in c.peers_except(me) {
                c.send_framed(peer, own.clone())?;
            }
            let ranges = c.recv_from_all(me)?;
            c.decode_per_rank(codec, ranges, own)
        })
    }

    /// Send `values[i]` to `neighbors[i]` and receive one value from each,
    /// returned in the same order.
    ///
    /// Only the listed ranks take part. Each must list this rank.
    pub fn neighbor_exchange<T, C: Codec<T>>(
        &mut self,
        codec: &C,
        neighbors: &[Rank],
        values: &[T],
    ) -> Result<Vec<T>, CommError> {
        self.run("neighbor_exchange", |c| {
            c.check_arity("neighbor values", neighbors.len(), values.len())?;
            c.check_ranks(neighbors)?;
            let displs = c.encode_each(codec, values);
            for (peer, range) in neighbors.iter().zip(displs) {
                c.send_framed(*peer, range)?;
            }
            let ranges = neighbors
                .iter()
                .map(|&peer| c.recv_framed(peer))
                .collect::<Result<Vec<_>, _>>()?;
            ranges
                .into_iter()
                .map(|r| decode_exact(codec, &c.scratch.recv[r]))
                .collect()
        })
    }

    /// Send the same `value` to every neighbor and receive one from each.
    pub fn neighbor_all_gather<T, C: Codec<T>>(
        &mut self,
        codec: &C,
        neighbors: &[Rank],
        value: &T,
    ) -> Result<Vec<T>, CommError> {
        self.run("neighbor_all_gather", |c| {
            c.check_ranks(neighbors)?;
            codec.encode(value, &mut c.scratch.send);
            let own = 0..c.scratch.send.len();
            for &peer in neighbors {
                c.send_framed(peer, own.clone())?;
            }
            let ranges = neighbors
                .iter()
                .map(|&peer| c.recv_framed(peer))
                .collect::<Result<Vec<_>, _>>()?;
            ranges
                .into_iter()
                .map(|r| decode_exact(codec, &c.scratch.recv[r]))
                .collect()
        })
    }

    /// Byte-level [`neighbor_exchange`](Self::neighbor_exchange).
    pub fn neighbor_exchange_bytes(
        &mut self,
        neighbors: &[Rank],
        payloads: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, CommError> {
        self.run("neighbor_exchange_bytes", |c| {
            c.check_arity("neighbor payloads", neighbors.len(), payloads.len())?;
            c.check_ranks(neighbors)?;
            for (&peer, payload) in neighbors.iter().zip(payloads) {
                c.send_payload(peer, payload)?;
            }
            let ranges = neighbors
                .iter()
                .map(|&peer| c.recv_framed(peer))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ranges.into_iter().map(|r| c.scratch.recv[r].to_vec()).collect())
        })
    }

    /// Exchange with every neighbor, staggered by coloring rounds.
    ///
    /// `payloads[i]` goes to `neighborhood.neighbors()[i]`. In round `c`
    /// the ranks colored `c` send to all their neighbors, and those
    /// neighbors receive from them. Adjacent ranks never share a color, so
    /// each rank is either sending or receiving in a round, never both
    /// toward the same partner. Results follow the neighbor order.
    pub fn scheduled_exchange_bytes(
        &mut self,
        neighborhood: &Neighborhood,
        payloads: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, CommError> {
        self.run("scheduled_exchange", |c| {
            let neighbors = neighborhood.neighbors();
            c.check_arity("scheduled payloads", neighbors.len(), payloads.len())?;
            c.check_ranks(neighbors)?;
            let mut ranges: Vec<Option<Range<usize>>> = vec![None; neighbors.len()];
            for round in 0..neighborhood.rounds() {
                if neighborhood.color() == round {
                    for (&peer, payload) in neighbors.iter().zip(payloads) {
                        c.send_payload(peer, payload)?;
                    }
                } else {
                    for (i, (&peer, &color)) in neighbors
                        .iter()
                        .zip(neighborhood.neighbor_colors())
                        .enumerate()
                    {
                        if color == round {
                            ranges[i] = Some(c.recv_framed(peer)?);
                        }
                    }
                }
                c.metrics.rounds += 1;
            }
            ranges
                .into_iter()
                .zip(neighbors)
                .map(|(r, &peer)| {
                    // A neighbor whose color is out of range never sent.
                    let r = r.ok_or(CommError::RankOutOfRange {
                        rank: peer,
                        size: c.size(),
                    })?;
                    Ok(c.scratch.recv[r].to_vec())
                })
                .collect()
        })
    }

    /// Block until every rank has entered the barrier.
    pub fn barrier(&mut self) -> Result<(), CommError> {
        self.run("barrier", |c| {
            let me = c.rank();
            for peer in c.peers_except(me) {
                c.send_framed(peer, 0..0)?;
            }
            c.recv_from_all(me).map(|_| ())
        })
    }

    // ── Internals ───────────────────────────────────────────────

    /// Poison check, scratch reset, logging and poisoning on failure.
    fn run<R>(
        &mut self,
        op: &'static str,
        body: impl FnOnce(&mut Self) -> Result<R, CommError>,
    ) -> Result<R, CommError> {
        if let Some(cause) = &self.poisoned {
            return Err(CommError::Poisoned {
                cause: cause.clone(),
            });
        }
        self.metrics.collectives += 1;
        self.scratch.reset();
        trace!("rank {} enter {}", self.rank(), op);
        let result = body(self);
        self.scratch.note_usage();
        match result {
            Ok(r) => {
                trace!(
                    "rank {} leave {} (send {} B, recv {} B)",
                    self.rank(),
                    op,
                    self.scratch.send.len(),
                    self.scratch.recv.len()
                );
                Ok(r)
            }
            Err(e) => {
                warn!("rank {} {} failed, communicator poisoned: {}", self.rank(), op, e);
                self.poisoned = Some(format!("{op}: {e}"));
                Err(e)
            }
        }
    }

    fn check_root(&self, root: Rank) -> Result<(), CommError> {
        if root.index() >= self.size() {
            return Err(CommError::InvalidRoot {
                root,
                size: self.size(),
            });
        }
        Ok(())
    }

    fn check_ranks(&self, ranks: &[Rank]) -> Result<(), CommError> {
        match ranks.iter().find(|r| r.index() >= self.size()) {
            Some(&rank) => Err(CommError::RankOutOfRange {
                rank,
                size: self.size(),
            }),
            None => Ok(()),
        }
    }

    fn check_arity(&self, what: &'static str, expected: usize, found: usize) -> Result<(), CommError> {
        if expected != found {
            return Err(CommError::ArityMismatch {
                what,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn peers_except(&self, skip: Rank) -> Vec<Rank> {
        (0..self.size())
            .map(Rank::from)
            .filter(|&r| r != skip)
            .collect()
    }

    /// Encode each value into the send arena; returns per-value ranges
    /// (the displacements).
    fn encode_each<T, C: Codec<T>>(&mut self, codec: &C, values: &[T]) -> Vec<Range<usize>> {
        let mut displs = Vec::with_capacity(values.len());
        for v in values {
            let start = self.scratch.send.len();
            codec.encode(v, &mut self.scratch.send);
            displs.push(start..self.scratch.send.len());
        }
        displs
    }

    fn check_len(&self, bytes: usize) -> Result<(), CommError> {
        if bytes as u64 > self.config.max_message_bytes {
            return Err(CommError::PayloadTooLarge {
                bytes: bytes as u64,
                max: self.config.max_message_bytes,
            });
        }
        Ok(())
    }

    /// Count message, then the payload `send[range]`.
    fn send_framed(&mut self, to: Rank, range: Range<usize>) -> Result<(), CommError> {
        self.check_len(range.len())?;
        let mut header = Vec::with_capacity(8);
        put_u64_le(&mut header, range.len() as u64);
        self.transport.send(to, &header)?;
        self.transport.send(to, &self.scratch.send[range.clone()])?;
        self.metrics.record_send(range.len());
        Ok(())
    }

    /// Count message, then a caller-owned payload.
    fn send_payload(&mut self, to: Rank, payload: &[u8]) -> Result<(), CommError> {
        self.check_len(payload.len())?;
        let mut header = Vec::with_capacity(8);
        put_u64_le(&mut header, payload.len() as u64);
        self.transport.send(to, &header)?;
        self.transport.send(to, payload)?;
        self.metrics.record_send(payload.len());
        Ok(())
    }

    /// Receive a framed payload from `from`, appending it to the receive
    /// arena. Returns its range.
    fn recv_framed(&mut self, from: Rank) -> Result<Range<usize>, CommError> {
        let start = self.scratch.recv.len();
        let n = self.transport.recv(from, &mut self.scratch.recv)?;
        if n != 8 {
            return Err(CommError::SizeMismatch {
                peer: from,
                expected: 8,
                found: n as u64,
            });
        }
        let mut header = &self.scratch.recv[start..];
        let announced = take_u64_le(&mut header)?;
        self.scratch.recv.truncate(start);
        if announced > self.config.max_message_bytes {
            return Err(CommError::PayloadTooLarge {
                bytes: announced,
                max: self.config.max_message_bytes,
            });
        }
        let n = self.transport.recv(from, &mut self.scratch.recv)?;
        if n as u64 != announced {
            return Err(CommError::SizeMismatch {
                peer: from,
                expected: announced,
                found: n as u64,
            });
        }
        self.metrics.record_recv(n);
        Ok(start..start + n)
    }

    /// Receive from every rank except `me`, in rank order. The entry for
    /// `me` is `None`.
    fn recv_from_all(&mut self, me: Rank) -> Result<Vec<Option<Range<usize>>>, CommError> {
        (0..self.size())
            .map(Rank::from)
            .map(|peer| {
                if peer == me {
                    Ok(None)
                } else {
                    self.recv_framed(peer).map(Some)
                }
            })
            .collect()
    }

    /// Decode one value per rank: own bytes from the send arena, the rest
    /// from the receive arena.
    fn decode_per_rank<T, C: Codec<T>>(
        &self,
        codec: &C,
        ranges: Vec<Option<Range<usize>>>,
        own: Range<usize>,
    ) -> Result<Vec<T>, CommError> {
        ranges
            .into_iter()
            .map(|r| match r {
                Some(r) => decode_exact(codec, &self.scratch.recv[r]),
                None => decode_exact(codec, &self.scratch.send[own.clone()]),
            })
            .collect()
    }
}

/// Decode one value that must occupy all of `bytes`.
fn decode_exact<T, C: Codec<T>>(codec: &C, mut bytes: &[u8]) -> Result<T, CommError> {
    let value = codec.decode(&mut bytes)?;
    if !bytes.is_empty() {
        return Err(WireError::Malformed {
            detail: format!("{} trailing bytes after value", bytes.len()),
        }
        .into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalCluster;
    use mosaic_core::WireCodec;

    fn run<R: Send>(
        n: usize,
        f: impl Fn(Communicator<crate::local::ThreadTransport>) -> R + Sync,
    ) -> Vec<R> {
        let f = &f;
        std::thread::scope(|s| {
            let handles: Vec<_> = LocalCluster::new(n)
                .into_iter()
                .map(|t| s.spawn(move || f(Communicator::with_defaults(t))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn broadcast_reaches_every_rank() {
        let out = run(4, |mut c| {
            let v = (c.rank() == Rank(2)).then(|| "hello".to_string());
            c.broadcast(&WireCodec, v.as_ref(), Rank(2)).unwrap()
        });
        assert!(out.iter().all(|s| s == "hello"));
    }

    #[test]
    fn gather_orders_by_rank() {
        let out = run(3, |mut c| {
            let me = c.rank().0;
            c.gather(&WireCodec, &(me * 10), Rank(1)).unwrap()
        });
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(vec![0u32, 10, 20]));
        assert_eq!(out[2], None);
    }

    #[test]
    fn all_gather_everywhere() {
        let out = run(3, |mut c| {
            let me = c.rank().0 as u64;
            c.all_gather(&WireCodec, &me).unwrap()
        });
        for v in out {
            assert_eq!(v, vec![0u64, 1, 2]);
        }
    }

    #[test]
    fn single_rank_collectives_are_local() {
        let out = run(1, |mut c| {
            let b: u32 = c.broadcast(&WireCodec, Some(&7u32), Rank(0)).unwrap();
            let s: u32 = c.scatter(&WireCodec, Some(&[9u32][..]), Rank(0)).unwrap();
            let g = c.gather(&WireCodec, &3u32, Rank(0)).unwrap();
            c.barrier().unwrap();
            (b, s, g, c.metrics().messages_sent)
        });
        assert_eq!(out[0], (7, 9, Some(vec![3]), 0));
    }

    #[test]
    fn invalid_root_poisons() {
        let out = run(2, |mut c| {
            let first = c.broadcast(&WireCodec, Some(&1u8), Rank(5));
            let second = c.barrier();
            (first, second, c.is_poisoned())
        });
        for (first, second, poisoned) in out {
            assert_eq!(first, Err(CommError::InvalidRoot { root: Rank(5), size: 2 }));
            assert!(matches!(second, Err(CommError::Poisoned { .. })));
            assert!(poisoned);
        }
    }

    #[test]
    fn scatter_arity_is_checked_at_root() {
        let mut c = Communicator::with_defaults(LocalCluster::new(1).into_transports().remove(0));
        let err = c.scatter::<u32, _>(&WireCodec, Some(&[1, 2][..]), Rank(0)).unwrap_err();
        assert_eq!(
            err,
            CommError::ArityMismatch {
                what: "scatter values",
                expected: 1,
                found: 2
            }
        );
    }
}
