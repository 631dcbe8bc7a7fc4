//! In-process transport: one thread per rank, crossbeam channels between
//! them.

use crossbeam_channel::{unbounded, Receiver, Sender};
use mosaic_core::Rank;

use crate::error::CommError;
use crate::transport::Transport;

/// A group of in-process ranks.
///
/// Every ordered pair `(from, to)`, including `from == to`, gets its own
/// unbounded channel, so per-pair FIFO order holds and sends never block.
pub struct LocalCluster {
    transports: Vec<ThreadTransport>,
}

impl LocalCluster {
    /// Wire up `size` ranks.
    pub fn new(size: usize) -> Self {
        let mut senders: Vec<Vec<Sender<Vec<u8>>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut receivers: Vec<Vec<Receiver<Vec<u8>>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        for from in 0..size {
            for to in 0..size {
                let (tx, rx) = unbounded();
                senders[from].push(tx);
                receivers[to].push(rx);
            }
        }
        let transports = senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (outbox, inbox))| ThreadTransport {
                rank: Rank::from(rank),
                outbox,
                inbox,
            })
            .collect();
        Self { transports }
    }

    /// Number of ranks.
    pub fn len(&self) -> usize {
        self.transports.len()
    }

    /// True if the cluster has no ranks.
    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    /// Hand out the endpoints, rank 0 first.
    pub fn into_transports(self) -> Vec<ThreadTransport> {
        self.transports
    }
}

impl IntoIterator for LocalCluster {
    type Item = ThreadTransport;
    type IntoIter = std::vec::IntoIter<ThreadTransport>;

    fn into_iter(self) -> Self::IntoIter {
        self.transports.into_iter()
    }
}

/// One rank's endpoint in a [`LocalCluster`].
pub struct ThreadTransport {
    rank: Rank,
    outbox: Vec<Sender<Vec<u8>>>,
    inbox: Vec<Receiver<Vec<u8>>>,
}

impl ThreadTransport {
    fn check(&self, peer: Rank) -> Result<(), CommError> {
        if peer.index() >= self.outbox.len() {
            return Err(CommError::RankOutOfRange {
                rank: peer,
                size: self.outbox.len(),
            });
        }
        Ok(())
    }
}

impl Transport for ThreadTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outbox.len()
    }

    fn send(&mut self, to: Rank, bytes: &[u8]) -> Result<(), CommError> {
        self.check(to)?;
        self.outbox[to.index()]
            .send(bytes.to_vec())
            .map_err(|_| CommError::Disconnected { peer: to })
    }

    fn recv(&mut self, from: Rank, buf: &mut Vec<u8>) -> Result<usize, CommError> {
        self.check(from)?;
        let msg = self.inbox[from.index()]
            .recv()
            .map_err(|_| CommError::Disconnected { peer: from })?;
        buf.extend_from_slice(&msg);
        Ok(msg.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairwise_fifo() {
        let mut t = LocalCluster::new(2).into_transports();
        let mut b = t.pop().unwrap();
        let mut a = t.pop().unwrap();
        a.send(Rank(1), b"one").unwrap();
        a.send(Rank(1), b"two").unwrap();
        a.send(Rank(0), b"self").unwrap();
        let mut buf = Vec::new();
        assert_eq!(b.recv(Rank(0), &mut buf).unwrap(), 3);
        assert_eq!(b.recv(Rank(0), &mut buf).unwrap(), 3);
        assert_eq!(buf, b"onetwo");
        buf.clear();
        a.recv(Rank(0), &mut buf).unwrap();
        assert_eq!(buf, b"self");
    }

    #[test]
    fn dropped_peer_is_disconnected() {
        let mut t = LocalCluster::new(2).into_transports();
        drop(t.pop());
        let mut a = t.pop().unwrap();
        assert_eq!(
            a.send(Rank(1), b"x"),
            Err(CommError::Disconnected { peer: Rank(1) })
        );
    }

    #[test]
    fn unknown_rank_is_rejected() {
        let mut a = LocalCluster::new(1).into_transports().remove(0);
        assert!(matches!(
            a.send(Rank(3), b""),
            Err(CommError::RankOutOfRange { .. })
        ));
    }
}
