//! The raw message channel collectives are built on.

use mosaic_core::Rank;

use crate::error::CommError;

/// A point-to-point byte channel between the ranks of one group.
///
/// Requirements on implementations:
///
/// - Messages between one ordered pair of ranks arrive in send order.
/// - `send` must not wait for the receiver to post a matching `recv`.
///   Collectives send to several peers before receiving from any.
/// - `recv` blocks until a message from `from` arrives.
/// - Sending to oneself is allowed.
pub trait Transport {
    /// This endpoint's rank.
    fn rank(&self) -> Rank;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Send one message to `to`.
    fn send(&mut self, to: Rank, bytes: &[u8]) -> Result<(), CommError>;

    /// Receive the next message from `from`, appending it to `buf`.
    /// Returns the message length.
    fn recv(&mut self, from: Rank, buf: &mut Vec<u8>) -> Result<usize, CommError>;
}
