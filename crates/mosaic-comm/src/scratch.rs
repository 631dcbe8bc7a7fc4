//! Reusable send and receive buffers.

/// Byte arenas reused across collectives.
///
/// A communicator owns exactly one scratch and takes `&mut self` for every
/// collective, so two operations can never share the buffers at the same
/// time. Buffers grow on demand and keep their capacity; the high-water
/// mark records the largest size either reached.
#[derive(Debug, Default)]
pub struct CommScratch {
    pub(crate) send: Vec<u8>,
    pub(crate) recv: Vec<u8>,
    high_water: usize,
}

impl CommScratch {
    /// Arenas with `capacity` bytes reserved in each.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            send: Vec::with_capacity(capacity),
            recv: Vec::with_capacity(capacity),
            high_water: 0,
        }
    }

    /// Largest size either arena has reached.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Current capacity of the send and receive arenas.
    pub fn capacity(&self) -> (usize, usize) {
        (self.send.capacity(), self.recv.capacity())
    }

    /// Empty both arenas, keeping their capacity.
    pub(crate) fn reset(&mut self) {
        self.send.clear();
        self.recv.clear();
    }

    pub(crate) fn note_usage(&mut self) {
        self.high_water = self.high_water.max(self.send.len()).max(self.recv.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_capacity_and_high_water() {
        let mut s = CommScratch::with_capacity(8);
        s.send.extend_from_slice(&[0; 100]);
        s.note_usage();
        s.reset();
        assert!(s.send.is_empty());
        assert!(s.capacity().0 >= 100);
        assert_eq!(s.high_water(), 100);
    }
}
