//! Cumulative communicator counters.

/// Traffic counters for one communicator.
///
/// Counts cover payload messages only. The 8-byte count messages that
/// precede every payload are not included in the byte totals.
#[derive(Clone, Debug, Default)]
pub struct CommMetrics {
    /// Collectives started, including ones that failed.
    pub collectives: u64,
    /// Payload messages sent.
    pub messages_sent: u64,
    /// Payload messages received.
    pub messages_received: u64,
    /// Payload bytes sent.
    pub bytes_sent: u64,
    /// Payload bytes received.
    pub bytes_received: u64,
    /// Largest single payload sent or received.
    pub peak_message_bytes: u64,
    /// Coloring rounds run by scheduled exchanges.
    pub rounds: u64,
}

impl CommMetrics {
    pub(crate) fn record_send(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
        self.peak_message_bytes = self.peak_message_bytes.max(bytes as u64);
    }

    pub(crate) fn record_recv(&mut self, bytes: usize) {
        self.messages_received += 1;
        self.bytes_received += bytes as u64;
        self.peak_message_bytes = self.peak_message_bytes.max(bytes as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = CommMetrics::default();
        assert_eq!(m.collectives, 0);
        assert_eq!(m.messages_sent, 0);
        assert_eq!(m.bytes_received, 0);
        assert_eq!(m.peak_message_bytes, 0);
        assert_eq!(m.rounds, 0);
    }

    #[test]
    fn peak_tracks_largest_message() {
        let mut m = CommMetrics::default();
        m.record_send(10);
        m.record_recv(40);
        m.record_send(5);
        assert_eq!(m.peak_message_bytes, 40);
        assert_eq!(m.bytes_sent, 15);
        assert_eq!(m.messages_received, 1);
    }
}
