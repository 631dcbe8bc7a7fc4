//! Communicator limits and sizing.

use crate::error::CommError;

/// Configuration for a [`Communicator`](crate::Communicator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommConfig {
    /// Largest payload accepted in one message, in bytes. Default: 128 MiB.
    ///
    /// Checked on send and on the announced count before a receive, so an
    /// oversized payload fails before any buffer is grown for it.
    pub max_message_bytes: u64,
    /// Initial capacity of each scratch arena, in bytes. Default: 64 KiB.
    pub initial_scratch_bytes: usize,
}

impl CommConfig {
    /// Default payload limit.
    pub const DEFAULT_MAX_MESSAGE_BYTES: u64 = 128 * 1024 * 1024;

    /// Default scratch capacity.
    pub const DEFAULT_INITIAL_SCRATCH_BYTES: usize = 64 * 1024;

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), CommError> {
        if self.max_message_bytes == 0 {
            return Err(CommError::InvalidConfig {
                reason: "max_message_bytes must be > 0".into(),
            });
        }
        if self.initial_scratch_bytes as u64 > self.max_message_bytes {
            return Err(CommError::InvalidConfig {
                reason: format!(
                    "initial_scratch_bytes ({}) exceeds max_message_bytes ({})",
                    self.initial_scratch_bytes, self.max_message_bytes
                ),
            });
        }
        Ok(())
    }
}

impl Default for CommConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: Self::DEFAULT_MAX_MESSAGE_BYTES,
            initial_scratch_bytes: Self::DEFAULT_INITIAL_SCRATCH_BYTES,
        }
    }
}
