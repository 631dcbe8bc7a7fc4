//! Storage construction parameters.

use crate::error::StorageError;

/// Parameters used when building an [`AnyStorage`](crate::AnyStorage) by kind.
///
/// Only the fields relevant to the chosen variant are read.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    /// Value meaning "empty" in an int storage.
    ///
    /// Default: 0.
    pub int_sentinel: i32,

    /// Value meaning "empty" in a double storage.
    ///
    /// Default: 0.0.
    pub double_sentinel: f64,

    /// Release a bag's allocation as soon as it becomes empty.
    ///
    /// Default: false. Worth enabling for sparse agent populations on
    /// large grids, where most bags stay empty after an agent leaves.
    pub remove_empty_bags: bool,

    /// Bucket edge length for continuous storage, per axis.
    ///
    /// Default: 1.0. Must be finite and positive.
    pub discretization: f64,
}

impl StorageConfig {
    /// Default int sentinel.
    pub const DEFAULT_INT_SENTINEL: i32 = 0;

    /// Default double sentinel.
    pub const DEFAULT_DOUBLE_SENTINEL: f64 = 0.0;

    /// Default continuous bucket edge length.
    pub const DEFAULT_DISCRETIZATION: f64 = 1.0;

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), StorageError> {
        if !self.discretization.is_finite() || self.discretization <= 0.0 {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "discretization must be finite and > 0, got {}",
                    self.discretization
                ),
            });
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            int_sentinel: Self::DEFAULT_INT_SENTINEL,
            double_sentinel: Self::DEFAULT_DOUBLE_SENTINEL,
            remove_empty_bags: false,
            discretization: Self::DEFAULT_DISCRETIZATION,
        }
    }
}
