//! Halo field construction parameters.

use mosaic_core::Rank;
use mosaic_space::EdgeBehavior;
use mosaic_storage::StorageConfig;

use crate::error::FieldError;

/// Configuration for a [`HaloField`](crate::HaloField).
///
/// Every rank must pass an identical config; the neighbor overlaps and the
/// coloring are computed locally from it.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    /// Halo width in cells. Default: 1.
    ///
    /// Every partition extent must be at least `2 * aoi`.
    pub aoi: i32,
    /// What happens at the world boundary. Default: [`EdgeBehavior::Absorb`].
    pub edge: EdgeBehavior,
    /// Rank that owns the world-shaped storage in
    /// [`collect`](crate::HaloField::collect) and
    /// [`distribute`](crate::HaloField::distribute). Default: rank 0.
    pub root: Rank,
    /// Bucket edge length for continuous fields. Default: 1.0.
    pub discretization: f64,
}

impl FieldConfig {
    /// Default halo width.
    pub const DEFAULT_AOI: i32 = 1;

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.aoi < 0 {
            return Err(FieldError::InvalidConfig {
                reason: format!("aoi must be >= 0, got {}", self.aoi),
            });
        }
        self.storage_config().validate()?;
        Ok(())
    }

    /// Storage parameters derived from this config.
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            discretization: self.discretization,
            ..StorageConfig::default()
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            aoi: Self::DEFAULT_AOI,
            edge: EdgeBehavior::Absorb,
            root: Rank(0),
            discretization: StorageConfig::DEFAULT_DISCRETIZATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_storage::StorageError;

    #[test]
    fn default_is_valid() {
        let c = FieldConfig::default();
        assert_eq!(c.aoi, 1);
        assert_eq!(c.root, Rank(0));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn negative_aoi_rejected() {
        let c = FieldConfig {
            aoi: -1,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(FieldError::InvalidConfig { .. })));
    }

    #[test]
    fn bad_discretization_surfaces_as_storage_error() {
        let c = FieldConfig {
            discretization: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(FieldError::Storage(StorageError::InvalidConfig { .. }))
        ));
    }
}
