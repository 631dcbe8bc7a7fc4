//! Cumulative halo field counters.

/// Counters for one [`HaloField`](crate::HaloField).
#[derive(Clone, Debug, Default)]
pub struct FieldMetrics {
    /// Completed halo refreshes.
    pub syncs: u64,
    /// Elements unpacked from neighbors across all refreshes.
    pub halo_elements_received: u64,
    /// Elements copied from the partition into its own wrapped halo.
    pub self_copied_elements: u64,
    /// Completed rebalances.
    pub rebalances: u64,
    /// Elements received from other ranks during rebalances.
    pub migrated_elements: u64,
}
