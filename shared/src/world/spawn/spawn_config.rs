use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the SpawnManager
#[derive(Clone, Debug)]
pub struct SpawnConfig {
    /// Whether despawned EntityIds are handed out again
    pub recycle_ids: bool,
    /// How long a released EntityId must wait before it can be reused.
    /// Keep this longer than the worst round trip so late notifications
    /// cannot hit a recycled id.
    pub id_recycle_delay: Duration,
    /// Whether inbound spawns of scene entities are matched against locally
    /// placed scene entities instead of being instantiated
    pub enable_scene_management: bool,
    /// Whether field snapshots are applied / emitted at spawn time
    pub enable_field_replication: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            recycle_ids: true,
            id_recycle_delay: Duration::from_secs(120),
            enable_scene_management: true,
            enable_field_replication: true,
        }
    }
}
