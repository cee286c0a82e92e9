use std::mem;

use crate::{EntityId, PeerId, SpawnError};

/// Hooks for surrounding game logic, collected during a SpawnManager call and
/// drained with `SpawnManager::take_events`
pub struct LifecycleEvents<E: Copy> {
    spawns: Vec<(EntityId, E)>,
    despawns: Vec<(EntityId, E)>,
    ownership_changes: Vec<(EntityId, Option<PeerId>)>,
    parent_detaches: Vec<(EntityId, EntityId)>,
    errors: Vec<SpawnError>,
    empty: bool,
}

impl<E: Copy> LifecycleEvents<E> {
    pub fn new() -> Self {
        Self {
            spawns: Vec::new(),
            despawns: Vec::new(),
            ownership_changes: Vec::new(),
            parent_detaches: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Entities whose behaviours were spawned
    pub fn spawns(&self) -> &[(EntityId, E)] {
        &self.spawns
    }

    /// Entities whose behaviours were despawned
    pub fn despawns(&self) -> &[(EntityId, E)] {
        &self.despawns
    }

    pub fn ownership_changes(&self) -> &[(EntityId, Option<PeerId>)] {
        &self.ownership_changes
    }

    /// `(child, former parent)` pairs moved to the root because the parent despawned
    pub fn parent_detaches(&self) -> &[(EntityId, EntityId)] {
        &self.parent_detaches
    }

    /// Anomalies in inbound notifications which were tolerated
    pub fn errors(&self) -> &[SpawnError] {
        &self.errors
    }

    pub fn take_spawns(&mut self) -> Vec<(EntityId, E)> {
        mem::take(&mut self.spawns)
    }

    pub fn take_despawns(&mut self) -> Vec<(EntityId, E)> {
        mem::take(&mut self.despawns)
    }

    pub fn take_errors(&mut self) -> Vec<SpawnError> {
        mem::take(&mut self.errors)
    }

    // Crate-public

    pub(crate) fn push_spawn(&mut self, entity: EntityId, world_entity: E) {
        self.spawns.push((entity, world_entity));
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, entity: EntityId, world_entity: E) {
        self.despawns.push((entity, world_entity));
        self.empty = false;
    }

    pub(crate) fn push_ownership_change(&mut self, entity: EntityId, owner: Option<PeerId>) {
        self.ownership_changes.push((entity, owner));
        self.empty = false;
    }

    pub(crate) fn push_parent_detach(&mut self, child: EntityId, parent: EntityId) {
        self.parent_detaches.push((child, parent));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: SpawnError) {
        self.errors.push(error);
        self.empty = false;
    }
}

impl<E: Copy> Default for LifecycleEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}
