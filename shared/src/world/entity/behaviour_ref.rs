use std::{fmt::Debug, hash::Hash};

use crate::{EntityId, EntityRegistry};

/// A network-safe reference to one behaviour (by index) on a replicated entity.
///
/// Ids are recycled after a while, so a reference held for longer than the
/// recycle delay may resolve to a different entity than the one it was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BehaviourRef {
    entity: EntityId,
    behaviour_index: u16,
}

impl BehaviourRef {
    pub fn new(entity: EntityId, behaviour_index: u16) -> Self {
        Self {
            entity,
            behaviour_index,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn behaviour_index(&self) -> u16 {
        self.behaviour_index
    }

    /// Returns the world entity & behaviour index, or None if the referenced
    /// entity has not been spawned (yet). Try again later in that case.
    pub fn try_get<E: Copy + Eq + Hash + Debug>(
        &self,
        registry: &EntityRegistry<E>,
    ) -> Option<(E, u16)> {
        registry
            .world_entity_of(&self.entity)
            .map(|world_entity| (world_entity, self.behaviour_index))
    }
}
