use std::{collections::HashMap, fmt::Debug, hash::Hash};

use crate::{world::entity::entity_record::EntityRecord, EntityId, SpawnError};

/// Every currently spawned entity, addressable by EntityId or by world entity.
/// Iteration follows spawn order.
pub struct EntityRegistry<E: Copy + Eq + Hash> {
    records: HashMap<EntityId, EntityRecord<E>>,
    world_to_id: HashMap<E, EntityId>,
    spawn_order: Vec<EntityId>,
}

impl<E: Copy + Eq + Hash + Debug> EntityRegistry<E> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            world_to_id: HashMap::new(),
            spawn_order: Vec::new(),
        }
    }

    pub fn insert(&mut self, record: EntityRecord<E>) -> Result<(), SpawnError> {
        let id = record.id();
        let world_entity = record.world_entity();
        if self.records.contains_key(&id) {
            return Err(SpawnError::AlreadySpawned {
                entity: id.to_string(),
            });
        }
        if self.world_to_id.contains_key(&world_entity) {
            return Err(SpawnError::AlreadySpawned {
                entity: format!("{:?}", world_entity),
            });
        }

        self.world_to_id.insert(world_entity, id);
        self.records.insert(id, record);
        self.spawn_order.push(id);
        Ok(())
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<EntityRecord<E>> {
        let record = self.records.remove(id)?;
        self.world_to_id.remove(&record.world_entity());
        self.spawn_order.retain(|other| other != id);
        Some(record)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    pub fn contains_world_entity(&self, world_entity: &E) -> bool {
        self.world_to_id.contains_key(world_entity)
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityRecord<E>> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &EntityId) -> Option<&mut EntityRecord<E>> {
        self.records.get_mut(id)
    }

    pub fn id_of(&self, world_entity: &E) -> Option<EntityId> {
        self.world_to_id.get(world_entity).copied()
    }

    pub fn world_entity_of(&self, id: &EntityId) -> Option<E> {
        self.records.get(id).map(|record| record.world_entity())
    }

    /// EntityIds in the order they were spawned
    pub fn ids(&self) -> Vec<EntityId> {
        self.spawn_order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord<E>> {
        self.spawn_order
            .iter()
            .filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<E: Copy + Eq + Hash + Debug> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
