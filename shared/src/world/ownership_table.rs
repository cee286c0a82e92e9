use std::collections::HashMap;

use crate::{EntityId, PeerId};

/// Which entities each peer controls. Every entity lives in at most one
/// place: either one owner's collection, or one owner's player slot.
pub struct OwnershipTable {
    owned_entities: HashMap<PeerId, Vec<EntityId>>,
    player_entities: HashMap<PeerId, EntityId>,
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self {
            owned_entities: HashMap::new(),
            player_entities: HashMap::new(),
        }
    }

    /// Adds the entity to the owner's collection. Any previous placement of
    /// the entity (other owner, or a player slot) is removed first.
    pub fn add(&mut self, owner: &PeerId, entity: &EntityId) {
        self.remove_everywhere(entity);
        self.owned_entities.entry(*owner).or_default().push(*entity);
    }

    /// No-op if the owner does not hold the entity
    pub fn remove(&mut self, owner: &PeerId, entity: &EntityId) {
        let mut now_empty = false;
        if let Some(entities) = self.owned_entities.get_mut(owner) {
            entities.retain(|owned| owned != entity);
            now_empty = entities.is_empty();
        }
        if now_empty {
            self.owned_entities.remove(owner);
        }
    }

    /// Puts the entity in the owner's player slot. A different entity already
    /// in the slot is moved into the owner's collection and returned.
    pub fn set_player_entity(&mut self, owner: &PeerId, entity: &EntityId) -> Option<EntityId> {
        self.remove_everywhere(entity);
        let displaced = self
            .player_entities
            .insert(*owner, *entity)
            .filter(|previous| previous != entity);
        if let Some(previous) = displaced {
            self.owned_entities.entry(*owner).or_default().push(previous);
        }
        displaced
    }

    /// Clears the owner's player slot, only if it currently holds `entity`
    pub fn clear_player_entity(&mut self, owner: &PeerId, entity: &EntityId) {
        if self.player_entities.get(owner) == Some(entity) {
            self.player_entities.remove(owner);
        }
    }

    pub fn player_entity(&self, owner: &PeerId) -> Option<EntityId> {
        self.player_entities.get(owner).copied()
    }

    pub fn owned_entities(&self, owner: &PeerId) -> &[EntityId] {
        match self.owned_entities.get(owner) {
            Some(entities) => entities.as_slice(),
            None => &[],
        }
    }

    pub fn owns(&self, owner: &PeerId, entity: &EntityId) -> bool {
        self.owned_entities(owner).contains(entity) || self.player_entity(owner) == Some(*entity)
    }

    pub fn owner_of(&self, entity: &EntityId) -> Option<PeerId> {
        for (owner, player_entity) in self.player_entities.iter() {
            if player_entity == entity {
                return Some(*owner);
            }
        }
        for (owner, entities) in self.owned_entities.iter() {
            if entities.contains(entity) {
                return Some(*owner);
            }
        }
        None
    }

    /// Every entity referenced by the table, player slots included
    pub fn all_entities(&self) -> Vec<EntityId> {
        let mut output: Vec<EntityId> = self.player_entities.values().copied().collect();
        for entities in self.owned_entities.values() {
            output.extend(entities.iter().copied());
        }
        output
    }

    fn remove_everywhere(&mut self, entity: &EntityId) {
        self.player_entities.retain(|_, player_entity| player_entity != entity);
        self.owned_entities.retain(|_, entities| {
            entities.retain(|owned| owned != entity);
            !entities.is_empty()
        });
    }
}

impl Default for OwnershipTable {
    fn default() -> Self {
        Self::new()
    }
}
