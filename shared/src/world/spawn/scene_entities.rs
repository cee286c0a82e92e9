use std::{fmt::Debug, hash::Hash, time::Instant};

use log::{info, warn};

use crate::{EntityId, SpawnError, SpawnManager, SpawnParams, TypeKey, WorldMutType};

/// A world entity the SpawnManager knows about but which is not spawned on
/// the network, typically placed by a scene load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placeholder<E> {
    pub world_entity: E,
    pub type_key: TypeKey,
    pub is_scene_entity: Option<bool>,
}

impl<E: Copy + Eq + Hash + Debug + Send + Sync + 'static> SpawnManager<E> {
    // Placeholders

    /// Makes a local, not yet spawned world entity known to the SpawnManager
    pub fn register_placeholder(
        &mut self,
        world_entity: E,
        type_key: TypeKey,
        is_scene_entity: Option<bool>,
    ) -> Result<(), SpawnError> {
        let already_known = self.registry.contains_world_entity(&world_entity)
            || self
                .placeholders
                .iter()
                .any(|placeholder| placeholder.world_entity == world_entity);
        if already_known {
            return Err(SpawnError::AlreadySpawned {
                entity: format!("{:?}", world_entity),
            });
        }

        self.placeholders.push(Placeholder {
            world_entity,
            type_key,
            is_scene_entity,
        });
        Ok(())
    }

    pub fn placeholders(&self) -> &[Placeholder<E>] {
        &self.placeholders
    }

    /// Takes the first scene-placed placeholder of this type, which an inbound
    /// scene entity spawn then adopts
    pub(super) fn take_scene_placeholder(&mut self, type_key: &TypeKey) -> Option<E> {
        let index = self.placeholders.iter().position(|placeholder| {
            placeholder.type_key == *type_key && placeholder.is_scene_entity != Some(false)
        });
        match index {
            Some(index) => Some(self.placeholders.remove(index).world_entity),
            None => {
                warn!("No scene placed entity found for {}", type_key);
                None
            }
        }
    }

    // Scene transitions

    /// Prepares scene entities to be placed again by the next scene load,
    /// without telling any peer. Returns the EntityIds that were reset.
    ///
    /// Children which stay spawned are moved to the root. Attachments between
    /// two reset entities are kept, the scene places them together again.
    pub fn reset_scene_entities_for_reuse<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
    ) -> Result<Vec<EntityId>, SpawnError> {
        self.check_authority("reset scene entities")?;

        let targets = self.scene_bound_entities();

        for entity in targets.iter() {
            let Some(record) = self.registry.get_mut(entity) else {
                continue;
            };
            record.spawned = false;
            record.destroy_with_scene = false;
            record.is_scene_entity = None;

            let world_entity = record.world_entity();
            let type_key = record.type_key();
            if let Some(owner) = record.owner() {
                self.ownership.remove(&owner, entity);
                self.ownership.clear_player_entity(&owner, entity);
            }

            for child in self.parenting.detach_children(entity) {
                if targets.contains(&child) {
                    continue;
                }
                if let Some(child_entity) = self.registry.world_entity_of(&child) {
                    world.detach(&child_entity);
                }
                warn!(
                    "{} moved to the root because its parent {} is reset for reuse",
                    child, entity
                );
                self.events.push_parent_detach(child, *entity);
            }
            self.parenting.drop_orphans_waiting_on(entity);
            self.parenting.remove_entity(entity);
            self.observers.remove_entity(entity);
            self.registry.remove(entity);

            self.placeholders.push(Placeholder {
                world_entity,
                type_key,
                is_scene_entity: None,
            });
        }

        info!("Reset {} scene entities for reuse", targets.len());
        Ok(targets)
    }

    /// Despawns & destroys every spawned entity placed by a scene or marked
    /// `destroy_with_scene`, as a scene switch does. Returns how many were
    /// destroyed.
    pub fn destroy_spawned_scene_entities<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
    ) -> Result<usize, SpawnError> {
        self.destroy_spawned_scene_entities_at(world, &Instant::now())
    }

    pub fn destroy_spawned_scene_entities_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        now: &Instant,
    ) -> Result<usize, SpawnError> {
        self.check_authority("destroy spawned scene entities")?;

        let targets = self.scene_bound_entities();
        for entity in targets.iter() {
            self.despawn_locally(world, entity, true, now);
        }

        info!("Destroyed {} spawned scene entities", targets.len());
        Ok(targets.len())
    }

    /// Destroys every known entity placed by a scene, or not yet classified.
    /// Returns how many world entities were destroyed.
    pub fn destroy_scene_entities<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
    ) -> Result<usize, SpawnError> {
        self.destroy_scene_entities_at(world, &Instant::now())
    }

    pub fn destroy_scene_entities_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        now: &Instant,
    ) -> Result<usize, SpawnError> {
        self.check_authority("destroy scene entities")?;
        Ok(self.destroy_partition(world, now, |classification| classification != Some(false)))
    }

    /// Destroys every known entity which was spawned dynamically
    pub fn destroy_non_scene_entities<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
    ) -> Result<usize, SpawnError> {
        self.destroy_non_scene_entities_at(world, &Instant::now())
    }

    pub fn destroy_non_scene_entities_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        now: &Instant,
    ) -> Result<usize, SpawnError> {
        self.check_authority("destroy non-scene entities")?;
        Ok(self.destroy_partition(world, now, |classification| classification == Some(false)))
    }

    /// Spawned entities that go away with their scene, in spawn order
    fn scene_bound_entities(&self) -> Vec<EntityId> {
        self.registry
            .iter()
            .filter(|record| {
                record.is_spawned()
                    && (record.is_scene_entity() == Some(true) || record.destroy_with_scene())
            })
            .map(|record| record.id())
            .collect()
    }

    fn destroy_partition<W: WorldMutType<E>, F: Fn(Option<bool>) -> bool>(
        &mut self,
        world: &mut W,
        now: &Instant,
        selected: F,
    ) -> usize {
        let spawned: Vec<(EntityId, E, TypeKey)> = self
            .registry
            .iter()
            .filter(|record| selected(record.is_scene_entity()))
            .map(|record| (record.id(), record.world_entity(), record.type_key()))
            .collect();

        let mut local_only = Vec::new();
        self.placeholders.retain(|placeholder| {
            if selected(placeholder.is_scene_entity) {
                local_only.push((placeholder.world_entity, placeholder.type_key));
                return false;
            }
            true
        });

        for (entity, world_entity, type_key) in spawned.iter() {
            self.despawn_locally(world, entity, false, now);
            self.destroy_world_entity(world, type_key, world_entity);
        }
        for (world_entity, type_key) in local_only.iter() {
            self.destroy_world_entity(world, type_key, world_entity);
        }

        spawned.len() + local_only.len()
    }

    /// Spawns every placeholder whose classification is still unresolved as a
    /// scene entity with a fresh EntityId. Observers adopt their own copy of
    /// the scene entity when the spawn reaches them.
    pub fn spawn_scene_entities_on_start<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
    ) -> Result<Vec<EntityId>, SpawnError> {
        self.spawn_scene_entities_on_start_at(world, &Instant::now())
    }

    pub fn spawn_scene_entities_on_start_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        now: &Instant,
    ) -> Result<Vec<EntityId>, SpawnError> {
        self.check_authority("spawn scene entities")?;

        let mut pending = Vec::new();
        self.placeholders.retain(|placeholder| {
            if placeholder.is_scene_entity.is_none() {
                pending.push(*placeholder);
                return false;
            }
            true
        });

        let mut spawned = Vec::new();
        for placeholder in pending {
            let entity = self.id_generator.allocate(now);
            let params = SpawnParams::new(placeholder.world_entity, placeholder.type_key)
                .scene_entity()
                .destroy_with_scene();
            match self.spawn_locally(world, entity, params, false) {
                Ok(true) => spawned.push(entity),
                Ok(false) => {}
                Err(error) => warn!("Failed to spawn scene entity: {}", error),
            }
        }

        for entity in self.order_parents_first(&*world, &spawned) {
            self.announce_spawn(&*world, &entity);
        }
        Ok(spawned)
    }
}
