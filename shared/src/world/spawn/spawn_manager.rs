use std::{fmt::Debug, hash::Hash, mem, time::Instant};

use log::{debug, info, warn};

use crate::{
    world::spawn::scene_entities::Placeholder, EntityId, EntityIdGenerator, EntityRecord,
    EntityRegistry, HostType, InstanceHandler, InstanceHandlers, LifecycleEvents,
    LifecycleMessage, ObserverTracker, OwnershipTable, ParentingResolver, PeerId, PrefabCatalog,
    SpawnConfig, SpawnError, SpawnMessage, SpawnParams, TypeKey, WorldMutType,
};

/// Coordinates the spawn / despawn / ownership lifecycle of replicated
/// entities on one host.
///
/// On the authority (`HostType::Server`) it originates lifecycle changes and
/// queues notifications for connected peers. On every other host it only
/// applies the notifications it receives, tolerating duplicates and
/// notifications for entities it no longer knows about.
///
/// All collections are mutated through `&mut self`, so a SpawnManager is the
/// single writer for its Registry, Ownership Table, Observer Tracker and
/// Parenting Resolver.
#[cfg_attr(feature = "bevy_support", derive(bevy_ecs::prelude::Resource))]
pub struct SpawnManager<E: Copy + Eq + Hash + Debug + Send + Sync + 'static> {
    pub(super) host_type: HostType,
    pub(super) local_peer: PeerId,
    pub(super) config: SpawnConfig,
    // Entities
    pub(super) id_generator: EntityIdGenerator,
    pub(super) registry: EntityRegistry<E>,
    pub(super) ownership: OwnershipTable,
    pub(super) observers: ObserverTracker,
    pub(super) parenting: ParentingResolver,
    pub(super) placeholders: Vec<Placeholder<E>>,
    // Construction
    pub(super) instance_handlers: InstanceHandlers<E>,
    pub(super) prefab_catalog: PrefabCatalog,
    // Peers
    pub(super) connected_peers: Vec<PeerId>,
    // Output
    pub(super) outgoing_messages: Vec<(PeerId, LifecycleMessage)>,
    pub(super) events: LifecycleEvents<E>,
}

impl<E: Copy + Eq + Hash + Debug + Send + Sync + 'static> SpawnManager<E> {
    pub fn new(host_type: HostType, local_peer: PeerId, config: SpawnConfig) -> Self {
        let id_generator = EntityIdGenerator::new(config.recycle_ids, config.id_recycle_delay);

        Self {
            host_type,
            local_peer,
            config,
            id_generator,
            registry: EntityRegistry::new(),
            ownership: OwnershipTable::new(),
            observers: ObserverTracker::new(),
            parenting: ParentingResolver::new(),
            placeholders: Vec::new(),
            instance_handlers: InstanceHandlers::new(),
            prefab_catalog: PrefabCatalog::new(),
            connected_peers: Vec::new(),
            outgoing_messages: Vec::new(),
            events: LifecycleEvents::new(),
        }
    }

    // Config & Collaborators

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn is_authority(&self) -> bool {
        self.host_type.is_authority()
    }

    pub fn local_peer(&self) -> PeerId {
        self.local_peer
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn prefab_catalog(&self) -> &PrefabCatalog {
        &self.prefab_catalog
    }

    pub fn prefab_catalog_mut(&mut self) -> &mut PrefabCatalog {
        &mut self.prefab_catalog
    }

    pub fn register_instance_handler(
        &mut self,
        type_key: TypeKey,
        handler: Box<dyn InstanceHandler<E>>,
    ) {
        if self.instance_handlers.register(type_key, handler).is_some() {
            warn!("Replaced the instance handler registered for {}", type_key);
        }
    }

    pub fn unregister_instance_handler(&mut self, type_key: &TypeKey) -> bool {
        self.instance_handlers.unregister(type_key).is_some()
    }

    pub fn has_instance_handler(&self, type_key: &TypeKey) -> bool {
        self.instance_handlers.has_handler(type_key)
    }

    // Queries

    pub fn registry(&self) -> &EntityRegistry<E> {
        &self.registry
    }

    pub fn ownership(&self) -> &OwnershipTable {
        &self.ownership
    }

    pub fn observers(&self) -> &ObserverTracker {
        &self.observers
    }

    pub fn parenting(&self) -> &ParentingResolver {
        &self.parenting
    }

    pub fn id_generator(&self) -> &EntityIdGenerator {
        &self.id_generator
    }

    pub fn entity(&self, entity: &EntityId) -> Option<&EntityRecord<E>> {
        self.registry.get(entity)
    }

    pub fn has_entity(&self, entity: &EntityId) -> bool {
        self.registry.contains(entity)
    }

    pub fn entity_id(&self, world_entity: &E) -> Option<EntityId> {
        self.registry.id_of(world_entity)
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns `(reparented_explicitly, parent)` for an entity with a network parent
    pub fn entity_parent(&self, entity: &EntityId) -> Option<(bool, EntityId)> {
        self.parenting.get_parent(entity)
    }

    /// Only the authority may look up the player entity of other peers
    pub fn player_entity(&self, peer: &PeerId) -> Result<Option<EntityId>, SpawnError> {
        if !self.is_authority() && *peer != self.local_peer {
            return Err(SpawnError::AuthorityViolation {
                operation: "look up the player entity of another peer",
            });
        }
        Ok(self.ownership.player_entity(peer))
    }

    pub fn local_player_entity(&self) -> Option<EntityId> {
        self.ownership.player_entity(&self.local_peer)
    }

    // Output

    pub fn outgoing_messages(&self) -> &[(PeerId, LifecycleMessage)] {
        &self.outgoing_messages
    }

    /// Drains the notifications queued for the transport
    pub fn take_outgoing_messages(&mut self) -> Vec<(PeerId, LifecycleMessage)> {
        mem::take(&mut self.outgoing_messages)
    }

    pub fn take_events(&mut self) -> LifecycleEvents<E> {
        mem::take(&mut self.events)
    }

    // Spawn

    /// Spawns a world entity on the network, allocating a new EntityId for it
    pub fn spawn<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        params: SpawnParams<E>,
    ) -> Result<EntityId, SpawnError> {
        self.spawn_at(world, params, &Instant::now())
    }

    pub fn spawn_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        params: SpawnParams<E>,
        now: &Instant,
    ) -> Result<EntityId, SpawnError> {
        self.check_authority("spawn entities")?;
        if self.registry.contains_world_entity(&params.world_entity) {
            return Err(SpawnError::AlreadySpawned {
                entity: format!("{:?}", params.world_entity),
            });
        }

        if params.is_player_entity {
            if let Some(owner) = params.owner {
                self.check_player_slot(&owner, None)?;
            }
        }

        let entity = self.id_generator.allocate(now);
        let reparented_explicitly = params.parent.is_some();
        if !self.spawn_locally(world, entity, params, reparented_explicitly)? {
            return Err(SpawnError::AlreadySpawned {
                entity: entity.to_string(),
            });
        }

        self.announce_spawn(&*world, &entity);

        Ok(entity)
    }

    /// Queues a spawn notification for every current observer of `entity`
    pub(super) fn announce_spawn<W: WorldMutType<E>>(&mut self, world: &W, entity: &EntityId) {
        for peer in self.observers.observers(entity) {
            if peer == self.local_peer {
                continue;
            }
            if let Some(message) = self.spawn_message_for(world, entity, &peer) {
                self.outgoing_messages
                    .push((peer, LifecycleMessage::Spawn(message)));
            }
        }
    }

    /// Creates the record for `entity` and links it into every collection.
    /// Returns Ok(false) without changing anything if the id is already spawned.
    pub(super) fn spawn_locally<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        entity: EntityId,
        params: SpawnParams<E>,
        reparented_explicitly: bool,
    ) -> Result<bool, SpawnError> {
        if self.registry.contains(&entity) {
            debug!("Ignoring duplicate spawn of {}", entity);
            return Ok(false);
        }
        let world_entity = params.world_entity;
        if self.registry.contains_world_entity(&world_entity) {
            return Err(SpawnError::AlreadySpawned {
                entity: format!("{:?}", world_entity),
            });
        }

        if self.config.enable_field_replication {
            if let Some(bytes) = &params.field_state {
                world.apply_snapshot(&world_entity, bytes);
            }
        }

        let mut record = EntityRecord::new(entity, world_entity, params.type_key);
        record.owner = params.owner;
        record.is_player_entity = params.is_player_entity;
        record.is_scene_entity = Some(params.is_scene_entity);
        record.destroy_with_scene = params.is_scene_entity || params.destroy_with_scene;
        record.spawned = true;
        record.always_replicate_as_root = params.always_replicate_as_root;
        record.include_transform = params.include_transform;
        self.registry.insert(record)?;

        // Ownership
        if let Some(owner) = params.owner {
            if params.is_player_entity {
                self.assign_player_slot(&owner, &entity);
            } else {
                self.ownership.add(&owner, &entity);
            }
        }

        // Observers
        if self.is_authority() {
            self.observers.insert_entity(&entity, params.visibility);
            self.observers.recompute(&entity, &self.connected_peers);
        }

        // Parenting
        match params.parent {
            Some(parent) => self.link_parent(world, &entity, parent, reparented_explicitly),
            None => {
                let engine_parent = world
                    .engine_parent(&world_entity)
                    .and_then(|parent_entity| self.registry.id_of(&parent_entity));
                if let Some(parent) = engine_parent {
                    if let Err(error) = self.parenting.set_parent(&entity, Some(parent), false) {
                        warn!("{}", error);
                    }
                }
            }
        }
        self.resolve_orphans(world);

        info!("Spawned {} ({:?})", entity, world_entity);
        self.events.push_spawn(entity, world_entity);

        Ok(true)
    }

    fn link_parent<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        child: &EntityId,
        parent: EntityId,
        reparented_explicitly: bool,
    ) {
        let (Some(child_entity), Some(parent_entity)) = (
            self.registry.world_entity_of(child),
            self.registry.world_entity_of(&parent),
        ) else {
            let error = SpawnError::UnresolvedParent {
                child: *child,
                parent,
            };
            warn!("{}", error);
            self.parenting
                .queue_orphan(child, &parent, reparented_explicitly);
            self.events.push_error(error);
            return;
        };

        match self
            .parenting
            .set_parent(child, Some(parent), reparented_explicitly)
        {
            Ok(()) => world.attach(&child_entity, &parent_entity),
            Err(error) => {
                warn!("{}", error);
                self.events.push_error(error);
            }
        }
    }

    fn resolve_orphans<W: WorldMutType<E>>(&mut self, world: &mut W) {
        let registry = &self.registry;
        let resolved = self
            .parenting
            .resolve_orphans(|parent| registry.contains(parent));
        for (child, parent) in resolved {
            let (Some(child_entity), Some(parent_entity)) = (
                self.registry.world_entity_of(&child),
                self.registry.world_entity_of(&parent),
            ) else {
                continue;
            };
            info!("Resolved parent {} of orphan {}", parent, child);
            world.attach(&child_entity, &parent_entity);
        }
    }

    // Reparent

    /// Sets or clears the network parent of a spawned entity
    pub fn reparent<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        child: &EntityId,
        parent_opt: Option<EntityId>,
    ) -> Result<(), SpawnError> {
        self.check_authority("reparent entities")?;
        let child_entity = self
            .registry
            .world_entity_of(child)
            .ok_or(SpawnError::NotSpawned { entity: *child })?;

        match parent_opt {
            Some(parent) => {
                let parent_entity = self
                    .registry
                    .world_entity_of(&parent)
                    .ok_or(SpawnError::NotSpawned { entity: parent })?;
                self.parenting.set_parent(child, Some(parent), true)?;
                world.attach(&child_entity, &parent_entity);
            }
            None => {
                self.parenting.set_parent(child, None, true)?;
                world.detach(&child_entity);
            }
        }
        Ok(())
    }

    // Despawn

    /// Despawns an entity, optionally destroying its engine object as well
    pub fn despawn<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        entity: &EntityId,
        destroy: bool,
    ) -> Result<(), SpawnError> {
        self.despawn_at(world, entity, destroy, &Instant::now())
    }

    pub fn despawn_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        entity: &EntityId,
        destroy: bool,
        now: &Instant,
    ) -> Result<(), SpawnError> {
        self.check_authority("despawn entities")?;
        if !self.registry.contains(entity) {
            return Err(SpawnError::NotSpawned { entity: *entity });
        }
        self.despawn_locally(world, entity, destroy, now);
        Ok(())
    }

    /// Returns false, changing nothing, if the entity is not spawned
    pub(super) fn despawn_locally<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        entity: &EntityId,
        destroy: bool,
        now: &Instant,
    ) -> bool {
        let Some(record) = self.registry.get(entity) else {
            debug!("Ignoring despawn of {}, it does not exist anymore", entity);
            return false;
        };
        let world_entity = record.world_entity();
        let type_key = record.type_key();
        let owner = record.owner();
        let is_player_entity = record.is_player_entity();

        // Move children to the root
        for child in self.parenting.detach_children(entity) {
            if let Some(child_entity) = self.registry.world_entity_of(&child) {
                world.detach(&child_entity);
            }
            warn!(
                "{} moved to the root because its parent {} is despawned",
                child, entity
            );
            self.events.push_parent_detach(child, *entity);
        }
        for orphan in self.parenting.drop_orphans_waiting_on(entity) {
            warn!(
                "Orphan {} will not be parented, its parent {} is despawned",
                orphan, entity
            );
        }

        // Ownership
        if let Some(owner) = owner {
            if is_player_entity {
                self.ownership.clear_player_entity(&owner, entity);
            } else {
                self.ownership.remove(&owner, entity);
            }
        }

        if let Some(record) = self.registry.get_mut(entity) {
            record.spawned = false;
        }
        info!("Despawned {} ({:?})", entity, world_entity);
        self.events.push_despawn(*entity, world_entity);

        if self.is_authority() {
            if self.id_generator.recycles_ids() {
                self.id_generator.release(*entity, now);
            }
            for peer in self.connected_peers.iter() {
                if *peer == self.local_peer {
                    continue;
                }
                self.outgoing_messages
                    .push((*peer, LifecycleMessage::Despawn(*entity)));
            }
        }

        self.registry.remove(entity);
        self.observers.remove_entity(entity);
        self.parenting.remove_entity(entity);

        if destroy {
            self.destroy_world_entity(world, &type_key, &world_entity);
        }

        true
    }

    pub(super) fn destroy_world_entity<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        type_key: &TypeKey,
        world_entity: &E,
    ) {
        if !self.instance_handlers.destroy(type_key, world_entity) {
            world.destroy(world_entity);
        }
    }

    // Ownership

    /// Transfers ownership of a spawned entity, or removes it with `None`
    pub fn change_ownership(
        &mut self,
        entity: &EntityId,
        new_owner: Option<PeerId>,
    ) -> Result<(), SpawnError> {
        self.check_authority("change ownership")?;
        let Some(record) = self.registry.get(entity) else {
            return Err(SpawnError::NotSpawned { entity: *entity });
        };
        if record.is_player_entity() {
            if let Some(new_owner) = new_owner {
                self.check_player_slot(&new_owner, Some(entity))?;
            }
        }

        self.apply_ownership(entity, new_owner);

        for peer in self.connected_peers.iter() {
            if *peer == self.local_peer {
                continue;
            }
            self.outgoing_messages
                .push((*peer, LifecycleMessage::OwnershipChange(*entity, new_owner)));
        }
        Ok(())
    }

    pub fn remove_ownership(&mut self, entity: &EntityId) -> Result<(), SpawnError> {
        self.change_ownership(entity, None)
    }

    fn apply_ownership(&mut self, entity: &EntityId, new_owner: Option<PeerId>) {
        let Some(record) = self.registry.get_mut(entity) else {
            return;
        };
        let previous_owner = record.owner;
        let is_player_entity = record.is_player_entity;
        record.owner = new_owner;

        if let Some(previous_owner) = previous_owner {
            if is_player_entity {
                self.ownership.clear_player_entity(&previous_owner, entity);
            } else {
                self.ownership.remove(&previous_owner, entity);
            }
        }
        if let Some(new_owner) = new_owner {
            if is_player_entity {
                self.assign_player_slot(&new_owner, entity);
            } else {
                self.ownership.add(&new_owner, entity);
            }
        }

        info!("Ownership of {} changed to {:?}", entity, new_owner);
        self.events.push_ownership_change(*entity, new_owner);
    }

    /// Fails if the owner's player slot holds a spawned entity other than `entity`
    fn check_player_slot(&self, owner: &PeerId, entity: Option<&EntityId>) -> Result<(), SpawnError> {
        match self.ownership.player_entity(owner) {
            Some(occupant) if Some(&occupant) != entity && self.registry.contains(&occupant) => {
                Err(SpawnError::PlayerSlotTaken {
                    owner: *owner,
                    entity: occupant,
                })
            }
            _ => Ok(()),
        }
    }

    /// Puts `entity` in the owner's player slot. An entity already there stays
    /// owned by the peer but is no longer its player entity.
    fn assign_player_slot(&mut self, owner: &PeerId, entity: &EntityId) {
        let Some(displaced) = self.ownership.set_player_entity(owner, entity) else {
            return;
        };
        if let Some(record) = self.registry.get_mut(&displaced) {
            record.is_player_entity = false;
        }
        warn!(
            "{} replaces {} as player entity of {}, which keeps ownership of it",
            entity, displaced, owner
        );
    }

    // Inbound

    /// Applies a lifecycle notification received from the authority
    pub fn receive_message<W: WorldMutType<E>>(&mut self, world: &mut W, message: LifecycleMessage) {
        self.receive_message_at(world, message, &Instant::now());
    }

    pub fn receive_message_at<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        message: LifecycleMessage,
        now: &Instant,
    ) {
        if self.is_authority() {
            warn!(
                "Authority ignores inbound {:?} notification for {}",
                message.get_type(),
                message.entity()
            );
            return;
        }

        match message {
            LifecycleMessage::Spawn(spawn) => self.receive_spawn(world, spawn),
            LifecycleMessage::Despawn(entity) => {
                self.despawn_locally(world, &entity, true, now);
            }
            LifecycleMessage::OwnershipChange(entity, new_owner) => {
                if self.registry.contains(&entity) {
                    self.apply_ownership(&entity, new_owner);
                } else {
                    debug!("Ignoring ownership change of unknown {}", entity);
                }
            }
        }
    }

    fn receive_spawn<W: WorldMutType<E>>(&mut self, world: &mut W, message: SpawnMessage) {
        if self.registry.contains(&message.entity_id) {
            debug!("Ignoring duplicate spawn of {}", message.entity_id);
            return;
        }

        let Some(world_entity) = self.create_local_entity(world, &message) else {
            let error = SpawnError::UnknownTypeKey {
                type_key: message.type_key,
            };
            warn!("Failed to spawn {}: {}", message.entity_id, error);
            self.events.push_error(error);
            return;
        };

        let reparented_explicitly = message.parenting.reparented_explicitly;
        let parent = if reparented_explicitly {
            message.parenting.latest_parent
        } else {
            message.parent
        };

        let mut params = SpawnParams::new(world_entity, message.type_key);
        params.owner = message.owner;
        params.is_player_entity = message.is_player_entity;
        params.is_scene_entity = message.is_scene_entity;
        params.parent = parent;
        params.field_state = message.field_state;

        if let Err(error) = self.spawn_locally(world, message.entity_id, params, reparented_explicitly) {
            warn!("Failed to spawn {}: {}", message.entity_id, error);
            self.events.push_error(error);
        }
    }

    /// Finds or builds the world entity an inbound spawn refers to
    fn create_local_entity<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        message: &SpawnMessage,
    ) -> Option<E> {
        if self.config.enable_scene_management && message.is_scene_entity {
            return self.take_scene_placeholder(&message.type_key);
        }

        if self.instance_handlers.has_handler(&message.type_key) {
            return self.instance_handlers.instantiate(
                &message.type_key,
                message.owner,
                message.transform.as_ref(),
            );
        }

        let prefab = self.prefab_catalog.resolve(&message.type_key)?;
        Some(world.instantiate(prefab, message.transform.as_ref()))
    }

    pub(super) fn check_authority(&self, operation: &'static str) -> Result<(), SpawnError> {
        if self.is_authority() {
            Ok(())
        } else {
            Err(SpawnError::AuthorityViolation { operation })
        }
    }
}
