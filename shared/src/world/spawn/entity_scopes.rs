use std::{fmt::Debug, hash::Hash};

use log::{debug, info};

use crate::{
    parents_first, EntityId, LifecycleMessage, NetworkParenting, PeerId, ScopeEvent, SpawnError,
    SpawnManager, SpawnMessage, VisibilityCheck, WorldMutType,
};

impl<E: Copy + Eq + Hash + Debug + Send + Sync + 'static> SpawnManager<E> {
    pub fn connected_peers(&self) -> &[PeerId] {
        &self.connected_peers
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.connected_peers.contains(peer)
    }

    /// Applies a peer connection change or visibility invalidation.
    ///
    /// A connecting peer only becomes an observer of existing entities
    /// through this call; spawns for those entities are queued for it here.
    pub fn handle_scope_event<W: WorldMutType<E>>(&mut self, world: &W, event: ScopeEvent) {
        match event {
            ScopeEvent::PeerConnected(peer) => self.peer_connected(world, peer),
            ScopeEvent::PeerDisconnected(peer) => self.peer_disconnected(&peer),
            ScopeEvent::VisibilityInvalidated(entity) => self.invalidate_visibility(world, &entity),
        }
    }

    /// Replaces the visibility check of a spawned entity. Takes effect on the
    /// next `ScopeEvent::VisibilityInvalidated` for the entity.
    pub fn set_visibility_check(
        &mut self,
        entity: &EntityId,
        check: Option<VisibilityCheck>,
    ) -> Result<(), SpawnError> {
        self.check_authority("change entity visibility")?;
        if !self.registry.contains(entity) {
            return Err(SpawnError::NotSpawned { entity: *entity });
        }
        self.observers.set_visibility_check(entity, check);
        Ok(())
    }

    fn peer_connected<W: WorldMutType<E>>(&mut self, world: &W, peer: PeerId) {
        if self.connected_peers.contains(&peer) {
            debug!("{} is already connected", peer);
            return;
        }
        self.connected_peers.push(peer);
        self.connected_peers.sort();
        info!("{} connected", peer);

        if !self.is_authority() {
            return;
        }

        let mut newly_observed = Vec::new();
        for entity in self.registry.ids() {
            if self.observers.recompute_peer(&entity, &peer) {
                newly_observed.push(entity);
            }
        }
        if peer == self.local_peer {
            return;
        }

        // a reparent can make an earlier spawned entity the child of a later one
        for entity in self.order_parents_first(world, &newly_observed) {
            if let Some(message) = self.spawn_message_for(world, &entity, &peer) {
                self.outgoing_messages
                    .push((peer, LifecycleMessage::Spawn(message)));
            }
        }
    }

    fn peer_disconnected(&mut self, peer: &PeerId) {
        self.connected_peers.retain(|connected| connected != peer);
        self.observers.remove_peer(peer);
        info!("{} disconnected", peer);
    }

    fn invalidate_visibility<W: WorldMutType<E>>(&mut self, world: &W, entity: &EntityId) {
        if !self.is_authority() {
            debug!("Ignoring visibility invalidation of {} on a non-authority", entity);
            return;
        }
        let change = self.observers.recompute(entity, &self.connected_peers);

        for peer in change.added {
            if peer == self.local_peer {
                continue;
            }
            if let Some(message) = self.spawn_message_for(world, entity, &peer) {
                self.outgoing_messages
                    .push((peer, LifecycleMessage::Spawn(message)));
            }
        }
        for peer in change.removed {
            if peer == self.local_peer {
                continue;
            }
            self.outgoing_messages
                .push((peer, LifecycleMessage::Despawn(*entity)));
        }
    }

    /// Orders entities so that each spawn notification follows the one of the
    /// parent it references
    pub(super) fn order_parents_first<W: WorldMutType<E>>(
        &self,
        world: &W,
        entities: &[EntityId],
    ) -> Vec<EntityId> {
        parents_first(entities, |entity| self.replicated_parent(world, entity))
    }

    /// The parent an observer attaches `entity` to when it receives its spawn
    fn replicated_parent<W: WorldMutType<E>>(&self, world: &W, entity: &EntityId) -> Option<EntityId> {
        if let Some((true, parent)) = self.parenting.get_parent(entity) {
            return Some(parent);
        }
        self.transform_parent(world, entity)
    }

    /// The engine attachment of `entity`, unless it always replicates as a root
    fn transform_parent<W: WorldMutType<E>>(&self, world: &W, entity: &EntityId) -> Option<EntityId> {
        let record = self.registry.get(entity)?;
        if record.always_replicate_as_root() {
            return None;
        }
        world
            .engine_parent(&record.world_entity())
            .and_then(|parent_entity| self.registry.id_of(&parent_entity))
    }

    /// Builds the spawn notification of an entity as `peer` should receive it
    pub fn spawn_message_for<W: WorldMutType<E>>(
        &self,
        world: &W,
        entity: &EntityId,
        peer: &PeerId,
    ) -> Option<SpawnMessage> {
        let record = self.registry.get(entity)?;
        let world_entity = record.world_entity();

        let parent = self.transform_parent(world, entity);

        let parenting = match self.parenting.get_parent(entity) {
            Some((reparented_explicitly, latest_parent)) => NetworkParenting {
                reparented_explicitly,
                latest_parent: Some(latest_parent),
            },
            None => NetworkParenting::default(),
        };

        let transform = if record.includes_transform_for(peer) {
            world.transform(&world_entity)
        } else {
            None
        };

        let field_state = if self.config.enable_field_replication {
            Some(world.emit_snapshot(&world_entity, peer))
        } else {
            None
        };

        Some(SpawnMessage {
            is_player_entity: record.is_player_entity(),
            entity_id: *entity,
            owner: record.owner(),
            parent,
            is_scene_entity: record.is_scene_entity().unwrap_or(true),
            type_key: record.type_key(),
            transform,
            parenting,
            field_state,
        })
    }
}
