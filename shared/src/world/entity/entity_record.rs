use std::sync::Arc;

use crate::{EntityId, PeerId, TypeKey};

/// Decides, per receiving peer, whether a spawn message carries a transform snapshot
pub type TransformCheck = Arc<dyn Fn(&PeerId) -> bool + Send + Sync>;

pub struct EntityRecord<E: Copy> {
    id: EntityId,
    world_entity: E,
    type_key: TypeKey,
    pub(crate) owner: Option<PeerId>,
    pub(crate) is_player_entity: bool,
    pub(crate) is_scene_entity: Option<bool>,
    pub(crate) destroy_with_scene: bool,
    pub(crate) spawned: bool,
    pub(crate) always_replicate_as_root: bool,
    pub(crate) include_transform: Option<TransformCheck>,
}

impl<E: Copy> EntityRecord<E> {
    pub fn new(id: EntityId, world_entity: E, type_key: TypeKey) -> Self {
        Self {
            id,
            world_entity,
            type_key,
            owner: None,
            is_player_entity: false,
            is_scene_entity: None,
            destroy_with_scene: false,
            spawned: false,
            always_replicate_as_root: false,
            include_transform: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn world_entity(&self) -> E {
        self.world_entity
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    pub fn is_player_entity(&self) -> bool {
        self.is_player_entity
    }

    pub fn is_scene_entity(&self) -> Option<bool> {
        self.is_scene_entity
    }

    pub fn destroy_with_scene(&self) -> bool {
        self.destroy_with_scene
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    pub fn always_replicate_as_root(&self) -> bool {
        self.always_replicate_as_root
    }

    /// Whether a spawn message sent to `peer` should include the transform
    pub fn includes_transform_for(&self, peer: &PeerId) -> bool {
        match &self.include_transform {
            Some(check) => check(peer),
            None => true,
        }
    }

    pub fn is_owned_by(&self, peer: &PeerId) -> bool {
        self.owner.as_ref() == Some(peer)
    }
}
