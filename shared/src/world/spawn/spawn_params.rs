use std::sync::Arc;

use crate::{EntityId, PeerId, TransformCheck, TypeKey, VisibilityCheck};

/// Everything needed to spawn a world entity on the network
pub struct SpawnParams<E> {
    pub world_entity: E,
    pub type_key: TypeKey,
    pub owner: Option<PeerId>,
    pub is_player_entity: bool,
    pub is_scene_entity: bool,
    pub destroy_with_scene: bool,
    /// Network parent. When None, the engine attachment of the world entity
    /// (if it maps to a spawned entity) is used instead.
    pub parent: Option<EntityId>,
    pub field_state: Option<Vec<u8>>,
    pub visibility: Option<VisibilityCheck>,
    pub include_transform: Option<TransformCheck>,
    pub always_replicate_as_root: bool,
}

impl<E> SpawnParams<E> {
    pub fn new(world_entity: E, type_key: TypeKey) -> Self {
        Self {
            world_entity,
            type_key,
            owner: None,
            is_player_entity: false,
            is_scene_entity: false,
            destroy_with_scene: false,
            parent: None,
            field_state: None,
            visibility: None,
            include_transform: None,
            always_replicate_as_root: false,
        }
    }

    pub fn owned_by(mut self, owner: PeerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Spawns as the player entity of `owner`
    pub fn player_of(mut self, owner: PeerId) -> Self {
        self.owner = Some(owner);
        self.is_player_entity = true;
        self
    }

    pub fn scene_entity(mut self) -> Self {
        self.is_scene_entity = true;
        self
    }

    pub fn destroy_with_scene(mut self) -> Self {
        self.destroy_with_scene = true;
        self
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_field_state(mut self, bytes: Vec<u8>) -> Self {
        self.field_state = Some(bytes);
        self
    }

    pub fn with_visibility<F: Fn(&PeerId) -> bool + Send + Sync + 'static>(mut self, check: F) -> Self {
        self.visibility = Some(Arc::new(check));
        self
    }

    pub fn with_transform_check<F: Fn(&PeerId) -> bool + Send + Sync + 'static>(
        mut self,
        check: F,
    ) -> Self {
        self.include_transform = Some(Arc::new(check));
        self
    }

    pub fn replicate_as_root(mut self) -> Self {
        self.always_replicate_as_root = true;
        self
    }
}
