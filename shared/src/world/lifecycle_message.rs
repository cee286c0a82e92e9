use crate::{EntityId, PeerId, TypeKey};

/// Position & euler rotation of an entity at the moment it was spawned.
/// The engine owns the transform, this is only a copy taken for replication.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TransformSnapshot {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl TransformSnapshot {
    pub fn new(position: [f32; 3], rotation: [f32; 3]) -> Self {
        Self { position, rotation }
    }
}

/// The latest network parenting state of an entity, as opposed to the parent
/// it was attached to in the engine when it was spawned
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NetworkParenting {
    pub reparented_explicitly: bool,
    pub latest_parent: Option<EntityId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnMessage {
    pub is_player_entity: bool,
    pub entity_id: EntityId,
    pub owner: Option<PeerId>,
    pub parent: Option<EntityId>,
    pub is_scene_entity: bool,
    pub type_key: TypeKey,
    pub transform: Option<TransformSnapshot>,
    pub parenting: NetworkParenting,
    pub field_state: Option<Vec<u8>>,
}

impl SpawnMessage {
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }
}

// Lifecycle notifications exchanged between the authority and its observers
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleMessage {
    Spawn(SpawnMessage),
    Despawn(EntityId),
    OwnershipChange(EntityId, Option<PeerId>),
}

impl LifecycleMessage {
    pub fn entity(&self) -> EntityId {
        match self {
            Self::Spawn(message) => message.entity_id,
            Self::Despawn(entity) => *entity,
            Self::OwnershipChange(entity, _) => *entity,
        }
    }

    pub fn get_type(&self) -> LifecycleMessageType {
        match self {
            Self::Spawn(_) => LifecycleMessageType::Spawn,
            Self::Despawn(_) => LifecycleMessageType::Despawn,
            Self::OwnershipChange(_, _) => LifecycleMessageType::OwnershipChange,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum LifecycleMessageType {
    // An Entity to be created
    Spawn,
    // An Entity to be deleted
    Despawn,
    // An Entity's owner has changed
    OwnershipChange,
}
