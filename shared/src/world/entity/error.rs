use thiserror::Error as ThisError;

use crate::{EntityId, PeerId, TypeKey};

/// Errors that can occur while spawning, despawning, reparenting or
/// transferring ownership of replicated entities
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum SpawnError {
    /// A non-authoritative host attempted an authority-only operation
    #[error("Authority violation: only the authority may {operation}")]
    AuthorityViolation {
        operation: &'static str,
    },

    /// Entity (or world entity handle) is already spawned
    #[error("Entity already spawned: {entity}")]
    AlreadySpawned {
        entity: String,
    },

    /// Entity is not currently spawned
    #[error("Entity not spawned: {entity}")]
    NotSpawned {
        entity: EntityId,
    },

    /// A spawn referenced a parent which is not known locally (yet)
    #[error("Parent {parent} of {child} is not spawned, child queued until it is")]
    UnresolvedParent {
        child: EntityId,
        parent: EntityId,
    },

    /// No prefab, scene placeholder or instance handler exists for the type key
    #[error("No prefab or instance handler registered for {type_key}")]
    UnknownTypeKey {
        type_key: TypeKey,
    },

    /// Reparenting would create a cycle in the network parent graph
    #[error("Setting {parent} as parent of {child} would create a cycle")]
    ParentCycle {
        child: EntityId,
        parent: EntityId,
    },

    /// The owner's player slot already holds a different spawned entity
    #[error("{owner} already has a player entity: {entity}")]
    PlayerSlotTaken {
        owner: PeerId,
        entity: EntityId,
    },
}
