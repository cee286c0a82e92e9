//! # Replica Shared
//! Replicated entity lifecycle shared between an authority & its observers:
//! identifier allocation, the entity registry, ownership, observer scopes,
//! network parenting, and the SpawnManager that keeps all of them consistent.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod types;
mod world;

pub use types::{HostType, PeerId};
pub use world::{
    entity::{
        behaviour_ref::BehaviourRef,
        entity_id::{EntityId, TypeKey},
        entity_id_generator::{EntityIdGenerator, ReleasedId},
        entity_record::{EntityRecord, TransformCheck},
        entity_registry::EntityRegistry,
        error::SpawnError,
    },
    instance_handler::{InstanceHandler, InstanceHandlers},
    lifecycle_events::LifecycleEvents,
    lifecycle_message::{
        LifecycleMessage, LifecycleMessageType, NetworkParenting, SpawnMessage, TransformSnapshot,
    },
    ownership_table::OwnershipTable,
    parenting::{
        orphan_waitlist::{Orphan, OrphanWaitlist},
        parenting_resolver::{parents_first, ParentingResolver},
    },
    prefab_catalog::{PrefabCatalog, PrefabId, PrefabOverride},
    scope::{
        observer_tracker::{ObserverTracker, ScopeChange},
        scope_event::{ScopeEvent, VisibilityCheck},
    },
    spawn::{
        scene_entities::Placeholder, spawn_config::SpawnConfig, spawn_manager::SpawnManager,
        spawn_params::SpawnParams,
    },
    world_type::WorldMutType,
};
