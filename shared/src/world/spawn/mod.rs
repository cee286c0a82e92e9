mod entity_scopes;
pub mod scene_entities;
pub mod spawn_config;
pub mod spawn_manager;
pub mod spawn_params;
