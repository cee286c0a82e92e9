pub mod behaviour_ref;
pub mod entity_id;
pub mod entity_id_generator;
pub mod entity_record;
pub mod entity_registry;
pub mod error;
