pub mod entity;
pub mod instance_handler;
pub mod lifecycle_events;
pub mod lifecycle_message;
pub mod ownership_table;
pub mod parenting;
pub mod prefab_catalog;
pub mod scope;
pub mod spawn;
pub mod world_type;
