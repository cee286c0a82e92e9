pub mod observer_tracker;
pub mod scope_event;
