pub mod orphan_waitlist;
pub mod parenting_resolver;
