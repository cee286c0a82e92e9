use std::sync::Arc;

use crate::{EntityId, PeerId};

/// Decides whether a peer may observe an entity. Entities spawned without one
/// are visible to every connected peer.
pub type VisibilityCheck = Arc<dyn Fn(&PeerId) -> bool + Send + Sync>;

/// Inputs which can change the set of peers observing an entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeEvent {
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    VisibilityInvalidated(EntityId),
}
