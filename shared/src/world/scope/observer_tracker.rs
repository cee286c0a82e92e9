use std::collections::{HashMap, HashSet};

use crate::{EntityId, PeerId, VisibilityCheck};

/// Result of re-evaluating an entity's observers
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScopeChange {
    pub added: Vec<PeerId>,
    pub removed: Vec<PeerId>,
}

impl ScopeChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Tracks, per entity, which peers are entitled to receive its replication
/// traffic and the visibility check that decides it
pub struct ObserverTracker {
    observers: HashMap<EntityId, HashSet<PeerId>>,
    visibility_checks: HashMap<EntityId, VisibilityCheck>,
}

impl ObserverTracker {
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
            visibility_checks: HashMap::new(),
        }
    }

    /// Starts tracking an entity with no observers yet
    pub fn insert_entity(&mut self, entity: &EntityId, check: Option<VisibilityCheck>) {
        self.observers.entry(*entity).or_default();
        match check {
            Some(check) => {
                self.visibility_checks.insert(*entity, check);
            }
            None => {
                self.visibility_checks.remove(entity);
            }
        }
    }

    pub fn has_entity(&self, entity: &EntityId) -> bool {
        self.observers.contains_key(entity)
    }

    pub fn set_visibility_check(&mut self, entity: &EntityId, check: Option<VisibilityCheck>) {
        if !self.observers.contains_key(entity) {
            return;
        }
        match check {
            Some(check) => {
                self.visibility_checks.insert(*entity, check);
            }
            None => {
                self.visibility_checks.remove(entity);
            }
        }
    }

    pub fn is_visible_to(&self, entity: &EntityId, peer: &PeerId) -> bool {
        match self.visibility_checks.get(entity) {
            Some(check) => check(peer),
            None => true,
        }
    }

    pub fn observers(&self, entity: &EntityId) -> Vec<PeerId> {
        let Some(peers) = self.observers.get(entity) else {
            return Vec::new();
        };
        let mut output: Vec<PeerId> = peers.iter().copied().collect();
        output.sort();
        output
    }

    pub fn is_observer(&self, entity: &EntityId, peer: &PeerId) -> bool {
        self.observers
            .get(entity)
            .map(|peers| peers.contains(peer))
            .unwrap_or(false)
    }

    /// Re-evaluates the entity's visibility check against `peers`, which
    /// replaces the observer set entirely
    pub fn recompute(&mut self, entity: &EntityId, peers: &[PeerId]) -> ScopeChange {
        let mut change = ScopeChange::default();
        if !self.observers.contains_key(entity) {
            return change;
        }

        let visible: HashSet<PeerId> = peers
            .iter()
            .filter(|peer| self.is_visible_to(entity, peer))
            .copied()
            .collect();

        let Some(current) = self.observers.get_mut(entity) else {
            return change;
        };
        for peer in visible.iter() {
            if !current.contains(peer) {
                change.added.push(*peer);
            }
        }
        for peer in current.iter() {
            if !visible.contains(peer) {
                change.removed.push(*peer);
            }
        }
        *current = visible;

        change.added.sort();
        change.removed.sort();
        change
    }

    /// Evaluates only `peer` for the entity, returning true if it was newly added
    pub fn recompute_peer(&mut self, entity: &EntityId, peer: &PeerId) -> bool {
        if !self.observers.contains_key(entity) {
            return false;
        }
        let visible = self.is_visible_to(entity, peer);
        let Some(current) = self.observers.get_mut(entity) else {
            return false;
        };
        if visible {
            current.insert(*peer)
        } else {
            current.remove(peer);
            false
        }
    }

    pub fn remove_peer(&mut self, peer: &PeerId) {
        for (_, peers) in self.observers.iter_mut() {
            peers.remove(peer);
        }
    }

    pub fn remove_entity(&mut self, entity: &EntityId) {
        self.observers.remove(entity);
        self.visibility_checks.remove(entity);
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.observers.keys()
    }
}

impl Default for ObserverTracker {
    fn default() -> Self {
        Self::new()
    }
}
