use std::collections::{HashMap, HashSet};

use log::warn;

use crate::{
    world::parenting::orphan_waitlist::{Orphan, OrphanWaitlist},
    EntityId, SpawnError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NetworkParent {
    parent: EntityId,
    reparented_explicitly: bool,
}

/// Maintains the network parent graph between replicated entities.
///
/// This graph is separate from whatever attachment the engine keeps between
/// its own objects; callers mirror changes to the engine themselves.
pub struct ParentingResolver {
    parents: HashMap<EntityId, NetworkParent>,
    children: HashMap<EntityId, HashSet<EntityId>>,
    orphans: OrphanWaitlist,
}

impl ParentingResolver {
    pub fn new() -> Self {
        Self {
            parents: HashMap::new(),
            children: HashMap::new(),
            orphans: OrphanWaitlist::new(),
        }
    }

    /// Sets (or clears, with `None`) the network parent of `child`
    pub fn set_parent(
        &mut self,
        child: &EntityId,
        parent_opt: Option<EntityId>,
        reparented_explicitly: bool,
    ) -> Result<(), SpawnError> {
        let Some(parent) = parent_opt else {
            self.clear_parent(child);
            return Ok(());
        };

        if self.would_cycle(child, &parent) {
            return Err(SpawnError::ParentCycle {
                child: *child,
                parent,
            });
        }

        self.clear_parent(child);
        self.orphans.remove(child);
        self.parents.insert(
            *child,
            NetworkParent {
                parent,
                reparented_explicitly,
            },
        );
        self.children.entry(parent).or_default().insert(*child);
        Ok(())
    }

    /// Returns `(reparented_explicitly, parent)` for a child with a network parent
    pub fn get_parent(&self, child: &EntityId) -> Option<(bool, EntityId)> {
        self.parents
            .get(child)
            .map(|link| (link.reparented_explicitly, link.parent))
    }

    pub fn parent_of(&self, child: &EntityId) -> Option<EntityId> {
        self.parents.get(child).map(|link| link.parent)
    }

    pub fn children_of(&self, parent: &EntityId) -> Vec<EntityId> {
        let Some(children) = self.children.get(parent) else {
            return Vec::new();
        };
        let mut output: Vec<EntityId> = children.iter().copied().collect();
        output.sort();
        output
    }

    /// Moves every child of `parent` to the root, returning the detached children
    pub fn detach_children(&mut self, parent: &EntityId) -> Vec<EntityId> {
        let Some(children) = self.children.remove(parent) else {
            return Vec::new();
        };
        let mut output: Vec<EntityId> = children.into_iter().collect();
        output.sort();
        for child in output.iter() {
            self.parents.remove(child);
        }
        output
    }

    // Orphans

    pub fn queue_orphan(&mut self, child: &EntityId, parent: &EntityId, reparented_explicitly: bool) {
        self.clear_parent(child);
        self.orphans.queue(Orphan {
            child: *child,
            parent: *parent,
            reparented_explicitly,
        });
    }

    pub fn is_orphan(&self, child: &EntityId) -> bool {
        self.orphans.contains(child)
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Links every queued orphan whose parent is now known, returning the new
    /// `(child, parent)` pairs
    pub fn resolve_orphans<F: Fn(&EntityId) -> bool>(
        &mut self,
        is_known: F,
    ) -> Vec<(EntityId, EntityId)> {
        let mut output = Vec::new();
        for orphan in self.orphans.take_resolvable(is_known) {
            match self.set_parent(&orphan.child, Some(orphan.parent), orphan.reparented_explicitly) {
                Ok(()) => output.push((orphan.child, orphan.parent)),
                Err(error) => warn!("Dropping orphan: {}", error),
            }
        }
        output
    }

    /// Forgets orphans that were waiting on a parent which will never arrive
    pub fn drop_orphans_waiting_on(&mut self, parent: &EntityId) -> Vec<EntityId> {
        self.orphans.remove_waiting_on(parent)
    }

    /// Forgets everything about `entity` as a child. Its own children are
    /// left untouched, use `detach_children` for those.
    pub fn remove_entity(&mut self, entity: &EntityId) {
        self.clear_parent(entity);
        self.orphans.remove(entity);
    }

    pub fn references(&self, entity: &EntityId) -> bool {
        self.parents.contains_key(entity)
            || self.children.contains_key(entity)
            || self.orphans.contains(entity)
    }

    fn clear_parent(&mut self, child: &EntityId) {
        let Some(link) = self.parents.remove(child) else {
            return;
        };
        let mut now_empty = false;
        if let Some(siblings) = self.children.get_mut(&link.parent) {
            siblings.remove(child);
            now_empty = siblings.is_empty();
        }
        if now_empty {
            self.children.remove(&link.parent);
        }
    }

    fn would_cycle(&self, child: &EntityId, parent: &EntityId) -> bool {
        let mut cursor = Some(*parent);
        let mut visited = HashSet::new();
        while let Some(current) = cursor {
            if current == *child {
                return true;
            }
            if !visited.insert(current) {
                return true;
            }
            cursor = self.parent_of(&current);
        }
        false
    }
}

/// Orders `entities` so that every entity comes after its parent whenever that
/// parent is in the list too. Otherwise the input order is kept.
pub fn parents_first<F: Fn(&EntityId) -> Option<EntityId>>(
    entities: &[EntityId],
    parent_of: F,
) -> Vec<EntityId> {
    let members: HashSet<EntityId> = entities.iter().copied().collect();
    let mut placed = HashSet::new();
    let mut output = Vec::with_capacity(entities.len());

    for entity in entities {
        let mut chain = Vec::new();
        let mut cursor = Some(*entity);
        while let Some(current) = cursor {
            if !members.contains(&current) || placed.contains(&current) || chain.contains(&current) {
                break;
            }
            chain.push(current);
            cursor = parent_of(&current);
        }
        for ancestor in chain.into_iter().rev() {
            placed.insert(ancestor);
            output.push(ancestor);
        }
    }

    output
}

impl Default for ParentingResolver {
    fn default() -> Self {
        Self::new()
    }
}
