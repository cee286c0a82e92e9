use std::collections::{HashMap, HashSet};

use crate::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Orphan {
    pub child: EntityId,
    pub parent: EntityId,
    pub reparented_explicitly: bool,
}

/// Children whose parent was not known locally when they spawned, indexed
/// by the parent they are waiting on
pub struct OrphanWaitlist {
    orphans: HashMap<EntityId, Orphan>,
    waiting_on_parent: HashMap<EntityId, HashSet<EntityId>>,
    queue_order: Vec<EntityId>,
}

impl OrphanWaitlist {
    pub fn new() -> Self {
        Self {
            orphans: HashMap::new(),
            waiting_on_parent: HashMap::new(),
            queue_order: Vec::new(),
        }
    }

    pub fn queue(&mut self, orphan: Orphan) {
        self.remove(&orphan.child);

        self.waiting_on_parent
            .entry(orphan.parent)
            .or_default()
            .insert(orphan.child);
        self.queue_order.push(orphan.child);
        self.orphans.insert(orphan.child, orphan);
    }

    pub fn contains(&self, child: &EntityId) -> bool {
        self.orphans.contains_key(child)
    }

    pub fn get(&self, child: &EntityId) -> Option<&Orphan> {
        self.orphans.get(child)
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    /// Scans the whole queue and takes every orphan whose parent is now known,
    /// in the order they were queued
    pub fn take_resolvable<F: Fn(&EntityId) -> bool>(&mut self, is_known: F) -> Vec<Orphan> {
        let ready_parents: Vec<EntityId> = self
            .waiting_on_parent
            .keys()
            .filter(|parent| is_known(parent))
            .copied()
            .collect();
        if ready_parents.is_empty() {
            return Vec::new();
        }

        let mut ready_children = HashSet::new();
        for parent in ready_parents {
            if let Some(children) = self.waiting_on_parent.remove(&parent) {
                ready_children.extend(children);
            }
        }

        let mut output = Vec::new();
        self.queue_order.retain(|child| {
            if ready_children.contains(child) {
                if let Some(orphan) = self.orphans.remove(child) {
                    output.push(orphan);
                }
                return false;
            }
            true
        });
        output
    }

    /// Drops every orphan waiting on `parent`, returning the dropped children
    pub fn remove_waiting_on(&mut self, parent: &EntityId) -> Vec<EntityId> {
        let Some(children) = self.waiting_on_parent.remove(parent) else {
            return Vec::new();
        };
        let mut output: Vec<EntityId> = children.into_iter().collect();
        output.sort();
        for child in output.iter() {
            self.orphans.remove(child);
        }
        self.queue_order.retain(|child| !output.contains(child));
        output
    }

    pub fn remove(&mut self, child: &EntityId) -> Option<Orphan> {
        let orphan = self.orphans.remove(child)?;
        let mut now_empty = false;
        if let Some(children) = self.waiting_on_parent.get_mut(&orphan.parent) {
            children.remove(child);
            now_empty = children.is_empty();
        }
        if now_empty {
            self.waiting_on_parent.remove(&orphan.parent);
        }
        self.queue_order.retain(|queued| queued != child);
        Some(orphan)
    }
}

impl Default for OrphanWaitlist {
    fn default() -> Self {
        Self::new()
    }
}
