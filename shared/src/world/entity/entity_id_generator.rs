use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::EntityId;

/// An id which was freed by a despawn and is waiting to become reusable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleasedId {
    pub id: EntityId,
    pub released_at: Instant,
}

/// Hands out EntityIds for a single authority.
///
/// Fresh ids come from a counter starting at 1. When recycling is enabled, an
/// id handed back through `release` becomes eligible again once it has sat in
/// the release queue for at least `recycle_delay`, and eligible ids are always
/// preferred over fresh ones, oldest first.
pub struct EntityIdGenerator {
    counter: u64,
    recycle_ids: bool,
    recycle_delay: Duration,
    released_ids: VecDeque<ReleasedId>,
}

impl EntityIdGenerator {
    pub fn new(recycle_ids: bool, recycle_delay: Duration) -> Self {
        Self {
            counter: 0,
            recycle_ids,
            recycle_delay,
            released_ids: VecDeque::new(),
        }
    }

    pub fn allocate(&mut self, now: &Instant) -> EntityId {
        if self.recycle_ids {
            if let Some(released) = self.released_ids.front() {
                if now.saturating_duration_since(released.released_at) >= self.recycle_delay {
                    let id = released.id;
                    self.released_ids.pop_front();
                    return id;
                }
            }
        }

        self.counter += 1;
        EntityId::from_u64(self.counter)
    }

    pub fn release(&mut self, id: EntityId, now: &Instant) {
        self.released_ids.push_back(ReleasedId {
            id,
            released_at: *now,
        });
    }

    pub fn released_count(&self) -> usize {
        self.released_ids.len()
    }

    pub fn recycles_ids(&self) -> bool {
        self.recycle_ids
    }
}
