//! Idle registry: released resources waiting to be reused or reaped.
//!
//! Entries are kept in release order, so the front is always the slot
//! that has been idle longest. Reuse and reaping both work from the front.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use super::SlotId;

/// An idle slot and the resource it wraps.
pub(crate) struct IdleSlot<T> {
    pub(crate) id: SlotId,
    pub(crate) resource: T,
    pub(crate) idle_since: Instant,
}

pub(crate) struct IdleRegistry<T> {
    entries: VecDeque<IdleSlot<T>>,
}

impl<T> IdleRegistry<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert a freshly released slot at the back.
    pub(crate) fn push(&mut self, id: SlotId, resource: T, now: Instant) {
        debug_assert!(
            self.entries.back().is_none_or(|e| e.idle_since <= now),
            "idle registry must stay ordered by idle_since"
        );
        self.entries.push_back(IdleSlot {
            id,
            resource,
            idle_since: now,
        });
    }

    /// Take the oldest idle slot.
    pub(crate) fn pop_front(&mut self) -> Option<IdleSlot<T>> {
        self.entries.pop_front()
    }

    /// Remove every slot idle for at least `timeout`, oldest first.
    ///
    /// Stops at the first slot that is still fresh: everything behind it
    /// was released later.
    pub(crate) fn take_expired(&mut self, now: Instant, timeout: Duration) -> Vec<IdleSlot<T>> {
        let expired = self
            .entries
            .iter()
            .take_while(|e| now.saturating_duration_since(e.idle_since) >= timeout)
            .count();
        self.entries.drain(..expired).collect()
    }

    /// Remove every slot, oldest first.
    pub(crate) fn take_all(&mut self) -> Vec<IdleSlot<T>> {
        self.entries.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
