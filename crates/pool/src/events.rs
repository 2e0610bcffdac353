//! Event broadcasting for pool diagnostics.
//!
//! Provides [`PoolEvent`] variants emitted during slot lifecycle
//! transitions and an [`EventBus`] backed by `tokio::sync::broadcast`.

use tokio::sync::broadcast;

use crate::pool::SlotId;

// ---------------------------------------------------------------------------
// PoolEvent
// ---------------------------------------------------------------------------

/// Events emitted by a pool.
///
/// All variants carry the `pool` name. Subscribers receive cloned copies
/// via [`EventBus::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// The create hook produced a new resource.
    Created {
        /// The pool name.
        pool: String,
        /// The slot wrapping the new resource.
        slot: SlotId,
    },
    /// The create hook failed.
    CreateFailed {
        /// The pool name.
        pool: String,
        /// Human-readable error description.
        error: String,
    },
    /// A slot was handed to a consumer.
    Acquired {
        /// The pool name.
        pool: String,
        /// The slot handed out.
        slot: SlotId,
    },
    /// An acquire request could not be served and joined the wait queue.
    Queued {
        /// The pool name.
        pool: String,
        /// The (clamped) priority bucket.
        priority: usize,
        /// Number of requests waiting, including this one.
        waiters: usize,
    },
    /// A consumer handed a slot back.
    Released {
        /// The pool name.
        pool: String,
        /// The slot released.
        slot: SlotId,
    },
    /// A slot's resource was passed to the destroy hook.
    Destroyed {
        /// The pool name.
        pool: String,
        /// The slot destroyed.
        slot: SlotId,
        /// Why the slot was removed.
        reason: DestroyReason,
    },
    /// The destroy hook reported a failure.
    DestroyFailed {
        /// The pool name.
        pool: String,
        /// The slot whose teardown failed.
        slot: SlotId,
        /// Human-readable error description.
        error: String,
    },
    /// A drain observed quiescence.
    Drained {
        /// The pool name.
        pool: String,
    },
}

// ---------------------------------------------------------------------------
// DestroyReason
// ---------------------------------------------------------------------------

/// Reason a slot permanently left the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyReason {
    /// The slot was idle longer than the configured timeout.
    IdleTimeout,
    /// `destroy_all_now` tore the pool down.
    Shutdown,
    /// A consumer asked for the resource to be discarded.
    Discarded,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast-based event bus for pool events.
///
/// Emission is fire-and-forget: if no subscribers are listening or the
/// channel is full, events are dropped (no backpressure on the pool).
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer size.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: PoolEvent) {
        // No receivers is not an error for diagnostics.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events emitted after this call.
    ///
    /// A subscriber that falls behind by more than the buffer size gets a
    /// `Lagged` error and skips ahead.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}
