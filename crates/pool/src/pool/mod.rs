//! Bounded, priority-aware resource pool driven by a [`Factory`].
//!
//! `Pool<F>` calls `F::create` when it needs a new resource and
//! `F::destroy` when a resource leaves for good (idle timeout, forced
//! teardown, explicit discard). Everything else is bookkeeping done in
//! short critical sections on a single mutex that is never held across an
//! `.await`.

pub mod config;
mod idle;
mod queue;
mod reaper;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::events::{DestroyReason, EventBus, PoolEvent};
use crate::factory::Factory;
use crate::guard::Pooled;

use idle::IdleRegistry;
use queue::WaitQueue;

pub use config::PoolConfig;

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Identifier of a resource slot, unique within one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw slot number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a resource slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// The create hook is running.
    Pending,
    /// Released and waiting in the idle registry.
    Idle,
    /// Checked out by exactly one consumer.
    Active,
    /// Selected for removal; destroyed as soon as the pool holds the resource.
    Destroying,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Pool statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Resources counted against `max_size` (pending + idle + active + destroying).
    pub outstanding: usize,
    /// Resources sitting in the idle registry.
    pub idle: usize,
    /// Resources checked out by consumers.
    pub active: usize,
    /// Create hooks in flight.
    pub pending: usize,
    /// Slots doomed by `destroy_all_now` that are still held elsewhere.
    pub destroying: usize,
    /// Acquire requests in the wait queue.
    pub waiting: usize,
    /// Total resources ever created.
    pub created: u64,
    /// Total destroy hooks invoked.
    pub destroyed: u64,
    /// Total successful acquisitions.
    pub total_acquisitions: u64,
    /// Total releases back to the pool.
    pub total_releases: u64,
    /// Whether the pool stopped admitting new acquires.
    pub draining: bool,
}

// ---------------------------------------------------------------------------
// Pool internals
// ---------------------------------------------------------------------------

/// What a queued acquire receives: a slot and its resource, or the
/// factory error from the creation attempted on its behalf.
type Delivery<R> = Result<(SlotId, R)>;

/// Offer a resource to a waiter; hands it back if the waiter is gone.
fn offer<R>(tx: oneshot::Sender<Delivery<R>>, id: SlotId, resource: R) -> Option<R> {
    tx.send(Ok((id, resource)))
        .err()
        .and_then(std::result::Result::ok)
        .map(|(_, resource)| resource)
}

/// Where a released resource ended up.
enum Disposal<R> {
    Handed {
        priority: usize,
        waited: std::time::Duration,
    },
    Idled,
    Destroy(SlotId, R),
}

struct State<R> {
    /// Every slot counted against `max_size`.
    slots: HashMap<SlotId, SlotState>,
    idle: IdleRegistry<R>,
    waiters: WaitQueue<oneshot::Sender<Delivery<R>>>,
    draining: bool,
    /// Resources removed from `slots` whose destroy hook has not finished.
    disposing: usize,
    next_slot: u64,
    created: u64,
    destroyed: u64,
    total_acquisitions: u64,
    total_releases: u64,
}

impl<R> State<R> {
    fn new(config: &PoolConfig) -> Self {
        Self {
            slots: HashMap::with_capacity(config.max_size),
            idle: IdleRegistry::with_capacity(config.max_size),
            waiters: WaitQueue::new(config.priority_range),
            draining: false,
            disposing: 0,
            next_slot: 0,
            created: 0,
            destroyed: 0,
            total_acquisitions: 0,
            total_releases: 0,
        }
    }

    fn outstanding(&self) -> usize {
        self.slots.len()
    }

    /// Checked-out or in-flight work: drain completes when this hits zero.
    fn busy(&self) -> usize {
        self.slots.len() - self.idle.len() + self.waiters.len()
    }

    /// Count a new pending slot against `max_size`.
    fn reserve(&mut self) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        self.slots.insert(id, SlotState::Pending);
        id
    }

    fn state_of(&self, id: SlotId) -> Option<SlotState> {
        self.slots.get(&id).copied()
    }

    fn set(&mut self, id: SlotId, state: SlotState) {
        if let Some(slot) = self.slots.get_mut(&id) {
            *slot = state;
        }
    }

    fn count(&self, state: SlotState) -> usize {
        self.slots.values().filter(|s| **s == state).count()
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            outstanding: self.outstanding(),
            idle: self.idle.len(),
            active: self.count(SlotState::Active),
            pending: self.count(SlotState::Pending),
            destroying: self.count(SlotState::Destroying),
            waiting: self.waiters.len(),
            created: self.created,
            destroyed: self.destroyed,
            total_acquisitions: self.total_acquisitions,
            total_releases: self.total_releases,
            draining: self.draining,
        }
    }
}

/// Inner shared state for the pool.
pub(crate) struct Inner<F: Factory> {
    factory: F,
    config: PoolConfig,
    state: Mutex<State<F::Resource>>,
    /// Mirrors `State::busy` so `drain` can wait without polling.
    busy: watch::Sender<usize>,
    /// Mirrors `State::disposing` so `destroy_all_now` can wait for every
    /// destroy hook in flight.
    disposing: watch::Sender<usize>,
    events: EventBus,
    runtime: Handle,
    shutdown: CancellationToken,
}

impl<F: Factory> Inner<F> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn sync(&self, state: &State<F::Resource>) {
        debug_assert!(state.outstanding() <= self.config.max_size);
        self.busy.send_replace(state.busy());
        self.disposing.send_replace(state.disposing);
    }

    /// Give a checked-out resource to the next live waiter, or idle it.
    fn hand_off(
        &self,
        state: &mut State<F::Resource>,
        id: SlotId,
        resource: F::Resource,
    ) -> Disposal<F::Resource> {
        if state.state_of(id) == Some(SlotState::Destroying) {
            state.slots.remove(&id);
            state.disposing += 1;
            return Disposal::Destroy(id, resource);
        }

        let mut resource = resource;
        while let Some(waiter) = state.waiters.pop() {
            match offer(waiter.payload, id, resource) {
                None => {
                    state.set(id, SlotState::Active);
                    state.total_acquisitions += 1;
                    return Disposal::Handed {
                        priority: waiter.priority,
                        waited: waiter.enqueued_at.elapsed(),
                    };
                }
                // That caller stopped waiting; try the next one.
                Some(returned) => resource = returned,
            }
        }

        state.set(id, SlotState::Idle);
        state.idle.push(id, resource, Instant::now());
        Disposal::Idled
    }

    /// Start creations for queued requests while there is spare capacity.
    fn replenish(self: &Arc<Self>, state: &mut State<F::Resource>) {
        while !state.waiters.is_empty()
            && state.idle.is_empty()
            && state.outstanding() < self.config.max_size
        {
            let Some(waiter) = state.waiters.pop() else {
                break;
            };
            if waiter.payload.is_closed() {
                continue;
            }
            let id = state.reserve();
            let inner = Arc::clone(self);
            self.runtime
                .spawn(async move { inner.create_for_waiter(id, waiter.payload).await });
        }
    }

    /// Return a checked-out resource. Used by `Pool::release` and by
    /// dropping a [`Pooled`] handle.
    pub(crate) fn release_slot(self: &Arc<Self>, id: SlotId, resource: F::Resource) -> Result<()> {
        self.return_slot(id, resource, true)
    }

    /// Take back a resource that was sent to a queued request which went
    /// away before receiving it. That delivery is not counted.
    fn reclaim_slot(self: &Arc<Self>, id: SlotId, resource: F::Resource) -> Result<()> {
        self.return_slot(id, resource, false)
    }

    fn return_slot(self: &Arc<Self>, id: SlotId, resource: F::Resource, delivered: bool) -> Result<()> {
        let disposal = {
            let mut state = self.state.lock();
            match state.state_of(id) {
                Some(SlotState::Active | SlotState::Destroying) => {}
                Some(other) => {
                    return Err(Error::invalid_release(
                        self.name(),
                        format!("slot {id} is {other:?}, not checked out"),
                    ));
                }
                None => {
                    return Err(Error::invalid_release(
                        self.name(),
                        format!("slot {id} is not known to this pool"),
                    ));
                }
            }
            if delivered {
                state.total_releases += 1;
            } else {
                state.total_acquisitions = state.total_acquisitions.saturating_sub(1);
            }
            let disposal = self.hand_off(&mut state, id, resource);
            self.sync(&state);
            disposal
        };

        if delivered {
            self.events.emit(PoolEvent::Released {
                pool: self.name().to_string(),
                slot: id,
            });
        }

        match disposal {
            Disposal::Handed { priority, waited } => {
                tracing::debug!(pool = %self.name(), slot = %id, priority, ?waited, "Handed released resource to waiter");
                self.events.emit(PoolEvent::Acquired {
                    pool: self.name().to_string(),
                    slot: id,
                });
            }
            Disposal::Idled => {
                tracing::debug!(pool = %self.name(), slot = %id, "Returned resource to idle registry");
            }
            Disposal::Destroy(id, resource) => {
                let inner = Arc::clone(self);
                self.runtime.spawn(async move {
                    inner
                        .destroy_slot(id, resource, DestroyReason::Shutdown)
                        .await;
                });
            }
        }
        Ok(())
    }

    /// Permanently remove a checked-out slot and destroy its resource.
    async fn discard_slot(self: &Arc<Self>, id: SlotId, resource: F::Resource) -> Result<()> {
        {
            let mut state = self.state.lock();
            match state.state_of(id) {
                Some(SlotState::Active | SlotState::Destroying) => {}
                _ => {
                    return Err(Error::invalid_release(
                        self.name(),
                        format!("slot {id} is not checked out"),
                    ));
                }
            }
            state.slots.remove(&id);
            state.disposing += 1;
            self.replenish(&mut state);
            self.sync(&state);
        }
        self.destroy_slot(id, resource, DestroyReason::Discarded)
            .await;
        Ok(())
    }

    /// Run the destroy hook. Failures are diagnostics only.
    ///
    /// Callers count the resource in `State::disposing` when they take it
    /// out of `slots`; this settles that count once the hook returns.
    async fn destroy_slot(&self, id: SlotId, resource: F::Resource, reason: DestroyReason) {
        let settled = Settle { inner: self };
        let result = self.factory.destroy(resource).await;
        drop(settled);
        match result {
            Ok(()) => {
                tracing::debug!(pool = %self.name(), slot = %id, ?reason, "Destroyed resource");
                self.events.emit(PoolEvent::Destroyed {
                    pool: self.name().to_string(),
                    slot: id,
                    reason,
                });
            }
            Err(error) => {
                tracing::warn!(pool = %self.name(), slot = %id, ?reason, %error, "Destroy hook failed");
                self.events.emit(PoolEvent::DestroyFailed {
                    pool: self.name().to_string(),
                    slot: id,
                    error: error.to_string(),
                });
            }
        }
    }

    /// Drop a pending slot whose creation will never complete.
    fn abort_pending(self: &Arc<Self>, id: SlotId) {
        let mut state = self.state.lock();
        if state.slots.remove(&id).is_some() {
            self.replenish(&mut state);
            self.sync(&state);
        }
    }

    /// Creation on behalf of the caller that found spare capacity.
    async fn create_for_caller(self: &Arc<Self>, id: SlotId) -> Result<Pooled<F>> {
        let mut pending = PendingSlot {
            inner: self,
            id,
            armed: true,
        };
        let result = self.factory.create().await;
        pending.armed = false;

        let resource = match result {
            Ok(resource) => resource,
            Err(source) => {
                {
                    let mut state = self.state.lock();
                    state.slots.remove(&id);
                    self.replenish(&mut state);
                    self.sync(&state);
                }
                tracing::debug!(pool = %self.name(), slot = %id, error = %source, "Create hook failed");
                self.events.emit(PoolEvent::CreateFailed {
                    pool: self.name().to_string(),
                    error: source.to_string(),
                });
                return Err(Error::create_failed(self.name(), source));
            }
        };

        let doomed = {
            let mut state = self.state.lock();
            state.created += 1;
            let doomed = state.state_of(id) != Some(SlotState::Pending);
            if doomed {
                state.slots.remove(&id);
                state.disposing += 1;
            } else {
                state.set(id, SlotState::Active);
                state.total_acquisitions += 1;
            }
            self.sync(&state);
            doomed
        };

        self.events.emit(PoolEvent::Created {
            pool: self.name().to_string(),
            slot: id,
        });
        if doomed {
            self.destroy_slot(id, resource, DestroyReason::Shutdown)
                .await;
            return Err(Error::abandoned(self.name()));
        }

        tracing::debug!(pool = %self.name(), slot = %id, "Created resource");
        self.events.emit(PoolEvent::Acquired {
            pool: self.name().to_string(),
            slot: id,
        });
        Ok(Pooled::new(resource, id, Arc::clone(self)))
    }

    /// Creation on behalf of a queued request, started by `replenish`.
    async fn create_for_waiter(self: Arc<Self>, id: SlotId, tx: oneshot::Sender<Delivery<F::Resource>>) {
        let resource = match self.factory.create().await {
            Ok(resource) => resource,
            Err(source) => {
                {
                    let mut state = self.state.lock();
                    state.slots.remove(&id);
                    self.replenish(&mut state);
                    self.sync(&state);
                }
                tracing::debug!(pool = %self.name(), slot = %id, error = %source, "Create hook failed for queued request");
                self.events.emit(PoolEvent::CreateFailed {
                    pool: self.name().to_string(),
                    error: source.to_string(),
                });
                // The waiter may have gone; nothing else to report to.
                let _ = tx.send(Err(Error::create_failed(self.name(), source)));
                return;
            }
        };

        self.events.emit(PoolEvent::Created {
            pool: self.name().to_string(),
            slot: id,
        });

        let disposal = {
            let mut state = self.state.lock();
            state.created += 1;
            let disposal = if state.state_of(id) == Some(SlotState::Pending) {
                state.set(id, SlotState::Active);
                match offer(tx, id, resource) {
                    None => {
                        state.total_acquisitions += 1;
                        None
                    }
                    Some(resource) => Some(self.hand_off(&mut state, id, resource)),
                }
            } else {
                state.slots.remove(&id);
                state.disposing += 1;
                Some(Disposal::Destroy(id, resource))
            };
            self.sync(&state);
            disposal
        };

        match disposal {
            None => {
                tracing::debug!(pool = %self.name(), slot = %id, "Created resource for queued request");
                self.events.emit(PoolEvent::Acquired {
                    pool: self.name().to_string(),
                    slot: id,
                });
            }
            Some(Disposal::Destroy(id, resource)) => {
                self.destroy_slot(id, resource, DestroyReason::Shutdown)
                    .await;
            }
            Some(Disposal::Handed { priority, waited }) => {
                tracing::debug!(pool = %self.name(), slot = %id, priority, ?waited, "Queued request went away; resource handed to the next one");
                self.events.emit(PoolEvent::Acquired {
                    pool: self.name().to_string(),
                    slot: id,
                });
            }
            Some(Disposal::Idled) => {
                tracing::debug!(pool = %self.name(), slot = %id, "Queued request went away; resource kept in pool");
            }
        }
    }

    /// Destroy every idle slot past `idle_timeout`, oldest first.
    pub(crate) async fn reap(self: &Arc<Self>) {
        let expired = {
            let mut state = self.state.lock();
            let expired = state
                .idle
                .take_expired(Instant::now(), self.config.idle_timeout);
            for slot in &expired {
                state.slots.remove(&slot.id);
            }
            state.disposing += expired.len();
            if !expired.is_empty() {
                self.replenish(&mut state);
                self.sync(&state);
            }
            expired
        };

        if !expired.is_empty() {
            tracing::debug!(pool = %self.name(), count = expired.len(), "Reaping idle resources");
        }
        for slot in expired {
            self.destroy_slot(slot.id, slot.resource, DestroyReason::IdleTimeout)
                .await;
        }
    }
}

/// Rolls back a pending slot if the acquiring future is dropped mid-create.
struct PendingSlot<'a, F: Factory> {
    inner: &'a Arc<Inner<F>>,
    id: SlotId,
    armed: bool,
}

impl<F: Factory> Drop for PendingSlot<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.abort_pending(self.id);
        }
    }
}

/// Settles one `State::disposing` entry when a destroy hook returns or
/// unwinds.
struct Settle<'a, F: Factory> {
    inner: &'a Inner<F>,
}

impl<F: Factory> Drop for Settle<'_, F> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.destroyed += 1;
        state.disposing -= 1;
        self.inner.sync(&state);
    }
}

/// Removes a queued request if the acquiring future is dropped while
/// waiting, returning any resource that was already sent to it.
struct QueuedRequest<'a, F: Factory> {
    inner: &'a Arc<Inner<F>>,
    seq: u64,
    bucket: usize,
    rx: Option<oneshot::Receiver<Delivery<F::Resource>>>,
}

impl<F: Factory> Drop for QueuedRequest<'_, F> {
    fn drop(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        {
            let mut state = self.inner.state.lock();
            if state.waiters.remove(self.seq, self.bucket).is_some() {
                self.inner.sync(&state);
                return;
            }
        }
        // Already matched: refuse further sends, then reclaim what arrived.
        rx.close();
        if let Ok(Ok((id, resource))) = rx.try_recv() {
            if let Err(error) = self.inner.reclaim_slot(id, resource) {
                tracing::warn!(pool = %self.inner.name(), %error, "Failed to reclaim resource from cancelled acquire");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pool<F>
// ---------------------------------------------------------------------------

/// Generic resource pool.
///
/// Manages at most `max_size` resources produced by `F`. Cloning a `Pool`
/// is cheap and yields another handle to the same pool.
pub struct Pool<F: Factory> {
    inner: Arc<Inner<F>>,
}

impl<F: Factory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Factory> std::fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.inner.config.name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<F: Factory> Pool<F> {
    /// Create a new pool and start its reaper.
    ///
    /// # Errors
    /// Returns error if `config` is invalid or no Tokio runtime is running.
    pub fn new(factory: F, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| {
            Error::configuration("Pool::new must be called from within a Tokio runtime")
        })?;

        let (busy, _) = watch::channel(0);
        let (disposing, _) = watch::channel(0);
        let inner = Arc::new(Inner {
            state: Mutex::new(State::new(&config)),
            factory,
            busy,
            disposing,
            events: EventBus::default(),
            shutdown: CancellationToken::new(),
            runtime,
            config,
        });

        reaper::spawn(&inner);
        tracing::debug!(
            pool = %inner.config.name,
            max_size = inner.config.max_size,
            priority_range = inner.config.priority_range,
            "Created pool"
        );
        Ok(Self { inner })
    }

    /// The pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The configuration the pool was built with.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Whether `drain` or `destroy_all_now` has been called.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.inner.state.lock().draining
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.state.lock().stats()
    }

    /// Subscribe to diagnostic events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events.subscribe()
    }

    /// Acquire a resource at the highest priority (bucket 0).
    pub async fn acquire(&self) -> Result<Pooled<F>> {
        self.acquire_with_priority(0).await
    }

    /// Acquire a resource.
    ///
    /// Serves the oldest idle resource if there is one, otherwise creates a
    /// new one while under `max_size`, otherwise waits in the queue behind
    /// lower-numbered priorities and earlier requests of the same priority.
    /// Priorities outside `0..priority_range` are clamped.
    ///
    /// # Errors
    /// - [`Error::Draining`] once `drain` or `destroy_all_now` was called.
    /// - [`Error::CreateFailed`] if the create hook failed for this request.
    /// - [`Error::Abandoned`] if `destroy_all_now` tore down the queue.
    pub async fn acquire_with_priority(&self, priority: usize) -> Result<Pooled<F>> {
        enum Step<R> {
            Ready(SlotId, R),
            Create(SlotId),
            Wait {
                rx: oneshot::Receiver<Delivery<R>>,
                seq: u64,
                bucket: usize,
                waiters: usize,
            },
        }

        let inner = &self.inner;
        let step = {
            let mut state = inner.state.lock();
            if state.draining {
                return Err(Error::draining(inner.name()));
            }
            let step = if let Some(slot) = state.idle.pop_front() {
                state.set(slot.id, SlotState::Active);
                state.total_acquisitions += 1;
                Step::Ready(slot.id, slot.resource)
            } else if state.outstanding() < inner.config.max_size {
                Step::Create(state.reserve())
            } else {
                let (tx, rx) = oneshot::channel();
                let (seq, bucket) = state.waiters.push(priority, tx);
                Step::Wait {
                    rx,
                    seq,
                    bucket,
                    waiters: state.waiters.len(),
                }
            };
            inner.sync(&state);
            step
        };

        match step {
            Step::Ready(id, resource) => {
                tracing::debug!(pool = %inner.name(), slot = %id, "Acquired idle resource");
                inner.events.emit(PoolEvent::Acquired {
                    pool: inner.name().to_string(),
                    slot: id,
                });
                Ok(Pooled::new(resource, id, Arc::clone(inner)))
            }
            Step::Create(id) => inner.create_for_caller(id).await,
            Step::Wait {
                rx,
                seq,
                bucket,
                waiters,
            } => {
                tracing::debug!(pool = %inner.name(), priority = bucket, waiters, "Pool at capacity, request queued");
                inner.events.emit(PoolEvent::Queued {
                    pool: inner.name().to_string(),
                    priority: bucket,
                    waiters,
                });

                let mut request = QueuedRequest {
                    inner,
                    seq,
                    bucket,
                    rx: Some(rx),
                };
                let delivery = match request.rx.as_mut() {
                    Some(rx) => rx.await,
                    None => return Err(Error::abandoned(inner.name())),
                };
                request.rx = None;

                match delivery {
                    Ok(Ok((id, resource))) => Ok(Pooled::new(resource, id, Arc::clone(inner))),
                    Ok(Err(error)) => Err(error),
                    // Sender dropped without a match: the queue was torn down.
                    Err(_) => Err(Error::abandoned(inner.name())),
                }
            }
        }
    }

    /// Hand a resource back to the pool.
    ///
    /// The resource goes straight to the next queued request if there is
    /// one, otherwise to the back of the idle registry. Dropping a
    /// [`Pooled`] handle does the same thing; this method surfaces errors
    /// instead of logging them.
    ///
    /// # Errors
    /// [`Error::InvalidRelease`] if the handle belongs to a different pool
    /// or its slot is not checked out. A foreign handle is released to its
    /// own pool when dropped.
    pub fn release(&self, mut pooled: Pooled<F>) -> Result<()> {
        if !pooled.belongs_to(&self.inner) {
            return Err(Error::invalid_release(
                self.name(),
                format!("slot {} was issued by a different pool", pooled.slot()),
            ));
        }
        let (id, resource) = pooled.take().ok_or_else(|| {
            Error::invalid_release(self.name(), "handle was already released")
        })?;
        self.inner.release_slot(id, resource)
    }

    /// Remove a checked-out resource from the pool and destroy it.
    ///
    /// Frees capacity for queued requests.
    ///
    /// # Errors
    /// [`Error::InvalidRelease`] under the same conditions as [`release`](Self::release).
    pub async fn destroy(&self, mut pooled: Pooled<F>) -> Result<()> {
        if !pooled.belongs_to(&self.inner) {
            return Err(Error::invalid_release(
                self.name(),
                format!("slot {} was issued by a different pool", pooled.slot()),
            ));
        }
        let (id, resource) = pooled.take().ok_or_else(|| {
            Error::invalid_release(self.name(), "handle was already released")
        })?;
        self.inner.discard_slot(id, resource).await
    }

    /// Stop admitting new acquires and wait for quiescence.
    ///
    /// Takes effect immediately: every later `acquire` fails with
    /// [`Error::Draining`]. Requests already queued are still served by
    /// later releases. The returned future resolves once nothing is checked
    /// out, being created or queued. Drain destroys nothing; idle resources
    /// remain until reaped or until [`destroy_all_now`](Self::destroy_all_now).
    pub fn drain(&self) -> impl Future<Output = ()> + Send + 'static {
        let first = {
            let mut state = self.inner.state.lock();
            !std::mem::replace(&mut state.draining, true)
        };
        if first {
            tracing::info!(pool = %self.name(), "Draining pool");
        }

        let inner = Arc::clone(&self.inner);
        let mut busy = self.inner.busy.subscribe();
        async move {
            // The sender lives in `inner`, which this future keeps alive.
            let _ = busy.wait_for(|busy| *busy == 0).await;
            tracing::info!(pool = %inner.name(), "Pool drained");
            inner.events.emit(PoolEvent::Drained {
                pool: inner.name().to_string(),
            });
        }
    }

    /// Destroy every resource without waiting for consumers.
    ///
    /// Idle resources are destroyed right away. Checked-out resources are
    /// marked [`SlotState::Destroying`] and destroyed when their handle
    /// comes back; resources still being created are destroyed as soon as
    /// the create hook finishes. Queued requests fail with
    /// [`Error::Abandoned`]. The pool stops admitting acquires and the
    /// reaper stops.
    ///
    /// The destroys start immediately; the returned future resolves once
    /// no destroy hook is running anymore, including hooks started earlier
    /// by the reaper or by [`destroy`](Self::destroy).
    pub fn destroy_all_now(&self) -> impl Future<Output = ()> + Send + 'static {
        let (idle, abandoned) = {
            let mut state = self.inner.state.lock();
            state.draining = true;
            let idle = state.idle.take_all();
            for slot in &idle {
                state.slots.remove(&slot.id);
            }
            state.disposing += idle.len();
            for slot in state.slots.values_mut() {
                *slot = SlotState::Destroying;
            }
            let abandoned = state.waiters.take_all();
            self.inner.sync(&state);
            (idle, abandoned)
        };
        self.inner.shutdown.cancel();

        tracing::info!(
            pool = %self.name(),
            idle = idle.len(),
            abandoned = abandoned.len(),
            "Destroying all resources"
        );
        // Dropping the senders resolves every queued acquire.
        drop(abandoned);

        let inner = Arc::clone(&self.inner);
        let destroys = self.inner.runtime.spawn(async move {
            for slot in idle {
                inner
                    .destroy_slot(slot.id, slot.resource, DestroyReason::Shutdown)
                    .await;
            }
        });
        let name = self.name().to_string();
        let mut disposing = self.inner.disposing.subscribe();
        async move {
            if let Err(error) = destroys.await {
                tracing::warn!(pool = %name, %error, "Destroy task did not complete");
            }
            // Hooks started earlier by the reaper, a discard or a returned
            // handle. The sender lives in `Inner`, which those tasks hold.
            let _ = disposing.wait_for(|disposing| *disposing == 0).await;
        }
    }
}
