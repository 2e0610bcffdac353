//! RAII handle for a checked-out resource

use std::sync::Arc;

use crate::factory::Factory;
use crate::pool::{Inner, SlotId};

/// A resource checked out of a [`Pool`](crate::Pool).
///
/// The handle owns the resource exclusively while it is alive. Dropping
/// it releases the resource back to the pool, exactly like
/// [`Pool::release`](crate::Pool::release) except that an invalid release
/// is logged instead of returned.
pub struct Pooled<F: Factory> {
    resource: Option<F::Resource>,
    slot: SlotId,
    pool: Arc<Inner<F>>,
}

impl<F: Factory> Pooled<F> {
    pub(crate) fn new(resource: F::Resource, slot: SlotId, pool: Arc<Inner<F>>) -> Self {
        Self {
            resource: Some(resource),
            slot,
            pool,
        }
    }

    /// The slot this resource occupies in its pool.
    #[must_use]
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub(crate) fn belongs_to(&self, pool: &Arc<Inner<F>>) -> bool {
        Arc::ptr_eq(&self.pool, pool)
    }

    /// Take the resource out, disarming the release on drop.
    pub(crate) fn take(&mut self) -> Option<(SlotId, F::Resource)> {
        self.resource.take().map(|resource| (self.slot, resource))
    }
}

impl<F: Factory> std::ops::Deref for Pooled<F> {
    type Target = F::Resource;

    fn deref(&self) -> &F::Resource {
        self.resource.as_ref().expect("pooled resource used after release")
    }
}

impl<F: Factory> std::ops::DerefMut for Pooled<F> {
    fn deref_mut(&mut self) -> &mut F::Resource {
        self.resource.as_mut().expect("pooled resource used after release")
    }
}

impl<F: Factory> Drop for Pooled<F> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            if let Err(error) = self.pool.release_slot(self.slot, resource) {
                tracing::warn!(slot = %self.slot, %error, "Dropped handle could not be released");
            }
        }
    }
}

impl<F: Factory> std::fmt::Debug for Pooled<F>
where
    F::Resource: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pooled")
            .field("slot", &self.slot)
            .field("resource", &self.resource)
            .finish()
    }
}
