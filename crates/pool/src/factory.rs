//! Factory hooks the pool uses to build and tear down resources.
//!
//! The pool never inspects a resource; it only moves it between the
//! factory, its own bookkeeping and the consumer holding a
//! [`Pooled`](crate::Pooled) handle.

use std::future::Future;

use crate::error::BoxError;

/// Creates and destroys pooled resources.
///
/// Both hooks may take arbitrary time. `destroy` is best-effort: its
/// failure is logged and reported as a diagnostic event, never returned to
/// a consumer.
pub trait Factory: Send + Sync + 'static {
    /// The resource type handed out by the pool.
    type Resource: Send + 'static;

    /// Build a new resource.
    fn create(&self) -> impl Future<Output = Result<Self::Resource, BoxError>> + Send;

    /// Tear down a resource that is permanently leaving the pool.
    fn destroy(
        &self,
        resource: Self::Resource,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        async move {
            drop(resource);
            Ok(())
        }
    }
}

/// [`Factory`] built from a pair of closures.
///
/// ```
/// use nebula_pool::{BoxError, FnFactory};
///
/// let factory = FnFactory::new(
///     || async { Ok::<_, BoxError>(String::from("conn")) },
///     |_conn: String| async { Ok::<_, BoxError>(()) },
/// );
/// # let _ = factory;
/// ```
pub struct FnFactory<C, D> {
    create: C,
    destroy: D,
}

impl<C, D> FnFactory<C, D> {
    /// Wrap a create hook and a destroy hook.
    pub fn new(create: C, destroy: D) -> Self {
        Self { create, destroy }
    }
}

impl<C, D> std::fmt::Debug for FnFactory<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFactory").finish_non_exhaustive()
    }
}

impl<R, C, CF, D, DF> Factory for FnFactory<C, D>
where
    R: Send + 'static,
    C: Fn() -> CF + Send + Sync + 'static,
    CF: Future<Output = Result<R, BoxError>> + Send,
    D: Fn(R) -> DF + Send + Sync + 'static,
    DF: Future<Output = Result<(), BoxError>> + Send,
{
    type Resource = R;

    fn create(&self) -> impl Future<Output = Result<R, BoxError>> + Send {
        (self.create)()
    }

    fn destroy(&self, resource: R) -> impl Future<Output = Result<(), BoxError>> + Send {
        (self.destroy)(resource)
    }
}
