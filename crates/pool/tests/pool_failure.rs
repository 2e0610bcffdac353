//! Create-hook failure handling tests.
//!
//! Verifies that when `Factory::create` fails, the pool rolls back its
//! capacity accounting, reports the error to the request it was made for,
//! and keeps serving later requests normally. Destroy failures are only
//! diagnostics.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use nebula_pool::{BoxError, Error, Factory, Pool, PoolConfig, PoolEvent};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn config(max_size: usize) -> PoolConfig {
    PoolConfig {
        name: "failing".to_string(),
        max_size,
        idle_timeout: Duration::from_millis(100),
        reap_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

/// Fails every create call whose index bit is set in `fail_mask`.
#[derive(Clone)]
struct Intermittent {
    fail_mask: u32,
    calls: Arc<AtomicU32>,
}

impl Intermittent {
    fn new(fail_mask: u32) -> Self {
        Self {
            fail_mask,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Factory for Intermittent {
    type Resource = u32;

    async fn create(&self) -> Result<u32, BoxError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mask & (1 << call) != 0 {
            return Err(format!("create call {call} failed").into());
        }
        Ok(call)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_failure_surfaces_and_rolls_back_capacity() {
    let pool = Pool::new(Intermittent::new(0b1), config(1)).unwrap();

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, Error::CreateFailed { .. }), "got {err:?}");
    assert!(err.to_string().contains("create call 0 failed"));
    assert!(err.is_retryable());

    let stats = pool.stats();
    assert_eq!(stats.outstanding, 0, "capacity must not leak");
    assert_eq!(stats.created, 0);

    // Not retried by the pool, but the caller may retry.
    let resource = pool.acquire().await.expect("second create succeeds");
    assert_eq!(*resource, 1);
}

#[tokio::test]
async fn repeated_failures_never_exhaust_the_pool() {
    let pool = Pool::new(Intermittent::new(0b0111_1111), config(2)).unwrap();

    for _ in 0..7 {
        assert!(pool.acquire().await.is_err());
    }
    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    assert_eq!((*a, *b), (7, 8));
    assert_eq!(pool.stats().outstanding, 2);
}

#[tokio::test(start_paused = true)]
async fn discarding_a_resource_creates_one_for_the_queued_request() {
    let pool = Pool::new(Intermittent::new(0), config(1)).unwrap();
    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await.map(|r| *r) })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(pool.stats().waiting, 1);

    pool.destroy(held).await.unwrap();

    assert_eq!(waiter.await.unwrap().unwrap(), 1, "fresh resource for the waiter");
    let stats = pool.stats();
    assert_eq!(stats.created, 2);
    assert_eq!(stats.destroyed, 1);
    assert_eq!(stats.outstanding, 1);
}

#[tokio::test(start_paused = true)]
async fn create_failure_is_delivered_to_the_queued_request() {
    // Call 0 succeeds (held), call 1 (for the waiter) fails.
    let pool = Pool::new(Intermittent::new(0b10), config(1)).unwrap();
    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await.map(|r| *r) })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;

    pool.destroy(held).await.unwrap();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::CreateFailed { .. }), "got {err:?}");
    assert_eq!(pool.stats().outstanding, 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_acquire_during_create_releases_capacity() {
    #[derive(Clone)]
    struct Slow;

    impl Factory for Slow {
        type Resource = ();

        async fn create(&self) -> Result<(), BoxError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    let pool = Pool::new(Slow, config(1)).unwrap();
    let attempt = tokio::time::timeout(Duration::from_millis(10), pool.acquire()).await;
    assert!(attempt.is_err(), "create is still running");
    assert_eq!(pool.stats().outstanding, 0, "pending slot rolled back");
    assert_eq!(pool.stats().pending, 0);
}

#[tokio::test(start_paused = true)]
async fn destroy_failure_is_only_a_diagnostic() {
    struct BrokenDestroy;

    impl Factory for BrokenDestroy {
        type Resource = u8;

        async fn create(&self) -> Result<u8, BoxError> {
            Ok(1)
        }

        async fn destroy(&self, _resource: u8) -> Result<(), BoxError> {
            Err("socket already closed".into())
        }
    }

    let pool = Pool::new(BrokenDestroy, config(1)).unwrap();
    let mut events = pool.subscribe();

    drop(pool.acquire().await.unwrap());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stats = pool.stats();
    assert_eq!(stats.outstanding, 0, "failed destroy still frees the slot");
    assert_eq!(stats.destroyed, 1);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let PoolEvent::DestroyFailed { error, .. } = event {
            assert_eq!(error, "socket already closed");
            saw_failure = true;
        }
    }
    assert!(saw_failure);

    // The pool keeps working.
    let again = pool.acquire().await.unwrap();
    assert_eq!(*again, 1);
}
