//! Background task destroying resources idle past `idle_timeout`.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;

use super::Inner;
use crate::factory::Factory;

/// Spawn the reaper for `inner`.
///
/// The task only holds a weak reference between ticks, so it exits once
/// the pool is gone. `destroy_all_now` stops it through the shutdown token.
pub(super) fn spawn<F: Factory>(inner: &Arc<Inner<F>>) {
    let pool = Arc::downgrade(inner);
    let shutdown = inner.shutdown.clone();
    let every = inner.config.reap_interval;

    inner.runtime.spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(inner) = pool.upgrade() else {
                        break;
                    };
                    inner.reap().await;
                }
            }
        }
    });
}
