// Pool throughput benchmarks.
//
// Measures raw acquire/release overhead with a zero-cost resource
// (no I/O, instant create and destroy).

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use nebula_pool::{BoxError, Factory, Pool, PoolConfig};

// -- Minimal no-op factory for benchmarking pool overhead only --

struct NoOp;

impl Factory for NoOp {
    type Resource = u64;

    async fn create(&self) -> Result<u64, BoxError> {
        Ok(0)
    }
}

fn pool_config(max_size: usize, priority_range: usize) -> PoolConfig {
    PoolConfig {
        name: "bench".to_string(),
        max_size,
        idle_timeout: Duration::from_secs(3600),
        reap_interval: Duration::from_secs(3600),
        priority_range,
    }
}

fn single_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");
    let pool = rt
        .block_on(async { Pool::new(NoOp, pool_config(64, 1)) })
        .expect("failed to create pool");

    // Warm up: create one resource so every iteration reuses it.
    rt.block_on(async {
        drop(pool.acquire().await.unwrap());
    });

    c.bench_function("single_thread_acquire_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let resource = pool.acquire().await.unwrap();
                black_box(*resource);
            });
        });
    });
}

fn contended_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");
    // Small pool with priorities so most requests queue.
    let pool = rt
        .block_on(async { Pool::new(NoOp, pool_config(4, 4)) })
        .expect("failed to create pool");

    c.bench_function("contended_acquire_release_4slots_32tasks", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut set = tokio::task::JoinSet::new();
                for task in 0..32usize {
                    let pool = pool.clone();
                    set.spawn(async move {
                        let resource = pool.acquire_with_priority(task % 4).await.unwrap();
                        tokio::task::yield_now().await;
                        black_box(*resource);
                    });
                }
                while let Some(joined) = set.join_next().await {
                    joined.unwrap();
                }
            });
        });
    });
}

criterion_group!(benches, single_thread_throughput, contended_throughput);
criterion_main!(benches);
