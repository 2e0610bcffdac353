//! # Nebula Pool
//!
//! Bounded async resource pool for the Nebula workflow engine.
//!
//! A [`Pool`] hands out at most `max_size` resources built by a
//! [`Factory`]. Requests that cannot be served wait in a priority queue,
//! released resources are reused oldest-idle first, a background reaper
//! destroys resources idle for too long, and [`Pool::drain`] /
//! [`Pool::destroy_all_now`] implement graceful and forced shutdown.
//!
//! ```
//! use nebula_pool::{BoxError, FnFactory, Pool, PoolConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> nebula_pool::Result<()> {
//! let factory = FnFactory::new(
//!     || async { Ok::<_, BoxError>(Vec::<u8>::with_capacity(4096)) },
//!     |_buf: Vec<u8>| async { Ok::<_, BoxError>(()) },
//! );
//! let pool = Pool::new(factory, PoolConfig { max_size: 2, ..Default::default() })?;
//!
//! let mut buf = pool.acquire().await?;
//! buf.extend_from_slice(b"payload");
//! pool.release(buf)?;
//!
//! pool.drain().await;
//! pool.destroy_all_now().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod factory;
pub mod guard;
pub mod pool;

pub use error::{BoxError, Error, Result};
pub use events::{DestroyReason, EventBus, PoolEvent};
pub use factory::{Factory, FnFactory};
pub use guard::Pooled;
pub use pool::{Pool, PoolConfig, PoolStats, SlotId, SlotState};
