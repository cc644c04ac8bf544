//! taskpool - a fixed-size worker thread pool with task status tracking
//!
//! Submit closures, get back a [`TaskId`], and either poll its
//! [`TaskStatus`] or block until one task or every task is done.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//! use taskpool::prelude::*;
//!
//! let pool = ThreadPool::new(4)?;
//! let total = Arc::new(AtomicU64::new(0));
//!
//! for n in 1..=100u64 {
//!     let total = total.clone();
//!     pool.submit(move || {
//!         total.fetch_add(n, Ordering::Relaxed);
//!     })?;
//! }
//!
//! pool.wait_all();
//! println!("sum: {} in {:?}", total.load(Ordering::Relaxed), pool.elapsed_time());
//! # Ok::<(), taskpool::Error>(())
//! ```
//!
//! # Features
//!
//! - **FIFO dispatch**: tasks are started in submission order
//! - **Status tracking**: waiting, running, finished, failed or discarded
//! - **Blocking waits**: [`ThreadPool::wait`] and [`ThreadPool::wait_all`]
//!   sleep on condition variables, no polling
//! - **Panic isolation**: a panicking task is marked failed and its worker
//!   keeps going
//! - **Explicit shutdown policy**: drain the queue or abandon it
//! - **Metrics**: task counters and an execution-time histogram

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{PoolConfig, PoolConfigBuilder, ShutdownPolicy, MAX_THREADS};
pub use error::{Error, Result};
pub use executor::{PanicStrategy, ShutdownReport, TaskId, TaskStatus, ThreadPool};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_basic_submit_and_wait_all() {
        let pool = ThreadPool::new(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        pool.wait_all();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
        assert_eq!(pool.pending_tasks(), 0);
    }

    #[test]
    fn test_zero_threads_is_config_error() {
        let err = ThreadPool::new(0).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_wait_all_on_idle_pool_returns() {
        let pool = ThreadPool::new(1).unwrap();
        pool.wait_all();
        assert_eq!(pool.num_threads(), 1);
    }

    #[test]
    fn test_failure_message() {
        let config = PoolConfig::builder()
            .num_threads(1)
            .panic_strategy(PanicStrategy::Isolate)
            .build()
            .unwrap();
        let pool = ThreadPool::with_config(config).unwrap();

        let id = pool.submit(|| panic!("bad input")).unwrap();
        assert_eq!(pool.wait(id), TaskStatus::Failed);

        let err = pool.failure(id).unwrap();
        assert_eq!(err.to_string(), "task failed: bad input");

        let ok = pool.submit(|| {}).unwrap();
        pool.wait(ok);
        assert!(pool.failure(ok).is_none());
    }

    #[test]
    fn test_worker_stats_cover_all_workers() {
        let pool = ThreadPool::new(3).unwrap();
        for _ in 0..30 {
            pool.submit(|| {}).unwrap();
        }
        pool.wait_all();

        let stats = pool.worker_stats();
        assert_eq!(stats.len(), 3);
        let executed: u64 = stats.iter().map(|s| s.tasks_executed).sum();
        assert_eq!(executed, 30);
    }
}
