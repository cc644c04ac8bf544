//! Observability for the pool.
//!
//! Counters and an execution-time histogram, readable at any time through
//! [`ThreadPool::metrics`](crate::ThreadPool::metrics).

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
