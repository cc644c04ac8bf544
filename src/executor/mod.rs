//! Task execution infrastructure.
//!
//! This module provides the worker threads, the shared task queue, the
//! status registry and the thread pool that ties them together.

pub mod panic_handler;
pub mod pool;
pub(crate) mod queue;
pub(crate) mod registry;
pub mod task;
pub mod worker;

pub use panic_handler::{PanicHandler, PanicStrategy, TaskPanic};
pub use pool::{ShutdownReport, ThreadPool};
pub use task::{TaskId, TaskStatus};
pub use worker::{WorkerId, WorkerPhase, WorkerStatsSnapshot};
