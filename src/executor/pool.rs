use super::panic_handler::PanicHandler;
use super::queue::TaskQueue;
use super::registry::StatusRegistry;
use super::task::{Task, TaskId, TaskStatus};
use super::worker::{Worker, WorkerId, WorkerStats, WorkerStatsSnapshot};
use crate::config::{PoolConfig, ShutdownPolicy};
use crate::error::{Error, Result};
use crate::telemetry::{Metrics, MetricsSnapshot};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Everything guarded by the pool's single lock.
#[derive(Debug)]
pub(crate) struct PoolState {
    pub queue: TaskQueue,
    pub registry: StatusRegistry,
    /// waiting + running tasks
    pub in_flight: usize,
    pub shutdown: bool,
}

/// State shared between the pool handle and its workers.
pub(crate) struct Shared {
    pub state: Mutex<PoolState>,
    /// queue became non-empty, or shutdown was requested
    pub work_available: Condvar,
    pub task_finished: Condvar,
    /// in-flight count dropped to zero
    pub all_finished: Condvar,
    pub shutdown_policy: ShutdownPolicy,
    pub panic_handler: PanicHandler,
    pub metrics: Metrics,
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

/// What [`ThreadPool::shutdown`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tasks dropped from the queue without running, in submission order
    pub discarded: Vec<TaskId>,
    pub workers_joined: usize,
}

/// A fixed-size pool of worker threads executing submitted closures in FIFO
/// order.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use taskpool::{TaskStatus, ThreadPool};
///
/// let pool = ThreadPool::new(4).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// let ids: Vec<_> = (0..10)
///     .map(|_| {
///         let counter = counter.clone();
///         pool.submit(move || {
///             counter.fetch_add(1, Ordering::Relaxed);
///         })
///         .unwrap()
///     })
///     .collect();
///
/// pool.wait_all();
/// assert_eq!(counter.load(Ordering::Relaxed), 10);
/// assert!(ids.iter().all(|id| pool.status(*id) == TaskStatus::Finished));
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<WorkerHandle>>,
    num_threads: usize,
    start_time: Instant,
}

impl ThreadPool {
    /// Create a pool with `num_threads` workers and default settings.
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::with_config(PoolConfig::with_threads(num_threads))
    }

    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: TaskQueue::new(),
                registry: StatusRegistry::new(config.status_retention, config.status_capacity),
                in_flight: 0,
                shutdown: false,
            }),
            work_available: Condvar::new(),
            task_finished: Condvar::new(),
            all_finished: Condvar::new(),
            shutdown_policy: config.shutdown_policy,
            panic_handler: PanicHandler::new(config.panic_strategy),
            metrics: Metrics::new(),
        });

        let pool = Self {
            shared,
            workers: Mutex::new(Vec::with_capacity(num_threads)),
            num_threads,
            start_time: Instant::now(),
        };

        for id in 0..num_threads {
            let worker = Worker::new(id, pool.shared.clone());
            let stats = worker.stats.clone();

            let mut builder =
                thread::Builder::new().name(format!("{}-{}", config.thread_name_prefix, id));
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            // on failure, dropping `pool` joins the workers spawned so far
            let thread = builder.spawn(move || worker.run())?;

            pool.workers.lock().push(WorkerHandle {
                id,
                thread: Some(thread),
                stats,
            });
        }

        tracing::debug!(
            threads = num_threads,
            policy = ?config.shutdown_policy,
            "thread pool started"
        );

        Ok(pool)
    }

    /// Queue `f` for execution and return its identifier.
    ///
    /// Fails only with [`Error::ShutDown`] once shutdown has begun.
    pub fn submit<F>(&self, f: F) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Task::new(f);
        let id = task.id;

        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return Err(Error::ShutDown);
            }
            state.queue.push(task);
            state.registry.set(id, TaskStatus::Waiting);
            state.in_flight += 1;
            self.shared.work_available.notify_one();
        }

        self.shared.metrics.record_task_submitted();
        tracing::trace!(task = %id, "task submitted");

        Ok(id)
    }

    /// Current status of `id`.
    ///
    /// Ids that were never submitted, or whose terminal record has expired,
    /// report [`TaskStatus::Finished`]. Use [`try_status`](Self::try_status)
    /// to tell them apart.
    pub fn status(&self, id: TaskId) -> TaskStatus {
        self.try_status(id).unwrap_or(TaskStatus::Finished)
    }

    /// Like [`status`](Self::status), but `None` for ids the pool has no
    /// record of.
    pub fn try_status(&self, id: TaskId) -> Option<TaskStatus> {
        let state = self.shared.state.lock();
        state.registry.lookup(&id, Instant::now())
    }

    /// The panic message of a task that ended in [`TaskStatus::Failed`].
    pub fn failure(&self, id: TaskId) -> Option<Error> {
        let state = self.shared.state.lock();
        state
            .registry
            .terminal(&id)
            .filter(|record| record.status == TaskStatus::Failed)
            .map(|record| Error::task_failed(record.message.clone().unwrap_or_default()))
    }

    /// Block until every submitted task has finished, failed or been
    /// discarded.
    pub fn wait_all(&self) {
        let mut state = self.shared.state.lock();
        while state.in_flight > 0 {
            self.shared.all_finished.wait(&mut state);
        }
        debug_assert!(state.registry.is_empty());
    }

    /// Block until `id` is no longer waiting or running, then return its
    /// status. Returns immediately for unknown ids.
    pub fn wait(&self, id: TaskId) -> TaskStatus {
        let mut state = self.shared.state.lock();
        while state.registry.get(&id).is_some() {
            self.shared.task_finished.wait(&mut state);
        }
        state
            .registry
            .lookup(&id, Instant::now())
            .unwrap_or(TaskStatus::Finished)
    }

    /// Time since the pool was created.
    pub fn elapsed_time(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Number of tasks waiting or running.
    pub fn pending_tasks(&self) -> usize {
        self.shared.state.lock().in_flight
    }

    /// Number of tasks not yet picked up by a worker.
    pub fn queued_tasks(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.shared.shutdown_policy
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn worker_stats(&self) -> Vec<WorkerStatsSnapshot> {
        self.workers
            .lock()
            .iter()
            .map(|worker| worker.stats.snapshot(worker.id))
            .collect()
    }

    /// Stop accepting tasks and join every worker.
    ///
    /// Under [`ShutdownPolicy::Abandon`] queued tasks are dropped and marked
    /// [`TaskStatus::Discarded`]; under [`ShutdownPolicy::Drain`] they run
    /// first. Tasks already running always complete. Calling this more than
    /// once is harmless; later calls report nothing and do not wait for the
    /// workers another caller is already joining.
    pub fn shutdown(&self) -> ShutdownReport {
        let discarded = self.begin_shutdown();
        self.shared.work_available.notify_all();

        // joined without holding `workers`: running tasks may call back into
        // the pool
        let handles: Vec<(WorkerId, JoinHandle<()>)> = self
            .workers
            .lock()
            .iter_mut()
            .filter_map(|worker| worker.thread.take().map(|thread| (worker.id, thread)))
            .collect();

        let current = thread::current().id();
        let mut workers_joined = 0;
        for (id, thread) in handles {
            // a task holding the last handle to the pool cannot join itself
            if thread.thread().id() == current {
                continue;
            }
            if thread.join().is_err() {
                tracing::warn!(worker = id, "worker thread panicked");
            }
            workers_joined += 1;
        }

        if workers_joined > 0 {
            tracing::debug!(
                workers = workers_joined,
                discarded = discarded.len(),
                "thread pool stopped"
            );
        }

        ShutdownReport {
            discarded,
            workers_joined,
        }
    }

    fn begin_shutdown(&self) -> Vec<TaskId> {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Vec::new();
        }
        state.shutdown = true;

        if self.shared.shutdown_policy == ShutdownPolicy::Drain {
            return Vec::new();
        }

        let dropped: Vec<Task> = state.queue.drain().collect();
        if dropped.is_empty() {
            return Vec::new();
        }

        let now = Instant::now();
        let discarded: Vec<TaskId> = dropped.iter().map(|task| task.id).collect();
        for id in &discarded {
            state.registry.erase(id);
            state
                .registry
                .record_terminal(*id, TaskStatus::Discarded, None, now);
        }
        state.in_flight -= discarded.len();

        tracing::warn!(count = discarded.len(), "discarding queued tasks on shutdown");
        self.shared
            .metrics
            .record_tasks_discarded(discarded.len() as u64);

        self.shared.task_finished.notify_all();
        if state.in_flight == 0 {
            self.shared.all_finished.notify_all();
        }

        // closures may own handles that reach back into the pool
        drop(state);
        drop(dropped);

        discarded
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("policy", &self.shared.shutdown_policy)
            .field("start_time", &self.start_time)
            .finish()
    }
}
