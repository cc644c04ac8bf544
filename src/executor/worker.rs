// worker thread loop
use super::pool::Shared;
use super::task::{Task, TaskStatus};
use crate::config::ShutdownPolicy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub type WorkerId = usize;

/// Where a worker is in its loop. Only surfaced through trace logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Dequeue,
    Executing,
    Publishing,
    Terminated,
}

// stats for each worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub tasks_executed: AtomicU64,
    pub tasks_panicked: AtomicU64,
}

impl WorkerStats {
    pub fn snapshot(&self, id: WorkerId) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            id,
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    pub id: WorkerId,
    pub tasks_executed: u64,
    pub tasks_panicked: u64,
}

pub(crate) struct Worker {
    pub id: WorkerId,
    shared: Arc<Shared>,
    pub stats: Arc<WorkerStats>,
}

impl Worker {
    pub fn new(id: WorkerId, shared: Arc<Shared>) -> Self {
        Self {
            id,
            shared,
            stats: Arc::new(WorkerStats::default()),
        }
    }

    // main loop
    pub fn run(self) {
        tracing::debug!(worker = self.id, "worker started");

        while let Some(task) = self.next_task() {
            self.execute_task(task);
        }

        tracing::debug!(worker = self.id, phase = ?WorkerPhase::Terminated, "worker stopped");
    }

    /// Block until there is work or the pool shuts down. `None` means exit.
    fn next_task(&self) -> Option<Task> {
        let mut state = self.shared.state.lock();

        loop {
            // re-check under the lock; wakeups may be spurious or stolen
            while !state.shutdown && state.queue.is_empty() {
                tracing::trace!(worker = self.id, phase = ?WorkerPhase::Idle, "waiting for work");
                self.shared.work_available.wait(&mut state);
            }

            tracing::trace!(worker = self.id, phase = ?WorkerPhase::Dequeue, "woke up");

            if state.shutdown
                && (self.shared.shutdown_policy == ShutdownPolicy::Abandon
                    || state.queue.is_empty())
            {
                return None;
            }

            if let Some(task) = state.queue.pop() {
                state.registry.set(task.id, TaskStatus::Running);
                return Some(task);
            }
        }
    }

    fn execute_task(&self, task: Task) {
        let tid = task.id;
        tracing::trace!(worker = self.id, task = %tid, phase = ?WorkerPhase::Executing, "running task");

        let start = Instant::now();
        let result = self.shared.panic_handler.execute(tid, || task.execute());
        self.shared.metrics.record_task_execution(start.elapsed());
        self.stats.tasks_executed.fetch_add(1, Ordering::Relaxed);

        let (status, message) = match result {
            Ok(()) => (TaskStatus::Finished, None),
            Err(panic) => {
                self.shared.metrics.record_task_panic();
                self.stats.tasks_panicked.fetch_add(1, Ordering::Relaxed);
                (TaskStatus::Failed, Some(panic.message))
            }
        };

        tracing::trace!(worker = self.id, task = %tid, %status, phase = ?WorkerPhase::Publishing, "task done");

        let mut state = self.shared.state.lock();
        state.registry.erase(&tid);
        state
            .registry
            .record_terminal(tid, status, message, Instant::now());
        state.in_flight -= 1;
        debug_assert_eq!(state.registry.len(), state.in_flight);

        self.shared.task_finished.notify_all();
        if state.in_flight == 0 {
            self.shared.all_finished.notify_all();
        }
    }
}
