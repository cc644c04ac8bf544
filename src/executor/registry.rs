//! Task status bookkeeping.
//!
//! Active tasks (waiting or running) live in `active`; exactly one entry per
//! task while it is in flight. Once a task reaches a terminal state it moves
//! to a bounded record cache so that `status` can tell a finished task from a
//! failed or discarded one. Records leave the cache when they outlive the
//! retention period or when the cache exceeds its capacity, oldest first.

use super::task::{TaskId, TaskStatus};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct TerminalRecord {
    pub status: TaskStatus,
    pub at: Instant,
    pub message: Option<String>,
}

#[derive(Debug)]
pub(crate) struct StatusRegistry {
    active: HashMap<TaskId, TaskStatus>,
    terminal: HashMap<TaskId, TerminalRecord>,
    // insertion order of `terminal`, for oldest-first eviction
    order: VecDeque<TaskId>,
    retention: Duration,
    capacity: usize,
}

impl StatusRegistry {
    pub fn new(retention: Duration, capacity: usize) -> Self {
        Self {
            active: HashMap::new(),
            terminal: HashMap::new(),
            order: VecDeque::new(),
            retention,
            capacity,
        }
    }

    /// Insert or overwrite the status of an active task.
    pub fn set(&mut self, id: TaskId, status: TaskStatus) {
        debug_assert!(!status.is_terminal());
        self.active.insert(id, status);
    }

    pub fn erase(&mut self, id: &TaskId) -> Option<TaskStatus> {
        self.active.remove(id)
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskStatus> {
        self.active.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Remember how a task ended. No-op when retention is disabled.
    pub fn record_terminal(
        &mut self,
        id: TaskId,
        status: TaskStatus,
        message: Option<String>,
        now: Instant,
    ) {
        debug_assert!(status.is_terminal());
        if self.retention.is_zero() || self.capacity == 0 {
            return;
        }

        self.prune(now);
        while self.terminal.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.terminal.remove(&oldest);
                }
                None => break,
            }
        }

        self.terminal.insert(
            id,
            TerminalRecord {
                status,
                at: now,
                message,
            },
        );
        self.order.push_back(id);
    }

    pub fn terminal(&self, id: &TaskId) -> Option<&TerminalRecord> {
        self.terminal.get(id)
    }

    /// Evict terminal records older than the retention period.
    pub fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.order.front() {
            let expired = match self.terminal.get(oldest) {
                Some(record) => now.saturating_duration_since(record.at) > self.retention,
                None => true,
            };
            if !expired {
                break;
            }
            if let Some(oldest) = self.order.pop_front() {
                self.terminal.remove(&oldest);
            }
        }
    }

    /// Status of `id` if it is active or has a live terminal record.
    pub fn lookup(&self, id: &TaskId, now: Instant) -> Option<TaskStatus> {
        if let Some(status) = self.get(id) {
            return Some(status);
        }
        self.terminal
            .get(id)
            .filter(|record| now.saturating_duration_since(record.at) <= self.retention)
            .map(|record| record.status)
    }

    #[cfg(test)]
    pub fn retained(&self) -> usize {
        self.terminal.len()
    }
}
