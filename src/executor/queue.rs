//! FIFO queue of pending tasks.
//!
//! The queue is not synchronized on its own; the pool keeps it behind the
//! same lock as the status registry so that enqueue and status updates are
//! observed together.

use super::task::Task;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove every queued task, front to back.
    pub fn drain(&mut self) -> impl Iterator<Item = Task> + '_ {
        self.tasks.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = TaskQueue::new();
        let ids: Vec<_> = (0..5)
            .map(|_| {
                let task = Task::new(|| {});
                let id = task.id;
                queue.push(task);
                id
            })
            .collect();

        assert_eq!(queue.len(), 5);
        for id in ids {
            assert_eq!(queue.pop().map(|t| t.id), Some(id));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut queue = TaskQueue::new();
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = TaskQueue::new();
        for _ in 0..3 {
            queue.push(Task::new(|| {}));
        }
        assert_eq!(queue.drain().count(), 3);
        assert!(queue.is_empty());
    }
}
