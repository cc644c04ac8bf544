//! Per-task fault boundary.

use super::task::TaskId;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// How a worker reacts when a task panics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Abort the whole process
    Abort,
    /// Record the failure silently
    Isolate,
    /// Record the failure and emit a warning
    #[default]
    LogAndContinue,
}

#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        Self { strategy }
    }

    /// Run `f`, turning a panic into `Err` instead of unwinding the worker.
    pub fn execute<F, R>(&self, id: TaskId, f: F) -> Result<R, TaskPanic>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(payload) => {
                let panic = TaskPanic::from_payload(payload);

                match self.strategy {
                    PanicStrategy::Abort => {
                        tracing::error!(task = %id, message = %panic.message, "task panicked, aborting");
                        std::process::abort();
                    }
                    PanicStrategy::Isolate => {}
                    PanicStrategy::LogAndContinue => {
                        tracing::warn!(task = %id, message = %panic.message, "task panicked");
                    }
                }

                Err(panic)
            }
        }
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

/// A caught task panic
#[derive(Debug, Clone)]
pub struct TaskPanic {
    pub message: String,
}

impl TaskPanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_handler_isolate() {
        let handler = PanicHandler::new(PanicStrategy::Isolate);

        let result = handler.execute(TaskId::new(), || {
            panic!("test panic");
        });

        assert_eq!(result.unwrap_err().message, "test panic");
    }

    #[test]
    fn test_panic_handler_success() {
        let handler = PanicHandler::new(PanicStrategy::Isolate);

        let result = handler.execute(TaskId::new(), || 42);

        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_formatted_panic_message() {
        let handler = PanicHandler::new(PanicStrategy::LogAndContinue);

        let messages: Vec<String> = (0..3)
            .filter_map(|i| {
                handler
                    .execute(TaskId::new(), || panic!("failed on {}", i))
                    .err()
            })
            .map(|panic| panic.message)
            .collect();

        assert_eq!(messages, ["failed on 0", "failed on 1", "failed on 2"]);
    }

    #[test]
    fn test_non_string_payload() {
        let handler = PanicHandler::new(PanicStrategy::Isolate);
        let err = handler
            .execute(TaskId::new(), || std::panic::panic_any(7u32))
            .unwrap_err();
        assert_eq!(err.message, "unknown panic");
    }
}
