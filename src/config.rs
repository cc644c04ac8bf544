use crate::error::{Error, Result};
use crate::executor::PanicStrategy;
use std::time::Duration;

/// Upper bound on the worker count accepted by [`PoolConfig::validate`].
pub const MAX_THREADS: usize = 1024;

/// What happens to queued-but-unstarted tasks when the pool shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Drop queued tasks without running them; they are reported as
    /// [`TaskStatus::Discarded`](crate::TaskStatus::Discarded).
    #[default]
    Abandon,
    /// Keep workers running until the queue is empty.
    Drain,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub num_threads: Option<usize>,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
    pub shutdown_policy: ShutdownPolicy,
    pub panic_strategy: PanicStrategy,

    /// How long the terminal status of a finished, failed or discarded task
    /// stays queryable. Zero disables terminal records entirely, so every
    /// completed or unknown id reports `Finished`.
    pub status_retention: Duration,

    /// Maximum number of terminal records kept at once; the oldest are
    /// evicted first.
    pub status_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "taskpool-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
            shutdown_policy: ShutdownPolicy::default(),
            panic_strategy: PanicStrategy::default(),
            status_retention: Duration::from_secs(60),
            status_capacity: 65_536,
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Shorthand for a default config with a fixed worker count.
    pub fn with_threads(n: usize) -> Self {
        Self {
            num_threads: Some(n),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > MAX_THREADS {
                return Err(Error::config(format!(
                    "num_threads too large (max {})",
                    MAX_THREADS
                )));
            }
        }

        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        if let Some(0) = self.stack_size {
            return Err(Error::config("stack_size must be > 0"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.config.shutdown_policy = policy;
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn status_retention(mut self, retention: Duration) -> Self {
        self.config.status_retention = retention;
        self
    }

    pub fn status_capacity(mut self, capacity: usize) -> Self {
        self.config.status_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
