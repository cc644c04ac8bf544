pub use crate::config::{PoolConfig, PoolConfigBuilder, ShutdownPolicy};
pub use crate::error::{Error, Result};
pub use crate::executor::{PanicStrategy, ShutdownReport, TaskId, TaskStatus, ThreadPool};
pub use crate::telemetry::MetricsSnapshot;
