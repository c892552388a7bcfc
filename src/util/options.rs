use std::time::Duration;
use crate::util::constants::{DEFAULT_DISPATCH_INTERVAL, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_LOG_TARGET,
                             DEFAULT_POLL_INTERVAL, DEFAULT_QUEUE_CAPACITY, DEFAULT_STOP_TIMEOUT,
                             DEFAULT_THREAD_NAME};
use crate::WorkerError;

/// Runtime knobs of a [`TaskRunner`](crate::TaskRunner).
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    // Task queue
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,

    // Worker thread
    pub poll_interval: Duration,
    pub thread_name: String,

    // Dispatcher
    pub dispatch_interval: Duration,

    // Lifecycle
    pub stop_timeout: Duration,

    /// Log target used by every record this runner emits
    pub log_target: String,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,

            poll_interval: DEFAULT_POLL_INTERVAL,
            thread_name: DEFAULT_THREAD_NAME.to_string(),

            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,

            stop_timeout: DEFAULT_STOP_TIMEOUT,

            log_target: DEFAULT_LOG_TARGET.to_string(),
        }
    }
}

impl WorkerOptions {
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.queue_capacity == 0 {
            return Err(WorkerError::InvalidArgument("queue_capacity must be > 0".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(WorkerError::InvalidArgument("poll_interval must be > 0".into()));
        }
        if self.dispatch_interval.is_zero() {
            return Err(WorkerError::InvalidArgument("dispatch_interval must be > 0".into()));
        }
        if self.log_target.is_empty() {
            return Err(WorkerError::InvalidArgument("log_target must not be empty".into()));
        }
        Ok(())
    }
}
