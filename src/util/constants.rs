use std::time::Duration;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_THREAD_NAME: &str = "pcopt-worker";
pub const DEFAULT_LOG_TARGET: &str = "pcopt::worker";

pub const CONFIG_FILE_STEM: &str = "worker";
