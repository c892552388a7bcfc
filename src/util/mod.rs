pub(crate) mod constants;
mod worker_config_file;
mod options;

pub use constants::{DEFAULT_DISPATCH_INTERVAL, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_LOG_TARGET, DEFAULT_POLL_INTERVAL,
                    DEFAULT_QUEUE_CAPACITY, DEFAULT_STOP_TIMEOUT, DEFAULT_THREAD_NAME};
pub use worker_config_file::{load_worker_config, WorkerConfigFile};
pub use options::WorkerOptions;
