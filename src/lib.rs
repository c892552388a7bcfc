pub mod worker;
pub mod util;
pub mod error;

pub use crate::error::WorkerError;
pub use crate::util::{load_worker_config, WorkerConfigFile, WorkerOptions};
pub use crate::worker::{LifecycleState, LoopScheduler, Outcome, OutcomeKind, Scheduler, StopSignal, TaskError,
                        TaskId, TaskRunner};
