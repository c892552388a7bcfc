pub mod task;
pub mod scheduler;
pub mod controller;

pub(crate) mod task_queue;
pub(crate) mod result_queue;
pub(crate) mod background_worker;
pub(crate) mod dispatcher;

pub use controller::{LifecycleState, TaskRunner};
pub use scheduler::{LoopScheduler, Scheduler};
pub use task::{Outcome, OutcomeKind, StopSignal, TaskError, TaskId};
