use std::any::Any;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identifier handed out at submission; strictly increasing per runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a work closure reports that it did not produce a value.
///
/// Any `std::error::Error` converts into [`TaskError::Failed`], so work bodies
/// can use `?` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    Failed(String),
    Cancelled(String),
}

impl TaskError {
    pub fn failed(msg: impl Into<String>) -> Self {
        TaskError::Failed(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        TaskError::Cancelled(msg.into())
    }
}

impl<E> From<E> for TaskError
where
    E: std::error::Error,
{
    fn from(err: E) -> Self {
        TaskError::Failed(err.to_string())
    }
}

/// What a callback receives. Success is the variant, not the payload: a
/// `Completed(())` is as successful as `Completed(42)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Failed(String),
    Cancelled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Completed,
    Failed,
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Completed(_) => OutcomeKind::Completed,
            Outcome::Failed(_) => OutcomeKind::Failed,
            Outcome::Cancelled(_) => OutcomeKind::Cancelled,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled(_))
    }

    /// The value, if the task completed.
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            _ => None,
        }
    }

    /// Error text as a UI would show it. Cancellations are prefixed with
    /// `cancelled: ` so they stay distinguishable from failures.
    pub fn error(&self) -> Option<String> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Failed(msg) => Some(msg.clone()),
            Outcome::Cancelled(msg) => Some(format!("cancelled: {}", msg)),
        }
    }
}

impl<T> From<Result<T, TaskError>> for Outcome<T> {
    fn from(res: Result<T, TaskError>) -> Self {
        match res {
            Ok(v) => Outcome::Completed(v),
            Err(TaskError::Failed(msg)) => Outcome::Failed(msg),
            Err(TaskError::Cancelled(msg)) => Outcome::Cancelled(msg),
        }
    }
}

/// Cooperative stop flag shared by one worker session.
///
/// Raised by [`TaskRunner::stop`](crate::TaskRunner::stop); long work bodies
/// poll it through [`StopSignal::check`].
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    raised: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// `Err(TaskError::Cancelled)` once a stop has been requested.
    pub fn check(&self) -> Result<(), TaskError> {
        if self.is_raised() {
            Err(TaskError::cancelled("worker is stopping"))
        } else {
            Ok(())
        }
    }
}

type Job = Box<dyn FnOnce(&StopSignal) -> Completion + Send + 'static>;
type Delivery = Box<dyn FnOnce() + Send + 'static>;

/// A queued unit of work with its callback already bound to it.
pub(crate) struct Task {
    id: TaskId,
    job: Job,
}

impl Task {
    pub(crate) fn new<T, W, C>(id: TaskId, work: W, on_complete: C) -> Self
    where
        T: Send + 'static,
        W: FnOnce(&StopSignal) -> Result<T, TaskError> + Send + 'static,
        C: FnOnce(Outcome<T>) + Send + 'static,
    {
        let job: Job = Box::new(move |signal: &StopSignal| {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(move || work(signal))) {
                Ok(res) => Outcome::from(res),
                Err(payload) => Outcome::Failed(panic_message(payload.as_ref())),
            };
            Completion::new(id, outcome, on_complete)
        });

        Self { id, job }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Runs the work closure on the current thread. Never unwinds.
    pub(crate) fn run(self, signal: &StopSignal) -> Completion {
        (self.job)(signal)
    }
}

/// A finished task waiting for the dispatcher: its outcome already sits
/// inside `deliver`, together with the callback.
pub(crate) struct Completion {
    id: TaskId,
    kind: OutcomeKind,
    deliver: Delivery,
}

impl Completion {
    fn new<T, C>(id: TaskId, outcome: Outcome<T>, on_complete: C) -> Self
    where
        T: Send + 'static,
        C: FnOnce(Outcome<T>) + Send + 'static,
    {
        Self {
            id,
            kind: outcome.kind(),
            deliver: Box::new(move || on_complete(outcome)),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub(crate) fn deliver(self) {
        (self.deliver)()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
