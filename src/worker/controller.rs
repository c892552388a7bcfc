use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{debug, error, info, warn};
use crate::WorkerError;
use crate::util::WorkerOptions;
use crate::worker::background_worker::{background_loop, Session};
use crate::worker::dispatcher::Dispatcher;
use crate::worker::scheduler::Scheduler;
use crate::worker::task::{Outcome, StopSignal, Task, TaskError, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Running,
    Stopping,
}

struct Inner {
    state: LifecycleState,
    session: Option<Arc<Session>>,
    handle: Option<JoinHandle<()>>,
    exited: Option<Receiver<()>>,
}

/// Runs blocking work on one background thread and hands the outcomes back
/// to the thread that calls [`dispatch_once`](TaskRunner::dispatch_once) or
/// [`pump`](TaskRunner::pump).
///
/// Tasks execute one at a time in submission order. Callbacks only ever run
/// inside `dispatch_once`, never on the worker thread.
pub struct TaskRunner {
    options: WorkerOptions,
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl TaskRunner {
    pub fn new(options: WorkerOptions) -> Result<Self, WorkerError> {
        options.validate()?;
        Ok(Self {
            options,
            inner: Mutex::new(Inner {
                state: LifecycleState::Stopped,
                session: None,
                handle: None,
                exited: None,
            }),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    fn target(&self) -> &str {
        &self.options.log_target
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Spawns the worker thread. Starting a running runner only logs a warning.
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut inner = self.lock();
        match inner.state {
            LifecycleState::Running => {
                warn!(target: self.target(), "start() called while already running");
                return Ok(());
            }
            LifecycleState::Stopping => {
                warn!(target: self.target(), "start() called while stopping");
                return Err(WorkerError::NotRunning);
            }
            LifecycleState::Stopped => {}
        }

        let session = Arc::new(Session::new(self.options.queue_capacity));
        let (tx, rx) = mpsc::channel();

        let worker_session = Arc::clone(&session);
        let poll_interval = self.options.poll_interval;
        let log_target = self.options.log_target.clone();

        let handle = thread::Builder::new()
            .name(self.options.thread_name.clone())
            .spawn(move || {
                background_loop(worker_session, poll_interval, log_target, tx);
            })?;

        inner.session = Some(session);
        inner.handle = Some(handle);
        inner.exited = Some(rx);
        inner.state = LifecycleState::Running;
        info!(target: self.target(), "runner started (capacity {})", self.options.queue_capacity);
        Ok(())
    }

    /// Asks the worker to finish, waits up to `timeout` for it, then drains
    /// both queues. The task being executed (if any) runs to completion;
    /// queued tasks are discarded. A worker that misses the deadline is
    /// detached, not killed.
    ///
    /// If another caller is already stopping, this returns at once while the
    /// state is still `Stopping`; `is_running() == false` alone does not mean
    /// the worker has exited. Check `state() == LifecycleState::Stopped`.
    pub fn stop(&self, timeout: Duration) {
        let (session, handle, exited) = {
            let mut inner = self.lock();
            if inner.state != LifecycleState::Running {
                debug!(target: self.target(), "stop() ignored in state {:?}", inner.state);
                return;
            }
            inner.state = LifecycleState::Stopping;
            (inner.session.take(), inner.handle.take(), inner.exited.take())
        };

        if let Some(session) = &session {
            session.request_stop();
        }

        let finished = match exited {
            Some(rx) => !matches!(rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout)),
            None => true,
        };

        if finished {
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    error!(target: self.target(), "worker thread panicked");
                }
            }
        } else {
            error!(target: self.target(), "worker did not stop within {:?}; detaching it", timeout);
            drop(handle);
        }

        if let Some(session) = &session {
            let (tasks, results) = session.drain();
            if tasks > 0 || results > 0 {
                info!(target: self.target(), "discarded {} queued task(s) and {} undelivered result(s)",
                    tasks, results);
            }
        }

        self.lock().state = LifecycleState::Stopped;
        info!(target: self.target(), "runner stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lock().state == LifecycleState::Running
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    fn current_session(&self) -> Result<Arc<Session>, WorkerError> {
        let inner = self.lock();
        match (&inner.state, &inner.session) {
            (LifecycleState::Running, Some(session)) => Ok(Arc::clone(session)),
            _ => Err(WorkerError::NotRunning),
        }
    }

    /// Queues `work` for the worker thread; `on_complete` later receives
    /// its outcome on the dispatching thread.
    ///
    /// # Errors
    /// - [`WorkerError::NotRunning`] if the runner is stopping or stopped
    /// - [`WorkerError::QueueFull`] if no slot freed up within `enqueue_timeout`
    pub fn add_task<T, W, C>(&self, work: W, on_complete: C) -> Result<TaskId, WorkerError>
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T, TaskError> + Send + 'static,
        C: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.add_cancellable_task(move |_| work(), on_complete)
    }

    /// Like [`add_task`](TaskRunner::add_task), but `work` gets the session's
    /// [`StopSignal`] so it can bail out early with `signal.check()?`.
    pub fn add_cancellable_task<T, W, C>(&self, work: W, on_complete: C) -> Result<TaskId, WorkerError>
    where
        T: Send + 'static,
        W: FnOnce(&StopSignal) -> Result<T, TaskError> + Send + 'static,
        C: FnOnce(Outcome<T>) + Send + 'static,
    {
        let session = self.current_session()?;
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let task = Task::new(id, work, on_complete);
        match session.tasks.push(task, self.options.enqueue_timeout, &session.signal) {
            Ok(()) => {
                debug!(target: self.target(), "queued task {}", id);
                Ok(id)
            }
            Err(e) => {
                warn!(target: self.target(), "task {} rejected: {}", id, e);
                Err(e)
            }
        }
    }

    /// Tasks waiting to be picked up by the worker.
    pub fn pending_tasks(&self) -> usize {
        self.lock().session.as_ref().map_or(0, |s| s.tasks.len())
    }

    /// Outcomes waiting for the dispatcher.
    pub fn pending_results(&self) -> usize {
        self.lock().session.as_ref().map_or(0, |s| s.results.len())
    }

    /// Stop signal of the current session, if running.
    pub fn stop_signal(&self) -> Option<StopSignal> {
        self.lock().session.as_ref().map(|s| s.signal.clone())
    }

    /// Delivers every outcome available right now. Call from the host thread.
    pub fn dispatch_once(&self) -> usize {
        let session = self.lock().session.clone();
        match session {
            Some(session) => Dispatcher::new(&session.results, self.target()).dispatch_once(),
            None => 0,
        }
    }

    /// Dispatches, then re-registers itself with `scheduler` after
    /// `dispatch_interval`. The chain ends once the host shuts down or the
    /// runner stops; call `pump` again after a restart.
    pub fn pump<S>(self: &Arc<Self>, scheduler: &S)
    where
        S: Scheduler + Clone + 'static,
    {
        self.dispatch_once();

        if scheduler.is_shutting_down() || !self.is_running() {
            debug!(target: self.target(), "pump chain ended");
            return;
        }

        let runner = Arc::clone(self);
        let next = scheduler.clone();
        scheduler.after(
            self.options.dispatch_interval,
            Box::new(move || runner.pump(&next)),
        );
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop(self.options.stop_timeout);
        }
    }
}
