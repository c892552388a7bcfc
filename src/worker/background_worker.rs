use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;
use log::{debug, error, info};
use crate::worker::result_queue::ResultQueue;
use crate::worker::task::{OutcomeKind, StopSignal};
use crate::worker::task_queue::TaskQueue;

/// Queues and stop flag of one start/stop cycle. Every `start()` builds a
/// fresh one, so a worker that outlives its `stop()` can only touch its own.
pub(crate) struct Session {
    pub(crate) tasks: TaskQueue,
    pub(crate) results: ResultQueue,
    pub(crate) signal: StopSignal,
}

impl Session {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            tasks: TaskQueue::new(capacity),
            results: ResultQueue::new(),
            signal: StopSignal::new(),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.signal.raise();
        self.tasks.wake_all();
    }

    /// Empties both queues. Returns `(tasks, results)` dropped.
    pub(crate) fn drain(&self) -> (usize, usize) {
        (self.tasks.drain(), self.results.drain())
    }
}

/// Body of the worker thread. `_exited` is dropped when this returns (or
/// unwinds), which is what `stop()` waits on.
pub(crate) fn background_loop(
    session: Arc<Session>,
    poll_interval: Duration,
    log_target: String,
    _exited: Sender<()>,
) {
    let target = log_target.as_str();
    info!(target: target, "worker started");

    loop {
        if session.signal.is_raised() {
            break;
        }

        let Some(task) = session.tasks.pop(poll_interval, &session.signal) else {
            continue;
        };

        // 已经请求停止：丢弃，不执行
        if session.signal.is_raised() {
            debug!(target: target, "discarding task {} dequeued after stop request", task.id());
            break;
        }

        let id = task.id();
        debug!(target: target, "executing task {}", id);
        let completion = task.run(&session.signal);
        match completion.kind() {
            OutcomeKind::Completed => debug!(target: target, "task {} completed", id),
            OutcomeKind::Cancelled => info!(target: target, "task {} cancelled itself", id),
            OutcomeKind::Failed => error!(target: target, "task {} failed", id),
        }
        session.results.push(completion);
    }

    debug!(target: target, "worker draining: {} task(s) left unexecuted", session.tasks.len());
    info!(target: target, "worker terminated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::task::{Outcome, Task, TaskError, TaskId};
    use std::sync::Mutex;
    use std::sync::mpsc;
    use std::thread;

    const POLL: Duration = Duration::from_millis(10);

    fn spawn(session: &Arc<Session>) -> (thread::JoinHandle<()>, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        let s = Arc::clone(session);
        let handle = thread::spawn(move || background_loop(s, POLL, "test::worker".to_string(), tx));
        (handle, rx)
    }

    fn wait_for_results(session: &Session, n: usize) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while session.results.len() < n {
            assert!(std::time::Instant::now() < deadline, "timed out waiting for results");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_loop_runs_tasks_and_survives_failures() {
        let session = Arc::new(Session::new(8));
        let (handle, _rx) = spawn(&session);

        let seen = Arc::new(Mutex::new(Vec::new()));
        for (i, fail) in [(1u64, false), (2, true), (3, false)] {
            let sink = Arc::clone(&seen);
            let task = Task::new(
                TaskId(i),
                move |_| if fail { Err(TaskError::failed("boom")) } else { Ok(i) },
                move |outcome: Outcome<u64>| sink.lock().unwrap().push(outcome),
            );
            session.tasks.push(task, POLL, &session.signal).unwrap();
        }

        wait_for_results(&session, 3);
        for c in session.results.take_available() {
            c.deliver();
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Outcome::Completed(1), Outcome::Failed("boom".into()), Outcome::Completed(3)]
        );

        session.request_stop();
        handle.join().unwrap();
    }

    #[test]
    fn test_exit_disconnects_channel() {
        let session = Arc::new(Session::new(1));
        let (handle, rx) = spawn(&session);

        session.request_stop();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Err(mpsc::RecvTimeoutError::Disconnected));
        handle.join().unwrap();
    }

    #[test]
    fn test_session_drain() {
        let session = Session::new(4);
        session.tasks.push(Task::new(TaskId(1), |_| Ok(()), |_| {}), POLL, &session.signal).unwrap();
        session.results.push(Task::new(TaskId(2), |_| Ok(()), |_| {}).run(&session.signal));
        assert_eq!(session.drain(), (1, 1));
        assert_eq!(session.drain(), (0, 0));
    }
}
