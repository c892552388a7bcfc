use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;
use crate::WorkerError;
use crate::worker::task::{StopSignal, Task};

/// Bounded FIFO between submitters and the worker thread.
pub(crate) struct TaskQueue {
    items: Mutex<VecDeque<Task>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl TaskQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Appends `task`, waiting up to `timeout` for room.
    pub(crate) fn push(&self, task: Task, timeout: Duration, signal: &StopSignal) -> Result<(), WorkerError> {
        let items = self.items.lock()
            .unwrap_or_else(|e| e.into_inner());

        let (mut items, _) = self.not_full
            .wait_timeout_while(items, timeout, |q| q.len() >= self.capacity && !signal.is_raised())
            .unwrap_or_else(|e| e.into_inner());

        if signal.is_raised() {
            return Err(WorkerError::NotRunning);
        }
        if items.len() >= self.capacity {
            return Err(WorkerError::QueueFull);
        }

        items.push_back(task);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Takes the oldest task. Returns `None` if nothing arrived within
    /// `timeout` or the stop signal was raised while waiting on an empty queue.
    pub(crate) fn pop(&self, timeout: Duration, signal: &StopSignal) -> Option<Task> {
        let items = self.items.lock()
            .unwrap_or_else(|e| e.into_inner());

        // wait_timeout_while 内部会处理虚假唤醒
        let (mut items, _) = self.not_empty
            .wait_timeout_while(items, timeout, |q| q.is_empty() && !signal.is_raised())
            .unwrap_or_else(|e| e.into_inner());

        let task = items.pop_front();
        if task.is_some() {
            self.not_full.notify_one();
        }
        task
    }

    /// Discards every pending task, returning how many were dropped.
    pub(crate) fn drain(&self) -> usize {
        let mut items = self.items.lock()
            .unwrap_or_else(|e| e.into_inner());
        let n = items.len();
        items.clear();
        self.not_full.notify_all();
        n
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Wakes every blocked producer and consumer so they re-check the stop signal.
    pub(crate) fn wake_all(&self) {
        let _guard = self.items.lock()
            .unwrap_or_else(|e| e.into_inner());
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}
