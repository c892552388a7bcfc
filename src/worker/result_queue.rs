use std::collections::VecDeque;
use std::sync::Mutex;
use crate::worker::task::Completion;

/// Unbounded FIFO from the worker thread to the dispatcher. Never blocks.
pub(crate) struct ResultQueue {
    items: Mutex<VecDeque<Completion>>,
}

impl ResultQueue {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, completion: Completion) {
        self.items.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(completion);
    }

    /// Takes everything queued right now, oldest first. Completions pushed
    /// after this call wait for the next drain.
    pub(crate) fn take_available(&self) -> VecDeque<Completion> {
        let mut items = self.items.lock()
            .unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *items)
    }

    pub(crate) fn drain(&self) -> usize {
        self.take_available().len()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::task::{StopSignal, Task, TaskId};

    fn completed(id: u64) -> Completion {
        Task::new(TaskId(id), move |_| Ok(id), |_| {}).run(&StopSignal::new())
    }

    #[test]
    fn test_later_pushes_wait_for_next_take() {
        let q = ResultQueue::new();
        q.push(completed(1));
        let first = q.take_available();
        q.push(completed(2));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id(), TaskId(1));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_take_available_empties_queue() {
        let q = ResultQueue::new();
        for i in 0..3 {
            q.push(completed(i));
        }
        let batch = q.take_available();
        assert_eq!(batch.iter().map(|c| c.id().0).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn test_drain_counts() {
        let q = ResultQueue::new();
        q.push(completed(7));
        assert_eq!(q.drain(), 1);
        assert_eq!(q.drain(), 0);
    }
}
