use std::panic::{self, AssertUnwindSafe};
use log::{debug, error};
use crate::worker::result_queue::ResultQueue;
use crate::worker::task::panic_message;

/// Main-thread side of the result queue.
pub(crate) struct Dispatcher<'a> {
    results: &'a ResultQueue,
    log_target: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(results: &'a ResultQueue, log_target: &'a str) -> Self {
        Self { results, log_target }
    }

    /// Invokes the callback of every completion available right now, on the
    /// calling thread, oldest first. A panicking callback is logged and the
    /// rest still run. Returns how many callbacks were invoked.
    pub(crate) fn dispatch_once(&self) -> usize {
        let batch = self.results.take_available();
        let n = batch.len();

        for completion in batch {
            let id = completion.id();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| completion.deliver())) {
                error!(target: self.log_target, "callback for task {} panicked: {}",
                    id, panic_message(payload.as_ref()));
            }
        }

        if n > 0 {
            debug!(target: self.log_target, "dispatched {} result(s)", n);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::task::{Outcome, StopSignal, Task, TaskId};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_panicking_callback_does_not_stop_draining() {
        let results = ResultQueue::new();
        let signal = StopSignal::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 1..=3u64 {
            let sink = Arc::clone(&seen);
            let task = Task::new(TaskId(id), move |_| Ok(id), move |outcome: Outcome<u64>| {
                if id == 2 {
                    panic!("broken callback");
                }
                sink.lock().unwrap().push(outcome.value().unwrap());
            });
            results.push(task.run(&signal));
        }

        let dispatched = Dispatcher::new(&results, "test::dispatch").dispatch_once();
        assert_eq!(dispatched, 3);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
        assert_eq!(results.len(), 0);
    }

    #[test]
    fn test_empty_queue_is_noop() {
        let results = ResultQueue::new();
        assert_eq!(Dispatcher::new(&results, "test::dispatch").dispatch_once(), 0);
    }
}
