use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// "Run this later on the host thread", as provided by whatever event loop
/// hosts the runner (a GUI toolkit's timer, a CLI prompt loop, ...).
pub trait Scheduler {
    fn after(&self, delay: Duration, job: Box<dyn FnOnce()>);

    /// Hosts return `true` once they are tearing down; self-rescheduling
    /// jobs stop re-registering.
    fn is_shutting_down(&self) -> bool {
        false
    }
}

struct Timer {
    due: Instant,
    seq: u64,
    job: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct LoopInner {
    timers: Vec<Timer>,
    next_seq: u64,
    shutdown: bool,
}

/// Single-threaded timer loop for hosts without their own event loop.
///
/// Clones share one timer list. Jobs run on the thread calling
/// [`run_pending`](LoopScheduler::run_pending) and may schedule more jobs.
#[derive(Clone, Default)]
pub struct LoopScheduler {
    inner: Rc<RefCell<LoopInner>>,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown(&self) {
        self.inner.borrow_mut().shutdown = true;
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    fn next_due(&self) -> Option<Instant> {
        self.inner.borrow().timers.iter().map(|t| t.due).min()
    }

    fn pop_due(&self, now: Instant) -> Option<Timer> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(inner.timers.swap_remove(idx))
    }

    /// Runs every job that is due now, in due order. Jobs scheduled while
    /// running are picked up only if they are already due.
    pub fn run_pending(&self) -> usize {
        let now = Instant::now();
        let mut ran = 0;
        while let Some(timer) = self.pop_due(now) {
            // borrow released before the job runs
            (timer.job)();
            ran += 1;
        }
        ran
    }

    /// Drives the loop until `done()` holds or `deadline` passes. Returns
    /// whether `done()` was reached.
    pub fn run_until(&self, deadline: Instant, mut done: impl FnMut() -> bool) -> bool {
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let wake = self.next_due().unwrap_or(deadline).min(deadline);
            let nap = wake.saturating_duration_since(now).min(Duration::from_millis(10));
            thread::sleep(nap);
        }
    }
}

impl Scheduler for LoopScheduler {
    fn after(&self, delay: Duration, job: Box<dyn FnOnce()>) {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.timers.push(Timer {
            due: Instant::now() + delay,
            seq,
            job,
        });
    }

    fn is_shutting_down(&self) -> bool {
        self.inner.borrow().shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_jobs_run_in_due_order() {
        let sched = LoopScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("b", 20u64), ("a", 0), ("c", 20)] {
            let log = Rc::clone(&log);
            sched.after(Duration::from_millis(ms), Box::new(move || log.borrow_mut().push(name)));
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        assert!(sched.run_until(deadline, || log.borrow().len() == 3));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_job_can_reschedule_itself() {
        fn tick(sched: LoopScheduler, count: Rc<Cell<u32>>) {
            count.set(count.get() + 1);
            if count.get() < 3 {
                let s = sched.clone();
                sched.after(Duration::from_millis(1), Box::new(move || tick(s, count)));
            }
        }

        let sched = LoopScheduler::new();
        let count = Rc::new(Cell::new(0));
        {
            let s = sched.clone();
            let c = Rc::clone(&count);
            sched.after(Duration::ZERO, Box::new(move || tick(s, c)));
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        assert!(sched.run_until(deadline, || count.get() == 3));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_run_until_gives_up_at_deadline() {
        let sched = LoopScheduler::new();
        let deadline = Instant::now() + Duration::from_millis(30);
        assert!(!sched.run_until(deadline, || false));
    }

    #[test]
    fn test_shutdown_flag() {
        let sched = LoopScheduler::new();
        assert!(!sched.is_shutting_down());
        sched.clone().shutdown();
        assert!(sched.is_shutting_down());
    }
}
