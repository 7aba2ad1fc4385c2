#![forbid(unsafe_code)]

//! Deterministic timer queue.
//!
//! Doubles schedule their "later" callbacks on a [`FakeClock`]; tests decide
//! when time passes. Callbacks run outside the clock's borrow, so a callback
//! may schedule more work.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

struct Timer {
    due: u64,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct ClockInner {
    now: u64,
    next_seq: u64,
    timers: Vec<Timer>,
}

impl ClockInner {
    /// Remove and return the earliest timer matching `ready`.
    fn pop_earliest(&mut self, ready: impl Fn(&Timer) -> bool) -> Option<Timer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|&(_, t)| ready(t))
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(index))
    }
}

/// Shared fake clock. Clones drive the same queue.
#[derive(Clone, Default)]
pub struct FakeClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl FakeClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds since creation.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    /// Run `task` once `delay_ms` has elapsed.
    pub fn schedule(&self, delay_ms: u64, task: impl FnOnce() + 'static) {
        let mut inner = self.inner.borrow_mut();
        let timer = Timer {
            due: inner.now + delay_ms,
            seq: inner.next_seq,
            task: Box::new(task),
        };
        inner.next_seq += 1;
        inner.timers.push(timer);
    }

    /// Number of timers not yet fired.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Fire every timer pending right now, in due order, skipping timers
    /// they schedule. Returns how many fired.
    pub fn run_only_pending(&self) -> usize {
        let cutoff = self.inner.borrow().next_seq;
        let mut fired = 0;
        loop {
            let timer = {
                let mut inner = self.inner.borrow_mut();
                let Some(timer) = inner.pop_earliest(|t| t.seq < cutoff) else {
                    break;
                };
                inner.now = inner.now.max(timer.due);
                timer
            };
            (timer.task)();
            fired += 1;
        }
        fired
    }

    /// Move time forward by `ms`, firing every timer that falls due.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.inner.borrow().now + ms;
        let mut fired = 0;
        loop {
            let timer = {
                let mut inner = self.inner.borrow_mut();
                let Some(timer) = inner.pop_earliest(|t| t.due <= target) else {
                    inner.now = target;
                    break;
                };
                inner.now = timer.due;
                timer
            };
            (timer.task)();
            fired += 1;
        }
        fired
    }

    /// Fire timers until none are left, including ones scheduled along the
    /// way. Returns how many fired.
    pub fn run_all(&self) -> usize {
        let mut fired = 0;
        while self.pending() > 0 {
            fired += self.run_only_pending();
        }
        fired
    }

    /// Drop every pending timer without running it.
    pub fn clear(&self) {
        self.inner.borrow_mut().timers.clear();
    }
}

impl fmt::Debug for FakeClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FakeClock")
            .field("now", &inner.now)
            .field("pending", &inner.timers.len())
            .finish()
    }
}
