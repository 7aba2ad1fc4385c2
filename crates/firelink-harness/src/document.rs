#![forbid(unsafe_code)]

//! Document store double.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use firelink_core::{Canceler, Value};

use crate::{CallLog, DEFAULT_DELAY_MS, FakeClock};

/// Document store whose `on_snapshot` answers after a delay and hands back
/// a counting [`Canceler`].
pub struct MockDocumentClient {
    clock: FakeClock,
    log: CallLog,
    snapshot: Value,
    subscribed: Rc<Cell<usize>>,
    cancelled: Rc<Cell<usize>>,
}

impl MockDocumentClient {
    #[must_use]
    pub fn new(clock: &FakeClock, log: &CallLog, snapshot: Value) -> Rc<Self> {
        Rc::new(Self {
            clock: clock.clone(),
            log: log.clone(),
            snapshot,
            subscribed: Rc::new(Cell::new(0)),
            cancelled: Rc::new(Cell::new(0)),
        })
    }

    /// Register `callback` for one snapshot after the default delay.
    pub fn on_snapshot(&self, callback: impl Fn(&Value) + 'static) -> Canceler {
        self.log.push("onSnapshot");
        self.subscribed.set(self.subscribed.get() + 1);
        let snapshot = self.snapshot.clone();
        let live = Rc::new(Cell::new(true));
        {
            let live = Rc::clone(&live);
            self.clock.schedule(DEFAULT_DELAY_MS, move || {
                if live.get() {
                    callback(&snapshot);
                }
            });
        }
        let cancelled = Rc::clone(&self.cancelled);
        let log = self.log.clone();
        Canceler::new(move || {
            live.set(false);
            cancelled.set(cancelled.get() + 1);
            log.push("unsubscribe");
        })
    }

    #[must_use]
    pub fn subscribed(&self) -> usize {
        self.subscribed.get()
    }

    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }

    /// Subscriptions not yet cancelled.
    #[must_use]
    pub fn live(&self) -> usize {
        self.subscribed.get() - self.cancelled.get()
    }
}

impl fmt::Debug for MockDocumentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDocumentClient")
            .field("subscribed", &self.subscribed.get())
            .field("cancelled", &self.cancelled.get())
            .finish()
    }
}
