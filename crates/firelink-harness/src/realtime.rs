#![forbid(unsafe_code)]

//! Realtime store double.
//!
//! `on` schedules one snapshot delivery after a delay and returns the
//! callback it was given. `off` and `set` are recorded per client so tests
//! can count releases across every resource handle the client produced.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use firelink_core::{EventKind, RealtimeClient, RealtimeResource, SnapshotCallback, Value};

use crate::{CallLog, DEFAULT_DELAY_MS, FakeClock};

/// One recorded `off` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffCall {
    pub path: String,
    pub kind: Option<EventKind>,
    /// Whether a specific callback was named.
    pub targeted: bool,
}

#[derive(Default)]
struct Shared {
    on_calls: Vec<(String, EventKind)>,
    off_calls: Vec<OffCall>,
    writes: Vec<(String, Value)>,
    live: Vec<(String, EventKind, SnapshotCallback)>,
}

/// Path-addressable store that answers every listener with `snapshot`.
pub struct MockRealtimeClient {
    clock: FakeClock,
    log: CallLog,
    snapshot: Value,
    shared: Rc<RefCell<Shared>>,
}

impl MockRealtimeClient {
    #[must_use]
    pub fn new(clock: &FakeClock, log: &CallLog, snapshot: Value) -> Rc<Self> {
        Rc::new(Self {
            clock: clock.clone(),
            log: log.clone(),
            snapshot,
            shared: Rc::new(RefCell::new(Shared::default())),
        })
    }

    /// Every `on` call as `(path, kind)`.
    #[must_use]
    pub fn on_calls(&self) -> Vec<(String, EventKind)> {
        self.shared.borrow().on_calls.clone()
    }

    #[must_use]
    pub fn off_calls(&self) -> Vec<OffCall> {
        self.shared.borrow().off_calls.clone()
    }

    /// Every `set` call as `(path, value)`.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.shared.borrow().writes.clone()
    }

    /// Listeners registered and not yet removed.
    #[must_use]
    pub fn live_listeners(&self) -> usize {
        self.shared.borrow().live.len()
    }
}

impl RealtimeClient for MockRealtimeClient {
    fn resource(&self, path: &str) -> Rc<dyn RealtimeResource> {
        Rc::new(MockRealtimeResource {
            path: path.to_string(),
            clock: self.clock.clone(),
            log: self.log.clone(),
            snapshot: self.snapshot.clone(),
            shared: Rc::clone(&self.shared),
        })
    }
}

impl fmt::Debug for MockRealtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("MockRealtimeClient")
            .field("on_calls", &shared.on_calls.len())
            .field("off_calls", &shared.off_calls.len())
            .field("live", &shared.live.len())
            .finish()
    }
}

/// Resource handle produced by [`MockRealtimeClient`].
pub struct MockRealtimeResource {
    path: String,
    clock: FakeClock,
    log: CallLog,
    snapshot: Value,
    shared: Rc<RefCell<Shared>>,
}

impl RealtimeResource for MockRealtimeResource {
    fn path(&self) -> &str {
        &self.path
    }

    fn on(&self, kind: EventKind, callback: SnapshotCallback) -> SnapshotCallback {
        self.log.push(format!("on:{}:{kind}", self.path));
        {
            let mut shared = self.shared.borrow_mut();
            shared.on_calls.push((self.path.clone(), kind.clone()));
            shared
                .live
                .push((self.path.clone(), kind, Rc::clone(&callback)));
        }
        let snapshot = self.snapshot.clone();
        let deliver = Rc::clone(&callback);
        let shared = Rc::clone(&self.shared);
        self.clock.schedule(DEFAULT_DELAY_MS, move || {
            let live = shared
                .borrow()
                .live
                .iter()
                .any(|(_, _, cb)| Rc::ptr_eq(cb, &deliver));
            if live {
                deliver(&snapshot);
            }
        });
        callback
    }

    fn off(&self, kind: Option<&EventKind>, callback: Option<&SnapshotCallback>) {
        self.log.push(format!("off:{}", self.path));
        let mut shared = self.shared.borrow_mut();
        let path = &self.path;
        shared.live.retain(|(p, k, cb)| {
            let matches = p == path
                && kind.is_none_or(|kind| kind == k)
                && callback.is_none_or(|target| Rc::ptr_eq(target, cb));
            !matches
        });
        shared.off_calls.push(OffCall {
            path: self.path.clone(),
            kind: kind.cloned(),
            targeted: callback.is_some(),
        });
    }

    fn set(&self, value: Value) {
        self.log.push(format!("set:{}", self.path));
        self.shared
            .borrow_mut()
            .writes
            .push((self.path.clone(), value));
    }
}

impl fmt::Debug for MockRealtimeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRealtimeResource")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firelink_core::Snapshot;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn on_delivers_later_and_off_removes() {
        let clock = FakeClock::new();
        let log = CallLog::new();
        let client = MockRealtimeClient::new(&clock, &log, json!({ "message": "hi" }));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let resource = client.resource("/some/path");
        let cb = resource.on(
            EventKind::VALUE,
            Rc::new(move |_: &Snapshot| h.set(h.get() + 1)),
        );
        assert_eq!(client.live_listeners(), 1);

        clock.run_only_pending();
        assert_eq!(hits.get(), 1);

        resource.off(Some(&EventKind::VALUE), Some(&cb));
        assert_eq!(client.live_listeners(), 0);
        assert_eq!(client.off_calls().len(), 1);
    }
}
