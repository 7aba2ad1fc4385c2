#![forbid(unsafe_code)]

//! Identity source double.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use firelink_core::{Canceler, Identity, IdentityCallback, IdentitySource};

use crate::{CallLog, DEFAULT_DELAY_MS, FakeClock};

struct Subscriber {
    id: u64,
    callback: IdentityCallback,
}

/// Identity source that answers each new subscription after a delay.
///
/// Every call is appended to the shared [`CallLog`] as `"{name}:{call}"`,
/// with `call` one of `onAuthStateChanged`, `onIdTokenChanged`, `cancel`,
/// or `someAuthMethod`.
pub struct MockIdentitySource {
    name: String,
    clock: FakeClock,
    log: CallLog,
    delay_ms: u64,
    response: RefCell<Option<Identity>>,
    subscribers: Rc<RefCell<Vec<Subscriber>>>,
    next_id: Cell<u64>,
    auth_method_calls: Cell<usize>,
}

impl MockIdentitySource {
    /// A source that never answers on its own.
    #[must_use]
    pub fn new(name: impl Into<String>, clock: &FakeClock, log: &CallLog) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            clock: clock.clone(),
            log: log.clone(),
            delay_ms: DEFAULT_DELAY_MS,
            response: RefCell::new(None),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
            auth_method_calls: Cell::new(0),
        })
    }

    /// A source that answers every subscription with `identity` after the
    /// default delay.
    #[must_use]
    pub fn responding(
        name: impl Into<String>,
        clock: &FakeClock,
        log: &CallLog,
        identity: Identity,
    ) -> Rc<Self> {
        let source = Self::new(name, clock, log);
        *source.response.borrow_mut() = Some(identity);
        source
    }

    /// Deliver `identity` to every live subscriber now.
    pub fn emit(&self, identity: Option<Identity>) {
        let callbacks: Vec<IdentityCallback> = self
            .subscribers
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.callback))
            .collect();
        for callback in callbacks {
            callback(identity.clone());
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Stand-in for a source-specific method dispatchers may call.
    pub fn some_auth_method(&self) {
        self.auth_method_calls.set(self.auth_method_calls.get() + 1);
        self.log.push(format!("{}:someAuthMethod", self.name));
    }

    #[must_use]
    pub fn auth_method_calls(&self) -> usize {
        self.auth_method_calls.get()
    }

    fn register(&self, method: &str, callback: IdentityCallback) -> Canceler {
        self.log.push(format!("{}:{method}", self.name));
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            callback: Rc::clone(&callback),
        });

        if let Some(identity) = self.response.borrow().clone() {
            let subscribers = Rc::clone(&self.subscribers);
            self.clock.schedule(self.delay_ms, move || {
                let live = subscribers.borrow().iter().any(|s| s.id == id);
                if live {
                    callback(Some(identity));
                }
            });
        }

        let subscribers = Rc::clone(&self.subscribers);
        let log = self.log.clone();
        let name = self.name.clone();
        Canceler::new(move || {
            subscribers.borrow_mut().retain(|s| s.id != id);
            log.push(format!("{name}:cancel"));
        })
    }
}

impl IdentitySource for MockIdentitySource {
    fn on_auth_state_changed(&self, callback: IdentityCallback) -> Canceler {
        self.register("onAuthStateChanged", callback)
    }

    fn on_id_token_changed(&self, callback: IdentityCallback) -> Canceler {
        self.register("onIdTokenChanged", callback)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for MockIdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockIdentitySource")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .field("response", &self.response.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cancelled_subscription_gets_no_late_answer() {
        let clock = FakeClock::new();
        let log = CallLog::new();
        let source = MockIdentitySource::responding("auth", &clock, &log, Identity::new(1));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        source
            .on_id_token_changed(Rc::new(move |_: Option<Identity>| h.set(h.get() + 1)))
            .cancel();
        clock.run_only_pending();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn answers_after_delay_and_cancels() {
        let clock = FakeClock::new();
        let log = CallLog::new();
        let token = Identity::new(json!({ "uid": 123 }));
        let source = MockIdentitySource::responding("auth", &clock, &log, token);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let cancel =
            source.on_auth_state_changed(Rc::new(move |id: Option<Identity>| s.borrow_mut().push(id)));
        assert!(seen.borrow().is_empty());

        clock.run_only_pending();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(source.subscriber_count(), 1);

        cancel.cancel();
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(log.entries(), ["auth:onAuthStateChanged", "auth:cancel"]);
    }
}
