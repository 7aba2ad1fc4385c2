#![forbid(unsafe_code)]

//! Subscription records and the ordered set a binder owns.
//!
//! A [`SubscriptionRecord`] pairs a release action with an optional
//! event-kind tag. The release action sits in an `Option` and is taken on
//! first use, so a record releases exactly once whether it is released
//! explicitly, dropped with its [`RecordSet`], or dropped while an activation
//! is unwinding from an error.

use std::fmt;

use firelink_core::EventKind;

/// One registered listener and how to release it.
#[must_use = "dropping a SubscriptionRecord releases it immediately"]
pub struct SubscriptionRecord {
    kind: Option<EventKind>,
    release: Option<Box<dyn FnOnce()>>,
}

impl SubscriptionRecord {
    pub fn new(kind: Option<EventKind>, release: impl FnOnce() + 'static) -> Self {
        Self {
            kind,
            release: Some(Box::new(release)),
        }
    }

    /// The event-kind tag; `None` means "all kinds on the resource".
    #[must_use]
    pub fn event_kind(&self) -> Option<&EventKind> {
        self.kind.as_ref()
    }

    /// Release now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SubscriptionRecord {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for SubscriptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRecord")
            .field("kind", &self.kind)
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Records in registration order.
///
/// Built up during one activation, then frozen. Dropping the set releases
/// every remaining record front to back.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<SubscriptionRecord>,
}

impl RecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = SubscriptionRecord>) {
        self.records.extend(records);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Event-kind tags in registration order.
    #[must_use]
    pub fn event_kinds(&self) -> Vec<Option<EventKind>> {
        self.records.iter().map(|r| r.kind.clone()).collect()
    }

    /// Release every record in registration order, returning how many ran.
    pub fn release_all(&mut self) -> usize {
        let count = self.records.len();
        for record in self.records.drain(..) {
            record.release();
        }
        count
    }
}

impl Drop for RecordSet {
    fn drop(&mut self) {
        self.release_all();
    }
}
