#![forbid(unsafe_code)]

//! Realtime-store adapter.
//!
//! Listener factories register through a [`RealtimeTape`]. Every resource it
//! hands out is a [`TapedResource`] that records each `on` call, whenever
//! and wherever that call happens: in the factory body, inside a thunk, or
//! on a resource addressed once and shared between thunks. Event kinds are
//! recorded explicitly with [`RealtimeTape::event_kind`].
//!
//! When the factory (or one thunk) returns its callback handle, the tape is
//! sealed: every `on` recorded since the last seal becomes one record, and
//! the `i`-th of them pairs with the `i`-th kind recorded in the same window.
//! A registration with no kind releases every registration on its resource.
//!
//! ```ignore
//! realtime_connect().listeners(|ctx| {
//!     let node = ctx.node.clone();
//!     let kind = ctx.source.event_kind(EventKind::VALUE);
//!     let cb = ctx.source.resource("/messages").on(kind, Rc::new(move |snap| {
//!         node.set_state("messages", snap.clone());
//!     }));
//!     Ok(Registration::single(cb))
//! })
//! ```
//!
//! With several listeners, thunks may share one resource:
//!
//! ```ignore
//! realtime_connect().listeners(|ctx| {
//!     let (tape, messages) = (ctx.source.clone(), ctx.source.resource("/messages"));
//!     let (added, removed) = (on_added.clone(), on_removed.clone());
//!     let other = Rc::clone(&messages);
//!     Ok(ListenerMap::new()
//!         .listener("added", move || {
//!             messages.on(tape.event_kind(EventKind::CHILD_ADDED), added)
//!         })
//!         .listener("removed", move || other.on(EventKind::CHILD_REMOVED, removed))
//!         .into())
//! })
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use firelink_core::{
    BindError, EventKind, RealtimeClient, RealtimeResource, SnapshotCallback, Value,
};

use super::Adapter;
use crate::ambient::AmbientValueSet;
use crate::record::SubscriptionRecord;

/// Binder specialization for the path-addressable realtime store.
#[derive(Debug)]
pub struct RealtimeAdapter;

/// One `on` call observed through a taped resource.
struct Registered {
    resource: Rc<dyn RealtimeResource>,
    callback: SnapshotCallback,
}

#[derive(Default)]
struct Recorded {
    registered: Vec<Registered>,
    kinds: Vec<EventKind>,
}

impl Recorded {
    /// Pair registrations with kinds, emptying both.
    fn drain_records(&mut self) -> Vec<SubscriptionRecord> {
        let kinds = std::mem::take(&mut self.kinds);
        std::mem::take(&mut self.registered)
            .into_iter()
            .enumerate()
            .map(|(index, Registered { resource, callback })| {
                let kind = kinds.get(index).cloned();
                let tag = kind.clone();
                SubscriptionRecord::new(kind, move || match &tag {
                    Some(kind) => resource.off(Some(kind), Some(&callback)),
                    None => resource.off(None, None),
                })
            })
            .collect()
    }
}

/// Spy-wrapped resource accessor and event-kind recorder.
///
/// Clones record onto the same tape.
#[derive(Clone)]
pub struct RealtimeTape {
    client: Rc<dyn RealtimeClient>,
    recorded: Rc<RefCell<Recorded>>,
}

impl RealtimeTape {
    #[must_use]
    pub fn new(client: Rc<dyn RealtimeClient>) -> Self {
        Self {
            client,
            recorded: Rc::new(RefCell::new(Recorded::default())),
        }
    }

    /// Address `path`. Listeners registered on the returned resource are
    /// recorded for release.
    pub fn resource(&self, path: &str) -> Rc<dyn RealtimeResource> {
        Rc::new(TapedResource {
            inner: self.client.resource(path),
            recorded: Rc::clone(&self.recorded),
        })
    }

    /// Record `kind` for the next sealed handle and pass it through.
    pub fn event_kind(&self, kind: impl Into<EventKind>) -> EventKind {
        let kind = kind.into();
        self.recorded.borrow_mut().kinds.push(kind.clone());
        kind
    }

    /// The unwrapped client, for calls that should not be recorded.
    #[must_use]
    pub fn client(&self) -> &Rc<dyn RealtimeClient> {
        &self.client
    }

    fn drain_records(&self) -> Vec<SubscriptionRecord> {
        self.recorded.borrow_mut().drain_records()
    }
}

impl fmt::Debug for RealtimeTape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recorded = self.recorded.borrow();
        let paths: Vec<&str> = recorded
            .registered
            .iter()
            .map(|r| r.resource.path())
            .collect();
        f.debug_struct("RealtimeTape")
            .field("registered", &paths)
            .field("kinds", &recorded.kinds)
            .finish()
    }
}

/// A resource handed out by a [`RealtimeTape`].
pub struct TapedResource {
    inner: Rc<dyn RealtimeResource>,
    recorded: Rc<RefCell<Recorded>>,
}

impl RealtimeResource for TapedResource {
    fn path(&self) -> &str {
        self.inner.path()
    }

    fn on(&self, kind: EventKind, callback: SnapshotCallback) -> SnapshotCallback {
        let callback = self.inner.on(kind, callback);
        self.recorded.borrow_mut().registered.push(Registered {
            resource: Rc::clone(&self.inner),
            callback: Rc::clone(&callback),
        });
        callback
    }

    fn off(&self, kind: Option<&EventKind>, callback: Option<&SnapshotCallback>) {
        self.inner.off(kind, callback);
    }

    fn set(&self, value: Value) {
        self.inner.set(value);
    }
}

impl fmt::Debug for TapedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapedResource")
            .field("path", &self.inner.path())
            .finish()
    }
}

impl Adapter for RealtimeAdapter {
    const NAME: &'static str = "realtime";

    type Client = Rc<dyn RealtimeClient>;
    type Accessor = RealtimeTape;
    type Handle = SnapshotCallback;

    fn client(ambient: &AmbientValueSet) -> Result<Self::Client, BindError> {
        ambient
            .clients()
            .realtime()
            .cloned()
            .ok_or(BindError::MissingClient(Self::NAME))
    }

    fn accessor(client: &Self::Client) -> Self::Accessor {
        RealtimeTape::new(Rc::clone(client))
    }

    fn seal(tape: &Self::Accessor, _handle: Self::Handle) -> Vec<SubscriptionRecord> {
        let records = tape.drain_records();
        if records.is_empty() {
            tracing::warn!(
                target: "firelink::binder",
                adapter = Self::NAME,
                "listener returned a handle without registering on a taped resource; nothing to release"
            );
        }
        records
    }

    fn sweep(tape: &Self::Accessor) -> Vec<SubscriptionRecord> {
        tape.drain_records()
    }
}
