#![forbid(unsafe_code)]

//! The subscription binder: register on activation, release on deactivation.
//!
//! A [`SubscriptionBinder`] is created for one node activation. Construction
//! resolves the adapter's client and computes the node's [`DispatchSet`];
//! [`activate`](SubscriptionBinder::activate) invokes the listener factory
//! once and freezes the resulting records;
//! [`deactivate`](SubscriptionBinder::deactivate) releases all of them in
//! registration order.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized --activate--> Activated --deactivate--> Deactivated
//!       |                                                    ^
//!       +------------------deactivate------------------------+
//! ```
//!
//! `Deactivated` is terminal. A failed activation also ends in
//! `Deactivated`, with any records it had built already released.
//!
//! # Invariants
//!
//! 1. Records released on deactivation == records registered on activation,
//!    pairwise and in order.
//! 2. The listener factory runs at most once per binder.
//! 3. The dispatch set never changes after construction.
//! 4. Dropping a binder deactivates it.

use std::fmt;

use firelink_core::{BindError, EventKind, Identity};

use crate::adapter::Adapter;
use crate::ambient::AmbientValueSet;
use crate::listener::{DispatchContext, ListenerContext, Registration, normalize};
use crate::node::NodeHandle;
use crate::props::{DispatchSet, Props};
use crate::record::RecordSet;

/// Listener factory for adapter `A`.
pub type ListenerFactory<A> = std::rc::Rc<
    dyn Fn(&ListenerContext<'_, A>) -> Result<Registration<<A as Adapter>::Handle>, BindError>,
>;

/// Dispatcher factory for adapter `A`.
pub type DispatcherFactory<A> = std::rc::Rc<dyn Fn(&DispatchContext<'_, A>) -> DispatchSet>;

/// Lifecycle phase of a binder or provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Activated,
    Deactivated,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-activation subscription owner, parameterized by adapter.
pub struct SubscriptionBinder<A: Adapter> {
    node: NodeHandle,
    client: Option<A::Client>,
    identity: Option<Identity>,
    listeners: Option<ListenerFactory<A>>,
    dispatch: DispatchSet,
    records: RecordSet,
    phase: Phase,
}

impl<A: Adapter> SubscriptionBinder<A> {
    /// Construct a binder for `node`, reading client and identity from
    /// `ambient`.
    ///
    /// # Errors
    ///
    /// [`BindError::MissingClient`] if a listener or dispatcher factory is
    /// supplied and the ambient set holds no client for this adapter.
    pub fn new(
        node: NodeHandle,
        ambient: &AmbientValueSet,
        listeners: Option<ListenerFactory<A>>,
        dispatchers: Option<&DispatcherFactory<A>>,
    ) -> Result<Self, BindError> {
        let identity = ambient.identity().cloned();
        let client = if listeners.is_some() || dispatchers.is_some() {
            Some(A::client(ambient)?)
        } else {
            A::client(ambient).ok()
        };

        let dispatch = match (dispatchers, &client) {
            (Some(factory), Some(client)) => factory(&DispatchContext {
                node: &node,
                client,
                identity: identity.as_ref(),
            }),
            _ => DispatchSet::new(),
        };

        Ok(Self {
            node,
            client,
            identity,
            listeners,
            dispatch,
            records: RecordSet::new(),
            phase: Phase::Uninitialized,
        })
    }

    /// Invoke the listener factory once and register its listeners.
    ///
    /// # Errors
    ///
    /// - [`BindError::Lifecycle`] unless the binder is uninitialized.
    /// - [`BindError::ListenerShape`] for an unusable factory result.
    /// - Whatever the factory or its thunks return.
    pub fn activate(&mut self) -> Result<(), BindError> {
        if self.phase != Phase::Uninitialized {
            return Err(BindError::Lifecycle {
                from: self.phase.as_str(),
                to: Phase::Activated.as_str(),
            });
        }

        let (Some(factory), Some(client)) = (self.listeners.clone(), self.client.as_ref()) else {
            self.phase = Phase::Activated;
            tracing::debug!(
                target: "firelink::binder",
                adapter = A::NAME,
                node = %self.node.id(),
                dispatchers = self.dispatch.len(),
                "activated without listeners"
            );
            return Ok(());
        };

        let accessor = A::accessor(client);
        let ctx = ListenerContext {
            node: &self.node,
            source: &accessor,
            identity: self.identity.as_ref(),
        };
        let result = factory(&ctx).and_then(|registration| normalize::<A>(&accessor, registration));
        let unsealed = A::sweep(&accessor);

        match result {
            Ok(mut records) => {
                records.extend(unsealed);
                self.records = records;
                self.phase = Phase::Activated;
                tracing::debug!(
                    target: "firelink::binder",
                    adapter = A::NAME,
                    node = %self.node.id(),
                    records = self.records.len(),
                    "activated"
                );
                Ok(())
            }
            Err(err) => {
                self.phase = Phase::Deactivated;
                tracing::warn!(
                    target: "firelink::binder",
                    adapter = A::NAME,
                    node = %self.node.id(),
                    error = %err,
                    released = unsealed.len(),
                    "activation failed"
                );
                drop(unsealed);
                Err(err)
            }
        }
    }

    /// Release every record in registration order. Returns how many were
    /// released; repeated calls release nothing.
    pub fn deactivate(&mut self) -> usize {
        match self.phase {
            Phase::Activated => {
                let released = self.records.release_all();
                self.phase = Phase::Deactivated;
                tracing::debug!(
                    target: "firelink::binder",
                    adapter = A::NAME,
                    node = %self.node.id(),
                    released,
                    "deactivated"
                );
                released
            }
            Phase::Uninitialized => {
                self.phase = Phase::Deactivated;
                0
            }
            Phase::Deactivated => 0,
        }
    }

    /// Merge for the wrapped node: dispatchers, then `inbound`, then local
    /// state. Later entries win.
    #[must_use]
    pub fn render_props(&self, inbound: &Props) -> Props {
        let mut props = Props::new();
        props.merge_dispatch(&self.dispatch);
        props.merge(inbound);
        props.merge_values(&self.node.state());
        props
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Identity captured at construction.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn dispatch(&self) -> &DispatchSet {
        &self.dispatch
    }

    /// Number of live records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Event-kind tags of live records, in registration order.
    #[must_use]
    pub fn event_kinds(&self) -> Vec<Option<EventKind>> {
        self.records.event_kinds()
    }
}

impl<A: Adapter> Drop for SubscriptionBinder<A> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<A: Adapter> fmt::Debug for SubscriptionBinder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionBinder")
            .field("adapter", &A::NAME)
            .field("node", &self.node.id())
            .field("phase", &self.phase)
            .field("records", &self.records.len())
            .field("dispatchers", &self.dispatch.len())
            .finish()
    }
}
