#![forbid(unsafe_code)]

//! Binding factory: wrap a render target with a subscription binder.
//!
//! ```ignore
//! let feed = realtime_connect()
//!     .listeners(|ctx| {
//!         let node = ctx.node.clone();
//!         let kind = ctx.source.event_kind(EventKind::VALUE);
//!         let cb = ctx.source.resource("/feed").on(kind, Rc::new(move |snap| {
//!             node.set_state("feed", snap.clone());
//!         }));
//!         Ok(Registration::single(cb))
//!     })
//!     .wrap(|props| props.value("feed").cloned());
//!
//! let node = feed.mount(&provider.scope(), Props::new())?;
//! let rendered = node.render()?;
//! ```
//!
//! A [`BoundComponent`] is a node constructor: cloning or holding it has no
//! side effects. [`BoundComponent::mount`] constructs and activates a binder
//! and returns the live [`BoundNode`]; dropping or unmounting the node
//! releases every subscription it registered.
//!
//! # Identity Changes
//!
//! Under [`IdentityPolicy::Rebind`] a node whose ambient identity changes
//! releases its binder and activates a fresh one against the new identity.
//! Under [`IdentityPolicy::Pinned`] listeners and dispatchers stay bound to
//! the identity seen at mount, while rendered props still follow the
//! provider.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use firelink_core::{BindError, EventKind, Identity};

use crate::adapter::{Adapter, DocumentAdapter, IdentityAdapter, RealtimeAdapter, Subscribable};
use crate::ambient::{AmbientValueSet, Scope};
use crate::binder::{DispatcherFactory, ListenerFactory, Phase, SubscriptionBinder};
use crate::listener::{DispatchContext, ListenerContext, Registration};
use crate::node::NodeHandle;
use crate::props::{DispatchSet, Props};
use crate::reactive::Subscription;

/// What a mounted node does when its ambient identity changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Release and re-activate against the new identity.
    #[default]
    Rebind,
    /// Keep behavior bound to the identity seen at mount.
    Pinned,
}

/// Listener and dispatcher factories shared by every node of a binding.
struct Factories<A: Adapter> {
    listeners: Option<ListenerFactory<A>>,
    dispatchers: Option<DispatcherFactory<A>>,
}

impl<A: Adapter> Clone for Factories<A> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
            dispatchers: self.dispatchers.clone(),
        }
    }
}

impl<A: Adapter> Factories<A> {
    fn bind(
        &self,
        node: NodeHandle,
        ambient: &AmbientValueSet,
    ) -> Result<SubscriptionBinder<A>, BindError> {
        let mut binder = SubscriptionBinder::new(
            node,
            ambient,
            self.listeners.clone(),
            self.dispatchers.as_ref(),
        )?;
        binder.activate()?;
        Ok(binder)
    }
}

/// Builder for one binding.
pub struct Connector<A: Adapter> {
    factories: Factories<A>,
    policy: IdentityPolicy,
}

impl<A: Adapter> Connector<A> {
    /// Both factories at once; either may be absent.
    #[must_use]
    pub fn from_factories(
        listeners: Option<ListenerFactory<A>>,
        dispatchers: Option<DispatcherFactory<A>>,
    ) -> Self {
        Self {
            factories: Factories {
                listeners,
                dispatchers,
            },
            policy: IdentityPolicy::default(),
        }
    }

    /// Set the dispatcher factory.
    #[must_use]
    pub fn dispatchers(
        mut self,
        factory: impl Fn(&DispatchContext<'_, A>) -> DispatchSet + 'static,
    ) -> Self {
        self.factories.dispatchers = Some(Rc::new(factory));
        self
    }

    #[must_use]
    pub fn identity_policy(mut self, policy: IdentityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wrap `target`, producing a node constructor.
    #[must_use]
    pub fn wrap<R: 'static>(self, target: impl Fn(&Props) -> R + 'static) -> BoundComponent<A, R> {
        BoundComponent {
            factories: self.factories,
            policy: self.policy,
            target: Rc::new(target),
        }
    }
}

impl<A: Subscribable> Connector<A> {
    /// Set the listener factory.
    #[must_use]
    pub fn listeners(
        mut self,
        factory: impl Fn(&ListenerContext<'_, A>) -> Result<Registration<A::Handle>, BindError>
        + 'static,
    ) -> Self {
        self.factories.listeners = Some(Rc::new(factory));
        self
    }
}

impl<A: Adapter> fmt::Debug for Connector<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("adapter", &A::NAME)
            .field("listeners", &self.factories.listeners.is_some())
            .field("dispatchers", &self.factories.dispatchers.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Bind to the realtime store.
#[must_use]
pub fn realtime_connect() -> Connector<RealtimeAdapter> {
    Connector::from_factories(None, None)
}

/// Bind to a document-store client of type `C`.
#[must_use]
pub fn document_connect<C: 'static>() -> Connector<DocumentAdapter<C>> {
    Connector::from_factories(None, None)
}

/// Bind dispatchers to the identity source. No listeners.
#[must_use]
pub fn identity_connect() -> Connector<IdentityAdapter> {
    Connector::from_factories(None, None)
}

/// A wrapped render target, ready to mount.
pub struct BoundComponent<A: Adapter, R> {
    factories: Factories<A>,
    policy: IdentityPolicy,
    target: Rc<dyn Fn(&Props) -> R>,
}

impl<A: Adapter, R> Clone for BoundComponent<A, R> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
            policy: self.policy,
            target: Rc::clone(&self.target),
        }
    }
}

impl<A: Adapter, R: 'static> BoundComponent<A, R> {
    /// Construct and activate a node under `scope`.
    ///
    /// # Errors
    ///
    /// Anything binder construction or activation fails with. No
    /// subscription outlives a failed mount.
    pub fn mount(&self, scope: &Scope, own_props: Props) -> Result<BoundNode<A, R>, BindError> {
        let node = NodeHandle::new();
        let binder = self.factories.bind(node.clone(), &scope.read())?;
        let core = Rc::new(RefCell::new(NodeCore {
            attempted: binder.identity().cloned(),
            binder: Some(binder),
            factories: self.factories.clone(),
            error: None,
        }));
        let dirty = Rc::new(Cell::new(true));
        let rebind_pending = Rc::new(Cell::new(false));

        let mut watches = Vec::with_capacity(2);
        {
            let dirty = Rc::clone(&dirty);
            watches.push(node.watch(move || dirty.set(true)));
        }
        if let Some(reader) = scope.ambient() {
            let dirty = Rc::clone(&dirty);
            let pending = Rc::clone(&rebind_pending);
            let core = Rc::downgrade(&core);
            let policy = self.policy;
            let node = node.clone();
            watches.push(reader.subscribe(move |set| {
                dirty.set(true);
                if policy == IdentityPolicy::Rebind {
                    on_ambient_change(&core, &node, &pending, set);
                }
            }));
        }

        tracing::debug!(
            target: "firelink::node",
            adapter = A::NAME,
            node = %node.id(),
            policy = ?self.policy,
            records = core.borrow().record_count(),
            "mounted"
        );

        Ok(BoundNode {
            watches,
            core,
            node,
            target: Rc::clone(&self.target),
            scope: scope.clone(),
            own_props,
            dirty,
            rebind_pending,
        })
    }

    #[must_use]
    pub fn identity_policy(&self) -> IdentityPolicy {
        self.policy
    }
}

impl<A: Adapter, R> fmt::Debug for BoundComponent<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundComponent")
            .field("adapter", &A::NAME)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn on_ambient_change<A: Adapter>(
    core: &Weak<RefCell<NodeCore<A>>>,
    node: &NodeHandle,
    pending: &Cell<bool>,
    set: &AmbientValueSet,
) {
    let Some(core) = core.upgrade() else {
        return;
    };
    match core.try_borrow_mut() {
        Ok(mut core) => core.sync_identity(node, set),
        Err(_) => {
            tracing::trace!(target: "firelink::node", "node busy; rebind deferred to next render");
            pending.set(true);
        }
    };
}

/// Mutable state of a mounted node.
///
/// `binder` is `None` after a failed rebind, until the next identity change.
struct NodeCore<A: Adapter> {
    binder: Option<SubscriptionBinder<A>>,
    attempted: Option<Identity>,
    factories: Factories<A>,
    error: Option<BindError>,
}

impl<A: Adapter> NodeCore<A> {
    /// Rebind if `set` carries a different identity than the last one a
    /// binder was built for. Each identity is attempted once.
    fn sync_identity(&mut self, node: &NodeHandle, set: &AmbientValueSet) {
        if self.attempted.as_ref() == set.identity() {
            return;
        }
        self.attempted = set.identity().cloned();
        let released = self.deactivate();
        self.binder = None;
        match self.factories.bind(node.clone(), set) {
            Ok(binder) => {
                tracing::debug!(
                    target: "firelink::node",
                    adapter = A::NAME,
                    node = %node.id(),
                    released,
                    registered = binder.record_count(),
                    signed_in = set.identity().is_some(),
                    "rebound to new identity"
                );
                self.binder = Some(binder);
            }
            Err(err) => {
                tracing::warn!(
                    target: "firelink::node",
                    adapter = A::NAME,
                    node = %node.id(),
                    error = %err,
                    "rebind failed"
                );
                self.error = Some(err);
            }
        }
    }

    fn deactivate(&mut self) -> usize {
        self.binder.as_mut().map_or(0, SubscriptionBinder::deactivate)
    }

    fn record_count(&self) -> usize {
        self.binder.as_ref().map_or(0, SubscriptionBinder::record_count)
    }

    fn render_props(&self, node: &NodeHandle, inbound: &Props) -> Props {
        match &self.binder {
            Some(binder) => binder.render_props(inbound),
            None => {
                let mut props = inbound.clone();
                props.merge_values(&node.state());
                props
            }
        }
    }
}

/// A mounted, activated node.
pub struct BoundNode<A: Adapter, R> {
    // Dropped before `core` so no notification reaches a released binder.
    watches: Vec<Subscription>,
    core: Rc<RefCell<NodeCore<A>>>,
    node: NodeHandle,
    target: Rc<dyn Fn(&Props) -> R>,
    scope: Scope,
    own_props: Props,
    dirty: Rc<Cell<bool>>,
    rebind_pending: Rc<Cell<bool>>,
}

impl<A: Adapter, R> BoundNode<A, R> {
    /// Render the target with the merged props.
    ///
    /// Merge order: dispatchers, ambient props (static then `identity`),
    /// own props, local state.
    ///
    /// # Errors
    ///
    /// A rebind failure recorded since the last render.
    pub fn render(&self) -> Result<R, BindError> {
        let ambient = self.scope.read();
        let props = {
            let mut core = self.core.borrow_mut();
            if self.rebind_pending.replace(false) {
                core.sync_identity(&self.node, &ambient);
            }
            if let Some(err) = core.error.take() {
                return Err(err);
            }
            let mut inbound = ambient.to_props();
            inbound.merge(&self.own_props);
            core.render_props(&self.node, &inbound)
        };
        self.dirty.set(false);
        Ok((self.target)(&props))
    }

    /// Whether ambient or local state changed since the last render.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Replace the props passed at mount.
    pub fn set_own_props(&mut self, props: Props) {
        self.own_props = props;
        self.dirty.set(true);
    }

    #[must_use]
    pub fn own_props(&self) -> &Props {
        &self.own_props
    }

    /// Scope for descendants; resolves to the same provider as this node.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Phase of the current binder; `Deactivated` after a failed rebind.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.core
            .borrow()
            .binder
            .as_ref()
            .map_or(Phase::Deactivated, SubscriptionBinder::phase)
    }

    /// Identity the node last bound (or tried to bind) against.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.core.borrow().attempted.clone()
    }

    /// Number of live subscription records.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.core.borrow().record_count()
    }

    #[must_use]
    pub fn event_kinds(&self) -> Vec<Option<EventKind>> {
        self.core
            .borrow()
            .binder
            .as_ref()
            .map(SubscriptionBinder::event_kinds)
            .unwrap_or_default()
    }

    /// Deactivate and return how many records were released.
    pub fn unmount(mut self) -> usize {
        self.release()
    }

    fn release(&mut self) -> usize {
        self.watches.clear();
        let Ok(mut core) = self.core.try_borrow_mut() else {
            return 0;
        };
        let released = core.deactivate();
        if released > 0 {
            tracing::debug!(
                target: "firelink::node",
                adapter = A::NAME,
                node = %self.node.id(),
                released,
                "unmounted"
            );
        }
        released
    }
}

impl<A: Adapter, R> Drop for BoundNode<A, R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<A: Adapter, R> fmt::Debug for BoundNode<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundNode")
            .field("adapter", &A::NAME)
            .field("node", &self.node.id())
            .field("dirty", &self.dirty.get())
            .field("own_props", &self.own_props)
            .finish_non_exhaustive()
    }
}
