#![forbid(unsafe_code)]

//! Ambient value sets and the channel that propagates them down a tree.
//!
//! A provider owns the single [`AmbientChannel`] of its subtree and publishes
//! a fresh [`AmbientValueSet`] whenever its props or identity change. Nodes
//! below it never see the channel itself; they receive a [`Scope`] carrying
//! an [`AmbientReader`] and resolve the current set from it.
//!
//! # Invariants
//!
//! 1. A published set is never mutated; a change publishes a new `Rc`.
//! 2. Publishing a set equal to the current one notifies nobody.
//! 3. A scope resolves to the nearest enclosing provider only; an inner
//!    provider's scope fully shadows the outer one.
//! 4. A scope with no provider resolves to the empty set.
//!
//! Client handles compare by address, so republishing the same clients with
//! the same props and identity is a no-op.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use firelink_core::{Identity, IdentitySource, RealtimeClient, Value};
use indexmap::IndexMap;

use crate::props::{IDENTITY_KEY, Props};
use crate::reactive::{Observable, Subscription};

/// Data-source client handles carried alongside the ambient props.
#[derive(Clone, Default)]
pub struct Clients {
    identity_source: Option<Rc<dyn IdentitySource>>,
    realtime: Option<Rc<dyn RealtimeClient>>,
    document: Option<Rc<dyn Any>>,
}

impl Clients {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity_source(&self) -> Option<&Rc<dyn IdentitySource>> {
        self.identity_source.as_ref()
    }

    #[must_use]
    pub fn realtime(&self) -> Option<&Rc<dyn RealtimeClient>> {
        self.realtime.as_ref()
    }

    /// The document client, if one is held and it is a `C`.
    #[must_use]
    pub fn document<C: 'static>(&self) -> Option<Rc<C>> {
        self.document.clone()?.downcast::<C>().ok()
    }

    pub(crate) fn set_identity_source(&mut self, source: Option<Rc<dyn IdentitySource>>) {
        self.identity_source = source;
    }

    pub(crate) fn set_realtime(&mut self, client: Option<Rc<dyn RealtimeClient>>) {
        self.realtime = client;
    }

    pub(crate) fn set_document(&mut self, client: Option<Rc<dyn Any>>) {
        self.document = client;
    }
}

fn same_handle<T: ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
        _ => false,
    }
}

impl PartialEq for Clients {
    fn eq(&self, other: &Self) -> bool {
        same_handle(&self.identity_source, &other.identity_source)
            && same_handle(&self.realtime, &other.realtime)
            && same_handle(&self.document, &other.document)
    }
}

impl fmt::Debug for Clients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clients")
            .field("identity_source", &self.identity_source.is_some())
            .field("realtime", &self.realtime.is_some())
            .field("document", &self.document.is_some())
            .finish()
    }
}

/// Merged static props, resolved identity, and client handles visible to a
/// subtree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AmbientValueSet {
    props: IndexMap<String, Value>,
    identity: Option<Identity>,
    clients: Clients,
}

impl AmbientValueSet {
    #[must_use]
    pub fn new(props: IndexMap<String, Value>, clients: Clients) -> Self {
        Self {
            props,
            identity: None,
            clients,
        }
    }

    /// Static passthrough props, in insertion order.
    #[must_use]
    pub fn props(&self) -> &IndexMap<String, Value> {
        &self.props
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Look up one entry. `"identity"` resolves to the identity once known.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == IDENTITY_KEY
            && let Some(identity) = &self.identity
        {
            return Some(identity.as_value());
        }
        self.props.get(key)
    }

    /// A copy of this set with `identity` replaced.
    #[must_use]
    pub fn with_identity(&self, identity: Option<Identity>) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }

    /// Render as props: static props first, then `identity` when resolved.
    #[must_use]
    pub fn to_props(&self) -> Props {
        let mut props = Props::new();
        props.merge_values(&self.props);
        if let Some(identity) = &self.identity {
            props.insert(IDENTITY_KEY, identity.as_value().clone());
        }
        props
    }
}

/// Writer side of a subtree's ambient state. Owned by exactly one provider.
#[derive(Debug)]
pub struct AmbientChannel {
    value: Observable<Rc<AmbientValueSet>>,
}

impl AmbientChannel {
    #[must_use]
    pub fn new(initial: AmbientValueSet) -> Self {
        Self {
            value: Observable::new(Rc::new(initial)),
        }
    }

    /// Replace the published set. Returns whether readers were notified.
    pub fn publish(&self, set: AmbientValueSet) -> bool {
        let before = self.value.version();
        self.value.set(Rc::new(set));
        self.value.version() != before
    }

    /// Publish a set derived from the current one.
    pub fn publish_with(&self, f: impl FnOnce(&AmbientValueSet) -> AmbientValueSet) -> bool {
        let next = self.value.with(|current| f(current));
        self.publish(next)
    }

    #[must_use]
    pub fn current(&self) -> Rc<AmbientValueSet> {
        self.value.get()
    }

    #[must_use]
    pub fn reader(&self) -> AmbientReader {
        AmbientReader {
            value: self.value.clone(),
        }
    }

    /// Number of readers currently subscribed for changes.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.value.subscriber_count()
    }
}

/// Reader side of an ambient channel.
#[derive(Clone, Debug)]
pub struct AmbientReader {
    value: Observable<Rc<AmbientValueSet>>,
}

impl AmbientReader {
    /// The current set.
    #[must_use]
    pub fn read(&self) -> Rc<AmbientValueSet> {
        self.value.get()
    }

    /// Be told about every newly published set.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&Rc<AmbientValueSet>) + 'static) -> Subscription {
        self.value.subscribe(callback)
    }

    /// Publication counter; bumps once per changed set.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.value.version()
    }
}

/// Construction parameter carrying the nearest enclosing ambient reader.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    ambient: Option<AmbientReader>,
}

impl Scope {
    /// A scope outside any provider.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// A scope resolving to `reader`.
    #[must_use]
    pub fn with_reader(reader: AmbientReader) -> Self {
        Self {
            ambient: Some(reader),
        }
    }

    #[must_use]
    pub fn ambient(&self) -> Option<&AmbientReader> {
        self.ambient.as_ref()
    }

    /// Resolve the nearest enclosing set, or the empty set.
    #[must_use]
    pub fn read(&self) -> Rc<AmbientValueSet> {
        self.ambient
            .as_ref()
            .map_or_else(|| Rc::new(AmbientValueSet::default()), AmbientReader::read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn set_with(key: &str, value: Value) -> AmbientValueSet {
        let mut props = IndexMap::new();
        props.insert(key.to_string(), value);
        AmbientValueSet::new(props, Clients::new())
    }

    #[test]
    fn identity_absent_until_set() {
        let set = set_with("arbitraryProp", json!(true));
        assert!(set.get(IDENTITY_KEY).is_none());
        assert!(!set.to_props().contains_key(IDENTITY_KEY));

        let resolved = set.with_identity(Some(Identity::new(json!({ "uid": 123 }))));
        assert_eq!(resolved.get(IDENTITY_KEY), Some(&json!({ "uid": 123 })));
        assert_eq!(resolved.get("arbitraryProp"), Some(&json!(true)));
        // the original is untouched
        assert!(set.identity().is_none());
    }

    #[test]
    fn props_render_static_then_identity() {
        let set = set_with("a", json!(1)).with_identity(Some(Identity::new("t")));
        let keys: Vec<_> = set.to_props().keys().map(str::to_string).collect();
        assert_eq!(keys, ["a", "identity"]);
    }

    #[test]
    fn equal_publish_notifies_nobody() {
        let channel = AmbientChannel::new(set_with("a", json!(1)));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = channel.reader().subscribe(move |_| h.set(h.get() + 1));

        assert!(!channel.publish(set_with("a", json!(1))));
        assert!(channel.publish(set_with("a", json!(2))));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn reader_sees_latest_set() {
        let channel = AmbientChannel::new(AmbientValueSet::default());
        let reader = channel.reader();
        assert!(reader.read().identity().is_none());

        channel.publish_with(|set| set.with_identity(Some(Identity::new(json!({ "uid": 1 })))));
        let identity = reader.read().identity().cloned();
        assert_eq!(identity.and_then(|i| i.uid().cloned()), Some(json!(1)));
        assert_eq!(reader.version(), 1);
    }

    #[test]
    fn root_scope_reads_empty_set() {
        let set = Scope::root().read();
        assert!(set.props().is_empty());
        assert!(set.identity().is_none());
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let outer = AmbientChannel::new(set_with("level", json!("outer")));
        let inner = AmbientChannel::new(set_with("level", json!("inner")));
        let outer_scope = Scope::with_reader(outer.reader());
        let inner_scope = Scope::with_reader(inner.reader());
        assert_eq!(outer_scope.read().get("level"), Some(&json!("outer")));
        assert_eq!(inner_scope.read().get("level"), Some(&json!("inner")));
    }

    #[test]
    fn document_client_downcasts_by_type() {
        struct Store;
        let mut clients = Clients::new();
        clients.set_document(Some(Rc::new(Store) as Rc<dyn Any>));
        assert!(clients.document::<Store>().is_some());
        assert!(clients.document::<String>().is_none());
    }
}
