#![forbid(unsafe_code)]

//! Handles to a mounted node's locally held state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use firelink_core::Value;
use indexmap::IndexMap;

use crate::reactive::{Observable, Subscription};

/// Global counter for unique node IDs.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a mounted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle given to listener and dispatcher factories.
///
/// Clones refer to the same node. Writing state marks the owning node dirty;
/// local state is merged last into the node's rendered props.
#[derive(Clone)]
pub struct NodeHandle {
    id: NodeId,
    state: Observable<IndexMap<String, Value>>,
}

impl NodeHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            state: Observable::new(IndexMap::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Set one state entry.
    pub fn set_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.state.update(|state| {
            let mut next = state.clone();
            next.insert(key, value);
            next
        });
    }

    /// Shallow-merge several entries in one update.
    pub fn merge_state<K: Into<String>>(&self, entries: impl IntoIterator<Item = (K, Value)>) {
        let entries: Vec<(String, Value)> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.state.update(|state| {
            let mut next = state.clone();
            next.extend(entries);
            next
        });
    }

    /// Clone out the whole local state.
    #[must_use]
    pub fn state(&self) -> IndexMap<String, Value> {
        self.state.get()
    }

    #[must_use]
    pub fn state_value(&self, key: &str) -> Option<Value> {
        self.state.with(|state| state.get(key).cloned())
    }

    /// Number of state changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    pub(crate) fn watch(&self, callback: impl Fn() + 'static) -> Subscription {
        self.state.subscribe(move |_| callback())
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn ids_are_unique() {
        assert_ne!(NodeHandle::new().id(), NodeHandle::new().id());
    }

    #[test]
    fn set_state_is_visible_through_clones() {
        let node = NodeHandle::new();
        let clone = node.clone();
        clone.set_state("message", json!("hi"));
        assert_eq!(node.state_value("message"), Some(json!("hi")));
        assert_eq!(node.version(), 1);
    }

    #[test]
    fn merge_state_is_one_change() {
        let node = NodeHandle::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _watch = node.watch(move || h.set(h.get() + 1));
        node.merge_state([("a", json!(1)), ("b", json!(2))]);
        assert_eq!(hits.get(), 1);
        assert_eq!(node.state().len(), 2);
    }

    #[test]
    fn rewriting_same_value_does_not_notify() {
        let node = NodeHandle::new();
        node.set_state("k", json!(1));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _watch = node.watch(move || h.set(h.get() + 1));
        node.set_state("k", json!(1));
        assert_eq!(hits.get(), 0);
    }
}
