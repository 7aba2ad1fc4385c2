#![forbid(unsafe_code)]

//! Prop maps handed to wrapped nodes.
//!
//! [`Props`] is an insertion-ordered `key -> Prop` map. A [`Prop`] is either
//! plain data or a ready-to-call [`Dispatcher`]. Merging is last-wins: a
//! later [`Props::merge`] overwrites same-named keys in place, keeping the
//! key's original position.

use std::fmt;
use std::rc::Rc;

use firelink_core::{Identity, Value};
use indexmap::IndexMap;
use indexmap::map::Iter;

/// Key under which the resolved identity is published.
pub const IDENTITY_KEY: &str = "identity";

/// A ready-to-call action bound to a client handle and identity.
#[derive(Clone)]
pub struct Dispatcher(Rc<dyn Fn(&Value)>);

impl Dispatcher {
    pub fn new(f: impl Fn(&Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke with an argument (`Value::Null` when the action takes none).
    pub fn call(&self, arg: &Value) {
        (self.0)(arg);
    }

    /// Whether two dispatchers are the same function instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher(..)")
    }
}

/// Named dispatchers produced once per binder by a dispatcher factory.
///
/// Immutable once handed to the binder.
#[derive(Clone, Debug, Default)]
pub struct DispatchSet {
    entries: IndexMap<String, Dispatcher>,
}

impl DispatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dispatcher, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, f: impl Fn(&Value) + 'static) -> Self {
        self.entries.insert(key.into(), Dispatcher::new(f));
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Dispatcher> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// One rendered prop.
#[derive(Clone, Debug)]
pub enum Prop {
    Value(Value),
    Dispatch(Dispatcher),
}

impl Prop {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Dispatch(_) => None,
        }
    }

    #[must_use]
    pub fn as_dispatcher(&self) -> Option<&Dispatcher> {
        match self {
            Self::Dispatch(d) => Some(d),
            Self::Value(_) => None,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Dispatcher> for Prop {
    fn from(dispatcher: Dispatcher) -> Self {
        Self::Dispatch(dispatcher)
    }
}

/// Ordered prop map.
#[derive(Clone, Debug, Default)]
pub struct Props {
    entries: IndexMap<String, Prop>,
}

impl Props {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prop, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.insert(key, prop);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, prop: impl Into<Prop>) {
        self.entries.insert(key.into(), prop.into());
    }

    /// Overlay `other` onto `self`; `other` wins on shared keys.
    pub fn merge(&mut self, other: &Props) {
        for (key, prop) in &other.entries {
            self.entries.insert(key.clone(), prop.clone());
        }
    }

    /// Overlay plain values; they win on shared keys.
    pub fn merge_values<'a>(&mut self, values: impl IntoIterator<Item = (&'a String, &'a Value)>) {
        for (key, value) in values {
            self.entries.insert(key.clone(), Prop::Value(value.clone()));
        }
    }

    /// Overlay a dispatch set.
    pub fn merge_dispatch(&mut self, dispatch: &DispatchSet) {
        for (key, dispatcher) in &dispatch.entries {
            self.entries
                .insert(key.clone(), Prop::Dispatch(dispatcher.clone()));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.entries.get(key)
    }

    /// The plain value under `key`, if it is one.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(Prop::as_value)
    }

    /// The plain string under `key`, if it is one.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(Value::as_str)
    }

    /// The dispatcher under `key`, if it is one.
    #[must_use]
    pub fn dispatcher(&self, key: &str) -> Option<&Dispatcher> {
        self.get(key).and_then(Prop::as_dispatcher)
    }

    /// The published identity, if resolved.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.value(IDENTITY_KEY).cloned().map(Identity::from)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, Prop> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, P: Into<Prop>> FromIterator<(K, P)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, prop) in iter {
            props.insert(key, prop);
        }
        props
    }
}
