#![forbid(unsafe_code)]

//! Listener factory results and their normalization into records.
//!
//! A listener factory returns a [`Registration`]: one release handle, an
//! ordered map of activation thunks, or (for factories that compute their
//! result dynamically) an arbitrary [`Value`] that is neither. Normalization
//! walks the result once, runs each thunk in insertion order, and asks the
//! adapter to turn each handle into [`SubscriptionRecord`]s.
//!
//! # Failure Modes
//!
//! | Result | Outcome |
//! |--------|---------|
//! | `Invalid(_)` | `ListenerShape` naming both valid shapes |
//! | thunk returns `Multi` or `Invalid` | `ListenerShape` with multi-listener guidance |
//! | thunk fails with `ListenerShape` | same kind, multi-listener guidance appended |
//! | thunk fails otherwise | error returned unchanged |
//!
//! In every failure case the records built so far, plus anything the
//! accessor saw registered but not yet sealed, are released before the
//! error is returned.

use std::fmt;

use firelink_core::{BindError, Identity, MULTI_LISTENER_GUIDANCE, Value};
use indexmap::IndexMap;

use crate::adapter::Adapter;
use crate::node::NodeHandle;
use crate::record::RecordSet;

/// Deferred registration run during activation.
pub type Thunk<H> = Box<dyn FnOnce() -> Result<Registration<H>, BindError>>;

/// What a listener factory hands back.
pub enum Registration<H> {
    /// One registration, released on deactivation.
    Single(H),
    /// Several registrations, each performed by its own thunk.
    Multi(ListenerMap<H>),
    /// A value that is neither shape.
    Invalid(Value),
}

impl<H> Registration<H> {
    pub fn single(handle: H) -> Self {
        Self::Single(handle)
    }

    pub fn invalid(value: impl Into<Value>) -> Self {
        Self::Invalid(value.into())
    }

    /// Short description used in shape errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Single(_) => "a canceler".to_string(),
            Self::Multi(_) => "a listener map".to_string(),
            Self::Invalid(value) => describe_value(value).to_string(),
        }
    }
}

impl<H> From<ListenerMap<H>> for Registration<H> {
    fn from(map: ListenerMap<H>) -> Self {
        Self::Multi(map)
    }
}

impl<H> fmt::Debug for Registration<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single(..)"),
            Self::Multi(map) => f.debug_tuple("Multi").field(map).finish(),
            Self::Invalid(value) => f.debug_tuple("Invalid").field(value).finish(),
        }
    }
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a plain object",
    }
}

/// Insertion-ordered activation thunks.
pub struct ListenerMap<H> {
    entries: IndexMap<String, Thunk<H>>,
}

impl<H: 'static> ListenerMap<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add a thunk that registers one listener and returns its handle.
    #[must_use]
    pub fn listener(self, key: impl Into<String>, thunk: impl FnOnce() -> H + 'static) -> Self {
        self.try_listener(key, move || Ok(Registration::Single(thunk())))
    }

    /// Add a thunk that may fail or return an arbitrary registration.
    #[must_use]
    pub fn try_listener(
        mut self,
        key: impl Into<String>,
        thunk: impl FnOnce() -> Result<Registration<H>, BindError> + 'static,
    ) -> Self {
        self.entries.insert(key.into(), Box::new(thunk));
        self
    }
}

impl<H> ListenerMap<H> {
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

impl<H: 'static> Default for ListenerMap<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ListenerMap<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Arguments a listener factory is invoked with.
pub struct ListenerContext<'a, A: Adapter> {
    /// The node the listeners belong to.
    pub node: &'a NodeHandle,
    /// Adapter-specific accessor (spy-wrapped for the realtime store).
    pub source: &'a A::Accessor,
    /// Identity captured when the binder was constructed.
    pub identity: Option<&'a Identity>,
}

/// Arguments a dispatcher factory is invoked with.
pub struct DispatchContext<'a, A: Adapter> {
    pub node: &'a NodeHandle,
    /// Raw client handle, not spy-wrapped.
    pub client: &'a A::Client,
    pub identity: Option<&'a Identity>,
}

/// Turn a factory result into records, running thunks in order.
///
/// # Errors
///
/// See the module-level failure table.
pub fn normalize<A: Adapter>(
    accessor: &A::Accessor,
    registration: Registration<A::Handle>,
) -> Result<RecordSet, BindError> {
    let mut records = RecordSet::new();
    match registration {
        Registration::Single(handle) => records.extend(A::seal(accessor, handle)),
        Registration::Multi(map) => {
            let early = A::sweep(accessor);
            if !early.is_empty() {
                tracing::debug!(
                    target: "firelink::binder",
                    adapter = A::NAME,
                    registered = early.len(),
                    "listeners registered outside multi-listener thunks"
                );
            }
            records.extend(early);
            for (key, thunk) in map.entries {
                let produced = match thunk() {
                    Ok(produced) => produced,
                    Err(err) => {
                        records.extend(A::sweep(accessor));
                        return Err(err.with_guidance(MULTI_LISTENER_GUIDANCE));
                    }
                };
                match produced {
                    Registration::Single(handle) => records.extend(A::seal(accessor, handle)),
                    other => {
                        records.extend(A::sweep(accessor));
                        return Err(BindError::multi_listener_shape(&key, &other.describe()));
                    }
                }
            }
        }
        Registration::Invalid(value) => {
            return Err(BindError::listener_shape(describe_value(&value)));
        }
    }
    Ok(records)
}
