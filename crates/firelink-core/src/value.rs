#![forbid(unsafe_code)]

//! Value types shared by providers, binders, and data-source clients.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Open value type for passthrough props, local state, and snapshots.
pub type Value = serde_json::Value;

/// Opaque token for an authenticated principal.
///
/// The binding layer never inspects the token beyond equality; it is carried
/// from the identity source into the ambient value set as-is.
///
/// ```
/// use firelink_core::Identity;
/// use serde_json::json;
///
/// let identity = Identity::new(json!({ "uid": 123 }));
/// assert_eq!(identity.uid(), Some(&json!(123)));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Value);

impl Identity {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<Value>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the raw token.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `uid` field of an object token, if any.
    #[must_use]
    pub fn uid(&self) -> Option<&Value> {
        self.0.get("uid")
    }
}

impl From<Value> for Identity {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Discriminator for independently removable listeners on one realtime
/// resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(Cow<'static, str>);

impl EventKind {
    pub const VALUE: Self = Self(Cow::Borrowed("value"));
    pub const CHILD_ADDED: Self = Self(Cow::Borrowed("child_added"));
    pub const CHILD_CHANGED: Self = Self(Cow::Borrowed("child_changed"));
    pub const CHILD_REMOVED: Self = Self(Cow::Borrowed("child_removed"));
    pub const CHILD_MOVED: Self = Self(Cow::Borrowed("child_moved"));

    /// Create an event kind from any name.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventKind {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A zero-argument cancel function, consumed on use.
///
/// Taking `self` by value makes a second cancel unrepresentable. Dropping a
/// `Canceler` without calling [`cancel`](Self::cancel) does nothing; owners
/// that need release-on-drop wrap it in a record that cancels in `Drop`.
#[must_use = "a dropped Canceler never cancels its registration"]
pub struct Canceler(Box<dyn FnOnce()>);

impl Canceler {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self(Box::new(cancel))
    }

    /// A canceler with nothing to release.
    pub fn noop() -> Self {
        Self(Box::new(|| {}))
    }

    /// Run the cancel function.
    pub fn cancel(self) {
        (self.0)();
    }
}

impl fmt::Debug for Canceler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceler").finish_non_exhaustive()
    }
}
