#![forbid(unsafe_code)]

//! Errors raised by the binding layer.
//!
//! # Failure Modes
//!
//! | Variant | Cause | Recovery |
//! |---------|-------|----------|
//! | `ListenerShape` | Listener factory returned neither a canceler nor a map of thunks | None: fix the caller |
//! | `MissingClient` | A factory needs a data-source client the provider does not hold | Configure the provider |
//! | `Lifecycle` | Binder activated twice or after deactivation | None: mount a new node |
//! | `External` | Caller or client code failed | Propagated unmodified |
//! | `Config` | Provider options could not be parsed | Fix the options file |

use std::error::Error;

/// Shape guidance attached to every listener shape failure.
pub const SHAPE_GUIDANCE: &str = "a listener factory must return either a canceler (for one listener) or a map of activation thunks (for multiple listeners)";

/// Extra guidance attached when a multi-listener entry misbehaves.
pub const MULTI_LISTENER_GUIDANCE: &str =
    "each entry of a multi-listener map must be a no-argument thunk that returns a canceler";

/// Error type for provider, binder, and adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// A listener factory or one of its thunks produced an unusable shape.
    #[error("listener shape error: {0}")]
    ListenerShape(String),

    /// The ambient value set holds no client of the kind an adapter needs.
    #[error("no {0} client in the ambient value set")]
    MissingClient(&'static str),

    /// A binder lifecycle transition that the state machine forbids.
    #[error("invalid lifecycle transition from {from} to {to}")]
    Lifecycle {
        from: &'static str,
        to: &'static str,
    },

    /// Caller or client failure, carried through untouched.
    #[error("external failure: {0}")]
    External(#[source] Box<dyn Error + 'static>),

    /// Provider options could not be parsed.
    #[error("invalid provider options: {0}")]
    Config(String),
}

impl BindError {
    /// Shape failure for a factory result that is neither shape.
    ///
    /// `found` names what was actually returned (e.g. `"null"`).
    #[must_use]
    pub fn listener_shape(found: &str) -> Self {
        Self::ListenerShape(format!("{SHAPE_GUIDANCE}; got {found}"))
    }

    /// Shape failure for a multi-listener thunk that did not return a canceler.
    #[must_use]
    pub fn multi_listener_shape(key: &str, found: &str) -> Self {
        Self::ListenerShape(format!(
            "entry `{key}` returned {found}; {MULTI_LISTENER_GUIDANCE}"
        ))
    }

    /// Wrap any caller or client error.
    pub fn external(err: impl Error + 'static) -> Self {
        Self::External(Box::new(err))
    }

    #[must_use]
    pub fn is_listener_shape(&self) -> bool {
        matches!(self, Self::ListenerShape(_))
    }

    /// Append guidance to a shape failure, keeping its kind.
    ///
    /// Any other variant is returned unchanged.
    #[must_use]
    pub fn with_guidance(self, guidance: &str) -> Self {
        match self {
            Self::ListenerShape(message) if message.contains(guidance) => {
                Self::ListenerShape(message)
            }
            Self::ListenerShape(message) => Self::ListenerShape(format!("{message}; {guidance}")),
            other => other,
        }
    }
}
