#![forbid(unsafe_code)]

//! firelink public facade.
//!
//! Re-exports the core types and, with the default `runtime` feature, the
//! provider, binder, and binding factories. Most callers only need the
//! [`prelude`].
//!
//! ```ignore
//! use firelink::prelude::*;
//!
//! let mut provider = AmbientStateProvider::new(
//!     ProviderConfig::new().identity_source(auth).prop("theme", "dark"),
//! );
//! provider.activate()?;
//!
//! let greeting = identity_connect().wrap(|props: &Props| {
//!     props.identity().map(|who| format!("hello {}", who.as_value()))
//! });
//! let node = greeting.mount(&provider.scope(), Props::new())?;
//! ```

#[cfg(feature = "logging")]
pub use firelink_core::logging;
pub use firelink_core::{
    BindError, Canceler, EventKind, Identity, IdentitySource, NotificationMode, ProviderOptions,
    RealtimeClient, RealtimeResource, Snapshot, SnapshotCallback, Value,
};

#[cfg(feature = "runtime")]
pub use firelink_runtime::{
    AmbientStateProvider, BoundComponent, BoundNode, Connector, DispatchSet, IdentityPolicy,
    ListenerMap, NodeHandle, Props, ProviderConfig, Registration, Scope, document_connect,
    identity_connect, realtime_connect,
};

/// Common imports for binding code.
pub mod prelude {
    pub use firelink_core::{
        BindError, Canceler, EventKind, Identity, IdentitySource, NotificationMode, Snapshot,
        SnapshotCallback, Value,
    };

    #[cfg(feature = "runtime")]
    pub use firelink_runtime::{
        AmbientStateProvider, DispatchSet, IdentityPolicy, ListenerMap, Props, ProviderConfig,
        Registration, Scope, document_connect, identity_connect, realtime_connect,
    };
}
