#![forbid(unsafe_code)]

//! Interfaces of the external collaborators.
//!
//! The binding layer consumes these and never implements them; concrete
//! clients (or the doubles in `firelink-harness`) do. All calls are
//! synchronous from the binding layer's perspective: a registration returns
//! its release handle immediately, whatever I/O the client performs later.

use std::any::Any;
use std::rc::Rc;

use crate::config::NotificationMode;
use crate::value::{Canceler, EventKind, Identity, Value};

/// Callback receiving the current identity (`None` when signed out).
pub type IdentityCallback = Rc<dyn Fn(Option<Identity>)>;

/// Payload delivered by a realtime resource.
pub type Snapshot = Value;

/// Listener registered on a realtime resource.
///
/// The same `Rc` returned by [`RealtimeResource::on`] is what
/// [`RealtimeResource::off`] matches against, so identity is by pointer.
pub type SnapshotCallback = Rc<dyn Fn(&Snapshot)>;

/// Source of identity-change notifications.
pub trait IdentitySource {
    /// Notify on sign-in and sign-out only.
    fn on_auth_state_changed(&self, callback: IdentityCallback) -> Canceler;

    /// Notify on sign-in, sign-out, and token refresh.
    fn on_id_token_changed(&self, callback: IdentityCallback) -> Canceler;

    /// Subscribe with the method selected by `mode`.
    fn subscribe(&self, mode: NotificationMode, callback: IdentityCallback) -> Canceler {
        match mode {
            NotificationMode::StateChange => self.on_auth_state_changed(callback),
            NotificationMode::TokenRefreshInclusive => self.on_id_token_changed(callback),
        }
    }

    /// Access the concrete source, for dispatchers that call source-specific
    /// methods.
    fn as_any(&self) -> &dyn Any;
}

/// Path-addressable realtime store.
pub trait RealtimeClient {
    /// Address the resource at `path`.
    fn resource(&self, path: &str) -> Rc<dyn RealtimeResource>;
}

/// One addressable resource in the realtime store.
pub trait RealtimeResource {
    fn path(&self) -> &str;

    /// Register `callback` for `kind`, returning the registered callback.
    fn on(&self, kind: EventKind, callback: SnapshotCallback) -> SnapshotCallback;

    /// Remove registrations.
    ///
    /// With no kind, every registration on the resource is removed. With a
    /// kind and no callback, every registration of that kind is removed.
    fn off(&self, kind: Option<&EventKind>, callback: Option<&SnapshotCallback>);

    /// Overwrite the value stored at this resource.
    fn set(&self, value: Value);
}
