#![forbid(unsafe_code)]

//! Adapters specialize the binder to one external source shape.
//!
//! | Adapter | Accessor for listener factories | Registration unit | Release |
//! |---------|---------------------------------|-------------------|---------|
//! | [`RealtimeAdapter`] | [`RealtimeTape`] (records every `on` call and event kinds) | `on` call x event kind | `off(kind, callback)`, or `off()` when no kind was recorded |
//! | [`DocumentAdapter`] | the raw client | [`Canceler`](firelink_core::Canceler) | call it |
//! | [`IdentityAdapter`] | the raw identity source | none | none |

pub mod document;
pub mod identity;
pub mod realtime;

pub use document::DocumentAdapter;
pub use identity::IdentityAdapter;
pub use realtime::{RealtimeAdapter, RealtimeTape, TapedResource};

use firelink_core::BindError;

use crate::ambient::AmbientValueSet;
use crate::record::SubscriptionRecord;

/// How a binder reaches one kind of data source.
pub trait Adapter: 'static {
    /// Name used in errors and logs.
    const NAME: &'static str;

    /// Raw client handle given to dispatcher factories.
    type Client: Clone + 'static;

    /// What listener factories receive to register through.
    type Accessor;

    /// Release handle a listener factory (or one of its thunks) returns.
    type Handle: 'static;

    /// Resolve the client from the ambient value set.
    ///
    /// # Errors
    ///
    /// [`BindError::MissingClient`] when the provider holds no such client.
    fn client(ambient: &AmbientValueSet) -> Result<Self::Client, BindError>;

    /// Build the accessor for one activation.
    fn accessor(client: &Self::Client) -> Self::Accessor;

    /// Turn one handle, plus whatever the accessor recorded since the last
    /// seal or sweep, into records.
    fn seal(accessor: &Self::Accessor, handle: Self::Handle) -> Vec<SubscriptionRecord>;

    /// Records for whatever the accessor saw registered since the last seal
    /// without a handle to seal it under.
    fn sweep(_accessor: &Self::Accessor) -> Vec<SubscriptionRecord> {
        Vec::new()
    }
}

/// Adapters that accept listener factories.
///
/// The identity adapter is dispatch-only and does not implement this.
pub trait Subscribable: Adapter {}

impl Subscribable for RealtimeAdapter {}
impl<C: 'static> Subscribable for DocumentAdapter<C> {}
