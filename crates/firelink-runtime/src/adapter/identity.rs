#![forbid(unsafe_code)]

//! Identity-only adapter: dispatchers over the raw identity source, no
//! listeners.

use std::convert::Infallible;
use std::rc::Rc;

use firelink_core::{BindError, IdentitySource};

use super::Adapter;
use crate::ambient::AmbientValueSet;
use crate::record::SubscriptionRecord;

/// Dispatch-only binder specialization.
///
/// Its handle type is uninhabited: no listener can ever be registered.
#[derive(Debug)]
pub struct IdentityAdapter;

impl Adapter for IdentityAdapter {
    const NAME: &'static str = "identity";

    type Client = Rc<dyn IdentitySource>;
    type Accessor = Rc<dyn IdentitySource>;
    type Handle = Infallible;

    fn client(ambient: &AmbientValueSet) -> Result<Self::Client, BindError> {
        ambient
            .clients()
            .identity_source()
            .cloned()
            .ok_or(BindError::MissingClient(Self::NAME))
    }

    fn accessor(client: &Self::Client) -> Self::Accessor {
        Rc::clone(client)
    }

    fn seal(_source: &Self::Accessor, handle: Self::Handle) -> Vec<SubscriptionRecord> {
        match handle {}
    }
}
