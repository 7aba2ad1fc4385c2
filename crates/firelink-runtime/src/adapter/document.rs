#![forbid(unsafe_code)]

//! Document-store adapter.
//!
//! The client is opaque: listener and dispatcher factories receive it as the
//! concrete type `C` the provider was configured with, and listener handles
//! are plain [`Canceler`]s released by calling them.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use firelink_core::{BindError, Canceler};

use super::Adapter;
use crate::ambient::AmbientValueSet;
use crate::record::SubscriptionRecord;

/// Binder specialization for a document-store client of type `C`.
pub struct DocumentAdapter<C>(PhantomData<fn() -> C>);

impl<C> fmt::Debug for DocumentAdapter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DocumentAdapter")
    }
}

impl<C: 'static> Adapter for DocumentAdapter<C> {
    const NAME: &'static str = "document";

    type Client = Rc<C>;
    type Accessor = Rc<C>;
    type Handle = Canceler;

    fn client(ambient: &AmbientValueSet) -> Result<Self::Client, BindError> {
        ambient
            .clients()
            .document::<C>()
            .ok_or(BindError::MissingClient(Self::NAME))
    }

    fn accessor(client: &Self::Client) -> Self::Accessor {
        Rc::clone(client)
    }

    fn seal(_client: &Self::Accessor, handle: Self::Handle) -> Vec<SubscriptionRecord> {
        vec![SubscriptionRecord::new(None, move || handle.cancel())]
    }
}
