#![forbid(unsafe_code)]

//! Ambient state propagation and subscription lifecycle binding.
//!
//! This crate provides:
//! - [`AmbientStateProvider`] for publishing static props, identity, and
//!   data-source clients to a subtree
//! - [`SubscriptionBinder`] for registering listeners on activation and
//!   releasing every one of them on deactivation
//! - the [`realtime_connect`], [`document_connect`], and [`identity_connect`]
//!   binding factories, producing mountable [`BoundComponent`]s
//!
//! # Architecture
//!
//! A provider owns an [`AmbientChannel`]; nodes mounted under its [`Scope`]
//! read the channel's current [`AmbientValueSet`] and are notified of every
//! change. Each mounted [`BoundNode`] owns one binder at a time. Everything
//! is single-threaded and `!Send`.

pub mod adapter;
pub mod ambient;
pub mod binder;
pub mod factory;
pub mod listener;
pub mod node;
pub mod props;
pub mod provider;
pub mod reactive;
pub mod record;

pub use adapter::{
    Adapter, DocumentAdapter, IdentityAdapter, RealtimeAdapter, RealtimeTape, Subscribable,
    TapedResource,
};
pub use ambient::{AmbientChannel, AmbientReader, AmbientValueSet, Clients, Scope};
pub use binder::{DispatcherFactory, ListenerFactory, Phase, SubscriptionBinder};
pub use factory::{
    BoundComponent, BoundNode, Connector, IdentityPolicy, document_connect, identity_connect,
    realtime_connect,
};
pub use listener::{DispatchContext, ListenerContext, ListenerMap, Registration, normalize};
pub use node::{NodeHandle, NodeId};
pub use props::{DispatchSet, Dispatcher, IDENTITY_KEY, Prop, Props};
pub use provider::{AmbientStateProvider, ProviderConfig};
pub use record::{RecordSet, SubscriptionRecord};
