#![forbid(unsafe_code)]

//! Core types for firelink.
//!
//! This crate holds everything the runtime and the test harness agree on:
//!
//! - [`value`]: the open [`Value`] type, [`Identity`], [`EventKind`], and
//!   the one-shot [`Canceler`].
//! - [`source`]: the traits external collaborators implement (identity
//!   source, realtime store, realtime resource).
//! - [`error`]: [`BindError`], the single error type of the binding layer.
//! - [`config`]: serde-loadable [`ProviderOptions`].
//! - `logging`: `tracing` subscriber bootstrap (feature `logging`).

pub mod config;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod source;
pub mod value;

pub use config::{NotificationMode, ProviderOptions};
pub use error::{BindError, MULTI_LISTENER_GUIDANCE, SHAPE_GUIDANCE};
pub use source::{
    IdentityCallback, IdentitySource, RealtimeClient, RealtimeResource, Snapshot,
    SnapshotCallback,
};
pub use value::{Canceler, EventKind, Identity, Value};
