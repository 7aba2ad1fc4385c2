#![forbid(unsafe_code)]

//! Test doubles and fixtures for firelink.
//!
//! This crate provides:
//! - [`FakeClock`] for deferring callbacks and firing them on demand
//! - [`CallLog`] for asserting call order across collaborators
//! - [`MockIdentitySource`], [`MockRealtimeClient`], and
//!   [`MockDocumentClient`] standing in for external data sources
//! - [`LogCapture`] for asserting on emitted `tracing` events
//! - [`card`], a render target reading the props the tests care about
//!
//! All doubles are single-threaded and share state through `Rc`, matching
//! the runtime they exercise.

pub mod capture;
pub mod clock;
pub mod document;
pub mod fixtures;
pub mod identity;
pub mod log;
pub mod realtime;

pub use capture::LogCapture;
pub use clock::FakeClock;
pub use document::MockDocumentClient;
pub use fixtures::{Card, NO_USER, card};
pub use identity::MockIdentitySource;
pub use log::CallLog;
pub use realtime::{MockRealtimeClient, MockRealtimeResource, OffCall};

/// Delay used by every double that calls back "later".
pub const DEFAULT_DELAY_MS: u64 = 1000;
