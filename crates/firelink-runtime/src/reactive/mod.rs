#![forbid(unsafe_code)]

//! Reactive primitives backing ambient propagation and node state.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` function pointers and cleaned
//! up lazily during notification. Everything in this module is `!Send`; the
//! binding layer runs on one event-loop thread.

pub mod observable;

pub use observable::{Observable, Subscription};
