#![forbid(unsafe_code)]

//! Version-tracked shared values with change notification.
//!
//! # Invariants
//!
//! 1. `version()` increments exactly once per `set` that changes the value.
//! 2. Setting a value equal to the current one is a no-op.
//! 3. Subscribers are notified in registration order, after the new value is
//!    stored and with no borrow held, so a callback may read or even set the
//!    observable again.
//! 4. Dropping a [`Subscription`] stops delivery before the next
//!    notification; dead entries are pruned lazily.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct Inner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared, version-tracked value.
///
/// Clones share the same underlying value.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Store `value` and notify subscribers if it differs from the current one.
    pub fn set(&self, value: T) {
        let (snapshot, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Derive the next value from the current one, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register `callback` for changes. Delivery stops when the returned
    /// guard is dropped.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.inner.borrow_mut().subscribers.push(Rc::downgrade(&strong));
        Subscription {
            _callback: Box::new(strong),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

/// RAII guard that keeps an [`Observable`] callback registered.
#[must_use = "dropping the Subscription unsubscribes immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_bumps_version_once() {
        let obs = Observable::new(1);
        obs.set(2);
        assert_eq!(obs.version(), 1);
        assert_eq!(obs.get(), 2);
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new("a".to_string());
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));
        obs.set("a".to_string());
        assert_eq!(obs.version(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn subscribers_fire_in_registration_order() {
        let obs = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        let o2 = Rc::clone(&order);
        let _a = obs.subscribe(move |v| o1.borrow_mut().push(("a", *v)));
        let _b = obs.subscribe(move |v| o2.borrow_mut().push(("b", *v)));
        obs.set(5);
        assert_eq!(*order.borrow(), vec![("a", 5), ("b", 5)]);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let sub = obs.subscribe(move |v| s.set(*v));
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(seen.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn callback_may_read_during_notification() {
        let obs = Observable::new(0);
        let reader = obs.clone();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |_| s.set(reader.get()));
        obs.set(9);
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn update_derives_from_current() {
        let obs = Observable::new(vec![1]);
        obs.update(|v| {
            let mut next = v.clone();
            next.push(2);
            next
        });
        assert_eq!(obs.get(), vec![1, 2]);
    }
}
