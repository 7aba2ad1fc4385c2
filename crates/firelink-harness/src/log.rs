#![forbid(unsafe_code)]

//! Shared, ordered record of calls made on test doubles.

use std::cell::RefCell;
use std::rc::Rc;

/// Ordered call log. Clones append to the same log.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// Every entry so far, in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Number of entries equal to `entry`.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries.borrow().iter().filter(|e| *e == entry).count()
    }

    /// Position of the first entry equal to `entry`.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e == entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
