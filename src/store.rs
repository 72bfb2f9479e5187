//! The single source of truth for an open form.
//!
//! The store owns the document being edited and hands out snapshots. Every write swaps in a
//! complete new document and then notifies subscribers once, so a subscriber never sees a
//! half-applied edit.

use crate::document::{Document, Value};
use crate::path::{self, FieldPath};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Handle returned by [`FormStore::subscribe`], used to unsubscribe.
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Document)>;

/// Document under edit plus the callbacks watching it.
pub struct FormStore {
    document: Document,
    revision: u64,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl FormStore {
    #[must_use]
    /// Starts a store holding `document`.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            revision: 0,
            next_subscription: 0,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    /// Current snapshot.
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    /// Number of writes applied since the store was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers a callback run after every write with the new document.
    pub fn subscribe(&mut self, callback: impl FnMut(&Document) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Drops a callback; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Stores `value` at `path`, creating missing sections on the way.
    pub fn set_field(&mut self, path: &FieldPath, value: Value) {
        let next = path::write(&self.document, path, value);
        self.replace(next);
    }

    /// Swaps in a whole new document.
    pub fn replace(&mut self, document: Document) {
        self.document = document;
        self.revision += 1;
        for (_, callback) in &mut self.subscribers {
            callback(&self.document);
        }
    }

    /// Re-initialises the store with a fresh document, as when a form is reopened.
    pub fn reset(&mut self, document: Document) {
        self.replace(document);
    }
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod tests;
