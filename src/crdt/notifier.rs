//! Change notification for document subscribers.
//!
//! Subscribers are kept in a lock-free SkipMap so callbacks can subscribe or
//! unsubscribe (including themselves) while a notification is running.

use crossbeam_skiplist::SkipMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

/// Where the change that produced an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

/// The settled text after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub text: String,
    pub origin: ChangeOrigin,
}

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
type Subscribers = SkipMap<u64, Callback>;

/// Fan-out of change events to registered callbacks.
pub struct ChangeNotifier {
    subscribers: Arc<Subscribers>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        ChangeNotifier {
            subscribers: Arc::new(SkipMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers `callback`; it stays registered until the returned
    /// subscription is unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        self.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Delivers `event` to every current subscriber.
    pub fn notify(&self, event: &ChangeEvent) {
        let callbacks: Vec<Callback> = self
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a registered callback.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    /// Removes the callback.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.remove(&self.id);
        }
    }
}
