//! Ordered subscriber lists with snapshot-then-iterate notification.
//!
//! A [`Channel`] is the pub/sub primitive behind both model property changes
//! and collection structure changes. Notification:
//!
//! 1. clones the current subscriber list (the snapshot),
//! 2. releases the borrow,
//! 3. invokes each snapshot entry in registration order, skipping any entry
//!    that was unsubscribed earlier in the same pass.
//!
//! Callbacks are therefore free to subscribe or unsubscribe on the channel they
//! are being notified from, including removing themselves.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identity of one registered callback on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A subscriber callback.
pub type Callback<T> = Rc<dyn Fn(&T)>;

/// An insertion-ordered list of subscriber callbacks.
pub struct Channel<T> {
    subscribers: RefCell<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Register a callback. Every call yields a fresh identity, so the same
    /// closure subscribed twice fires twice.
    pub fn subscribe(&self, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.subscribers.borrow_mut().push((id, callback));
        id
    }

    /// Remove a callback. Returns `false` (and does nothing) if it was not
    /// subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        match subscribers.iter().position(|(sid, _)| *sid == id) {
            Some(index) => {
                subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow().iter().any(|(sid, _)| *sid == id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Invoke every subscriber with `payload`, in registration order.
    pub fn notify(&self, payload: &T) {
        let snapshot: Vec<(SubscriptionId, Callback<T>)> = self.subscribers.borrow().clone();
        for (id, callback) in snapshot {
            // Removed by an earlier callback in this pass.
            if !self.is_subscribed(id) {
                continue;
            }
            callback(payload);
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.len())
            .finish()
    }
}
