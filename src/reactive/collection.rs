//! Live ordered collections with structural change notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::channel::{Callback, Channel, SubscriptionId};
use super::value::Value;

/// A structural change to a [`Collection`].
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange {
    Insert { index: usize, item: Value },
    Remove { index: usize, item: Value },
    Update { index: usize, item: Value },
    Replace { items: Vec<Value> },
}

struct Inner {
    items: RefCell<Vec<Value>>,
    channel: Channel<CollectionChange>,
}

/// A shared, observable list of values.
///
/// `Clone` produces another handle to the same list. Each mutation notifies
/// structural subscribers synchronously, after the list itself has been
/// updated.
#[derive(Clone)]
pub struct Collection {
    inner: Rc<Inner>,
}

impl Collection {
    pub fn new() -> Self {
        Self::from_items(Vec::<Value>::new())
    }

    pub fn from_items(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self {
            inner: Rc::new(Inner {
                items: RefCell::new(items.into_iter().map(Into::into).collect()),
                channel: Channel::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    /// Position of the first item equal to `item` (identity for models).
    pub fn index_of(&self, item: &Value) -> Option<usize> {
        self.inner.items.borrow().iter().position(|v| v == item)
    }

    /// Insert at `index`; an index past the end appends.
    pub fn insert(&self, index: usize, item: impl Into<Value>) {
        let item = item.into();
        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, item.clone());
            index
        };
        self.notify(CollectionChange::Insert { index, item });
    }

    pub fn push(&self, item: impl Into<Value>) {
        self.insert(usize::MAX, item);
    }

    /// Remove the first item equal to `item`. Returns its former index, or
    /// `None` (without notifying) when it is not present.
    pub fn remove(&self, item: &Value) -> Option<usize> {
        let index = self.index_of(item)?;
        self.remove_at(index).map(|_| index)
    }

    pub fn remove_at(&self, index: usize) -> Option<Value> {
        let item = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.notify(CollectionChange::Remove {
            index,
            item: item.clone(),
        });
        Some(item)
    }

    /// Replace the item at `index`, returning the old one.
    pub fn update(&self, index: usize, item: impl Into<Value>) -> Option<Value> {
        let item = item.into();
        let old = {
            let mut items = self.inner.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, item.clone())
        };
        self.notify(CollectionChange::Update { index, item });
        Some(old)
    }

    /// Replace the whole contents.
    pub fn replace(&self, items: impl IntoIterator<Item = impl Into<Value>>) {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        *self.inner.items.borrow_mut() = items.clone();
        self.notify(CollectionChange::Replace { items });
    }

    pub fn subscribe(&self, callback: Callback<CollectionChange>) -> SubscriptionId {
        self.inner.channel.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.channel.unsubscribe(id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.channel.len()
    }

    /// Whether both handles refer to the same list.
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, change: CollectionChange) {
        tracing::trace!(?change, subscribers = self.inner.channel.len(), "collection changed");
        self.inner.channel.notify(&change);
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recorder(collection: &Collection) -> Rc<RefCell<Vec<CollectionChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        collection.subscribe(Rc::new(move |c: &CollectionChange| log_c.borrow_mut().push(c.clone())));
        log
    }

    #[test]
    fn insert_notifies_with_clamped_index() {
        let c = Collection::from_items(["a", "b"]);
        let log = recorder(&c);
        c.insert(1, "x");
        c.insert(99, "z");
        assert_eq!(
            c.items(),
            vec![Value::from("a"), Value::from("x"), Value::from("b"), Value::from("z")]
        );
        assert_eq!(
            *log.borrow(),
            vec![
                CollectionChange::Insert { index: 1, item: "x".into() },
                CollectionChange::Insert { index: 3, item: "z".into() },
            ]
        );
    }

    #[test]
    fn remove_by_value() {
        let c = Collection::from_items([1, 2, 3]);
        let log = recorder(&c);
        assert_eq!(c.remove(&2.into()), Some(1));
        assert_eq!(c.remove(&7.into()), None);
        assert_eq!(c.len(), 2);
        assert_eq!(
            *log.borrow(),
            vec![CollectionChange::Remove { index: 1, item: 2.into() }]
        );
    }

    #[test]
    fn update_and_replace() {
        let c = Collection::from_items([1, 2]);
        let log = recorder(&c);
        assert_eq!(c.update(0, 10), Some(1.into()));
        assert_eq!(c.update(5, 10), None);
        c.replace([7]);
        assert_eq!(c.items(), vec![Value::from(7)]);
        assert_eq!(
            *log.borrow(),
            vec![
                CollectionChange::Update { index: 0, item: 10.into() },
                CollectionChange::Replace { items: vec![7.into()] },
            ]
        );
    }

    #[test]
    fn clones_share_state() {
        let a = Collection::new();
        let b = a.clone();
        b.push("x");
        assert_eq!(a.len(), 1);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Collection::new()));
    }

    #[test]
    fn list_is_updated_before_notification() {
        let c = Collection::new();
        let seen_len = Rc::new(RefCell::new(0));
        let (c2, seen) = (c.clone(), seen_len.clone());
        c.subscribe(Rc::new(move |_: &CollectionChange| *seen.borrow_mut() = c2.len()));
        c.push(1);
        assert_eq!(*seen_len.borrow(), 1);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let c = Collection::new();
        let id = c.subscribe(Rc::new(|_: &CollectionChange| panic!("should not fire")));
        assert_eq!(c.subscriber_count(), 1);
        c.unsubscribe(id);
        c.unsubscribe(id);
        c.push(1);
        assert_eq!(c.subscriber_count(), 0);
    }
}
