//! Dependency - the subscriber list of one reactive property.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::tracking;
use super::watcher::Watcher;
use crate::error::Result;

thread_local! {
    static NEXT_DEPENDENCY_ID: Cell<usize> = const { Cell::new(0) };
}

struct DependencyInner {
    id: usize,
    /// Subscribers in subscription order.
    subscribers: RefCell<Vec<Watcher>>,
}

/// Subscriber list owned by one reactive property.
///
/// Cloning is cheap and shares the same list.
#[derive(Clone)]
pub struct Dependency {
    inner: Rc<DependencyInner>,
}

impl Default for Dependency {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.inner.id)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Dependency {
    pub fn new() -> Self {
        let id = NEXT_DEPENDENCY_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self {
            inner: Rc::new(DependencyInner {
                id,
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Subscribe a watcher. Returns false if it was already subscribed.
    pub fn add_watcher(&self, watcher: &Watcher) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        if subscribers.iter().any(|w| w.id() == watcher.id()) {
            return false;
        }
        subscribers.push(watcher.clone());
        true
    }

    /// Unsubscribe a watcher by id.
    pub fn remove_watcher(&self, watcher_id: usize) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|w| w.id() != watcher_id);
    }

    /// Subscribe the currently evaluating watcher, if there is one.
    pub fn depend(&self) {
        if let Some(watcher) = tracking::current_watcher()
            && self.add_watcher(&watcher)
        {
            watcher.track(self);
            trace!(dependency = self.id(), watcher = watcher.id(), "subscribed");
        }
    }

    /// Update every subscriber, in subscription order.
    ///
    /// The list is snapshotted first, so subscribers added during the pass
    /// wait for the next notification. The first failing update stops the
    /// pass and its error is returned.
    pub fn notify(&self) -> Result<()> {
        let subscribers = self.inner.subscribers.borrow().clone();
        trace!(dependency = self.id(), subscribers = subscribers.len(), "notify");
        for watcher in subscribers {
            watcher.update()?;
        }
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Ids of the subscribers in subscription order.
    pub fn subscriber_ids(&self) -> Vec<usize> {
        self.inner.subscribers.borrow().iter().map(Watcher::id).collect()
    }

    pub(crate) fn downgrade(&self) -> WeakDependency {
        WeakDependency {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle kept by watchers so they can unsubscribe on dispose.
#[derive(Clone)]
pub(crate) struct WeakDependency {
    id: usize,
    inner: Weak<DependencyInner>,
}

impl WeakDependency {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn upgrade(&self) -> Option<Dependency> {
        self.inner.upgrade().map(|inner| Dependency { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindError;
    use crate::reactive::Model;
    use serde_json::json;

    fn counting_watcher(model: &Model, expr: &str) -> (Watcher, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let watcher = Watcher::new(model, expr, move |_| {
            calls_clone.set(calls_clone.get() + 1);
            Ok(())
        })
        .unwrap();
        (watcher, calls)
    }

    #[test]
    fn test_add_is_idempotent() {
        let model = Model::observe(json!({"a": 1})).unwrap();
        let (watcher, _) = counting_watcher(&model, "a");
        let dep = Dependency::new();

        assert!(dep.add_watcher(&watcher));
        assert!(!dep.add_watcher(&watcher));
        assert_eq!(dep.subscriber_count(), 1);
    }

    #[test]
    fn test_notify_in_subscription_order() {
        let model = Model::observe(json!({"a": 1})).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));
        let dep = Dependency::new();

        let mut ids = Vec::new();
        for label in ["first", "second", "third"] {
            let order = order.clone();
            let watcher = Watcher::new(&model, "a", move |_| {
                order.borrow_mut().push(label);
                Ok(())
            })
            .unwrap();
            dep.add_watcher(&watcher);
            ids.push(watcher.id());
        }

        dep.notify().unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
        assert_eq!(dep.subscriber_ids(), ids);
    }

    #[test]
    fn test_notify_stops_at_first_error() {
        let model = Model::observe(json!({"a": 1})).unwrap();
        let dep = Dependency::new();
        let failing = Watcher::new(&model, "a", |_| Err(BindError::handler("fail"))).unwrap();
        let (after, calls) = counting_watcher(&model, "a");
        dep.add_watcher(&failing);
        dep.add_watcher(&after);

        assert_eq!(dep.notify(), Err(BindError::handler("fail")));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_depend_requires_tracking() {
        let model = Model::observe(json!({"a": 1})).unwrap();
        let (watcher, _) = counting_watcher(&model, "a");
        let dep = Dependency::new();

        dep.depend();
        assert_eq!(dep.subscriber_count(), 0);

        tracking::with_watcher(&watcher, || dep.depend());
        assert_eq!(dep.subscriber_ids(), vec![watcher.id()]);
    }

    #[test]
    fn test_remove_watcher() {
        let model = Model::observe(json!({"a": 1})).unwrap();
        let (watcher, calls) = counting_watcher(&model, "a");
        let dep = Dependency::new();
        dep.add_watcher(&watcher);

        dep.remove_watcher(watcher.id());
        dep.notify().unwrap();
        assert_eq!(calls.get(), 0);
    }
}
