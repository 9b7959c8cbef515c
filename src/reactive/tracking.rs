//! Tracking context - which watcher is currently collecting dependencies.
//!
//! The marker is thread-local but only ever set through a scope: the
//! previous marker is restored when the scope ends, even if evaluation
//! returns early with an error. Scopes nest.

use std::cell::RefCell;

use super::watcher::Watcher;

thread_local! {
    static CURRENT_WATCHER: RefCell<Option<Watcher>> = const { RefCell::new(None) };
}

/// Restores the previous marker on drop.
struct Scope {
    previous: Option<Watcher>,
}

impl Scope {
    fn enter(watcher: Option<Watcher>) -> Self {
        let previous = CURRENT_WATCHER.with(|current| current.replace(watcher));
        Self { previous }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_WATCHER.with(|current| *current.borrow_mut() = previous);
    }
}

/// The watcher currently evaluating its expression, if any.
pub fn current_watcher() -> Option<Watcher> {
    CURRENT_WATCHER.with(|current| current.borrow().clone())
}

/// Check if reads are currently being collected.
pub fn is_tracking() -> bool {
    CURRENT_WATCHER.with(|current| current.borrow().is_some())
}

/// Run `f` with `watcher` as the evaluating watcher. Every reactive read in
/// `f` subscribes `watcher`.
pub fn with_watcher<R>(watcher: &Watcher, f: impl FnOnce() -> R) -> R {
    let _scope = Scope::enter(Some(watcher.clone()));
    f()
}

/// Run `f` with no evaluating watcher. Reads in `f` subscribe nothing.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _scope = Scope::enter(None);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Model;
    use serde_json::json;

    #[test]
    fn test_scopes_nest_and_restore() {
        let model = Model::observe(json!({"a": 1, "b": 2})).unwrap();
        let outer = Watcher::new(&model, "a", |_| Ok(())).unwrap();
        let inner = Watcher::new(&model, "b", |_| Ok(())).unwrap();

        assert!(!is_tracking());
        with_watcher(&outer, || {
            assert_eq!(current_watcher().map(|w| w.id()), Some(outer.id()));
            with_watcher(&inner, || {
                assert_eq!(current_watcher().map(|w| w.id()), Some(inner.id()));
                untracked(|| assert!(!is_tracking()));
            });
            assert_eq!(current_watcher().map(|w| w.id()), Some(outer.id()));
        });
        assert!(current_watcher().is_none());
    }

    #[test]
    fn test_marker_restored_after_error() {
        let model = Model::observe(json!({"a": 1})).unwrap();
        let watcher = Watcher::new(&model, "a", |_| Ok(())).unwrap();

        let result: Result<(), ()> = with_watcher(&watcher, || Err(()));
        assert!(result.is_err());
        assert!(!is_tracking());
    }
}
