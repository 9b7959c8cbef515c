//! Watcher - a dot-path expression bound to an update callback.
//!
//! Construction evaluates the expression once with the watcher marked as
//! current, which subscribes it to every reactive property on the path.
//! After that, every notification from one of those properties re-evaluates
//! the expression and hands the fresh value to the callback.
//!
//! Re-evaluation does not collect dependencies again: the subscription set
//! is fixed at construction. Replacing an intermediate object therefore
//! leaves the watcher subscribed to the old object's properties.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::dependency::{Dependency, WeakDependency};
use super::observer::{Model, WeakModel};
use super::path::Path;
use super::tracking;
use super::value::Value;
use crate::error::Result;

thread_local! {
    static NEXT_WATCHER_ID: Cell<usize> = const { Cell::new(0) };
}

/// Update callback. Receives the newly evaluated value.
pub type WatchCallback = Box<dyn Fn(&Value) -> Result<()>>;

struct WatcherInner {
    id: usize,
    path: Path,
    model: WeakModel,
    callback: WatchCallback,
    /// Last evaluated value.
    value: RefCell<Value>,
    /// Dependencies this watcher is subscribed to.
    deps: RefCell<Vec<WeakDependency>>,
    active: Cell<bool>,
}

/// A subscriber to one expression. Cloning shares the same watcher.
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.inner.id)
            .field("expression", &self.inner.path.as_str())
            .field("active", &self.inner.active.get())
            .finish()
    }
}

impl Watcher {
    /// Create a watcher and subscribe it to every reactive property read
    /// while evaluating `expr`.
    ///
    /// The callback is not invoked here; callers render the initial value
    /// themselves. If the first evaluation fails, any subscriptions already
    /// made are undone and the error is returned.
    pub fn new(
        model: &Model,
        expr: &str,
        callback: impl Fn(&Value) -> Result<()> + 'static,
    ) -> Result<Self> {
        let path = Path::parse(expr)?;
        let id = NEXT_WATCHER_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        let watcher = Self {
            inner: Rc::new(WatcherInner {
                id,
                path,
                model: model.downgrade(),
                callback: Box::new(callback),
                value: RefCell::new(Value::Undefined),
                deps: RefCell::new(Vec::new()),
                active: Cell::new(true),
            }),
        };

        let evaluated = tracking::with_watcher(&watcher, || {
            watcher.inner.path.evaluate(model.root())
        });
        match evaluated {
            Ok(value) => {
                *watcher.inner.value.borrow_mut() = value;
                debug!(
                    watcher = id,
                    expr = watcher.inner.path.as_str(),
                    deps = watcher.dependency_count(),
                    "watcher created"
                );
                Ok(watcher)
            }
            Err(err) => {
                watcher.dispose();
                Err(err)
            }
        }
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// The watched expression, trimmed.
    pub fn expression(&self) -> &str {
        self.inner.path.as_str()
    }

    /// Last evaluated value.
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Number of dependencies this watcher is subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    /// Re-evaluate the expression and run the callback with the result.
    ///
    /// Called by [`Dependency::notify`]. A disposed watcher, or one whose
    /// model is gone, does nothing.
    pub fn update(&self) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(model) = self.inner.model.upgrade() else {
            return Ok(());
        };
        let value = tracking::untracked(|| self.inner.path.evaluate(model.root()))?;
        *self.inner.value.borrow_mut() = value.clone();
        (self.inner.callback)(&value)
    }

    /// Unsubscribe from every dependency. Further notifications are
    /// ignored.
    pub fn dispose(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        let deps = std::mem::take(&mut *self.inner.deps.borrow_mut());
        for dep in deps.iter().filter_map(WeakDependency::upgrade) {
            dep.remove_watcher(self.inner.id);
        }
        debug!(watcher = self.inner.id, "watcher disposed");
    }

    /// Record a dependency that just subscribed this watcher.
    pub(crate) fn track(&self, dep: &Dependency) {
        let mut deps = self.inner.deps.borrow_mut();
        if !deps.iter().any(|d| d.id() == dep.id()) {
            deps.push(dep.downgrade());
        }
    }
}
