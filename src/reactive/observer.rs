//! Observer - Intercepted property access over a plain data object.
//!
//! Observing a JSON object turns each of its own properties into a
//! `(value, Dependency)` pair behind [`ReactiveObject::get`] /
//! [`ReactiveObject::set`]:
//!
//! - a read registers the evaluating watcher (if any) in the property's
//!   dependency
//! - a write stores the new value (nested objects arrive already observed)
//!   and notifies the dependency synchronously
//!
//! Interception is fixed at observation time. A property added later with
//! `set` is stored as a plain property with no dependency, so nothing ever
//! subscribes to it.
//!
//! # Example
//!
//! ```ignore
//! use vbind::reactive::{Model, Watcher};
//! use serde_json::json;
//!
//! let model = Model::observe(json!({ "user": { "name": "A" } }))?;
//! let watcher = Watcher::new(&model, "user.name", |name| {
//!     println!("name is now {name}");
//!     Ok(())
//! })?;
//!
//! model.set("user.name", "B")?; // prints "name is now B"
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::dependency::Dependency;
use super::path::Path;
use super::value::Value;
use crate::error::{BindError, Result};

// =============================================================================
// Reactive Object
// =============================================================================

struct Property {
    value: Value,
    /// `None` for properties added after observation.
    dep: Option<Dependency>,
}

#[derive(Default)]
struct ObjectData {
    /// Own properties in insertion order.
    props: Vec<(String, Property)>,
}

/// An observed object. Cloning shares the same properties.
#[derive(Clone, Default)]
pub struct ReactiveObject {
    inner: Rc<RefCell<ObjectData>>,
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        f.debug_map()
            .entries(data.props.iter().map(|(k, p)| (k, &p.value)))
            .finish()
    }
}

impl ReactiveObject {
    /// Read a property. Missing properties read as `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        let (value, dep) = {
            let data = self.inner.borrow();
            match data.props.iter().find(|(k, _)| k == key) {
                Some((_, prop)) => (prop.value.clone(), prop.dep.clone()),
                None => return Value::Undefined,
            }
        };
        if let Some(dep) = dep {
            dep.depend();
        }
        value
    }

    /// Write a property and notify its subscribers.
    ///
    /// Notification is unconditional: writing the current value again still
    /// runs every subscriber. The first subscriber error is returned after
    /// the value has been stored.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let dep = {
            let mut data = self.inner.borrow_mut();
            match data.props.iter_mut().find(|(k, _)| k == key) {
                Some((_, prop)) => {
                    prop.value = value;
                    prop.dep.clone()
                }
                None => {
                    data.props.push((key.to_string(), Property { value, dep: None }));
                    None
                }
            }
        };
        match dep {
            Some(dep) => dep.notify(),
            None => Ok(()),
        }
    }

    /// Check if the object has an own property (reactive or not).
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().props.iter().any(|(k, _)| k == key)
    }

    /// Check if a property is intercepted.
    pub fn is_reactive(&self, key: &str) -> bool {
        self.inner
            .borrow()
            .props
            .iter()
            .any(|(k, p)| k == key && p.dep.is_some())
    }

    /// The dependency of an intercepted property.
    pub fn dependency(&self, key: &str) -> Option<Dependency> {
        self.inner
            .borrow()
            .props
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, p)| p.dep.clone())
    }

    /// Own property names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().props.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &ReactiveObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Plain JSON snapshot. Reads here never subscribe anything.
    pub fn to_json(&self) -> serde_json::Value {
        let data = self.inner.borrow();
        let map = data
            .props
            .iter()
            .map(|(k, p)| (k.clone(), p.value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    fn downgrade(&self) -> Weak<RefCell<ObjectData>> {
        Rc::downgrade(&self.inner)
    }
}

// =============================================================================
// Observation
// =============================================================================

/// Observe plain JSON.
///
/// Objects become [`ReactiveObject`]s with one dependency per own property,
/// recursively. Array elements are converted but arrays themselves are not
/// reactive.
pub fn observe(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(observe).collect::<Vec<_>>().into())
        }
        serde_json::Value::Object(map) => {
            let props = map
                .into_iter()
                .map(|(key, child)| {
                    let prop = Property {
                        value: observe(child),
                        dep: Some(Dependency::new()),
                    };
                    (key, prop)
                })
                .collect();
            Value::Object(ReactiveObject {
                inner: Rc::new(RefCell::new(ObjectData { props })),
            })
        }
    }
}

// =============================================================================
// Model
// =============================================================================

/// The observed root data object.
///
/// All access goes through dot-path expressions resolved from the root.
#[derive(Clone, Debug)]
pub struct Model {
    root: ReactiveObject,
}

impl Model {
    /// Observe a plain data object. The root must be a JSON object.
    pub fn observe(data: serde_json::Value) -> Result<Self> {
        match observe(data) {
            Value::Object(root) => Ok(Self { root }),
            other => Err(BindError::NotAnObject {
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Wrap an already observed object.
    pub fn from_object(root: ReactiveObject) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ReactiveObject {
        &self.root
    }

    /// Evaluate a dot-path against the root.
    pub fn get(&self, expr: &str) -> Result<Value> {
        Path::parse(expr)?.evaluate(&self.root)
    }

    /// Write a value at a dot-path. The write propagates to every dependent
    /// watcher before this returns.
    pub fn set(&self, expr: &str, value: impl Into<Value>) -> Result<()> {
        Path::parse(expr)?.assign(&self.root, value.into())
    }

    /// Top-level property names.
    pub fn keys(&self) -> Vec<String> {
        self.root.keys()
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.root.to_json()
    }

    pub fn downgrade(&self) -> WeakModel {
        WeakModel {
            root: self.root.downgrade(),
        }
    }
}

/// Non-owning model handle held by bindings, so the subscriber graph never
/// keeps its own model alive.
#[derive(Clone, Debug)]
pub struct WeakModel {
    root: Weak<RefCell<ObjectData>>,
}

impl WeakModel {
    pub fn upgrade(&self) -> Option<Model> {
        self.root.upgrade().map(|inner| Model {
            root: ReactiveObject { inner },
        })
    }
}
