//! Mount API - binding a model to a root element.
//!
//! [`ViewModel::new`] runs the whole construction sequence:
//!
//! 1. Observe the data (every property present now becomes reactive)
//! 2. Resolve `el` and compile its subtree
//! 3. Expose the top-level keys through [`ViewModel::get`] / [`ViewModel::set`]
//!
//! # Example
//!
//! ```ignore
//! use vbind::{dom, Options, ViewModel};
//! use serde_json::json;
//!
//! dom::set_inner_html(app, r#"<p>{{count}}</p><button @click="increment">+</button>"#);
//!
//! let vm = ViewModel::new(
//!     Options::new(json!({ "count": 0 }))
//!         .el("#app")
//!         .method("increment", |model, _event| {
//!             let count = model.get("count")?.as_f64().unwrap_or_default();
//!             model.set("count", count + 1.0)
//!         }),
//! )?;
//!
//! dom::click(button)?;       // <p>1</p>
//! vm.set("count", 10)?;      // <p>10</p>
//!
//! drop(vm);                  // bindings and listeners are gone
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::compile::compile;
use crate::config::CompilerConfig;
use crate::directives::{BindContext, Bindings, Method, Methods};
use crate::dom::{self, Event};
use crate::error::{BindError, Result};
use crate::reactive::{Model, Value};
use crate::types::{DestroyHookId, NodeId};

// =============================================================================
// Options
// =============================================================================

/// The root element to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum El {
    Node(NodeId),
    /// Resolved with [`dom::query_selector`] at construction.
    Selector(String),
}

impl From<NodeId> for El {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for El {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for El {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Construction options.
pub struct Options {
    /// Without a root element nothing is compiled.
    pub el: Option<El>,
    /// Plain data. Must be a JSON object.
    pub data: serde_json::Value,
    pub methods: Methods,
    pub config: CompilerConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            el: None,
            data: serde_json::Value::Object(serde_json::Map::new()),
            methods: Methods::new(),
            config: CompilerConfig::default(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("Options")
            .field("el", &self.el)
            .field("data", &self.data)
            .field("methods", &methods)
            .field("config", &self.config)
            .finish()
    }
}

impl Options {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn el(mut self, el: impl Into<El>) -> Self {
        self.el = Some(el.into());
        self
    }

    /// Register a method for `v-on` / `@`.
    pub fn method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&Model, &Event) -> Result<()> + 'static,
    {
        let method: Method = Rc::new(method);
        self.methods.insert(name.to_string(), method);
        self
    }

    pub fn config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }
}

// =============================================================================
// View Model
// =============================================================================

/// A model bound to a root element.
///
/// Bindings live until their node is released, [`ViewModel::unbind`] is
/// called for their subtree, or the view model is destroyed or dropped.
#[must_use = "dropping a ViewModel removes every binding it created"]
pub struct ViewModel {
    model: Model,
    el: Option<NodeId>,
    bindings: Rc<RefCell<Bindings>>,
    /// `on_destroy` registrations for bound nodes.
    destroy_hooks: RefCell<Vec<(NodeId, DestroyHookId)>>,
    /// Top-level keys present at construction.
    proxied: Vec<String>,
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("el", &self.el)
            .field("keys", &self.proxied)
            .field("bindings", &self.binding_count())
            .finish()
    }
}

impl ViewModel {
    /// Observe `options.data`, compile `options.el` and expose the proxy.
    ///
    /// Any error from observation, selector resolution or compilation is
    /// returned as is. A failed compile leaves the page partially wired.
    pub fn new(options: Options) -> Result<Self> {
        let Options {
            el,
            data,
            methods,
            config,
        } = options;

        let model = Model::observe(data)?;
        let bindings = Rc::new(RefCell::new(Bindings::new()));

        let el = el.map(resolve_el).transpose()?;
        let mut destroy_hooks = Vec::new();
        if let Some(root) = el {
            let ctx = BindContext {
                model: &model,
                methods: &methods,
                config: &config,
            };
            compile(root, &ctx, &mut bindings.borrow_mut())?;
            destroy_hooks = register_destroy_callbacks(&bindings);
        }

        let proxied = model.keys();
        debug!(el = ?el, keys = proxied.len(), "view model created");
        Ok(Self {
            model,
            el,
            bindings,
            destroy_hooks: RefCell::new(destroy_hooks),
            proxied,
        })
    }

    /// The bound root element, if any.
    pub fn el(&self) -> Option<NodeId> {
        self.el
    }

    /// The observed model.
    pub fn data(&self) -> &Model {
        &self.model
    }

    /// Proxied top-level keys in data order.
    pub fn keys(&self) -> &[String] {
        &self.proxied
    }

    /// Read a top-level key.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.check_proxied(key)?;
        Ok(self.model.root().get(key))
    }

    /// Write a top-level key. Every binding that depends on it is updated
    /// before this returns.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.check_proxied(key)?;
        self.model.root().set(key, value)
    }

    fn check_proxied(&self, key: &str) -> Result<()> {
        if self.proxied.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(BindError::NotProxied {
                key: key.to_string(),
            })
        }
    }

    /// Number of live watchers created by compilation.
    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().watcher_count()
    }

    /// Number of listeners created by compilation.
    pub fn listener_count(&self) -> usize {
        self.bindings.borrow().listener_count()
    }

    /// Dispose the watchers and remove the listeners of `node` and its
    /// descendants. The nodes themselves are left in place.
    pub fn unbind(&self, node: NodeId) {
        let mut nodes = vec![node];
        nodes.extend(dom::descendants(node));

        let taken: Vec<_> = {
            let mut bindings = self.bindings.borrow_mut();
            nodes
                .into_iter()
                .filter_map(|n| bindings.take(n).map(|b| (n, b)))
                .collect()
        };
        debug!(node, nodes = taken.len(), "unbind");
        for (n, node_bindings) in taken {
            node_bindings.dispose(n);
        }
    }

    /// Dispose every binding. The page keeps its last rendered state.
    ///
    /// Also runs on drop. Calling it again does nothing.
    pub fn destroy(&self) {
        let hooks = std::mem::take(&mut *self.destroy_hooks.borrow_mut());
        for (node, hook) in hooks {
            dom::cancel_destroy(node, hook);
        }

        let taken = self.bindings.borrow_mut().take_all();
        if taken.is_empty() {
            return;
        }
        debug!(nodes = taken.len(), "destroy");
        for (node, node_bindings) in taken {
            node_bindings.dispose(node);
        }
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn resolve_el(el: El) -> Result<NodeId> {
    match el {
        El::Node(node) if dom::is_element(node) => Ok(node),
        El::Node(node) => Err(BindError::NotAnElement { node }),
        El::Selector(selector) => {
            dom::query_selector(&selector)?.ok_or(BindError::ElementNotFound { selector })
        }
    }
}

/// Tear down a node's bindings when the node is released.
fn register_destroy_callbacks(bindings: &Rc<RefCell<Bindings>>) -> Vec<(NodeId, DestroyHookId)> {
    let nodes = bindings.borrow().nodes();
    nodes
        .into_iter()
        .map(|node| {
            let weak: Weak<RefCell<Bindings>> = Rc::downgrade(bindings);
            let hook = dom::on_destroy(node, move || {
                let Some(bindings) = weak.upgrade() else {
                    return;
                };
                let taken = bindings.borrow_mut().take(node);
                if let Some(node_bindings) = taken {
                    node_bindings.dispose(node);
                }
            });
            (node, hook)
        })
        .collect()
}
