//! Events - Event type, listener registry and dispatch.
//!
//! Listeners are registered per node and per event type. Dispatch follows
//! the usual three phases:
//!
//! 1. Capture: `CAPTURE` listeners on the ancestors, outermost first
//! 2. Target: every listener on the target, in registration order
//! 3. Bubble: non-capture listeners on the ancestors, innermost first
//!    (only when the event bubbles)
//!
//! # Example
//!
//! ```ignore
//! use vbind::dom::{self, Event};
//! use vbind::ListenerOptions;
//!
//! let button = dom::create_element("button");
//! let id = dom::add_event_listener(button, "click", ListenerOptions::empty(), |event| {
//!     println!("clicked {:?}", event.target());
//!     Ok(())
//! });
//!
//! dom::click(button)?;
//! dom::remove_event_listener(button, id);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::error::Result;
use crate::types::{ListenerId, ListenerOptions, NodeId};

// =============================================================================
// TYPES
// =============================================================================

/// A dispatched event.
///
/// Targets are filled in by [`dispatch_event`]; handlers only get `&Event`,
/// so the mutable bits live in cells.
#[derive(Debug, Clone)]
pub struct Event {
    kind: String,
    bubbles: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    stopped: Cell<bool>,
}

impl Event {
    /// Create a non-bubbling event.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            bubbles: false,
            target: Cell::new(None),
            current_target: Cell::new(None),
            stopped: Cell::new(false),
        }
    }

    /// Create an event that bubbles to ancestors after the target phase.
    pub fn bubbling(kind: impl Into<String>) -> Self {
        Self {
            bubbles: true,
            ..Self::new(kind)
        }
    }

    /// Event type, e.g. `"click"` or `"input"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Node the event was dispatched to.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// Node whose listener is currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Stop the event from reaching further nodes. Remaining listeners on
    /// the current node still run.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Listener callback. An error aborts the dispatch and is returned to the
/// caller of [`dispatch_event`].
pub type EventHandler = Rc<dyn Fn(&Event) -> Result<()>>;

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct Listener {
    id: ListenerId,
    kind: String,
    options: ListenerOptions,
    handler: EventHandler,
}

struct ListenerRegistry {
    by_node: HashMap<NodeId, Vec<Listener>>,
    next_id: ListenerId,
}

impl ListenerRegistry {
    fn new() -> Self {
        Self {
            by_node: HashMap::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_registered(&self, node: NodeId, id: ListenerId) -> bool {
        self.by_node
            .get(&node)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    fn remove(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(list) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }
}

thread_local! {
    static REGISTRY: RefCell<ListenerRegistry> = RefCell::new(ListenerRegistry::new());
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Register a listener for `kind` events on `node`.
/// Returns an id for [`remove_event_listener`].
pub fn add_event_listener<F>(
    node: NodeId,
    kind: &str,
    options: ListenerOptions,
    handler: F,
) -> ListenerId
where
    F: Fn(&Event) -> Result<()> + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.by_node.entry(node).or_default().push(Listener {
            id,
            kind: kind.to_string(),
            options,
            handler: Rc::new(handler),
        });
        id
    });
    trace!(node, kind, listener = id, "listener added");
    id
}

/// Remove a listener. Returns false if it was not registered on `node`.
pub fn remove_event_listener(node: NodeId, id: ListenerId) -> bool {
    REGISTRY.with(|reg| reg.borrow_mut().remove(node, id))
}

/// Number of listeners registered on a node.
pub fn listener_count(node: NodeId) -> usize {
    REGISTRY.with(|reg| reg.borrow().by_node.get(&node).map_or(0, Vec::len))
}

/// Drop every listener of a node (called when the node is released).
pub fn cleanup_node(node: NodeId) {
    REGISTRY.with(|reg| {
        reg.borrow_mut().by_node.remove(&node);
    });
}

/// Drop every listener (for testing).
pub fn reset_listeners() {
    REGISTRY.with(|reg| *reg.borrow_mut() = ListenerRegistry::new());
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capture,
    Target,
    Bubble,
}

/// Dispatch an event to `target` and, depending on phase rules, to its
/// ancestors. The first handler error stops the dispatch and is returned.
pub fn dispatch_event(target: NodeId, event: &Event) -> Result<()> {
    event.target.set(Some(target));
    trace!(target, kind = event.kind(), "dispatch");

    // Ancestors, innermost first
    let mut ancestors = Vec::new();
    let mut current = super::parent(target);
    while let Some(node) = current {
        ancestors.push(node);
        current = super::parent(node);
    }

    for &node in ancestors.iter().rev() {
        if event.is_propagation_stopped() {
            break;
        }
        invoke(node, event, Phase::Capture)?;
    }

    if !event.is_propagation_stopped() {
        invoke(target, event, Phase::Target)?;
    }

    if event.bubbles() {
        for &node in &ancestors {
            if event.is_propagation_stopped() {
                break;
            }
            invoke(node, event, Phase::Bubble)?;
        }
    }

    event.current_target.set(None);
    Ok(())
}

/// Run the matching listeners of one node.
fn invoke(node: NodeId, event: &Event, phase: Phase) -> Result<()> {
    // Collect first: handlers may add or remove listeners while running
    let matching: Vec<(ListenerId, bool, EventHandler)> = REGISTRY.with(|reg| {
        let reg = reg.borrow();
        reg.by_node
            .get(&node)
            .map(|list| {
                list.iter()
                    .filter(|l| l.kind == event.kind())
                    .filter(|l| match phase {
                        Phase::Capture => l.options.contains(ListenerOptions::CAPTURE),
                        Phase::Target => true,
                        Phase::Bubble => !l.options.contains(ListenerOptions::CAPTURE),
                    })
                    .map(|l| {
                        (l.id, l.options.contains(ListenerOptions::ONCE), l.handler.clone())
                    })
                    .collect()
            })
            .unwrap_or_default()
    });

    event.current_target.set(Some(node));
    for (id, once, handler) in matching {
        // Removed by an earlier handler in this same dispatch
        if !REGISTRY.with(|reg| reg.borrow().is_registered(node, id)) {
            continue;
        }
        if once {
            remove_event_listener(node, id);
        }
        handler(event)?;
    }
    Ok(())
}

/// Simulate user typing: write the form value, then fire a bubbling
/// `input` event at the node.
pub fn simulate_input(node: NodeId, text: &str) -> Result<()> {
    super::set_value(node, text);
    dispatch_event(node, &Event::bubbling("input"))
}

/// Fire a bubbling `click` event at the node.
pub fn click(node: NodeId) -> Result<()> {
    dispatch_event(node, &Event::bubbling("click"))
}
