//! Node Registry - Index allocation for the document arena.
//!
//! Manages the lifecycle of node indices:
//! - One arena per thread; index 0 is the document, index 1 is `<body>`
//! - Free index pool for O(1) reuse
//! - Destroy callbacks run when a node (or an ancestor) is released

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::trace;

use super::events;
use crate::types::{DestroyHookId, NodeId, NodeKind};

/// Index of the document node.
pub const DOCUMENT: NodeId = 0;

/// Index of the `<body>` element.
pub const BODY: NodeId = 1;

// =============================================================================
// Node Storage
// =============================================================================

/// Everything the arena knows about one node.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Lowercase tag name for elements, empty otherwise.
    pub tag: String,
    /// Character data for text and comment nodes.
    pub data: String,
    /// Attributes in insertion order.
    pub attributes: Vec<(String, String)>,
    /// Form value property. `None` until written; reads fall back to the
    /// `value` attribute.
    pub value: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            data: String::new(),
            attributes: Vec::new(),
            value: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

pub(crate) struct Arena {
    nodes: Vec<Option<NodeData>>,
    free: Vec<NodeId>,
}

impl Arena {
    fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            free: Vec::new(),
        };
        let document = arena.alloc(NodeData::new(NodeKind::Document));
        let mut body = NodeData::new(NodeKind::Element);
        body.tag = "body".to_string();
        body.parent = Some(document);
        let body = arena.alloc(body);
        if let Some(doc) = arena.get_mut(document) {
            doc.children.push(body);
        }
        arena
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        // Reuse free index or allocate new
        if let Some(index) = self.free.pop() {
            self.nodes[index] = Some(data);
            index
        } else {
            self.nodes.push(Some(data));
            self.nodes.len() - 1
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    /// Subtree rooted at `id` in post-order (children before parents).
    fn subtree_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.get(id) {
            for &child in &node.children {
                self.subtree_post_order(child, out);
            }
            out.push(id);
        }
    }
}

thread_local! {
    static ARENA: RefCell<Arena> = RefCell::new(Arena::new());

    /// Destroy callbacks registered per node, tagged with their hook id.
    static DESTROY_CALLBACKS: RefCell<HashMap<NodeId, Vec<(DestroyHookId, Box<dyn FnOnce()>)>>> =
        RefCell::new(HashMap::new());

    static NEXT_DESTROY_HOOK: Cell<DestroyHookId> = const { Cell::new(0) };
}

/// Run `f` with shared access to a node. `None` if the node does not exist.
pub(crate) fn with_node<R>(id: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
    ARENA.with(|arena| arena.borrow().get(id).map(f))
}

/// Run `f` with exclusive access to a node. `None` if the node does not exist.
pub(crate) fn with_node_mut<R>(id: NodeId, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
    ARENA.with(|arena| arena.borrow_mut().get_mut(id).map(f))
}

/// Run `f` with exclusive access to the whole arena.
pub(crate) fn with_arena<R>(f: impl FnOnce(&mut Arena) -> R) -> R {
    ARENA.with(|arena| f(&mut arena.borrow_mut()))
}

// =============================================================================
// Node Creation
// =============================================================================

fn create(data: NodeData) -> NodeId {
    ARENA.with(|arena| arena.borrow_mut().alloc(data))
}

/// The document node.
pub fn document() -> NodeId {
    DOCUMENT
}

/// The `<body>` element.
pub fn body() -> NodeId {
    BODY
}

/// Create a detached element. Tag names are stored lowercase.
pub fn create_element(tag: &str) -> NodeId {
    let mut data = NodeData::new(NodeKind::Element);
    data.tag = tag.to_ascii_lowercase();
    create(data)
}

/// Create a detached text node.
pub fn create_text(text: &str) -> NodeId {
    let mut data = NodeData::new(NodeKind::Text);
    data.data = text.to_string();
    create(data)
}

/// Create a detached comment node.
pub fn create_comment(text: &str) -> NodeId {
    let mut data = NodeData::new(NodeKind::Comment);
    data.data = text.to_string();
    create(data)
}

/// Create an empty, off-document fragment.
pub fn create_fragment() -> NodeId {
    create(NodeData::new(NodeKind::Fragment))
}

// =============================================================================
// Lookups
// =============================================================================

/// Check if a node index is currently allocated.
pub fn exists(id: NodeId) -> bool {
    with_node(id, |_| ()).is_some()
}

/// Kind of the node, if it exists.
pub fn node_kind(id: NodeId) -> Option<NodeKind> {
    with_node(id, |node| node.kind)
}

/// Check if the node is an element.
pub fn is_element(id: NodeId) -> bool {
    node_kind(id) == Some(NodeKind::Element)
}

/// Check if the node is a text node.
pub fn is_text(id: NodeId) -> bool {
    node_kind(id) == Some(NodeKind::Text)
}

/// Lowercase tag name of an element; empty for other nodes.
pub fn tag_name(id: NodeId) -> String {
    with_node(id, |node| node.tag.clone()).unwrap_or_default()
}

/// Count of currently allocated nodes, including the document and body.
pub fn node_count() -> usize {
    ARENA.with(|arena| arena.borrow().nodes.iter().filter(|n| n.is_some()).count())
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the node at `id` is released.
///
/// The returned id can be passed to [`cancel_destroy`].
pub fn on_destroy(id: NodeId, callback: impl FnOnce() + 'static) -> DestroyHookId {
    let hook = NEXT_DESTROY_HOOK.with(|next| {
        let hook = next.get();
        next.set(hook + 1);
        hook
    });
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(id)
            .or_default()
            .push((hook, Box::new(callback)));
    });
    hook
}

/// Drop a destroy callback without running it.
/// Returns false if it already ran or was never registered on `id`.
pub fn cancel_destroy(id: NodeId, hook: DestroyHookId) -> bool {
    DESTROY_CALLBACKS.with(|callbacks| {
        let mut callbacks = callbacks.borrow_mut();
        let Some(list) = callbacks.get_mut(&id) else {
            return false;
        };
        let before = list.len();
        list.retain(|(h, _)| *h != hook);
        let removed = list.len() != before;
        if list.is_empty() {
            callbacks.remove(&id);
        }
        removed
    })
}

/// Number of destroy callbacks waiting on `id`.
pub fn destroy_callback_count(id: NodeId) -> usize {
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow().get(&id).map_or(0, Vec::len))
}

/// Run and clear destroy callbacks for a node.
fn run_destroy_callbacks(id: NodeId) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&id));
    if let Some(callbacks) = callbacks {
        for (_, callback) in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Release
// =============================================================================

/// Release a node and its whole subtree back to the pool.
///
/// The node is detached from its parent first. Destroy callbacks run
/// children-first, then listeners are dropped and the indices are freed.
/// The document and body are never released.
pub fn release_node(id: NodeId) {
    if id == DOCUMENT || id == BODY || !exists(id) {
        return;
    }

    super::tree::detach(id);

    let mut subtree = Vec::new();
    ARENA.with(|arena| arena.borrow().subtree_post_order(id, &mut subtree));

    // Callbacks may touch the arena, so no borrow is held while they run
    for &node in &subtree {
        run_destroy_callbacks(node);
        events::cleanup_node(node);
    }

    ARENA.with(|arena| {
        let mut arena = arena.borrow_mut();
        for &node in &subtree {
            arena.nodes[node] = None;
            arena.free.push(node);
        }
    });
    trace!(node = id, released = subtree.len(), "released subtree");
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset the document to an empty `<body>` (for testing).
pub fn reset_document() {
    ARENA.with(|arena| *arena.borrow_mut() = Arena::new());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    events::reset_listeners();
}
