//! Tree structure and character content.
//!
//! Appending moves a node (it is detached from its old parent first), and
//! appending a fragment moves the fragment's children instead of the
//! fragment itself.

use tracing::trace;

use super::registry::{release_node, with_arena, with_node, with_node_mut};
use crate::types::{NodeId, NodeKind};

// =============================================================================
// Structure
// =============================================================================

/// Parent of a node, if attached.
pub fn parent(id: NodeId) -> Option<NodeId> {
    with_node(id, |node| node.parent).flatten()
}

/// Snapshot of a node's children in order.
pub fn child_nodes(id: NodeId) -> Vec<NodeId> {
    with_node(id, |node| node.children.clone()).unwrap_or_default()
}

/// First child of a node.
pub fn first_child(id: NodeId) -> Option<NodeId> {
    with_node(id, |node| node.children.first().copied()).flatten()
}

/// Check if `node` is `ancestor` or lies somewhere below it.
pub fn contains(ancestor: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = parent(id);
    }
    false
}

/// Every node below `root` in document order (root excluded).
pub fn descendants(root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = child_nodes(root).into_iter().rev().collect();
    while let Some(id) = stack.pop() {
        out.push(id);
        stack.extend(child_nodes(id).into_iter().rev());
    }
    out
}

/// Remove a node from its parent's child list. The node stays allocated.
pub(crate) fn detach(id: NodeId) {
    let Some(old_parent) = parent(id) else { return };
    with_node_mut(old_parent, |p| p.children.retain(|&c| c != id));
    with_node_mut(id, |node| node.parent = None);
}

/// Append `child` as the last child of `parent`.
///
/// Appending a fragment moves all of its children, leaving it empty.
/// Appending a node into its own subtree, appending the document, or
/// appending into a node that cannot hold children is ignored.
pub fn append_child(parent_id: NodeId, child: NodeId) {
    let parent_kind = with_node(parent_id, |n| n.kind);
    let child_kind = with_node(child, |n| n.kind);
    let (Some(parent_kind), Some(child_kind)) = (parent_kind, child_kind) else {
        return;
    };
    if !parent_kind.is_container() || child_kind == NodeKind::Document {
        trace!(parent = parent_id, child, "append ignored: invalid hierarchy");
        return;
    }

    if child_kind == NodeKind::Fragment {
        for grandchild in child_nodes(child) {
            append_child(parent_id, grandchild);
        }
        return;
    }

    if contains(child, parent_id) {
        trace!(parent = parent_id, child, "append ignored: would create a cycle");
        return;
    }

    detach(child);
    with_arena(|arena| {
        if let Some(p) = arena.get_mut(parent_id) {
            p.children.push(child);
        }
        if let Some(c) = arena.get_mut(child) {
            c.parent = Some(parent_id);
        }
    });
}

/// Detach `child` from `parent`. No-op if it is not a child of `parent`.
pub fn remove_child(parent_id: NodeId, child: NodeId) {
    if self::parent(child) == Some(parent_id) {
        detach(child);
    }
}

/// Release every child of a node.
pub fn clear_children(id: NodeId) {
    for child in child_nodes(id) {
        release_node(child);
    }
}

// =============================================================================
// Character Content
// =============================================================================

/// Text content of a node.
///
/// Text and comment nodes return their data. Containers return the
/// concatenated data of all descendant text nodes.
pub fn text_content(id: NodeId) -> String {
    match with_node(id, |n| (n.kind, n.data.clone())) {
        Some((NodeKind::Text | NodeKind::Comment, data)) => data,
        Some(_) => descendants(id)
            .into_iter()
            .filter_map(|d| with_node(d, |n| (n.kind == NodeKind::Text).then(|| n.data.clone())))
            .flatten()
            .collect(),
        None => String::new(),
    }
}

/// Replace the text content of a node.
///
/// Text and comment nodes get their data replaced. Containers have all
/// children released and, unless `text` is empty, get one new text node.
pub fn set_text_content(id: NodeId, text: &str) {
    match with_node(id, |n| n.kind) {
        Some(NodeKind::Text | NodeKind::Comment) => {
            with_node_mut(id, |n| n.data = text.to_string());
        }
        Some(_) => {
            clear_children(id);
            if !text.is_empty() {
                let node = super::create_text(text);
                append_child(id, node);
            }
        }
        None => {}
    }
}
