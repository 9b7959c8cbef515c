//! Element attributes and the form value property.

use tracing::trace;

use super::registry::{with_node, with_node_mut};
use crate::types::{NodeId, NodeKind};

// =============================================================================
// Attributes
// =============================================================================

/// Snapshot of an element's attributes in insertion order.
pub fn attributes(id: NodeId) -> Vec<(String, String)> {
    with_node(id, |node| node.attributes.clone()).unwrap_or_default()
}

/// Value of an attribute, if present.
pub fn get_attribute(id: NodeId, name: &str) -> Option<String> {
    with_node(id, |node| {
        node.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    })
    .flatten()
}

/// Check if an attribute is present.
pub fn has_attribute(id: NodeId, name: &str) -> bool {
    get_attribute(id, name).is_some()
}

/// Set an attribute, keeping its position if it already exists.
/// Only elements carry attributes; other nodes are left untouched.
pub fn set_attribute(id: NodeId, name: &str, value: &str) {
    with_node_mut(id, |node| {
        if node.kind != NodeKind::Element {
            return;
        }
        match node.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
    });
    trace!(node = id, name, value, "set attribute");
}

/// Remove an attribute. No-op if absent.
pub fn remove_attribute(id: NodeId, name: &str) {
    with_node_mut(id, |node| node.attributes.retain(|(n, _)| n != name));
}

/// Classes listed in the `class` attribute.
pub fn class_list(id: NodeId) -> Vec<String> {
    get_attribute(id, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

// =============================================================================
// Form Value
// =============================================================================

/// Current form value of a node.
///
/// Until the value is written it reflects the `value` attribute, or the text
/// content for a `<textarea>`.
pub fn value(id: NodeId) -> String {
    let current = with_node(id, |node| node.value.clone()).flatten();
    if let Some(value) = current {
        return value;
    }
    if super::tag_name(id) == "textarea" {
        return super::text_content(id);
    }
    get_attribute(id, "value").unwrap_or_default()
}

/// Write the form value property.
///
/// This never fires events, so writing the value a listener just read back
/// cannot loop.
pub fn set_value(id: NodeId, value: &str) {
    with_node_mut(id, |node| node.value = Some(value.to_string()));
    trace!(node = id, value, "set value");
}
