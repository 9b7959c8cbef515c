//! Per-node record of what the compiler wired up.
//!
//! Every watcher and listener a directive creates is recorded against the
//! node it was created for, so the node's bindings can be torn down when the
//! node is unbound or released.

use std::collections::BTreeMap;

use crate::dom;
use crate::reactive::Watcher;
use crate::types::{ListenerId, NodeId};

/// Watchers and listeners created for one node.
#[derive(Debug, Default)]
pub struct NodeBindings {
    pub watchers: Vec<Watcher>,
    pub listeners: Vec<ListenerId>,
}

impl NodeBindings {
    /// Dispose every watcher and remove every listener.
    pub fn dispose(self, node: NodeId) {
        for watcher in &self.watchers {
            watcher.dispose();
        }
        for id in self.listeners {
            dom::remove_event_listener(node, id);
        }
    }
}

#[derive(Debug, Default)]
pub struct Bindings {
    by_node: BTreeMap<NodeId, NodeBindings>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_watcher(&mut self, node: NodeId, watcher: Watcher) {
        self.by_node.entry(node).or_default().watchers.push(watcher);
    }

    pub fn add_listener(&mut self, node: NodeId, id: ListenerId) {
        self.by_node.entry(node).or_default().listeners.push(id);
    }

    /// Remove and return a node's bindings.
    pub fn take(&mut self, node: NodeId) -> Option<NodeBindings> {
        self.by_node.remove(&node)
    }

    /// Remove and return every node's bindings.
    pub fn take_all(&mut self) -> Vec<(NodeId, NodeBindings)> {
        std::mem::take(&mut self.by_node).into_iter().collect()
    }

    /// Nodes that carry at least one binding, in id order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.by_node.keys().copied().collect()
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeBindings> {
        self.by_node.get(&node)
    }

    /// Number of live watchers across all nodes.
    pub fn watcher_count(&self) -> usize {
        self.by_node
            .values()
            .flat_map(|b| &b.watchers)
            .filter(|w| w.is_active())
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.by_node.values().map(|b| b.listeners.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListenerOptions;
    use crate::reactive::Model;
    use serde_json::json;

    #[test]
    fn test_dispose_node_bindings() {
        dom::reset_document();
        let model = Model::observe(json!({"a": 1})).unwrap();
        let node = dom::create_element("input");

        let mut bindings = Bindings::new();
        let watcher = Watcher::new(&model, "a", |_| Ok(())).unwrap();
        bindings.add_watcher(node, watcher.clone());
        let id = dom::add_event_listener(node, "input", ListenerOptions::empty(), |_| Ok(()));
        bindings.add_listener(node, id);

        assert_eq!(bindings.watcher_count(), 1);
        assert_eq!(bindings.listener_count(), 1);
        assert_eq!(bindings.nodes(), vec![node]);

        bindings.take(node).unwrap().dispose(node);
        assert!(bindings.is_empty());
        assert!(!watcher.is_active());
        assert_eq!(dom::listener_count(node), 0);
    }
}
