//! Template Compiler - walks a root element and applies every directive.
//!
//! ```text
//! root children ──move──► fragment ──depth-first──► directives applied
//!                                                        │
//! root ◄──────────────────move back──────────────────────┘
//! ```
//!
//! Traversal follows document order and everything it wires up exists by
//! the time [`compile`] returns. If a directive fails, the error propagates
//! immediately: the children stay in the detached fragment, partially
//! bound, and nothing is rolled back.

use tracing::{debug, trace};

use crate::directives::{self, BindContext, Bindings, Directive};
use crate::dom;
use crate::error::{BindError, Result};
use crate::types::{NodeId, NodeKind};

/// Compile the subtree of `root` against `ctx`, recording every binding in
/// `bindings`.
pub fn compile(root: NodeId, ctx: &BindContext<'_>, bindings: &mut Bindings) -> Result<()> {
    if !dom::is_element(root) {
        return Err(BindError::NotAnElement { node: root });
    }

    let fragment = node_to_fragment(root);
    debug!(root, fragment, "compiling");

    compile_children(fragment, ctx, bindings)?;

    dom::append_child(root, fragment);
    dom::release_node(fragment);
    debug!(
        root,
        watchers = bindings.watcher_count(),
        listeners = bindings.listener_count(),
        "compiled"
    );
    Ok(())
}

/// Move every child of `root` into a new fragment.
fn node_to_fragment(root: NodeId) -> NodeId {
    let fragment = dom::create_fragment();
    while let Some(child) = dom::first_child(root) {
        dom::append_child(fragment, child);
    }
    fragment
}

fn compile_children(parent: NodeId, ctx: &BindContext<'_>, bindings: &mut Bindings) -> Result<()> {
    for child in dom::child_nodes(parent) {
        match dom::node_kind(child) {
            Some(NodeKind::Element) => compile_element(child, ctx, bindings)?,
            Some(NodeKind::Text) => compile_text(child, ctx, bindings)?,
            // Comments never render, so markers inside them stay literal
            Some(NodeKind::Comment | NodeKind::Fragment | NodeKind::Document) | None => {}
        }
        // Directives may have replaced the children (v-html, v-text)
        if dom::first_child(child).is_some() {
            compile_children(child, ctx, bindings)?;
        }
    }
    Ok(())
}

/// Apply and remove every directive attribute of an element.
fn compile_element(node: NodeId, ctx: &BindContext<'_>, bindings: &mut Bindings) -> Result<()> {
    for (name, value) in dom::attributes(node) {
        let Some(directive) = Directive::parse(&name, ctx.config) else {
            continue;
        };
        trace!(node, attribute = %name, expr = %value, "directive");
        directive.apply(node, &value, ctx, bindings)?;
        dom::remove_attribute(node, &name);
    }
    Ok(())
}

/// Bind the interpolation markers of a text node, if it has any.
fn compile_text(node: NodeId, ctx: &BindContext<'_>, bindings: &mut Bindings) -> Result<()> {
    if directives::has_interpolation(&dom::text_content(node), ctx.config) {
        directives::bind_text(node, ctx, bindings)?;
    }
    Ok(())
}
