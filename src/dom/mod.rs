//! Document - The host page the engine binds to.
//!
//! The document is an arena of nodes addressed by [`NodeId`](crate::NodeId),
//! one per thread, matching the single-threaded model of the binding
//! engine:
//!
//! ```text
//! Index 0: Document
//! Index 1: <body>       (parent=0)
//! Index 2: <div id=app> (parent=1)
//! Index 3: "{{ msg }}"  (parent=2)
//! ```
//!
//! - Registry: allocation, release, destroy callbacks
//! - Tree: append/remove, text content
//! - Node: attributes, form value
//! - Html: markup parsing and serialization
//! - Selector: `query_selector`
//! - Events: listeners and dispatch

mod events;
mod html;
mod node;
mod registry;
mod selector;
mod tree;

pub use events::*;
pub use html::*;
pub use node::*;
pub use registry::{
    body, cancel_destroy, create_comment, create_element, create_fragment, create_text,
    destroy_callback_count, document, exists, is_element, is_text, node_count, node_kind,
    on_destroy, release_node, reset_document, tag_name, BODY, DOCUMENT,
};
pub use selector::*;
pub use tree::*;
