//! Core types for vbind.
//!
//! Nodes are NOT objects. A node is an index into the per-thread document
//! arena (see [`crate::dom`]); everything that refers to a node stores its
//! [`NodeId`] and goes through the `dom` functions.

use bitflags::bitflags;

// =============================================================================
// Node Identity
// =============================================================================

/// Index of a node in the document arena.
pub type NodeId = usize;

/// Identifier of a registered event listener (unique per thread).
pub type ListenerId = usize;

/// Identifier of a registered destroy callback (unique per thread).
pub type DestroyHookId = usize;

/// What a node in the arena is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document root. There is exactly one per thread.
    Document,
    /// An element with a tag name, attributes and children.
    Element,
    /// A text node.
    Text,
    /// A comment. Kept for serialization, ignored by the compiler.
    Comment,
    /// An off-document container whose children move on append.
    Fragment,
}

impl NodeKind {
    /// Whether nodes of this kind may have children.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Document | Self::Element | Self::Fragment)
    }
}

// =============================================================================
// Listener Options
// =============================================================================

bitflags! {
    /// Event listener registration flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ListenerOptions: u8 {
        /// Run during the capture phase (ancestors, top-down) instead of bubbling.
        const CAPTURE = 1 << 0;
        /// Remove the listener after it runs once.
        const ONCE = 1 << 1;
    }
}
