//! # vbind
//!
//! Minimal reactive view binding for Rust.
//!
//! A plain data object is observed, a template subtree of the page is
//! compiled, and from then on every write to the data updates exactly the
//! nodes whose expressions read it. Form inputs bound with `v-model` write
//! back the other way.
//!
//! ## Architecture
//!
//! The page is an arena of nodes addressed by [`NodeId`] (see [`dom`]).
//! Bindings never hold nodes, only their indices, and they hold the model
//! weakly, so the object graph has no reference cycles.
//!
//! ```text
//! data ─► Observer ─► (value, Dependency) per property
//!                          ▲            │ notify
//!                   depend │            ▼
//! template ─► Compiler ─► Directive ─► Watcher ─► updater ─► dom
//! ```
//!
//! Everything is single-threaded and synchronous: a write has re-rendered
//! every dependent node before it returns.
//!
//! ## Modules
//!
//! - [`types`] - Node identity and listener flags
//! - [`error`] - [`BindError`] and the crate [`Result`]
//! - [`config`] - Template syntax markers
//! - [`dom`] - The host document: tree, attributes, markup, selectors, events
//! - [`reactive`] - Observer, Dependency, Watcher, dot-paths
//! - [`directives`] - Directive parsing and the bindings they create
//! - [`pipeline`] - Template compiler and [`ViewModel`]

pub mod config;
pub mod directives;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod reactive;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::CompilerConfig;
pub use error::{BindError, Result};

pub use reactive::{Dependency, Model, ReactiveObject, Value, Watcher};

pub use directives::{Directive, DirectiveKind, Method, Methods};

pub use dom::{Event, EventHandler};

pub use pipeline::{compile, El, Options, ViewModel};
