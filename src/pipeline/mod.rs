//! Binding Pipeline
//!
//! Connects an observed model to a subtree of the page.
//!
//! ```text
//! Options ─► Model::observe ─► compile(el) ─► ViewModel (proxy)
//! ```
//!
//! - **compile** - detaches the root's children, applies every directive
//!   depth-first, reattaches
//! - **mount** - [`ViewModel`] construction, proxy access and teardown

pub mod compile;
pub mod mount;

pub use compile::compile;
pub use mount::{El, Options, ViewModel};
