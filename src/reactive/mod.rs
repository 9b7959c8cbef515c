//! Reactive core - observed data, dependencies and watchers.
//!
//! ```text
//! Model::observe(json)          Watcher::new(model, "user.name", cb)
//!        │                               │ evaluate with watcher marked
//!        ▼                               ▼
//! ReactiveObject ── get("user") ─► Dependency.depend() ─► subscribe
//!        │
//!        └─ set("name", v) ─► Dependency.notify() ─► Watcher.update() ─► cb(v)
//! ```
//!
//! Everything here is single-threaded and synchronous: a write has updated
//! every dependent watcher by the time it returns.

mod dependency;
mod observer;
mod path;
pub mod tracking;
mod value;
mod watcher;

pub use dependency::Dependency;
pub use observer::{observe, Model, ReactiveObject, WeakModel};
pub use path::Path;
pub use tracking::{current_watcher, is_tracking, untracked, with_watcher};
pub use value::Value;
pub use watcher::{WatchCallback, Watcher};
