//! Error type shared by the reactive core, the compiler and the document.
//!
//! Every variant is a programmer or template error. Nothing here is retried
//! or recovered from; errors propagate out of construction, out of a model
//! write, or out of an event dispatch.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A dot-path walked through something that is not an object.
    #[error("cannot read property `{segment}` of {found} (path `{path}`)")]
    MissingPath {
        path: String,
        segment: String,
        found: String,
    },

    #[error("invalid expression `{expr}`")]
    InvalidExpression { expr: String },

    #[error("method not found: {name}")]
    MethodNotFound { name: String },

    #[error("directive `{directive}` requires an event name")]
    MissingEventName { directive: String },

    #[error("no element matches selector `{selector}`")]
    ElementNotFound { selector: String },

    #[error("invalid selector `{selector}`")]
    InvalidSelector { selector: String },

    #[error("node {node} is not an element")]
    NotAnElement { node: usize },

    #[error("model data must be an object, got {found}")]
    NotAnObject { found: String },

    #[error("`{key}` is not a proxied data key")]
    NotProxied { key: String },

    /// Raised by application methods bound with `v-on` / `@`.
    #[error("{message}")]
    Handler { message: String },
}

impl BindError {
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing_path(path: &str, segment: &str, found: impl Into<String>) -> Self {
        Self::MissingPath {
            path: path.to_string(),
            segment: segment.to_string(),
            found: found.into(),
        }
    }
}
