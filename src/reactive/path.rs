//! Dot-path expressions.
//!
//! An expression such as `user.name` is split on `.` and resolved one
//! segment at a time from the model root. Surrounding whitespace is
//! trimmed, so `{{ user.name }}` and `{{user.name}}` name the same path.

use std::fmt;

use super::observer::ReactiveObject;
use super::value::Value;
use crate::error::{BindError, Result};

/// A parsed dot-path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    source: String,
    segments: Vec<String>,
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Path {
    /// Parse an expression. Empty expressions and empty segments (`a..b`,
    /// `.a`, `a.`) are rejected.
    pub fn parse(expr: &str) -> Result<Self> {
        let source = expr.trim();
        if source.is_empty() {
            return Err(BindError::InvalidExpression {
                expr: expr.to_string(),
            });
        }
        let segments: Vec<String> = source.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(BindError::InvalidExpression {
                expr: expr.to_string(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolve the path. Every reactive property read along the way
    /// registers the evaluating watcher.
    ///
    /// A missing final property yields `Undefined`. Stepping through
    /// anything that is not an object or array fails with `MissingPath`.
    pub fn evaluate(&self, root: &ReactiveObject) -> Result<Value> {
        let mut current = Value::Object(root.clone());
        for segment in &self.segments {
            current = self.step(&current, segment)?;
        }
        Ok(current)
    }

    /// Write `value` at the path: walk to the parent of the last segment,
    /// then set the last property on it.
    pub fn assign(&self, root: &ReactiveObject, value: Value) -> Result<()> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(BindError::InvalidExpression {
                expr: self.source.clone(),
            });
        };
        let mut current = Value::Object(root.clone());
        for segment in parents {
            current = self.step(&current, segment)?;
        }
        match current {
            Value::Object(target) => target.set(last, value),
            other => Err(BindError::missing_path(
                self.source.as_str(),
                last.as_str(),
                other.type_name(),
            )),
        }
    }

    fn step(&self, current: &Value, segment: &str) -> Result<Value> {
        match current {
            Value::Object(object) => Ok(object.get(segment)),
            Value::Array(items) => {
                if segment == "length" {
                    return Ok(Value::Number(items.len() as f64));
                }
                Ok(segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default())
            }
            other => Err(BindError::missing_path(
                self.source.as_str(),
                segment,
                other.type_name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Model;
    use serde_json::json;

    fn model() -> Model {
        Model::observe(json!({
            "msg": "hi",
            "user": { "name": "A", "tags": ["x", "y"] },
            "n": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let path = Path::parse("  user . name ").unwrap();
        assert_eq!(path.segments(), ["user", "name"]);
        assert_eq!(path.as_str(), "user . name");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for expr in ["", "   ", "a..b", ".a", "a."] {
            assert!(
                matches!(Path::parse(expr), Err(BindError::InvalidExpression { .. })),
                "{expr:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_evaluate_nested() {
        let model = model();
        let root = model.root();
        assert_eq!(Path::parse("msg").unwrap().evaluate(root).unwrap(), Value::from("hi"));
        assert_eq!(
            Path::parse("user.name").unwrap().evaluate(root).unwrap(),
            Value::from("A")
        );
        assert_eq!(
            Path::parse("user.tags.1").unwrap().evaluate(root).unwrap(),
            Value::from("y")
        );
        assert_eq!(
            Path::parse("user.tags.length").unwrap().evaluate(root).unwrap(),
            Value::from(2)
        );
    }

    #[test]
    fn test_missing_leaf_is_undefined() {
        let model = model();
        assert!(Path::parse("user.age")
            .unwrap()
            .evaluate(model.root())
            .unwrap()
            .is_undefined());
    }

    #[test]
    fn test_stepping_through_non_object_fails() {
        let model = model();
        let err = Path::parse("msg.length.x").unwrap().evaluate(model.root()).unwrap_err();
        assert_eq!(err, BindError::missing_path("msg.length.x", "length", "string"));

        let err = Path::parse("nope.x").unwrap().evaluate(model.root()).unwrap_err();
        assert_eq!(err, BindError::missing_path("nope.x", "x", "undefined"));
    }

    #[test]
    fn test_assign_sets_leaf_on_parent() {
        let model = model();
        Path::parse("user.name")
            .unwrap()
            .assign(model.root(), Value::from("B"))
            .unwrap();
        assert_eq!(model.get("user.name").unwrap(), Value::from("B"));

        let err = Path::parse("n.x")
            .unwrap()
            .assign(model.root(), Value::from(1))
            .unwrap_err();
        assert_eq!(err, BindError::missing_path("n.x", "x", "number"));
    }
}
