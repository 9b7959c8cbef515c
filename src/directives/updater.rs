//! DOM update operations, one per binding kind.

use tracing::trace;

use crate::dom;
use crate::reactive::Value;
use crate::types::NodeId;

/// String written into a DOM property. Missing values clear the property.
fn property_string(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace the node's text content.
pub fn text(node: NodeId, value: &Value) {
    trace!(node, "text update");
    dom::set_text_content(node, &property_string(value));
}

/// Replace the node's text content with an already rendered string.
pub fn rendered_text(node: NodeId, content: &str) {
    trace!(node, "interpolation update");
    dom::set_text_content(node, content);
}

/// Replace the node's children with the value parsed as markup.
pub fn html(node: NodeId, value: &Value) {
    trace!(node, "html update");
    dom::set_inner_html(node, &property_string(value));
}

/// Set the node's form value.
pub fn model(node: NodeId, value: &Value) {
    dom::set_value(node, &property_string(value));
}

/// Set one attribute to the value's string form.
pub fn attribute(node: NodeId, name: &str, value: &Value) {
    dom::set_attribute(node, name, &value.to_string());
}
