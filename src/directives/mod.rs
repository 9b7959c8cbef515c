//! Directives - declarative bindings between the model and the page.
//!
//! A directive is an attribute (`v-<name>`, `v-<name>:<arg>`, `@<event>`)
//! or an interpolation marker in a text node. Applying one creates the
//! binding it describes:
//!
//! | Directive | Binding | DOM update | DOM to model |
//! |---|---|---|---|
//! | `{{ expr }}` | one watcher per marker | re-render the whole text node | - |
//! | `v-text` | watcher | text content | - |
//! | `v-html` | watcher | children parsed from markup | - |
//! | `v-model` | watcher | form value | `input` listener writes the value back |
//! | `v-on:<event>` / `@<event>` | listener | - | calls the named method |
//! | `v-bind:<attr>` | watcher | attribute value | - |
//!
//! Unknown directive names are ignored.
//!
//! # Example
//!
//! ```ignore
//! let directive = Directive::parse("v-on:click", &config).unwrap();
//! assert_eq!(directive.kind, DirectiveKind::On);
//! assert_eq!(directive.arg.as_deref(), Some("click"));
//!
//! directive.apply(button, "increment", &ctx, &mut bindings)?;
//! ```

mod binding;
pub mod interpolate;
pub mod updater;

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::config::CompilerConfig;
use crate::dom::{self, Event};
use crate::error::{BindError, Result};
use crate::reactive::{Model, Value, Watcher};
use crate::types::{ListenerOptions, NodeId};

pub use binding::{Bindings, NodeBindings};
pub use interpolate::{has_interpolation, Segment, Template};

// =============================================================================
// Methods
// =============================================================================

/// An application method callable from `v-on` / `@`.
///
/// Receives the model as its receiver and the event that triggered it.
pub type Method = Rc<dyn Fn(&Model, &Event) -> Result<()>>;

/// Methods by name.
pub type Methods = HashMap<String, Method>;

// =============================================================================
// Directive Parsing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Text,
    Html,
    Model,
    On,
    Bind,
    Unknown(String),
}

impl DirectiveKind {
    fn from_name(name: &str) -> Self {
        match name {
            "text" => Self::Text,
            "html" => Self::Html,
            "model" => Self::Model,
            "on" => Self::On,
            "bind" => Self::Bind,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A parsed directive attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The full attribute name, removed from the element after compiling.
    pub attribute: String,
    pub kind: DirectiveKind,
    /// The part after `:` (or after `@`). Never empty.
    pub arg: Option<String>,
}

impl Directive {
    /// Parse an attribute name. Returns `None` for ordinary attributes.
    pub fn parse(attribute: &str, config: &CompilerConfig) -> Option<Self> {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        if let Some(rest) = attribute.strip_prefix(config.directive_prefix.as_str()) {
            let (name, arg) = match rest.split_once(':') {
                Some((name, arg)) => (name, non_empty(arg)),
                None => (rest, None),
            };
            return Some(Self {
                attribute: attribute.to_string(),
                kind: DirectiveKind::from_name(name),
                arg,
            });
        }

        attribute
            .strip_prefix(config.event_prefix.as_str())
            .map(|event| Self {
                attribute: attribute.to_string(),
                kind: DirectiveKind::On,
                arg: non_empty(event),
            })
    }

    /// Create the binding this directive describes on `node`.
    ///
    /// `expr` is the attribute value: a dot-path, or a method name for `on`.
    pub fn apply(
        &self,
        node: NodeId,
        expr: &str,
        ctx: &BindContext<'_>,
        bindings: &mut Bindings,
    ) -> Result<()> {
        match &self.kind {
            DirectiveKind::Text => watch(node, expr, ctx, bindings, move |v| updater::text(node, v)),
            DirectiveKind::Html => watch(node, expr, ctx, bindings, move |v| updater::html(node, v)),
            DirectiveKind::Model => bind_model(node, expr, ctx, bindings),
            DirectiveKind::On => {
                let event = self.arg.as_deref().ok_or_else(|| BindError::MissingEventName {
                    directive: self.attribute.clone(),
                })?;
                bind_event(node, event, expr, ctx, bindings)
            }
            DirectiveKind::Bind => match &self.arg {
                Some(name) => {
                    let name = name.clone();
                    watch(node, expr, ctx, bindings, move |v| {
                        updater::attribute(node, &name, v)
                    })
                }
                None => Ok(()),
            },
            DirectiveKind::Unknown(name) => {
                debug!(node, directive = %name, "ignoring unknown directive");
                Ok(())
            }
        }
    }
}

// =============================================================================
// Binding
// =============================================================================

/// What a directive binds against.
pub struct BindContext<'a> {
    pub model: &'a Model,
    pub methods: &'a Methods,
    pub config: &'a CompilerConfig,
}

/// Bind a watcher on `expr` that runs `update` with each new value, and
/// run it once with the current value.
fn watch(
    node: NodeId,
    expr: &str,
    ctx: &BindContext<'_>,
    bindings: &mut Bindings,
    update: impl Fn(&Value) + 'static,
) -> Result<()> {
    let update = Rc::new(update);
    let on_change = update.clone();
    let watcher = Watcher::new(ctx.model, expr, move |value| {
        on_change(value);
        Ok(())
    })?;
    update(&watcher.value());
    debug!(node, expr, watcher = watcher.id(), "bound watcher");
    bindings.add_watcher(node, watcher);
    Ok(())
}

fn bind_model(
    node: NodeId,
    expr: &str,
    ctx: &BindContext<'_>,
    bindings: &mut Bindings,
) -> Result<()> {
    watch(node, expr, ctx, bindings, move |v| updater::model(node, v))?;

    let model = ctx.model.downgrade();
    let path = expr.to_string();
    let id = dom::add_event_listener(node, "input", ListenerOptions::empty(), move |_| {
        match model.upgrade() {
            Some(model) => model.set(&path, dom::value(node)),
            None => Ok(()),
        }
    });
    bindings.add_listener(node, id);
    Ok(())
}

fn bind_event(
    node: NodeId,
    event: &str,
    name: &str,
    ctx: &BindContext<'_>,
    bindings: &mut Bindings,
) -> Result<()> {
    let name = name.trim();
    let method = ctx
        .methods
        .get(name)
        .cloned()
        .ok_or_else(|| BindError::MethodNotFound {
            name: name.to_string(),
        })?;

    let model = ctx.model.downgrade();
    let id = dom::add_event_listener(node, event, ListenerOptions::empty(), move |e| {
        match model.upgrade() {
            Some(model) => method(&model, e),
            None => Ok(()),
        }
    });
    debug!(node, event, method = name, "bound listener");
    bindings.add_listener(node, id);
    Ok(())
}

/// Bind every interpolation marker of a text node.
///
/// Each marker gets its own watcher, and any of them re-renders the whole
/// node from the template captured here.
pub fn bind_text(node: NodeId, ctx: &BindContext<'_>, bindings: &mut Bindings) -> Result<()> {
    let template = Template::parse(&dom::text_content(node), ctx.config);

    for expr in template.expressions() {
        let model = ctx.model.downgrade();
        let template = template.clone();
        let watcher = Watcher::new(ctx.model, expr, move |_| {
            let Some(model) = model.upgrade() else {
                return Ok(());
            };
            updater::rendered_text(node, &template.render(&model)?);
            Ok(())
        })?;
        bindings.add_watcher(node, watcher);
    }

    updater::rendered_text(node, &template.render(ctx.model)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn config() -> CompilerConfig {
        CompilerConfig::default()
    }

    fn setup(data: serde_json::Value) -> (Model, Methods, CompilerConfig) {
        dom::reset_document();
        (Model::observe(data).unwrap(), Methods::new(), config())
    }

    #[test]
    fn test_parse_directive_names() {
        let config = config();
        let parse = |name: &str| Directive::parse(name, &config);

        assert_eq!(parse("v-text").unwrap().kind, DirectiveKind::Text);
        assert_eq!(parse("v-model").unwrap().kind, DirectiveKind::Model);

        let on = parse("v-on:click").unwrap();
        assert_eq!(on.kind, DirectiveKind::On);
        assert_eq!(on.arg.as_deref(), Some("click"));

        let at = parse("@input").unwrap();
        assert_eq!(at.kind, DirectiveKind::On);
        assert_eq!(at.arg.as_deref(), Some("input"));
        assert_eq!(at.attribute, "@input");

        assert_eq!(parse("v-on:").unwrap().arg, None);
        assert_eq!(parse("@").unwrap().arg, None);
        assert_eq!(
            parse("v-cloak").unwrap().kind,
            DirectiveKind::Unknown("cloak".to_string())
        );
        assert!(parse("class").is_none());
        assert!(parse("data-v").is_none());
    }

    #[test]
    fn test_custom_prefixes() {
        let config = CompilerConfig::default()
            .with_directive_prefix("x-")
            .with_event_prefix("on-");
        assert_eq!(Directive::parse("x-html", &config).unwrap().kind, DirectiveKind::Html);
        assert_eq!(
            Directive::parse("on-click", &config).unwrap().arg.as_deref(),
            Some("click")
        );
        assert!(Directive::parse("v-html", &config).is_none());
    }

    #[test]
    fn test_text_and_html_directives_are_live() {
        let (model, methods, config) = setup(json!({"msg": "hi", "markup": "<i>a</i>"}));
        let ctx = BindContext { model: &model, methods: &methods, config: &config };
        let mut bindings = Bindings::new();

        let p = dom::create_element("p");
        let div = dom::create_element("div");
        Directive::parse("v-text", &config).unwrap().apply(p, "msg", &ctx, &mut bindings).unwrap();
        Directive::parse("v-html", &config).unwrap().apply(div, "markup", &ctx, &mut bindings).unwrap();
        assert_eq!(dom::text_content(p), "hi");
        assert_eq!(dom::inner_html(div), "<i>a</i>");

        model.set("msg", "bye").unwrap();
        model.set("markup", "<b>b</b>").unwrap();
        assert_eq!(dom::text_content(p), "bye");
        assert_eq!(dom::inner_html(div), "<b>b</b>");
        assert_eq!(bindings.watcher_count(), 2);
    }

    #[test]
    fn test_model_directive_round_trip() {
        let (model, methods, config) = setup(json!({"user": {"name": "A"}}));
        let ctx = BindContext { model: &model, methods: &methods, config: &config };
        let mut bindings = Bindings::new();

        let input = dom::create_element("input");
        Directive::parse("v-model", &config)
            .unwrap()
            .apply(input, "user.name", &ctx, &mut bindings)
            .unwrap();
        assert_eq!(dom::value(input), "A");

        model.set("user.name", "B").unwrap();
        assert_eq!(dom::value(input), "B");

        dom::simulate_input(input, "C").unwrap();
        assert_eq!(model.get("user.name").unwrap(), Value::from("C"));
        assert_eq!(dom::value(input), "C");
    }

    #[test]
    fn test_on_directive_calls_method_with_model() {
        let (model, mut methods, config) = setup(json!({"count": 0}));
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        methods.insert(
            "increment".to_string(),
            Rc::new(move |model: &Model, event: &Event| {
                calls_clone.set(calls_clone.get() + 1);
                assert_eq!(event.kind(), "click");
                let count = model.get("count")?.as_f64().unwrap_or_default();
                model.set("count", count + 1.0)
            }),
        );
        let ctx = BindContext { model: &model, methods: &methods, config: &config };
        let mut bindings = Bindings::new();

        let button = dom::create_element("button");
        Directive::parse("@click", &config)
            .unwrap()
            .apply(button, " increment ", &ctx, &mut bindings)
            .unwrap();
        dom::click(button).unwrap();
        dom::click(button).unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(model.get("count").unwrap(), Value::from(2));
        assert_eq!(bindings.listener_count(), 1);
    }

    #[test]
    fn test_on_directive_errors() {
        let (model, methods, config) = setup(json!({}));
        let ctx = BindContext { model: &model, methods: &methods, config: &config };
        let mut bindings = Bindings::new();
        let button = dom::create_element("button");

        let err = Directive::parse("v-on:click", &config)
            .unwrap()
            .apply(button, "missing", &ctx, &mut bindings)
            .unwrap_err();
        assert_eq!(err, BindError::MethodNotFound { name: "missing".to_string() });

        let err = Directive::parse("v-on", &config)
            .unwrap()
            .apply(button, "missing", &ctx, &mut bindings)
            .unwrap_err();
        assert_eq!(err, BindError::MissingEventName { directive: "v-on".to_string() });
        assert_eq!(dom::listener_count(button), 0);
    }

    #[test]
    fn test_bind_directive_sets_attribute() {
        let (model, methods, config) = setup(json!({"cls": "red"}));
        let ctx = BindContext { model: &model, methods: &methods, config: &config };
        let mut bindings = Bindings::new();
        let div = dom::create_element("div");

        Directive::parse("v-bind:class", &config)
            .unwrap()
            .apply(div, "cls", &ctx, &mut bindings)
            .unwrap();
        assert_eq!(dom::get_attribute(div, "class").as_deref(), Some("red"));
        model.set("cls", "blue").unwrap();
        assert_eq!(dom::class_list(div), vec!["blue"]);

        // Bare v-bind and unknown directives bind nothing.
        Directive::parse("v-bind", &config).unwrap().apply(div, "cls", &ctx, &mut bindings).unwrap();
        Directive::parse("v-show", &config).unwrap().apply(div, "cls", &ctx, &mut bindings).unwrap();
        assert_eq!(bindings.watcher_count(), 1);
    }

    #[test]
    fn test_bind_text_rerenders_whole_node() {
        let (model, methods, config) = setup(json!({"a": 1, "b": 2}));
        let ctx = BindContext { model: &model, methods: &methods, config: &config };
        let mut bindings = Bindings::new();

        let text = dom::create_text("{{a}} + {{ b }} = sum");
        bind_text(text, &ctx, &mut bindings).unwrap();
        assert_eq!(dom::text_content(text), "1 + 2 = sum");
        assert_eq!(bindings.watcher_count(), 2);

        model.set("b", 5).unwrap();
        assert_eq!(dom::text_content(text), "1 + 5 = sum");
    }
}
