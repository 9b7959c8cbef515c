//! End-to-end binding scenarios: a model, a template, and the page after
//! construction, writes and simulated user input.
//!
//! Set `RUST_LOG=vbind=trace` to see the binding trace.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use vbind::{dom, BindError, CompilerConfig, NodeId, Options, Value, ViewModel};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh document with `<div id="app">markup</div>` in the body.
fn app(markup: &str) -> NodeId {
    init_tracing();
    dom::reset_document();
    let root = dom::create_element("div");
    dom::set_attribute(root, "id", "app");
    dom::append_child(dom::body(), root);
    dom::set_inner_html(root, markup);
    root
}

fn select(selector: &str) -> NodeId {
    dom::query_selector(selector).unwrap().unwrap()
}

#[test]
fn message_and_model_round_trip() {
    app(r#"<div class="out">{{msg}}</div><input v-model="user.name">"#);
    let vm = ViewModel::new(
        Options::new(json!({ "msg": "hi", "user": { "name": "A" } })).el("#app"),
    )
    .unwrap();

    let out = select(".out");
    let input = select("input");
    assert_eq!(dom::text_content(out), "hi");
    assert_eq!(dom::value(input), "A");

    vm.data().set("user.name", "B").unwrap();
    assert_eq!(dom::value(input), "B");

    dom::simulate_input(input, "C").unwrap();
    assert_eq!(vm.data().get("user.name").unwrap(), Value::from("C"));

    // Re-running the same input leaves the model as it was.
    dom::simulate_input(input, "C").unwrap();
    assert_eq!(vm.data().get("user.name").unwrap(), Value::from("C"));
    assert_eq!(dom::value(input), "C");
}

#[test]
fn click_increments_counter() {
    let root = app(r#"<span>{{count}}</span><button v-on:click="increment">+</button>"#);
    let vm = ViewModel::new(
        Options::new(json!({ "count": 0 }))
            .el(root)
            .method("increment", |model, _event| {
                let count = model.get("count")?.as_f64().unwrap_or_default();
                model.set("count", count + 1.0)
            }),
    )
    .unwrap();

    dom::click(select("button")).unwrap();
    assert_eq!(vm.get("count").unwrap(), Value::from(1));
    assert_eq!(dom::text_content(select("span")), "1");
}

#[test]
fn event_shorthand_receives_event() {
    let root = app(r#"<ul><li><a class="go" @click="open">go</a></li></ul>"#);
    let target = Rc::new(Cell::new(None));
    let target_clone = target.clone();
    let _vm = ViewModel::new(
        Options::new(json!({}))
            .el(root)
            .method("open", move |_model, event| {
                target_clone.set(event.target());
                Ok(())
            }),
    )
    .unwrap();

    let link = select("a.go");
    dom::click(link).unwrap();
    assert_eq!(target.get(), Some(link));
}

#[test]
fn compiled_markup_has_no_directives() {
    let root = app(
        r#"<p id="t" v-text="msg" title="keep"></p><div v-html="raw"></div><input type="text" v-model="msg" @input="noop"><a v-bind:href="url" v-cloak>x</a>"#,
    );
    let _vm = ViewModel::new(
        Options::new(json!({ "msg": "m", "raw": "<em>r</em>", "url": "/u" }))
            .el(root)
            .method("noop", |_, _| Ok(())),
    )
    .unwrap();

    assert_eq!(
        dom::inner_html(root),
        r#"<p id="t" title="keep">m</p><div><em>r</em></div><input type="text"><a href="/u">x</a>"#
    );
    for node in dom::descendants(root) {
        for (name, _) in dom::attributes(node) {
            assert!(!name.starts_with("v-") && !name.starts_with('@'), "{name} left behind");
        }
    }
}

#[test]
fn multiple_markers_rerender_whole_node() {
    let root = app("<p>{{ first }} {{ last }} ({{ age }})</p>");
    let vm = ViewModel::new(
        Options::new(json!({ "first": "Ada", "last": "L", "age": 36 })).el(root),
    )
    .unwrap();
    let p = select("p");
    assert_eq!(dom::text_content(p), "Ada L (36)");

    vm.set("last", "Lovelace").unwrap();
    assert_eq!(dom::text_content(p), "Ada Lovelace (36)");
    assert_eq!(dom::child_nodes(p).len(), 1);
}

#[test]
fn writes_rerender_only_dependent_nodes() {
    let root = app(r#"<p class="a">{{a}}</p><p class="b">{{b.c}}</p><p class="ab">{{a}}-{{b.c}}</p>"#);
    let vm = ViewModel::new(Options::new(json!({ "a": 1, "b": { "c": 2 } })).el(root)).unwrap();

    // Mark every node stale, then check which ones a write restores.
    let (pa, pb, pab) = (select(".a"), select(".b"), select(".ab"));
    let text_of = |p: NodeId| dom::first_child(p).unwrap();
    for p in [pa, pb, pab] {
        dom::set_text_content(text_of(p), "stale");
    }

    vm.data().set("b.c", 3).unwrap();
    assert_eq!(dom::text_content(pa), "stale");
    assert_eq!(dom::text_content(pb), "3");
    assert_eq!(dom::text_content(pab), "1-3");

    dom::set_text_content(text_of(pb), "stale");
    vm.set("b", json!({ "c": 4 })).unwrap();
    assert_eq!(dom::text_content(pa), "stale");
    assert_eq!(dom::text_content(pb), "4");
    assert_eq!(dom::text_content(pab), "1-4");
}

#[test]
fn properties_added_later_are_not_reactive() {
    let root = app("<p>{{extra}}</p>");
    let vm = ViewModel::new(Options::new(json!({ "base": 1 })).el(root)).unwrap();
    let p = select("p");
    assert_eq!(dom::text_content(p), "undefined");

    vm.data().set("extra", "now").unwrap();
    assert_eq!(dom::text_content(p), "undefined");
    assert_eq!(vm.data().get("extra").unwrap(), Value::from("now"));

    // Not part of the proxy either.
    assert_eq!(
        vm.set("extra", "x"),
        Err(BindError::NotProxied { key: "extra".to_string() })
    );
}

#[test]
fn missing_intermediate_fails_construction() {
    let root = app("<p>{{user.name.first}}</p>");
    let err = ViewModel::new(Options::new(json!({ "user": {} })).el(root)).unwrap_err();
    assert_eq!(err, BindError::missing_path("user.name.first", "first", "undefined"));
}

#[test]
fn missing_method_fails_construction() {
    let root = app(r#"<button @click="save">save</button>"#);
    let err = ViewModel::new(Options::new(json!({})).el(root)).unwrap_err();
    assert_eq!(err, BindError::MethodNotFound { name: "save".to_string() });
}

#[test]
fn handler_errors_propagate_from_dispatch() {
    let root = app(r#"<button @click="fail">x</button>"#);
    let _vm = ViewModel::new(
        Options::new(json!({}))
            .el(root)
            .method("fail", |_, _| Err(BindError::handler("nope"))),
    )
    .unwrap();

    assert_eq!(dom::click(select("button")), Err(BindError::handler("nope")));
}

#[test]
fn custom_delimiters() {
    let root = app("<p>[[ a ]] {{ a }}</p>");
    let vm = ViewModel::new(
        Options::new(json!({ "a": "x" }))
            .el(root)
            .config(CompilerConfig::default().with_delimiters("[[", "]]")),
    )
    .unwrap();
    assert_eq!(dom::text_content(select("p")), "x {{ a }}");
    vm.set("a", "y").unwrap();
    assert_eq!(dom::text_content(select("p")), "y {{ a }}");
}

#[test]
fn html_rerender_drops_bindings_of_replaced_children() {
    let root = app(r#"<div v-html="raw"></div>"#);
    let vm = ViewModel::new(
        Options::new(json!({ "raw": "<b>{{x}}</b>", "x": "bound" })).el(root),
    )
    .unwrap();

    // Markup inserted at construction is compiled with the rest of the tree.
    assert_eq!(dom::inner_html(select("#app div")), "<b>bound</b>");
    assert_eq!(vm.binding_count(), 2);

    vm.set("raw", "<i>{{x}}</i>").unwrap();
    assert_eq!(dom::inner_html(select("#app div")), "<i>{{x}}</i>");
    assert_eq!(vm.binding_count(), 1);
}

#[test]
fn dropped_view_model_releases_the_page() {
    let root = app(r#"<input v-model="name"><p>{{name}}</p>"#);
    let input = select("input");
    let vm = ViewModel::new(Options::new(json!({ "name": "A" })).el(root)).unwrap();
    let model = vm.data().clone();

    dom::simulate_input(input, "B").unwrap();
    assert_eq!(dom::text_content(select("p")), "B");

    drop(vm);
    assert_eq!(dom::listener_count(input), 0);

    // A model kept alive elsewhere no longer drives the page.
    model.set("name", "C").unwrap();
    dom::simulate_input(input, "D").unwrap();
    assert_eq!(model.get("name").unwrap(), Value::from("C"));
    assert_eq!(dom::text_content(select("p")), "B");
}
