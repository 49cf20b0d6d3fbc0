//! Integration tests for the reactive store public API

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use reactive_html::{sanitize, Document, EngineConfig, EventKind, NodeId, ReactiveStore};
use serde_json::{json, Map, Value};

fn state(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("state fixture must be an object"),
    }
}

fn by_id(store: &ReactiveStore, id: &str) -> NodeId {
    store
        .document()
        .find_by_id(id)
        .unwrap_or_else(|| panic!("no element #{id}"))
}

fn text_of(store: &ReactiveStore, id: &str) -> String {
    store.document().text_content(by_id(store, id))
}

fn list_items(store: &ReactiveStore, id: &str) -> Vec<NodeId> {
    let doc = store.document();
    doc.children(by_id(store, id))
        .iter()
        .copied()
        .filter(|n| doc.is_element(*n))
        .collect()
}

// ============================================================================
// Interpolation
// ============================================================================

#[test]
fn test_text_and_attribute_interpolation() {
    let mut store = ReactiveStore::from_html(
        r#"<h1 id="t" title="Hello {name}">Hi {name}, you have {count} items</h1>"#,
        state(json!({"name": "Ada", "count": 2})),
    );
    assert_eq!(
        store.render(),
        r#"<h1 id="t" title="Hello Ada">Hi Ada, you have 2 items</h1>"#
    );

    store.set("count", 3);
    store.set("name", "Grace");
    assert_eq!(
        store.render(),
        r#"<h1 id="t" title="Hello Grace">Hi Grace, you have 3 items</h1>"#
    );
}

#[test]
fn test_unknown_placeholder_stays_until_defined() {
    let mut store = ReactiveStore::from_html(r#"<p id="p">{later}</p>"#, Map::new());
    assert_eq!(text_of(&store, "p"), "{later}");
    store.set("later", "now");
    assert_eq!(text_of(&store, "p"), "now");
}

#[test]
fn test_nested_paths_and_variable_index() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="a">{user.profile.name}</p><p id="b">{pages[active]}</p>"#,
        state(json!({
            "user": {"profile": {"name": "Ada"}},
            "pages": ["Home", "About"],
            "active": 0,
        })),
    );
    assert_eq!(text_of(&store, "a"), "Ada");
    assert_eq!(text_of(&store, "b"), "Home");

    store.set("active", 1);
    assert_eq!(text_of(&store, "b"), "About");
}

#[test]
fn test_structured_values_render_empty_in_text() {
    let store = ReactiveStore::from_html(
        r#"<p id="p">[{obj}]</p>"#,
        state(json!({"obj": {"a": 1}})),
    );
    assert_eq!(text_of(&store, "p"), "[]");
}

#[test]
fn test_store_values_are_sanitized() {
    let mut store = ReactiveStore::from_html(r#"<div id="d">{msg}</div>"#, Map::new());
    store.set("msg", "<script>alert(1)</script>hello");
    assert_eq!(store.render(), r#"<div id="d">hello</div>"#);

    store.set("msg", r#"<a href="javascript:x">l</a>"#);
    assert_eq!(store.render(), r##"<div id="d"><a href="#">l</a></div>"##);
}

#[test]
fn test_sanitizer_examples() {
    assert_eq!(sanitize("<script>alert(1)</script>hello"), "hello");
    assert_eq!(sanitize(r#"<a href="javascript:x">l</a>"#), r##"<a href="#">l</a>"##);
}

// ============================================================================
// rs-if
// ============================================================================

#[test]
fn test_if_strict_comparison() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="p" rs-if="count === 3">three</p>"#,
        state(json!({"count": 3})),
    );
    let p = by_id(&store, "p");
    assert!(store.document().has_class(p, "show"));
    assert!(!store.document().has_class(p, "hide"));

    store.set("count", "3");
    assert!(store.document().has_class(p, "hide"));
    assert!(!store.document().has_class(p, "show"));
}

#[test]
fn test_if_loose_comparison() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="p" rs-if='count == "3"'>three</p>"#,
        state(json!({"count": 3})),
    );
    let p = by_id(&store, "p");
    assert!(store.document().has_class(p, "show"));

    store.set("count", "3");
    assert!(store.document().has_class(p, "show"));

    store.set("count", 4);
    assert!(store.document().has_class(p, "hide"));
}

#[test]
fn test_if_element_is_never_detached() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="p" rs-if="open">x</p>"#,
        state(json!({"open": false})),
    );
    let p = by_id(&store, "p");
    store.set("open", true);
    store.set("open", false);
    assert!(store.document().is_alive(p));
    assert_eq!(by_id(&store, "p"), p);
}

#[test]
fn test_if_keeps_classes_when_class_is_interpolated() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="p" class="{size}" rs-if="on">x</p>"#,
        state(json!({"size": "big", "on": true})),
    );
    let p = by_id(&store, "p");
    assert!(store.document().has_class(p, "big"));
    assert!(store.document().has_class(p, "show"));

    store.set("size", "small");
    assert!(store.document().has_class(p, "small"));
    assert!(store.document().has_class(p, "show"));
    assert!(!store.document().has_class(p, "big"));
}

#[test]
fn test_if_custom_classes() {
    let config = EngineConfig {
        show_class: "visible".into(),
        hide_class: "hidden".into(),
        ..EngineConfig::default()
    };
    let mut store = ReactiveStore::with_config(
        Document::parse(r#"<p id="p" rs-if="todos.length > 0">x</p>"#),
        state(json!({"todos": []})),
        config,
    );
    let p = by_id(&store, "p");
    assert!(store.document().has_class(p, "hidden"));
    store.set("todos", json!([1]));
    assert!(store.document().has_class(p, "visible"));
}

// ============================================================================
// rs-for
// ============================================================================

#[test]
fn test_for_renders_grows_and_shrinks() {
    let mut store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in todos"><li>{t.title}</li></ul>"#,
        state(json!({"todos": [
            {"title": "a", "checked": ""},
            {"title": "b", "checked": "checked"},
        ]})),
    );
    assert_eq!(
        store.render(),
        concat!(
            r#"<ul id="list" rs-for="t in todos">"#,
            r#"<li data-rs-for-clone="todos" rs-for-index="0" is-newly-added="yes">a</li>"#,
            r#"<li data-rs-for-clone="todos" rs-for-index="1" is-newly-added="yes">b</li>"#,
            "</ul>"
        )
    );

    store.set("todos", json!([{"title": "a", "checked": ""}]));
    let items = list_items(&store, "list");
    assert_eq!(items.len(), 1);
    assert_eq!(store.document().text_content(items[0]), "a");
    assert_eq!(store.document().attr(items[0], "rs-for-index"), Some("0"));
    assert_eq!(store.document().attr(items[0], "is-newly-added"), Some("no"));

    store.update("todos", |todos| {
        if let Value::Array(items) = todos {
            items.push(json!({"title": "c"}));
            items.push(json!({"title": "d"}));
        }
    });
    let texts: Vec<String> = list_items(&store, "list")
        .into_iter()
        .map(|n| store.document().text_content(n))
        .collect();
    assert_eq!(texts, vec!["a", "c", "d"]);
}

#[test]
fn test_for_replaces_nodes_on_update() {
    let mut store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in todos"><li>{t.title}</li></ul>"#,
        state(json!({"todos": [{"title": "a"}]})),
    );
    let before = list_items(&store, "list")[0];
    store.update("todos", |todos| todos[0]["title"] = json!("z"));
    let after = list_items(&store, "list")[0];
    assert_ne!(before, after);
    assert!(!store.document().is_alive(before));
    assert_eq!(store.document().text_content(after), "z");
}

#[test]
fn test_for_item_index_and_store_tokens() {
    let store = ReactiveStore::from_html(
        r#"<ol id="list" rs-for="n in nums"><li>{index}:{item}{unit}</li></ol>"#,
        state(json!({"nums": [10, 20], "unit": "kg"})),
    );
    let texts: Vec<String> = list_items(&store, "list")
        .into_iter()
        .map(|n| store.document().text_content(n))
        .collect();
    assert_eq!(texts, vec!["0:10kg", "1:20kg"]);
}

#[test]
fn test_for_non_array_is_noop() {
    let mut store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in todos"><li>{t}</li></ul>"#,
        state(json!({"todos": ["a"]})),
    );
    store.set("todos", "not a list");
    let items = list_items(&store, "list");
    assert_eq!(items.len(), 1);
    assert_eq!(store.document().text_content(items[0]), "a");
}

#[test]
fn test_for_generic_attributes_use_item() {
    let store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in todos"><li><input type="checkbox" rs-checked="t.checked"></li></ul>"#,
        state(json!({"todos": [
            {"title": "a", "checked": ""},
            {"title": "b", "checked": "checked"},
        ]})),
    );
    let doc = store.document();
    let inputs: Vec<NodeId> = doc
        .descendants(by_id(&store, "list"))
        .into_iter()
        .filter(|n| doc.tag(*n) == Some("input"))
        .collect();
    assert_eq!(inputs.len(), 2);
    assert!(!doc.has_attr(inputs[0], "checked"));
    assert_eq!(doc.attr(inputs[1], "checked"), Some("checked"));
    assert!(!doc.has_attr(inputs[0], "rs-checked"));
}

#[test]
fn test_for_nested_if_is_activated() {
    let mut store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in todos"><li><b rs-if="filter == 'all'">{t.title}</b></li></ul>"#,
        state(json!({"todos": [{"title": "a"}], "filter": "all"})),
    );
    let doc = store.document();
    let b = doc
        .descendants(by_id(&store, "list"))
        .into_iter()
        .find(|n| doc.tag(*n) == Some("b"))
        .expect("rendered item");
    assert!(doc.has_class(b, "show"));

    store.set("filter", "done");
    assert!(store.document().has_class(b, "hide"));
}

#[test]
fn test_for_nested_if_reads_item() {
    let mut store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in todos"><li><span rs-if="t.done">done</span><em rs-if="index === 1">second</em>{t.title}</li></ul>"#,
        state(json!({"todos": [
            {"title": "a", "done": true},
            {"title": "b", "done": false},
        ]})),
    );
    let spans = |store: &ReactiveStore, tag: &str| -> Vec<NodeId> {
        let doc = store.document();
        doc.descendants(by_id(store, "list"))
            .into_iter()
            .filter(|n| doc.tag(*n) == Some(tag))
            .collect()
    };

    let done = spans(&store, "span");
    assert!(store.document().has_class(done[0], "show"));
    assert!(store.document().has_class(done[1], "hide"));
    let second = spans(&store, "em");
    assert!(store.document().has_class(second[0], "hide"));
    assert!(store.document().has_class(second[1], "show"));

    // Loop names are not store variables
    assert!(store.registry().bindings_for("t").is_empty());
    assert!(store.registry().bindings_for("index").is_empty());

    store.update("todos", |todos| todos[1]["done"] = json!(true));
    let done = spans(&store, "span");
    assert!(store.document().has_class(done[0], "show"));
    assert!(store.document().has_class(done[1], "show"));
}

#[test]
fn test_for_item_rendering_empty_is_removed() {
    let mut store = ReactiveStore::from_html(
        r#"<ul id="list" rs-for="t in xs">{t}</ul>"#,
        state(json!({"xs": ["a", "b"]})),
    );
    assert_eq!(list_items(&store, "list").len(), 2);

    store.set("xs", json!(["", "b"]));
    let items = list_items(&store, "list");
    assert_eq!(items.len(), 1);
    assert_eq!(store.document().attr(items[0], "rs-for-index"), Some("1"));
    assert_eq!(text_of(&store, "list"), "b");

    store.set("xs", json!(["  "]));
    assert!(list_items(&store, "list").is_empty());
}

// ============================================================================
// rs-html
// ============================================================================

#[test]
fn test_html_object_placeholder_renders_empty() {
    let store = ReactiveStore::from_html(
        r#"<div id="d" rs-html="body"></div>"#,
        state(json!({"body": "<p>{user}|{user.name}</p>", "user": {"name": "Ada"}})),
    );
    assert_eq!(text_of(&store, "d"), "|Ada");
}

#[test]
fn test_html_nested_if_composes() {
    let mut store = ReactiveStore::from_html(
        r#"<div id="d" rs-html="body"></div>"#,
        state(json!({"body": r#"<span id="s" rs-if="on">x</span>"#, "on": true})),
    );
    let span = by_id(&store, "s");
    assert!(store.document().has_class(span, "show"));
    store.set("on", false);
    assert!(store.document().has_class(span, "hide"));
}

#[test]
fn test_html_circular_placeholders_terminate() {
    let store = ReactiveStore::from_html(
        r#"<div id="d" rs-html="body"></div>"#,
        state(json!({"body": "<p>{a}</p>", "a": "{b}", "b": "{a}"})),
    );
    assert!(text_of(&store, "d").starts_with('{'));
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn test_reference_chain_propagates() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="a">{a}</p><p id="b">{b}</p><p id="c">{c}</p>"#,
        state(json!({"a": "{b}", "b": "{c}", "c": 5})),
    );
    assert_eq!(text_of(&store, "a"), "5");
    assert_eq!(text_of(&store, "b"), "5");

    store.set("c", 6);
    assert_eq!(text_of(&store, "a"), "6");
    assert_eq!(text_of(&store, "b"), "6");
    assert_eq!(text_of(&store, "c"), "6");
}

#[test]
fn test_reference_cycle_terminates() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="a">{a}</p><p id="c">{c}</p>"#,
        state(json!({"a": "{b}", "b": "{c}", "c": 1})),
    );
    store.set("c", "{a}");
    assert!(text_of(&store, "a").starts_with('{'));
    assert!(store.dependencies().has_path("a", "c"));
    assert!(store.dependencies().has_path("c", "a"));
}

#[test]
fn test_writes_create_keys() {
    let mut store = ReactiveStore::from_html("", Map::new());
    assert_eq!(store.get("x"), None);
    store.set("x", json!({"deep": [1, 2]}));
    assert_eq!(store.resolve("x.deep[1]"), Some(json!(2)));
}

// ============================================================================
// Scanning
// ============================================================================

#[test]
fn test_rescan_is_idempotent() {
    let mut store = ReactiveStore::from_html(
        r#"<div title="{t}"><p>{a}</p><i rs-if="a">x</i><ul rs-for="v in list"><li>{v}</li></ul></div>"#,
        state(json!({"a": 1, "t": "T", "list": [1, 2]})),
    );
    let bindings = store.registry().len();
    let captures = store.registry().captures();
    let html = store.render();

    store.scan();
    let root = store.document().root();
    store.reparse(root);

    assert_eq!(store.registry().len(), bindings);
    assert_eq!(store.registry().captures(), captures);
    assert_eq!(store.render(), html);
}

#[test]
fn test_inject_makes_fragment_reactive() {
    let mut store = ReactiveStore::from_html(
        r#"<main id="slot"></main>"#,
        state(json!({"name": "Ada"})),
    );
    let slot = by_id(&store, "slot");
    store.inject(slot, r#"<p>Hi {name}</p><p rs-if="name">x</p>"#);
    assert_eq!(
        store.render(),
        r#"<main id="slot"><p>Hi Ada</p><p rs-if="name" class="show">x</p></main>"#
    );

    store.set("name", "Grace");
    assert_eq!(text_of(&store, "slot"), "Hi Gracex");
}

#[test]
fn test_reparse_after_manual_insert() {
    let mut store = ReactiveStore::from_html(
        r#"<section id="s"></section>"#,
        state(json!({"n": 1})),
    );
    let s = by_id(&store, "s");
    store.document_mut().set_inner_html(s, "<b>{n}</b>");
    assert_eq!(text_of(&store, "s"), "{n}");

    store.reparse(s);
    assert_eq!(text_of(&store, "s"), "1");
    store.set("n", 2);
    assert_eq!(text_of(&store, "s"), "2");
}

#[test]
fn test_nested_directives_survive_text_rerender() {
    let mut store = ReactiveStore::from_html(
        r#"<div id="d">{title}<span rs-if="on">x</span></div>"#,
        state(json!({"title": "T", "on": true})),
    );
    store.set("title", "U");
    let doc = store.document();
    let span = doc
        .descendants(by_id(&store, "d"))
        .into_iter()
        .find(|n| doc.tag(*n) == Some("span"))
        .expect("span");
    assert!(doc.has_class(span, "show"));

    store.set("on", false);
    assert!(store.document().has_class(span, "hide"));
}

#[test]
fn test_prune_after_manual_removal() {
    let mut store = ReactiveStore::from_html(
        r#"<p id="a">{x}</p><p id="b">{x}</p>"#,
        state(json!({"x": 1})),
    );
    assert_eq!(store.registry().bindings_for("x").len(), 2);

    let a = by_id(&store, "a");
    store.document_mut().remove(a);
    assert_eq!(store.prune(), 1);
    assert_eq!(store.registry().bindings_for("x").len(), 1);
}

#[test]
fn test_replaced_content_drops_bindings() {
    let mut store = ReactiveStore::from_html(
        r#"<main id="slot"><p>{x}</p></main>"#,
        state(json!({"x": 1, "y": 2})),
    );
    let slot = by_id(&store, "slot");
    store.inject(slot, "<p>{y}</p>");
    assert!(store.registry().bindings_for("x").is_empty());
    assert_eq!(store.registry().bindings_for("y").len(), 1);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_change_events_in_order() {
    let mut store = ReactiveStore::from_html("", state(json!({"count": 1})));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&seen);
    let id = store.on(EventKind::Change, move |e| {
        first
            .borrow_mut()
            .push(format!("1:{}:{:?}:{}", e.name, e.old, e.new));
    });
    let second = Rc::clone(&seen);
    store.on(EventKind::Change, move |e| {
        second.borrow_mut().push(format!("2:{}", e.name));
    });

    store.set("count", 2);
    assert_eq!(
        *seen.borrow(),
        vec!["1:count:Some(Number(1)):2".to_string(), "2:count".to_string()]
    );

    assert!(store.off(EventKind::Change, id));
    store.set("fresh", true);
    assert_eq!(seen.borrow().last().map(String::as_str), Some("2:fresh"));
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn test_event_kind_parsing() {
    assert_eq!("change".parse::<EventKind>().ok(), Some(EventKind::Change));
    assert!("click".parse::<EventKind>().is_err());
}
