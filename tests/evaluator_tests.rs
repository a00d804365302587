// tests/evaluator_tests.rs

use graphquery::{compile, Evaluator, GraphKind, Node, NodeId, Program, Registry};
use serde_json::json;

const LIST: &str = r#"
    <ul>
        <li id="a1"><a href="/one.html">One</a></li>
        <li id="a2"><a href="two.html">Two</a></li>
        <li id="a3"><a href="three/">Three</a></li>
    </ul>
"#;

fn run(expression: &str, document: &str) -> graphquery::Response {
    compile(expression).unwrap().run(document)
}

fn child(program: &Program, parent: NodeId, index: usize) -> NodeId {
    program.node(parent).children()[index]
}

// ============================================================================
// Name Resolution
// ============================================================================

#[test]
fn test_lookup_visibility() {
    let program = compile("{ a b { c d } e }").unwrap();
    let top = program.top_level().to_vec();
    let (a, b, e) = (top[0], top[1], top[2]);
    let (c, d) = (child(&program, b, 0), child(&program, b, 1));

    // earlier sibling
    assert_eq!(program.lookup(d, "c"), Some(c));
    assert_eq!(program.lookup(b, "a"), Some(a));
    // ancestor's earlier sibling
    assert_eq!(program.lookup(d, "a"), Some(a));
    assert_eq!(program.lookup(e, "b"), Some(b));

    // later siblings, descendants, self and ancestors are hidden
    assert_eq!(program.lookup(c, "d"), None);
    assert_eq!(program.lookup(a, "e"), None);
    assert_eq!(program.lookup(b, "c"), None);
    assert_eq!(program.lookup(d, "d"), None);
    assert_eq!(program.lookup(c, "b"), None);
    assert_eq!(program.lookup(e, "c"), None);
}

#[test]
fn test_lookup_first_match_wins() {
    let program = compile("{ x { y } y z }").unwrap();
    let top = program.top_level().to_vec();
    assert_eq!(top.len(), 3);
    assert_eq!(program.lookup(top[2], "y"), Some(top[1]));
}

#[test]
fn test_template_references() {
    let response = run(
        "{ a `template(\"x\")` b `template(\"{$a}/{$}/{$b}/{$zz}/{$\")` c `template(\"z\")` }",
        "D",
    );
    assert_eq!(response.data, json!({"a": "x", "b": "x/D/D//{$", "c": "z"}));
    assert!(response.is_ok());
}

#[test]
fn test_template_cannot_see_later_siblings() {
    let response = run("{ a `template(\"{$b}\")` b `template(\"late\")` }", "");
    assert_eq!(response.data, json!({"a": "", "b": "late"}));
}

#[test]
fn test_reference_from_inside_object_array() {
    let response = run(
        "{ base `template(\"https://example.com/list/\")` items `css(\"li\")` [{ \
            id `attr(\"id\")` \
            url `css(\"a\"); attr(\"href\"); absolute(\"{$base}\")` \
            label `template(\"{$id}: {$url}\")` \
        }] }",
        LIST,
    );
    assert_eq!(
        response.data,
        json!({
            "base": "https://example.com/list/",
            "items": [
                {"id": "a1", "label": "a1: https://example.com/one.html", "url": "https://example.com/one.html"},
                {"id": "a2", "label": "a2: https://example.com/list/two.html", "url": "https://example.com/list/two.html"},
                {"id": "a3", "label": "a3: https://example.com/list/three/", "url": "https://example.com/list/three/"},
            ]
        })
    );
    assert!(response.is_ok());
}

#[test]
fn test_link() {
    let response = run(
        "{ __title__ `css(\"li\"); eq(\"1\"); text()` copy `link(\"__title__\")` missing `link(\"nope\")` }",
        LIST,
    );
    assert_eq!(response.data, json!({"copy": "Two", "missing": ""}));
    assert!(response.is_ok());
}

#[test]
fn test_link_to_self_is_skipped() {
    let response = run("{ me `template(\"kept\"); link(\"me\")` }", "");
    assert_eq!(response.data, json!({"me": "kept"}));
}

#[test]
fn test_link_arity_is_reported() {
    let response = run("{ a `template(\"x\")` b `link(\"a\", \"c\")` }", "DOC");
    assert_eq!(response.data, json!({"a": "x", "b": "DOC"}));
    assert_eq!(
        response.errors,
        vec!["b: method link expects 1 parameters, but 2 received"]
    );
}

#[test]
fn test_link_to_array_sees_full_selection() {
    let response = run(
        "{ items `css(\"li\")` [ name `text()` ] all `link(\"items\")` }",
        LIST,
    );
    assert_eq!(
        response.data,
        json!({"all": "OneTwoThree", "items": ["One", "Two", "Three"]})
    );
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn test_array_interleaves_children() {
    let document = "<p><b>1</b><i>a</i></p><p><b>2</b><i>b</i></p>";
    let response = run("{ cells `css(\"p\")` [ num `css(\"b\")` letter `css(\"i\")` ] }", document);
    assert_eq!(response.data, json!({"cells": ["1", "a", "2", "b"]}));
}

#[test]
fn test_object_array_siblings_reset_per_element() {
    let response = run(
        "items `css(\"li\")` [{ name `text()` label `template(\"#{$name}\")` }]",
        LIST,
    );
    assert_eq!(
        response.data,
        json!([
            {"label": "#One", "name": "One"},
            {"label": "#Two", "name": "Two"},
            {"label": "#Three", "name": "Three"},
        ])
    );
}

#[test]
fn test_nested_references_reset_per_element() {
    let document = r#"
        <div class="item"><span class="a">one</span></div>
        <div class="item"><span class="a">two</span></div>
    "#;
    let response = run(
        "{ items `css(\".item\")` [{ info { \
            a `css(\".a\")` \
            b `link(\"a\")` \
            c `template(\"x{$a}\")` \
        } }] }",
        document,
    );
    assert_eq!(
        response.data,
        json!({
            "items": [
                {"info": {"a": "one", "b": "one", "c": "xone"}},
                {"info": {"a": "two", "b": "two", "c": "xtwo"}},
            ]
        })
    );
    assert!(response.is_ok());
}

#[test]
fn test_nested_object() {
    let response = run(
        "{ first `css(\"li\"); eq(\"0\")` { text `text()` link { href `css(\"a\"); attr(\"href\")` } } }",
        LIST,
    );
    assert_eq!(
        response.data,
        json!({"first": {"link": {"href": "/one.html"}, "text": "One"}})
    );
}

#[test]
fn test_empty_results() {
    let response = run(
        "{ none `css(\"table\")` [ cell `text()` ] rows `css(\"tr\")` [{ c }] missing `css(\"table\")` }",
        LIST,
    );
    assert_eq!(response.data, json!({"missing": "", "none": [], "rows": []}));
    assert!(response.is_ok());
}

#[test]
fn test_text_selection_is_one_element() {
    let response = run("words `template(\"x\")` [ w `text()` ]", "ignored");
    assert_eq!(response.data, json!(["x"]));
}

#[test]
fn test_virtual_keys_are_omitted() {
    let response = run(
        "{ __id__ `template(\"7\")` id `link(\"__id__\")` nested { __inner__ `template(\"i\")` } }",
        "",
    );
    assert_eq!(response.data, json!({"id": "7", "nested": {}}));
}

#[test]
fn test_virtual_atom_is_null() {
    let response = run("__hidden__ `template(\"a\")`", "");
    assert_eq!(response.data, serde_json::Value::Null);
    assert!(response.is_ok());
}

#[test]
fn test_number_scalars() {
    let program = Program::from_nodes(
        GraphKind::Object,
        vec![
            Node::number("price").pipe("css", &[".price"]),
            Node::number("count").pipe("template", &[" 3 "]),
            Node::number("bad").pipe("template", &["abc"]),
            Node::string("label").pipe("template", &["3"]),
        ],
    );
    let response = program.run(r#"<span class="price">12.50</span>"#);
    assert_eq!(
        response.data,
        json!({"bad": 0, "count": 3, "label": "3", "price": 12.5})
    );
    assert_eq!(
        response.errors,
        vec![r#"bad: invalid number "abc": invalid float literal"#]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_errors_are_counted() {
    let response = run("{ items `css(\"li\")` [ x `foo()` ] }", LIST);
    assert_eq!(response.data, json!({"items": ["", "", ""]}));
    assert_eq!(response.errors, vec!["x: undefined method: foo (3 times)"]);
}

#[test]
fn test_errors_in_pre_order() {
    let response = run(
        "{ a `foo()` b { c `bar()` d `eq(\"x\")` } e `foo()` }",
        "",
    );
    assert_eq!(
        response.errors,
        vec![
            "a: undefined method: foo",
            "c: undefined method: bar",
            "d: invalid argument for eq: \"x\" is not an index: invalid digit found in string",
            "e: undefined method: foo",
        ]
    );
    assert_eq!(response.data, json!({"a": "", "b": {"c": "", "d": ""}, "e": ""}));
}

#[test]
fn test_failed_parent_skips_children() {
    let response = run("{ a `foo()` { b `bar()` } }", "");
    assert_eq!(response.data, json!({"a": {}}));
    assert_eq!(response.errors, vec!["a: undefined method: foo"]);
}

#[test]
fn test_failure_keeps_siblings() {
    let response = run(
        "items `css(\"li\")` [{ name `text()` bad `eq(\"5\")` }]",
        LIST,
    );
    assert_eq!(
        response.data,
        json!([
            {"bad": "", "name": "One"},
            {"bad": "", "name": "Two"},
            {"bad": "", "name": "Three"},
        ])
    );
    assert_eq!(
        response.errors,
        vec!["bad: no element at index 5, selection has 1 (3 times)"]
    );
}

// ============================================================================
// Reuse
// ============================================================================

#[test]
fn test_program_is_reusable() {
    let program = compile("{ n `css(\"li\"); eq(\"0\"); text()` x `foo()` }").unwrap();
    let first = program.run(LIST);
    let second = program.run(LIST);
    assert_eq!(first, second);
    assert_eq!(first.errors, vec!["x: undefined method: foo"]);

    let other = program.run("<li>Other</li>");
    assert_eq!(other.data, json!({"n": "Other", "x": ""}));
}

#[test]
fn test_program_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Program>();

    let program = compile("t `text()`").unwrap();
    let handle = std::thread::spawn(move || program.run("threaded").data);
    assert_eq!(handle.join().unwrap(), json!("threaded"));
}

#[test]
fn test_evaluator_selection_and_render() {
    let program = compile("{ a `css(\"li\")` b `template(\"[{$a}]\")` }").unwrap();
    let top = program.top_level().to_vec();
    let mut evaluator = Evaluator::new(&program, Registry::global(), LIST);

    let a = evaluator.selection(top[0]).unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(evaluator.render(top[1], "<{$a}>"), "<OneTwoThree>");
    assert_eq!(evaluator.node_text(top[1]), "[OneTwoThree]");
    assert!(evaluator.collect_errors().is_empty());
}
