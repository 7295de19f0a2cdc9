//! Integration tests for rendering: interpolation, conditionals and loops.

use pmd::parser::{CompareOp, MAX_NESTING_DEPTH};
use pmd::{Engine, Error, EvalError, Resolution, Value, context};

fn render(source: &str, ctx: &Value) -> String {
    Engine::new().render_str(source, ctx).unwrap()
}

fn render_json(source: &str, json: &str) -> String {
    render(source, &Value::from_json(json).unwrap())
}

fn eval_error(source: &str, ctx: &Value) -> EvalError {
    match Engine::new().render_str(source, ctx) {
        Err(Error::Eval { source, .. }) => source,
        other => panic!("expected eval error, got {other:?}"),
    }
}

// =============================================================================
// Interpolation
// =============================================================================

#[test]
fn test_text_only() {
    assert_eq!(render("Just text.\n", &Value::Null), "Just text.\n");
}

#[test]
fn test_metadata_is_not_rendered() {
    assert_eq!(
        render("@model: gpt-4\n\nHello, {{ name }}!", &context! { "name" => "World" }),
        "Hello, World!"
    );
}

#[test]
fn test_nested_paths() {
    assert_eq!(
        render_json(
            "{{ user.name }} <{{ user.contact.email }}>",
            r#"{"user": {"name": "Ada", "contact": {"email": "ada@example.com"}}}"#
        ),
        "Ada <ada@example.com>"
    );
}

#[test]
fn test_array_index_segment() {
    assert_eq!(
        render_json("{{ items.1 }}/{{ grid.0.1 }}", r#"{"items": ["a", "b"], "grid": [[1, 2]]}"#),
        "b/2"
    );
}

#[test]
fn test_numeric_key_on_object() {
    assert_eq!(render_json("{{ codes.404 }}", r#"{"codes": {"404": "missing"}}"#), "missing");
}

#[test]
fn test_missing_path_renders_empty() {
    assert_eq!(
        render("[{{ nope }}][{{ user.nope }}][{{ items.9 }}]", &context! { "user" => context! {}, "items" => vec![1] }),
        "[][][]"
    );
}

#[test]
fn test_path_through_scalar_renders_empty() {
    assert_eq!(render("[{{ name.first }}]", &context! { "name" => "Ada" }), "[]");
}

#[test]
fn test_non_object_root() {
    assert_eq!(render("[{{ x }}]", &Value::from(vec![1, 2])), "[]");
}

#[test]
fn test_canonical_forms() {
    assert_eq!(
        render_json(
            "{{ n }}|{{ t }}|{{ f }}|{{ i }}|{{ x }}|{{ s }}",
            r#"{"n": null, "t": true, "f": false, "i": 42, "x": 2.5, "s": "str"}"#
        ),
        "|true|false|42|2.5|str"
    );
}

#[test]
fn test_integral_float_prints_without_fraction() {
    assert_eq!(render("{{ n }}", &context! { "n" => 3.0 }), "3");
    assert_eq!(render("{{ n }}", &context! { "n" => -0.5 }), "-0.5");
}

#[test]
fn test_composite_values_render_as_json() {
    assert_eq!(
        render_json(
            "{{ list }} {{ obj }}",
            r#"{"list": [1, "a", null, true], "obj": {"z": 1, "a": [2]}}"#
        ),
        r#"[1,"a",null,true] {"z":1,"a":[2]}"#
    );
}

#[test]
fn test_literal_interpolation() {
    assert_eq!(render("{{ 'lit' }}{{ 7 }}{{ null }}", &Value::Null), "lit7");
}

#[test]
fn test_strict_resolution() {
    let engine = Engine::builder().resolution(Resolution::Strict).build();
    let err = engine.render_str("ok\n{{ user.name }}", &context! { "user" => context! {} });
    match err {
        Err(Error::Eval {
            source: EvalError::Unresolved { path, position },
            ..
        }) => {
            assert_eq!(path, "user.name");
            assert_eq!((position.line, position.column), (2, 4));
        }
        other => panic!("expected unresolved, got {other:?}"),
    }
}

#[test]
fn test_strict_resolution_allows_present_null() {
    let engine = Engine::builder().resolution(Resolution::Strict).build();
    assert_eq!(
        engine
            .render_str("[{{ x }}]", &context! { "x" => Value::Null })
            .unwrap(),
        "[]"
    );
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn test_if_else() {
    let source = "{% if urgent %}URGENT{% else %}normal{% endif %}";
    assert_eq!(render(source, &context! { "urgent" => true }), "URGENT");
    assert_eq!(render(source, &context! { "urgent" => false }), "normal");
    assert_eq!(render(source, &Value::Null), "normal");
}

#[test]
fn test_first_true_branch_wins() {
    let source = "{% if n > 10 %}big{% elif n > 5 %}medium{% elif n > 0 %}small{% else %}none{% endif %}";
    assert_eq!(render(source, &context! { "n" => 20 }), "big");
    assert_eq!(render(source, &context! { "n" => 7 }), "medium");
    assert_eq!(render(source, &context! { "n" => 1 }), "small");
    assert_eq!(render(source, &context! { "n" => 0 }), "none");
}

#[test]
fn test_no_branch_renders_nothing() {
    assert_eq!(render("a{% if x %}b{% endif %}c", &Value::Null), "ac");
}

#[test]
fn test_truthiness() {
    let ctx = Value::from_json(
        r#"{"zero": 0, "empty": "", "list": [], "obj": {}, "text": "0", "one": [0], "neg": -1}"#,
    )
    .unwrap();
    let truthy = |name: &str| {
        render(&format!("{{% if {name} %}}T{{% else %}}F{{% endif %}}"), &ctx)
    };
    assert_eq!(truthy("zero"), "F");
    assert_eq!(truthy("empty"), "F");
    assert_eq!(truthy("list"), "F");
    assert_eq!(truthy("obj"), "F");
    assert_eq!(truthy("missing"), "F");
    assert_eq!(truthy("text"), "T");
    assert_eq!(truthy("one"), "T");
    assert_eq!(truthy("neg"), "T");
}

#[test]
fn test_boolean_operators() {
    let ctx = context! { "a" => true, "b" => false };
    assert_eq!(render("{{ a and b }} {{ a or b }} {{ not b }}", &ctx), "false true true");
    assert_eq!(render("{{ not (a and b) }}", &ctx), "true");
}

#[test]
fn test_boolean_operators_return_bool() {
    assert_eq!(render("{{ name or 'anon' }}", &context! { "name" => "x" }), "true");
}

#[test]
fn test_or_short_circuits_errors() {
    assert_eq!(render("{{ true or 1 < 'a' }}", &Value::Null), "true");
    assert_eq!(render("{{ false and 1 < 'a' }}", &Value::Null), "false");
}

// =============================================================================
// Comparisons
// =============================================================================

#[test]
fn test_number_comparisons() {
    let ctx = context! { "count" => 3 };
    assert_eq!(
        render(
            "{{ count == 3 }} {{ count != 3 }} {{ count < 3 }} {{ count <= 3 }} {{ count > 2.5 }} {{ count >= 4 }}",
            &ctx
        ),
        "true false false true true false"
    );
}

#[test]
fn test_string_comparisons() {
    let ctx = context! { "role" => "admin" };
    assert_eq!(render("{{ role == 'admin' }}", &ctx), "true");
    assert_eq!(render("{{ role < 'b' }} {{ 'B' < 'a' }}", &ctx), "true true");
}

#[test]
fn test_mixed_kinds_are_never_equal() {
    let ctx = context! { "n" => 1, "s" => "1" };
    assert_eq!(render("{{ n == s }} {{ n != s }}", &ctx), "false true");
    assert_eq!(render("{{ missing == null }}", &ctx), "true");
    assert_eq!(render("{{ 0 == false }}", &ctx), "false");
}

#[test]
fn test_composite_equality() {
    let ctx = Value::from_json(r#"{"a": [1, {"k": "v"}], "b": [1, {"k": "v"}], "c": [1]}"#).unwrap();
    assert_eq!(render("{{ a == b }} {{ a == c }}", &ctx), "true false");
}

#[test]
fn test_ordering_mixed_kinds_is_an_error() {
    let err = eval_error("{% if n < 'x' %}{% endif %}", &context! { "n" => 1 });
    assert_eq!(
        err,
        EvalError::Incomparable {
            op: CompareOp::Lt,
            lhs: "number",
            rhs: "string",
            position: err.position(),
        }
    );
    assert_eq!(err.position().column, 9);
}

#[test]
fn test_ordering_null_is_an_error() {
    assert!(matches!(
        eval_error("{{ missing > 1 }}", &Value::Null),
        EvalError::Incomparable { lhs: "null", .. }
    ));
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn test_loop_over_array() {
    assert_eq!(
        render(
            "{% for item in items %}- {{ item }}\n{% endfor %}",
            &context! { "items" => vec!["a", "b", "c"] }
        ),
        "- a\n- b\n- c\n"
    );
}

#[test]
fn test_loop_with_index() {
    assert_eq!(
        render(
            "{% for i, item in items %}{{ i }}={{ item }};{% endfor %}",
            &context! { "items" => vec!["x", "y"] }
        ),
        "0=x;1=y;"
    );
}

#[test]
fn test_loop_over_object_values() {
    assert_eq!(
        render_json(
            "{% for v in config %}{{ v }},{% endfor %}",
            r#"{"config": {"b": 1, "a": 2}}"#
        ),
        "1,2,"
    );
}

#[test]
fn test_loop_over_object_entries() {
    assert_eq!(
        render_json(
            "{% for key, value in config %}{{ key }}:{{ value }} {% endfor %}",
            r#"{"config": {"model": "m", "temperature": 0.2}}"#
        ),
        "model:m temperature:0.2 "
    );
}

#[test]
fn test_loop_over_null_or_missing() {
    assert_eq!(render("[{% for x in nothing %}{{ x }}{% endfor %}]", &Value::Null), "[]");
    assert_eq!(
        render("[{% for x in items %}{{ x }}{% endfor %}]", &context! { "items" => Value::Null }),
        "[]"
    );
}

#[test]
fn test_loop_over_empty_array() {
    assert_eq!(
        render(
            "[{% for x in items %}{{ x }}{% endfor %}]",
            &context! { "items" => Vec::<i32>::new() }
        ),
        "[]"
    );
}

#[test]
fn test_loop_over_scalar_is_an_error() {
    assert!(matches!(
        eval_error("{% for x in n %}{% endfor %}", &context! { "n" => 5 }),
        EvalError::NotIterable { kind: "number", .. }
    ));
    assert!(matches!(
        eval_error("{% for c in 'abc' %}{% endfor %}", &Value::Null),
        EvalError::NotIterable { kind: "string", .. }
    ));
}

#[test]
fn test_loop_binding_shadows_and_restores() {
    let ctx = context! { "item" => "outer", "items" => vec!["inner"] };
    assert_eq!(
        render(
            "{{ item }}|{% for item in items %}{{ item }}{% endfor %}|{{ item }}",
            &ctx
        ),
        "outer|inner|outer"
    );
}

#[test]
fn test_loop_binding_is_unbound_after_loop() {
    assert_eq!(
        render(
            "{% for x in xs %}{% endfor %}[{{ x }}]",
            &context! { "xs" => vec![1] }
        ),
        "[]"
    );
}

#[test]
fn test_nested_loops_see_outer_binding() {
    let ctx = Value::from_json(r#"{"groups": [{"name": "g1", "items": [1, 2]}, {"name": "g2", "items": [3]}]}"#)
        .unwrap();
    assert_eq!(
        render(
            "{% for g in groups %}{% for i in g.items %}{{ g.name }}:{{ i }} {% endfor %}{% endfor %}",
            &ctx
        ),
        "g1:1 g1:2 g2:3 "
    );
}

#[test]
fn test_loop_element_paths() {
    let ctx = Value::from_json(r#"{"users": [{"name": "Ada", "admin": true}, {"name": "Bob", "admin": false}]}"#)
        .unwrap();
    assert_eq!(
        render(
            "{% for u in users %}{% if u.admin %}*{% endif %}{{ u.name }} {% endfor %}",
            &ctx
        ),
        "*Ada Bob "
    );
}

// =============================================================================
// Failure
// =============================================================================

#[test]
fn test_no_partial_output_on_error() {
    let result = Engine::new().render_str(
        "rendered text {% for x in n %}{% endfor %}",
        &context! { "n" => true },
    );
    assert!(matches!(result, Err(Error::Eval { .. })));
}

#[test]
fn test_deeply_nested_template_is_a_parse_error() {
    let depth = MAX_NESTING_DEPTH + 1;
    let source = format!(
        "{}x{}",
        "{% if a %}".repeat(depth),
        "{% endif %}".repeat(depth)
    );
    let err = Engine::new()
        .render_str(&source, &context! { "a" => true })
        .unwrap_err();
    assert!(err.is_static());
}

#[test]
fn test_nesting_at_the_limit_renders() {
    let source = format!(
        "{}x{}",
        "{% if a %}".repeat(MAX_NESTING_DEPTH),
        "{% endif %}".repeat(MAX_NESTING_DEPTH)
    );
    assert_eq!(render(&source, &context! { "a" => true }), "x");
}

#[test]
fn test_static_errors_surface_from_render_str() {
    let err = Engine::new()
        .render_str("{% if %}", &Value::Null)
        .unwrap_err();
    assert!(err.is_static());
}

#[test]
fn test_rendering_is_repeatable() {
    let engine = Engine::new();
    let template = engine
        .parse_str("{% for x in xs %}{{ x }}{% endfor %}", "t.pmd")
        .unwrap();
    let first = engine.render(&template, &context! { "xs" => vec![1, 2] }).unwrap();
    let second = engine.render(&template, &context! { "xs" => vec![3] }).unwrap();
    assert_eq!((first.as_str(), second.as_str()), ("12", "3"));
}
