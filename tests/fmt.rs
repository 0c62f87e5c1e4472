//! Integration tests for cfml-fmt crate: decompiling, formatting, and the
//! round trip back through the parser.

use cfml_fmt::{Decompile, FormatConfig, FormatError, check, format, format_with_config};
use cfml_lower::{AttributePolicy, LowerOptions, parse_script};
use cfml_parser::ParseOptions;
use cfml_syntax::{Statement, StatementKind};
use proptest::prelude::*;

fn ast(source: &str) -> Option<Statement> {
    let options = LowerOptions::new().with_policy(AttributePolicy::Ignore);
    let output = parse_script(source, &ParseOptions::new(), &options);
    assert!(!output.has_errors(), "{source}: {:?}", output.diagnostics);
    output.root
}

fn assert_round_trip(source: &str) {
    let formatted = format(source).unwrap();
    assert_eq!(ast(source), ast(&formatted), "{source}\n=>\n{formatted}");
    assert_eq!(format(&formatted).unwrap(), formatted, "{formatted}");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_full_property() {
    let Some(stmt) = ast("property name=\"foo\" type=\"string\";") else {
        panic!("expected a statement");
    };
    let StatementKind::Property(prop) = &stmt.kind else {
        panic!("expected property");
    };
    assert_eq!(prop.decompile(0), "property name=\"foo\" type=\"string\"");
    assert_eq!(stmt.decompile(0), "property name=\"foo\" type=\"string\"");
}

#[test]
fn test_shorthand_property() {
    let Some(stmt) = ast("property string foo;") else {
        panic!("expected a statement");
    };
    assert_eq!(stmt.decompile(0), "property string foo");
}

#[test]
fn test_shorthand_cleared_still_parses() {
    let Some(mut stmt) = ast("property string foo default=\"x\";") else {
        panic!("expected a statement");
    };
    let StatementKind::Property(prop) = &mut stmt.kind else {
        panic!("expected property");
    };
    prop.set_shorthand(false).unwrap();
    let text = stmt.decompile(0);
    assert_eq!(text, "property name=\"foo\" type=\"string\" default=\"x\"");

    let Some(reparsed) = ast(&format!("{text};")) else {
        panic!("expected a statement");
    };
    assert_eq!(reparsed, stmt);
}

#[test]
fn test_attributes_in_canonical_order() {
    assert_eq!(
        format("property type=\"string\" name=\"foo\";").unwrap(),
        "property name=\"foo\" type=\"string\";\n"
    );
    assert_eq!(
        format("property default=1 colour=\"red\" name=\"n\";").unwrap(),
        "property name=\"n\" default=1 colour=\"red\";\n"
    );
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_component_layout() {
    let source = "component extends=\"Base\" { property string title; function getTitle() { return variables.title; } }";
    assert_eq!(
        format(source).unwrap(),
        "component extends=\"Base\" {\n\tproperty string title;\n\tfunction getTitle() {\n\t\treturn variables.title;\n\t}\n}\n"
    );
}

#[test]
fn test_space_indentation() {
    let config = FormatConfig::new().use_tabs(false).indent_width(2);
    assert_eq!(
        format_with_config("if (a) { b(); }", &config).unwrap(),
        "if (a) {\n  b();\n}\n"
    );
}

#[test]
fn test_without_trailing_newline() {
    let config = FormatConfig::new().trailing_newline(false);
    assert_eq!(format_with_config("x=1", &config).unwrap(), "x = 1;");
}

#[test]
fn test_switch_layout() {
    assert_eq!(
        format("switch (x) { case 1: a(); break; default: b(); }").unwrap(),
        "switch (x) {\n\tcase 1:\n\t\ta();\n\t\tbreak;\n\tdefault:\n\t\tb();\n}\n"
    );
}

#[test]
fn test_decompile_nested_indent() {
    let Some(stmt) = ast("while (true) { x++; }") else {
        panic!("expected a statement");
    };
    assert_eq!(stmt.decompile(1), "while (true) {\n\t\tx++;\n\t}");
}

#[test]
fn test_check() {
    let config = FormatConfig::default();
    assert!(check("x = 1;\n", &config).unwrap());
    assert!(!check("x=1;", &config).unwrap());
    assert!(matches!(check("x = ;", &config), Err(FormatError::Syntax(_))));
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_round_trip_statements() {
    for source in [
        "x = 1;",
        "var total = a + b * c - (d / e);",
        "if (a GT b) { x = 1; } else if (a EQ b) { x = 2; } else { x = 3; }",
        "while (i < 10) i++;",
        "do { i--; } while (i > 0);",
        "for (var i = 1; i <= 10; i += 1) { total &= i; }",
        "for (key in data) { writeOutput(key); }",
        "switch (x) { case 1: a(); break; case \"b\": b(); default: c(); }",
        "try { risky(); } catch (any e) { log(e.message); } finally { done = true; }",
        "function add(required numeric a, b = 2) { return a + b; }",
        "interface { function run(); }",
        "lock name=\"cache\" type=\"exclusive\" timeout=5 { cache[key] = value; }",
        "param name=\"url.page\" default=1;",
        "import com.example.Util;",
        "include \"header.cfm\";",
        "abort;",
        "throw \"oops\";",
        "exit;",
        "setting requesttimeout=30;",
        "savecontent variable=\"out\" { writeOutput(\"hi\"); }",
    ] {
        assert_round_trip(source);
    }
}

#[test]
fn test_round_trip_expressions() {
    for source in [
        "result = items.map((item) => item * 2).filter(function(x) { return x > 1; });",
        "s = { name: \"a\", \"key\" = [1, 2, 3], nested: { x: true } };",
        "x = a ?: b;\ny = c ? d : e;",
        "obj = new com.example.Thing(name = \"t\", 2);",
        "flag = NOT done AND (a OR b);",
        "a.b?.c[1]++;",
        "x = - -y;",
        "s = 'it''s';",
        "x = a & b & \"c\";",
        "x = a IS NOT b OR c DOES NOT CONTAIN d;",
        "f = function() {};",
        "g = (a, b = 1) => { return a + b; };",
        "h = () => ({ a: 1 });",
        "total = x + (y) => y;",
        "call(a = b);",
        "call((a = b));",
        "x = (a = 1) + 2;",
        "x = a == NOT b;",
        "x = a + NOT b;",
        "x = a EQ NOT b & c;",
        "x = -NOT a;",
        "x = NOT a == b;",
        "x = (NOT a) == b;",
        "x = a AND NOT b OR NOT c;",
        "x = a + NOT (b == c);",
    ] {
        assert_round_trip(source);
    }
}

#[test]
fn test_round_trip_component() {
    assert_round_trip(
        r#"
/**
 * A user.
 */
component extends="Base" accessors=true {
    property name="id" type="numeric";
    property string title;

    public string function getTitle() output=false {
        return variables.title;
    }

    private void function reset() {
        for (var key in variables) {
            if (isSimpleValue(variables[key])) variables[key] = "";
        }
    }
}
"#,
    );
}

#[test]
fn test_dangling_else_preserved() {
    assert_round_trip("if (a) { if (b) x = 1; } else y = 2;");
    assert_round_trip("if (a) if (b) x = 1; else y = 2;");
    assert_eq!(
        format("if (a) { if (b) x = 1; } else y = 2;").unwrap(),
        "if (a) {\n\tif (b) x = 1;\n} else y = 2;\n"
    );
}

// ============================================================================
// Property-based
// ============================================================================

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "total", "item", "x1", "user"]).prop_map(String::from)
}

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        name(),
        (0u32..500).prop_map(|n| n.to_string()),
        "[a-z ]{0,6}".prop_map(|s| format!("\"{s}\"")),
        Just("true".to_string()),
        Just("null".to_string()),
    ]
}

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "&", "==", "!=", "<", ">=", "&&", "||", "EQ", "GT", "AND", "OR",
    "MOD", "XOR", "IS NOT", "CONTAINS",
];

fn expression() -> impl Strategy<Value = String> {
    leaf().prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(OPERATORS.to_vec()), inner.clone())
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("!({e})")),
            inner.clone().prop_map(|e| format!("NOT {e}")),
            name().prop_map(|n| format!("-{n}")),
            (name(), inner.clone()).prop_map(|(n, e)| format!("{n}.get({e})")),
            (name(), inner.clone()).prop_map(|(n, e)| format!("{n}[{e}]")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| format!("{c} ? {a} : {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} ?: {b}")),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|v| format!("[{}]", v.join(", "))),
            (name(), inner).prop_map(|(n, e)| format!("{{ {n}: {e} }}")),
        ]
    })
}

proptest! {
    #[test]
    fn prop_format_round_trips(exprs in prop::collection::vec(expression(), 1..4)) {
        let source: String = exprs
            .iter()
            .enumerate()
            .map(|(i, e)| format!("v{i} = {e};\n"))
            .collect();
        let formatted = format(&source).unwrap();
        prop_assert_eq!(ast(&source), ast(&formatted));
        prop_assert_eq!(format(&formatted).unwrap(), formatted);
    }
}
