//! Integration tests for cfml-lower crate: the whole pipeline from source
//! to AST, with attribute validation.

use cfml_diagnostic::{DiagnosticKind, ErrorCode};
use cfml_lower::{AttributePolicy, LowerOptions, parse_script, validate_statement};
use cfml_parser::ParseOptions;
use cfml_syntax::{
    ComponentKind, Expression, ExpressionKind, Statement, StatementKind, TagKind,
};

fn root(source: &str) -> Statement {
    let output = parse_script(source, &ParseOptions::new(), &LowerOptions::new());
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
    output.root.expect("non-empty script")
}

fn component_body(source: &str) -> Vec<Statement> {
    match root(source).kind {
        StatementKind::Component(component) => component.body,
        other => panic!("expected component, got {other:?}"),
    }
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_component_with_members() {
    let source = r#"
component extends="Base" output=false {
    property name="id" type="numeric";
    property string title;

    public function init() {
        return this;
    }
}
"#;
    let StatementKind::Component(component) = root(source).kind else {
        panic!("expected component");
    };
    assert_eq!(component.kind, ComponentKind::Component);
    assert_eq!(
        component.attributes.get("extends").and_then(Expression::as_string),
        Some("Base")
    );
    assert_eq!(component.body.len(), 3);
    assert!(matches!(component.body[2].kind, StatementKind::FunctionDecl(_)));
}

#[test]
fn test_interface_signatures() {
    let StatementKind::Component(component) =
        root("interface { function run(); function stop(); }").kind
    else {
        panic!("expected interface");
    };
    assert_eq!(component.kind, ComponentKind::Interface);
    for member in &component.body {
        let StatementKind::FunctionDecl(func) = &member.kind else {
            panic!("expected function");
        };
        assert!(func.body.is_none());
    }
}

#[test]
fn test_properties_in_order() {
    let body = component_body("component { property a; property string b; property name=\"c\"; }");
    let names: Vec<String> = body
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::Property(p) => Some(p.expanded()),
            _ => None,
        })
        .filter_map(|p| p.attributes.get("name").and_then(|e| e.as_string().map(String::from)))
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_tag_statement_without_body() {
    let StatementKind::Tag(tag) = root("param name=\"x\" default=1;").kind else {
        panic!("expected tag");
    };
    assert_eq!(tag.tag, TagKind::Param);
    assert!(tag.body.is_none());
}

#[test]
fn test_closure_argument() {
    let StatementKind::Expression(expr) = root("items.each(function(item) { total += item; });").kind
    else {
        panic!("expected expression statement");
    };
    let ExpressionKind::Call { args, .. } = expr.kind else {
        panic!("expected call");
    };
    assert!(matches!(args[0].value.kind, ExpressionKind::Function(_)));
}

#[test]
fn test_spans_ignored_in_equality() {
    assert_eq!(root("x=1+2;"), root("x  =  1 + 2 ;"));
    assert_ne!(root("x = 1 + 2;"), root("x = (1 + 2);"));
}

#[test]
fn test_comments_do_not_reach_ast() {
    assert_eq!(root("/* a */ x = 1; // b"), root("x = 1;"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_nested_unknown_attribute_line() {
    let source = "component {\n\n    function f() {\n        lock name=\"a\" colour=\"red\" { }\n    }\n}";
    let output = parse_script(source, &ParseOptions::new(), &LowerOptions::new());
    assert_eq!(output.diagnostics.len(), 1);
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::Validation);
    assert_eq!(diagnostic.code, Some(ErrorCode::UnknownAttribute));
    assert_eq!(diagnostic.line, 4);
}

#[test]
fn test_deny_policy_errors_but_keeps_ast() {
    let options = LowerOptions::new().with_policy(AttributePolicy::Deny);
    let output = parse_script("property name=\"a\" colour=\"red\";", &ParseOptions::new(), &options);
    assert!(output.has_errors());
    assert!(output.root.is_some());
}

#[test]
fn test_ignore_policy_is_silent() {
    let options = LowerOptions::new().with_policy(AttributePolicy::Ignore);
    let output = parse_script(
        "component colour=\"red\" { property size=1; }",
        &ParseOptions::new(),
        &options,
    );
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_dictionary_extends_valid_sets() {
    let orm = |element: &str, attribute: &str| {
        element == "component" && attribute.eq_ignore_ascii_case("orm")
    };
    let options = LowerOptions::new().with_dictionary(&orm);
    let output = parse_script("component orm=true {}", &ParseOptions::new(), &options);
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_validate_after_edit() {
    let mut stmt = root("property name=\"a\";");
    if let StatementKind::Property(prop) = &mut stmt.kind {
        prop.attributes.insert(
            cfml_syntax::Identifier::synthetic("colour"),
            Expression::string("red"),
        );
    }
    let found = validate_statement(&stmt, &LowerOptions::new());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].context, "colour");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_syntax_error_keeps_good_statements() {
    let output = parse_script("a = 1;\nb = ;\nc = 3;", &ParseOptions::new(), &LowerOptions::new());
    assert!(output.has_errors());
    let Some(Statement {
        kind: StatementKind::ScriptBlock(items),
        ..
    }) = output.root
    else {
        panic!("expected script block");
    };
    assert_eq!(items.len(), 2);
}

#[test]
fn test_diagnostic_records() {
    let output = parse_script("x = \"open", &ParseOptions::new(), &LowerOptions::new());
    let record = output.diagnostics[0].record();
    assert_eq!(record.line, 1);
    assert_eq!(record.start_offset, 4);
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"line\":1"));
}
