//! Integration tests for cfml-common and cfml-diagnostic crates.

use cfml_common::{BytePos, LineIndex, Span};
use cfml_diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, ErrorCode, Label, render};

// ============================================================================
// Spans
// ============================================================================

#[test]
fn test_span_merge() {
    let a = Span::from_usize(10, 20);
    let b = Span::from_usize(15, 30);
    let merged = a.merge(b);
    assert_eq!(merged.start.0, 10);
    assert_eq!(merged.end.0, 30);
}

#[test]
fn test_span_len_and_range() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.len(), 10);
    assert_eq!(span.range(), 5..15);
    assert!(Span::DUMMY.is_empty());
}

#[test]
fn test_span_slice() {
    let source = "x = 'a';";
    assert_eq!(Span::from_usize(4, 7).slice(source), Some("'a'"));
    assert_eq!(Span::from_usize(4, 70).slice(source), None);
}

#[test]
fn test_byte_pos_offset() {
    assert_eq!(BytePos(10).offset(5), BytePos(15));
}

// ============================================================================
// Line Index
// ============================================================================

#[test]
fn test_line_lookup() {
    let index = LineIndex::new("a\nbb\r\n\nccc");
    assert_eq!(index.line_count(), 4);
    assert_eq!(index.line(0), 1);
    assert_eq!(index.line(2), 2);
    assert_eq!(index.line(6), 3);
    assert_eq!(index.line(7), 4);
    assert_eq!(index.line(1000), 4);
}

#[test]
fn test_line_text() {
    let source = "first\r\nsecond\n";
    let index = LineIndex::new(source);
    assert_eq!(index.line_text(source, 1), Some("first"));
    assert_eq!(index.line_text(source, 2), Some("second"));
    assert_eq!(index.line_text(source, 3), Some(""));
    assert_eq!(index.line_text(source, 9), None);
}

// ============================================================================
// Diagnostics
// ============================================================================

fn sample() -> Diagnostic {
    Diagnostic::error(DiagnosticKind::Parser, Span::from_usize(6, 7), "expected expression")
        .with_code(ErrorCode::ExpectedExpression)
        .with_label(Label::new(Span::from_usize(6, 7), "here"))
}

#[test]
fn test_collector_keeps_order_and_duplicates() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(sample());
    diagnostics.push(Diagnostic::warning(
        DiagnosticKind::Validation,
        Span::DUMMY,
        "unknown attribute",
    ));
    diagnostics.push(sample());
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.error_count(), 2);
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.as_slice()[1].kind, DiagnosticKind::Validation);
}

#[test]
fn test_locate_fills_line_and_context() {
    let source = "a = 1;\nb = ;";
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(Diagnostic::error(
        DiagnosticKind::Parser,
        Span::from_usize(11, 12),
        "expected expression",
    ));
    diagnostics.locate(source);
    let diagnostic = &diagnostics.as_slice()[0];
    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.context, ";");
}

#[test]
fn test_render_plain_text() {
    let source = "a = 1;\nb = ;";
    let mut diagnostic = sample();
    diagnostic.span = Span::from_usize(11, 12);
    diagnostic.labels = vec![Label::new(Span::from_usize(11, 12), "here")];
    let text = render(source, "test.cfm", &diagnostic);
    assert!(text.contains("expected expression"));
    assert!(text.contains("test.cfm"));
}

#[test]
fn test_render_unlabelled_uses_code_suggestion() {
    let source = "x = 1\ny = 2;";
    let diagnostic = Diagnostic::error(DiagnosticKind::Parser, Span::from_usize(5, 6), "missing ';'")
        .with_code(ErrorCode::MissingSemicolon);
    let text = render(source, "test.cfm", &diagnostic);
    assert!(text.contains("while parsing"));
    assert!(text.contains("add `;` at the end of the statement"));
}

#[test]
fn test_display() {
    let diagnostic = sample().at_line(3);
    assert_eq!(
        diagnostic.to_string(),
        format!("error[{}] (line 3): expected expression", ErrorCode::ExpectedExpression)
    );
}
