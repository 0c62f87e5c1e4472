//! Integration tests for cfml-lexer crate.

use cfml_diagnostic::ErrorCode;
use cfml_lexer::{Lexer, TokenKind, TokenStream, token_listing};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source).map(|t| t.kind).collect()
}

// ============================================================================
// Token Kinds
// ============================================================================

#[test]
fn test_statement_keywords() {
    assert_eq!(
        kinds("if else WHILE Return"),
        vec![
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Return,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_component_keywords() {
    assert_eq!(
        kinds("component interface property import"),
        vec![
            TokenKind::Component,
            TokenKind::Interface,
            TokenKind::Property,
            TokenKind::Import,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_literals() {
    assert_eq!(
        kinds("'a' 42 3.14 true NULL"),
        vec![
            TokenKind::StringLiteral,
            TokenKind::Integer,
            TokenKind::Float,
            TokenKind::True,
            TokenKind::Null,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_compound_assignment() {
    assert_eq!(
        kinds("a += 1; b &= 'x'"),
        vec![
            TokenKind::Identifier,
            TokenKind::PlusEq,
            TokenKind::Integer,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::AmpEq,
            TokenKind::StringLiteral,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_empty_source() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("  \n\t "), vec![TokenKind::Eof]);
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_listing_keeps_comments() {
    let (tokens, diagnostics) = Lexer::new("/* hi */ x = 1;").tokenize();
    assert!(diagnostics.is_empty());
    assert_eq!(
        token_listing(&tokens),
        "ML_COMMENT:/* hi */\nIDENTIFIER:x\nEQUALSOP:=\nINTEGER_LITERAL:1\nSEMICOLON:;"
    );
}

#[test]
fn test_listing_of_empty_source() {
    let (tokens, _) = Lexer::new("").tokenize();
    assert_eq!(token_listing(&tokens), "");
}

#[test]
fn test_listing_preserves_case() {
    let (tokens, _) = Lexer::new("PROPERTY Name").tokenize();
    assert_eq!(token_listing(&tokens), "PROPERTY:PROPERTY\nIDENTIFIER:Name");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_lexing_continues_after_error() {
    let (tokens, diagnostics) = Lexer::new("a = 1 # b").tokenize();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, Some(ErrorCode::UnexpectedCharacter));
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Integer,
            TokenKind::Error,
            TokenKind::Identifier,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_error_line_numbers() {
    let (_, diagnostics) = Lexer::new("a = 1;\nb = 2;\nc = \"open").tokenize();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 3);
}

// ============================================================================
// Stream
// ============================================================================

#[test]
fn test_stream_skips_comments() {
    let (tokens, _) = Lexer::new("a // note\nb").tokenize();
    let mut stream = TokenStream::new(&tokens);
    assert_eq!(stream.advance().lexeme, "a");
    assert_eq!(stream.current().lexeme, "b");
    assert_eq!(stream.peek(1).kind, TokenKind::Eof);
}

#[test]
fn test_stream_seek() {
    let (tokens, _) = Lexer::new("a b c").tokenize();
    let mut stream = TokenStream::new(&tokens);
    let start = stream.pos();
    stream.advance();
    stream.advance();
    assert_eq!(stream.current().lexeme, "c");
    stream.seek(start);
    assert_eq!(stream.current().lexeme, "a");
}

#[test]
fn test_stream_stays_at_eof() {
    let (tokens, _) = Lexer::new("a").tokenize();
    let mut stream = TokenStream::new(&tokens);
    stream.advance();
    assert!(stream.at_end());
    assert_eq!(stream.advance().kind, TokenKind::Eof);
    assert_eq!(stream.current().kind, TokenKind::Eof);
}
