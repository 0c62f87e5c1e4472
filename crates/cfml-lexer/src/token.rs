//! Token definitions for CFML script.
//! CFML 脚本的 token 定义。

use cfml_common::Span;
use logos::Logos;

/// A token with its kind, source text, and position.
/// 带有种类、源文本和位置的 token。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    /// 1-based line of the first character.
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
            line,
        }
    }

    pub fn eof(offset: usize, line: u32) -> Self {
        Self::new(TokenKind::Eof, "", Span::point(offset.into()), line)
    }

    /// Case-insensitive comparison of the lexeme against a word.
    pub fn is_word_named(&self, word: &str) -> bool {
        self.kind.is_word() && self.lexeme.eq_ignore_ascii_case(word)
    }
}

/// The kind of a token.
/// token 的种类。
///
/// Keywords and word operators match regardless of letter case.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    // Keywords
    #[token("function", ignore(ascii_case))]
    Function,
    #[token("var", ignore(ascii_case))]
    Var,
    #[token("if", ignore(ascii_case))]
    If,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("for", ignore(ascii_case))]
    For,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("while", ignore(ascii_case))]
    While,
    #[token("do", ignore(ascii_case))]
    Do,
    #[token("switch", ignore(ascii_case))]
    Switch,
    #[token("case", ignore(ascii_case))]
    Case,
    #[token("default", ignore(ascii_case))]
    Default,
    #[token("break", ignore(ascii_case))]
    Break,
    #[token("continue", ignore(ascii_case))]
    Continue,
    #[token("return", ignore(ascii_case))]
    Return,
    #[token("try", ignore(ascii_case))]
    Try,
    #[token("catch", ignore(ascii_case))]
    Catch,
    #[token("finally", ignore(ascii_case))]
    Finally,
    #[token("throw", ignore(ascii_case))]
    Throw,
    #[token("new", ignore(ascii_case))]
    New,
    #[token("import", ignore(ascii_case))]
    Import,
    #[token("component", ignore(ascii_case))]
    Component,
    #[token("interface", ignore(ascii_case))]
    Interface,
    #[token("property", ignore(ascii_case))]
    Property,
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,
    #[token("null", ignore(ascii_case))]
    Null,

    // Word operators
    #[token("eq", ignore(ascii_case))]
    EqWord,
    #[token("neq", ignore(ascii_case))]
    NeqWord,
    #[token("is", ignore(ascii_case))]
    Is,
    #[token("gt", ignore(ascii_case))]
    GtWord,
    #[token("gte", ignore(ascii_case))]
    GteWord,
    #[token("ge", ignore(ascii_case))]
    GeWord,
    #[token("lt", ignore(ascii_case))]
    LtWord,
    #[token("lte", ignore(ascii_case))]
    LteWord,
    #[token("le", ignore(ascii_case))]
    LeWord,
    #[token("contains", ignore(ascii_case))]
    Contains,
    #[token("does", ignore(ascii_case))]
    Does,
    #[token("contain", ignore(ascii_case))]
    Contain,
    #[token("mod", ignore(ascii_case))]
    ModWord,
    #[token("and", ignore(ascii_case))]
    AndWord,
    #[token("or", ignore(ascii_case))]
    OrWord,
    #[token("not", ignore(ascii_case))]
    NotWord,
    #[token("xor", ignore(ascii_case))]
    Xor,
    #[token("eqv", ignore(ascii_case))]
    Eqv,
    #[token("imp", ignore(ascii_case))]
    Imp,

    // Literals
    #[token("\"", |lex| quoted(lex, b'"'))]
    #[token("'", |lex| quoted(lex, b'\''))]
    StringLiteral,
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,

    // Identifiers
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Punctuation
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("?:")]
    Elvis,
    #[token("?.")]
    SafeDot,
    #[token("=>")]
    Arrow,

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("===")]
    EqEqEq,
    #[token("!=")]
    BangEq,
    #[token("!==")]
    BangEqEq,
    #[token("<>")]
    LtGt,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("\\")]
    Backslash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,

    // Trivia
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    // Special
    Eof,
    Error,
}

/// Consume the rest of a quoted string; a doubled quote is an escaped quote.
/// Returns false when the input ends before the closing quote.
fn quoted(lex: &mut logos::Lexer<'_, TokenKind>, quote: u8) -> bool {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            lex.bump(i + 1);
            return true;
        }
        i += 1;
    }
    lex.bump(rest.len());
    false
}

fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(rest.len());
            false
        }
    }
}

impl TokenKind {
    /// Stable upper-case name, used by token listings.
    /// 用于 token 列表的稳定大写名称。
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Function => "FUNCTION",
            TokenKind::Var => "VAR",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::For => "FOR",
            TokenKind::In => "IN",
            TokenKind::While => "WHILE",
            TokenKind::Do => "DO",
            TokenKind::Switch => "SWITCH",
            TokenKind::Case => "CASE",
            TokenKind::Default => "DEFAULT",
            TokenKind::Break => "BREAK",
            TokenKind::Continue => "CONTINUE",
            TokenKind::Return => "RETURN",
            TokenKind::Try => "TRY",
            TokenKind::Catch => "CATCH",
            TokenKind::Finally => "FINALLY",
            TokenKind::Throw => "THROW",
            TokenKind::New => "NEW",
            TokenKind::Import => "IMPORT",
            TokenKind::Component => "COMPONENT",
            TokenKind::Interface => "INTERFACE",
            TokenKind::Property => "PROPERTY",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Null => "NULL",
            TokenKind::EqWord => "EQ",
            TokenKind::NeqWord => "NEQ",
            TokenKind::Is => "IS",
            TokenKind::GtWord => "GT",
            TokenKind::GteWord => "GTE",
            TokenKind::GeWord => "GE",
            TokenKind::LtWord => "LT",
            TokenKind::LteWord => "LTE",
            TokenKind::LeWord => "LE",
            TokenKind::Contains => "CONTAINS",
            TokenKind::Does => "DOES",
            TokenKind::Contain => "CONTAIN",
            TokenKind::ModWord => "MOD",
            TokenKind::AndWord => "AND",
            TokenKind::OrWord => "OR",
            TokenKind::NotWord => "NOT",
            TokenKind::Xor => "XOR",
            TokenKind::Eqv => "EQV",
            TokenKind::Imp => "IMP",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::Integer => "INTEGER_LITERAL",
            TokenKind::Float => "FLOATING_POINT_LITERAL",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::LParen => "LEFTPAREN",
            TokenKind::RParen => "RIGHTPAREN",
            TokenKind::LBrace => "LEFTCURLYBRACKET",
            TokenKind::RBrace => "RIGHTCURLYBRACKET",
            TokenKind::LBracket => "LEFTBRACKET",
            TokenKind::RBracket => "RIGHTBRACKET",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Colon => "COLON",
            TokenKind::Dot => "DOT",
            TokenKind::Question => "QUESTIONMARK",
            TokenKind::Elvis => "ELVIS",
            TokenKind::SafeDot => "SAFE_NAVIGATION",
            TokenKind::Arrow => "ARROW",
            TokenKind::Assign => "EQUALSOP",
            TokenKind::EqEq => "EQUALS",
            TokenKind::EqEqEq => "EQUALS_STRICT",
            TokenKind::BangEq => "NOT_EQUALS",
            TokenKind::BangEqEq => "NOT_EQUALS_STRICT",
            TokenKind::LtGt => "LESS_GREATER",
            TokenKind::Lt => "LESSTHAN",
            TokenKind::LtEq => "LESSTHANEQUALS",
            TokenKind::Gt => "GREATERTHAN",
            TokenKind::GtEq => "GREATERTHANEQUALS",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Backslash => "BSLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Caret => "POWER",
            TokenKind::Amp => "CONCAT",
            TokenKind::PlusPlus => "PLUSPLUS",
            TokenKind::MinusMinus => "MINUSMINUS",
            TokenKind::PlusEq => "PLUSEQUALS",
            TokenKind::MinusEq => "MINUSEQUALS",
            TokenKind::StarEq => "STAREQUALS",
            TokenKind::SlashEq => "SLASHEQUALS",
            TokenKind::PercentEq => "MODEQUALS",
            TokenKind::AmpEq => "CONCATEQUALS",
            TokenKind::AndAnd => "ANDOPERATOR",
            TokenKind::OrOr => "OROPERATOR",
            TokenKind::Bang => "NOTOP",
            TokenKind::LineComment => "LINE_COMMENT",
            TokenKind::BlockComment => "ML_COMMENT",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "ERROR",
        }
    }

    /// Human-readable form used in parser messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Assign => "'='",
            TokenKind::Arrow => "'=>'",
            TokenKind::In => "'in'",
            TokenKind::While => "'while'",
            TokenKind::Function => "'function'",
            TokenKind::NotWord => "'not'",
            TokenKind::Contain => "'contain'",
            TokenKind::Identifier => "identifier",
            TokenKind::StringLiteral => "string",
            TokenKind::Eof => "end of input",
            _ => self.name(),
        }
    }

    /// Returns true if this token is a keyword (including word operators).
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::Var
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::In
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Throw
                | TokenKind::New
                | TokenKind::Import
                | TokenKind::Component
                | TokenKind::Interface
                | TokenKind::Property
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::EqWord
                | TokenKind::NeqWord
                | TokenKind::Is
                | TokenKind::GtWord
                | TokenKind::GteWord
                | TokenKind::GeWord
                | TokenKind::LtWord
                | TokenKind::LteWord
                | TokenKind::LeWord
                | TokenKind::Contains
                | TokenKind::Does
                | TokenKind::Contain
                | TokenKind::ModWord
                | TokenKind::AndWord
                | TokenKind::OrWord
                | TokenKind::NotWord
                | TokenKind::Xor
                | TokenKind::Eqv
                | TokenKind::Imp
        )
    }

    /// Identifiers and keywords: anything usable as an attribute name,
    /// member name, or struct key.
    pub fn is_word(&self) -> bool {
        *self == TokenKind::Identifier || self.is_keyword()
    }

    /// Comments; present in the token list but not seen by the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_assignment_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::AmpEq
        )
    }
}

/// Render tokens one per line as `NAME:lexeme`, the encoding of a fixture's
/// `TOKENS` section. The end-of-input token is not listed.
/// 以 `NAME:lexeme` 形式逐行输出 token。
pub fn token_listing(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| format!("{}:{}", t.kind.name(), t.lexeme))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lexer;

    #[test]
    fn test_token_listing() {
        let (tokens, _) = Lexer::new("property name='x'; // done").tokenize();
        assert_eq!(
            token_listing(&tokens),
            "PROPERTY:property\nIDENTIFIER:name\nEQUALSOP:=\nSTRING_LITERAL:'x'\nSEMICOLON:;\nLINE_COMMENT:// done"
        );
    }

    #[test]
    fn test_word_classes() {
        assert!(TokenKind::Identifier.is_word());
        assert!(TokenKind::Default.is_word());
        assert!(TokenKind::ModWord.is_keyword());
        assert!(!TokenKind::Integer.is_word());
        assert!(TokenKind::BlockComment.is_trivia());
        assert!(TokenKind::AmpEq.is_assignment_op());
    }
}
