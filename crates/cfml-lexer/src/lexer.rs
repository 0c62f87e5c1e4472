//! The CFML script lexer.
//! CFML 脚本词法分析器。

use crate::token::{Token, TokenKind};
use cfml_common::{LineIndex, Span};
use cfml_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use logos::Logos;

/// The CFML script lexer.
/// CFML 脚本词法分析器。
///
/// Wraps the logos-generated scanner, attaching lexemes and line numbers to
/// each token and turning unrecognized input into `Error` tokens.
/// 包装 logos 生成的扫描器，为每个 token 附加词素和行号，并将无法识别的输入转换为 `Error` token。
pub struct Lexer<'src> {
    /// The source being scanned
    /// 正在扫描的源码
    source: &'src str,
    /// Underlying logos scanner
    /// 底层 logos 扫描器
    inner: logos::Lexer<'src, TokenKind>,
    /// Line starts of the source
    /// 源码的行起始位置
    lines: LineIndex,
    /// Set once `Eof` has been produced
    /// 产生 `Eof` 后置位
    finished: bool,
    /// Collected diagnostics
    /// 收集的诊断信息
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code.
    /// 为给定的源代码创建新的词法分析器。
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            finished: false,
            diagnostics: Vec::new(),
        }
    }

    /// Rewind to the start of the same source.
    /// 回到同一源码的开头。
    pub fn reset(&mut self) {
        self.inner = TokenKind::lexer(self.source);
        self.finished = false;
        self.diagnostics.clear();
    }

    /// Diagnostics raised so far.
    /// 目前产生的诊断信息。
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Tokenize the entire source and return tokens and diagnostics.
    /// 对整个源代码进行词法分析，返回 token 列表和诊断信息。
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    /// Produce the next token. After the end of input this keeps returning `Eof`.
    /// 产生下一个 token。输入结束后持续返回 `Eof`。
    pub fn next_token(&mut self) -> Token {
        let Some(result) = self.inner.next() else {
            self.finished = true;
            let end = self.source.len();
            return Token::eof(end, self.lines.line(end));
        };

        let range = self.inner.span();
        let lexeme = self.inner.slice();
        let span = Span::from(range.clone());
        let line = self.lines.line(range.start);

        match result {
            Ok(kind) => Token::new(kind, lexeme, span, line),
            Err(()) => {
                self.report(lexeme, span, line);
                Token::new(TokenKind::Error, lexeme, span, line)
            }
        }
    }

    fn report(&mut self, lexeme: &str, span: Span, line: u32) {
        let (code, label) = if lexeme.starts_with('"') || lexeme.starts_with('\'') {
            (ErrorCode::UnterminatedString, "string starts here")
        } else if lexeme.starts_with("/*") {
            (ErrorCode::UnterminatedComment, "comment starts here")
        } else {
            (ErrorCode::UnexpectedCharacter, "not valid here")
        };

        let message = match code {
            ErrorCode::UnexpectedCharacter => format!("unexpected character '{}'", lexeme),
            _ => code.description().to_string(),
        };
        let label_span = if code == ErrorCode::UnexpectedCharacter {
            span
        } else {
            Span::from_usize(span.range().start, span.range().start + 1)
        };

        let context: String = lexeme.lines().next().unwrap_or_default().to_string();
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Lexer, span, message)
                .with_code(code)
                .with_label(Label::new(label_span, label))
                .at_line(line)
                .with_context(context),
        );
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_ignore_case() {
        assert_eq!(
            kinds("FUNCTION function Function"),
            vec![
                TokenKind::Function,
                TokenKind::Function,
                TokenKind::Function,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            kinds("index isDefined"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_word_operators() {
        assert_eq!(
            kinds("a GTE b does not contain c"),
            vec![
                TokenKind::Identifier,
                TokenKind::GteWord,
                TokenKind::Identifier,
                TokenKind::Does,
                TokenKind::NotWord,
                TokenKind::Contain,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_strings_with_doubled_quotes() {
        let (tokens, diagnostics) = Lexer::new(r#""say ""hi""" 'it''s'"#).tokenize();
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].lexeme, r#""say ""hi""""#);
        assert_eq!(tokens[1].lexeme, "'it''s'");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 1.5 1e3 2.5E-3"),
            vec![
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_tokens() {
        assert_eq!(
            kinds("a // line\n/* block\n */ b"),
            vec![
                TokenKind::Identifier,
                TokenKind::LineComment,
                TokenKind::BlockComment,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("=== !== <> ?: ?. => &= ++"),
            vec![
                TokenKind::EqEqEq,
                TokenKind::BangEqEq,
                TokenKind::LtGt,
                TokenKind::Elvis,
                TokenKind::SafeDot,
                TokenKind::Arrow,
                TokenKind::AmpEq,
                TokenKind::PlusPlus,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let (tokens, _) = Lexer::new("a\nb\n\nc").tokenize();
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diagnostics) = Lexer::new("x = \"open").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Some(ErrorCode::UnterminatedString));
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_unterminated_comment() {
        let (tokens, diagnostics) = Lexer::new("/* never closed").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(diagnostics[0].code, Some(ErrorCode::UnterminatedComment));
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diagnostics) = Lexer::new("a @ b").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "@");
        assert_eq!(diagnostics[0].code, Some(ErrorCode::UnexpectedCharacter));
        assert_eq!(diagnostics[0].line, 1);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut lexer = Lexer::new("a b");
        let first = lexer.next_token();
        lexer.next_token();
        lexer.reset();
        assert_eq!(lexer.next_token(), first);
    }
}
