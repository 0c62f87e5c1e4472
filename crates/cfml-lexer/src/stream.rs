//! Restartable token stream over the parser-visible tokens.
//! 可重新开始的 token 流。

use crate::token::{Token, TokenKind};

/// A cursor over the non-trivia tokens of a source, always terminated by `Eof`.
///
/// The stream can be rewound to any earlier position with [`TokenStream::seek`],
/// which is what lets a parse be retried from the start with another strategy.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    /// Build a stream from a full token list; trivia is dropped.
    pub fn new(tokens: &[Token]) -> Self {
        let mut tokens: Vec<Token> = tokens
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .cloned()
            .collect();
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (end, line) = tokens
                .last()
                .map(|t| (t.span.range().end, t.line))
                .unwrap_or((0, 1));
            tokens.push(Token::eof(end, line));
        }
        Self { tokens, pos: 0 }
    }

    /// Look `n` tokens ahead of the cursor; past the end this is `Eof`.
    pub fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// The token just before the cursor, if any.
    pub fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// Move past the current token and return it. `Eof` is never consumed.
    /// 前进一个 token 并返回它；`Eof` 不会被消耗。
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len() - 1);
    }

    pub fn at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    /// Number of tokens, `Eof` included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lexer;

    fn stream(source: &str) -> TokenStream {
        let (tokens, _) = Lexer::new(source).tokenize();
        TokenStream::new(&tokens)
    }

    #[test]
    fn test_trivia_skipped() {
        let s = stream("a /* c */ b // d");
        assert_eq!(s.len(), 3);
        assert_eq!(s.peek(1).lexeme, "b");
    }

    #[test]
    fn test_seek_and_eof() {
        let mut s = stream("x y");
        s.advance();
        s.advance();
        assert!(s.at_end());
        s.advance();
        assert!(s.at_end());
        assert_eq!(s.peek(5).kind, TokenKind::Eof);
        s.seek(0);
        assert_eq!(s.current().lexeme, "x");
    }

    #[test]
    fn test_empty_source() {
        let s = stream("");
        assert!(s.is_empty());
        assert!(s.at_end());
    }
}
