//! Error recovery for the general prediction stage.
//!
//! Token sets that mark statement boundaries, and a delimiter stack so that
//! skipping tokens never stops inside a nested block.

use cfml_lexer::TokenKind;

/// Tokens that start a statement and can never continue an expression.
pub const STMT_STARTS: &[TokenKind] = &[
    TokenKind::Var,
    TokenKind::If,
    TokenKind::For,
    TokenKind::While,
    TokenKind::Do,
    TokenKind::Switch,
    TokenKind::Try,
    TokenKind::Return,
    TokenKind::Break,
    TokenKind::Continue,
    TokenKind::Throw,
    TokenKind::Import,
    TokenKind::Component,
    TokenKind::Interface,
    TokenKind::Property,
];

/// Tokens an expression never consumes when it fails to start.
pub const SYNC_TOKENS: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::RBrace,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::Comma,
    TokenKind::Colon,
    TokenKind::LBrace,
    TokenKind::Eof,
];

pub fn is_stmt_start(kind: TokenKind) -> bool {
    STMT_STARTS.contains(&kind)
}

pub fn is_sync_token(kind: TokenKind) -> bool {
    SYNC_TOKENS.contains(&kind)
}

/// Delimiter kinds for recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Paren,   // )
    Bracket, // ]
    Brace,   // }
}

impl DelimiterKind {
    pub fn closing_token(&self) -> TokenKind {
        match self {
            DelimiterKind::Paren => TokenKind::RParen,
            DelimiterKind::Bracket => TokenKind::RBracket,
            DelimiterKind::Brace => TokenKind::RBrace,
        }
    }
}

/// Tracks delimiters opened while skipping tokens.
#[derive(Debug, Default)]
pub struct DelimiterStack {
    stack: Vec<DelimiterKind>,
}

impl DelimiterStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Check if we're inside a specific delimiter.
    pub fn inside(&self, kind: DelimiterKind) -> bool {
        self.stack.contains(&kind)
    }

    /// Update the stack with a token being skipped. Returns false for a
    /// closing delimiter that was never opened here.
    pub fn update(&mut self, token: TokenKind) -> bool {
        match token {
            TokenKind::LParen => self.stack.push(DelimiterKind::Paren),
            TokenKind::LBracket => self.stack.push(DelimiterKind::Bracket),
            TokenKind::LBrace => self.stack.push(DelimiterKind::Brace),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                let Some(pos) = self
                    .stack
                    .iter()
                    .rposition(|d| d.closing_token() == token)
                else {
                    return false;
                };
                self.stack.truncate(pos);
            }
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_sets() {
        assert!(is_stmt_start(TokenKind::Var));
        assert!(is_stmt_start(TokenKind::Property));
        assert!(!is_stmt_start(TokenKind::Plus));
        assert!(is_sync_token(TokenKind::Eof));
    }

    #[test]
    fn test_delimiter_stack() {
        let mut stack = DelimiterStack::new();
        assert!(stack.is_empty());

        stack.update(TokenKind::LParen);
        assert_eq!(stack.depth(), 1);
        assert!(stack.inside(DelimiterKind::Paren));

        stack.update(TokenKind::LBrace);
        assert_eq!(stack.depth(), 2);

        assert!(stack.update(TokenKind::RBrace));
        assert_eq!(stack.depth(), 1);

        assert!(stack.update(TokenKind::RParen));
        assert!(stack.is_empty());

        assert!(!stack.update(TokenKind::RBrace));
    }
}
