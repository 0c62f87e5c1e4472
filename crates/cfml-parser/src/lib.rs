//! Parser for CFML script.
//!
//! This crate provides a recursive descent parser that converts tokens into
//! a concrete parse tree.
//!
//! ## Two-stage parsing
//!
//! A parse first runs in fast prediction mode: bounded lookahead, no
//! recovery. Most real input parses this way. When the fast stage gives up,
//! the token stream is rewound and the same entry rule is parsed again in
//! general prediction mode, which can look arbitrarily far ahead and
//! recovers from errors so that every problem in the input is reported.
//! Whenever the fast stage succeeds, its tree is the tree the general stage
//! would have built.

mod parser;
mod recovery;
mod tree;

pub use parser::{Bail, EntryRule, FAST_LOOKAHEAD, PResult, Parser, PredictionMode};
pub use recovery::{DelimiterKind, DelimiterStack};
pub use tree::{ParseNode, ParseTree, Rule};

use cfml_diagnostic::{Diagnostic, Diagnostics};
use cfml_lexer::{Lexer, Token, TokenStream};

/// Which prediction stages a parse may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Fast stage, then the general stage if the fast one gives up.
    #[default]
    Adaptive,
    /// Fast stage only; input it cannot handle is reported as one error.
    FastOnly,
    /// General stage only.
    GeneralOnly,
}

/// The stage that produced a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fast,
    General,
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub entry: EntryRule,
    pub strategy: Strategy,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for parsing a single expression.
    pub fn expression() -> Self {
        Self::default().with_entry(EntryRule::Expression)
    }

    pub fn with_entry(mut self, entry: EntryRule) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Everything a parse produces.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub tree: ParseTree,
    /// All tokens, comments included.
    pub tokens: Vec<Token>,
    /// Lexer diagnostics followed by parser diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    pub stage: Stage,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse source code into a parse tree.
pub fn parse(source: &str, options: &ParseOptions) -> ParseOutput {
    let (tokens, lex_diagnostics) = Lexer::new(source).tokenize();
    let stream = TokenStream::new(&tokens);
    let (tree, parse_diagnostics, stage) = parse_stream(stream, options);

    let mut diagnostics = Diagnostics::from(lex_diagnostics);
    diagnostics.extend(parse_diagnostics);
    diagnostics.locate(source);

    ParseOutput {
        tree,
        tokens,
        diagnostics: diagnostics.into_vec(),
        stage,
    }
}

/// Parse a prepared token stream with the configured strategy.
pub fn parse_stream(stream: TokenStream, options: &ParseOptions) -> (ParseTree, Diagnostics, Stage) {
    let entry = options.entry;
    match options.strategy {
        Strategy::GeneralOnly => {
            let mut parser = Parser::new(stream, PredictionMode::General);
            let tree = parser.parse_or_skip(entry);
            (tree, parser.into_diagnostics(), Stage::General)
        }
        Strategy::FastOnly => {
            let mut parser = Parser::new(stream, PredictionMode::Fast);
            let tree = parser.parse_or_skip(entry);
            (tree, parser.into_diagnostics(), Stage::Fast)
        }
        Strategy::Adaptive => {
            let mut parser = Parser::new(stream, PredictionMode::Fast);
            match parser.parse(entry) {
                Ok(tree) => (tree, parser.into_diagnostics(), Stage::Fast),
                Err(bail) => {
                    log::debug!(
                        "fast prediction gave up at {}; retrying with general prediction",
                        bail
                    );
                    parser.reset(PredictionMode::General);
                    let tree = parser.parse_or_skip(entry);
                    (tree, parser.into_diagnostics(), Stage::General)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_uses_fast_stage() {
        let output = parse("x = 1;", &ParseOptions::new());
        assert_eq!(output.stage, Stage::Fast);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_adaptive_falls_back() {
        let output = parse("f = (a) => a;", &ParseOptions::new());
        assert_eq!(output.stage, Stage::General);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_fast_only_reports_unparsed() {
        let options = ParseOptions::new().with_strategy(Strategy::FastOnly);
        let output = parse("f = (a) => a;", &options);
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.tree.has_errors());
    }

    #[test]
    fn test_expression_entry() {
        let output = parse("a ?: b", &ParseOptions::expression());
        assert_eq!(
            output.tree.to_lisp(),
            "(standaloneExpression (elvisExpression a ?: b) <EOF>)"
        );
        let output = parse("a b", &ParseOptions::expression());
        assert_eq!(output.stage, Stage::General);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].line, 1);
    }

    #[test]
    fn test_lexer_diagnostics_come_first() {
        let output = parse("x = \"open", &ParseOptions::new());
        assert!(output.has_errors());
        assert_eq!(
            output.diagnostics[0].kind,
            cfml_diagnostic::DiagnosticKind::Lexer
        );
    }
}
