//! AST construction for CFML script.
//!
//! This crate turns the parse tree produced by `cfml-parser` into the AST of
//! `cfml-syntax`, checks statement attributes against their valid sets, and
//! offers [`parse_script`], the whole pipeline from source text to AST.

mod lower;
mod validate;

pub use lower::{AstBuilder, LowerError};
pub use validate::{AttributeDictionary, AttributePolicy, validate_statement};

use cfml_diagnostic::{Diagnostic, Diagnostics};
use cfml_lexer::Token;
use cfml_parser::{ParseOptions, ParseTree, Stage};
use cfml_syntax::{Statement, valid};
use std::fmt;

/// AST builder configuration.
#[derive(Clone, Copy, Default)]
pub struct LowerOptions<'a> {
    /// How unknown attribute names are reported
    pub policy: AttributePolicy,
    /// Extra attribute knowledge consulted before reporting
    pub dictionary: Option<&'a dyn AttributeDictionary>,
}

impl<'a> LowerOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: AttributePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dictionary(mut self, dictionary: &'a dyn AttributeDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Whether `attribute` is acceptable on `element`: listed in its valid
    /// set, or vouched for by the dictionary.
    pub fn accepts(&self, element: &str, valid_set: &[&str], attribute: &str) -> bool {
        valid::contains(valid_set, attribute)
            || self
                .dictionary
                .is_some_and(|d| d.accepts_attribute(element, attribute))
    }
}

impl fmt::Debug for LowerOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LowerOptions")
            .field("policy", &self.policy)
            .field("dictionary", &self.dictionary.is_some())
            .finish()
    }
}

/// The result of building an AST from a parse tree.
#[derive(Debug, Clone)]
pub struct Lowered {
    /// `None` for an empty script
    pub root: Option<Statement>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the AST for a parse tree.
pub fn lower(tree: &ParseTree, options: &LowerOptions) -> Lowered {
    let mut builder = AstBuilder::new(*options);
    let root = builder.lower_root(tree);
    Lowered {
        root,
        diagnostics: builder.into_diagnostics().into_vec(),
    }
}

/// Everything the full pipeline produces.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub root: Option<Statement>,
    pub tree: ParseTree,
    /// All tokens, comments included
    pub tokens: Vec<Token>,
    /// Lexer, parser and builder diagnostics, in that order
    pub diagnostics: Vec<Diagnostic>,
    pub stage: Stage,
}

impl ScriptOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Tokenize, parse and build the AST for `source`.
pub fn parse_script(
    source: &str,
    parse_options: &ParseOptions,
    lower_options: &LowerOptions,
) -> ScriptOutput {
    let output = cfml_parser::parse(source, parse_options);
    let lowered = lower(&output.tree, lower_options);

    let mut diagnostics = Diagnostics::from(output.diagnostics);
    diagnostics.extend(lowered.diagnostics);
    diagnostics.locate(source);

    ScriptOutput {
        root: lowered.root,
        tree: output.tree,
        tokens: output.tokens,
        diagnostics: diagnostics.into_vec(),
        stage: output.stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfml_diagnostic::{DiagnosticKind, ErrorCode};
    use cfml_syntax::StatementKind;

    #[test]
    fn test_parse_script_orders_diagnostics() {
        let source = "property name=\"a\" colour=\"red\";\ny = \"open";
        let output = parse_script(source, &ParseOptions::new(), &LowerOptions::new());
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Lexer);
        assert!(output.has_errors());
    }

    #[test]
    fn test_validation_lines_resolved() {
        let source = "component {\n  property name=\"a\"\n    colour=\"red\";\n}";
        let output = parse_script(source, &ParseOptions::new(), &LowerOptions::new());
        assert_eq!(output.diagnostics.len(), 1);
        let diagnostic = &output.diagnostics[0];
        assert_eq!(diagnostic.code, Some(ErrorCode::UnknownAttribute));
        assert_eq!(diagnostic.line, 3);
        assert_eq!(diagnostic.context, "colour");
        assert!(!output.has_errors());
    }

    #[test]
    fn test_expression_entry() {
        let output = parse_script("a + 1", &ParseOptions::expression(), &LowerOptions::new());
        assert!(matches!(
            output.root.map(|s| s.kind),
            Some(StatementKind::Expression(_))
        ));
    }

    #[test]
    fn test_lower_empty_tree() {
        let output = cfml_parser::parse("", &ParseOptions::new());
        let lowered = lower(&output.tree, &LowerOptions::new());
        assert!(lowered.root.is_none());
        assert!(lowered.diagnostics.is_empty());
    }

    #[test]
    fn test_malformed_input_never_panics() {
        for source in ["{{{", "property ;", "function (", "x = [1, 2", "a ? b", ")"] {
            let output = parse_script(source, &ParseOptions::new(), &LowerOptions::new());
            assert!(!output.diagnostics.is_empty(), "{source}");
        }
    }
}
