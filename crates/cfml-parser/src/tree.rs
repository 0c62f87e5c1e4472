//! The concrete parse tree.

use cfml_common::Span;
use cfml_lexer::{Token, TokenKind};
use std::fmt;

/// Grammar rules. Each alternative that the AST builder must tell apart
/// has its own rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    ScriptBlock,
    StandaloneExpression,

    // Statements
    Block,
    EmptyStatement,
    ExpressionStatement,
    VarStatement,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    SwitchStatement,
    CaseClause,
    DefaultClause,
    BreakStatement,
    ContinueStatement,
    ReturnStatement,
    TryStatement,
    CatchClause,
    FinallyClause,
    ThrowStatement,
    FunctionDeclaration,
    ReturnType,
    ParameterList,
    Parameter,
    Attribute,
    ComponentDeclaration,
    InterfaceDeclaration,
    PropertyFull,
    PropertyShorthand,
    TagStatement,
    ImportStatement,
    IncludeStatement,
    AbortStatement,
    TypeName,

    // Expressions
    AssignmentExpression,
    TernaryExpression,
    ElvisExpression,
    BinaryExpression,
    UnaryExpression,
    PostfixExpression,
    ParenExpression,
    CallExpression,
    ArgumentList,
    Argument,
    MemberExpression,
    IndexExpression,
    ArrayLiteral,
    StructLiteral,
    StructEntry,
    NewExpression,
    FunctionExpression,
    ArrowFunction,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::ScriptBlock => "scriptBlock",
            Rule::StandaloneExpression => "standaloneExpression",
            Rule::Block => "block",
            Rule::EmptyStatement => "emptyStatement",
            Rule::ExpressionStatement => "expressionStatement",
            Rule::VarStatement => "varStatement",
            Rule::IfStatement => "ifStatement",
            Rule::WhileStatement => "whileStatement",
            Rule::DoWhileStatement => "doWhileStatement",
            Rule::ForStatement => "forStatement",
            Rule::ForInStatement => "forInStatement",
            Rule::SwitchStatement => "switchStatement",
            Rule::CaseClause => "caseClause",
            Rule::DefaultClause => "defaultClause",
            Rule::BreakStatement => "breakStatement",
            Rule::ContinueStatement => "continueStatement",
            Rule::ReturnStatement => "returnStatement",
            Rule::TryStatement => "tryStatement",
            Rule::CatchClause => "catchClause",
            Rule::FinallyClause => "finallyClause",
            Rule::ThrowStatement => "throwStatement",
            Rule::FunctionDeclaration => "functionDeclaration",
            Rule::ReturnType => "returnType",
            Rule::ParameterList => "parameterList",
            Rule::Parameter => "parameter",
            Rule::Attribute => "attribute",
            Rule::ComponentDeclaration => "componentDeclaration",
            Rule::InterfaceDeclaration => "interfaceDeclaration",
            Rule::PropertyFull => "propertyFull",
            Rule::PropertyShorthand => "propertyShorthand",
            Rule::TagStatement => "tagStatement",
            Rule::ImportStatement => "importStatement",
            Rule::IncludeStatement => "includeStatement",
            Rule::AbortStatement => "abortStatement",
            Rule::TypeName => "typeName",
            Rule::AssignmentExpression => "assignmentExpression",
            Rule::TernaryExpression => "ternaryExpression",
            Rule::ElvisExpression => "elvisExpression",
            Rule::BinaryExpression => "binaryExpression",
            Rule::UnaryExpression => "unaryExpression",
            Rule::PostfixExpression => "postfixExpression",
            Rule::ParenExpression => "parenExpression",
            Rule::CallExpression => "callExpression",
            Rule::ArgumentList => "argumentList",
            Rule::Argument => "argument",
            Rule::MemberExpression => "memberExpression",
            Rule::IndexExpression => "indexExpression",
            Rule::ArrayLiteral => "arrayLiteral",
            Rule::StructLiteral => "structLiteral",
            Rule::StructEntry => "structEntry",
            Rule::NewExpression => "newExpression",
            Rule::FunctionExpression => "functionExpression",
            Rule::ArrowFunction => "arrowFunction",
        }
    }
}

/// An interior node: a rule and its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub rule: Rule,
    pub children: Vec<ParseTree>,
}

impl ParseNode {
    pub fn new(rule: Rule, children: Vec<ParseTree>) -> Self {
        Self { rule, children }
    }

    /// Child nodes matching `rule`.
    pub fn nodes(&self, rule: Rule) -> impl Iterator<Item = &ParseNode> {
        self.children
            .iter()
            .filter_map(ParseTree::as_node)
            .filter(move |n| n.rule == rule)
    }

    pub fn node(&self, rule: Rule) -> Option<&ParseNode> {
        self.nodes(rule).next()
    }

    /// Child tokens, in order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(ParseTree::as_token)
    }

    pub fn token(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens().find(|t| t.kind == kind)
    }

    /// The first matched token below this node.
    pub fn first_token(&self) -> Option<&Token> {
        self.children.iter().find_map(|child| match child {
            ParseTree::Node(node) => node.first_token(),
            ParseTree::Token(token) | ParseTree::Error(token) => Some(token),
            ParseTree::Missing(_) => None,
        })
    }

    /// Span from the first to the last real token below this node.
    pub fn span(&self) -> Span {
        let mut spans = self.children.iter().filter_map(ParseTree::span);
        match spans.next() {
            Some(first) => spans.fold(first, Span::merge),
            None => Span::DUMMY,
        }
    }

    /// Source text of the tokens below this node, concatenated without spaces.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text(&mut out);
        }
        out
    }
}

/// A parse tree: interior node, matched token, skipped token, or a token the
/// parser had to assume.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree {
    Node(ParseNode),
    Token(Token),
    /// Token skipped during recovery
    Error(Token),
    /// Placeholder for something required but absent
    Missing(&'static str),
}

impl ParseTree {
    pub fn node(rule: Rule, children: Vec<ParseTree>) -> Self {
        ParseTree::Node(ParseNode::new(rule, children))
    }

    pub fn as_node(&self) -> Option<&ParseNode> {
        match self {
            ParseTree::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            ParseTree::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn rule(&self) -> Option<Rule> {
        self.as_node().map(|n| n.rule)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ParseTree::Error(_) | ParseTree::Missing(_))
    }

    /// True if this subtree contains skipped or assumed tokens.
    pub fn has_errors(&self) -> bool {
        match self {
            ParseTree::Node(node) => node.children.iter().any(ParseTree::has_errors),
            ParseTree::Token(_) => false,
            ParseTree::Error(_) | ParseTree::Missing(_) => true,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ParseTree::Node(node) => {
                let span = node.span();
                (span != Span::DUMMY).then_some(span)
            }
            ParseTree::Token(t) | ParseTree::Error(t) if t.kind != TokenKind::Eof => Some(t.span),
            _ => None,
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            ParseTree::Node(node) => {
                for child in &node.children {
                    child.push_text(out);
                }
            }
            ParseTree::Token(t) | ParseTree::Error(t) => out.push_str(&t.lexeme),
            ParseTree::Missing(_) => {}
        }
    }

    /// Parenthesized rendering: `(rule child child ...)`, tokens as their
    /// text, end of input as `<EOF>`.
    pub fn to_lisp(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTree::Node(node) => {
                write!(f, "({}", node.rule.name())?;
                for child in &node.children {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
            ParseTree::Token(t) | ParseTree::Error(t) => {
                if t.kind == TokenKind::Eof {
                    write!(f, "<EOF>")
                } else {
                    write!(f, "{}", t.lexeme)
                }
            }
            ParseTree::Missing(what) => write!(f, "<missing {}>", what),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str, start: usize) -> ParseTree {
        ParseTree::Token(Token::new(
            kind,
            text,
            Span::from_usize(start, start + text.len()),
            1,
        ))
    }

    #[test]
    fn test_lisp_rendering() {
        let tree = ParseTree::node(
            Rule::ScriptBlock,
            vec![
                ParseTree::node(
                    Rule::ExpressionStatement,
                    vec![tok(TokenKind::Identifier, "x", 0), ParseTree::Missing("';'")],
                ),
                ParseTree::Token(Token::eof(1, 1)),
            ],
        );
        assert_eq!(
            tree.to_lisp(),
            "(scriptBlock (expressionStatement x <missing ';'>) <EOF>)"
        );
        assert!(tree.has_errors());
    }

    #[test]
    fn test_span_and_text() {
        let node = ParseNode::new(
            Rule::TypeName,
            vec![
                tok(TokenKind::Identifier, "a", 4),
                tok(TokenKind::Dot, ".", 5),
                tok(TokenKind::Identifier, "b", 6),
            ],
        );
        assert_eq!(node.span(), Span::from_usize(4, 7));
        assert_eq!(node.text(), "a.b");
    }
}
