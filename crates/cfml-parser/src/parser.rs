//! The CFML script parser.
//! CFML 脚本解析器。
//!
//! One recursive-descent grammar runs under two prediction modes. In
//! [`PredictionMode::Fast`] every decision looks at most
//! [`FAST_LOOKAHEAD`] tokens ahead and the first error aborts the parse with
//! a [`Bail`]. In [`PredictionMode::General`] decisions may scan or parse
//! speculatively, and errors become diagnostics while the parser recovers.

use cfml_diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, ErrorCode, Label};
use cfml_lexer::{Token, TokenKind, TokenStream};
use std::fmt;

use crate::recovery::{DelimiterKind, DelimiterStack, is_stmt_start, is_sync_token};
use crate::tree::{ParseTree, Rule};

/// Tokens a fast-stage decision may inspect.
pub const FAST_LOOKAHEAD: usize = 3;

/// Words that may precede `function` as modifiers.
const MODIFIERS: &[&str] = &[
    "public", "private", "package", "remote", "static", "final", "abstract",
];

/// Words that introduce tag-style statements.
const TAG_KEYWORDS: &[&str] = &[
    "lock",
    "transaction",
    "thread",
    "savecontent",
    "param",
    "setting",
    "location",
    "exit",
];

const COMPARISON_OPS: &[TokenKind] = &[
    TokenKind::EqEq,
    TokenKind::EqEqEq,
    TokenKind::BangEq,
    TokenKind::BangEqEq,
    TokenKind::LtGt,
    TokenKind::Lt,
    TokenKind::LtEq,
    TokenKind::Gt,
    TokenKind::GtEq,
    TokenKind::EqWord,
    TokenKind::NeqWord,
    TokenKind::Is,
    TokenKind::GtWord,
    TokenKind::GteWord,
    TokenKind::GeWord,
    TokenKind::LtWord,
    TokenKind::LteWord,
    TokenKind::LeWord,
    TokenKind::Contains,
    TokenKind::Does,
];

/// Binary operator levels, loosest first.
/// 二元运算符优先级，从最松到最紧。
const BINARY_LEVELS: &[&[TokenKind]] = &[
    &[TokenKind::Imp],
    &[TokenKind::Eqv],
    &[TokenKind::Xor],
    &[TokenKind::OrWord, TokenKind::OrOr],
    &[TokenKind::AndWord, TokenKind::AndAnd],
    COMPARISON_OPS,
    &[TokenKind::Amp],
    &[TokenKind::Plus, TokenKind::Minus],
    &[
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::ModWord,
        TokenKind::Backslash,
    ],
    &[TokenKind::Caret],
];

/// Level at which a word `NOT` applies; it binds looser than comparisons.
const NOT_LEVEL: usize = 5;

/// How the parser resolves decisions.
/// 解析器的预测模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMode {
    /// Bounded lookahead, abort at the first error.
    Fast,
    /// Unbounded lookahead with recovery.
    General,
}

/// The rule a parse starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryRule {
    /// Statements until end of input.
    #[default]
    ScriptBlock,
    /// A single expression, then end of input.
    Expression,
}

impl EntryRule {
    pub fn rule(self) -> Rule {
        match self {
            EntryRule::ScriptBlock => Rule::ScriptBlock,
            EntryRule::Expression => Rule::StandaloneExpression,
        }
    }
}

/// Why a parse was abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct Bail {
    pub token: Token,
    pub reason: String,
}

impl fmt::Display for Bail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.token.line, self.reason)
    }
}

pub type PResult<T> = Result<T, Bail>;

fn node(rule: Rule, children: Vec<ParseTree>) -> ParseTree {
    ParseTree::node(rule, children)
}

/// The CFML script parser.
/// CFML 脚本解析器。
pub struct Parser {
    stream: TokenStream,
    mode: PredictionMode,
    diagnostics: Diagnostics,
    /// Nesting depth of speculative parses; errors abort while non-zero
    speculating: u32,
    /// Delimiters opened while skipping tokens
    delimiters: DelimiterStack,
}

impl Parser {
    pub fn new(stream: TokenStream, mode: PredictionMode) -> Self {
        Self {
            stream,
            mode,
            diagnostics: Diagnostics::new(),
            speculating: 0,
            delimiters: DelimiterStack::new(),
        }
    }

    pub fn mode(&self) -> PredictionMode {
        self.mode
    }

    /// Rewind to the first token and clear all state for a fresh attempt.
    pub fn reset(&mut self, mode: PredictionMode) {
        self.stream.seek(0);
        self.mode = mode;
        self.diagnostics.clear();
        self.speculating = 0;
        self.delimiters.clear();
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Parse from the given entry rule.
    pub fn parse(&mut self, entry: EntryRule) -> PResult<ParseTree> {
        match entry {
            EntryRule::ScriptBlock => self.script_block(),
            EntryRule::Expression => self.standalone_expression(),
        }
    }

    /// Parse and always produce a tree. A parse that still bails is turned
    /// into a tree of skipped tokens with a single diagnostic.
    pub fn parse_or_skip(&mut self, entry: EntryRule) -> ParseTree {
        match self.parse(entry) {
            Ok(tree) => tree,
            Err(bail) => self.unparsed(entry, &bail),
        }
    }

    fn unparsed(&mut self, entry: EntryRule, bail: &Bail) -> ParseTree {
        self.stream.seek(0);
        self.diagnostics.clear();
        let span = bail.token.span;
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Parser, span, bail.reason.clone())
                .with_code(ErrorCode::UnexpectedToken)
                .with_label(Label::new(span, "parse abandoned here"))
                .at_line(bail.token.line),
        );
        let mut children = Vec::new();
        while !self.at_end() {
            children.push(ParseTree::Error(self.stream.advance()));
        }
        children.push(self.bump());
        node(entry.rule(), children)
    }

    // ========== Entry Rules ==========

    fn script_block(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        while !self.at_end() {
            if self.check(TokenKind::RBrace) {
                self.report(ErrorCode::UnexpectedToken, "unexpected '}'")?;
                children.push(ParseTree::Error(self.stream.advance()));
                continue;
            }
            self.statement_into(&mut children)?;
        }
        children.push(self.bump());
        Ok(node(Rule::ScriptBlock, children))
    }

    fn standalone_expression(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.expression()?];
        if !self.at_end() {
            let found = self.found();
            self.report(
                ErrorCode::TrailingInput,
                format!("unexpected {} after expression", found),
            )?;
            while !self.at_end() {
                children.push(ParseTree::Error(self.stream.advance()));
            }
        }
        children.push(self.bump());
        Ok(node(Rule::StandaloneExpression, children))
    }

    // ========== Statements ==========

    /// Parse one statement into `out`, skipping a token when no statement
    /// can start here so the caller always makes progress.
    fn statement_into(&mut self, out: &mut Vec<ParseTree>) -> PResult<()> {
        let start = self.stream.pos();
        let mark = self.diagnostics.len();
        let statement = self.statement()?;
        if self.stream.pos() == start {
            self.diagnostics.truncate(mark);
            let found = self.found();
            self.report(
                ErrorCode::ExpectedStatement,
                format!("expected a statement, found {}", found),
            )?;
            out.push(ParseTree::Error(self.stream.advance()));
            return Ok(());
        }
        out.push(statement);
        Ok(())
    }

    fn statement_list(&mut self, out: &mut Vec<ParseTree>, stop: &[TokenKind]) -> PResult<()> {
        while !self.at_end() && !stop.contains(&self.kind()) {
            self.statement_into(out)?;
        }
        Ok(())
    }

    fn statement(&mut self) -> PResult<ParseTree> {
        match self.kind() {
            TokenKind::LBrace => self.block(),
            TokenKind::Semicolon => Ok(node(Rule::EmptyStatement, vec![self.bump()])),
            TokenKind::Var => self.var_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Do => self.do_while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Try => self.try_statement(),
            TokenKind::Return => self.keyword_statement(Rule::ReturnStatement, true),
            TokenKind::Throw => self.keyword_statement(Rule::ThrowStatement, true),
            TokenKind::Break => self.keyword_statement(Rule::BreakStatement, false),
            TokenKind::Continue => self.keyword_statement(Rule::ContinueStatement, false),
            TokenKind::Import => self.import_statement(),
            TokenKind::Component | TokenKind::Interface
                if self.peek_kind(1) == TokenKind::Function =>
            {
                self.function_declaration()
            }
            TokenKind::Component | TokenKind::Interface => self.component_declaration(),
            TokenKind::Property => self.property_statement(),
            TokenKind::Function if self.peek_kind(1).is_word() => self.function_declaration(),
            TokenKind::Identifier => self.word_statement(),
            _ => self.expression_statement(),
        }
    }

    fn block(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        self.expect(TokenKind::LBrace, &mut children)?;
        self.statement_list(&mut children, &[TokenKind::RBrace])?;
        self.expect(TokenKind::RBrace, &mut children)?;
        Ok(node(Rule::Block, children))
    }

    /// Statements that start with a plain identifier.
    fn word_statement(&mut self) -> PResult<ParseTree> {
        let next = self.peek_kind(1);
        let word = self.current().lexeme.to_ascii_lowercase();

        if TAG_KEYWORDS.contains(&word.as_str()) {
            let exit_alone = word == "exit"
                && matches!(next, TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof);
            if (next.is_word() && self.peek_kind(2) == TokenKind::Assign)
                || next == TokenKind::LBrace
                || exit_alone
            {
                return self.tag_statement();
            }
        }
        if word == "abort"
            && matches!(
                next,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof | TokenKind::StringLiteral
            )
        {
            return self.keyword_statement(Rule::AbortStatement, true);
        }
        if word == "include" && next == TokenKind::StringLiteral {
            return self.keyword_statement(Rule::IncludeStatement, true);
        }
        if self.is_function_declaration()? {
            return self.function_declaration();
        }
        self.expression_statement()
    }

    /// Decide whether a statement starting with a word declares a function:
    /// modifiers and a possibly dotted return type ahead of `function`.
    fn is_function_declaration(&self) -> PResult<bool> {
        let (k1, k2) = (self.peek_kind(1), self.peek_kind(2));
        if k1 == TokenKind::Function || (k1.is_word() && k2 == TokenKind::Function) {
            return Ok(true);
        }
        let needs_scan = (k1.is_word() && k2.is_word()) || k1 == TokenKind::Dot;
        if !needs_scan {
            return Ok(false);
        }
        if k1 == TokenKind::Dot && self.mode == PredictionMode::Fast {
            // Parsed as an expression; a dotted return type fails there and
            // falls back to the general stage.
            return Ok(false);
        }
        self.require_general("modifiers or return type before 'function'")?;
        let mut i = 0;
        loop {
            let kind = self.peek_kind(i);
            if kind == TokenKind::Function {
                return Ok(i > 0);
            }
            if !(kind.is_word() || kind == TokenKind::Dot) {
                return Ok(false);
            }
            i += 1;
        }
    }

    fn expression_statement(&mut self) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = vec![self.expression()?];
        self.end_statement(&mut children, mark)?;
        Ok(node(Rule::ExpressionStatement, children))
    }

    /// `return`, `throw`, `abort`, `include`, `break`, `continue`.
    fn keyword_statement(&mut self, rule: Rule, takes_value: bool) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = vec![self.bump()];
        if takes_value
            && !matches!(
                self.kind(),
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            )
        {
            children.push(self.expression()?);
        }
        self.end_statement(&mut children, mark)?;
        Ok(node(rule, children))
    }

    fn var_statement(&mut self) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = self.var_declaration()?;
        self.end_statement(&mut children, mark)?;
        Ok(node(Rule::VarStatement, children))
    }

    fn var_declaration(&mut self) -> PResult<Vec<ParseTree>> {
        let mut children = vec![self.bump()];
        self.expect_word(&mut children)?;
        if self.check(TokenKind::Assign) {
            children.push(self.bump());
            children.push(self.expression()?);
        }
        Ok(children)
    }

    fn if_statement(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        self.condition(&mut children)?;
        children.push(self.statement()?);
        if self.check(TokenKind::Else) {
            children.push(self.bump());
            children.push(self.statement()?);
        }
        Ok(node(Rule::IfStatement, children))
    }

    fn while_statement(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        self.condition(&mut children)?;
        children.push(self.statement()?);
        Ok(node(Rule::WhileStatement, children))
    }

    fn do_while_statement(&mut self) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = vec![self.bump()];
        children.push(self.statement()?);
        self.expect(TokenKind::While, &mut children)?;
        self.condition(&mut children)?;
        self.end_statement(&mut children, mark)?;
        Ok(node(Rule::DoWhileStatement, children))
    }

    /// `( expression )`
    fn condition(&mut self, children: &mut Vec<ParseTree>) -> PResult<()> {
        self.expect(TokenKind::LParen, children)?;
        children.push(self.expression()?);
        self.expect(TokenKind::RParen, children)
    }

    fn for_statement(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        self.expect(TokenKind::LParen, &mut children)?;

        if self.is_for_in()? {
            if self.check(TokenKind::Var) {
                children.push(self.bump());
            }
            children.push(self.postfix()?);
            self.expect(TokenKind::In, &mut children)?;
            children.push(self.expression()?);
            self.expect(TokenKind::RParen, &mut children)?;
            children.push(self.statement()?);
            return Ok(node(Rule::ForInStatement, children));
        }

        if self.check(TokenKind::Var) {
            let declaration = self.var_declaration()?;
            children.push(node(Rule::VarStatement, declaration));
        } else if !self.check(TokenKind::Semicolon) {
            children.push(self.expression()?);
        }
        self.expect(TokenKind::Semicolon, &mut children)?;
        if !self.check(TokenKind::Semicolon) {
            children.push(self.expression()?);
        }
        self.expect(TokenKind::Semicolon, &mut children)?;
        if !self.check(TokenKind::RParen) {
            children.push(self.expression()?);
        }
        self.expect(TokenKind::RParen, &mut children)?;
        children.push(self.statement()?);
        Ok(node(Rule::ForStatement, children))
    }

    /// After `for (`: is this `[var] target in collection`?
    fn is_for_in(&mut self) -> PResult<bool> {
        let offset = usize::from(self.check(TokenKind::Var));
        let (first, second) = (self.peek_kind(offset), self.peek_kind(offset + 1));
        if !first.is_word() {
            return Ok(false);
        }
        match second {
            TokenKind::In => Ok(true),
            TokenKind::Dot | TokenKind::LBracket | TokenKind::SafeDot => {
                self.require_general("for-in with a complex left side")?;
                let found = self.speculate(|p| {
                    if p.check(TokenKind::Var) {
                        p.bump();
                    }
                    p.postfix()?;
                    Ok(p.check(TokenKind::In))
                });
                Ok(found.unwrap_or(false))
            }
            _ => Ok(false),
        }
    }

    fn switch_statement(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        self.condition(&mut children)?;
        self.expect(TokenKind::LBrace, &mut children)?;
        while !self.at_end() && !self.check(TokenKind::RBrace) {
            match self.kind() {
                TokenKind::Case => {
                    let mut clause = vec![self.bump()];
                    clause.push(self.expression()?);
                    self.expect(TokenKind::Colon, &mut clause)?;
                    self.case_body(&mut clause)?;
                    children.push(node(Rule::CaseClause, clause));
                }
                TokenKind::Default => {
                    let mut clause = vec![self.bump()];
                    self.expect(TokenKind::Colon, &mut clause)?;
                    self.case_body(&mut clause)?;
                    children.push(node(Rule::DefaultClause, clause));
                }
                _ => {
                    let found = self.found();
                    self.report(
                        ErrorCode::UnexpectedToken,
                        format!("expected 'case' or 'default', found {}", found),
                    )?;
                    children.push(ParseTree::Error(self.stream.advance()));
                }
            }
        }
        self.expect(TokenKind::RBrace, &mut children)?;
        Ok(node(Rule::SwitchStatement, children))
    }

    fn case_body(&mut self, clause: &mut Vec<ParseTree>) -> PResult<()> {
        self.statement_list(
            clause,
            &[TokenKind::Case, TokenKind::Default, TokenKind::RBrace],
        )
    }

    fn try_statement(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        children.push(self.block()?);
        while self.check(TokenKind::Catch) {
            let mut clause = vec![self.bump()];
            self.expect(TokenKind::LParen, &mut clause)?;
            if self.check(TokenKind::StringLiteral) {
                clause.push(node(Rule::TypeName, vec![self.bump()]));
                self.expect_word(&mut clause)?;
            } else {
                let first = self.dotted_name()?;
                self.typed_name(first, &mut clause)?;
            }
            self.expect(TokenKind::RParen, &mut clause)?;
            clause.push(self.block()?);
            children.push(node(Rule::CatchClause, clause));
        }
        if self.check(TokenKind::Finally) {
            let clause = vec![self.bump(), self.block()?];
            children.push(node(Rule::FinallyClause, clause));
        }
        Ok(node(Rule::TryStatement, children))
    }

    fn import_statement(&mut self) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = vec![self.bump()];
        if self.check(TokenKind::StringLiteral) {
            children.push(self.bump());
        } else {
            let mut path = self.dotted_name()?;
            if self.check(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Star {
                path.push(self.bump());
                path.push(self.bump());
            }
            children.push(node(Rule::TypeName, path));
        }
        self.end_statement(&mut children, mark)?;
        Ok(node(Rule::ImportStatement, children))
    }

    fn component_declaration(&mut self) -> PResult<ParseTree> {
        let rule = if self.check(TokenKind::Interface) {
            Rule::InterfaceDeclaration
        } else {
            Rule::ComponentDeclaration
        };
        let mut children = vec![self.bump()];
        self.attributes(&mut children)?;
        children.push(self.block()?);
        Ok(node(rule, children))
    }

    fn tag_statement(&mut self) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = vec![self.bump()];
        self.attributes(&mut children)?;
        if self.check(TokenKind::LBrace) {
            children.push(self.block()?);
        } else {
            self.end_statement(&mut children, mark)?;
        }
        Ok(node(Rule::TagStatement, children))
    }

    /// `property name="x" type="string";` or `property [type] name [attrs];`
    fn property_statement(&mut self) -> PResult<ParseTree> {
        let mark = self.diagnostics.len();
        let mut children = vec![self.bump()];

        if self.kind().is_word() && self.peek_kind(1) == TokenKind::Assign {
            self.attributes(&mut children)?;
            self.end_statement(&mut children, mark)?;
            return Ok(node(Rule::PropertyFull, children));
        }

        let first = self.dotted_name()?;
        if self.kind().is_word() && self.peek_kind(1) != TokenKind::Assign {
            children.push(node(Rule::TypeName, first));
            children.push(self.bump());
        } else {
            self.single_name(first, &mut children)?;
        }
        self.attributes(&mut children)?;
        self.end_statement(&mut children, mark)?;
        Ok(node(Rule::PropertyShorthand, children))
    }

    fn function_declaration(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        while self.is_modifier() {
            children.push(self.bump());
        }
        if !self.check(TokenKind::Function) {
            let ty = self.dotted_name()?;
            children.push(node(Rule::ReturnType, vec![node(Rule::TypeName, ty)]));
        }
        self.expect(TokenKind::Function, &mut children)?;
        self.expect_word(&mut children)?;
        children.push(self.parameter_list()?);
        self.attributes(&mut children)?;
        if self.check(TokenKind::LBrace) {
            children.push(self.block()?);
        } else {
            let mark = self.diagnostics.len();
            self.end_statement(&mut children, mark)?;
        }
        Ok(node(Rule::FunctionDeclaration, children))
    }

    fn is_modifier(&self) -> bool {
        let token = self.current();
        token.kind == TokenKind::Identifier
            && self.peek_kind(1) != TokenKind::Dot
            && MODIFIERS.iter().any(|m| m.eq_ignore_ascii_case(&token.lexeme))
    }

    fn parameter_list(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        self.expect(TokenKind::LParen, &mut children)?;
        if !self.check(TokenKind::RParen) {
            loop {
                children.push(self.parameter()?);
                if !self.eat(TokenKind::Comma, &mut children) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, &mut children)?;
        Ok(node(Rule::ParameterList, children))
    }

    /// `[required] [type] name [= default] [attr=value ...]`
    fn parameter(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        if self.current().is_word_named("required") && self.peek_kind(1).is_word() {
            children.push(self.bump());
        }
        let first = self.dotted_name()?;
        self.typed_name(first, &mut children)?;
        if self.check(TokenKind::Assign) {
            children.push(self.bump());
            children.push(self.ternary()?);
        }
        self.attributes(&mut children)?;
        Ok(node(Rule::Parameter, children))
    }

    /// Given a dotted name just parsed: if a word follows, the dotted name
    /// was a type and the word is the name; otherwise it was the name.
    fn typed_name(&mut self, first: Vec<ParseTree>, children: &mut Vec<ParseTree>) -> PResult<()> {
        if self.kind().is_word() {
            children.push(node(Rule::TypeName, first));
            children.push(self.bump());
            Ok(())
        } else {
            self.single_name(first, children)
        }
    }

    fn single_name(&mut self, name: Vec<ParseTree>, children: &mut Vec<ParseTree>) -> PResult<()> {
        if name.len() == 1 {
            children.extend(name);
            return Ok(());
        }
        children.push(node(Rule::TypeName, name));
        let found = self.found();
        self.report(
            ErrorCode::ExpectedIdentifier,
            format!("expected a name, found {}", found),
        )?;
        children.push(ParseTree::Missing("identifier"));
        Ok(())
    }

    /// `word (. word)*`
    fn dotted_name(&mut self) -> PResult<Vec<ParseTree>> {
        let mut parts = Vec::new();
        self.expect_word(&mut parts)?;
        while self.check(TokenKind::Dot) && self.peek_kind(1).is_word() {
            parts.push(self.bump());
            parts.push(self.bump());
        }
        Ok(parts)
    }

    /// `name=value` pairs.
    fn attributes(&mut self, children: &mut Vec<ParseTree>) -> PResult<()> {
        while self.kind().is_word() && self.peek_kind(1) == TokenKind::Assign {
            let mut attribute = vec![self.bump(), self.bump()];
            attribute.push(self.ternary()?);
            children.push(node(Rule::Attribute, attribute));
        }
        Ok(())
    }

    /// Statement terminator: `;` is required unless a `}` or the end of
    /// input follows.
    fn end_statement(&mut self, children: &mut Vec<ParseTree>, mark: usize) -> PResult<()> {
        if self.check(TokenKind::Semicolon) {
            children.push(self.bump());
            return Ok(());
        }
        if self.check(TokenKind::RBrace) || self.at_end() {
            return Ok(());
        }
        if self.diagnostics.len() > mark {
            self.skip_statement(children);
            return Ok(());
        }
        let found = self.found();
        self.report(
            ErrorCode::MissingSemicolon,
            format!("expected ';', found {}", found),
        )?;
        children.push(ParseTree::Missing("';'"));
        Ok(())
    }

    // ========== Expressions ==========

    pub(crate) fn expression(&mut self) -> PResult<ParseTree> {
        let left = self.ternary()?;
        if self.kind().is_assignment_op() {
            let op = self.bump();
            let right = self.expression()?;
            return Ok(node(Rule::AssignmentExpression, vec![left, op, right]));
        }
        Ok(left)
    }

    fn ternary(&mut self) -> PResult<ParseTree> {
        let condition = self.binary(0)?;
        match self.kind() {
            TokenKind::Question => {
                let mut children = vec![condition, self.bump()];
                children.push(self.ternary()?);
                self.expect(TokenKind::Colon, &mut children)?;
                children.push(self.ternary()?);
                Ok(node(Rule::TernaryExpression, children))
            }
            TokenKind::Elvis => {
                let children = vec![condition, self.bump(), self.ternary()?];
                Ok(node(Rule::ElvisExpression, children))
            }
            _ => Ok(condition),
        }
    }

    fn binary(&mut self, level: usize) -> PResult<ParseTree> {
        if level == NOT_LEVEL && self.check(TokenKind::NotWord) {
            let op = self.bump();
            let operand = self.binary(level)?;
            return Ok(node(Rule::UnaryExpression, vec![op, operand]));
        }
        let Some(ops) = BINARY_LEVELS.get(level) else {
            return self.unary();
        };
        let mut left = self.binary(level + 1)?;
        while ops.contains(&self.kind()) {
            let mut children = vec![left];
            self.operator(&mut children)?;
            children.push(self.binary(level + 1)?);
            left = node(Rule::BinaryExpression, children);
        }
        Ok(left)
    }

    /// Operator tokens, including `IS NOT` and `DOES NOT CONTAIN`.
    fn operator(&mut self, children: &mut Vec<ParseTree>) -> PResult<()> {
        let op = self.stream.advance();
        let kind = op.kind;
        children.push(ParseTree::Token(op));
        match kind {
            TokenKind::Is => {
                self.eat(TokenKind::NotWord, children);
            }
            TokenKind::Does => {
                self.expect(TokenKind::NotWord, children)?;
                self.expect(TokenKind::Contain, children)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn unary(&mut self) -> PResult<ParseTree> {
        match self.kind() {
            TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Bang
            | TokenKind::NotWord
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                let op = self.bump();
                let operand = self.unary()?;
                Ok(node(Rule::UnaryExpression, vec![op, operand]))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> PResult<ParseTree> {
        let mut expr = self.primary()?;
        loop {
            expr = match self.kind() {
                TokenKind::LParen => {
                    let args = self.argument_list()?;
                    node(Rule::CallExpression, vec![expr, args])
                }
                TokenKind::Dot | TokenKind::SafeDot => {
                    let mut children = vec![expr, self.bump()];
                    self.expect_word(&mut children)?;
                    node(Rule::MemberExpression, children)
                }
                TokenKind::LBracket => {
                    let mut children = vec![expr, self.bump()];
                    children.push(self.expression()?);
                    self.expect(TokenKind::RBracket, &mut children)?;
                    node(Rule::IndexExpression, children)
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    node(Rule::PostfixExpression, vec![expr, self.bump()])
                }
                _ => return Ok(expr),
            };
        }
    }

    fn argument_list(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        self.expect(TokenKind::LParen, &mut children)?;
        if !self.check(TokenKind::RParen) {
            loop {
                let argument = if self.kind().is_word() && self.peek_kind(1) == TokenKind::Assign
                {
                    vec![self.bump(), self.bump(), self.ternary()?]
                } else {
                    vec![self.expression()?]
                };
                children.push(node(Rule::Argument, argument));
                if !self.eat(TokenKind::Comma, &mut children) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, &mut children)?;
        Ok(node(Rule::ArgumentList, children))
    }

    fn primary(&mut self) -> PResult<ParseTree> {
        match self.kind() {
            TokenKind::Integer
            | TokenKind::Float
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => Ok(self.bump()),
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::Arrow => {
                let children = vec![self.bump(), self.bump()];
                self.arrow_body(children)
            }
            TokenKind::Identifier => Ok(self.bump()),
            TokenKind::LParen => self.paren_or_arrow(),
            TokenKind::LBracket => self.array_literal(),
            TokenKind::LBrace => self.struct_literal(),
            TokenKind::New => self.new_expression(),
            TokenKind::Function => self.function_expression(),
            TokenKind::Error => self.error_token(),
            kind => {
                let found = self.found();
                self.report(
                    ErrorCode::ExpectedExpression,
                    format!("expected expression, found {}", found),
                )?;
                if is_sync_token(kind) || is_stmt_start(kind) {
                    Ok(ParseTree::Missing("expression"))
                } else {
                    Ok(ParseTree::Error(self.stream.advance()))
                }
            }
        }
    }

    fn paren_or_arrow(&mut self) -> PResult<ParseTree> {
        let (k1, k2) = (self.peek_kind(1), self.peek_kind(2));
        let arrow = if k1 == TokenKind::RParen {
            k2 == TokenKind::Arrow
        } else if k1.is_word()
            && (k2.is_word()
                || matches!(k2, TokenKind::RParen | TokenKind::Comma | TokenKind::Assign))
        {
            self.require_general("parenthesized arrow function parameters")?;
            self.scan_arrow()
        } else {
            false
        };

        if arrow {
            let children = vec![self.parameter_list()?, self.bump()];
            return self.arrow_body(children);
        }

        let mut children = vec![self.bump()];
        children.push(self.expression()?);
        self.expect(TokenKind::RParen, &mut children)?;
        Ok(node(Rule::ParenExpression, children))
    }

    /// Scan to the `)` matching the current `(` and check for `=>` after it.
    fn scan_arrow(&self) -> bool {
        let mut depth = 0usize;
        let mut i = 0;
        loop {
            match self.peek_kind(i) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.peek_kind(i + 1) == TokenKind::Arrow;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
    }

    fn arrow_body(&mut self, mut children: Vec<ParseTree>) -> PResult<ParseTree> {
        if self.check(TokenKind::LBrace) {
            children.push(self.block()?);
        } else {
            children.push(self.expression()?);
        }
        Ok(node(Rule::ArrowFunction, children))
    }

    fn array_literal(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        if !self.check(TokenKind::RBracket) {
            loop {
                children.push(self.expression()?);
                if !self.eat(TokenKind::Comma, &mut children) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket, &mut children)?;
        Ok(node(Rule::ArrayLiteral, children))
    }

    fn struct_literal(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        if !self.check(TokenKind::RBrace) {
            loop {
                children.push(self.struct_entry()?);
                if !self.eat(TokenKind::Comma, &mut children) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, &mut children)?;
        Ok(node(Rule::StructLiteral, children))
    }

    fn struct_entry(&mut self) -> PResult<ParseTree> {
        let mut children = Vec::new();
        let key = self.kind();
        if key.is_word() || matches!(key, TokenKind::StringLiteral | TokenKind::Integer) {
            children.push(self.bump());
        } else {
            let found = self.found();
            self.report(
                ErrorCode::ExpectedIdentifier,
                format!("expected a struct key, found {}", found),
            )?;
            children.push(ParseTree::Missing("identifier"));
        }
        if matches!(self.kind(), TokenKind::Colon | TokenKind::Assign) {
            children.push(self.bump());
        } else {
            self.expect(TokenKind::Colon, &mut children)?;
        }
        children.push(self.expression()?);
        Ok(node(Rule::StructEntry, children))
    }

    fn new_expression(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        if self.check(TokenKind::StringLiteral) {
            children.push(self.bump());
        } else {
            let path = self.dotted_name()?;
            children.push(node(Rule::TypeName, path));
        }
        if self.check(TokenKind::LParen) {
            children.push(self.argument_list()?);
        }
        Ok(node(Rule::NewExpression, children))
    }

    fn function_expression(&mut self) -> PResult<ParseTree> {
        let mut children = vec![self.bump()];
        children.push(self.parameter_list()?);
        children.push(self.block()?);
        Ok(node(Rule::FunctionExpression, children))
    }

    // ========== Token Helpers ==========

    fn current(&self) -> &Token {
        self.stream.current()
    }

    fn kind(&self) -> TokenKind {
        self.stream.current().kind
    }

    fn peek_kind(&self, n: usize) -> TokenKind {
        self.stream.peek(n).kind
    }

    fn at_end(&self) -> bool {
        self.stream.at_end()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn bump(&mut self) -> ParseTree {
        ParseTree::Token(self.stream.advance())
    }

    fn eat(&mut self, kind: TokenKind, children: &mut Vec<ParseTree>) -> bool {
        if self.check(kind) {
            children.push(self.bump());
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report it missing and record a placeholder.
    fn expect(&mut self, kind: TokenKind, children: &mut Vec<ParseTree>) -> PResult<()> {
        if self.eat(kind, children) {
            return Ok(());
        }
        let code = match kind {
            TokenKind::Semicolon => ErrorCode::MissingSemicolon,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                ErrorCode::UnclosedDelimiter
            }
            _ => ErrorCode::UnexpectedToken,
        };
        let found = self.found();
        self.report(code, format!("expected {}, found {}", kind.describe(), found))?;
        children.push(ParseTree::Missing(kind.describe()));
        Ok(())
    }

    /// Consume an identifier or keyword used as a name.
    fn expect_word(&mut self, children: &mut Vec<ParseTree>) -> PResult<()> {
        if self.kind().is_word() {
            children.push(self.bump());
            return Ok(());
        }
        let found = self.found();
        self.report(
            ErrorCode::ExpectedIdentifier,
            format!("expected identifier, found {}", found),
        )?;
        children.push(ParseTree::Missing("identifier"));
        Ok(())
    }

    fn found(&self) -> String {
        if self.at_end() {
            "end of input".to_string()
        } else {
            format!("'{}'", self.current().lexeme)
        }
    }

    fn bail(&self, reason: impl Into<String>) -> Bail {
        Bail {
            token: self.current().clone(),
            reason: reason.into(),
        }
    }

    /// Record an error, or abort when errors are fatal (fast mode or while
    /// speculating).
    fn report(&mut self, code: ErrorCode, message: impl Into<String>) -> PResult<()> {
        let message = message.into();
        if self.mode == PredictionMode::Fast || self.speculating > 0 {
            return Err(self.bail(message));
        }
        let token = self.current();
        let span = token.span;
        let diagnostic = Diagnostic::error(DiagnosticKind::Parser, span, message)
            .with_code(code)
            .with_label(Label::new(span, "here"))
            .at_line(token.line)
            .with_context(token.lexeme.clone());
        let diagnostic = match code.suggestion() {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        };
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    /// Decisions that need more than [`FAST_LOOKAHEAD`] tokens.
    fn require_general(&self, decision: &str) -> PResult<()> {
        if self.mode == PredictionMode::Fast {
            log::trace!("fast prediction cannot decide: {}", decision);
            return Err(self.bail(format!("ambiguous {}", decision)));
        }
        Ok(())
    }

    /// A token the lexer already rejected; it has its own diagnostic.
    fn error_token(&mut self) -> PResult<ParseTree> {
        if self.mode == PredictionMode::Fast || self.speculating > 0 {
            return Err(self.bail("invalid token"));
        }
        Ok(ParseTree::Error(self.stream.advance()))
    }

    /// Run `f` without consuming input; errors inside are not reported.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        let pos = self.stream.pos();
        let mark = self.diagnostics.len();
        log::trace!("speculating at token {}", pos);
        self.speculating += 1;
        let result = f(self);
        self.speculating -= 1;
        self.stream.seek(pos);
        self.diagnostics.truncate(mark);
        result.ok()
    }

    // ========== Error Recovery ==========

    /// Skip the rest of a broken statement, through its `;` if there is one,
    /// without crossing a `}` that closes an enclosing block.
    /// 跳过出错语句的剩余部分。
    fn skip_statement(&mut self, children: &mut Vec<ParseTree>) {
        self.delimiters.clear();
        while !self.at_end() {
            let kind = self.kind();
            if kind == TokenKind::RBrace && !self.delimiters.inside(DelimiterKind::Brace) {
                break;
            }
            if self.delimiters.is_empty() {
                if kind == TokenKind::Semicolon {
                    children.push(self.bump());
                    break;
                }
                if is_stmt_start(kind) {
                    break;
                }
            }
            self.delimiters.update(kind);
            children.push(ParseTree::Error(self.stream.advance()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfml_lexer::Lexer;

    fn parser(source: &str, mode: PredictionMode) -> Parser {
        let (tokens, _) = Lexer::new(source).tokenize();
        Parser::new(TokenStream::new(&tokens), mode)
    }

    fn tree(source: &str) -> String {
        parser(source, PredictionMode::General)
            .parse(EntryRule::ScriptBlock)
            .map(|t| t.to_lisp())
            .unwrap_or_default()
    }

    #[test]
    fn test_property_alternatives() {
        assert_eq!(
            tree("property name=\"foo\";"),
            "(scriptBlock (propertyFull property (attribute name = \"foo\") ;) <EOF>)"
        );
        assert_eq!(
            tree("property string foo;"),
            "(scriptBlock (propertyShorthand property (typeName string) foo ;) <EOF>)"
        );
        assert_eq!(
            tree("property foo default=1;"),
            "(scriptBlock (propertyShorthand property foo (attribute default = 1) ;) <EOF>)"
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            tree("x = a + b * c;"),
            "(scriptBlock (expressionStatement (assignmentExpression x = (binaryExpression a + (binaryExpression b * c))) ;) <EOF>)"
        );
    }

    #[test]
    fn test_word_operators() {
        assert_eq!(
            tree("a IS NOT b AND NOT c"),
            "(scriptBlock (expressionStatement (binaryExpression (binaryExpression a IS NOT b) AND (unaryExpression NOT c))) <EOF>)"
        );
    }

    #[test]
    fn test_fast_bails_on_arrow() {
        let mut p = parser("f = (a, b) => a + b;", PredictionMode::Fast);
        assert!(p.parse(EntryRule::ScriptBlock).is_err());
        let mut p = parser("f = (a, b) => a + b;", PredictionMode::General);
        let tree = p.parse(EntryRule::ScriptBlock).map(|t| t.to_lisp());
        assert_eq!(
            tree.as_deref(),
            Ok("(scriptBlock (expressionStatement (assignmentExpression f = (arrowFunction (parameterList ( (parameter a) , (parameter b) )) => (binaryExpression a + b))) ;) <EOF>)")
        );
        assert!(p.diagnostics().is_empty());
    }

    #[test]
    fn test_fast_bails_on_first_error() {
        let mut p = parser("x = ;", PredictionMode::Fast);
        let bail = p.parse(EntryRule::ScriptBlock).unwrap_err();
        assert_eq!(bail.token.kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_general_recovers() {
        let mut p = parser("x = ; y = 2;", PredictionMode::General);
        let tree = p.parse(EntryRule::ScriptBlock).unwrap();
        assert!(tree.has_errors());
        assert_eq!(p.diagnostics().len(), 1);
        assert!(tree.to_lisp().contains("(assignmentExpression y = 2)"));
    }

    #[test]
    fn test_missing_semicolon() {
        let mut p = parser("a = 1 b = 2;", PredictionMode::General);
        let tree = p.parse(EntryRule::ScriptBlock).unwrap();
        assert!(tree.to_lisp().contains("<missing ';'>"));
        assert_eq!(
            p.diagnostics().iter().next().and_then(|d| d.code),
            Some(ErrorCode::MissingSemicolon)
        );
    }

    #[test]
    fn test_semicolon_optional_before_brace_and_eof() {
        let mut p = parser("if (x) { y = 1 } z = 2", PredictionMode::Fast);
        assert!(p.parse(EntryRule::ScriptBlock).is_ok());
    }

    #[test]
    fn test_dotted_return_type() {
        let mut p = parser("com.foo.Bar function make() { }", PredictionMode::Fast);
        assert!(p.parse(EntryRule::ScriptBlock).is_err());
        assert_eq!(
            tree("com.foo.Bar function make() { }"),
            "(scriptBlock (functionDeclaration (returnType (typeName com . foo . Bar)) function make (parameterList ( )) (block { })) <EOF>)"
        );
    }

    #[test]
    fn test_reset_restarts() {
        let mut p = parser("x = (a) => a;", PredictionMode::Fast);
        assert!(p.parse(EntryRule::ScriptBlock).is_err());
        p.reset(PredictionMode::General);
        assert!(p.parse(EntryRule::ScriptBlock).is_ok());
        assert!(p.diagnostics().is_empty());
    }

    #[test]
    fn test_progress_on_garbage() {
        let mut p = parser(") ) ] }", PredictionMode::General);
        let tree = p.parse(EntryRule::ScriptBlock).unwrap();
        assert!(tree.has_errors());
        assert!(!p.diagnostics().is_empty());
    }
}
