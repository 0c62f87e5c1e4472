//! Parse tree to AST conversion.
//! 解析树到 AST 的转换。

use cfml_common::Span;
use cfml_diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, ErrorCode, Label};
use cfml_lexer::{Token, TokenKind};
use cfml_parser::{ParseNode, ParseTree, Rule};
use cfml_syntax::{
    Argument, AssignOp, AttributeMap, BinaryOp, CatchClause, ComponentDecl, ComponentKind,
    Expression, ExpressionKind, FunctionBody, FunctionDecl, FunctionExpression, Identifier,
    KeySeparator, Literal, Parameter, PostfixOp, PropertyStatement, Quote, Statement,
    StatementKind, StringLiteral, StructEntry, SwitchCase, TagKind, TagStatement, UnaryOp, valid,
};
use thiserror::Error;

use crate::LowerOptions;
use crate::validate;

/// A parse tree shape the builder cannot turn into an AST node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: String,
        span: Span,
    },
    #[error("missing {what}")]
    Missing { what: &'static str, span: Span },
    #[error("a shorthand property must have a name")]
    MissingPropertyName { span: Span },
    #[error("unknown operator '{op}'")]
    UnknownOperator { op: String, span: Span },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::Unexpected { span, .. }
            | LowerError::Missing { span, .. }
            | LowerError::MissingPropertyName { span }
            | LowerError::UnknownOperator { span, .. } => *span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LowerError::MissingPropertyName { .. } => ErrorCode::MissingPropertyName,
            _ => ErrorCode::MalformedNode,
        }
    }
}

type LResult<T> = Result<T, LowerError>;

/// Builds AST nodes from a parse tree.
/// 从解析树构建 AST 节点。
///
/// Attribute problems are collected as diagnostics. A statement inside a
/// block that cannot be built is reported and left out; the rest of the
/// block is still built.
pub struct AstBuilder<'a> {
    /// Validation policy and dictionary. / 验证策略和字典。
    options: LowerOptions<'a>,
    /// Validation and structural diagnostics. / 验证和结构诊断。
    diagnostics: Diagnostics,
}

impl<'a> AstBuilder<'a> {
    pub fn new(options: LowerOptions<'a>) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Build the root of a parse. An empty script gives `None`, a script of
    /// one statement gives that statement, and a longer one a `ScriptBlock`.
    pub fn lower_root(&mut self, tree: &ParseTree) -> Option<Statement> {
        let node = tree.as_node()?;
        match node.rule {
            Rule::ScriptBlock => {
                let mut statements = self.statement_list(&node.children);
                match statements.len() {
                    0 => None,
                    1 => statements.pop(),
                    _ => Some(Statement::new(
                        StatementKind::ScriptBlock(statements),
                        node.span(),
                    )),
                }
            }
            Rule::StandaloneExpression => {
                let first = node.children.first()?;
                match self.lower_expression(first) {
                    Ok(expr) => {
                        let span = expr.span;
                        Some(Statement::new(StatementKind::Expression(expr), span))
                    }
                    Err(err) => {
                        self.malformed(tree, node, &err);
                        None
                    }
                }
            }
            _ => match self.lower_statement(tree) {
                Ok(statement) => Some(statement),
                Err(err) => {
                    self.malformed(tree, node, &err);
                    None
                }
            },
        }
    }

    /// Build one statement node.
    pub fn lower_statement(&mut self, tree: &ParseTree) -> LResult<Statement> {
        let node = expect_node(tree, "statement")?;
        let kind = match node.rule {
            Rule::ScriptBlock => StatementKind::ScriptBlock(self.statement_list(&node.children)),
            Rule::Block => StatementKind::Block(self.statement_list(&node.children)),
            Rule::EmptyStatement => StatementKind::Block(Vec::new()),
            Rule::ExpressionStatement => {
                StatementKind::Expression(self.lower_expression(child(node, 0)?)?)
            }
            Rule::VarStatement => self.lower_var(node)?,
            Rule::IfStatement => self.lower_if(node)?,
            Rule::WhileStatement => {
                let ops = operands(node);
                StatementKind::While {
                    condition: self.lower_expression(operand(node, &ops, 1)?)?,
                    body: Box::new(self.lower_statement(operand(node, &ops, 2)?)?),
                }
            }
            Rule::DoWhileStatement => {
                let ops = operands(node);
                let condition = ops.last().copied().filter(|_| ops.len() > 2);
                StatementKind::DoWhile {
                    body: Box::new(self.lower_statement(operand(node, &ops, 1)?)?),
                    condition: self.lower_expression(condition.ok_or(LowerError::Missing {
                        what: "condition",
                        span: node.span(),
                    })?)?,
                }
            }
            Rule::ForStatement => self.lower_for(node)?,
            Rule::ForInStatement => self.lower_for_in(node)?,
            Rule::SwitchStatement => self.lower_switch(node)?,
            Rule::BreakStatement => StatementKind::Break,
            Rule::ContinueStatement => StatementKind::Continue,
            Rule::ReturnStatement => StatementKind::Return(self.optional_value(node)?),
            Rule::ThrowStatement => StatementKind::Throw(self.optional_value(node)?),
            Rule::AbortStatement => StatementKind::Abort(self.optional_value(node)?),
            Rule::IncludeStatement => {
                let ops = operands(node);
                StatementKind::Include(self.lower_expression(operand(node, &ops, 1)?)?)
            }
            Rule::TryStatement => self.lower_try(node)?,
            Rule::ImportStatement => {
                let ops = operands(node);
                let path = match operand(node, &ops, 1)? {
                    ParseTree::Token(t) if t.kind == TokenKind::StringLiteral => t.lexeme.clone(),
                    ParseTree::Node(n) if n.rule == Rule::TypeName => n.text(),
                    other => return Err(unexpected("import path", other)),
                };
                StatementKind::Import(path)
            }
            Rule::ComponentDeclaration | Rule::InterfaceDeclaration => {
                let kind = if node.rule == Rule::InterfaceDeclaration {
                    ComponentKind::Interface
                } else {
                    ComponentKind::Component
                };
                let attributes =
                    self.attribute_map(node, Some((kind.keyword(), kind.valid_attributes())))?;
                let body = self.block_body(node)?.unwrap_or_default();
                StatementKind::Component(ComponentDecl {
                    kind,
                    attributes,
                    body,
                })
            }
            Rule::TagStatement => {
                let keyword = child(node, 0)?;
                let tag = keyword
                    .as_token()
                    .and_then(|t| TagKind::from_keyword(&t.lexeme))
                    .ok_or_else(|| unexpected("tag keyword", keyword))?;
                let attributes =
                    self.attribute_map(node, Some((tag.keyword(), tag.valid_attributes())))?;
                let body = self.block_body(node)?;
                StatementKind::Tag(TagStatement {
                    tag,
                    attributes,
                    body,
                })
            }
            Rule::PropertyFull => {
                let attributes = self.attribute_map(node, Some(("property", valid::PROPERTY)))?;
                StatementKind::Property(PropertyStatement::full(attributes))
            }
            Rule::PropertyShorthand => self.lower_shorthand_property(node)?,
            Rule::FunctionDeclaration => self.lower_function(node)?,
            rule => {
                return Err(LowerError::Unexpected {
                    expected: "statement",
                    found: rule.name().to_string(),
                    span: node.span(),
                });
            }
        };
        Ok(Statement::new(kind, node.span()))
    }

    /// Build statements from a list of children, skipping tokens and
    /// reporting statements that cannot be built.
    fn statement_list(&mut self, children: &[ParseTree]) -> Vec<Statement> {
        let mut statements = Vec::new();
        for tree in children {
            let ParseTree::Node(node) = tree else {
                continue;
            };
            if node.rule == Rule::EmptyStatement {
                continue;
            }
            match self.lower_statement(tree) {
                Ok(statement) => statements.push(statement),
                Err(err) => self.malformed(tree, node, &err),
            }
        }
        statements
    }

    /// Report a statement that was left out. Subtrees with skipped or
    /// assumed tokens already have a parser diagnostic.
    fn malformed(&mut self, tree: &ParseTree, node: &ParseNode, err: &LowerError) {
        if tree.has_errors() {
            log::debug!("dropping {} with syntax errors: {}", node.rule.name(), err);
            return;
        }
        let span = if err.span() == Span::DUMMY {
            node.span()
        } else {
            err.span()
        };
        let line = node.first_token().map_or(0, |t| t.line);
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Structural,
                span,
                format!("malformed {}: {}", node.rule.name(), err),
            )
            .with_code(err.code())
            .with_label(Label::new(span, "cannot build this statement"))
            .at_line(line),
        );
    }

    fn block_body(&mut self, node: &ParseNode) -> LResult<Option<Vec<Statement>>> {
        match node.node(Rule::Block) {
            Some(block) => Ok(Some(self.statement_list(&block.children))),
            None => Ok(None),
        }
    }

    fn required_block(&mut self, node: &ParseNode) -> LResult<Vec<Statement>> {
        self.block_body(node)?.ok_or(LowerError::Missing {
            what: "block",
            span: node.span(),
        })
    }

    fn optional_value(&mut self, node: &ParseNode) -> LResult<Option<Expression>> {
        let ops = operands(node);
        ops.get(1)
            .map(|tree| self.lower_expression(tree))
            .transpose()
    }

    // ========== Statements ==========

    fn lower_var(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let ops = operands(node);
        let name = identifier(operand(node, &ops, 1)?, "variable name")?;
        let value = match ops.get(2) {
            Some(ParseTree::Token(t)) if t.kind == TokenKind::Assign => {
                Some(self.lower_expression(operand(node, &ops, 3)?)?)
            }
            _ => None,
        };
        Ok(StatementKind::Var { name, value })
    }

    fn lower_if(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let ops = operands(node);
        let condition = self.lower_expression(operand(node, &ops, 1)?)?;
        let then_branch = Box::new(self.lower_statement(operand(node, &ops, 2)?)?);
        let else_branch = match ops.get(3) {
            Some(ParseTree::Token(t)) if t.kind == TokenKind::Else => {
                Some(Box::new(self.lower_statement(operand(node, &ops, 4)?)?))
            }
            _ => None,
        };
        Ok(StatementKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `for (init; condition; update) body`. Clauses are split on the
    /// separators, so an empty clause is simply absent.
    fn lower_for(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let Some((body, header)) = node.children.split_last() else {
            return Err(LowerError::Missing {
                what: "loop body",
                span: node.span(),
            });
        };
        let mut clauses: [Option<&ParseTree>; 3] = [None; 3];
        let mut index = 0;
        for tree in header.iter().skip(2) {
            match tree {
                ParseTree::Token(t) if t.kind == TokenKind::Semicolon => index += 1,
                ParseTree::Missing("';'") => index += 1,
                ParseTree::Token(t) if t.kind == TokenKind::RParen => break,
                ParseTree::Missing("')'") => break,
                tree if is_filler(tree) => {}
                tree => {
                    if let Some(slot) = clauses.get_mut(index) {
                        *slot = Some(tree);
                    }
                }
            }
        }

        let init = match clauses[0] {
            Some(tree) if tree.rule() == Some(Rule::VarStatement) => {
                Some(Box::new(self.lower_statement(tree)?))
            }
            Some(tree) => {
                let expr = self.lower_expression(tree)?;
                let span = expr.span;
                Some(Box::new(Statement::new(StatementKind::Expression(expr), span)))
            }
            None => None,
        };
        let condition = clauses[1].map(|t| self.lower_expression(t)).transpose()?;
        let update = clauses[2].map(|t| self.lower_expression(t)).transpose()?;
        Ok(StatementKind::For {
            init,
            condition,
            update,
            body: Box::new(self.lower_statement(body)?),
        })
    }

    fn lower_for_in(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let ops = operands(node);
        let var = matches!(ops.get(1), Some(ParseTree::Token(t)) if t.kind == TokenKind::Var);
        let mut index = if var { 2 } else { 1 };
        let target = self.lower_expression(operand(node, &ops, index)?)?;
        index += 1;
        if matches!(ops.get(index), Some(ParseTree::Token(t)) if t.kind == TokenKind::In) {
            index += 1;
        }
        let collection = self.lower_expression(operand(node, &ops, index)?)?;
        let body = Box::new(self.lower_statement(operand(node, &ops, index + 1)?)?);
        Ok(StatementKind::ForIn {
            var,
            target,
            collection,
            body,
        })
    }

    fn lower_switch(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let ops = operands(node);
        let subject = self.lower_expression(operand(node, &ops, 1)?)?;
        let mut cases = Vec::new();
        let mut default = None;
        for clause in node.children.iter().filter_map(ParseTree::as_node) {
            match clause.rule {
                Rule::CaseClause => {
                    let value = self.lower_expression(child(clause, 1)?)?;
                    let body = self.statement_list(clause.children.get(2..).unwrap_or_default());
                    cases.push(SwitchCase { value, body });
                }
                Rule::DefaultClause if default.is_none() => {
                    default = Some(self.statement_list(clause.children.get(1..).unwrap_or_default()));
                }
                _ => {}
            }
        }
        Ok(StatementKind::Switch {
            subject,
            cases,
            default,
        })
    }

    fn lower_try(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let body = self.required_block(node)?;
        let mut catches = Vec::new();
        for clause in node.nodes(Rule::CatchClause) {
            let ops = operands(clause);
            let mut rest = ops.iter().skip(1).copied();
            let mut next = rest.next();
            let mut exception_type = None;
            if let Some(ParseTree::Node(n)) = next {
                if n.rule == Rule::TypeName {
                    exception_type = Some(n.text());
                    next = rest.next();
                }
            }
            let variable = match next {
                Some(tree) => identifier(tree, "exception variable")?,
                None => {
                    return Err(LowerError::Missing {
                        what: "exception variable",
                        span: clause.span(),
                    });
                }
            };
            catches.push(CatchClause {
                exception_type,
                variable,
                body: self.required_block(clause)?,
            });
        }
        let finally = match node.node(Rule::FinallyClause) {
            Some(clause) => Some(self.required_block(clause)?),
            None => None,
        };
        Ok(StatementKind::Try {
            body,
            catches,
            finally,
        })
    }

    /// `property [type] name [attributes]`: the name and type go to the
    /// typed fields, never to the attribute map.
    fn lower_shorthand_property(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let missing_name = || LowerError::MissingPropertyName { span: node.span() };
        let ops: Vec<&ParseTree> = operands(node)
            .into_iter()
            .skip(1)
            .filter(|t| t.rule() != Some(Rule::Attribute))
            .collect();
        let (property_type, name) = match ops.as_slice() {
            [ParseTree::Node(ty), name, ..] if ty.rule == Rule::TypeName => {
                (Some(type_identifier(ty)), *name)
            }
            [name, ..] => (None, *name),
            [] => return Err(missing_name()),
        };
        let name = match name {
            ParseTree::Token(t) if t.kind.is_word() => Identifier::new(t.lexeme.clone(), t.span),
            ParseTree::Missing(_) => return Err(missing_name()),
            other => return Err(unexpected("property name", other)),
        };
        let attributes = self.attribute_map(node, Some(("property", valid::PROPERTY)))?;
        Ok(StatementKind::Property(PropertyStatement::shorthand(
            property_type,
            name,
            attributes,
        )))
    }

    fn lower_function(&mut self, node: &ParseNode) -> LResult<StatementKind> {
        let mut children = node.children.iter();
        let mut modifiers = Vec::new();
        let mut return_type = None;
        for tree in children.by_ref() {
            match tree {
                ParseTree::Token(t) if t.kind == TokenKind::Function => break,
                ParseTree::Missing(_) => break,
                ParseTree::Token(t) => modifiers.push(Identifier::new(t.lexeme.clone(), t.span)),
                ParseTree::Node(n) if n.rule == Rule::ReturnType => {
                    return_type = n.node(Rule::TypeName).map(type_identifier);
                }
                other => return Err(unexpected("'function'", other)),
            }
        }
        let name = match children.next() {
            Some(tree) => identifier(tree, "function name")?,
            None => {
                return Err(LowerError::Missing {
                    what: "function name",
                    span: node.span(),
                });
            }
        };
        let params = match node.node(Rule::ParameterList) {
            Some(list) => self.lower_parameters(list)?,
            None => Vec::new(),
        };
        let attributes = self.attribute_map(node, Some(("function", valid::FUNCTION)))?;
        let body = self.block_body(node)?;
        Ok(StatementKind::FunctionDecl(FunctionDecl {
            modifiers,
            return_type,
            name,
            params,
            attributes,
            body,
        }))
    }

    fn lower_parameters(&mut self, list: &ParseNode) -> LResult<Vec<Parameter>> {
        list.nodes(Rule::Parameter)
            .map(|param| self.lower_parameter(param))
            .collect()
    }

    /// `[required] [type] name [= default] [attributes]`
    fn lower_parameter(&mut self, node: &ParseNode) -> LResult<Parameter> {
        let ops: Vec<&ParseTree> = node
            .children
            .iter()
            .filter(|t| t.rule() != Some(Rule::Attribute))
            .collect();
        let mut index = 0;
        let required = match ops.as_slice() {
            [ParseTree::Token(first), next, ..] if first.is_word_named("required") => {
                matches!(next, ParseTree::Node(n) if n.rule == Rule::TypeName)
                    || matches!(next, ParseTree::Token(t) if t.kind.is_word())
            }
            _ => false,
        };
        if required {
            index += 1;
        }
        let mut param_type = None;
        if let Some(ParseTree::Node(ty)) = ops.get(index) {
            if ty.rule == Rule::TypeName {
                param_type = Some(type_identifier(ty));
                index += 1;
            }
        }
        let name = identifier(operand(node, &ops, index)?, "parameter name")?;
        let default = match ops.get(index + 1) {
            Some(ParseTree::Token(t)) if t.kind == TokenKind::Assign => {
                Some(self.lower_expression(operand(node, &ops, index + 2)?)?)
            }
            _ => None,
        };
        Ok(Parameter {
            required,
            param_type,
            name,
            default,
            attributes: self.attribute_map(node, None)?,
        })
    }

    /// Collect the `name=value` children of `node`. A repeated key keeps
    /// its first position and takes the later value. With `element`, keys
    /// are checked against that element's valid set.
    fn attribute_map(
        &mut self,
        node: &ParseNode,
        element: Option<(&'static str, &'static [&'static str])>,
    ) -> LResult<AttributeMap> {
        let mut map = AttributeMap::new();
        let mut lines = Vec::new();
        for attribute in node.nodes(Rule::Attribute) {
            let name = identifier(child(attribute, 0)?, "attribute name")?;
            let value = self.lower_expression(child(attribute, 2)?)?;
            let line = attribute.first_token().map_or(0, |t| t.line);
            if map.insert(name.clone(), value).is_some() {
                let owner = element.map_or("parameter", |(e, _)| e);
                if let Some(diagnostic) =
                    validate::duplicate_attribute(owner, &name, self.options.policy)
                {
                    self.diagnostics.push(diagnostic.at_line(line));
                }
            } else {
                lines.push(line);
            }
        }
        if let Some((element, valid)) = element {
            for (attribute, line) in map.iter().zip(lines) {
                if self.options.accepts(element, valid, &attribute.name.name) {
                    continue;
                }
                if let Some(diagnostic) =
                    validate::unknown_attribute(element, valid, attribute, self.options.policy)
                {
                    self.diagnostics.push(diagnostic.at_line(line));
                }
            }
        }
        Ok(map)
    }

    // ========== Expressions ==========

    /// Build one expression node.
    pub fn lower_expression(&mut self, tree: &ParseTree) -> LResult<Expression> {
        let node = match tree {
            ParseTree::Token(token) => return token_expression(token),
            ParseTree::Error(token) => {
                return Err(LowerError::Unexpected {
                    expected: "expression",
                    found: format!("'{}'", token.lexeme),
                    span: token.span,
                });
            }
            ParseTree::Missing(what) => {
                return Err(LowerError::Missing {
                    what: *what,
                    span: Span::DUMMY,
                });
            }
            ParseTree::Node(node) => node,
        };

        let kind = match node.rule {
            Rule::AssignmentExpression => ExpressionKind::Assignment {
                op: assign_op(child(node, 1)?)?,
                target: Box::new(self.lower_expression(child(node, 0)?)?),
                value: Box::new(self.lower_expression(child(node, 2)?)?),
            },
            Rule::TernaryExpression => ExpressionKind::Ternary {
                condition: Box::new(self.lower_expression(child(node, 0)?)?),
                then_value: Box::new(self.lower_expression(child(node, 2)?)?),
                else_value: Box::new(self.lower_expression(child(node, 4)?)?),
            },
            Rule::ElvisExpression => ExpressionKind::Elvis {
                value: Box::new(self.lower_expression(child(node, 0)?)?),
                default: Box::new(self.lower_expression(child(node, 2)?)?),
            },
            Rule::BinaryExpression => {
                let (first, rest) = node.children.split_first().ok_or(missing_operand(node))?;
                let (last, ops) = rest.split_last().ok_or(missing_operand(node))?;
                ExpressionKind::Binary {
                    op: binary_op(node, ops)?,
                    left: Box::new(self.lower_expression(first)?),
                    right: Box::new(self.lower_expression(last)?),
                }
            }
            Rule::UnaryExpression => ExpressionKind::Unary {
                op: unary_op(child(node, 0)?)?,
                operand: Box::new(self.lower_expression(child(node, 1)?)?),
            },
            Rule::PostfixExpression => {
                let op = match child(node, 1)? {
                    ParseTree::Token(t) if t.kind == TokenKind::PlusPlus => PostfixOp::Increment,
                    ParseTree::Token(t) if t.kind == TokenKind::MinusMinus => PostfixOp::Decrement,
                    other => return Err(unexpected("'++' or '--'", other)),
                };
                ExpressionKind::Postfix {
                    op,
                    operand: Box::new(self.lower_expression(child(node, 0)?)?),
                }
            }
            Rule::ParenExpression => {
                ExpressionKind::Paren(Box::new(self.lower_expression(child(node, 1)?)?))
            }
            Rule::CallExpression => ExpressionKind::Call {
                callee: Box::new(self.lower_expression(child(node, 0)?)?),
                args: self.lower_arguments(node)?,
            },
            Rule::MemberExpression => {
                let safe =
                    matches!(child(node, 1)?, ParseTree::Token(t) if t.kind == TokenKind::SafeDot);
                ExpressionKind::Member {
                    object: Box::new(self.lower_expression(child(node, 0)?)?),
                    property: identifier(child(node, 2)?, "member name")?,
                    safe,
                }
            }
            Rule::IndexExpression => ExpressionKind::Index {
                object: Box::new(self.lower_expression(child(node, 0)?)?),
                index: Box::new(self.lower_expression(child(node, 2)?)?),
            },
            Rule::ArrayLiteral => ExpressionKind::Array(
                operands(node)
                    .into_iter()
                    .map(|tree| self.lower_expression(tree))
                    .collect::<LResult<_>>()?,
            ),
            Rule::StructLiteral => ExpressionKind::Struct(
                node.nodes(Rule::StructEntry)
                    .map(|entry| self.lower_struct_entry(entry))
                    .collect::<LResult<_>>()?,
            ),
            Rule::NewExpression => {
                let class = match child(node, 1)? {
                    ParseTree::Token(t) if t.kind == TokenKind::StringLiteral => t.lexeme.clone(),
                    ParseTree::Node(n) if n.rule == Rule::TypeName => n.text(),
                    other => return Err(unexpected("class name", other)),
                };
                ExpressionKind::New {
                    class,
                    args: self.lower_arguments(node)?,
                }
            }
            Rule::FunctionExpression => ExpressionKind::Function(FunctionExpression {
                params: self.lower_parameter_list(node)?,
                body: FunctionBody::Block(self.required_block(node)?),
                arrow: false,
            }),
            Rule::ArrowFunction => self.lower_arrow(node)?,
            rule => {
                return Err(LowerError::Unexpected {
                    expected: "expression",
                    found: rule.name().to_string(),
                    span: node.span(),
                });
            }
        };
        Ok(Expression::new(kind, node.span()))
    }

    fn lower_parameter_list(&mut self, node: &ParseNode) -> LResult<Vec<Parameter>> {
        match node.node(Rule::ParameterList) {
            Some(list) => self.lower_parameters(list),
            None => Ok(Vec::new()),
        }
    }

    fn lower_arrow(&mut self, node: &ParseNode) -> LResult<ExpressionKind> {
        let params = match child(node, 0)? {
            ParseTree::Token(t) if t.kind.is_word() => {
                vec![Parameter::new(Identifier::new(t.lexeme.clone(), t.span))]
            }
            ParseTree::Node(list) if list.rule == Rule::ParameterList => {
                self.lower_parameters(list)?
            }
            other => return Err(unexpected("arrow function parameters", other)),
        };
        let body = match node.children.last() {
            Some(ParseTree::Node(block)) if block.rule == Rule::Block => {
                FunctionBody::Block(self.statement_list(&block.children))
            }
            Some(tree) => FunctionBody::Expression(Box::new(self.lower_expression(tree)?)),
            None => return Err(missing_operand(node)),
        };
        Ok(ExpressionKind::Function(FunctionExpression {
            params,
            body,
            arrow: true,
        }))
    }

    /// Arguments of a call or `new`; absent parentheses give no arguments.
    fn lower_arguments(&mut self, node: &ParseNode) -> LResult<Vec<Argument>> {
        let Some(list) = node.node(Rule::ArgumentList) else {
            return Ok(Vec::new());
        };
        let mut args = Vec::new();
        for argument in list.nodes(Rule::Argument) {
            let named = matches!(
                argument.children.get(1),
                Some(ParseTree::Token(t)) if t.kind == TokenKind::Assign
            );
            let arg = if named {
                Argument {
                    name: Some(identifier(child(argument, 0)?, "argument name")?),
                    value: self.lower_expression(child(argument, 2)?)?,
                }
            } else {
                Argument {
                    name: None,
                    value: self.lower_expression(child(argument, 0)?)?,
                }
            };
            args.push(arg);
        }
        Ok(args)
    }

    fn lower_struct_entry(&mut self, entry: &ParseNode) -> LResult<StructEntry> {
        let key = match child(entry, 0)? {
            // A bare word is always a key name, even `true` or `default`.
            ParseTree::Token(t) if t.kind.is_word() => Expression::new(
                ExpressionKind::Identifier(Identifier::new(t.lexeme.clone(), t.span)),
                t.span,
            ),
            other => self.lower_expression(other)?,
        };
        let separator = match child(entry, 1)? {
            ParseTree::Token(t) if t.kind == TokenKind::Assign => KeySeparator::Equals,
            _ => KeySeparator::Colon,
        };
        Ok(StructEntry {
            key,
            separator,
            value: self.lower_expression(child(entry, 2)?)?,
        })
    }
}

// ========== Tree Helpers ==========

/// Punctuation, assumed punctuation, and skipped tokens: children that never
/// hold a value.
fn is_filler(tree: &ParseTree) -> bool {
    match tree {
        ParseTree::Token(t) => matches!(
            t.kind,
            TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::Colon
                | TokenKind::Eof
        ),
        ParseTree::Missing(what) => what.starts_with('\''),
        ParseTree::Error(_) => true,
        ParseTree::Node(_) => false,
    }
}

/// Children of `node` that are not filler.
fn operands(node: &ParseNode) -> Vec<&ParseTree> {
    node.children.iter().filter(|t| !is_filler(t)).collect()
}

fn operand<'t>(node: &ParseNode, ops: &[&'t ParseTree], index: usize) -> LResult<&'t ParseTree> {
    ops.get(index).copied().ok_or(missing_operand(node))
}

fn child(node: &ParseNode, index: usize) -> LResult<&ParseTree> {
    node.children.get(index).ok_or(missing_operand(node))
}

fn missing_operand(node: &ParseNode) -> LowerError {
    LowerError::Missing {
        what: node.rule.name(),
        span: node.span(),
    }
}

fn expect_node<'t>(tree: &'t ParseTree, expected: &'static str) -> LResult<&'t ParseNode> {
    match tree {
        ParseTree::Node(node) => Ok(node),
        ParseTree::Missing(what) => Err(LowerError::Missing {
            what: *what,
            span: Span::DUMMY,
        }),
        other => Err(unexpected(expected, other)),
    }
}

fn describe(tree: &ParseTree) -> String {
    match tree {
        ParseTree::Node(node) => node.rule.name().to_string(),
        ParseTree::Token(t) | ParseTree::Error(t) if t.kind == TokenKind::Eof => {
            "end of input".to_string()
        }
        ParseTree::Token(t) | ParseTree::Error(t) => format!("'{}'", t.lexeme),
        ParseTree::Missing(what) => format!("<missing {}>", what),
    }
}

fn unexpected(expected: &'static str, found: &ParseTree) -> LowerError {
    LowerError::Unexpected {
        expected,
        found: describe(found),
        span: found.span().unwrap_or(Span::DUMMY),
    }
}

fn identifier(tree: &ParseTree, what: &'static str) -> LResult<Identifier> {
    match tree {
        ParseTree::Token(t) if t.kind.is_word() => Ok(Identifier::new(t.lexeme.clone(), t.span)),
        ParseTree::Missing(_) => Err(LowerError::Missing {
            what,
            span: Span::DUMMY,
        }),
        other => Err(unexpected(what, other)),
    }
}

/// A possibly dotted type name, kept as written.
fn type_identifier(node: &ParseNode) -> Identifier {
    Identifier::new(node.text(), node.span())
}

fn token_expression(token: &Token) -> LResult<Expression> {
    let literal = match token.kind {
        TokenKind::Integer | TokenKind::Float => Literal::Number(token.lexeme.clone()),
        TokenKind::StringLiteral => Literal::String(string_literal(token)?),
        TokenKind::True => Literal::Boolean(true),
        TokenKind::False => Literal::Boolean(false),
        TokenKind::Null => Literal::Null,
        kind if kind.is_word() => {
            return Ok(Expression::new(
                ExpressionKind::Identifier(Identifier::new(token.lexeme.clone(), token.span)),
                token.span,
            ));
        }
        _ => {
            return Err(LowerError::Unexpected {
                expected: "expression",
                found: format!("'{}'", token.lexeme),
                span: token.span,
            });
        }
    };
    Ok(Expression::new(ExpressionKind::Literal(literal), token.span))
}

/// Strip the quotes of a string token; the inner text is kept verbatim.
fn string_literal(token: &Token) -> LResult<StringLiteral> {
    let quote = if token.lexeme.starts_with('\'') {
        Quote::Single
    } else {
        Quote::Double
    };
    let q = quote.as_char();
    let inner = token
        .lexeme
        .strip_prefix(q)
        .and_then(|rest| rest.strip_suffix(q))
        .ok_or_else(|| LowerError::Unexpected {
            expected: "closed string",
            found: token.lexeme.clone(),
            span: token.span,
        })?;
    Ok(StringLiteral::new(inner, quote))
}

fn op_token<'t>(tree: &'t ParseTree, expected: &'static str) -> LResult<&'t Token> {
    tree.as_token().ok_or_else(|| unexpected(expected, tree))
}

fn unknown_operator(token: &Token) -> LowerError {
    LowerError::UnknownOperator {
        op: token.lexeme.clone(),
        span: token.span,
    }
}

fn assign_op(tree: &ParseTree) -> LResult<AssignOp> {
    let token = op_token(tree, "assignment operator")?;
    Ok(match token.kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::AmpEq => AssignOp::ConcatAssign,
        _ => return Err(unknown_operator(token)),
    })
}

fn unary_op(tree: &ParseTree) -> LResult<UnaryOp> {
    let token = op_token(tree, "unary operator")?;
    Ok(match token.kind {
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::NotWord => UnaryOp::NotWord,
        TokenKind::PlusPlus => UnaryOp::Increment,
        TokenKind::MinusMinus => UnaryOp::Decrement,
        _ => return Err(unknown_operator(token)),
    })
}

/// The operator between the operands of a binary node: one token, or the
/// word sequences `IS NOT` and `DOES NOT CONTAIN`.
fn binary_op(node: &ParseNode, ops: &[ParseTree]) -> LResult<BinaryOp> {
    let kinds: Vec<TokenKind> = ops
        .iter()
        .filter_map(ParseTree::as_token)
        .map(|t| t.kind)
        .collect();
    let op = match kinds.as_slice() {
        [TokenKind::Plus] => BinaryOp::Add,
        [TokenKind::Minus] => BinaryOp::Sub,
        [TokenKind::Star] => BinaryOp::Mul,
        [TokenKind::Slash] => BinaryOp::Div,
        [TokenKind::Backslash] => BinaryOp::IntDiv,
        [TokenKind::Percent] => BinaryOp::Mod,
        [TokenKind::ModWord] => BinaryOp::ModWord,
        [TokenKind::Caret] => BinaryOp::Pow,
        [TokenKind::Amp] => BinaryOp::Concat,
        [TokenKind::EqEq] => BinaryOp::Eq,
        [TokenKind::EqEqEq] => BinaryOp::StrictEq,
        [TokenKind::BangEq] => BinaryOp::Ne,
        [TokenKind::BangEqEq] => BinaryOp::StrictNe,
        [TokenKind::LtGt] => BinaryOp::LtGt,
        [TokenKind::Lt] => BinaryOp::Lt,
        [TokenKind::LtEq] => BinaryOp::Le,
        [TokenKind::Gt] => BinaryOp::Gt,
        [TokenKind::GtEq] => BinaryOp::Ge,
        [TokenKind::EqWord] => BinaryOp::EqWord,
        [TokenKind::NeqWord] => BinaryOp::NeqWord,
        [TokenKind::Is] => BinaryOp::Is,
        [TokenKind::Is, TokenKind::NotWord] => BinaryOp::IsNot,
        [TokenKind::GtWord] => BinaryOp::GtWord,
        [TokenKind::GteWord] => BinaryOp::GteWord,
        [TokenKind::GeWord] => BinaryOp::GeWord,
        [TokenKind::LtWord] => BinaryOp::LtWord,
        [TokenKind::LteWord] => BinaryOp::LteWord,
        [TokenKind::LeWord] => BinaryOp::LeWord,
        [TokenKind::Contains] => BinaryOp::Contains,
        [TokenKind::Does, ..] => BinaryOp::DoesNotContain,
        [TokenKind::AndAnd] => BinaryOp::And,
        [TokenKind::AndWord] => BinaryOp::AndWord,
        [TokenKind::OrOr] => BinaryOp::Or,
        [TokenKind::OrWord] => BinaryOp::OrWord,
        [TokenKind::Xor] => BinaryOp::Xor,
        [TokenKind::Eqv] => BinaryOp::Eqv,
        [TokenKind::Imp] => BinaryOp::Imp,
        _ => {
            let text: Vec<&str> = ops
                .iter()
                .filter_map(ParseTree::as_token)
                .map(|t| t.lexeme.as_str())
                .collect();
            return Err(LowerError::UnknownOperator {
                op: text.join(" "),
                span: node.span(),
            });
        }
    };
    Ok(op)
}
