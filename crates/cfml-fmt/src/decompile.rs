//! AST decompiler.
//! AST 反编译器。
//!
//! Renders statements and expressions back to canonical source text. The
//! output re-parses to an equal AST, and decompiling that AST again gives
//! the same text.
//! 将语句和表达式渲染回规范的源代码文本。

use crate::config::FormatConfig;
use crate::printer::Printer;
use cfml_syntax::{
    Argument, AttributeMap, BinaryOp, CatchClause, ComponentDecl, Expression, ExpressionKind,
    FunctionBody, FunctionDecl, Literal, Parameter, PropertyStatement, Statement, StatementKind,
    StructEntry, SwitchCase, TagStatement, UnaryOp, valid,
};

/// Rendering of an AST node at an indentation level.
/// 按缩进级别渲染 AST 节点。
///
/// The first line is not indented; every following line is prefixed with
/// `indent` plus its nesting depth in indent units.
pub trait Decompile {
    fn decompile(&self, indent: usize) -> String {
        self.decompile_with(indent, &FormatConfig::default())
    }

    fn decompile_with(&self, indent: usize, config: &FormatConfig) -> String;
}

impl Decompile for Statement {
    fn decompile_with(&self, indent: usize, config: &FormatConfig) -> String {
        let mut p = Printer::new(config, indent);
        Decompiler::new(config).write_statement(&mut p, self);
        p.finish()
    }
}

impl Decompile for Expression {
    fn decompile_with(&self, indent: usize, config: &FormatConfig) -> String {
        let mut p = Printer::new(config, indent);
        Decompiler::new(config).write_expr(&mut p, self, 0);
        p.finish()
    }
}

impl Decompile for PropertyStatement {
    fn decompile_with(&self, indent: usize, config: &FormatConfig) -> String {
        let mut p = Printer::new(config, indent);
        Decompiler::new(config).write_property(&mut p, self);
        p.finish()
    }
}

/// Attributes in insertion order, separated by spaces.
impl Decompile for AttributeMap {
    fn decompile_with(&self, indent: usize, config: &FormatConfig) -> String {
        let mut p = Printer::new(config, indent);
        let d = Decompiler::new(config);
        for (i, attribute) in self.iter().enumerate() {
            if i > 0 {
                p.space();
            }
            d.write_attribute(&mut p, &attribute.name.name, &attribute.value);
        }
        p.finish()
    }
}

// Binding strength of expressions, loosest first. Binary levels follow the
// parser's operator table at `BINARY_BASE + 2 * level`.
const ASSIGNMENT: u8 = 0;
const CONDITIONAL: u8 = 1;
const BINARY_BASE: u8 = 10;
/// Comparison level, where a leading word `NOT` takes a whole comparison.
const NOT_LEVEL: u8 = 5;
const NOT_WORD: u8 = BINARY_BASE + 2 * NOT_LEVEL - 1;
const PREFIX: u8 = 40;
const POSTFIX: u8 = 42;
const PRIMARY: u8 = 44;

fn binary_level(op: BinaryOp) -> u8 {
    use BinaryOp::*;
    match op {
        Imp => 0,
        Eqv => 1,
        Xor => 2,
        Or | OrWord => 3,
        And | AndWord => 4,
        Eq | StrictEq | Ne | StrictNe | LtGt | Lt | Le | Gt | Ge | EqWord | NeqWord | Is
        | IsNot | GtWord | GteWord | GeWord | LtWord | LteWord | LeWord | Contains
        | DoesNotContain => 5,
        Concat => 6,
        Add | Sub => 7,
        Mul | Div | Mod | ModWord | IntDiv => 8,
        Pow => 9,
    }
}

fn binary_precedence(op: BinaryOp) -> u8 {
    BINARY_BASE + 2 * binary_level(op)
}

/// `tight` is set where the parser reads a leading word `NOT` as a prefix
/// operator over a single operand rather than over a comparison.
fn precedence(expr: &Expression, tight: bool) -> u8 {
    match &expr.kind {
        ExpressionKind::Assignment { .. } => ASSIGNMENT,
        // An arrow body extends as far right as it can.
        ExpressionKind::Function(f) if f.arrow => CONDITIONAL,
        ExpressionKind::Ternary { .. } | ExpressionKind::Elvis { .. } => CONDITIONAL,
        ExpressionKind::Binary { op, .. } => binary_precedence(*op),
        ExpressionKind::Unary {
            op: UnaryOp::NotWord,
            ..
        } if !tight => NOT_WORD,
        ExpressionKind::Unary { .. } => PREFIX,
        ExpressionKind::Postfix { .. }
        | ExpressionKind::Call { .. }
        | ExpressionKind::Member { .. }
        | ExpressionKind::Index { .. } => POSTFIX,
        ExpressionKind::Identifier(_)
        | ExpressionKind::Literal(_)
        | ExpressionKind::Paren(_)
        | ExpressionKind::Array(_)
        | ExpressionKind::Struct(_)
        | ExpressionKind::New { .. }
        | ExpressionKind::Function(_) => PRIMARY,
    }
}

/// Statements that end in `}` or in a nested statement and so take no `;`.
fn is_compound(stmt: &Statement) -> bool {
    match &stmt.kind {
        StatementKind::ScriptBlock(_)
        | StatementKind::Block(_)
        | StatementKind::If { .. }
        | StatementKind::While { .. }
        | StatementKind::For { .. }
        | StatementKind::ForIn { .. }
        | StatementKind::Switch { .. }
        | StatementKind::Try { .. }
        | StatementKind::Component(_) => true,
        StatementKind::FunctionDecl(f) => f.body.is_some(),
        StatementKind::Tag(t) => t.body.is_some(),
        _ => false,
    }
}

/// Whether a trailing `else` would attach to an `if` nested inside `stmt`.
fn ends_with_open_if(stmt: &Statement) -> bool {
    match &stmt.kind {
        StatementKind::If {
            else_branch: None, ..
        } => true,
        StatementKind::If {
            else_branch: Some(branch),
            ..
        } => ends_with_open_if(branch),
        StatementKind::While { body, .. }
        | StatementKind::For { body, .. }
        | StatementKind::ForIn { body, .. } => ends_with_open_if(body),
        _ => false,
    }
}

/// The decompiler.
/// 反编译器。
pub struct Decompiler<'c> {
    config: &'c FormatConfig,
}

impl<'c> Decompiler<'c> {
    pub fn new(config: &'c FormatConfig) -> Self {
        Self { config }
    }

    /// Render a whole script: every top-level statement on its own line,
    /// terminated, with the configured trailing newline.
    /// 渲染整个脚本。
    pub fn script(&self, root: Option<&Statement>) -> String {
        let mut p = Printer::new(self.config, 0);
        match root.map(|s| &s.kind) {
            None => {}
            Some(StatementKind::ScriptBlock(statements)) => self.write_lines(&mut p, statements),
            Some(_) => {
                if let Some(statement) = root {
                    self.write_child(&mut p, statement);
                }
            }
        }
        let mut output = p.finish();
        if self.config.trailing_newline && !output.is_empty() {
            output.push('\n');
        }
        output
    }

    // ========== Statements ==========

    /// Write a statement without its terminating `;`.
    /// 写入语句（不含结尾分号）。
    fn write_statement(&self, p: &mut Printer, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::ScriptBlock(statements) => self.write_lines(p, statements),
            StatementKind::Block(statements) => self.write_body(p, statements),
            StatementKind::Expression(expr) => self.write_expr(p, expr, 0),
            StatementKind::Var { name, value } => {
                p.write("var ");
                p.write(&name.name);
                if let Some(value) = value {
                    p.write(" = ");
                    self.write_expr(p, value, 0);
                }
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                p.write("if (");
                self.write_expr(p, condition, 0);
                p.write(") ");
                match else_branch {
                    Some(else_branch) => {
                        if ends_with_open_if(then_branch) {
                            self.write_body(p, std::slice::from_ref(then_branch.as_ref()));
                        } else {
                            self.write_child(p, then_branch);
                        }
                        p.write(" else ");
                        self.write_child(p, else_branch);
                    }
                    None => self.write_child(p, then_branch),
                }
            }
            StatementKind::While { condition, body } => {
                p.write("while (");
                self.write_expr(p, condition, 0);
                p.write(") ");
                self.write_child(p, body);
            }
            StatementKind::DoWhile { body, condition } => {
                p.write("do ");
                self.write_child(p, body);
                p.write(" while (");
                self.write_expr(p, condition, 0);
                p.write(")");
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                p.write("for (");
                if let Some(init) = init {
                    self.write_statement(p, init);
                }
                p.write(";");
                if let Some(condition) = condition {
                    p.space();
                    self.write_expr(p, condition, 0);
                }
                p.write(";");
                if let Some(update) = update {
                    p.space();
                    self.write_expr(p, update, 0);
                }
                p.write(") ");
                self.write_child(p, body);
            }
            StatementKind::ForIn {
                var,
                target,
                collection,
                body,
            } => {
                p.write("for (");
                if *var {
                    p.write("var ");
                }
                self.write_expr(p, target, POSTFIX);
                p.write(" in ");
                self.write_expr(p, collection, 0);
                p.write(") ");
                self.write_child(p, body);
            }
            StatementKind::Switch {
                subject,
                cases,
                default,
            } => self.write_switch(p, subject, cases, default.as_deref()),
            StatementKind::Break => p.write("break"),
            StatementKind::Continue => p.write("continue"),
            StatementKind::Return(value) => self.write_keyword(p, "return", value.as_ref()),
            StatementKind::Throw(value) => self.write_keyword(p, "throw", value.as_ref()),
            StatementKind::Abort(value) => self.write_keyword(p, "abort", value.as_ref()),
            StatementKind::Include(value) => self.write_keyword(p, "include", Some(value)),
            StatementKind::Try {
                body,
                catches,
                finally,
            } => self.write_try(p, body, catches, finally.as_deref()),
            StatementKind::FunctionDecl(decl) => self.write_function(p, decl),
            StatementKind::Component(decl) => self.write_component(p, decl),
            StatementKind::Property(prop) => self.write_property(p, prop),
            StatementKind::Tag(tag) => self.write_tag(p, tag),
            StatementKind::Import(path) => {
                p.write("import ");
                p.write(path);
            }
        }
    }

    /// A statement in a statement position: simple ones get their `;`.
    fn write_child(&self, p: &mut Printer, stmt: &Statement) {
        self.write_statement(p, stmt);
        if !is_compound(stmt) {
            p.write(";");
        }
    }

    fn write_lines(&self, p: &mut Printer, statements: &[Statement]) {
        for (i, stmt) in statements.iter().enumerate() {
            if i > 0 {
                p.newline();
            }
            self.write_child(p, stmt);
        }
    }

    /// `{}` or a braced, indented statement list.
    /// 写入花括号语句块。
    fn write_body(&self, p: &mut Printer, statements: &[Statement]) {
        if statements.is_empty() {
            p.write("{}");
            return;
        }
        p.write("{");
        p.indent();
        for stmt in statements {
            p.newline();
            self.write_child(p, stmt);
        }
        p.dedent();
        p.newline();
        p.write("}");
    }

    fn write_keyword(&self, p: &mut Printer, keyword: &str, value: Option<&Expression>) {
        p.write(keyword);
        if let Some(value) = value {
            p.space();
            self.write_expr(p, value, 0);
        }
    }

    fn write_switch(
        &self,
        p: &mut Printer,
        subject: &Expression,
        cases: &[SwitchCase],
        default: Option<&[Statement]>,
    ) {
        p.write("switch (");
        self.write_expr(p, subject, 0);
        p.write(") ");
        if cases.is_empty() && default.is_none() {
            p.write("{}");
            return;
        }
        p.write("{");
        p.indent();
        for case in cases {
            p.newline();
            p.write("case ");
            self.write_expr(p, &case.value, 0);
            p.write(":");
            self.write_case_body(p, &case.body);
        }
        if let Some(body) = default {
            p.newline();
            p.write("default:");
            self.write_case_body(p, body);
        }
        p.dedent();
        p.newline();
        p.write("}");
    }

    fn write_case_body(&self, p: &mut Printer, body: &[Statement]) {
        p.indent();
        for stmt in body {
            p.newline();
            self.write_child(p, stmt);
        }
        p.dedent();
    }

    fn write_try(
        &self,
        p: &mut Printer,
        body: &[Statement],
        catches: &[CatchClause],
        finally: Option<&[Statement]>,
    ) {
        p.write("try ");
        self.write_body(p, body);
        for clause in catches {
            p.write(" catch (");
            if let Some(ty) = &clause.exception_type {
                p.write(ty);
                p.space();
            }
            p.write(&clause.variable.name);
            p.write(") ");
            self.write_body(p, &clause.body);
        }
        if let Some(finally) = finally {
            p.write(" finally ");
            self.write_body(p, finally);
        }
    }

    fn write_function(&self, p: &mut Printer, decl: &FunctionDecl) {
        for modifier in &decl.modifiers {
            p.write(&modifier.name);
            p.space();
        }
        if let Some(ty) = &decl.return_type {
            p.write(&ty.name);
            p.space();
        }
        p.write("function ");
        p.write(&decl.name.name);
        self.write_params(p, &decl.params);
        self.write_attributes(p, &decl.attributes, Some(valid::FUNCTION));
        if let Some(body) = &decl.body {
            p.space();
            self.write_body(p, body);
        }
    }

    fn write_params(&self, p: &mut Printer, params: &[Parameter]) {
        p.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                p.write(", ");
            }
            self.write_param(p, param);
        }
        p.write(")");
    }

    /// `[required] [type] name [= default] [attr=value ...]`
    fn write_param(&self, p: &mut Printer, param: &Parameter) {
        if param.required {
            p.write("required ");
        }
        if let Some(ty) = &param.param_type {
            p.write(&ty.name);
            p.space();
        }
        p.write(&param.name.name);
        if let Some(default) = &param.default {
            p.write(" = ");
            self.write_expr(p, default, CONDITIONAL);
        }
        self.write_attributes(p, &param.attributes, None);
    }

    fn write_component(&self, p: &mut Printer, decl: &ComponentDecl) {
        p.write(decl.kind.keyword());
        self.write_attributes(p, &decl.attributes, Some(decl.kind.valid_attributes()));
        p.space();
        self.write_body(p, &decl.body);
    }

    /// `property name="foo" type="string"` or `property string foo`.
    /// 写入属性声明。
    fn write_property(&self, p: &mut Printer, prop: &PropertyStatement) {
        p.write("property");
        if !prop.is_shorthand() {
            // Typed fields set on a full-form property render as attributes.
            let full = prop.expanded();
            self.write_attributes(p, &full.attributes, Some(valid::PROPERTY));
            return;
        }
        if let Some(ty) = prop.property_type() {
            p.space();
            p.write(&ty.name);
        }
        if let Some(name) = prop.property_name() {
            p.space();
            p.write(&name.name);
        }
        self.write_attributes(p, &prop.attributes, Some(valid::PROPERTY));
    }

    fn write_tag(&self, p: &mut Printer, tag: &TagStatement) {
        p.write(tag.tag.keyword());
        self.write_attributes(p, &tag.attributes, Some(tag.tag.valid_attributes()));
        if let Some(body) = &tag.body {
            p.space();
            self.write_body(p, body);
        }
    }

    /// Each attribute preceded by a space: known names in `valid`'s order,
    /// then the rest in insertion order.
    fn write_attributes(&self, p: &mut Printer, attributes: &AttributeMap, valid: Option<&[&str]>) {
        let ordered = match valid {
            Some(valid) => attributes.ordered(valid),
            None => attributes.iter().collect(),
        };
        for attribute in ordered {
            p.space();
            self.write_attribute(p, &attribute.name.name, &attribute.value);
        }
    }

    fn write_attribute(&self, p: &mut Printer, name: &str, value: &Expression) {
        p.write(name);
        p.write("=");
        self.write_expr(p, value, CONDITIONAL);
    }

    // ========== Expressions ==========

    /// Write `expr`, parenthesized if it binds looser than `min`.
    /// 写入表达式，必要时加括号。
    fn write_expr(&self, p: &mut Printer, expr: &Expression, min: u8) {
        self.write_operand(p, expr, min, false);
    }

    /// Like [`write_expr`](Self::write_expr) at a position whose leading
    /// word `NOT` the parser treats as tight.
    /// 在紧绑定 `NOT` 的位置写入表达式。
    fn write_operand(&self, p: &mut Printer, expr: &Expression, min: u8, tight: bool) {
        if precedence(expr, tight) < min {
            p.write("(");
            self.write_expr(p, expr, 0);
            p.write(")");
            return;
        }
        match &expr.kind {
            ExpressionKind::Identifier(id) => p.write(&id.name),
            ExpressionKind::Literal(literal) => self.write_literal(p, literal),
            ExpressionKind::Binary { op, left, right } => {
                let level = binary_level(*op);
                let prec = binary_precedence(*op);
                // The left operand starts where this expression starts.
                self.write_operand(p, left, prec, tight);
                p.space();
                p.write(op.as_str());
                p.space();
                // A trailing arrow function already swallows the rest.
                let right_min = match &right.kind {
                    ExpressionKind::Function(f) if f.arrow => CONDITIONAL,
                    _ => prec + 1,
                };
                self.write_operand(p, right, right_min, level >= NOT_LEVEL);
            }
            ExpressionKind::Unary { op, operand } => {
                p.write(op.as_str());
                match op {
                    UnaryOp::NotWord if tight => self.write_operand(p, operand, PREFIX, true),
                    UnaryOp::NotWord => self.write_expr(p, operand, NOT_WORD),
                    _ => {
                        // `- -a` must not become `--a`.
                        if matches!(
                            operand.kind,
                            ExpressionKind::Unary {
                                op: UnaryOp::Neg
                                    | UnaryOp::Plus
                                    | UnaryOp::Increment
                                    | UnaryOp::Decrement,
                                ..
                            }
                        ) {
                            p.space();
                        }
                        self.write_operand(p, operand, PREFIX, true);
                    }
                }
            }
            ExpressionKind::Postfix { op, operand } => {
                self.write_expr(p, operand, POSTFIX);
                p.write(op.as_str());
            }
            ExpressionKind::Assignment { op, target, value } => {
                self.write_expr(p, target, CONDITIONAL);
                p.space();
                p.write(op.as_str());
                p.space();
                self.write_expr(p, value, ASSIGNMENT);
            }
            ExpressionKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                self.write_expr(p, condition, BINARY_BASE);
                p.write(" ? ");
                self.write_expr(p, then_value, CONDITIONAL);
                p.write(" : ");
                self.write_expr(p, else_value, CONDITIONAL);
            }
            ExpressionKind::Elvis { value, default } => {
                self.write_expr(p, value, BINARY_BASE);
                p.write(" ?: ");
                self.write_expr(p, default, CONDITIONAL);
            }
            ExpressionKind::Paren(inner) => {
                p.write("(");
                self.write_expr(p, inner, 0);
                p.write(")");
            }
            ExpressionKind::Call { callee, args } => {
                self.write_expr(p, callee, POSTFIX);
                self.write_args(p, args);
            }
            ExpressionKind::Member {
                object,
                property,
                safe,
            } => {
                self.write_expr(p, object, POSTFIX);
                p.write(if *safe { "?." } else { "." });
                p.write(&property.name);
            }
            ExpressionKind::Index { object, index } => {
                self.write_expr(p, object, POSTFIX);
                p.write("[");
                self.write_expr(p, index, 0);
                p.write("]");
            }
            ExpressionKind::Array(items) => {
                p.write("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        p.write(", ");
                    }
                    self.write_expr(p, item, 0);
                }
                p.write("]");
            }
            ExpressionKind::Struct(entries) => self.write_struct(p, entries),
            ExpressionKind::New { class, args } => {
                p.write("new ");
                p.write(class);
                self.write_args(p, args);
            }
            ExpressionKind::Function(f) => {
                if f.arrow {
                    self.write_params(p, &f.params);
                    p.write(" => ");
                } else {
                    p.write("function");
                    self.write_params(p, &f.params);
                    p.space();
                }
                match &f.body {
                    FunctionBody::Block(body) => self.write_body(p, body),
                    // A struct literal here would read as a block.
                    FunctionBody::Expression(body)
                        if matches!(body.kind, ExpressionKind::Struct(_)) =>
                    {
                        p.write("(");
                        self.write_expr(p, body, 0);
                        p.write(")");
                    }
                    FunctionBody::Expression(body) => self.write_expr(p, body, ASSIGNMENT),
                }
            }
        }
    }

    fn write_literal(&self, p: &mut Printer, literal: &Literal) {
        match literal {
            Literal::String(s) => {
                let quote = s.quote.as_char().to_string();
                p.write(&quote);
                p.write(&s.value);
                p.write(&quote);
            }
            Literal::Number(text) => p.write(text),
            Literal::Boolean(b) => p.write(if *b { "true" } else { "false" }),
            Literal::Null => p.write("null"),
        }
    }

    fn write_args(&self, p: &mut Printer, args: &[Argument]) {
        p.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                p.write(", ");
            }
            match &arg.name {
                Some(name) => self.write_attribute(p, &name.name, &arg.value),
                // A bare `a = b` would read as a named argument.
                None if matches!(arg.value.kind, ExpressionKind::Assignment { .. }) => {
                    self.write_expr(p, &arg.value, CONDITIONAL)
                }
                None => self.write_expr(p, &arg.value, ASSIGNMENT),
            }
        }
        p.write(")");
    }

    fn write_struct(&self, p: &mut Printer, entries: &[StructEntry]) {
        if entries.is_empty() {
            p.write("{}");
            return;
        }
        p.write("{");
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                p.write(",");
            }
            p.space();
            self.write_expr(p, &entry.key, PRIMARY);
            match entry.separator {
                cfml_syntax::KeySeparator::Colon => p.write(": "),
                cfml_syntax::KeySeparator::Equals => p.write(" = "),
            }
            self.write_expr(p, &entry.value, ASSIGNMENT);
        }
        p.write(" }");
    }
}
