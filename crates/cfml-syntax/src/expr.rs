//! Expression AST nodes.
//! 表达式 AST 节点。

use crate::{Identifier, Statement};
use cfml_common::Span;

/// An expression.
/// 表达式。
///
/// The span is informational only and never takes part in equality.
#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// An expression with no source location.
    pub fn synthetic(kind: ExpressionKind) -> Self {
        Self::new(kind, Span::DUMMY)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::synthetic(ExpressionKind::Identifier(Identifier::new(
            name,
            Span::DUMMY,
        )))
    }

    /// A double-quoted string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::synthetic(ExpressionKind::Literal(Literal::String(StringLiteral::new(
            value,
            Quote::Double,
        ))))
    }

    /// The text of a string literal, if this is one.
    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Literal(Literal::String(s)) => Some(&s.value),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ExpressionKind::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Expression kind.
/// 表达式类型。
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// Variable or scope reference / 变量引用
    Identifier(Identifier),
    /// Literal value / 字面量
    Literal(Literal),

    /// Binary operation `a + b`, `a EQ b` / 二元运算
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Prefix operation `-a`, `NOT a`, `++a` / 前缀运算
    Unary { op: UnaryOp, operand: Box<Expression> },
    /// Postfix operation `a++` / 后缀运算
    Postfix {
        op: PostfixOp,
        operand: Box<Expression>,
    },
    /// Assignment `a = b`, `a &= b` / 赋值
    Assignment {
        op: AssignOp,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    /// Conditional `c ? a : b` / 条件表达式
    Ternary {
        condition: Box<Expression>,
        then_value: Box<Expression>,
        else_value: Box<Expression>,
    },
    /// Elvis `a ?: b` / Elvis 运算
    Elvis {
        value: Box<Expression>,
        default: Box<Expression>,
    },
    /// Parenthesized expression, kept so it renders back as written / 括号表达式
    Paren(Box<Expression>),

    /// Function call `f(x, name=y)` / 函数调用
    Call {
        callee: Box<Expression>,
        args: Vec<Argument>,
    },
    /// Member access `a.b`, `a?.b` / 成员访问
    Member {
        object: Box<Expression>,
        property: Identifier,
        safe: bool,
    },
    /// Index `a[i]` / 索引
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },

    /// Array literal `[1, 2]` / 数组字面量
    Array(Vec<Expression>),
    /// Struct literal `{a: 1, b = 2}` / 结构体字面量
    Struct(Vec<StructEntry>),
    /// Object creation `new path.To.Component(args)` / 对象创建
    New { class: String, args: Vec<Argument> },
    /// Closure or arrow function / 闭包或箭头函数
    Function(FunctionExpression),
}

/// A literal value.
/// 字面量值。
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(StringLiteral),
    /// Number kept as written / 按原样保存的数字
    Number(String),
    Boolean(bool),
    Null,
}

/// Quote character of a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    pub fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// A string literal. `value` is the text between the quotes, with doubled
/// quotes and `#...#` interpolation left exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub quote: Quote,
}

impl StringLiteral {
    pub fn new(value: impl Into<String>, quote: Quote) -> Self {
        Self {
            value: value.into(),
            quote,
        }
    }

    /// The value with doubled quotes collapsed.
    pub fn unescaped(&self) -> String {
        let q = self.quote.as_char();
        self.value.replace(&format!("{q}{q}"), &q.to_string())
    }
}

/// A call argument, optionally named.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Identifier>,
    pub value: Expression,
}

/// Separator between a struct key and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySeparator {
    Colon,
    Equals,
}

impl KeySeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            KeySeparator::Colon => ":",
            KeySeparator::Equals => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    /// Identifier or literal key / 标识符或字面量键
    pub key: Expression,
    pub separator: KeySeparator,
    pub value: Expression,
}

/// A function parameter: `required string name = default attr=value`.
/// 函数参数。
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub required: bool,
    pub param_type: Option<Identifier>,
    pub name: Identifier,
    pub default: Option<Expression>,
    pub attributes: crate::AttributeMap,
}

impl Parameter {
    pub fn new(name: Identifier) -> Self {
        Self {
            required: false,
            param_type: None,
            name,
            default: None,
            attributes: crate::AttributeMap::new(),
        }
    }
}

/// Body of a function expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Arrow function with an expression body `(x) => x + 1`
    Expression(Box<Expression>),
}

/// An anonymous function: `function (a) { ... }` or `(a) => ...`.
/// 匿名函数。
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub params: Vec<Parameter>,
    pub body: FunctionBody,
    pub arrow: bool,
}

/// Binary operators, symbolic and word forms kept apart.
/// 二元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic 算术运算
    Add,     // +
    Sub,     // -
    Mul,     // *
    Div,     // /
    IntDiv,  // \
    Mod,     // %
    ModWord, // MOD
    Pow,     // ^
    Concat,  // &

    // Comparison 比较运算
    Eq,             // ==
    StrictEq,       // ===
    Ne,             // !=
    StrictNe,       // !==
    LtGt,           // <>
    Lt,             // <
    Le,             // <=
    Gt,             // >
    Ge,             // >=
    EqWord,         // EQ
    NeqWord,        // NEQ
    Is,             // IS
    IsNot,          // IS NOT
    GtWord,         // GT
    GteWord,        // GTE
    GeWord,         // GE
    LtWord,         // LT
    LteWord,        // LTE
    LeWord,         // LE
    Contains,       // CONTAINS
    DoesNotContain, // DOES NOT CONTAIN

    // Logical 逻辑运算
    And,     // &&
    AndWord, // AND
    Or,      // ||
    OrWord,  // OR
    Xor,     // XOR
    Eqv,     // EQV
    Imp,     // IMP
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::IntDiv => "\\",
            BinaryOp::Mod => "%",
            BinaryOp::ModWord => "MOD",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "==",
            BinaryOp::StrictEq => "===",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictNe => "!==",
            BinaryOp::LtGt => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::EqWord => "EQ",
            BinaryOp::NeqWord => "NEQ",
            BinaryOp::Is => "IS",
            BinaryOp::IsNot => "IS NOT",
            BinaryOp::GtWord => "GT",
            BinaryOp::GteWord => "GTE",
            BinaryOp::GeWord => "GE",
            BinaryOp::LtWord => "LT",
            BinaryOp::LteWord => "LTE",
            BinaryOp::LeWord => "LE",
            BinaryOp::Contains => "CONTAINS",
            BinaryOp::DoesNotContain => "DOES NOT CONTAIN",
            BinaryOp::And => "&&",
            BinaryOp::AndWord => "AND",
            BinaryOp::Or => "||",
            BinaryOp::OrWord => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Eqv => "EQV",
            BinaryOp::Imp => "IMP",
        }
    }
}

/// Prefix operators.
/// 前缀运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,       // -
    Plus,      // +
    Not,       // !
    NotWord,   // NOT
    Increment, // ++
    Decrement, // --
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::NotWord => "NOT ",
            UnaryOp::Increment => "++",
            UnaryOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

/// Assignment operators.
/// 赋值运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,       // =
    AddAssign,    // +=
    SubAssign,    // -=
    MulAssign,    // *=
    DivAssign,    // /=
    ModAssign,    // %=
    ConcatAssign, // &=
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::ConcatAssign => "&=",
        }
    }
}
