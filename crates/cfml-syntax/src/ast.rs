//! Statement AST nodes.
//! 语句 AST 节点。

use std::borrow::Cow;

use crate::valid;
use crate::{AstError, AttributeMap, Expression, ExpressionKind, Parameter};
use cfml_common::Span;

/// An identifier, or a dotted name where a type is expected.
/// 标识符。
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(name, Span::DUMMY)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Identifier {}

/// A statement.
/// 语句。
///
/// The span is informational only and never takes part in equality.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn synthetic(kind: StatementKind) -> Self {
        Self::new(kind, Span::DUMMY)
    }

    /// Expressions this statement owns directly (not those of nested
    /// statements). A property's shorthand name and type come back as owned
    /// identifier expressions.
    /// 语句直接拥有的表达式。
    pub fn expressions(&self) -> Vec<Cow<'_, Expression>> {
        let mut out: Vec<Cow<'_, Expression>> =
            self.borrowed_expressions().into_iter().map(Cow::Borrowed).collect();
        if let StatementKind::Property(p) = &self.kind {
            out.extend(p.typed_expressions().map(Cow::Owned));
        }
        out
    }

    fn borrowed_expressions(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        match &self.kind {
            StatementKind::ScriptBlock(_)
            | StatementKind::Block(_)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Import(_) => {}
            StatementKind::Expression(e) | StatementKind::Include(e) => out.push(e),
            StatementKind::Var { value, .. } => out.extend(value.as_ref()),
            StatementKind::If { condition, .. }
            | StatementKind::While { condition, .. }
            | StatementKind::DoWhile { condition, .. } => out.push(condition),
            StatementKind::For {
                condition, update, ..
            } => {
                out.extend(condition.as_ref());
                out.extend(update.as_ref());
            }
            StatementKind::ForIn { target, collection, .. } => {
                out.push(target);
                out.push(collection);
            }
            StatementKind::Switch { subject, cases, .. } => {
                out.push(subject);
                out.extend(cases.iter().map(|c| &c.value));
            }
            StatementKind::Return(e) | StatementKind::Throw(e) | StatementKind::Abort(e) => {
                out.extend(e.as_ref())
            }
            StatementKind::Try { .. } => {}
            StatementKind::FunctionDecl(f) => {
                out.extend(f.attributes.values());
                for param in &f.params {
                    out.extend(param.default.as_ref());
                    out.extend(param.attributes.values());
                }
            }
            StatementKind::Component(c) => out.extend(c.attributes.values()),
            StatementKind::Property(p) => out.extend(p.attributes.values()),
            StatementKind::Tag(t) => out.extend(t.attributes.values()),
        }
        out
    }

    /// The attribute map of statements that carry one.
    pub fn attributes(&self) -> Option<&AttributeMap> {
        match &self.kind {
            StatementKind::FunctionDecl(f) => Some(&f.attributes),
            StatementKind::Component(c) => Some(&c.attributes),
            StatementKind::Property(p) => Some(&p.attributes),
            StatementKind::Tag(t) => Some(&t.attributes),
            _ => None,
        }
    }

    /// The valid attribute names for this statement, if it carries attributes.
    pub fn valid_attributes(&self) -> Option<&'static [&'static str]> {
        match &self.kind {
            StatementKind::FunctionDecl(_) => Some(valid::FUNCTION),
            StatementKind::Component(c) => Some(c.kind.valid_attributes()),
            StatementKind::Property(_) => Some(valid::PROPERTY),
            StatementKind::Tag(t) => Some(t.tag.valid_attributes()),
            _ => None,
        }
    }

    /// Lower-case element name, as known to a tag dictionary.
    pub fn element_name(&self) -> Option<&'static str> {
        match &self.kind {
            StatementKind::FunctionDecl(_) => Some("function"),
            StatementKind::Component(c) => Some(c.kind.keyword()),
            StatementKind::Property(_) => Some("property"),
            StatementKind::Tag(t) => Some(t.tag.keyword()),
            _ => None,
        }
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Statement kind.
/// 语句类型。
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// Top-level sequence of statements / 顶层语句序列
    ScriptBlock(Vec<Statement>),
    /// `{ ... }` / 语句块
    Block(Vec<Statement>),
    /// `expr;` / 表达式语句
    Expression(Expression),
    /// `var name = value;` / 局部变量声明
    Var {
        name: Identifier,
        value: Option<Expression>,
    },
    /// `if (c) s else s` / 条件语句
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    /// `while (c) s` / while 循环
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    /// `do s while (c);` / do-while 循环
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    /// `for (init; cond; update) s`; `init` is a `Var` or `Expression` statement
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    /// `for ([var] x in coll) s` / for-in 循环
    ForIn {
        var: bool,
        target: Expression,
        collection: Expression,
        body: Box<Statement>,
    },
    /// `switch (x) { case v: ... default: ... }` / switch 语句
    Switch {
        subject: Expression,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Statement>>,
    },
    Break,
    Continue,
    /// `return [expr];`
    Return(Option<Expression>),
    /// `try { } catch (T e) { } finally { }` / 异常处理
    Try {
        body: Vec<Statement>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Statement>>,
    },
    /// `throw [expr];`
    Throw(Option<Expression>),
    /// Named function declaration / 函数声明
    FunctionDecl(FunctionDecl),
    /// `component` or `interface` declaration / 组件或接口声明
    Component(ComponentDecl),
    /// `property ...;` / 属性声明
    Property(PropertyStatement),
    /// Tag-style statement such as `lock name="x" { }` / 标签风格语句
    Tag(TagStatement),
    /// `import path;` with the path kept as written
    Import(String),
    /// `include "file";`
    Include(Expression),
    /// `abort [expr];`
    Abort(Option<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Exception type as written (`any`, `java.lang.Exception`, `"my.type"`)
    pub exception_type: Option<String>,
    pub variable: Identifier,
    pub body: Vec<Statement>,
}

/// A function declaration.
/// 函数声明。
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Access and other modifiers in source order (`public`, `static`, ...)
    pub modifiers: Vec<Identifier>,
    pub return_type: Option<Identifier>,
    pub name: Identifier,
    pub params: Vec<Parameter>,
    pub attributes: AttributeMap,
    /// `None` for interface signatures ending in `;`
    pub body: Option<Vec<Statement>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Component,
    Interface,
}

impl ComponentKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ComponentKind::Component => "component",
            ComponentKind::Interface => "interface",
        }
    }

    pub fn valid_attributes(self) -> &'static [&'static str] {
        match self {
            ComponentKind::Component => valid::COMPONENT,
            ComponentKind::Interface => valid::INTERFACE,
        }
    }
}

/// A component or interface declaration.
/// 组件或接口声明。
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDecl {
    pub kind: ComponentKind,
    pub attributes: AttributeMap,
    pub body: Vec<Statement>,
}

/// Keywords introducing tag-style statements.
/// 标签风格语句的关键字。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Lock,
    Transaction,
    Thread,
    SaveContent,
    Param,
    Setting,
    Location,
    Exit,
}

impl TagKind {
    pub const ALL: [TagKind; 8] = [
        TagKind::Lock,
        TagKind::Transaction,
        TagKind::Thread,
        TagKind::SaveContent,
        TagKind::Param,
        TagKind::Setting,
        TagKind::Location,
        TagKind::Exit,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            TagKind::Lock => "lock",
            TagKind::Transaction => "transaction",
            TagKind::Thread => "thread",
            TagKind::SaveContent => "savecontent",
            TagKind::Param => "param",
            TagKind::Setting => "setting",
            TagKind::Location => "location",
            TagKind::Exit => "exit",
        }
    }

    /// Case-insensitive lookup by keyword.
    pub fn from_keyword(word: &str) -> Option<TagKind> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.keyword().eq_ignore_ascii_case(word))
    }

    pub fn valid_attributes(self) -> &'static [&'static str] {
        match self {
            TagKind::Lock => valid::LOCK,
            TagKind::Transaction => valid::TRANSACTION,
            TagKind::Thread => valid::THREAD,
            TagKind::SaveContent => valid::SAVECONTENT,
            TagKind::Param => valid::PARAM,
            TagKind::Setting => valid::SETTING,
            TagKind::Location => valid::LOCATION,
            TagKind::Exit => valid::EXIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagStatement {
    pub tag: TagKind,
    pub attributes: AttributeMap,
    pub body: Option<Vec<Statement>>,
}

/// A `property` declaration.
/// 属性声明。
///
/// Full form: `property name="foo" type="string";`.
/// Shorthand form: `property string foo;`, optionally followed by attributes.
/// A shorthand property always has a name.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyStatement {
    pub attributes: AttributeMap,
    shorthand: bool,
    property_name: Option<Identifier>,
    property_type: Option<Identifier>,
}

impl PropertyStatement {
    /// A full-form property.
    pub fn full(attributes: AttributeMap) -> Self {
        Self {
            attributes,
            shorthand: false,
            property_name: None,
            property_type: None,
        }
    }

    /// A shorthand property `property [type] name [attributes]`.
    pub fn shorthand(
        property_type: Option<Identifier>,
        name: Identifier,
        attributes: AttributeMap,
    ) -> Self {
        Self {
            attributes,
            shorthand: true,
            property_name: Some(name),
            property_type,
        }
    }

    pub fn is_shorthand(&self) -> bool {
        self.shorthand
    }

    /// Switching to the full form folds the name and type into the
    /// attributes, so the property still renders as valid source.
    pub fn set_shorthand(&mut self, shorthand: bool) -> Result<(), AstError> {
        match (self.shorthand, shorthand) {
            (_, true) if self.property_name.is_none() => Err(AstError::MissingPropertyName),
            (true, false) => {
                *self = self.expanded();
                Ok(())
            }
            _ => {
                self.shorthand = shorthand;
                Ok(())
            }
        }
    }

    pub fn property_name(&self) -> Option<&Identifier> {
        self.property_name.as_ref()
    }

    pub fn set_property_name(&mut self, name: Option<Identifier>) -> Result<(), AstError> {
        if self.shorthand && name.is_none() {
            return Err(AstError::MissingPropertyName);
        }
        self.property_name = name;
        Ok(())
    }

    pub fn property_type(&self) -> Option<&Identifier> {
        self.property_type.as_ref()
    }

    pub fn set_property_type(&mut self, property_type: Option<Identifier>) {
        self.property_type = property_type;
    }

    /// The equivalent full-form property. The typed name and type become
    /// `NAME` and `TYPE` string attributes; other attributes are kept and
    /// win over them.
    pub fn expanded(&self) -> PropertyStatement {
        if self.property_name.is_none() && self.property_type.is_none() {
            return PropertyStatement::full(self.attributes.clone());
        }
        let mut attributes = AttributeMap::new();
        if let Some(name) = &self.property_name {
            attributes.insert(Identifier::synthetic("name"), Expression::string(&name.name));
        }
        if let Some(ty) = &self.property_type {
            attributes.insert(Identifier::synthetic("type"), Expression::string(&ty.name));
        }
        for attr in self.attributes.iter() {
            attributes.insert(attr.name.clone(), attr.value.clone());
        }
        PropertyStatement::full(attributes)
    }

    /// Every expression this property holds: attribute values, then the
    /// shorthand name and type as identifiers.
    pub fn decompose_expressions(&self) -> Vec<Expression> {
        self.attributes
            .values()
            .cloned()
            .chain(self.typed_expressions())
            .collect()
    }

    /// Name then type, as identifier expressions.
    fn typed_expressions(&self) -> impl Iterator<Item = Expression> + '_ {
        [&self.property_name, &self.property_type]
            .into_iter()
            .flatten()
            .map(|id| Expression::new(ExpressionKind::Identifier(id.clone()), id.span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_requires_name() {
        let mut prop = PropertyStatement::full(AttributeMap::new());
        assert_eq!(prop.set_shorthand(true), Err(AstError::MissingPropertyName));
        prop.set_property_name(Some(Identifier::synthetic("foo")))
            .unwrap();
        prop.set_shorthand(true).unwrap();
        assert_eq!(
            prop.set_property_name(None),
            Err(AstError::MissingPropertyName)
        );
        assert!(prop.is_shorthand());
    }

    #[test]
    fn test_expanded_matches_full() {
        let short = PropertyStatement::shorthand(
            Some(Identifier::synthetic("string")),
            Identifier::synthetic("foo"),
            AttributeMap::new(),
        );
        let mut attrs = AttributeMap::new();
        attrs.insert(Identifier::synthetic("TYPE"), Expression::string("string"));
        attrs.insert(Identifier::synthetic("NAME"), Expression::string("foo"));
        assert_eq!(short.expanded(), PropertyStatement::full(attrs));
    }

    #[test]
    fn test_decompose_expressions() {
        let mut attrs = AttributeMap::new();
        attrs.insert(Identifier::synthetic("default"), Expression::string("x"));
        let prop = PropertyStatement::shorthand(None, Identifier::synthetic("foo"), attrs);
        let exprs = prop.decompose_expressions();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[1], Expression::identifier("foo"));
    }

    #[test]
    fn test_statement_expressions_include_shorthand_fields() {
        let mut attrs = AttributeMap::new();
        attrs.insert(Identifier::synthetic("default"), Expression::string("x"));
        let prop = PropertyStatement::shorthand(
            Some(Identifier::synthetic("string")),
            Identifier::synthetic("foo"),
            attrs,
        );
        let stmt = Statement::synthetic(StatementKind::Property(prop.clone()));
        let exprs: Vec<Expression> = stmt.expressions().into_iter().map(Cow::into_owned).collect();
        assert_eq!(exprs, prop.decompose_expressions());
        assert_eq!(exprs.len(), 3);
        assert_eq!(exprs[1], Expression::identifier("foo"));
        assert_eq!(exprs[2], Expression::identifier("string"));

        let full = Statement::synthetic(StatementKind::Property(PropertyStatement::full(
            AttributeMap::new(),
        )));
        assert!(full.expressions().is_empty());
    }

    #[test]
    fn test_clearing_shorthand_folds_fields() {
        let mut prop = PropertyStatement::shorthand(
            Some(Identifier::synthetic("string")),
            Identifier::synthetic("foo"),
            AttributeMap::new(),
        );
        prop.set_shorthand(false).unwrap();
        assert!(!prop.is_shorthand());
        assert!(prop.property_name().is_none());
        assert_eq!(prop.attributes.get("NAME"), Some(&Expression::string("foo")));
        assert_eq!(prop.attributes.get("type"), Some(&Expression::string("string")));
    }

    #[test]
    fn test_dropping_type_keeps_shorthand() {
        let mut prop = PropertyStatement::shorthand(
            Some(Identifier::synthetic("string")),
            Identifier::synthetic("foo"),
            AttributeMap::new(),
        );
        prop.set_property_type(None);
        assert!(prop.is_shorthand());
        assert!(prop.property_type().is_none());
    }

    #[test]
    fn test_tag_kind_lookup() {
        assert_eq!(TagKind::from_keyword("LOCK"), Some(TagKind::Lock));
        assert_eq!(TagKind::from_keyword("SaveContent"), Some(TagKind::SaveContent));
        assert_eq!(TagKind::from_keyword("query"), None);
    }
}
