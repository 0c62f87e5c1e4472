//! Attribute-name validation.
//!
//! Every statement that carries attributes has a fixed set of valid names.
//! A key outside that set is reported according to the [`AttributePolicy`];
//! an [`AttributeDictionary`] may vouch for vendor attributes the built-in
//! sets do not know. Validation never stops the build.

use cfml_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use cfml_syntax::{Attribute, Identifier, Statement};

use crate::LowerOptions;

/// External knowledge of element attributes, such as a tag dictionary.
pub trait AttributeDictionary {
    /// Whether `attribute` is known for the element `element` (both compared
    /// case-insensitively by the implementation).
    fn accepts_attribute(&self, element: &str, attribute: &str) -> bool;
}

impl<F> AttributeDictionary for F
where
    F: Fn(&str, &str) -> bool,
{
    fn accepts_attribute(&self, element: &str, attribute: &str) -> bool {
        self(element, attribute)
    }
}

/// How unknown attribute names are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributePolicy {
    /// No check.
    Ignore,
    /// Report as warnings.
    #[default]
    Warn,
    /// Report as errors.
    Deny,
}

fn diagnostic(
    policy: AttributePolicy,
    span: cfml_common::Span,
    message: String,
) -> Option<Diagnostic> {
    match policy {
        AttributePolicy::Ignore => None,
        AttributePolicy::Warn => Some(Diagnostic::warning(
            DiagnosticKind::Validation,
            span,
            message,
        )),
        AttributePolicy::Deny => Some(Diagnostic::error(
            DiagnosticKind::Validation,
            span,
            message,
        )),
    }
}

pub(crate) fn unknown_attribute(
    element: &str,
    valid: &[&str],
    attribute: &Attribute,
    policy: AttributePolicy,
) -> Option<Diagnostic> {
    let name = &attribute.name;
    log::debug!("unknown attribute '{}' on {}", name.name, element);
    let diagnostic = diagnostic(
        policy,
        name.span,
        format!("unknown attribute '{}' on {}", name.name, element),
    )?;
    Some(
        diagnostic
            .with_code(ErrorCode::UnknownAttribute)
            .with_label(Label::new(name.span, "not a valid attribute"))
            .with_note(format!("valid attributes: {}", valid.join(", ")))
            .with_context(name.name.clone()),
    )
}

pub(crate) fn duplicate_attribute(
    element: &str,
    name: &Identifier,
    policy: AttributePolicy,
) -> Option<Diagnostic> {
    log::debug!("duplicate attribute '{}' on {}", name.name, element);
    let diagnostic = diagnostic(
        policy,
        name.span,
        format!("attribute '{}' given more than once on {}", name.name, element),
    )?;
    Some(
        diagnostic
            .with_code(ErrorCode::DuplicateAttribute)
            .with_label(Label::new(name.span, "this value replaces the earlier one"))
            .with_context(name.name.clone()),
    )
}

/// Check the attributes of one statement, not descending into its body.
///
/// Useful after callers have edited an AST. Lines are not known here; use
/// `Diagnostics::locate` with the source to fill them in.
pub fn validate_statement(statement: &Statement, options: &LowerOptions) -> Vec<Diagnostic> {
    let (Some(attributes), Some(valid), Some(element)) = (
        statement.attributes(),
        statement.valid_attributes(),
        statement.element_name(),
    ) else {
        return Vec::new();
    };
    attributes
        .unknown(valid)
        .filter(|attribute| !options.accepts(element, valid, &attribute.name.name))
        .filter_map(|attribute| unknown_attribute(element, valid, attribute, options.policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfml_syntax::{AttributeMap, Expression, PropertyStatement, StatementKind};

    fn property(names: &[&str]) -> Statement {
        let attributes: AttributeMap = names
            .iter()
            .map(|n| (Identifier::synthetic(*n), Expression::string("x")))
            .collect();
        Statement::synthetic(StatementKind::Property(PropertyStatement::full(attributes)))
    }

    #[test]
    fn test_policy_severity() {
        let stmt = property(&["name", "colour"]);

        let warn = validate_statement(&stmt, &LowerOptions::new());
        assert_eq!(warn.len(), 1);
        assert!(!warn[0].is_error());

        let deny = LowerOptions::new().with_policy(AttributePolicy::Deny);
        let found = validate_statement(&stmt, &deny);
        assert!(found[0].is_error());
        assert_eq!(found[0].code, Some(ErrorCode::UnknownAttribute));

        let ignore = LowerOptions::new().with_policy(AttributePolicy::Ignore);
        assert!(validate_statement(&stmt, &ignore).is_empty());
    }

    #[test]
    fn test_one_diagnostic_per_key() {
        let stmt = property(&["foo", "bar", "NAME", "Type"]);
        let found = validate_statement(&stmt, &LowerOptions::new());
        assert_eq!(found.len(), 2);
        assert!(found[0].message.contains("'foo'"));
        assert!(found[1].message.contains("'bar'"));
    }

    #[test]
    fn test_dictionary_vouches() {
        let vendor = |element: &str, attribute: &str| {
            element == "property" && attribute.eq_ignore_ascii_case("fieldtype")
        };
        let options = LowerOptions::new().with_dictionary(&vendor);
        let stmt = property(&["name", "fieldType", "colour"]);
        let found = validate_statement(&stmt, &options);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("colour"));
    }

    #[test]
    fn test_statements_without_attributes() {
        let stmt = Statement::synthetic(StatementKind::Break);
        assert!(validate_statement(&stmt, &LowerOptions::new()).is_empty());
    }
}
