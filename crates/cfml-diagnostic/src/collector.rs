//! Append-only accumulation of diagnostics across pipeline stages.

use crate::{Diagnostic, Severity};
use cfml_common::LineIndex;

/// An ordered, append-only list of diagnostics.
///
/// Stages push into the collector and keep going; nothing here aborts the
/// pipeline. Records are never deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Drop everything recorded after the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Resolve missing line numbers and context fragments against the source.
    pub fn locate(&mut self, source: &str) {
        let index = LineIndex::new(source);
        for diagnostic in &mut self.items {
            diagnostic.locate(source, &index);
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(items: Vec<Diagnostic>) -> Self {
        Self { items }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticKind;
    use cfml_common::Span;

    #[test]
    fn test_append_only_no_dedup() {
        let mut diags = Diagnostics::new();
        let d = Diagnostic::error(DiagnosticKind::Parser, Span::from_usize(0, 1), "boom");
        diags.push(d.clone());
        diags.push(d);
        diags.push(Diagnostic::warning(
            DiagnosticKind::Validation,
            Span::from_usize(2, 3),
            "odd",
        ));
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.error_count(), 2);
        assert!(diags.has_errors());
    }

    #[test]
    fn test_locate_fills_line_and_context() {
        let source = "a = 1;\nb = ;";
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::error(
            DiagnosticKind::Parser,
            Span::from_usize(11, 12),
            "expected expression",
        ));
        diags.locate(source);
        let d = &diags.as_slice()[0];
        assert_eq!(d.line, 2);
        assert_eq!(d.context, ";");
    }
}
