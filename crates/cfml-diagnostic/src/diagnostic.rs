//! Diagnostic types and builders.

use crate::ErrorCode;
use cfml_common::{LineIndex, Span};
use serde::Serialize;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// Kind of diagnostic for categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexer,
    Parser,
    Validation,
    Structural,
}

/// A labeled span within a diagnostic.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic message with optional labels, notes, and help.
///
/// `line` is 1-based; `0` means the line has not been resolved yet
/// (see [`Diagnostic::locate`]). `context` is the source fragment the
/// diagnostic refers to.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub span: Span,
    pub line: u32,
    pub context: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            code: None,
            message: message.into(),
            span,
            line: 0,
            context: String::new(),
            labels: vec![],
            notes: vec![],
            help: None,
        }
    }

    pub fn error(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, kind, span, message)
    }

    pub fn warning(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, kind, span, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Fill in the line and context from the source when they were not known
    /// at the point the diagnostic was raised.
    pub fn locate(&mut self, source: &str, index: &LineIndex) {
        if self.line == 0 {
            self.line = index.line(usize::from(self.span.start));
        }
        if self.context.is_empty() {
            let fragment = self.span.slice(source).unwrap_or_default();
            self.context = if fragment.is_empty() {
                index
                    .line_text(source, self.line)
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            } else {
                fragment.to_string()
            };
        }
    }

    /// The flat record exchanged with external tooling.
    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord {
            line: self.line,
            start_offset: self.span.start.0,
            end_offset: self.span.end.0,
            context: self.context.clone(),
            message: self.message.clone(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(f, "{}", level)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, " (line {}): {}", self.line, self.message)
    }
}

/// Serializable projection of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    pub line: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub context: String,
    pub message: String,
}
