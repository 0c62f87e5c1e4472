//! Diagnostic and error reporting for the CFML front-end.
//! CFML 前端的诊断和错误报告。
//!
//! This crate provides the diagnostic record shared by every stage and
//! renders it through ariadne.
//! 本 crate 提供各阶段共享的诊断记录，并使用 ariadne 渲染。

mod codes;
mod collector;
mod diagnostic;

pub use codes::ErrorCode;
pub use collector::Diagnostics;
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticRecord, Label, Severity};

use ariadne::{ColorGenerator, Config, Label as AriadneLabel, Report, ReportKind, Source};

fn stage_name(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::Lexer => "while tokenizing",
        DiagnosticKind::Parser => "while parsing",
        DiagnosticKind::Validation => "while validating attributes",
        DiagnosticKind::Structural => "while building the AST",
    }
}

fn build_report<'a>(
    filename: &'a str,
    diagnostic: &Diagnostic,
    color: bool,
) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, filename, diagnostic.span.start.0 as usize)
        .with_config(Config::default().with_color(color))
        .with_message(&diagnostic.message);

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code.as_str());
    }

    // Unlabelled diagnostics still point at their span.
    if diagnostic.labels.is_empty() {
        report = report.with_label(
            AriadneLabel::new((filename, diagnostic.span.range()))
                .with_message(stage_name(diagnostic.kind))
                .with_color(colors.next()),
        );
    }
    report = diagnostic.labels.iter().fold(report, |report, label| {
        report.with_label(
            AriadneLabel::new((filename, label.span.range()))
                .with_message(&label.message)
                .with_color(colors.next()),
        )
    });

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    let help = diagnostic
        .help
        .as_deref()
        .or_else(|| diagnostic.code.and_then(|code| code.suggestion()));
    if let Some(help) = help {
        report = report.with_help(help);
    }

    report.finish()
}

/// Render a diagnostic to stderr.
/// 将诊断信息渲染到标准错误输出。
pub fn emit(source: &str, filename: &str, diagnostic: &Diagnostic) -> std::io::Result<()> {
    build_report(filename, diagnostic, true).eprint((filename, Source::from(source)))
}

/// Render a diagnostic to a plain (uncoloured) string.
/// 将诊断信息渲染为纯文本字符串。
pub fn render(source: &str, filename: &str, diagnostic: &Diagnostic) -> String {
    let mut buffer = Vec::new();
    if build_report(filename, diagnostic, false)
        .write((filename, Source::from(source)), &mut buffer)
        .is_err()
    {
        return diagnostic.to_string();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
