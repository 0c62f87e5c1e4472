//! Fixture files for parser regression tests.
//!
//! A source file `name.cfc` (or `.cfm`) sits next to `name.expected.txt`,
//! which holds up to three sections:
//!
//! ```text
//! /*===TOKENS===*/
//! IDENTIFIER:x
//! ...
//! /*===TREE===*/
//! (scriptBlock ...)
//! /*======*/
//! /*===DECOMPILE===*/
//! x = 1
//! /*======*/
//! ```
//!
//! Sections are compared after collapsing whitespace runs. An empty
//! `DECOMPILE` section means the decompiled text must equal the source.
//! A missing or empty `TREE` section is filled in from the actual output.
//! A section without its closing marker makes the whole file unusable.

use cfml_diagnostic::Diagnostic;
use cfml_lexer::token_listing;
use cfml_lower::{LowerOptions, parse_script};
use cfml_parser::ParseOptions;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::decompile::Decompile;

pub const TOKENS_MARKER: &str = "/*===TOKENS===*/";
pub const TREE_MARKER: &str = "/*===TREE===*/";
pub const DECOMPILE_MARKER: &str = "/*===DECOMPILE===*/";
pub const END_MARKER: &str = "/*======*/";
const ANY_MARKER: &str = "/*===";

/// Trees larger than this are written without a decompile section.
const AUTO_DECOMPILE_LIMIT: usize = 30_000;

/// Errors from reading or writing fixture files.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a .cfc or .cfm file")]
    NotASource(PathBuf),
    #[error("{path}: {source}")]
    Malformed {
        path: PathBuf,
        source: UnterminatedSection,
    },
}

/// A section marker with no closing marker after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{} section is not terminated", .0.name())]
pub struct UnterminatedSection(pub Section);

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_white(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_eol(c: char) -> bool {
    c == '\r' || c == '\n'
}

/// Text after `marker` up to the next `end`, without surrounding line
/// breaks. `Ok(None)` when the marker is absent, `Ok(Some(""))` when the
/// section is empty.
fn section<'a>(
    text: &'a str,
    marker: &str,
    end: &str,
    which: Section,
) -> Result<Option<&'a str>, UnterminatedSection> {
    let Some(found) = text.find(marker) else {
        return Ok(None);
    };
    let body = text[found + marker.len()..].trim_start_matches(is_eol);
    let len = body.find(end).ok_or(UnterminatedSection(which))?;
    Ok(Some(body[..len].trim_end_matches(is_eol)))
}

fn non_empty(section: Option<&str>) -> Option<String> {
    section.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Expected results parsed from a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixture {
    pub tokens: Option<String>,
    pub tree: Option<String>,
    /// `Some("")` means "same as the source".
    pub decompile: Option<String>,
}

impl Fixture {
    /// Split fixture text into its sections. Text without any marker is a
    /// bare tree.
    pub fn parse(text: &str) -> Result<Self, UnterminatedSection> {
        if !text.contains(ANY_MARKER) {
            return Ok(Self {
                tree: Some(text.to_string()),
                ..Self::default()
            });
        }
        Ok(Self {
            tokens: non_empty(section(text, TOKENS_MARKER, ANY_MARKER, Section::Tokens)?),
            tree: non_empty(section(text, TREE_MARKER, END_MARKER, Section::Tree)?),
            decompile: section(text, DECOMPILE_MARKER, END_MARKER, Section::Decompile)?
                .map(str::to_string),
        })
    }

    /// The text the decompiled source must match, if checked at all.
    pub fn expected_decompile<'a>(&'a self, source: &'a str) -> Option<&'a str> {
        match self.decompile.as_deref() {
            Some(text) if text.trim().is_empty() => Some(source),
            other => other,
        }
    }

    /// Write the sections back in fixture format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(tokens) = &self.tokens {
            out.push_str(TOKENS_MARKER);
            out.push('\n');
            out.push_str(tokens);
            out.push('\n');
        }
        if let Some(tree) = &self.tree {
            out.push_str(TREE_MARKER);
            out.push('\n');
            out.push_str(tree);
            out.push('\n');
            out.push_str(END_MARKER);
        }
        if let Some(decompile) = &self.decompile {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(DECOMPILE_MARKER);
            out.push('\n');
            out.push_str(decompile);
            out.push('\n');
            out.push_str(END_MARKER);
        }
        out
    }
}

/// Which part of a fixture disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Tokens,
    Tree,
    Decompile,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Tokens => "TOKENS",
            Section::Tree => "TREE",
            Section::Decompile => "DECOMPILE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Mismatch {
        section: Section,
        expected: String,
        actual: String,
    },
    /// The source did not parse cleanly; messages of the errors.
    Diagnostics(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// Expectations were (re)generated from the actual output.
    Written,
    Failed(Vec<Failure>),
}

/// The result of running one fixture.
#[derive(Debug, Clone)]
pub struct FixtureReport {
    pub source: PathBuf,
    pub expected: PathBuf,
    pub outcome: Outcome,
    /// Whether the expectation file was (re)written, pass or fail.
    pub written: bool,
}

impl FixtureReport {
    pub fn passed(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed(_))
    }
}

/// What the pipeline actually produced for a source.
#[derive(Debug, Clone)]
pub struct Actual {
    pub tokens: String,
    pub tree: String,
    pub decompile: String,
    pub errors: Vec<Diagnostic>,
}

impl Actual {
    pub fn of(source: &str) -> Self {
        let output = parse_script(source, &ParseOptions::new(), &LowerOptions::new());
        Self {
            tokens: token_listing(&output.tokens),
            tree: output.tree.to_lisp(),
            decompile: output
                .root
                .as_ref()
                .map(|root| root.decompile(0))
                .unwrap_or_default(),
            errors: output
                .diagnostics
                .into_iter()
                .filter(Diagnostic::is_error)
                .collect(),
        }
    }

    /// A fixture holding this output.
    ///
    /// The decompile section is left out for large trees, for sources with
    /// errors, and when nothing was decompiled: an empty section would read
    /// back as "same as the source".
    pub fn to_fixture(&self) -> Fixture {
        let decompile = self.tree.len() < AUTO_DECOMPILE_LIMIT
            && self.errors.is_empty()
            && !self.decompile.trim().is_empty();
        Fixture {
            tokens: Some(self.tokens.clone()),
            tree: Some(self.tree.clone()),
            decompile: decompile.then(|| self.decompile.clone()),
        }
    }

    /// The failure every fixture with error diagnostics reports.
    pub fn diagnostics_failure(&self) -> Option<Failure> {
        (!self.errors.is_empty()).then(|| {
            Failure::Diagnostics(self.errors.iter().map(|d| d.message.clone()).collect())
        })
    }
}

fn compare(section: Section, expected: &str, actual: &str) -> Option<Failure> {
    let (expected, actual) = (normalize_white(expected), normalize_white(actual));
    (expected != actual).then_some(Failure::Mismatch {
        section,
        expected,
        actual,
    })
}

/// Compare a source's actual output with a fixture. Returns the failures;
/// an empty list is a pass.
pub fn check(source: &str, fixture: &Fixture, actual: &Actual) -> Vec<Failure> {
    let mut failures = Vec::new();
    if let Some(tokens) = fixture.tokens.as_deref().filter(|t| !t.trim().is_empty()) {
        failures.extend(compare(Section::Tokens, tokens, &actual.tokens));
    }
    if let Some(tree) = fixture.tree.as_deref().filter(|t| !t.trim().is_empty()) {
        failures.extend(compare(Section::Tree, tree, &actual.tree));
    }
    failures.extend(actual.diagnostics_failure());
    if let Some(expected) = fixture.expected_decompile(source) {
        failures.extend(compare(Section::Decompile, expected, &actual.decompile));
    }
    failures
}

/// `name.cfc` → `name.expected.txt`.
pub fn expected_path(source: &Path) -> Result<PathBuf, FixtureError> {
    let is_source = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("cfc") || e.eq_ignore_ascii_case("cfm"));
    if !is_source {
        return Err(FixtureError::NotASource(source.to_path_buf()));
    }
    Ok(source.with_extension("expected.txt"))
}

/// Run the fixture for one source file.
///
/// Expectations are written when the file has no tree yet, or when
/// `update` is set and the fixture fails. Writing never turns a source with
/// error diagnostics into a pass.
pub fn run(source_path: &Path, update: bool) -> Result<FixtureReport, FixtureError> {
    let expected_path = expected_path(source_path)?;
    let source = fs::read_to_string(source_path).map_err(|source| FixtureError::Read {
        path: source_path.to_path_buf(),
        source,
    })?;
    let fixture = if expected_path.exists() {
        let text = fs::read_to_string(&expected_path).map_err(|source| FixtureError::Read {
            path: expected_path.clone(),
            source,
        })?;
        Fixture::parse(&text).map_err(|source| FixtureError::Malformed {
            path: expected_path.clone(),
            source,
        })?
    } else {
        Fixture::default()
    };

    let actual = Actual::of(&source);
    let missing_tree = fixture.tree.as_deref().is_none_or(|t| t.trim().is_empty());
    let failures = check(&source, &fixture, &actual);

    let written = missing_tree || (update && !failures.is_empty());
    if written {
        log::info!("writing expectations to {}", expected_path.display());
        fs::write(&expected_path, actual.to_fixture().render()).map_err(|source| {
            FixtureError::Write {
                path: expected_path.clone(),
                source,
            }
        })?;
    }

    // Once written, the file matches; only the diagnostics can still fail.
    let outcome = match (written, actual.diagnostics_failure()) {
        (true, Some(diagnostics)) => Outcome::Failed(vec![diagnostics]),
        (true, None) => Outcome::Written,
        (false, _) if failures.is_empty() => Outcome::Passed,
        (false, _) => Outcome::Failed(failures),
    };

    Ok(FixtureReport {
        source: source_path.to_path_buf(),
        expected: expected_path,
        outcome,
        written,
    })
}

/// Source files (`.cfc`, `.cfm`) under `dir`, recursively, sorted.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, FixtureError> {
    let mut found = Vec::new();
    collect(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), FixtureError> {
    let entries = fs::read_dir(dir).map_err(|source| FixtureError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| FixtureError::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            collect(&path, found)?;
        } else if expected_path(&path).is_ok() {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let text = "/*===TOKENS===*/\r\nIDENTIFIER:x\r\n/*===TREE===*/\r\n(scriptBlock x)\r\n/*======*/\r\n/*===DECOMPILE===*/\r\nx\r\n/*======*/";
        let fixture = Fixture::parse(text).unwrap();
        assert_eq!(fixture.tokens.as_deref(), Some("IDENTIFIER:x"));
        assert_eq!(fixture.tree.as_deref(), Some("(scriptBlock x)"));
        assert_eq!(fixture.decompile.as_deref(), Some("x"));
    }

    #[test]
    fn test_empty_decompile_means_source() {
        let text = "/*===TREE===*/\n(t)\n/*======*/\n/*===DECOMPILE===*/\n/*======*/";
        let fixture = Fixture::parse(text).unwrap();
        assert_eq!(fixture.decompile.as_deref(), Some(""));
        assert_eq!(fixture.expected_decompile("x = 1;"), Some("x = 1;"));
    }

    #[test]
    fn test_bare_text_is_tree() {
        let fixture = Fixture::parse("(scriptBlock <EOF>)").unwrap();
        assert_eq!(fixture.tree.as_deref(), Some("(scriptBlock <EOF>)"));
        assert_eq!(fixture.tokens, None);
        assert_eq!(fixture.expected_decompile("x"), None);
    }

    #[test]
    fn test_render_parses_back() {
        let fixture = Fixture {
            tokens: Some("A:a".into()),
            tree: Some("(t a)".into()),
            decompile: Some("a".into()),
        };
        assert_eq!(Fixture::parse(&fixture.render()), Ok(fixture));
    }

    #[test]
    fn test_unterminated_sections_rejected() {
        let open_decompile = "/*===TREE===*/\n(t)\n/*======*/\n/*===DECOMPILE===*/\nx = 1";
        assert_eq!(
            Fixture::parse(open_decompile),
            Err(UnterminatedSection(Section::Decompile))
        );
        assert_eq!(
            Fixture::parse("/*===TREE===*/\n(t)"),
            Err(UnterminatedSection(Section::Tree))
        );
        assert_eq!(
            Fixture::parse("/*===TOKENS===*/\nA:a\n"),
            Err(UnterminatedSection(Section::Tokens))
        );
    }

    #[test]
    fn test_broken_source_written_without_decompile() {
        let actual = Actual::of("x = ;");
        assert!(actual.diagnostics_failure().is_some());
        let fixture = actual.to_fixture();
        assert!(fixture.tree.is_some());
        assert_eq!(fixture.decompile, None);

        let comments_only = Actual::of("// nothing here\n");
        assert_eq!(comments_only.to_fixture().decompile, None);
    }

    #[test]
    fn test_normalize_white() {
        assert_eq!(normalize_white("  a\r\n\t b  c\n"), "a b c");
    }

    #[test]
    fn test_expected_path() {
        let path = expected_path(Path::new("tests/foo.cfc")).unwrap();
        assert_eq!(path, Path::new("tests/foo.expected.txt"));
        assert!(expected_path(Path::new("foo.txt")).is_err());
    }

    #[test]
    fn test_check_reports_tree_mismatch() {
        let source = "x = 1;";
        let actual = Actual::of(source);
        let fixture = Fixture {
            tree: Some("(scriptBlock y)".into()),
            ..Fixture::default()
        };
        let failures = check(source, &fixture, &actual);
        assert!(matches!(
            failures.as_slice(),
            [Failure::Mismatch {
                section: Section::Tree,
                ..
            }]
        ));
    }
}
