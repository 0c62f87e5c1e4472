//! The `cfml fixture` command.
//! `cfml fixture` 命令。

use crate::error::CliError;
use crate::output;
use cfml_fmt::fixture::{self, Failure, Outcome};
use std::path::{Path, PathBuf};

/// Run fixtures for the given files and directories.
/// 运行给定文件和目录的夹具。
pub fn run(paths: &[PathBuf], update: bool) -> Result<(), CliError> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            sources.extend(fixture::discover(path)?);
        } else {
            sources.push(path.clone());
        }
    }

    let mut failed = 0;
    for source in &sources {
        let report = fixture::run(source, update)?;
        match &report.outcome {
            Outcome::Passed => output::success(&format!("ok {}", source.display())),
            Outcome::Written => output::info(&format!("wrote {}", report.expected.display())),
            Outcome::Failed(failures) => {
                failed += 1;
                if report.written {
                    output::info(&format!("wrote {}", report.expected.display()));
                }
                report_failures(source, failures);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::FixturesFailed(failed));
    }
    output::success(&format!("{} fixture(s) passed", sources.len()));
    Ok(())
}

fn report_failures(source: &Path, failures: &[Failure]) {
    output::error(&format!("FAILED {}", source.display()));
    for failure in failures {
        match failure {
            Failure::Mismatch {
                section,
                expected,
                actual,
            } => {
                output::detail(&format!("{} differs", section.name()));
                output::detail(&format!("expected: {expected}"));
                output::detail(&format!("actual:   {actual}"));
            }
            Failure::Diagnostics(messages) => {
                for message in messages {
                    output::detail(&format!("parse error: {message}"));
                }
            }
        }
    }
}
