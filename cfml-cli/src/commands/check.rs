//! The `cfml check` command.
//! `cfml check` 命令。

use crate::args::{ParseArgs, PolicyArg};
use crate::commands::{emit_all, read_source};
use crate::error::CliError;
use crate::output;
use cfml_diagnostic::{Diagnostic, DiagnosticRecord};
use cfml_lower::{LowerOptions, parse_script};
use std::path::Path;

/// Parse, build and validate a file, reporting every diagnostic.
/// 解析、构建并验证文件，报告所有诊断。
pub fn run(
    file: &Path,
    parse: &ParseArgs,
    attributes: PolicyArg,
    json: bool,
    verbose: bool,
) -> Result<(), CliError> {
    let source = read_source(file)?;
    let lower = LowerOptions::new().with_policy(attributes.into());
    let output = parse_script(&source, &parse.options(), &lower);

    if verbose {
        output::info(&format!(
            "{} tokens, parsed by the {:?} stage",
            output.tokens.len(),
            output.stage
        ));
    }

    if json {
        let records: Vec<DiagnosticRecord> =
            output.diagnostics.iter().map(Diagnostic::record).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        emit_all(&source, file, &output.diagnostics)?;
    }

    let errors = output.diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = output.diagnostics.len() - errors;
    if errors > 0 {
        return Err(CliError::Diagnostics { count: errors });
    }
    if !json {
        if warnings > 0 {
            output::warning(&format!("{warnings} warning(s) found"));
        } else {
            output::success("OK - No errors found");
        }
    }
    Ok(())
}
