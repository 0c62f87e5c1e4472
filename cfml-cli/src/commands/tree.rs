//! The `cfml tree` command.
//! `cfml tree` 命令。

use crate::args::ParseArgs;
use crate::commands::{emit_all, read_source};
use crate::error::CliError;
use crate::output;
use cfml_parser::parse;
use std::path::Path;

/// Print the parenthesized parse tree of a file.
/// 打印文件的括号形式解析树。
pub fn run(file: &Path, args: &ParseArgs, verbose: bool) -> Result<(), CliError> {
    let source = read_source(file)?;
    let output = parse(&source, &args.options());
    println!("{}", output.tree.to_lisp());
    if verbose {
        output::info(&format!("parsed by the {:?} stage", output.stage));
    }
    emit_all(&source, file, &output.diagnostics)?;
    let errors = output.diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        return Err(CliError::Diagnostics { count: errors });
    }
    Ok(())
}
