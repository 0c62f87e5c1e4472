//! CLI command implementations.

pub mod check;
pub mod fixture;
pub mod fmt;
pub mod tokens;
pub mod tree;

use crate::error::CliError;
use cfml_diagnostic::{Diagnostic, emit};
use std::fs;
use std::path::Path;

/// Read a source file.
/// 读取源文件。
pub fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Render diagnostics to stderr.
/// 将诊断信息输出到标准错误。
pub fn emit_all(source: &str, path: &Path, diagnostics: &[Diagnostic]) -> Result<(), CliError> {
    let filename = path.display().to_string();
    for diagnostic in diagnostics {
        emit(source, &filename, diagnostic)?;
    }
    Ok(())
}
