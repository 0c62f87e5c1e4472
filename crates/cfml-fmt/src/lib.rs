//! Decompiler for CFML script.
//! CFML 脚本反编译器。
//!
//! This crate renders AST nodes back to canonical source text, formats
//! whole files, and runs the fixture files used by parser regression tests.
//! 本 crate 将 AST 节点渲染回规范源代码，格式化整个文件，并运行解析器回归测试的夹具文件。

mod config;
mod decompile;
pub mod fixture;
pub mod printer;

pub use config::{FormatConfig, Indent};
pub use decompile::{Decompile, Decompiler};
pub use fixture::{Fixture, FixtureError, normalize_white};

use cfml_diagnostic::Diagnostic;
use cfml_lower::{AttributePolicy, LowerOptions, parse_script};
use cfml_parser::ParseOptions;
use thiserror::Error;

/// Format errors.
/// 格式化错误。
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// The source does not parse cleanly; formatting would lose text.
    /// 源代码存在语法错误。
    #[error("cannot format source with {} syntax error(s)", .0.len())]
    Syntax(Vec<Diagnostic>),
}

/// Format CFML script source.
/// 格式化 CFML 脚本源代码。
pub fn format(source: &str) -> Result<String, FormatError> {
    format_with_config(source, &FormatConfig::default())
}

/// Format CFML script source with custom configuration.
/// 使用自定义配置格式化 CFML 脚本源代码。
pub fn format_with_config(source: &str, config: &FormatConfig) -> Result<String, FormatError> {
    let lower = LowerOptions::new().with_policy(AttributePolicy::Ignore);
    let output = parse_script(source, &ParseOptions::new(), &lower);
    if output.has_errors() {
        let errors = output
            .diagnostics
            .into_iter()
            .filter(Diagnostic::is_error)
            .collect();
        return Err(FormatError::Syntax(errors));
    }
    Ok(Decompiler::new(config).script(output.root.as_ref()))
}

/// Check if source code is already formatted.
/// 检查源代码是否已格式化。
pub fn check(source: &str, config: &FormatConfig) -> Result<bool, FormatError> {
    Ok(format_with_config(source, config)? == source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_terminates_statements() {
        let formatted = format("x=1;\ny =  2").unwrap();
        assert_eq!(formatted, "x = 1;\ny = 2;\n");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format("").unwrap(), "");
        assert_eq!(format("// only a comment\n").unwrap(), "");
    }

    #[test]
    fn test_format_is_idempotent() {
        let source = "component extends=\"Base\" { function f(a, b = 1) { return a + b; } }";
        let once = format(source).unwrap();
        assert_eq!(format(&once).unwrap(), once);
        assert!(check(&once, &FormatConfig::default()).unwrap());
    }

    #[test]
    fn test_format_rejects_errors() {
        let err = format("x = ;").unwrap_err();
        let FormatError::Syntax(errors) = err;
        assert_eq!(errors.len(), 1);
    }
}
