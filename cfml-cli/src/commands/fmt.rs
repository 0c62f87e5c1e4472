//! The `cfml fmt` command.
//! `cfml fmt` 命令。

use crate::commands::read_source;
use crate::error::CliError;
use crate::output;
use cfml_fmt::FormatConfig;
use std::fs;
use std::path::Path;

/// What to do with the formatted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Print,
    Write,
    Check,
}

/// Format a CFML script file.
/// 格式化 CFML 脚本文件。
pub fn run(file: &Path, config: &FormatConfig, mode: Mode) -> Result<(), CliError> {
    let source = read_source(file)?;
    let formatted = cfml_fmt::format_with_config(&source, config)?;

    match mode {
        Mode::Print => print!("{formatted}"),
        Mode::Write if formatted != source => {
            fs::write(file, &formatted).map_err(|source| CliError::Write {
                path: file.to_path_buf(),
                source,
            })?;
            output::success(&format!("Formatted: {}", file.display()));
        }
        Mode::Write => output::info(&format!("Already formatted: {}", file.display())),
        Mode::Check if formatted != source => {
            return Err(CliError::NotFormatted(file.to_path_buf()));
        }
        Mode::Check => output::success(&format!("OK: {}", file.display())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cfc");
        fs::write(&path, "x=1;y=2;").unwrap();
        let config = FormatConfig::default();

        assert!(matches!(
            run(&path, &config, Mode::Check),
            Err(CliError::NotFormatted(_))
        ));
        run(&path, &config, Mode::Write).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1;\ny = 2;\n");
        run(&path, &config, Mode::Check).unwrap();
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cfm");
        fs::write(&path, "x = ;").unwrap();
        let result = run(&path, &FormatConfig::default(), Mode::Print);
        assert!(matches!(result, Err(CliError::Format(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = run(Path::new("/nonexistent/x.cfc"), &FormatConfig::default(), Mode::Print);
        assert!(matches!(result, Err(CliError::Read { .. })));
    }
}
