//! Indenting output buffer.
//! 带缩进的输出缓冲区。
//!
//! The printer starts mid-line: whatever is written first is not indented,
//! so a node decompiled at some depth can be spliced after text the caller
//! already wrote. Every later line starts with the current indentation.
//! 打印器从行中开始：第一行不缩进，之后每行按当前级别缩进。

use std::borrow::Cow;

use crate::FormatConfig;

/// Output buffer with an indentation level.
/// 带缩进级别的输出缓冲区。
pub struct Printer {
    unit: Cow<'static, str>,
    buf: String,
    depth: usize,
    /// Set after a newline; the next non-empty write pays the indentation.
    pending_indent: bool,
}

impl Printer {
    /// Create a printer whose nested lines start at `indent` levels.
    /// 创建打印器，嵌套行从 `indent` 级开始。
    pub fn new(config: &FormatConfig, indent: usize) -> Self {
        Self {
            unit: config.indent_str(),
            buf: String::new(),
            depth: indent,
            pending_indent: false,
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }

    /// Append text. Newlines inside `s` are copied without indentation.
    /// 追加文本。
    pub fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if std::mem::take(&mut self.pending_indent) {
            for _ in 0..self.depth {
                self.buf.push_str(&self.unit);
            }
        }
        self.buf.push_str(s);
    }

    /// Blank lines stay empty: indentation is only written before text.
    pub fn newline(&mut self) {
        self.buf.push('\n');
        self.pending_indent = true;
    }

    pub fn space(&mut self) {
        self.write(" ");
    }

    /// One level deeper for the lines that follow.
    /// 后续行缩进加深一级。
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_unprefixed() {
        let config = FormatConfig::default();
        let mut p = Printer::new(&config, 1);
        p.write("{");
        p.indent();
        p.newline();
        p.write("x");
        p.dedent();
        p.newline();
        p.write("}");
        assert_eq!(p.finish(), "{\n\t\tx\n\t}");
    }

    #[test]
    fn test_blank_lines_not_indented() {
        let config = FormatConfig::default();
        let mut p = Printer::new(&config, 2);
        p.newline();
        p.newline();
        p.write("a");
        assert_eq!(p.finish(), "\n\n\t\ta");
    }
}
