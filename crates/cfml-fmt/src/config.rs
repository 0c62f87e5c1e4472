//! Decompiler layout settings.
//! 反编译输出的排版设置。

use std::borrow::Cow;

/// One level of indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Tab,
    Spaces(usize),
}

/// Layout of decompiled CFML.
///
/// The canonical form indents with tabs and ends a whole file with a
/// newline; a single decompiled node never gets one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    pub indent: Indent,
    pub trailing_newline: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: Indent::Tab,
            trailing_newline: true,
        }
    }
}

impl FormatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch between tab and space indentation. Turning tabs off indents
    /// with four spaces until [`indent_width`](Self::indent_width) says
    /// otherwise.
    pub fn use_tabs(mut self, tabs: bool) -> Self {
        self.indent = match (tabs, self.indent) {
            (true, _) => Indent::Tab,
            (false, Indent::Spaces(n)) => Indent::Spaces(n),
            (false, Indent::Tab) => Indent::Spaces(4),
        };
        self
    }

    /// Indent with `width` spaces per level.
    pub fn indent_width(mut self, width: usize) -> Self {
        self.indent = Indent::Spaces(width);
        self
    }

    pub fn trailing_newline(mut self, on: bool) -> Self {
        self.trailing_newline = on;
        self
    }

    /// Text of a single indentation level.
    pub fn indent_str(&self) -> Cow<'static, str> {
        match self.indent {
            Indent::Tab => Cow::Borrowed("\t"),
            Indent::Spaces(n) => Cow::Owned(" ".repeat(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_by_default() {
        let config = FormatConfig::default();
        assert_eq!(config.indent, Indent::Tab);
        assert_eq!(config.indent_str(), "\t");
        assert!(config.trailing_newline);
    }

    #[test]
    fn test_spaces() {
        assert_eq!(FormatConfig::new().use_tabs(false).indent_str(), "    ");
        let two = FormatConfig::new().use_tabs(false).indent_width(2);
        assert_eq!(two.indent_str(), "  ");
        assert_eq!(two.clone().use_tabs(false), two);
        assert_eq!(two.use_tabs(true).indent, Indent::Tab);
    }
}
