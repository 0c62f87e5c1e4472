//! Byte offsets and half-open ranges into CFML source text.
//! CFML 源码中的字节偏移与半开区间。
//!
//! Every token, parse-tree leaf and AST node carries a [`Span`]. Spans are
//! plain byte ranges: line numbers are resolved separately through
//! [`LineIndex`](crate::LineIndex) only when a diagnostic needs them.

use std::fmt;
use std::ops::Range;

/// Byte offset into a source file.
/// 源文件中的字节偏移。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BytePos(pub u32);

impl BytePos {
    pub const ZERO: BytePos = BytePos(0);

    /// Move forward by `delta` bytes, saturating at `u32::MAX`.
    pub fn offset(self, delta: u32) -> BytePos {
        BytePos(self.0.saturating_add(delta))
    }
}

impl From<usize> for BytePos {
    fn from(offset: usize) -> Self {
        BytePos(u32::try_from(offset).unwrap_or(u32::MAX))
    }
}

impl From<BytePos> for usize {
    fn from(pos: BytePos) -> Self {
        pos.0 as usize
    }
}

impl fmt::Debug for BytePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Half-open byte range `start..end` of a token or node.
/// 词法单元或节点的半开字节区间。
///
/// Spans are location metadata only; AST equality never looks at them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: BytePos,
    /// Exclusive.
    pub end: BytePos,
}

impl Span {
    /// Placeholder for nodes built outside the parser.
    /// 解析器之外构造的节点所用的占位范围。
    pub const DUMMY: Span = Span {
        start: BytePos::ZERO,
        end: BytePos::ZERO,
    };

    pub fn new(start: BytePos, end: BytePos) -> Self {
        debug_assert!(start <= end, "span starts after it ends");
        Span { start, end }
    }

    pub fn from_usize(start: usize, end: usize) -> Self {
        Span::new(start.into(), end.into())
    }

    /// Zero-width span at `pos`, used for inserted tokens.
    pub fn point(pos: BytePos) -> Self {
        Span::new(pos, pos)
    }

    /// Smallest span enclosing both.
    /// 同时覆盖两者的最小范围。
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.0.saturating_sub(self.start.0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, pos: BytePos) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start.into()..self.end.into()
    }

    /// Text under the span, or `None` when it falls outside `source` or
    /// splits a UTF-8 sequence.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.range())
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::from_usize(range.start, range.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_is_empty() {
        let span = Span::point(BytePos(7));
        assert!(span.is_empty());
        assert!(!span.contains(BytePos(7)));
    }

    #[test]
    fn test_contains_half_open() {
        let span = Span::from(2..5);
        assert!(span.contains(BytePos(2)));
        assert!(span.contains(BytePos(4)));
        assert!(!span.contains(BytePos(5)));
    }

    #[test]
    fn test_slice_outside_source() {
        assert_eq!(Span::from(0..3).slice("ab"), None);
        assert_eq!(Span::from(1..2).slice("ab"), Some("b"));
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Span::from(3..9)), "3..9");
        assert_eq!(format!("{:?}", BytePos(4)), "@4");
    }
}
