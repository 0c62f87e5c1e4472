//! Common utilities and data structures for the CFML front-end.
//!
//! This crate provides foundational types used across the pipeline:
//! - `Span`: Source code location tracking
//! - `LineIndex`: Mapping from byte offsets to line numbers

mod line_index;
mod span;

pub use line_index::LineIndex;
pub use span::{BytePos, Span};
