//! AST and syntax definitions for CFML script.
//!
//! This crate defines the statement and expression trees produced by the
//! AST builder and consumed by the decompiler, together with the attribute
//! map and the per-statement sets of valid attribute names.

mod ast;
mod attributes;
mod expr;
pub mod valid;

pub use ast::*;
pub use attributes::*;
pub use expr::*;

use thiserror::Error;

/// Violations of AST invariants raised by setters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    #[error("a shorthand property must have a name")]
    MissingPropertyName,
}
