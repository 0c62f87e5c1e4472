//! The `cfml tokens` command.

use crate::commands::{emit_all, read_source};
use crate::error::CliError;
use cfml_lexer::{Lexer, token_listing};
use std::path::Path;

/// Print the token listing of a file, comments included.
pub fn run(file: &Path) -> Result<(), CliError> {
    let source = read_source(file)?;
    let (tokens, diagnostics) = Lexer::new(&source).tokenize();
    println!("{}", token_listing(&tokens));
    emit_all(&source, file, &diagnostics)
}
