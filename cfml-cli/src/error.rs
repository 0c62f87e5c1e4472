//! CLI errors.
//! CLI 错误。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] cfml_fmt::FormatError),

    #[error(transparent)]
    Fixture(#[from] cfml_fmt::FixtureError),

    #[error("{count} error(s) found")]
    Diagnostics { count: usize },

    #[error("would reformat: {}", .0.display())]
    NotFormatted(PathBuf),

    #[error("{0} fixture(s) failed")]
    FixturesFailed(usize),
}
