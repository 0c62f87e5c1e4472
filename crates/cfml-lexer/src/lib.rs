//! Lexical analysis for CFML script.
//! CFML 脚本词法分析模块。
//!
//! This crate provides the lexer that converts source code into tokens,
//! and the seekable token stream the parser reads from.
//! 本 crate 提供词法分析器，将源代码转换为 token 序列，并提供可回退的 token 流。

mod lexer;
mod stream;
mod token;

pub use lexer::Lexer;
pub use stream::TokenStream;
pub use token::{Token, TokenKind, token_listing};
