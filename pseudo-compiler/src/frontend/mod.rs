//! Source text to AST: positions, lexing and parsing.

pub mod lexer;
pub mod parser;
pub mod source;
