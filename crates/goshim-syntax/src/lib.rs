//! Go source parser for package declarations.
//!
//! This crate provides a lexer and recursive descent parser for the top-level
//! declarations of Go source files: the package clause, imports, constants,
//! variables, types and functions. Function bodies and initializer
//! expressions are skipped; type expressions and signatures are kept in full
//! and render back to canonical Go text through `Display`.

mod ast;
mod lexer;
mod parser;
mod print;

pub use ast::*;
pub use lexer::{Comment, CommentGroup, Lexed, Lexer, Token, TokenKind};
pub use parser::{parse_file, unquote, ParseError, ParseResult};
pub use print::type_params_to_string;
