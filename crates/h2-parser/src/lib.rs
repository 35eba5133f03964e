//! H2 parser: builds a syntax tree from assembly source.
//!
//! Recursive descent, one method per production, pulling tokens from the
//! lexer on demand. The first error ends the parse.

mod parse_decl;
mod parse_stmt;
mod parser;

pub use parser::Parser;

use h2_types::ast::Program;
use h2_types::{Result, SourceFile};

/// Parse a whole source file.
pub fn parse(source: &SourceFile) -> Result<Program> {
    Parser::new(source).parse()
}
