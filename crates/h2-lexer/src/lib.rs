//! H2 lexer: converts assembly source into a token stream.
//!
//! The parser pulls tokens one at a time with [`Lexer::next_token`];
//! [`Lexer::lex`] collects the whole stream for tests and tooling.

pub mod lexer;
pub mod token;

pub use lexer::{Lexer, MAX_ID_LENGTH};
pub use token::{Token, TokenKind, KEYWORDS};
