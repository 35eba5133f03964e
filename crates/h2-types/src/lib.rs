//! Shared types for the H2 toolchain.
//!
//! This crate defines the instruction set encoding, the syntax tree,
//! source spans, diagnostics, the leveled logger and the binary image
//! format used by the assembler and the virtual machine alike.

mod error;
mod log;
mod span;
pub mod ast;
pub mod image;
pub mod isa;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, H2Error, Severity, MAX_ERRORS};
pub use image::{Image, ImageError};
pub use log::{LogLevel, LogRecord, Logger};
pub use span::{SourceFile, Span};

/// Result type used by the lexer and parser.
pub type Result<T> = std::result::Result<T, H2Error>;
