use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors kept in a [`CompileErrors`] list.
pub const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Lexing and parsing (E100–E199).
    Syntax,
    /// Code generation and symbol resolution (E200–E299).
    Assembly,
}

/// Numeric error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNTERMINATED_COMMENT: Self = Self(102);
    pub const INVALID_CHARACTER: Self = Self(103);
    pub const IDENTIFIER_TOO_LONG: Self = Self(104);
    pub const NESTED_DEFINITION: Self = Self(105);
    pub const UNMATCHED_END_DEFINITION: Self = Self(106);
    pub const FLAG_ALREADY_SET: Self = Self(107);
    pub const EXPECTED_SINGLE_CHARACTER: Self = Self(108);

    // ── Assembly errors (E200–E299) ──
    pub const UNDEFINED_SYMBOL: Self = Self(200);
    pub const DUPLICATE_SYMBOL: Self = Self(201);
    pub const INVALID_JUMP_TARGET: Self = Self(202);
    pub const INVALID_WORD_FLAGS: Self = Self(203);
    pub const BUILT_INS_REDEFINED: Self = Self(204);
    pub const MISSING_BUILT_IN: Self = Self(205);
    pub const MEMORY_OVERFLOW: Self = Self(206);
    pub const STRING_TOO_LONG: Self = Self(207);
    pub const NOT_CALLABLE: Self = Self(208);
    pub const INVALID_CONSTANT: Self = Self(209);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Assembly,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Assembly => write!(f, "assembly"),
        }
    }
}

/// A structured diagnostic from the lexer, parser or code generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct H2Error {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, verbatim.
    pub source_line: String,
}

impl H2Error {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }

    /// Build an error located in `source`, filling in the file name and line.
    pub fn at(source: &crate::SourceFile, code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        let line = source.line(span.start_line).unwrap_or_default();
        Self::new(source.name.clone(), code, message, span, line)
    }
}

impl fmt::Display for H2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for H2Error {}

/// Errors and warnings of one compilation, as reported in JSON output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<H2Error>,
    pub warnings: Vec<H2Error>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error; only the first [`MAX_ERRORS`] are kept but all are counted.
    pub fn push_error(&mut self, error: H2Error) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn push_warning(&mut self, mut warning: H2Error) {
        warning.severity = Severity::Warning;
        self.warnings.push(warning);
        self.total_warnings += 1;
    }
}
