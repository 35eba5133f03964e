//! Assembly error types.

use h2_types::{ErrorCode, H2Error, SourceFile, Span};
use thiserror::Error;

/// Errors raised while lowering a program to an image.
///
/// Every variant carries the span of the statement being generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("undefined symbol: {name}")]
    UndefinedSymbol { name: String, span: Span },

    #[error("symbol already defined: {name}")]
    DuplicateSymbol { name: String, span: Span },

    #[error("cannot branch/0branch to call: {name}")]
    BranchToCall { name: String, span: Span },

    #[error("invalid jump address: {address}")]
    JumpOutOfRange { address: u16, span: Span },

    #[error("cannot modify word bits (immediate/hidden/inline) of '{name}' if not in compile mode")]
    FlagsWithoutHeaders { name: String, span: Span },

    #[error("built in words already defined")]
    BuiltInsRedefined { span: Span },

    #[error("'{name}' needs the built-in word {word}; use location or define built-ins first")]
    MissingBuiltIn {
        word: &'static str,
        name: String,
        span: Span,
    },

    #[error("PC/dictionary overflow: {pc:#06x}")]
    MemoryOverflow { pc: u16, span: Span },

    #[error("string is too large ({len} > 255)")]
    StringTooLong { len: usize, span: Span },

    #[error("not a defined procedure: {name}")]
    NotCallable { name: String, span: Span },

    #[error("constant '{name}' must have a numeric value")]
    InvalidConstant { name: String, span: Span },

    #[error("nested word definition is not allowed: {name}")]
    NestedDefinition { name: String, span: Span },
}

impl AssemblyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UndefinedSymbol { .. } => ErrorCode::UNDEFINED_SYMBOL,
            Self::DuplicateSymbol { .. } => ErrorCode::DUPLICATE_SYMBOL,
            Self::BranchToCall { .. } | Self::JumpOutOfRange { .. } => ErrorCode::INVALID_JUMP_TARGET,
            Self::FlagsWithoutHeaders { .. } => ErrorCode::INVALID_WORD_FLAGS,
            Self::BuiltInsRedefined { .. } => ErrorCode::BUILT_INS_REDEFINED,
            Self::MissingBuiltIn { .. } => ErrorCode::MISSING_BUILT_IN,
            Self::MemoryOverflow { .. } => ErrorCode::MEMORY_OVERFLOW,
            Self::StringTooLong { .. } => ErrorCode::STRING_TOO_LONG,
            Self::NotCallable { .. } => ErrorCode::NOT_CALLABLE,
            Self::InvalidConstant { .. } => ErrorCode::INVALID_CONSTANT,
            Self::NestedDefinition { .. } => ErrorCode::NESTED_DEFINITION,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedSymbol { span, .. }
            | Self::DuplicateSymbol { span, .. }
            | Self::BranchToCall { span, .. }
            | Self::JumpOutOfRange { span, .. }
            | Self::FlagsWithoutHeaders { span, .. }
            | Self::BuiltInsRedefined { span }
            | Self::MissingBuiltIn { span, .. }
            | Self::MemoryOverflow { span, .. }
            | Self::StringTooLong { span, .. }
            | Self::NotCallable { span, .. }
            | Self::InvalidConstant { span, .. }
            | Self::NestedDefinition { span, .. } => *span,
        }
    }

    /// Convert into a structured diagnostic located in `source`.
    pub fn to_diagnostic(&self, source: &SourceFile) -> H2Error {
        H2Error::at(source, self.code(), self.to_string(), self.span())
    }
}

/// Assembly result type alias.
pub type AssemblyResult<T> = Result<T, AssemblyError>;
