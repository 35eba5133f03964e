//! Token types for the H2 lexer.
//!
//! Defines [`TokenKind`], covering numbers, names, strings, the assembler
//! keywords and the instruction mnemonics, and [`Token`], which pairs a
//! kind with a source [`Span`].

use h2_types::isa::Instruction;
use h2_types::Span;
use std::fmt;

/// Every reserved word that is not an instruction mnemonic.
pub const KEYWORDS: &[&str] = &[
    "constant", "call", "branch", "0branch", "begin", "while", "repeat", "again", "until",
    "for", "aft", "next", "if", "else", "then", ":", ";", "[char]", "variable", "location",
    "immediate", "hidden", "inline", "'", ".pwd", ".set", ".pc", ".mode", ".allocate",
    ".built-in",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // ── Values ──
    /// A decimal or `$`-prefixed hexadecimal number, already truncated to 16 bits.
    Literal(u16),
    Identifier(String),
    /// `name:` with the colon stripped.
    Label(String),
    /// Raw bytes between double quotes.
    Str(String),

    // ── Keywords ──
    Constant,
    Call,
    Branch,
    ZeroBranch,
    Begin,
    While,
    Repeat,
    Again,
    Until,
    For,
    Aft,
    Next,
    If,
    Else,
    Then,
    Define,
    EndDefine,
    Char,
    Variable,
    Location,
    Immediate,
    Hidden,
    Inline,
    Quote,
    Pwd,
    Set,
    Pc,
    Mode,
    Allocate,
    BuiltIn,

    /// An ALU mnemonic such as `dup` or `+`.
    Instruction(Instruction),

    /// End of input.
    Eoi,
}

impl TokenKind {
    /// Look up a keyword or instruction mnemonic.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "constant" => TokenKind::Constant,
            "call" => TokenKind::Call,
            "branch" => TokenKind::Branch,
            "0branch" => TokenKind::ZeroBranch,
            "begin" => TokenKind::Begin,
            "while" => TokenKind::While,
            "repeat" => TokenKind::Repeat,
            "again" => TokenKind::Again,
            "until" => TokenKind::Until,
            "for" => TokenKind::For,
            "aft" => TokenKind::Aft,
            "next" => TokenKind::Next,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "then" => TokenKind::Then,
            ":" => TokenKind::Define,
            ";" => TokenKind::EndDefine,
            "[char]" => TokenKind::Char,
            "variable" => TokenKind::Variable,
            "location" => TokenKind::Location,
            "immediate" => TokenKind::Immediate,
            "hidden" => TokenKind::Hidden,
            "inline" => TokenKind::Inline,
            "'" => TokenKind::Quote,
            ".pwd" => TokenKind::Pwd,
            ".set" => TokenKind::Set,
            ".pc" => TokenKind::Pc,
            ".mode" => TokenKind::Mode,
            ".allocate" => TokenKind::Allocate,
            ".built-in" => TokenKind::BuiltIn,
            _ => return Instruction::from_mnemonic(s).map(TokenKind::Instruction),
        })
    }

    /// Source text of a keyword, `None` for tokens that carry a payload.
    pub fn keyword(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::Constant => "constant",
            TokenKind::Call => "call",
            TokenKind::Branch => "branch",
            TokenKind::ZeroBranch => "0branch",
            TokenKind::Begin => "begin",
            TokenKind::While => "while",
            TokenKind::Repeat => "repeat",
            TokenKind::Again => "again",
            TokenKind::Until => "until",
            TokenKind::For => "for",
            TokenKind::Aft => "aft",
            TokenKind::Next => "next",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Then => "then",
            TokenKind::Define => ":",
            TokenKind::EndDefine => ";",
            TokenKind::Char => "[char]",
            TokenKind::Variable => "variable",
            TokenKind::Location => "location",
            TokenKind::Immediate => "immediate",
            TokenKind::Hidden => "hidden",
            TokenKind::Inline => "inline",
            TokenKind::Quote => "'",
            TokenKind::Pwd => ".pwd",
            TokenKind::Set => ".set",
            TokenKind::Pc => ".pc",
            TokenKind::Mode => ".mode",
            TokenKind::Allocate => ".allocate",
            TokenKind::BuiltIn => ".built-in",
            TokenKind::Instruction(i) => i.mnemonic(),
            TokenKind::Literal(_)
            | TokenKind::Identifier(_)
            | TokenKind::Label(_)
            | TokenKind::Str(_)
            | TokenKind::Eoi => return None,
        })
    }

    /// Short description of the token class, for "expected X" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Literal(_) => "literal".into(),
            TokenKind::Identifier(_) => "identifier".into(),
            TokenKind::Label(_) => "label".into(),
            TokenKind::Str(_) => "string".into(),
            TokenKind::Eoi => "end of input".into(),
            TokenKind::Instruction(_) => "instruction".into(),
            other => format!("'{}'", other.keyword().unwrap_or_default()),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Literal(n) => write!(f, "literal {n}"),
            TokenKind::Identifier(s) => write!(f, "identifier '{s}'"),
            TokenKind::Label(s) => write!(f, "label '{s}:'"),
            TokenKind::Str(s) => write!(f, "string \"{s}\""),
            TokenKind::Eoi => f.write_str("end of input"),
            other => write!(f, "'{}'", other.keyword().unwrap_or_default()),
        }
    }
}
