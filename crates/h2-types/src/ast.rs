//! Syntax tree produced by the parser and consumed by the code generator.
//!
//! Every node carries a [`Span`] for error reporting. Blocks are plain
//! vectors of statements in source order.

use crate::isa::Instruction;
use crate::Span;
use std::fmt::{self, Write};

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// A spanned name. Strings used in name position (`: "x" ... ;`) end up
/// here too, the code generator does not distinguish them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Either a number or a symbol to be resolved at generation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(u16),
    Symbol(Ident),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(n) => write!(f, "{n}"),
            Operand::Symbol(id) => f.write_str(&id.name),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name:`
    Label(Ident),
    /// `call x`, `branch x`, `0branch x`
    Jump(Jump),
    /// `constant`, `variable` or `location`
    Declaration(Declaration),
    /// A number to push.
    Literal(Literal),
    /// An ALU mnemonic.
    Instruction(InstructionStmt),
    If(IfStmt),
    Begin(BeginLoop),
    For(ForLoop),
    Definition(Definition),
    /// `[char] c`
    Char(CharLit),
    /// `' word` pushes the byte address of a word or label.
    Quote(Ident),
    /// A bare identifier: call a word or push a constant/variable.
    CallWord(Ident),
    Directive(Directive),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Label(id) | Statement::Quote(id) | Statement::CallWord(id) => id.span,
            Statement::Jump(j) => j.span,
            Statement::Declaration(d) => d.span,
            Statement::Literal(l) => l.span,
            Statement::Instruction(i) => i.span,
            Statement::If(i) => i.span,
            Statement::Begin(b) => b.span,
            Statement::For(f) => f.span,
            Statement::Definition(d) => d.span,
            Statement::Char(c) => c.span,
            Statement::Directive(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Branch,
    ZeroBranch,
    Call,
}

impl JumpKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JumpKind::Branch => "branch",
            JumpKind::ZeroBranch => "0branch",
            JumpKind::Call => "call",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Jump {
    pub kind: JumpKind,
    pub target: Operand,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Constant,
    Variable,
    /// A variable with no dictionary entry, always hidden from the image.
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclValue {
    Literal(u16),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: Ident,
    pub value: DeclValue,
    pub hidden: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: u16,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionStmt {
    pub instruction: Instruction,
    pub span: Span,
}

/// `if ... [else ...] then`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub then_body: Vec<Statement>,
    pub else_body: Option<Vec<Statement>>,
    pub span: Span,
}

/// Which keyword closed a `begin` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginKind {
    Until,
    Again,
    WhileRepeat,
}

/// `begin ... until`, `begin ... again` or `begin ... while ... repeat`.
///
/// The parser creates the node as `Until` and retypes it once it sees the
/// closing keyword. `repeat_body` is only populated for `WhileRepeat`.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginLoop {
    pub kind: BeginKind,
    pub body: Vec<Statement>,
    pub repeat_body: Vec<Statement>,
    pub span: Span,
}

/// `for ... next` or `for ... aft ... then ... next`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub body: Vec<Statement>,
    pub aft: Option<AftClause>,
    pub span: Span,
}

/// The `aft ... then ...` part of a counted loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AftClause {
    /// Skipped on the first pass.
    pub aft_body: Vec<Statement>,
    pub then_body: Vec<Statement>,
}

/// Header bits attached to a word definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct DefineFlags(pub u16);

impl DefineFlags {
    pub const NONE: Self = Self(0);
    pub const HIDDEN: Self = Self(1 << 0);
    pub const IMMEDIATE: Self = Self(1 << 1);
    pub const INLINE: Self = Self(1 << 2);

    pub fn contains(self, other: DefineFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: DefineFlags) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The immediate and inline bits shifted into the top of a header cell.
    pub fn header_bits(self) -> u16 {
        (self.0 & (Self::IMMEDIATE.0 | Self::INLINE.0)) << 13
    }
}

impl fmt::Display for DefineFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (DefineFlags::HIDDEN, "hidden"),
            (DefineFlags::IMMEDIATE, "immediate"),
            (DefineFlags::INLINE, "inline"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_char(' ')?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// `: name ... ;` followed by any of `immediate`, `hidden`, `inline`.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: Ident,
    pub body: Vec<Statement>,
    pub flags: DefineFlags,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharLit {
    pub ch: u8,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Directives
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    /// `.pwd x` sets the previous-word register.
    Pwd(Operand),
    /// `.set location value` patches the cell at byte address `location`.
    Set { location: Operand, value: Operand },
    /// `.pc x` moves the program counter.
    Pc(Operand),
    /// `.mode n` replaces the assembler mode bits.
    Mode(u16),
    /// `.allocate n` reserves `n` bytes.
    Allocate(Operand),
    /// `.built-in` emits the built-in word table.
    BuiltIn,
}

impl DirectiveKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DirectiveKind::Pwd(_) => ".pwd",
            DirectiveKind::Set { .. } => ".set",
            DirectiveKind::Pc(_) => ".pc",
            DirectiveKind::Mode(_) => ".mode",
            DirectiveKind::Allocate(_) => ".allocate",
            DirectiveKind::BuiltIn => ".built-in",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Tree printing
// ══════════════════════════════════════════════════════════════════════════════

impl Program {
    /// Indented one-node-per-line dump, used for debug output.
    pub fn print_tree(&self) -> String {
        let mut out = String::from("program\n");
        print_block(&mut out, &self.statements, 1);
        out
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn print_block(out: &mut String, block: &[Statement], depth: usize) {
    for stmt in block {
        print_statement(out, stmt, depth);
    }
}

fn print_statement(out: &mut String, stmt: &Statement, depth: usize) {
    indent(out, depth);
    // Writing into a String cannot fail.
    let _ = match stmt {
        Statement::Label(id) => writeln!(out, "label {}", id.name),
        Statement::Jump(j) => writeln!(out, "{} {}", j.kind.keyword(), j.target),
        Statement::Declaration(d) => {
            let kind = match d.kind {
                DeclarationKind::Constant => "constant",
                DeclarationKind::Variable => "variable",
                DeclarationKind::Location => "location",
            };
            let hidden = if d.hidden { " hidden" } else { "" };
            match &d.value {
                DeclValue::Literal(n) => writeln!(out, "{kind} {} {n}{hidden}", d.name.name),
                DeclValue::Str(s) => writeln!(out, "{kind} {} \"{s}\"{hidden}", d.name.name),
            }
        }
        Statement::Literal(l) => writeln!(out, "literal {}", l.value),
        Statement::Instruction(i) => writeln!(out, "instruction {}", i.instruction),
        Statement::If(i) => {
            let _ = writeln!(out, "if");
            print_block(out, &i.then_body, depth + 1);
            if let Some(else_body) = &i.else_body {
                indent(out, depth);
                let _ = writeln!(out, "else");
                print_block(out, else_body, depth + 1);
            }
            Ok(())
        }
        Statement::Begin(b) => {
            let _ = writeln!(out, "begin");
            print_block(out, &b.body, depth + 1);
            indent(out, depth);
            match b.kind {
                BeginKind::Until => writeln!(out, "until"),
                BeginKind::Again => writeln!(out, "again"),
                BeginKind::WhileRepeat => {
                    let _ = writeln!(out, "while");
                    print_block(out, &b.repeat_body, depth + 1);
                    indent(out, depth);
                    writeln!(out, "repeat")
                }
            }
        }
        Statement::For(f) => {
            let _ = writeln!(out, "for");
            print_block(out, &f.body, depth + 1);
            if let Some(aft) = &f.aft {
                indent(out, depth);
                let _ = writeln!(out, "aft");
                print_block(out, &aft.aft_body, depth + 1);
                indent(out, depth);
                let _ = writeln!(out, "then");
                print_block(out, &aft.then_body, depth + 1);
            }
            indent(out, depth);
            writeln!(out, "next")
        }
        Statement::Definition(d) => {
            let _ = writeln!(out, "definition {}", d.name.name);
            print_block(out, &d.body, depth + 1);
            indent(out, depth);
            if d.flags.is_empty() {
                writeln!(out, ";")
            } else {
                writeln!(out, "; {}", d.flags)
            }
        }
        Statement::Char(c) => writeln!(out, "char {}", c.ch as char),
        Statement::Quote(id) => writeln!(out, "quote {}", id.name),
        Statement::CallWord(id) => writeln!(out, "call-definition {}", id.name),
        Statement::Directive(d) => match &d.kind {
            DirectiveKind::Set { location, value } => writeln!(out, ".set {location} {value}"),
            DirectiveKind::Pwd(op) | DirectiveKind::Pc(op) | DirectiveKind::Allocate(op) => {
                writeln!(out, "{} {op}", d.kind.keyword())
            }
            DirectiveKind::Mode(m) => writeln!(out, ".mode {m}"),
            DirectiveKind::BuiltIn => writeln!(out, ".built-in"),
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Ident {
        Ident::new(name, Span::point(1, 1))
    }

    #[test]
    fn test_define_flags() {
        let mut flags = DefineFlags::NONE;
        assert!(flags.is_empty());
        flags.insert(DefineFlags::IMMEDIATE);
        flags.insert(DefineFlags::HIDDEN);
        assert!(flags.contains(DefineFlags::HIDDEN));
        assert!(!flags.contains(DefineFlags::INLINE));
        assert_eq!(flags.header_bits(), 0x4000);
        assert_eq!(DefineFlags::INLINE.header_bits(), 0x8000);
        assert_eq!(flags.to_string(), "hidden immediate");
    }

    #[test]
    fn test_print_tree() {
        let span = Span::point(1, 1);
        let program = Program {
            statements: vec![
                Statement::Definition(Definition {
                    name: id("f"),
                    body: vec![Statement::If(IfStmt {
                        then_body: vec![Statement::Literal(Literal { value: 1, span })],
                        else_body: Some(vec![Statement::Literal(Literal { value: 2, span })]),
                        span,
                    })],
                    flags: DefineFlags::INLINE,
                    span,
                }),
                Statement::Directive(Directive {
                    kind: DirectiveKind::Pc(Operand::Symbol(id("start"))),
                    span,
                }),
            ],
            span,
        };
        let expected = "\
program
  definition f
    if
      literal 1
    else
      literal 2
  ; inline
  .pc start
";
        assert_eq!(program.print_tree(), expected);
    }
}
