//! Instruction set and bit-level encoding of the H2 stack processor.
//!
//! Every instruction is one 16-bit cell. The top bits select one of four
//! classes, tested in priority order:
//!
//! ```text
//! 1xxx xxxx xxxx xxxx   literal     push the low 15 bits
//! 000a aaaa aaaa aaaa   branch      pc = a
//! 001a aaaa aaaa aaaa   0branch     pc = a if pop() == 0
//! 010a aaaa aaaa aaaa   call        rpush(pc + 1); pc = a
//! 011o oooo NRAP rrdd   ALU         opcode o, flags T→N, T→R, N→[T], R→PC,
//!                                   return/data stack deltas r/d
//! ```
//!
//! The code generator and the interpreter both build on this module so the
//! two always agree on what a cell means.

/// A single memory cell.
pub type Cell = u16;

/// Number of cells in the core (a 64 KiB byte address space).
pub const CORE_SIZE: usize = 0x8000;

/// Jump targets are 13 bits wide, so code lives in the first 8 KiB cells.
pub const MAX_PROGRAM: u16 = 0x2000;

/// Program counter of a freshly created machine; the cells below it hold
/// `branch START_ADDR`.
pub const START_ADDR: u16 = 8;

/// Cells reserved for each of the two stacks.
pub const STACK_SIZE: u16 = 0x400;

/// First cell of the data stack region.
pub const VARIABLE_STACK_START: u16 = (CORE_SIZE as u16) - 2 * STACK_SIZE;

/// First cell of the return stack region.
pub const RETURN_STACK_START: u16 = (CORE_SIZE as u16) - STACK_SIZE;

// ── Instruction classes ──────────────────────────────────────────────────────

pub const OP_BRANCH: Cell = 0x0000;
pub const OP_0BRANCH: Cell = 0x2000;
pub const OP_CALL: Cell = 0x4000;
pub const OP_ALU_OP: Cell = 0x6000;
pub const OP_LITERAL: Cell = 0x8000;

const CLASS_MASK: Cell = 0xE000;

/// Payload of a literal instruction.
pub const LITERAL_MASK: Cell = 0x7FFF;

/// Target field of branch, 0branch and call instructions.
pub const ADDRESS_MASK: Cell = 0x1FFF;

// ── ALU fields ───────────────────────────────────────────────────────────────

const ALU_OP_START: u16 = 8;
const ALU_OP_MASK: Cell = 0x1F;
const DSTACK_START: u16 = 0;
const RSTACK_START: u16 = 2;
const DELTA_MASK: Cell = 0x3;

/// Copy the old top of stack into the new second-on-stack slot.
pub const T_TO_N: Cell = 1 << 7;
/// Copy the old top of stack onto the return stack.
pub const T_TO_R: Cell = 1 << 6;
/// Store second-on-stack to the cell addressed by top of stack.
pub const N_TO_ADDR_T: Cell = 1 << 5;
/// Load the program counter from the return stack.
pub const R_TO_PC: Cell = 1 << 4;

/// Stack pointer adjustment encoded in two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Delta {
    Zero = 0,
    Plus1 = 1,
    Minus2 = 2,
    Minus1 = 3,
}

impl Delta {
    /// The delta as a wrapping 16-bit increment.
    pub fn increment(bits: Cell) -> u16 {
        const TABLE: [u16; 4] = [0x0000, 0x0001, 0xFFFE, 0xFFFF];
        TABLE[(bits & DELTA_MASK) as usize]
    }
}

pub const fn mk_dstack(delta: Delta) -> Cell {
    (delta as Cell) << DSTACK_START
}

pub const fn mk_rstack(delta: Delta) -> Cell {
    (delta as Cell) << RSTACK_START
}

pub const fn mk_code(op: AluOp) -> Cell {
    (op as Cell) << ALU_OP_START
}

/// Data stack delta bits of an ALU instruction.
pub fn dstack(instruction: Cell) -> Cell {
    (instruction >> DSTACK_START) & DELTA_MASK
}

/// Return stack delta bits of an ALU instruction.
pub fn rstack(instruction: Cell) -> Cell {
    (instruction >> RSTACK_START) & DELTA_MASK
}

pub fn is_literal(instruction: Cell) -> bool {
    instruction & OP_LITERAL == OP_LITERAL
}

pub fn is_alu_op(instruction: Cell) -> bool {
    instruction & CLASS_MASK == OP_ALU_OP
}

pub fn is_call(instruction: Cell) -> bool {
    instruction & CLASS_MASK == OP_CALL
}

pub fn is_0branch(instruction: Cell) -> bool {
    instruction & CLASS_MASK == OP_0BRANCH
}

pub fn is_branch(instruction: Cell) -> bool {
    instruction & CLASS_MASK == OP_BRANCH
}

/// The function performed by an ALU instruction.
///
/// Opcodes 22..=31 are unassigned and decode as `None`; the interpreter
/// treats them as `T` (leave the top of stack alone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AluOp {
    T = 0,
    N,
    TPlusN,
    TAndN,
    TOrN,
    TXorN,
    TInvert,
    TEqualN,
    NLessT,
    NRshiftT,
    TDecrement,
    R,
    TLoad,
    NLshiftT,
    Depth,
    NUlessT,
    RDepth,
    TEqual0,
    Tx,
    Rx,
    Save,
    Bye,
}

impl AluOp {
    const TABLE: [AluOp; 22] = [
        AluOp::T,
        AluOp::N,
        AluOp::TPlusN,
        AluOp::TAndN,
        AluOp::TOrN,
        AluOp::TXorN,
        AluOp::TInvert,
        AluOp::TEqualN,
        AluOp::NLessT,
        AluOp::NRshiftT,
        AluOp::TDecrement,
        AluOp::R,
        AluOp::TLoad,
        AluOp::NLshiftT,
        AluOp::Depth,
        AluOp::NUlessT,
        AluOp::RDepth,
        AluOp::TEqual0,
        AluOp::Tx,
        AluOp::Rx,
        AluOp::Save,
        AluOp::Bye,
    ];

    /// Decode the opcode field of an ALU instruction.
    pub fn decode(instruction: Cell) -> Option<AluOp> {
        let code = (instruction >> ALU_OP_START) & ALU_OP_MASK;
        Self::TABLE.get(code as usize).copied()
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Literal(Cell),
    Alu(Cell),
    Call(Cell),
    ZeroBranch(Cell),
    Branch(Cell),
}

/// Classify an instruction, literal first, then ALU, call, 0branch, branch.
pub fn decode(instruction: Cell) -> Decoded {
    if is_literal(instruction) {
        Decoded::Literal(instruction & LITERAL_MASK)
    } else if is_alu_op(instruction) {
        Decoded::Alu(instruction)
    } else if is_call(instruction) {
        Decoded::Call(instruction & ADDRESS_MASK)
    } else if is_0branch(instruction) {
        Decoded::ZeroBranch(instruction & ADDRESS_MASK)
    } else {
        Decoded::Branch(instruction & ADDRESS_MASK)
    }
}

// ── Mnemonics ────────────────────────────────────────────────────────────────

/// The named ALU instructions available as assembler mnemonics.
///
/// Declaration order is the order of the built-in word table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Dup,
    Over,
    Invert,
    Add,
    Swap,
    Nip,
    Drop,
    Exit,
    ToR,
    FromR,
    RAt,
    Load,
    Store,
    RShift,
    LShift,
    Equal,
    ULess,
    Less,
    And,
    Xor,
    Or,
    Depth,
    RDepth,
    ZeroEqual,
    Decrement,
    Rx,
    Tx,
    Save,
    Bye,
    RDrop,
}

use AluOp as A;
use Delta::{Minus1, Minus2, Plus1};

pub const CODE_DUP: Cell = OP_ALU_OP | mk_code(A::T) | T_TO_N | mk_dstack(Plus1);
pub const CODE_OVER: Cell = OP_ALU_OP | mk_code(A::N) | T_TO_N | mk_dstack(Plus1);
pub const CODE_INVERT: Cell = OP_ALU_OP | mk_code(A::TInvert);
pub const CODE_ADD: Cell = OP_ALU_OP | mk_code(A::TPlusN) | mk_dstack(Minus1);
pub const CODE_SWAP: Cell = OP_ALU_OP | mk_code(A::N) | T_TO_N;
pub const CODE_NIP: Cell = OP_ALU_OP | mk_code(A::T) | mk_dstack(Minus1);
pub const CODE_DROP: Cell = OP_ALU_OP | mk_code(A::N) | mk_dstack(Minus1);
pub const CODE_EXIT: Cell = OP_ALU_OP | mk_code(A::T) | R_TO_PC | mk_rstack(Minus1);
pub const CODE_TOR: Cell =
    OP_ALU_OP | mk_code(A::N) | T_TO_R | mk_dstack(Minus1) | mk_rstack(Plus1);
pub const CODE_FROMR: Cell =
    OP_ALU_OP | mk_code(A::R) | T_TO_N | mk_dstack(Plus1) | mk_rstack(Minus1);
pub const CODE_RAT: Cell = OP_ALU_OP | mk_code(A::R) | T_TO_N | mk_dstack(Plus1);
pub const CODE_LOAD: Cell = OP_ALU_OP | mk_code(A::TLoad);
pub const CODE_STORE: Cell = OP_ALU_OP | mk_code(A::N) | N_TO_ADDR_T | mk_dstack(Minus1);
pub const CODE_RSHIFT: Cell = OP_ALU_OP | mk_code(A::NRshiftT) | mk_dstack(Minus1);
pub const CODE_LSHIFT: Cell = OP_ALU_OP | mk_code(A::NLshiftT) | mk_dstack(Minus1);
pub const CODE_EQUAL: Cell = OP_ALU_OP | mk_code(A::TEqualN) | mk_dstack(Minus1);
pub const CODE_ULESS: Cell = OP_ALU_OP | mk_code(A::NUlessT) | mk_dstack(Minus1);
pub const CODE_LESS: Cell = OP_ALU_OP | mk_code(A::NLessT) | mk_dstack(Minus1);
pub const CODE_AND: Cell = OP_ALU_OP | mk_code(A::TAndN) | mk_dstack(Minus1);
pub const CODE_XOR: Cell = OP_ALU_OP | mk_code(A::TXorN) | mk_dstack(Minus1);
pub const CODE_OR: Cell = OP_ALU_OP | mk_code(A::TOrN) | mk_dstack(Minus1);
pub const CODE_DEPTH: Cell = OP_ALU_OP | mk_code(A::Depth) | T_TO_N | mk_dstack(Plus1);
pub const CODE_RDEPTH: Cell = OP_ALU_OP | mk_code(A::RDepth) | T_TO_N | mk_dstack(Plus1);
pub const CODE_TE0: Cell = OP_ALU_OP | mk_code(A::TEqual0);
pub const CODE_T_N1: Cell = OP_ALU_OP | mk_code(A::TDecrement);
pub const CODE_RX: Cell = OP_ALU_OP | mk_code(A::Rx) | T_TO_N | mk_dstack(Plus1);
pub const CODE_TX: Cell = OP_ALU_OP | mk_code(A::Tx) | mk_dstack(Minus1);
pub const CODE_SAVE: Cell = OP_ALU_OP | mk_code(A::Save);
pub const CODE_BYE: Cell = OP_ALU_OP | mk_code(A::Bye);
pub const CODE_RDROP: Cell = OP_ALU_OP | mk_code(A::T) | mk_rstack(Minus1);

impl Instruction {
    pub const ALL: [Instruction; 30] = [
        Instruction::Dup,
        Instruction::Over,
        Instruction::Invert,
        Instruction::Add,
        Instruction::Swap,
        Instruction::Nip,
        Instruction::Drop,
        Instruction::Exit,
        Instruction::ToR,
        Instruction::FromR,
        Instruction::RAt,
        Instruction::Load,
        Instruction::Store,
        Instruction::RShift,
        Instruction::LShift,
        Instruction::Equal,
        Instruction::ULess,
        Instruction::Less,
        Instruction::And,
        Instruction::Xor,
        Instruction::Or,
        Instruction::Depth,
        Instruction::RDepth,
        Instruction::ZeroEqual,
        Instruction::Decrement,
        Instruction::Rx,
        Instruction::Tx,
        Instruction::Save,
        Instruction::Bye,
        Instruction::RDrop,
    ];

    /// Source text of the mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Dup => "dup",
            Instruction::Over => "over",
            Instruction::Invert => "invert",
            Instruction::Add => "+",
            Instruction::Swap => "swap",
            Instruction::Nip => "nip",
            Instruction::Drop => "drop",
            Instruction::Exit => "exit",
            Instruction::ToR => ">r",
            Instruction::FromR => "r>",
            Instruction::RAt => "r@",
            Instruction::Load => "@",
            Instruction::Store => "store",
            Instruction::RShift => "rshift",
            Instruction::LShift => "lshift",
            Instruction::Equal => "=",
            Instruction::ULess => "u<",
            Instruction::Less => "<",
            Instruction::And => "and",
            Instruction::Xor => "xor",
            Instruction::Or => "or",
            Instruction::Depth => "sp@",
            Instruction::RDepth => "rp@",
            Instruction::ZeroEqual => "0=",
            Instruction::Decrement => "1-",
            Instruction::Rx => "rx?",
            Instruction::Tx => "tx!",
            Instruction::Save => "(save)",
            Instruction::Bye => "(bye)",
            Instruction::RDrop => "rdrop",
        }
    }

    /// Look up a mnemonic by its exact source text.
    pub fn from_mnemonic(text: &str) -> Option<Instruction> {
        Self::ALL.iter().copied().find(|i| i.mnemonic() == text)
    }

    /// The machine code cell for this mnemonic.
    pub const fn encoding(self) -> Cell {
        match self {
            Instruction::Dup => CODE_DUP,
            Instruction::Over => CODE_OVER,
            Instruction::Invert => CODE_INVERT,
            Instruction::Add => CODE_ADD,
            Instruction::Swap => CODE_SWAP,
            Instruction::Nip => CODE_NIP,
            Instruction::Drop => CODE_DROP,
            Instruction::Exit => CODE_EXIT,
            Instruction::ToR => CODE_TOR,
            Instruction::FromR => CODE_FROMR,
            Instruction::RAt => CODE_RAT,
            Instruction::Load => CODE_LOAD,
            Instruction::Store => CODE_STORE,
            Instruction::RShift => CODE_RSHIFT,
            Instruction::LShift => CODE_LSHIFT,
            Instruction::Equal => CODE_EQUAL,
            Instruction::ULess => CODE_ULESS,
            Instruction::Less => CODE_LESS,
            Instruction::And => CODE_AND,
            Instruction::Xor => CODE_XOR,
            Instruction::Or => CODE_OR,
            Instruction::Depth => CODE_DEPTH,
            Instruction::RDepth => CODE_RDEPTH,
            Instruction::ZeroEqual => CODE_TE0,
            Instruction::Decrement => CODE_T_N1,
            Instruction::Rx => CODE_RX,
            Instruction::Tx => CODE_TX,
            Instruction::Save => CODE_SAVE,
            Instruction::Bye => CODE_BYE,
            Instruction::RDrop => CODE_RDROP,
        }
    }

    /// Whether `.built-in` compiles this instruction as a callable word.
    ///
    /// Words that manipulate the return stack cannot work behind a call,
    /// the call itself would be what they operate on.
    pub const fn callable(self) -> bool {
        !matches!(
            self,
            Instruction::Exit
                | Instruction::ToR
                | Instruction::FromR
                | Instruction::RAt
                | Instruction::RDrop
        )
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
