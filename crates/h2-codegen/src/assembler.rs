//! Emission cursor, holes and fix-ups, and the peephole optimizer.

use crate::error::{AssemblyError, AssemblyResult};
use crate::symbols::SymbolTable;
use h2_types::isa::{
    self, Cell, CODE_EXIT, CODE_INVERT, CORE_SIZE, MAX_PROGRAM, OP_BRANCH, OP_LITERAL, R_TO_PC,
    START_ADDR,
};
use h2_types::{Image, LogLevel, Logger, Span};

const RSTACK_BITS: Cell = isa::mk_rstack(isa::Delta::Minus1);

/// Mode bits set with `.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct AssemblerMode(pub u16);

impl AssemblerMode {
    pub const NORMAL: Self = Self(0);
    /// Compile dictionary headers for words, variables and constants.
    pub const HEADER: Self = Self(1 << 0);
    /// Enable the exit-merge and tail-call rewrites.
    pub const OPTIMIZE: Self = Self(1 << 1);

    pub fn contains(self, other: AssemblerMode) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

/// State of one code-generation pass.
pub struct Assembler<'a> {
    core: Vec<Cell>,
    pc: u16,
    pub(crate) mode: AssemblerMode,
    /// Previous-word register: byte address of the newest dictionary header.
    pub(crate) pwd: u16,
    /// No rewrite may touch a cell at or below this address.
    fence: u16,
    pub(crate) in_definition: bool,
    pub(crate) built_ins_defined: bool,
    pub(crate) symbols: &'a mut SymbolTable,
    pub(crate) log: &'a mut Logger,
}

impl<'a> Assembler<'a> {
    /// A fresh core whose first cells branch to [`START_ADDR`].
    pub fn new(symbols: &'a mut SymbolTable, log: &'a mut Logger) -> Self {
        let mut core = vec![0; CORE_SIZE];
        for cell in &mut core[..START_ADDR as usize] {
            *cell = OP_BRANCH | START_ADDR;
        }
        Self {
            core,
            pc: START_ADDR,
            mode: AssemblerMode::NORMAL,
            pwd: 0,
            fence: START_ADDR,
            in_definition: false,
            built_ins_defined: false,
            symbols,
            log,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub(crate) fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
        self.update_fence(pc);
    }

    pub fn cell(&self, address: u16) -> Cell {
        self.core[index(address)]
    }

    /// Finish the pass, handing back the whole core.
    pub fn into_image(self) -> Image {
        Image::from_core(self.core)
    }

    pub(crate) fn check_overflow(&self, span: Span) -> AssemblyResult<()> {
        if self.pc > MAX_PROGRAM {
            return Err(AssemblyError::MemoryOverflow { pc: self.pc, span });
        }
        Ok(())
    }

    fn update_fence(&mut self, pc: u16) {
        self.fence = self.fence.max(pc);
    }

    // ── Cursor ──────────────────────────────────────────────────────────────

    /// The next free cell. Nothing before it may be optimized away since
    /// the caller is about to record it as a target.
    pub fn here(&mut self) -> u16 {
        self.update_fence(self.pc);
        self.pc
    }

    /// Reserve one cell for a later [`Assembler::fix`].
    pub fn hole(&mut self) -> u16 {
        let hole = self.here();
        self.pc = self.pc.wrapping_add(1);
        hole
    }

    pub fn fix(&mut self, hole: u16, patch: Cell) {
        self.core[index(hole)] = patch;
    }

    /// Append one instruction, possibly folding it into the previous one.
    pub fn generate(&mut self, instruction: Cell) {
        let pc = self.pc;
        self.log
            .log_with(LogLevel::Debug, || format!("{pc:x}:\t{instruction:x}"));

        if !isa::is_alu_op(instruction) {
            self.update_fence(pc);
        }

        if self.mode.contains(AssemblerMode::OPTIMIZE) && pc != 0 && instruction == CODE_EXIT {
            let last = pc - 1;
            let previous = self.cell(last);
            if last > self.fence && isa::is_alu_op(previous) {
                // Merge the exit into an ALU op that leaves the return stack alone.
                if previous & (R_TO_PC | RSTACK_BITS) == 0 {
                    let merged = previous | instruction;
                    self.log.log_with(LogLevel::Debug, || {
                        format!("optimization EXIT MERGE pc({pc:04x}) [{previous:04x} -> {merged:04x}]")
                    });
                    self.fix(last, merged);
                    self.update_fence(last);
                    return;
                }
            } else if pc > self.fence && isa::is_call(previous) {
                // A call followed by exit becomes a jump.
                let jump = OP_BRANCH | (previous & isa::ADDRESS_MASK);
                self.log.log_with(LogLevel::Debug, || {
                    format!("optimization TAIL CALL pc({pc:04x}) [{previous:04x} -> {jump:04x}]")
                });
                self.fix(last, jump);
                self.update_fence(last);
                return;
            }
        }

        self.fix(pc, instruction);
        self.pc = pc.wrapping_add(1);
    }

    /// Push any 16-bit value, complementing values that collide with the
    /// literal bit.
    pub fn generate_literal(&mut self, value: u16) {
        if value & OP_LITERAL != 0 {
            self.generate(OP_LITERAL | !value);
            self.generate(CODE_INVERT);
        } else {
            self.generate(OP_LITERAL | value);
        }
    }

    /// Store a counted string: the first cell holds the length and the first
    /// byte, then two bytes per cell, low byte first. Returns the start cell.
    pub fn pack_string(&mut self, s: &str, span: Span) -> AssemblyResult<u16> {
        let bytes = s.as_bytes();
        if bytes.len() > 255 {
            return Err(AssemblyError::StringTooLong {
                len: bytes.len(),
                span,
            });
        }
        let start = self.pc;
        let mut packed = Vec::with_capacity(bytes.len() + 2);
        packed.push(bytes.len() as u8);
        packed.extend_from_slice(bytes);
        if packed.len() % 2 != 0 {
            packed.push(0);
        }
        for pair in packed.chunks_exact(2) {
            let hole = self.hole();
            self.fix(hole, Cell::from_le_bytes([pair[0], pair[1]]));
        }
        self.here();
        Ok(start)
    }
}

fn index(address: u16) -> usize {
    address as usize & (CORE_SIZE - 1)
}
