//! H2 code generator: lowers a parsed [`h2_types::ast::Program`] into a
//! memory image for the H2 CPU.
//!
//! # Layout
//!
//! Cells `0..8` branch to the start address `8`, where code generation
//! begins. The program counter only moves forward except through `.pc`
//! and `.allocate`.
//!
//! ## Dictionary headers
//!
//! With header mode on (`.mode 1`), every visible word, constant and
//! variable is preceded by a link cell and a counted name. The link holds
//! the byte address of the previous header with the immediate and inline
//! bits in the top three bits; `pwd` tracks the newest header.
//!
//! ## Optimizer
//!
//! With optimize mode on (`.mode 2`), an `exit` folds into a preceding ALU
//! op and a call followed by `exit` becomes a branch. A fence keeps both
//! rewrites away from cells that may be jump targets.

pub mod assembler;
pub mod builtins;
pub mod emit;
pub mod error;
pub mod symbols;

pub use assembler::{Assembler, AssemblerMode};
pub use error::{AssemblyError, AssemblyResult};
pub use symbols::{Symbol, SymbolKind, SymbolTable};

use h2_types::ast::Program;
use h2_types::{Image, LogLevel, Logger};

/// The output of one assembly pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    /// The whole core, as the machine would see it after loading.
    pub image: Image,
    /// First cell past the generated code.
    pub pc: u16,
}

impl Assembled {
    /// The cells below the final program counter, as saved to disk.
    pub fn program(&self) -> Image {
        self.image.prefix(self.pc as usize)
    }
}

/// Assemble a program. Symbols are added to `symbols`, which may already
/// hold definitions from an earlier unit.
pub fn assemble(
    program: &Program,
    symbols: &mut SymbolTable,
    log: &mut Logger,
) -> AssemblyResult<Assembled> {
    let mut asm = Assembler::new(symbols, log);
    asm.emit_block(&program.statements)?;
    asm.check_overflow(program.span)?;

    let pc = asm.pc();
    asm.log.log_with(LogLevel::Info, || format!("assembled {pc} cells"));
    if asm.log.enabled(LogLevel::Debug) {
        let mut table = Vec::new();
        if asm.symbols.print(&mut table).is_ok() {
            let table = String::from_utf8_lossy(&table).into_owned();
            asm.log.debug(table.trim_end().to_string());
        }
    }

    let image = asm.into_image();
    Ok(Assembled { image, pc })
}
