//! The built-in word table emitted by `.built-in`.

use h2_types::isa::{Cell, Instruction, CODE_FROMR, CODE_LOAD, CODE_TOR, CODE_T_N1};

/// Name of the hidden helper pushing the address of a variable's cell.
pub const DO_VAR: &str = "doVar";
/// Name of the hidden helper pushing the value stored after the call.
pub const DO_CONST: &str = "doConst";
/// Name of the hidden helper decrementing the loop counter under the
/// caller's return address.
pub const R_MINUS_ONE: &str = "r1-";
/// Optional user-defined word that runs the `next` half of a counted loop.
pub const DO_NEXT: &str = "doNext";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltInWord {
    pub name: &'static str,
    /// Body, emitted before the trailing `exit`.
    pub code: Vec<Cell>,
    /// Sets the inline bit in the header.
    pub inline: bool,
    /// Symbol only, no dictionary header.
    pub hidden: bool,
    /// Whether the word is emitted at all.
    pub compile: bool,
}

/// Every built-in word, in emission order: one per mnemonic, then the
/// helpers used by variables, constants and counted loops.
pub fn built_in_words() -> Vec<BuiltInWord> {
    let primitives = Instruction::ALL.iter().map(|&i| BuiltInWord {
        name: i.mnemonic(),
        code: vec![i.encoding()],
        inline: true,
        hidden: false,
        compile: i.callable(),
    });
    let helper = |name, code: &[Cell]| BuiltInWord {
        name,
        code: code.to_vec(),
        inline: false,
        hidden: true,
        compile: true,
    };
    primitives
        .chain([
            helper(DO_VAR, &[CODE_FROMR]),
            helper(DO_CONST, &[CODE_FROMR, CODE_LOAD]),
            helper(R_MINUS_ONE, &[CODE_FROMR, CODE_FROMR, CODE_T_N1, CODE_TOR, CODE_TOR]),
        ])
        .collect()
}
