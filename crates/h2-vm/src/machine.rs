//! Machine state: the core, the stack pointers and the program counter.

use h2_types::isa::{
    Cell, CORE_SIZE, OP_BRANCH, RETURN_STACK_START, STACK_SIZE, START_ADDR, VARIABLE_STACK_START,
};
use h2_types::Image;

/// A snapshot of the registers, handed to [`crate::Host::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub pc: u16,
    pub tos: Cell,
    pub sp: u16,
    pub rp: u16,
    /// The instruction about to execute.
    pub instruction: Cell,
}

/// One H2 CPU. Code, data and both stacks share the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    core: Vec<Cell>,
    pub(crate) tos: Cell,
    pub(crate) sp: u16,
    pub(crate) rp: u16,
    pub(crate) pc: u16,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// A reset machine: empty stacks, PC at the start address and the boot
    /// cells below it branching there.
    pub fn new() -> Self {
        let mut core = vec![0; CORE_SIZE];
        for cell in &mut core[..START_ADDR as usize] {
            *cell = OP_BRANCH | START_ADDR;
        }
        Self {
            core,
            tos: 0,
            sp: VARIABLE_STACK_START,
            rp: RETURN_STACK_START,
            pc: START_ADDR,
        }
    }

    pub fn from_image(image: &Image) -> Self {
        let mut machine = Self::new();
        machine.load(image);
        machine
    }

    /// Copy an image over the start of the core. Cells past its end keep
    /// their contents.
    pub fn load(&mut self, image: &Image) {
        let cells = image.cells();
        self.core[..cells.len()].copy_from_slice(cells);
    }

    /// The whole core, as the `(save)` instruction persists it.
    pub fn image(&self) -> Image {
        Image::from_core(self.core.clone())
    }

    pub fn core(&self) -> &[Cell] {
        &self.core
    }

    pub fn read(&self, address: u16) -> Cell {
        self.core[index(address)]
    }

    pub fn write(&mut self, address: u16, value: Cell) {
        self.core[index(address)] = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn tos(&self) -> Cell {
        self.tos
    }

    pub fn registers(&self) -> Registers {
        Registers {
            pc: self.pc,
            tos: self.tos,
            sp: self.sp,
            rp: self.rp,
            instruction: self.read(self.pc),
        }
    }

    /// Data stack depth as `sp@` reports it.
    pub fn depth(&self) -> u16 {
        self.sp.wrapping_sub(VARIABLE_STACK_START)
    }

    /// Return stack depth as `rp@` reports it.
    pub fn return_depth(&self) -> u16 {
        self.rp.wrapping_sub(RETURN_STACK_START)
    }

    /// The data stack, bottom first, top of stack last. Empty if the stack
    /// has underflowed.
    pub fn data_stack(&self) -> Vec<Cell> {
        let depth = self.depth() as usize;
        if depth == 0 || depth > STACK_SIZE as usize {
            return Vec::new();
        }
        let mut stack: Vec<Cell> = (2..=depth)
            .map(|i| self.read(VARIABLE_STACK_START + i as u16))
            .collect();
        stack.push(self.tos);
        stack
    }

    /// The return stack, bottom first.
    pub fn return_stack(&self) -> Vec<Cell> {
        let depth = self.return_depth() as usize;
        if depth > STACK_SIZE as usize {
            return Vec::new();
        }
        (1..=depth)
            .map(|i| self.read(RETURN_STACK_START + i as u16))
            .collect()
    }

    // ── Stack primitives ────────────────────────────────────────────────────

    pub(crate) fn dpush(&mut self, value: Cell) {
        self.sp = self.sp.wrapping_add(1);
        self.write(self.sp, self.tos);
        self.tos = value;
    }

    pub(crate) fn dpop(&mut self) -> Cell {
        let value = self.tos;
        self.tos = self.read(self.sp);
        self.sp = self.sp.wrapping_sub(1);
        value
    }

    pub(crate) fn rpush(&mut self, value: Cell) {
        self.rp = self.rp.wrapping_add(1);
        self.write(self.rp, value);
    }
}

fn index(address: u16) -> usize {
    address as usize & (CORE_SIZE - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let m = Machine::new();
        assert_eq!(m.pc(), START_ADDR);
        assert_eq!(m.depth(), 0);
        assert_eq!(m.return_depth(), 0);
        assert!(m.data_stack().is_empty());
        assert_eq!(m.read(0), OP_BRANCH | START_ADDR);
    }

    #[test]
    fn test_push_and_pop() {
        let mut m = Machine::new();
        m.dpush(5);
        m.dpush(6);
        assert_eq!(m.data_stack(), [5, 6]);
        assert_eq!(m.dpop(), 6);
        assert_eq!(m.data_stack(), [5]);
        assert_eq!(m.dpop(), 5);
        assert_eq!(m.depth(), 0);
    }

    #[test]
    fn test_underflow_wraps() {
        let mut m = Machine::new();
        m.dpop();
        assert_eq!(m.depth(), 0xFFFF);
        assert!(m.data_stack().is_empty());
    }

    #[test]
    fn test_load_keeps_the_tail() {
        let mut m = Machine::new();
        m.write(100, 7);
        m.load(&Image::new(vec![1, 2, 3]).unwrap());
        assert_eq!(&m.core()[..3], &[1, 2, 3]);
        assert_eq!(m.read(100), 7);
    }

    #[test]
    fn test_addresses_wrap_into_the_core() {
        let mut m = Machine::new();
        m.write(0x8003, 9);
        assert_eq!(m.read(3), 9);
    }
}
