//! The interpreter loop.

use crate::error::{VmError, VmResult};
use crate::host::{Host, Input, Step, VmOptions};
use crate::machine::Machine;
use h2_types::isa::{
    self, AluOp, Cell, Decoded, Delta, MAX_PROGRAM, N_TO_ADDR_T, R_TO_PC, T_TO_N, T_TO_R,
};

/// Why the interpreter returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `(bye)` executed with this top of stack.
    Halt(i16),
    /// Input would block or the step callback stopped the loop. The
    /// machine resumes where it left off when run again.
    Yield,
    /// The input hook reported end of input or the quit key.
    Quit,
}

impl Exit {
    /// A process exit status. `Halt` passes the image's status through
    /// unchanged; by the default image's convention zero is a clean exit
    /// and negative an error. `Yield` maps to 1 and `Quit` to 0. A halted
    /// machine stays on `(bye)`, so the status is final.
    pub fn code(self) -> i32 {
        match self {
            Exit::Halt(status) => status as i32,
            Exit::Yield => 1,
            Exit::Quit => 0,
        }
    }
}

fn flag(condition: bool) -> Cell {
    if condition {
        0xFFFF
    } else {
        0
    }
}

impl Machine {
    /// Run until `(bye)`, a yield or a quit.
    pub fn run(&mut self, host: &mut impl Host, options: &VmOptions) -> VmResult<Exit> {
        loop {
            if host.step(&self.registers()) == Step::Stop {
                return Ok(Exit::Yield);
            }
            if let Some(exit) = self.execute(host, options)? {
                return Ok(exit);
            }
        }
    }

    /// Execute the instruction at the program counter.
    ///
    /// Returns the exit reason if this instruction ends the loop. An `rx?`
    /// that would block changes nothing, so executing it again retries.
    pub fn execute(&mut self, host: &mut impl Host, options: &VmOptions) -> VmResult<Option<Exit>> {
        let instruction = self.read(self.pc);
        let pc_plus_one = (self.pc + 1) % MAX_PROGRAM;

        match isa::decode(instruction) {
            Decoded::Literal(value) => {
                self.dpush(value);
                self.pc = pc_plus_one;
            }
            Decoded::Alu(instruction) => return self.alu(instruction, pc_plus_one, host, options),
            Decoded::Call(address) => {
                self.rpush(pc_plus_one << 1);
                self.pc = address;
            }
            Decoded::ZeroBranch(address) => {
                self.pc = if self.dpop() == 0 {
                    address % MAX_PROGRAM
                } else {
                    pc_plus_one
                };
            }
            Decoded::Branch(address) => self.pc = address,
        }
        Ok(None)
    }

    fn alu(
        &mut self,
        instruction: Cell,
        pc_plus_one: u16,
        host: &mut impl Host,
        options: &VmOptions,
    ) -> VmResult<Option<Exit>> {
        let rd = Delta::increment(isa::rstack(instruction));
        let dd = Delta::increment(isa::dstack(instruction));
        let nos = self.read(self.sp);
        let mut tos = self.tos;
        let npc = if instruction & R_TO_PC != 0 {
            self.read(self.rp) >> 1
        } else {
            pc_plus_one
        };

        match AluOp::decode(instruction) {
            None | Some(AluOp::T) => {}
            Some(AluOp::N) => tos = nos,
            Some(AluOp::TPlusN) => tos = tos.wrapping_add(nos),
            Some(AluOp::TAndN) => tos &= nos,
            Some(AluOp::TOrN) => tos |= nos,
            Some(AluOp::TXorN) => tos ^= nos,
            Some(AluOp::TInvert) => tos = !tos,
            Some(AluOp::TEqualN) => tos = flag(tos == nos),
            Some(AluOp::NLessT) => tos = flag((nos as i16) < (tos as i16)),
            Some(AluOp::NRshiftT) => tos = nos.checked_shr(tos as u32).unwrap_or(0),
            Some(AluOp::TDecrement) => tos = tos.wrapping_sub(1),
            Some(AluOp::R) => tos = self.read(self.rp),
            Some(AluOp::TLoad) => tos = self.read(self.tos >> 1),
            Some(AluOp::NLshiftT) => tos = nos.checked_shl(tos as u32).unwrap_or(0),
            Some(AluOp::Depth) => tos = self.depth(),
            Some(AluOp::NUlessT) => tos = flag(nos < tos),
            Some(AluOp::RDepth) => tos = self.return_depth(),
            Some(AluOp::TEqual0) => tos = flag(tos == 0),
            Some(AluOp::Tx) => {
                host.put(tos as u8).map_err(VmError::Output)?;
                tos = nos;
            }
            Some(AluOp::Rx) => match host.get().map_err(VmError::Input)? {
                Input::Byte(byte) => {
                    if options.raw_terminal {
                        host.put(byte).map_err(VmError::Output)?;
                    }
                    tos = byte as Cell;
                }
                Input::WouldBlock => return Ok(Some(Exit::Yield)),
                Input::Quit => return Ok(Some(Exit::Quit)),
            },
            Some(AluOp::Save) => host.save(self.core()).map_err(VmError::Save)?,
            Some(AluOp::Bye) => return Ok(Some(Exit::Halt(tos as i16))),
        }

        self.sp = self.sp.wrapping_add(dd);
        self.rp = self.rp.wrapping_add(rd);

        if instruction & T_TO_R != 0 {
            self.write(self.rp, self.tos);
        }
        if instruction & T_TO_N != 0 {
            self.write(self.sp, self.tos);
        }
        if instruction & N_TO_ADDR_T != 0 {
            self.write(self.tos >> 1, nos);
        }

        self.tos = tos;
        self.pc = npc;
        Ok(None)
    }
}

/// Run a machine against a host. See [`Machine::run`].
pub fn run(machine: &mut Machine, host: &mut impl Host, options: &VmOptions) -> VmResult<Exit> {
    machine.run(host, options)
}
