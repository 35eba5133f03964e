//! Host hooks: where `rx?`, `tx!` and `(save)` go.

use crate::machine::Registers;
use h2_types::isa::Cell;
use h2_types::Image;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::path::PathBuf;

/// Escape ends an interactive session.
pub const ESCAPE: u8 = 27;

/// Result of asking the host for a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Byte(u8),
    /// Nothing available yet; the driver should re-enter later.
    WouldBlock,
    /// End of input or the quit key.
    Quit,
}

/// Verdict of the step callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Interpreter configuration that is not a hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmOptions {
    /// The terminal no longer echoes, so input bytes are echoed through
    /// the output hook.
    pub raw_terminal: bool,
}

/// The I/O collaborators of a running machine.
///
/// Any handles or callback parameters live in the implementing value.
pub trait Host {
    fn get(&mut self) -> io::Result<Input>;

    fn put(&mut self, byte: u8) -> io::Result<()>;

    /// Persist the whole core.
    fn save(&mut self, core: &[Cell]) -> io::Result<()>;

    /// Called before every instruction.
    fn step(&mut self, _registers: &Registers) -> Step {
        Step::Continue
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// In-memory host
// ══════════════════════════════════════════════════════════════════════════════

/// Scripted input, captured output and saves. Used by tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct BufferHost {
    input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub saves: Vec<Vec<Cell>>,
    /// Report `WouldBlock` rather than `Quit` once input runs dry.
    pub non_blocking: bool,
    /// Stop after this many instructions.
    pub step_limit: Option<u64>,
    pub steps: u64,
    pub trace: Option<Vec<Registers>>,
}

impl BufferHost {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn non_blocking(mut self) -> Self {
        self.non_blocking = true;
        self
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Record the registers before every instruction.
    pub fn traced(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn push_input(&mut self, bytes: impl AsRef<[u8]>) {
        self.input.extend(bytes.as_ref());
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Host for BufferHost {
    fn get(&mut self) -> io::Result<Input> {
        Ok(match self.input.pop_front() {
            Some(byte) => Input::Byte(byte),
            None if self.non_blocking => Input::WouldBlock,
            None => Input::Quit,
        })
    }

    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }

    fn save(&mut self, core: &[Cell]) -> io::Result<()> {
        self.saves.push(core.to_vec());
        Ok(())
    }

    fn step(&mut self, registers: &Registers) -> Step {
        if self.step_limit.is_some_and(|limit| self.steps >= limit) {
            return Step::Stop;
        }
        self.steps += 1;
        if let Some(trace) = &mut self.trace {
            trace.push(*registers);
        }
        Step::Continue
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Stream host
// ══════════════════════════════════════════════════════════════════════════════

/// Bytes from any reader, bytes to any writer, saves to a block file.
///
/// End of input and the escape key both quit. A reader in non-blocking
/// mode that has nothing to give yields back to the driver.
pub struct StdHost<R, W> {
    input: R,
    output: W,
    block: PathBuf,
}

impl<R: Read, W: Write> StdHost<R, W> {
    pub fn new(input: R, output: W, block: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output,
            block: block.into(),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: Read, W: Write> Host for StdHost<R, W> {
    fn get(&mut self) -> io::Result<Input> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(Input::Quit),
                Ok(_) if byte[0] == ESCAPE => return Ok(Input::Quit),
                Ok(_) => return Ok(Input::Byte(byte[0])),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Input::WouldBlock),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.output.write_all(&[byte])?;
        self.output.flush()
    }

    fn save(&mut self, core: &[Cell]) -> io::Result<()> {
        let image = Image::from_core(core.to_vec());
        let file = File::create(&self.block)?;
        image.write_to(file).map_err(|e| match e {
            h2_types::ImageError::Io(e) => e,
            other => io::Error::new(ErrorKind::InvalidData, other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_host_input() {
        let mut host = BufferHost::new("ab");
        assert_eq!(host.get().unwrap(), Input::Byte(b'a'));
        assert_eq!(host.get().unwrap(), Input::Byte(b'b'));
        assert_eq!(host.get().unwrap(), Input::Quit);

        let mut host = BufferHost::new("").non_blocking();
        assert_eq!(host.get().unwrap(), Input::WouldBlock);
        host.push_input("x");
        assert_eq!(host.get().unwrap(), Input::Byte(b'x'));
    }

    #[test]
    fn test_buffer_host_step_limit() {
        let mut host = BufferHost::new("").with_step_limit(2);
        let regs = Registers {
            pc: 8,
            tos: 0,
            sp: 0,
            rp: 0,
            instruction: 0,
        };
        assert_eq!(host.step(&regs), Step::Continue);
        assert_eq!(host.step(&regs), Step::Continue);
        assert_eq!(host.step(&regs), Step::Stop);
        assert_eq!(host.steps, 2);
    }

    #[test]
    fn test_std_host_quits_on_escape_and_eof() {
        let mut host = StdHost::new(&[b'h', ESCAPE][..], Vec::new(), "unused.blk");
        assert_eq!(host.get().unwrap(), Input::Byte(b'h'));
        assert_eq!(host.get().unwrap(), Input::Quit);
        assert_eq!(host.get().unwrap(), Input::Quit);
    }

    #[test]
    fn test_std_host_output() {
        let mut host = StdHost::new(io::empty(), Vec::new(), "unused.blk");
        host.put(b'o').unwrap();
        host.put(b'k').unwrap();
        let (_, out) = host.into_inner();
        assert_eq!(out, b"ok");
    }

    #[test]
    fn test_std_host_save_writes_block_file() {
        let path = std::env::temp_dir().join(format!("h2-save-{}.blk", std::process::id()));
        let mut host = StdHost::new(io::empty(), io::sink(), &path);
        host.save(&[0x1234, 0x0008]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bytes, [0x34, 0x12, 0x08, 0x00]);
    }
}
