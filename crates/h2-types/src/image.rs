//! Binary image format: a flat run of little-endian 16-bit cells.

use crate::isa::{Cell, CORE_SIZE};
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image has {0} cells, the core holds 32768")]
    TooLarge(usize),
    #[error("image ends in the middle of a cell ({0} bytes)")]
    OddLength(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The memory contents produced by the assembler or saved by a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    cells: Vec<Cell>,
}

impl Image {
    pub fn new(cells: Vec<Cell>) -> Result<Self, ImageError> {
        if cells.len() > CORE_SIZE {
            return Err(ImageError::TooLarge(cells.len()));
        }
        Ok(Self { cells })
    }

    /// Build an image from a machine core, dropping anything past
    /// [`CORE_SIZE`] cells.
    pub fn from_core(mut core: Vec<Cell>) -> Self {
        core.truncate(CORE_SIZE);
        Self { cells: core }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The first `len` cells, e.g. everything up to the final program counter.
    pub fn prefix(&self, len: usize) -> Image {
        Image {
            cells: self.cells[..len.min(self.cells.len())].to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|c| c.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() % 2 != 0 {
            return Err(ImageError::OddLength(bytes.len()));
        }
        let cells = bytes
            .chunks_exact(2)
            .map(|pair| Cell::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(cells)
    }

    pub fn write_to(&self, mut out: impl Write) -> Result<(), ImageError> {
        out.write_all(&self.to_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Read cells until end of input.
    pub fn read_from(mut input: impl Read) -> Result<Self, ImageError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}
