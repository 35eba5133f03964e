//! Runtime error types for the H2 simulator.

use std::io;
use thiserror::Error;

/// Host failures surfaced by the interpreter loop.
///
/// The instruction set itself cannot fault: stack over- and underflow wrap,
/// unassigned ALU opcodes act as `T`. Only the I/O hooks can fail.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("input failed: {0}")]
    Input(#[source] io::Error),

    #[error("output failed: {0}")]
    Output(#[source] io::Error),

    #[error("image save failed: {0}")]
    Save(#[source] io::Error),
}

/// Result alias for interpreter operations.
pub type VmResult<T> = Result<T, VmError>;
