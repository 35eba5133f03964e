//! H2 CPU simulator.
//!
//! A [`Machine`] owns one core of 16-bit cells holding code, data and both
//! stacks. [`Machine::run`] fetches and executes until `(bye)`, or until the
//! [`Host`] says input would block, input is over, or the step callback
//! wants to stop. Stack pointers wrap exactly as the hardware's do; nothing
//! is bounds-checked.

pub mod error;
pub mod host;
pub mod interp;
pub mod machine;

pub use error::{VmError, VmResult};
pub use host::{BufferHost, Host, Input, StdHost, Step, VmOptions, ESCAPE};
pub use interp::{run, Exit};
pub use machine::{Machine, Registers};
