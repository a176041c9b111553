//! Step-by-step simulator for a small RISC-V subset: `add`, `sub`, `and`,
//! `or`, `addi`, `lw`, `sw`, `beq` and `bne`, read as 32-character binary
//! lines.

pub mod asm;
pub mod control;
pub mod decoder;
pub mod error;
pub mod execute;
pub mod helpers;
pub mod immediate;
pub mod instruction;
pub mod machine;
pub mod program;
pub mod simulator;

pub use control::{ControlLine, ControlSignals};
pub use decoder::decode;
pub use error::{AsmError, DecodeError, Error, ExecError, Result};
pub use execute::execute;
pub use instruction::{Fields, Format, Instruction, Mnemonic};
pub use machine::Machine;
pub use simulator::{SimConfig, SimState, Simulator};
