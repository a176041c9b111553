use std::io;

use thiserror::Error;

use crate::instruction::Format;

/// Failures turning one encoded line into an `Instruction`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed encoding {0:?}: expected exactly 32 binary digits")]
    MalformedEncoding(String),

    #[error("unsupported opcode {0:#09b}")]
    UnsupportedOpcode(u32),

    #[error("unsupported {format}-type function: funct3={funct3:03b}, funct7={funct7:?}")]
    UnsupportedFunct {
        format: Format,
        funct3: u32,
        funct7: Option<u32>,
    },
}

/// What an out-of-bounds access was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Register(i64),
    Memory(i64),
}

/// Failures applying one instruction to the machine state. No state is
/// committed when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("access out of bounds: {0:?}")]
    OutOfBounds(Location),

    #[error("branch from pc {pc} by {offset} leaves the address space")]
    BranchOutOfRange { pc: u32, offset: i32 },
}

/// Failures assembling text into encodings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: cannot parse {text:?}")]
    Syntax { line: usize, text: String },

    #[error("line {line}: unknown label .{label}")]
    UnknownLabel { line: usize, label: String },

    #[error("line {line}: register x{register} does not exist")]
    InvalidRegister { line: usize, register: u32 },

    #[error("line {line}: immediate {value} does not fit {mnemonic}")]
    ImmediateOutOfRange {
        line: usize,
        mnemonic: &'static str,
        value: i64,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line}: {source}")]
    Load { line: usize, source: DecodeError },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = ::std::result::Result<T, Error>;
