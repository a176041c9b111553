use std::fmt;

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::immediate;

/// Width of one encoded instruction in bytes. The driver steps `pc` by this.
pub const INSTRUCTION_WIDTH: u32 = 4;

/// Layout classes. Each decides the widths and positions of the fields.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Format {
    R,
    I,
    S,
    B,
}

#[derive(StrumDisplay, EnumString, IntoStaticStr, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum Mnemonic {
    Add,
    Sub,
    And,
    Or,
    Addi,
    Lw,
    Sw,
    Beq,
    Bne,
}

/// The per-format bit fields, each held right-aligned at its encoded width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fields {
    R {
        funct7: u32,
        rs2: u32,
        rs1: u32,
        funct3: u32,
        rd: u32,
    },
    I {
        imm: u32,
        rs1: u32,
        funct3: u32,
        rd: u32,
    },
    S {
        imm_hi: u32,
        rs2: u32,
        rs1: u32,
        funct3: u32,
        imm_lo: u32,
    },
    B {
        imm_hi: u32,
        rs2: u32,
        rs1: u32,
        funct3: u32,
        imm_lo: u32,
    },
}

impl Fields {
    pub fn format(&self) -> Format {
        match self {
            Fields::R { .. } => Format::R,
            Fields::I { .. } => Format::I,
            Fields::S { .. } => Format::S,
            Fields::B { .. } => Format::B,
        }
    }
}

/// One decoded instruction. `raw` keeps the original encoding around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub raw: u32,
    pub opcode: u32,
    pub mnemonic: Mnemonic,
    pub fields: Fields,
}

impl Instruction {
    pub fn format(&self) -> Format {
        self.fields.format()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self.mnemonic;
        match self.fields {
            Fields::R { rs2, rs1, rd, .. } => write!(f, "{} x{}, x{}, x{}", name, rd, rs1, rs2),
            Fields::I { imm, rs1, rd, .. } => match self.mnemonic {
                Mnemonic::Lw => write!(f, "lw x{}, {}(x{})", rd, immediate::unsigned(imm), rs1),
                _ => write!(f, "{} x{}, x{}, {}", name, rd, rs1, immediate::simple(imm, immediate::IMM_WIDTH)),
            },
            Fields::S { rs2, rs1, imm_lo, .. } => {
                write!(f, "{} x{}, {}(x{})", name, rs2, immediate::unsigned(imm_lo), rs1)
            }
            Fields::B { imm_hi, rs2, rs1, imm_lo, .. } => {
                write!(f, "{} x{}, x{}, {}", name, rs1, rs2, immediate::branch(imm_hi, imm_lo))
            }
        }
    }
}
