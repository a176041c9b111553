use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::{Display as StrumDisplay, EnumIter};

use crate::instruction::{Format, Instruction, Mnemonic};

/// Datapath control lines, in display order.
#[derive(StrumDisplay, EnumIter, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ControlLine {
    RegDst,
    RegWrite,
    Branch,
    MemToReg,
    MemRead,
    MemWrite,
    #[strum(serialize = "ALUSource")]
    AluSource,
    #[strum(serialize = "ALUOp1")]
    AluOp1,
    #[strum(serialize = "ALUOp0")]
    AluOp0,
}

const NUM_LINES: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSignals([bool; NUM_LINES]);

impl ControlSignals {
    /// Derives the lines for `instruction` from its format and mnemonic alone.
    pub fn for_instruction(instruction: &Instruction) -> ControlSignals {
        use ControlLine::*;

        let mut signals = ControlSignals::default();
        match instruction.format() {
            Format::R => signals.set_all(&[RegDst, RegWrite, AluOp1]),
            Format::B => signals.set_all(&[Branch, AluOp0]),
            Format::I | Format::S => {}
        }
        match instruction.mnemonic {
            Mnemonic::Lw => signals.set_all(&[RegWrite, MemToReg, MemRead, AluSource]),
            Mnemonic::Addi => signals.set_all(&[RegWrite, AluSource]),
            Mnemonic::Sw => signals.set_all(&[MemWrite, AluSource]),
            _ => {}
        }
        signals
    }

    pub fn is_set(&self, line: ControlLine) -> bool {
        self.0[line as usize]
    }

    fn set_all(&mut self, lines: &[ControlLine]) {
        for line in lines {
            self.0[*line as usize] = true;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlLine, bool)> + '_ {
        ControlLine::iter().map(move |line| (line, self.is_set(line)))
    }

    pub fn as_array(&self) -> [bool; NUM_LINES] {
        self.0
    }
}

impl fmt::Display for ControlSignals {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (line, set) in self.iter() {
            writeln!(f, "{}: {}", line, set as u8)?;
        }
        Ok(())
    }
}
