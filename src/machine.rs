use std::fmt;

use crate::error::{ExecError, Location};

pub const NUM_REGISTERS: usize = 32;
pub const MEMORY_WORDS: usize = 256;

/// Bytes per memory word; byte addresses collapse to `address / WORD_BYTES`.
pub const WORD_BYTES: u32 = 4;

/// General purpose registers. `x0` is an ordinary register here and keeps
/// whatever is written to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    registers: [i32; NUM_REGISTERS],
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (reg_num, value) in self.registers.iter().enumerate() {
            write!(f, "x{:<2} = {:3}", reg_num, value)?;
            if (reg_num + 1) % 4 == 0 {
                writeln!(f)?;
            } else {
                write!(f, "\t\t")?;
            }
        }
        Ok(())
    }
}

impl RegisterFile {
    pub fn new() -> RegisterFile {
        RegisterFile { registers: [0; NUM_REGISTERS] }
    }

    /// Checks a register number before any use.
    pub fn index(reg_num: i64) -> Result<usize, ExecError> {
        if reg_num < 0 || reg_num >= NUM_REGISTERS as i64 {
            return Err(ExecError::OutOfBounds(Location::Register(reg_num)));
        }
        Ok(reg_num as usize)
    }

    pub fn read(&self, reg_num: u32) -> Result<i32, ExecError> {
        Ok(self.registers[RegisterFile::index(i64::from(reg_num))?])
    }

    pub fn write(&mut self, reg_num: u32, val: i32) -> Result<(), ExecError> {
        let index = RegisterFile::index(i64::from(reg_num))?;
        self.registers[index] = val;
        Ok(())
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.registers
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        RegisterFile::new()
    }
}

/// Word-addressed data memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMemory {
    memory: [i32; MEMORY_WORDS],
}

impl fmt::Display for DataMemory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, value) in self.memory.iter().enumerate() {
            write!(f, "[{:<3}] = {:3}", index, value)?;
            if (index + 1) % 4 == 0 {
                writeln!(f)?;
            } else {
                write!(f, "\t\t")?;
            }
        }
        Ok(())
    }
}

impl DataMemory {
    pub fn new() -> DataMemory {
        DataMemory { memory: [0; MEMORY_WORDS] }
    }

    /// Checks a word index before any use.
    pub fn index(word: i64) -> Result<usize, ExecError> {
        if word < 0 || word >= MEMORY_WORDS as i64 {
            return Err(ExecError::OutOfBounds(Location::Memory(word)));
        }
        Ok(word as usize)
    }

    pub fn read(&self, word: i64) -> Result<i32, ExecError> {
        Ok(self.memory[DataMemory::index(word)?])
    }

    pub fn write(&mut self, word: i64, val: i32) -> Result<(), ExecError> {
        let index = DataMemory::index(word)?;
        self.memory[index] = val;
        Ok(())
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.memory
    }
}

impl Default for DataMemory {
    fn default() -> Self {
        DataMemory::new()
    }
}

/// Registers, memory and program counter, zero-filled at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    pub registers: RegisterFile,
    pub memory: DataMemory,
    pub pc: u32,
}

impl Machine {
    pub fn new() -> Machine {
        Machine::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let machine = Machine::new();
        assert_eq!(0, machine.pc);
        assert!(machine.registers.as_slice().iter().all(|r| *r == 0));
        assert_eq!(MEMORY_WORDS, machine.memory.as_slice().len());
        assert!(machine.memory.as_slice().iter().all(|m| *m == 0));
    }

    #[test]
    fn register_zero_is_writable() {
        let mut regs = RegisterFile::new();
        regs.write(0, 42).unwrap();
        assert_eq!(42, regs.read(0).unwrap());
    }

    #[test]
    fn bounds() {
        let mut regs = RegisterFile::new();
        assert_eq!(Err(ExecError::OutOfBounds(Location::Register(32))), regs.write(32, 1));
        assert!(regs.read(31).is_ok());

        let mut mem = DataMemory::new();
        assert_eq!(Err(ExecError::OutOfBounds(Location::Memory(256))), mem.read(256));
        assert_eq!(Err(ExecError::OutOfBounds(Location::Memory(-1))), mem.write(-1, 3));
        mem.write(255, 3).unwrap();
        assert_eq!(3, mem.read(255).unwrap());
    }

    #[test]
    fn register_dump_has_four_per_row() {
        let mut regs = RegisterFile::new();
        regs.write(5, -7).unwrap();
        let dump = regs.to_string();
        assert_eq!(8, dump.lines().count());
        assert_eq!("x4  =   0\t\tx5  =  -7\t\tx6  =   0\t\tx7  =   0", dump.lines().nth(1).unwrap());
    }

    #[test]
    fn memory_dump_has_four_per_row() {
        let dump = DataMemory::new().to_string();
        assert_eq!(64, dump.lines().count());
        assert!(dump.starts_with("[0  ] =   0\t\t[1  ] =   0"));
    }
}
