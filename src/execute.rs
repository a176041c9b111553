use crate::error::ExecError;
use crate::immediate;
use crate::instruction::{Fields, Instruction, Mnemonic, INSTRUCTION_WIDTH};
use crate::machine::{DataMemory, Machine, RegisterFile, WORD_BYTES};

/// The single state change an instruction makes, computed before anything
/// is written so a failing step leaves the machine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    WriteRegister { index: usize, val: i32 },
    WriteMemory { index: usize, val: i32 },
    SetPc(u32),
    Nothing,
}

/// ALU result for `mnemonic`. Immediates and address offsets add; branches
/// compare by subtracting.
fn alu(mnemonic: Mnemonic, a: i32, b: i32) -> i32 {
    match mnemonic {
        Mnemonic::Add | Mnemonic::Addi | Mnemonic::Lw | Mnemonic::Sw => a.wrapping_add(b),
        Mnemonic::Sub | Mnemonic::Beq | Mnemonic::Bne => a.wrapping_sub(b),
        Mnemonic::And => a & b,
        Mnemonic::Or => a | b,
    }
}

/// Word index addressed by `base + offset` bytes.
fn word_index(base: i32, offset: u32) -> Result<usize, ExecError> {
    DataMemory::index(i64::from(base) + i64::from(offset / WORD_BYTES))
}

/// `pc` biased by one instruction width so the driver's fixed advance lands
/// exactly on `pc + offset`.
fn branch_target(pc: u32, offset: i32) -> Result<u32, ExecError> {
    let target = i64::from(pc) + i64::from(offset);
    if target < 0 || target > i64::from(u32::MAX) {
        return Err(ExecError::BranchOutOfRange { pc, offset });
    }
    Ok((target as u32).wrapping_sub(INSTRUCTION_WIDTH))
}

/// Reads operands and resolves the effect of `instruction` without
/// touching `machine`.
pub fn evaluate(instruction: &Instruction, machine: &Machine) -> Result<Effect, ExecError> {
    let regs = &machine.registers;
    let mnemonic = instruction.mnemonic;

    Ok(match instruction.fields {
        Fields::R { rs2, rs1, rd, .. } => {
            let result = alu(mnemonic, regs.read(rs1)?, regs.read(rs2)?);
            Effect::WriteRegister { index: RegisterFile::index(i64::from(rd))?, val: result }
        }
        Fields::I { imm, rs1, rd, .. } => {
            let index = RegisterFile::index(i64::from(rd))?;
            let base = regs.read(rs1)?;
            let val = match mnemonic {
                Mnemonic::Lw => {
                    let word = word_index(base, immediate::unsigned(imm))?;
                    machine.memory.read(word as i64)?
                }
                Mnemonic::Addi
                | Mnemonic::Add
                | Mnemonic::Sub
                | Mnemonic::And
                | Mnemonic::Or
                | Mnemonic::Sw
                | Mnemonic::Beq
                | Mnemonic::Bne => alu(mnemonic, base, immediate::simple(imm, immediate::IMM_WIDTH)),
            };
            Effect::WriteRegister { index, val }
        }
        Fields::S { rs2, rs1, imm_lo, .. } => {
            let index = word_index(regs.read(rs1)?, immediate::unsigned(imm_lo))?;
            Effect::WriteMemory { index, val: regs.read(rs2)? }
        }
        Fields::B { imm_hi, rs2, rs1, imm_lo, .. } => {
            let (a, b) = (regs.read(rs1)?, regs.read(rs2)?);
            let taken = match mnemonic {
                Mnemonic::Beq => alu(mnemonic, a, b) == 0,
                Mnemonic::Bne => alu(mnemonic, a, b) != 0,
                Mnemonic::Add
                | Mnemonic::Sub
                | Mnemonic::And
                | Mnemonic::Or
                | Mnemonic::Addi
                | Mnemonic::Lw
                | Mnemonic::Sw => false,
            };
            if taken {
                Effect::SetPc(branch_target(machine.pc, immediate::branch(imm_hi, imm_lo))?)
            } else {
                Effect::Nothing
            }
        }
    })
}

/// Applies `instruction` to `machine`. Does not advance `pc`; that is the
/// driver's job.
pub fn execute(instruction: &Instruction, machine: &mut Machine) -> Result<Effect, ExecError> {
    let effect = evaluate(instruction, machine)?;
    match effect {
        Effect::WriteRegister { index, val } => {
            log::debug!("writing {} to register number {}", val, index);
            machine.registers.write(index as u32, val)?;
        }
        Effect::WriteMemory { index, val } => {
            log::debug!("writing {} to memory word {}", val, index);
            machine.memory.write(index as i64, val)?;
        }
        Effect::SetPc(pc) => {
            log::debug!("branch taken, pc {} -> {}", machine.pc, pc);
            machine.pc = pc;
        }
        Effect::Nothing => {}
    }
    Ok(effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::error::Location;

    fn run(machine: &mut Machine, line: &str) -> Result<Effect, ExecError> {
        execute(&decode(line).unwrap(), machine)
    }

    #[test]
    fn addi_then_add() {
        let mut machine = Machine::new();
        run(&mut machine, concat!("000000000101", "00000", "000", "00001", "0010011")).unwrap();
        run(&mut machine, concat!("000000000011", "00000", "000", "00010", "0010011")).unwrap();
        run(&mut machine, concat!("0000000", "00010", "00001", "000", "00011", "0110011")).unwrap();
        assert_eq!(8, machine.registers.read(3).unwrap());
        assert_eq!(0, machine.pc);
    }

    #[test]
    fn alu_operations() {
        let mut machine = Machine::new();
        machine.registers.write(1, 0b1100).unwrap();
        machine.registers.write(2, 0b1010).unwrap();
        // sub x3, x1, x2 ; and x4, x1, x2 ; or x5, x1, x2
        run(&mut machine, concat!("0100000", "00010", "00001", "000", "00011", "0110011")).unwrap();
        run(&mut machine, concat!("0000000", "00010", "00001", "111", "00100", "0110011")).unwrap();
        run(&mut machine, concat!("0000000", "00010", "00001", "110", "00101", "0110011")).unwrap();
        assert_eq!(2, machine.registers.read(3).unwrap());
        assert_eq!(0b1000, machine.registers.read(4).unwrap());
        assert_eq!(0b1110, machine.registers.read(5).unwrap());
    }

    #[test]
    fn alu_per_mnemonic() {
        assert_eq!(7, alu(Mnemonic::Add, 3, 4));
        assert_eq!(-1, alu(Mnemonic::Addi, 3, -4));
        assert_eq!(-1, alu(Mnemonic::Sub, 3, 4));
        assert_eq!(0b1000, alu(Mnemonic::And, 0b1100, 0b1010));
        assert_eq!(0b1110, alu(Mnemonic::Or, 0b1100, 0b1010));
        assert_eq!(0, alu(Mnemonic::Beq, 5, 5));
        assert_ne!(0, alu(Mnemonic::Bne, i32::MIN, i32::MAX));
    }

    #[test]
    fn branches_compare_extreme_values() {
        let beq = concat!("0000000", "00010", "00001", "000", "01000", "1100011");
        let mut machine = Machine::new();
        machine.registers.write(1, i32::MIN).unwrap();
        machine.registers.write(2, i32::MAX).unwrap();
        assert_eq!(Ok(Effect::Nothing), run(&mut machine, beq));
        machine.registers.write(2, i32::MIN).unwrap();
        assert_eq!(Ok(Effect::SetPc(4)), run(&mut machine, beq));
    }

    #[test]
    fn addi_negative_and_wrapping() {
        let mut machine = Machine::new();
        // addi x1, x0, -1
        run(&mut machine, concat!("111111111111", "00000", "000", "00001", "0010011")).unwrap();
        assert_eq!(-1, machine.registers.read(1).unwrap());

        machine.registers.write(2, i32::MAX).unwrap();
        // addi x2, x2, 1
        run(&mut machine, concat!("000000000001", "00010", "000", "00010", "0010011")).unwrap();
        assert_eq!(i32::MIN, machine.registers.read(2).unwrap());
    }

    #[test]
    fn store_then_load() {
        let mut machine = Machine::new();
        machine.registers.write(1, 7).unwrap();
        // sw x1, 0(x2) ; lw x3, 0(x2)
        run(&mut machine, concat!("0000000", "00001", "00010", "010", "00000", "0100011")).unwrap();
        run(&mut machine, concat!("000000000000", "00010", "010", "00011", "0000011")).unwrap();
        assert_eq!(7, machine.registers.read(3).unwrap());
        assert_eq!(7, machine.memory.read(0).unwrap());
    }

    #[test]
    fn offsets_are_byte_addresses() {
        let mut machine = Machine::new();
        machine.registers.write(1, 9).unwrap();
        machine.registers.write(2, 3).unwrap();
        // sw x1, 7(x2): word 3 + 7/4 = 4
        run(&mut machine, concat!("0000000", "00001", "00010", "010", "00111", "0100011")).unwrap();
        assert_eq!(9, machine.memory.read(4).unwrap());
        // lw x5, 4(x2): word 3 + 1 = 4
        run(&mut machine, concat!("000000000100", "00010", "010", "00101", "0000011")).unwrap();
        assert_eq!(9, machine.registers.read(5).unwrap());
    }

    #[test]
    fn sw_ignores_imm_hi() {
        let mut machine = Machine::new();
        machine.registers.write(1, 5).unwrap();
        // imm_hi = 1 would be byte 32 in a split immediate, but only imm_lo counts.
        run(&mut machine, concat!("0000001", "00001", "00000", "010", "00100", "0100011")).unwrap();
        assert_eq!(5, machine.memory.read(1).unwrap());
        assert_eq!(0, machine.memory.read(9).unwrap());
    }

    #[test]
    fn lw_offset_is_unsigned() {
        let mut machine = Machine::new();
        // lw x1, 4092(x0) -> word 1023, outside memory.
        let result = run(&mut machine, concat!("111111111100", "00000", "010", "00001", "0000011"));
        assert_eq!(Err(ExecError::OutOfBounds(Location::Memory(1023))), result);
    }

    #[test]
    fn out_of_bounds_commits_nothing() {
        let mut machine = Machine::new();
        machine.registers.write(2, 300).unwrap();
        machine.registers.write(1, 11).unwrap();
        let before = machine.clone();
        // sw x1, 0(x2)
        let result = run(&mut machine, concat!("0000000", "00001", "00010", "010", "00000", "0100011"));
        assert_eq!(Err(ExecError::OutOfBounds(Location::Memory(300))), result);
        assert_eq!(before, machine);

        machine.registers.write(2, -1).unwrap();
        let before = machine.clone();
        // lw x3, 0(x2)
        let result = run(&mut machine, concat!("000000000000", "00010", "010", "00011", "0000011"));
        assert_eq!(Err(ExecError::OutOfBounds(Location::Memory(-1))), result);
        assert_eq!(before, machine);
    }

    #[test]
    fn register_zero_keeps_writes() {
        let mut machine = Machine::new();
        // addi x0, x0, 4
        run(&mut machine, concat!("000000000100", "00000", "000", "00000", "0010011")).unwrap();
        assert_eq!(4, machine.registers.read(0).unwrap());
    }

    #[test]
    fn branches() {
        let beq_8 = concat!("0000000", "00010", "00001", "000", "01000", "1100011");
        let bne_8 = concat!("0000000", "00010", "00001", "001", "01000", "1100011");

        let mut machine = Machine::new();
        machine.pc = 12;
        assert_eq!(Ok(Effect::SetPc(16)), run(&mut machine, beq_8));
        assert_eq!(16, machine.pc);

        machine.pc = 12;
        assert_eq!(Ok(Effect::Nothing), run(&mut machine, bne_8));
        assert_eq!(12, machine.pc);

        machine.registers.write(1, 1).unwrap();
        assert_eq!(Ok(Effect::Nothing), run(&mut machine, beq_8));
        assert_eq!(Ok(Effect::SetPc(16)), run(&mut machine, bne_8));
    }

    #[test]
    fn backward_branches() {
        // beq x0, x0, -8
        let beq_back = concat!("1111111", "00000", "00000", "000", "11001", "1100011");
        let mut machine = Machine::new();
        machine.pc = 8;
        run(&mut machine, beq_back).unwrap();
        assert_eq!(0u32.wrapping_sub(INSTRUCTION_WIDTH), machine.pc);
        assert_eq!(0, machine.pc.wrapping_add(INSTRUCTION_WIDTH));

        machine.pc = 4;
        let before = machine.clone();
        assert_eq!(
            Err(ExecError::BranchOutOfRange { pc: 4, offset: -8 }),
            run(&mut machine, beq_back)
        );
        assert_eq!(before, machine);
    }
}
