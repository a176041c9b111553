//! Text assembler for the disassembly syntax, producing encodings the
//! decoder accepts. Branch targets may be numeric byte offsets or `.label`
//! lines placed anywhere in the source.

use std::collections::HashMap;
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while1};
use nom::character::complete::{digit1, space0};
use nom::combinator::{map_res, opt};
use nom::error::ErrorKind;
use nom::sequence::tuple;
use nom::IResult;

use crate::error::AsmError;
use crate::helpers::{get_bits, splice_bits};
use crate::instruction::{Mnemonic, INSTRUCTION_WIDTH};
use crate::machine::NUM_REGISTERS;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
struct Label(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Register(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Offset(i64),
    Label(Label),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Statement {
    RType(Mnemonic, Register, Register, Register),
    AddI(Register, Register, i64),
    Lw(Register, Register, i64),
    Sw(Register, Register, i64),
    Branch(Mnemonic, Register, Register, Target),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Instruction(Statement),
    LabelLine(Label),
}

fn int64(input: &str) -> IResult<&str, i64> {
    let (input, minus) = opt(tag("-"))(input)?;
    let (input, digits) = map_res(digit1, i64::from_str)(input)?;
    Ok((input, if minus.is_some() { -digits } else { digits }))
}

fn separator(input: &str) -> IResult<&str, ()> {
    let (input, _) = take_while(|c: char| c == ',' || c.is_whitespace())(input)?;
    Ok((input, ()))
}

fn register(input: &str) -> IResult<&str, Register> {
    let (input, _) = tag_no_case("x")(input)?;
    let (input, reg_num) = map_res(digit1, u32::from_str)(input)?;
    let (input, _) = separator(input)?;
    Ok((input, Register(reg_num)))
}

fn register_with_offset(input: &str) -> IResult<&str, (Register, i64)> {
    let (input, offset) = int64(input)?;
    let (input, _) = tag("(")(input)?;
    let (input, reg) = register(input)?;
    let (input, _) = tag(")")(input)?;
    let (input, _) = separator(input)?;
    Ok((input, (reg, offset)))
}

fn label(input: &str) -> IResult<&str, Label> {
    let (input, _) = tag(".")(input)?;
    let (input, label_str) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    Ok((input, Label(String::from(label_str))))
}

fn target(input: &str) -> IResult<&str, Target> {
    if let Ok((input, label)) = label(input) {
        return Ok((input, Target::Label(label)));
    }
    let (input, offset) = int64(input)?;
    Ok((input, Target::Offset(offset)))
}

fn instruction(input: &str) -> IResult<&str, Line> {
    let (input, instr_name) = take_while1(|c: char| c.is_alphabetic())(input)?;
    let (input, _) = space0(input)?;
    if instr_name == "nop" {
        return Ok((input, Line::Instruction(Statement::AddI(Register(0), Register(0), 0))));
    }
    let mnemonic = match instr_name.parse::<Mnemonic>() {
        Ok(mnemonic) => mnemonic,
        Err(_) => return Err(nom::Err::Error((input, ErrorKind::Tag))),
    };
    let (input, statement) = match mnemonic {
        Mnemonic::Add | Mnemonic::Sub | Mnemonic::And | Mnemonic::Or => {
            let (input, (rd, rs1, rs2)) = tuple((register, register, register))(input)?;
            (input, Statement::RType(mnemonic, rd, rs1, rs2))
        }
        Mnemonic::Addi => {
            let (input, (rd, rs1, immed)) = tuple((register, register, int64))(input)?;
            (input, Statement::AddI(rd, rs1, immed))
        }
        Mnemonic::Lw => {
            let (input, (rd, (rs1, offset))) = tuple((register, register_with_offset))(input)?;
            (input, Statement::Lw(rd, rs1, offset))
        }
        Mnemonic::Sw => {
            let (input, (rs2, (rs1, offset))) = tuple((register, register_with_offset))(input)?;
            (input, Statement::Sw(rs2, rs1, offset))
        }
        Mnemonic::Beq | Mnemonic::Bne => {
            let (input, (rs1, rs2, target)) = tuple((register, register, target))(input)?;
            (input, Statement::Branch(mnemonic, rs1, rs2, target))
        }
    };
    Ok((input, Line::Instruction(statement)))
}

fn label_line(input: &str) -> IResult<&str, Line> {
    let (input, label) = label(input)?;
    Ok((input, Line::LabelLine(label)))
}

fn line(input: &str) -> IResult<&str, Line> {
    let (input, _) = space0(input)?;
    let (input, line) = alt((instruction, label_line))(input)?;
    let (input, _) = separator(input)?;
    Ok((input, line))
}

/// Checks `value` against `range` for `mnemonic`.
fn immediate_in(
    line: usize,
    mnemonic: Mnemonic,
    value: i64,
    range: std::ops::RangeInclusive<i64>,
) -> Result<u32, AsmError> {
    if !range.contains(&value) {
        return Err(AsmError::ImmediateOutOfRange { line, mnemonic: mnemonic.into(), value });
    }
    Ok(value as u32)
}

fn reg(line: usize, Register(reg_num): Register) -> Result<u32, AsmError> {
    if reg_num as usize >= NUM_REGISTERS {
        return Err(AsmError::InvalidRegister { line, register: reg_num });
    }
    Ok(reg_num)
}

fn r_type(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    let dest = splice_bits(31, 25, 0, funct7);
    let dest = splice_bits(24, 20, dest, rs2);
    let dest = splice_bits(19, 15, dest, rs1);
    let dest = splice_bits(14, 12, dest, funct3);
    let dest = splice_bits(11, 7, dest, rd);
    splice_bits(6, 0, dest, opcode)
}

fn i_type(imm: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    let dest = splice_bits(31, 20, 0, imm);
    let dest = splice_bits(19, 15, dest, rs1);
    let dest = splice_bits(14, 12, dest, funct3);
    let dest = splice_bits(11, 7, dest, rd);
    splice_bits(6, 0, dest, opcode)
}

impl Statement {
    fn to_machine_code(
        &self,
        line: usize,
        index: u32,
        label_dict: &HashMap<Label, u32>,
    ) -> Result<u32, AsmError> {
        Ok(match self {
            Statement::RType(mnemonic, rd, rs1, rs2) => {
                let (funct7, funct3) = match mnemonic {
                    Mnemonic::Sub => (0b010_0000, 0b000),
                    Mnemonic::And => (0b000_0000, 0b111),
                    Mnemonic::Or => (0b000_0000, 0b110),
                    _ => (0b000_0000, 0b000),
                };
                r_type(funct7, reg(line, *rs2)?, reg(line, *rs1)?, funct3, reg(line, *rd)?, 0b011_0011)
            }

            Statement::AddI(rd, rs1, immediate) => {
                let imm = immediate_in(line, Mnemonic::Addi, *immediate, -2048..=2047)?;
                i_type(imm, reg(line, *rs1)?, 0b000, reg(line, *rd)?, 0b001_0011)
            }

            Statement::Lw(rd, rs1, offset) => {
                let imm = immediate_in(line, Mnemonic::Lw, *offset, 0..=4095)?;
                i_type(imm, reg(line, *rs1)?, 0b010, reg(line, *rd)?, 0b000_0011)
            }

            // Only the low five offset bits reach the executed store.
            Statement::Sw(rs2, rs1, offset) => {
                let imm = immediate_in(line, Mnemonic::Sw, *offset, 0..=31)?;
                r_type(0, reg(line, *rs2)?, reg(line, *rs1)?, 0b010, imm, 0b010_0011)
            }

            Statement::Branch(mnemonic, rs1, rs2, target) => {
                let branch_offset = match target {
                    Target::Offset(value) => *value,
                    Target::Label(label) => match label_dict.get(label) {
                        Some(label_loc) => (i64::from(*label_loc) - i64::from(index)) * i64::from(INSTRUCTION_WIDTH),
                        None => {
                            return Err(AsmError::UnknownLabel { line, label: label.0.clone() })
                        }
                    },
                };
                if branch_offset % 2 != 0 {
                    return Err(AsmError::ImmediateOutOfRange {
                        line,
                        mnemonic: (*mnemonic).into(),
                        value: branch_offset,
                    });
                }
                let branch_offset = immediate_in(line, *mnemonic, branch_offset, -4096..=4094)?;
                let funct3 = if *mnemonic == Mnemonic::Bne { 0b001 } else { 0b000 };

                let bit_31 = get_bits(12, 12, branch_offset);
                let bits_30_to_25 = get_bits(10, 5, branch_offset);
                let bits_11_to_8 = get_bits(4, 1, branch_offset);
                let bit_7 = get_bits(11, 11, branch_offset);

                let dest = splice_bits(31, 31, 0, bit_31);
                let dest = splice_bits(30, 25, dest, bits_30_to_25);
                let dest = splice_bits(24, 20, dest, reg(line, *rs2)?);
                let dest = splice_bits(19, 15, dest, reg(line, *rs1)?);
                let dest = splice_bits(14, 12, dest, funct3);
                let dest = splice_bits(11, 8, dest, bits_11_to_8);
                let dest = splice_bits(7, 7, dest, bit_7);
                splice_bits(6, 0, dest, 0b110_0011)
            }
        })
    }
}

/// Parses every non-blank line; `#` starts a comment.
fn program(input: &str) -> Result<Vec<(usize, Line)>, AsmError> {
    let mut lines = Vec::new();
    for (index, raw_line) in input.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let syntax = || AsmError::Syntax { line: index + 1, text: raw_line.to_string() };
        let (rest, parsed) = self::line(line).map_err(|_| syntax())?;
        if !rest.is_empty() {
            return Err(syntax());
        }
        lines.push((index + 1, parsed));
    }
    Ok(lines)
}

fn gen_machine_code(lines: &[(usize, Line)]) -> Result<Vec<u32>, AsmError> {
    fn mk_label_dict(lines: &[(usize, Line)]) -> HashMap<Label, u32> {
        let mut label_dict: HashMap<Label, u32> = HashMap::new();
        let mut offset: u32 = 0;
        for (_, line) in lines.iter() {
            if let Line::LabelLine(label) = line {
                label_dict.insert(label.clone(), offset);
            } else {
                offset += 1;
            }
        }
        label_dict
    }

    let label_dict = mk_label_dict(lines);

    let mut machine_code: Vec<u32> = Vec::new();
    let mut offset: u32 = 0;
    for (line_num, line) in lines.iter() {
        if let Line::Instruction(statement) = line {
            machine_code.push(statement.to_machine_code(*line_num, offset, &label_dict)?);
            offset += 1;
        }
    }
    Ok(machine_code)
}

/// Assembles source text into 32-bit encodings.
pub fn assemble(text: &str) -> Result<Vec<u32>, AsmError> {
    let lines = program(text)?;
    let machine_code = gen_machine_code(&lines)?;
    log::debug!("assembled {} instructions", machine_code.len());
    Ok(machine_code)
}

/// Renders encodings in the one-per-line binary program format.
pub fn to_binary_lines(machine_code: &[u32]) -> String {
    machine_code.iter().map(|word| format!("{:032b}\n", word)).collect()
}
