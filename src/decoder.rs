use std::convert::TryFrom;

use lazy_static::lazy_static;
use nom::bytes::complete::take;
use nom::combinator::{all_consuming, map_res};
use nom::sequence::tuple;
use nom::IResult;
use regex::Regex;

use crate::error::DecodeError;
use crate::helpers::get_bits;
use crate::instruction::{Fields, Format, Instruction, Mnemonic};

lazy_static! {
    static ref ENCODING: Regex = Regex::new(r"^[01]{32}$").unwrap();
}

const OP_RTYPE: u32 = 0b011_0011;
const OP_LOAD: u32 = 0b000_0011;
const OP_IMM: u32 = 0b001_0011;
const OP_STORE: u32 = 0b010_0011;
const OP_BRANCH: u32 = 0b110_0011;

impl TryFrom<u32> for Format {
    type Error = DecodeError;
    fn try_from(opcode: u32) -> Result<Format, DecodeError> {
        Ok(match opcode {
            OP_RTYPE => Format::R,
            OP_LOAD | OP_IMM => Format::I,
            OP_STORE => Format::S,
            OP_BRANCH => Format::B,
            _ => return Err(DecodeError::UnsupportedOpcode(opcode)),
        })
    }
}

fn field<'a>(width: usize) -> impl Fn(&'a str) -> IResult<&'a str, u32> {
    map_res(take(width), |bits: &str| u32::from_str_radix(bits, 2))
}

// funct7 | rs2 | rs1 | funct3 | rd | opcode
fn r_fields(input: &str) -> IResult<&str, Fields> {
    let (input, (funct7, rs2, rs1, funct3, rd, _)) =
        all_consuming(tuple((field(7), field(5), field(5), field(3), field(5), field(7))))(input)?;
    Ok((input, Fields::R { funct7, rs2, rs1, funct3, rd }))
}

// imm | rs1 | funct3 | rd | opcode
fn i_fields(input: &str) -> IResult<&str, Fields> {
    let (input, (imm, rs1, funct3, rd, _)) =
        all_consuming(tuple((field(12), field(5), field(3), field(5), field(7))))(input)?;
    Ok((input, Fields::I { imm, rs1, funct3, rd }))
}

// imm_hi | rs2 | rs1 | funct3 | imm_lo | opcode, shared by S and B.
fn split_imm_fields(input: &str) -> IResult<&str, (u32, u32, u32, u32, u32)> {
    let (input, (imm_hi, rs2, rs1, funct3, imm_lo, _)) =
        all_consuming(tuple((field(7), field(5), field(5), field(3), field(5), field(7))))(input)?;
    Ok((input, (imm_hi, rs2, rs1, funct3, imm_lo)))
}

fn extract_fields(line: &str, format: Format) -> IResult<&str, Fields> {
    match format {
        Format::R => r_fields(line),
        Format::I => i_fields(line),
        Format::S => {
            let (input, (imm_hi, rs2, rs1, funct3, imm_lo)) = split_imm_fields(line)?;
            Ok((input, Fields::S { imm_hi, rs2, rs1, funct3, imm_lo }))
        }
        Format::B => {
            let (input, (imm_hi, rs2, rs1, funct3, imm_lo)) = split_imm_fields(line)?;
            Ok((input, Fields::B { imm_hi, rs2, rs1, funct3, imm_lo }))
        }
    }
}

/// Looks the mnemonic up by format, `funct3` and either `funct7` (R) or the
/// opcode (I). S-type is always `sw`.
fn resolve_mnemonic(opcode: u32, fields: &Fields) -> Result<Mnemonic, DecodeError> {
    let mnemonic = match *fields {
        Fields::R { funct7, funct3, .. } => match (funct3, funct7) {
            (0b000, 0b000_0000) => Some(Mnemonic::Add),
            (0b000, 0b010_0000) => Some(Mnemonic::Sub),
            (0b111, 0b000_0000) => Some(Mnemonic::And),
            (0b110, 0b000_0000) => Some(Mnemonic::Or),
            _ => None,
        },
        Fields::I { .. } => match opcode {
            OP_IMM => Some(Mnemonic::Addi),
            OP_LOAD => Some(Mnemonic::Lw),
            _ => None,
        },
        Fields::S { .. } => Some(Mnemonic::Sw),
        Fields::B { funct3, .. } => match funct3 {
            0b000 => Some(Mnemonic::Beq),
            0b001 => Some(Mnemonic::Bne),
            _ => None,
        },
    };

    mnemonic.ok_or_else(|| match *fields {
        Fields::R { funct7, funct3, .. } => DecodeError::UnsupportedFunct {
            format: Format::R,
            funct3,
            funct7: Some(funct7),
        },
        Fields::I { funct3, .. } | Fields::S { funct3, .. } | Fields::B { funct3, .. } => {
            DecodeError::UnsupportedFunct {
                format: fields.format(),
                funct3,
                funct7: None,
            }
        }
    })
}

/// Decodes one 32-character, MSB-first binary line.
pub fn decode(line: &str) -> Result<Instruction, DecodeError> {
    if !ENCODING.is_match(line) {
        return Err(DecodeError::MalformedEncoding(line.to_string()));
    }
    let malformed = |_| DecodeError::MalformedEncoding(line.to_string());

    let raw = u32::from_str_radix(line, 2).map_err(malformed)?;
    let opcode = get_bits(6, 0, raw);
    let format = Format::try_from(opcode)?;
    let (_, fields) = extract_fields(line, format)
        .map_err(|_| DecodeError::MalformedEncoding(line.to_string()))?;
    let mnemonic = resolve_mnemonic(opcode, &fields)?;

    log::trace!("decoded {} as {}-type {:?}", line, format, fields);
    Ok(Instruction { raw, opcode, mnemonic, fields })
}

/// Decodes numbered lines, stopping at the first failure and reporting its
/// line number.
pub fn decode_all<'a, I>(lines: I) -> Result<Vec<Instruction>, (usize, DecodeError)>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    lines
        .into_iter()
        .map(|(line_num, line)| decode(line).map_err(|e| (line_num, e)))
        .collect()
}
