//! Reconstruction of signed values from raw immediate fields.

use crate::helpers::{get_bits, splice_bits, twos_complement};

/// Declared width of the I-type immediate and of the `imm_hi ‖ imm_lo` pair.
pub const IMM_WIDTH: u32 = 12;

const IMM_LO_WIDTH: u32 = 5;

/// Two's-complement value of a `width`-bit field.
pub fn simple(bits: u32, width: u32) -> i32 {
    twos_complement(get_bits(width - 1, 0, bits), width)
}

/// Load/store offsets are taken as plain unsigned magnitudes.
pub fn unsigned(bits: u32) -> u32 {
    bits
}

/// Byte offset of a branch, from its split immediate fields.
///
/// The 12-bit concatenation `imm_hi ‖ imm_lo` carries, MSB first, the sign,
/// offset bits 10..5, offset bits 4..1 and finally offset bit 11. The low bit
/// of the offset is always zero since targets are instruction aligned.
pub fn branch(imm_hi: u32, imm_lo: u32) -> i32 {
    let concat = (imm_hi << IMM_LO_WIDTH) | get_bits(IMM_LO_WIDTH - 1, 0, imm_lo);
    let sign = get_bits(11, 11, concat);

    let mut dest_word: u32 = 0;
    dest_word = splice_bits(12, 12, dest_word, sign);
    dest_word = splice_bits(11, 11, dest_word, get_bits(0, 0, concat));
    dest_word = splice_bits(10, 1, dest_word, get_bits(10, 1, concat));
    let offset = twos_complement(dest_word, IMM_WIDTH + 1);
    log::trace!("branch immediate {:012b} -> {}", concat, offset);
    offset
}
