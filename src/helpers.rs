/// Extracts bits `hi..=lo` of `word`, shifted down to bit 0.
pub fn get_bits(hi: u32, lo: u32, word: u32) -> u32 {
    (word >> lo) & mask(hi, lo)
}

/// Replaces bits `hi..=lo` of `dest` with the low bits of `source`.
pub fn splice_bits(hi: u32, lo: u32, dest: u32, source: u32) -> u32 {
    let mask = mask(hi, lo);
    ((source & mask) << lo) | (dest & !(mask << lo))
}

/// Sign-extends the low `num_bits` of `word`.
pub fn twos_complement(word: u32, num_bits: u32) -> i32 {
    let shift = 32 - num_bits;
    ((word << shift) as i32) >> shift
}

fn mask(hi: u32, lo: u32) -> u32 {
    u32::MAX >> (31 - (hi - lo))
}

#[cfg(test)]
mod helper_tests {
    use super::*;

    #[test]
    fn test_get_bits() {
        let test_bits = 0b0101_0000_1010_1111;
        assert_eq!(0b0101, get_bits(15, 12, test_bits));
        assert_eq!(0b0000, get_bits(11, 8, test_bits));
        assert_eq!(0b1010, get_bits(7, 4, test_bits));
        assert_eq!(0b1111, get_bits(3, 0, test_bits));
        assert_eq!(0b1, get_bits(14, 14, test_bits));
        assert_eq!(0b0, get_bits(11, 11, test_bits));
        assert_eq!(0xdead_beef, get_bits(31, 0, 0xdead_beef));
    }

    #[test]
    fn test_splice_bits() {
        let test_bits = 0b0000_1010_1111_1110;
        assert_eq!(0b0101_1010_1111_1110, splice_bits(15, 12, test_bits, 0b0101));
        assert_eq!(0b0000_1111_1111_1110, splice_bits(11, 8, test_bits, 0b1111));
        assert_eq!(0b0000_1010_1111_0001, splice_bits(3, 0, test_bits, 0b0001));
        assert_eq!(0b1000_1010_1111_1110, splice_bits(15, 15, test_bits, 0b1));
        // Source bits beyond the field width are dropped.
        assert_eq!(0b0000_1010_1111_1111, splice_bits(0, 0, test_bits, 0b11));
    }

    #[test]
    fn twos_complement_test() {
        assert_eq!(0b0101, twos_complement(0b0101, 4));
        assert_eq!(-5, twos_complement(0b1011, 4));
        assert_eq!(-1, twos_complement(0xfff, 12));
        assert_eq!(2047, twos_complement(0x7ff, 12));
        assert_eq!(-2048, twos_complement(0x800, 12));
        assert_eq!(-1, twos_complement(u32::MAX, 32));
    }
}
