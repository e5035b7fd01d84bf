//! CRC-32 checksum used as the per-frame integrity check.
//!
//! This is the IEEE 802.3 variant: reflected polynomial `0xEDB88320`, initial
//! value and final XOR of `0xFFFF_FFFF`. The 256-entry lookup table is built
//! at compile time and shared read-only by every caller.
//!
//! # Test Vector
//!
//! ```
//! use chunkwire::checksum::crc32;
//!
//! assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
//! assert_eq!(crc32(b""), 0);
//! ```

/// Reflected CRC-32 polynomial.
const POLY: u32 = 0xEDB8_8320;

/// Initial register value, also applied as the final XOR.
const INIT: u32 = 0xFFFF_FFFF;

/// Precomputed lookup table indexed by the low byte of the register.
const CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        #[expect(clippy::cast_possible_truncation, reason = "n is below 256")]
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 == 1 { POLY ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
};

/// Compute the CRC-32 of `data`.
#[inline]
#[must_use]
pub fn crc32(data: &[u8]) -> u32 { crc32_update(0, data) }

/// Extend a finished CRC-32 with more bytes.
///
/// `crc32_update(crc32(a), b)` equals the checksum of `a` followed by `b`,
/// which lets callers checksum a payload that arrives in pieces.
///
/// ```
/// use chunkwire::checksum::{crc32, crc32_update};
///
/// assert_eq!(crc32_update(crc32(b"12345"), b"6789"), crc32(b"123456789"));
/// ```
#[must_use]
pub fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    let mut register = crc ^ INIT;
    for &byte in data {
        let index = ((register ^ u32::from(byte)) & 0xFF) as usize;
        register = (register >> 8) ^ CRC_TABLE[index];
    }
    register ^ INIT
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{CRC_TABLE, crc32, crc32_update};

    #[rstest]
    #[case::empty(b"", 0x0000_0000)]
    #[case::check(b"123456789", 0xCBF4_3926)]
    #[case::single_a(b"a", 0xE8B7_BE43)]
    #[case::fox(b"The quick brown fox jumps over the lazy dog", 0x414F_A339)]
    fn matches_published_vectors(#[case] input: &[u8], #[case] expected: u32) {
        assert_eq!(crc32(input), expected);
    }

    #[test]
    fn table_matches_reference_entries() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], 0x7707_3096);
        assert_eq!(CRC_TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn update_from_zero_is_plain_checksum() {
        assert_eq!(crc32_update(0, b"chunk"), crc32(b"chunk"));
    }

    proptest! {
        #[test]
        fn agrees_with_crc32fast(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            prop_assert_eq!(crc32(&data), crc32fast::hash(&data));
        }

        #[test]
        fn incremental_matches_one_shot(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            split in 0usize..512,
        ) {
            let split = split.min(data.len());
            let (head, tail) = data.split_at(split);
            prop_assert_eq!(crc32_update(crc32(head), tail), crc32(&data));
        }
    }
}
