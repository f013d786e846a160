//! DWG checksums and the header XOR sequence.
//!
//! - [`crc8`]: the 16-bit CRC that closes the direct-layout file header, the
//!   classes section and every object-map chunk. Seeded with [`CRC_SEED`].
//! - [`calculate`]: Adler-like checksum of R2004 data pages.
//! - [`MAGIC_SEQUENCE`]: XOR mask of the encrypted R2004 file header.

use once_cell::sync::Lazy;
use std::cmp;

/// Seed used for every section CRC.
pub const CRC_SEED: u16 = 0xC0C1;

/// Lookup table of the reflected 0xA001 polynomial.
static CRC_TABLE: Lazy<[u16; 256]> = Lazy::new(|| {
    let mut table = [0u16; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
        }
        *entry = crc;
    }
    table
});

/// Pre-computed 256-byte magic sequence used for DWG section encoding.
///
/// Generated from a linear congruential generator with:
/// - multiplier: `0x343FD`
/// - increment:  `0x269EC3`
/// - initial seed: `1`
///
/// Each byte is `(seed >> 16) & 0xFF` after advancing the generator.
pub static MAGIC_SEQUENCE: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut seq = [0u8; 256];
    let mut rand_seed: i32 = 1;
    for byte in seq.iter_mut() {
        rand_seed = rand_seed.wrapping_mul(0x343FD);
        rand_seed = rand_seed.wrapping_add(0x269EC3);
        *byte = (rand_seed >> 0x10) as u8;
    }
    seq
});

/// 16-bit CRC of `data`, starting from `seed`.
pub fn crc8(seed: u16, data: &[u8]) -> u16 {
    data.iter().fold(seed, |dx, &byte| {
        let index = (byte ^ (dx & 0xFF) as u8) as usize;
        (dx >> 8) ^ CRC_TABLE[index]
    })
}

/// Value the direct-layout file header CRC is XORed with, by locator count.
pub fn header_crc_mask(record_count: u32) -> u16 {
    match record_count {
        3 => 0xA598,
        4 => 0x8101,
        5 => 0x3CC4,
        6 => 0x8461,
        _ => 0,
    }
}

/// Adler-like checksum used in DWG section data.
///
/// This is a modified Adler-32 with modulus `0xFFF1` and a chunk size of
/// `0x15B0` (5552), identical to zlib's Adler-32 implementation.
///
/// # Arguments
///
/// * `seed`   - Initial checksum value (lower 16 bits = sum1, upper 16 bits = sum2).
/// * `buffer` - Source data.
pub fn calculate(seed: u32, buffer: &[u8]) -> u32 {
    let mut sum1 = seed & 0xFFFF;
    let mut sum2 = seed >> 16;
    let mut remaining = buffer;

    while !remaining.is_empty() {
        let chunk_size = cmp::min(0x15B0, remaining.len());
        let (chunk, rest) = remaining.split_at(chunk_size);
        remaining = rest;

        for &byte in chunk {
            sum1 += byte as u32;
            sum2 += sum1;
        }

        sum1 %= 0xFFF1;
        sum2 %= 0xFFF1;
    }

    (sum2 << 16) | (sum1 & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_table_matches_reference_entries() {
        assert_eq!(CRC_TABLE[0], 0x0000);
        assert_eq!(CRC_TABLE[1], 0xC0C1);
        assert_eq!(CRC_TABLE[2], 0xC181);
        assert_eq!(CRC_TABLE[3], 0x0140);
        assert_eq!(CRC_TABLE[255], 0x4040);
    }

    #[test]
    fn test_crc8_check_value() {
        // CRC-16/ARC check value for the standard test string.
        assert_eq!(crc8(0, b"123456789"), 0xBB3D);
    }

    #[test]
    fn test_crc8_empty_returns_seed() {
        assert_eq!(crc8(CRC_SEED, &[]), CRC_SEED);
    }

    #[test]
    fn test_crc8_detects_single_bit_flip() {
        let data = b"AcDb:Classes section payload".to_vec();
        let reference = crc8(CRC_SEED, &data);
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc8(CRC_SEED, &flipped), reference);
            }
        }
    }

    #[test]
    fn test_header_crc_mask() {
        assert_eq!(header_crc_mask(3), 0xA598);
        assert_eq!(header_crc_mask(6), 0x8461);
        assert_eq!(header_crc_mask(9), 0);
    }

    #[test]
    fn test_magic_sequence_first_bytes() {
        let seq = &*MAGIC_SEQUENCE;
        assert_eq!(seq.len(), 256);
        // First iteration: seed = 1 * 0x343FD + 0x269EC3 = 0x29D303
        // byte = (0x29D303 >> 16) = 0x29 = 41
        assert_eq!(seq[0], 0x29);
    }

    #[test]
    fn test_calculate_empty() {
        assert_eq!(calculate(1, &[]), 1);
    }

    #[test]
    fn test_calculate_known() {
        // "ABC" with seed = 0x0001_0001 (sum1=1, sum2=1)
        let result = calculate(0x0001_0001, b"ABC");

        // sum1 = (1+65+66+67) % 0xFFF1 = 199
        // sum2 = (1 + (1+65) + (1+65+66) + (1+65+66+67)) % 0xFFF1
        //      = (1 + 66 + 132 + 199) % 0xFFF1 = 398
        assert_eq!(result & 0xFFFF, 199);
        assert_eq!(result >> 16, 398);
    }
}
