use crate::error::{DwgError, Result};

/// LZ77 variant used by AC1018 (DWG 2004) data and system pages.
pub struct DwgLz77Ac18Decompressor;

/// Byte source over a compressed page.
struct Source<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    fn read_u8(&mut self) -> Result<u8> {
        let b = self.data.get(self.pos).copied().ok_or_else(|| {
            DwgError::Decompression(format!(
                "compressed stream ended at byte {} of {}",
                self.pos,
                self.data.len()
            ))
        })?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(count).filter(|&e| e <= self.data.len()).ok_or_else(|| {
            DwgError::Decompression(format!(
                "literal run of {count} bytes overruns the compressed stream"
            ))
        })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

impl DwgLz77Ac18Decompressor {
    /// Decompress `compressed` into at most `decompressed_size` bytes.
    ///
    /// The returned buffer holds exactly the bytes produced by the stream.
    pub fn decompress(compressed: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
        let mut dst = Vec::with_capacity(decompressed_size);
        Self::decompress_to_dest(compressed, &mut dst, decompressed_size)?;
        Ok(dst)
    }

    /// Decompress `compressed`, appending to `dst` without growing it past `limit` bytes.
    pub fn decompress_to_dest(compressed: &[u8], dst: &mut Vec<u8>, limit: usize) -> Result<()> {
        let mut src = Source {
            data: compressed,
            pos: 0,
        };
        let mut opcode1 = src.read_u8()?;

        if (opcode1 & 0xF0) == 0 {
            let count = Self::literal_count(opcode1, &mut src)? + 3;
            opcode1 = Self::copy(count, &mut src, dst, limit)?;
        }

        while opcode1 != 0x11 {
            let mut comp_offset = 0usize;
            let compressed_bytes: usize;

            if !(0x10..0x40).contains(&opcode1) {
                compressed_bytes = (opcode1 as usize >> 4).saturating_sub(1);
                let opcode2 = src.read_u8()?;
                comp_offset = (((opcode1 as usize >> 2) & 0x3) | ((opcode2 as usize) << 2)) + 1;
            } else if opcode1 < 0x20 {
                compressed_bytes = Self::read_compressed_bytes(opcode1, 0b0111, &mut src)?;
                comp_offset = (opcode1 as usize & 0x8) << 11;
                opcode1 = Self::two_byte_offset(&mut comp_offset, 0x4000, &mut src)?;
            } else {
                compressed_bytes = Self::read_compressed_bytes(opcode1, 0b0001_1111, &mut src)?;
                opcode1 = Self::two_byte_offset(&mut comp_offset, 1, &mut src)?;
            }

            if comp_offset == 0 || comp_offset > dst.len() {
                return Err(DwgError::Decompression(format!(
                    "back reference offset {comp_offset} with {} bytes decoded",
                    dst.len()
                )));
            }
            if dst.len() + compressed_bytes > limit {
                return Err(DwgError::Decompression(format!(
                    "output exceeds {limit} bytes"
                )));
            }

            // Source and destination may overlap; copy forward one byte at a time.
            let start = dst.len() - comp_offset;
            for i in 0..compressed_bytes {
                let b = dst[start + i];
                dst.push(b);
            }

            let mut lit_count = opcode1 as usize & 0x3;
            if lit_count == 0 {
                opcode1 = src.read_u8()?;
                if (opcode1 & 0xF0) == 0 {
                    lit_count = Self::literal_count(opcode1, &mut src)? + 3;
                }
            }

            if lit_count > 0 {
                opcode1 = Self::copy(lit_count, &mut src, dst, limit)?;
            }
        }

        Ok(())
    }

    fn copy(count: usize, src: &mut Source<'_>, dst: &mut Vec<u8>, limit: usize) -> Result<u8> {
        if dst.len() + count > limit {
            return Err(DwgError::Decompression(format!("output exceeds {limit} bytes")));
        }
        dst.extend_from_slice(src.take(count)?);
        src.read_u8()
    }

    fn literal_count(code: u8, src: &mut Source<'_>) -> Result<usize> {
        let mut lowbits = (code & 0x0F) as usize;
        if lowbits == 0 {
            loop {
                let b = src.read_u8()?;
                if b == 0 {
                    lowbits += 0xFF;
                } else {
                    lowbits += 0x0F + b as usize;
                    break;
                }
            }
        }
        Ok(lowbits)
    }

    fn read_compressed_bytes(opcode1: u8, valid_bits: u8, src: &mut Source<'_>) -> Result<usize> {
        let mut compressed_bytes = (opcode1 & valid_bits) as usize;

        if compressed_bytes == 0 {
            loop {
                let b = src.read_u8()?;
                if b == 0 {
                    compressed_bytes += 0xFF;
                } else {
                    compressed_bytes += b as usize + valid_bits as usize;
                    break;
                }
            }
        }

        Ok(compressed_bytes + 2)
    }

    fn two_byte_offset(offset: &mut usize, added_value: usize, src: &mut Source<'_>) -> Result<u8> {
        let first = src.read_u8()?;
        let second = src.read_u8()?;

        *offset |= (first as usize) >> 2;
        *offset |= (second as usize) << 6;
        *offset += added_value;

        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only() {
        // 0x02: 2 + 3 literals, then terminator.
        let data = [0x02, b'a', b'b', b'c', b'd', b'e', 0x11];
        let out = DwgLz77Ac18Decompressor::decompress(&data, 16).unwrap();
        assert_eq!(out, b"abcde");
    }

    #[test]
    fn test_overlapping_back_reference() {
        // 4 literals, then opcode 0x50: copy 4 bytes from offset 1, lit bits 0.
        let data = [0x01, b'a', b'b', b'c', b'x', 0x50, 0x00, 0x11];
        let out = DwgLz77Ac18Decompressor::decompress(&data, 16).unwrap();
        assert_eq!(out, b"abcxxxxx");
    }

    #[test]
    fn test_long_offset_form() {
        // 0x22: copy 4 bytes, offset from two bytes (0x0C >> 2) + 1 = 4, lit bits 0.
        let data = [0x01, b'w', b'x', b'y', b'z', 0x22, 0x0C, 0x00, 0x11];
        let out = DwgLz77Ac18Decompressor::decompress(&data, 16).unwrap();
        assert_eq!(out, b"wxyzwxyz");
    }

    #[test]
    fn test_bad_offset_is_error() {
        let data = [0x01, b'a', b'b', b'c', b'd', 0x50, 0x40, 0x11];
        assert!(matches!(
            DwgLz77Ac18Decompressor::decompress(&data, 64),
            Err(DwgError::Decompression(_))
        ));
    }

    #[test]
    fn test_output_limit() {
        let data = [0x02, b'a', b'b', b'c', b'd', b'e', 0x11];
        assert!(DwgLz77Ac18Decompressor::decompress(&data, 3).is_err());
    }

    #[test]
    fn test_truncated_input() {
        assert!(DwgLz77Ac18Decompressor::decompress(&[0x05, b'a'], 16).is_err());
        assert!(DwgLz77Ac18Decompressor::decompress(&[], 16).is_err());
    }
}
