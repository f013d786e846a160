use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{DwgError, Result};
use crate::types::{CodePage, DwgVersion, Handle};

use super::idwg_stream_reader::DwgStreamReader;

/// Bit cursor over an in-memory buffer.
///
/// The buffer is shared, so [`fork`](Self::fork) gives an independent cursor
/// over the same bytes (used to read an object's handle stream while its data
/// stream is still being decoded).
#[derive(Debug, Clone)]
pub struct DwgStreamReaderBase {
    buffer: Arc<[u8]>,
    version: DwgVersion,
    code_page: CodePage,
    byte: usize,
    bit: u8,
}

impl DwgStreamReaderBase {
    pub fn new(buffer: impl Into<Arc<[u8]>>, version: DwgVersion) -> Self {
        Self {
            buffer: buffer.into(),
            version,
            code_page: CodePage::default(),
            byte: 0,
            bit: 0,
        }
    }

    /// Independent cursor over the same buffer, at the same position.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Bits left between the cursor and the end of the buffer.
    pub fn remaining_bits(&self) -> u64 {
        (self.buffer.len() as u64 * 8).saturating_sub(self.position_in_bits())
    }

    fn end_of_stream(&self) -> DwgError {
        DwgError::EndOfStream {
            position: self.position_in_bits(),
            length: self.buffer.len() as u64,
        }
    }

    fn byte_at(&self, index: usize) -> Result<u8> {
        self.buffer
            .get(index)
            .copied()
            .ok_or_else(|| self.end_of_stream())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        if self.bit == 0 {
            let end = self.byte.checked_add(N).ok_or_else(|| self.end_of_stream())?;
            let slice = self
                .buffer
                .get(self.byte..end)
                .ok_or_else(|| self.end_of_stream())?;
            bytes.copy_from_slice(slice);
            self.byte = end;
        } else {
            for b in bytes.iter_mut() {
                *b = self.read_raw_char()?;
            }
        }
        Ok(bytes)
    }

    fn handle_error(&self, position: u64, reason: impl Into<String>) -> DwgError {
        DwgError::HandleDecode {
            position,
            reason: reason.into(),
        }
    }
}

impl DwgStreamReader for DwgStreamReaderBase {
    fn version(&self) -> DwgVersion {
        self.version
    }

    fn code_page(&self) -> CodePage {
        self.code_page
    }

    fn set_code_page(&mut self, code_page: CodePage) {
        self.code_page = code_page;
    }

    fn length(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn bit_shift(&self) -> u8 {
        self.bit
    }

    fn position(&self) -> u64 {
        self.byte as u64
    }

    fn set_position(&mut self, value: u64) {
        self.byte = usize::try_from(value).unwrap_or(usize::MAX);
        self.bit = 0;
    }

    fn position_in_bits(&self) -> u64 {
        self.byte as u64 * 8 + self.bit as u64
    }

    fn set_position_in_bits(&mut self, value: u64) {
        self.byte = usize::try_from(value / 8).unwrap_or(usize::MAX);
        self.bit = (value % 8) as u8;
    }

    fn advance_bits(&mut self, bits: i64) -> Result<()> {
        let target = (self.position_in_bits() as i64)
            .checked_add(bits)
            .filter(|t| *t >= 0)
            .ok_or_else(|| DwgError::Parse(format!("cannot move cursor by {bits} bits")))?;
        self.set_position_in_bits(target as u64);
        Ok(())
    }

    fn align_to_byte(&mut self) {
        if self.bit > 0 {
            self.bit = 0;
            self.byte = self.byte.saturating_add(1);
        }
    }

    fn read_bit(&mut self) -> Result<bool> {
        let current = self.byte_at(self.byte)?;
        let value = (current >> (7 - self.bit)) & 1 == 1;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }
        Ok(value)
    }

    fn read_2_bits(&mut self) -> Result<u8> {
        let high = self.read_bit()? as u8;
        let low = self.read_bit()? as u8;
        Ok((high << 1) | low)
    }

    fn read_raw_char(&mut self) -> Result<u8> {
        let high = self.byte_at(self.byte)?;
        if self.bit == 0 {
            self.byte += 1;
            return Ok(high);
        }
        let low = self.byte_at(self.byte + 1)?;
        self.byte += 1;
        Ok((high << self.bit) | (low >> (8 - self.bit)))
    }

    fn read_raw_short(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(&self.read_array::<2>()?))
    }

    fn read_raw_long(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(&self.read_array::<8>()?))
    }

    fn read_bit_short(&mut self) -> Result<i16> {
        match self.read_2_bits()? {
            0 => self.read_raw_short(),
            1 => Ok(self.read_raw_char()? as i16),
            2 => Ok(0),
            _ => Ok(256),
        }
    }

    fn read_bit_long(&mut self) -> Result<i32> {
        match self.read_2_bits()? {
            0 => Ok(self.read_raw_long()? as i32),
            1 => Ok(self.read_raw_char()? as i32),
            2 => Ok(0),
            _ => Err(DwgError::Parse(format!(
                "invalid BL code 3 at bit {}",
                self.position_in_bits() - 2
            ))),
        }
    }

    fn read_bit_double(&mut self) -> Result<f64> {
        match self.read_2_bits()? {
            0 => self.read_double(),
            1 => Ok(1.0),
            2 => Ok(0.0),
            _ => Err(DwgError::Parse(format!(
                "invalid BD code 3 at bit {}",
                self.position_in_bits() - 2
            ))),
        }
    }

    fn read_modular_char(&mut self) -> Result<i64> {
        let start = self.position_in_bits();
        let mut result: u64 = 0;
        for shift in (0..35).step_by(7) {
            let b = self.read_raw_char()?;
            if b & 0x80 == 0 {
                let negative = b & 0x40 != 0;
                result |= ((b & 0x3F) as u64) << shift;
                let value = result as i64;
                return Ok(if negative { -value } else { value });
            }
            result |= ((b & 0x7F) as u64) << shift;
        }
        Err(DwgError::Parse(format!(
            "modular char at bit {start} longer than 5 bytes"
        )))
    }

    fn read_modular_short(&mut self) -> Result<u32> {
        let start = self.position_in_bits();
        let mut result: u32 = 0;
        for shift in [0u32, 15] {
            let word = self.read_raw_short()? as u16;
            if word & 0x8000 == 0 {
                result |= (word as u32) << shift;
                return Ok(result);
            }
            result |= ((word & 0x7FFF) as u32) << shift;
        }
        Err(DwgError::Parse(format!(
            "modular short at bit {start} longer than 2 words"
        )))
    }

    fn read_handle(&mut self) -> Result<Handle> {
        let start = self.position_in_bits();
        let encoded = self
            .read_raw_char()
            .map_err(|_| self.handle_error(start, "stream ends before handle"))?;
        let code = encoded >> 4;
        let size = encoded & 0x0F;
        if size > 8 {
            return Err(self.handle_error(start, format!("handle size {size} exceeds 8 bytes")));
        }

        let mut value = 0u64;
        for _ in 0..size {
            let b = self
                .read_raw_char()
                .map_err(|_| self.handle_error(start, "stream ends inside handle value"))?;
            value = (value << 8) | b as u64;
        }
        Ok(Handle { code, size, value })
    }

    fn read_variable_text(&mut self) -> Result<String> {
        let length = self.read_bit_short()?;
        if length < 0 {
            return Err(DwgError::Parse(format!("negative text length {length}")));
        }
        let bytes = self.read_bytes(length as usize)?;
        Ok(self.code_page.decode(&bytes))
    }

    fn read_cm_color(&mut self) -> Result<i16> {
        self.read_bit_short()
    }

    fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }
        if (length as u64).saturating_mul(8) > self.remaining_bits() {
            return Err(self.end_of_stream());
        }
        if self.bit == 0 {
            let end = self.byte + length;
            let bytes = self.buffer[self.byte..end].to_vec();
            self.byte = end;
            return Ok(bytes);
        }
        (0..length).map(|_| self.read_raw_char()).collect()
    }

    fn read_sentinel(&mut self) -> Result<[u8; 16]> {
        self.read_array::<16>()
    }

    fn search_sentinel(&mut self, sentinel: &[u8; 16]) -> bool {
        let start = self.byte.min(self.buffer.len());
        match self.buffer[start..]
            .windows(sentinel.len())
            .position(|window| window == sentinel)
        {
            Some(found) => {
                self.byte = start + found + sentinel.len();
                self.bit = 0;
                true
            }
            None => false,
        }
    }
}
