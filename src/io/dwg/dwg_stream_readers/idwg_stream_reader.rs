use crate::error::Result;
use crate::types::{CodePage, DwgVersion, Handle};

/// Reader contract for DWG bit streams.
///
/// A reader is a byte position plus a bit offset (0..8, most significant bit
/// first) into an owned buffer. Every read advances the cursor; reads never go
/// past the buffer and fail with [`DwgError::EndOfStream`] instead.
///
/// [`DwgError::EndOfStream`]: crate::error::DwgError::EndOfStream
pub trait DwgStreamReader {
    fn version(&self) -> DwgVersion;
    fn code_page(&self) -> CodePage;
    fn set_code_page(&mut self, code_page: CodePage);

    /// Buffer length in bytes.
    fn length(&self) -> u64;
    fn bit_shift(&self) -> u8;

    fn position(&self) -> u64;
    /// Move to an absolute byte offset and clear the bit offset.
    fn set_position(&mut self, value: u64);

    fn position_in_bits(&self) -> u64;
    fn set_position_in_bits(&mut self, value: u64);

    /// Move by a signed number of bits.
    fn advance_bits(&mut self, bits: i64) -> Result<()>;
    /// Skip to the next byte boundary if the bit offset is not zero.
    fn align_to_byte(&mut self);

    /// `B`
    fn read_bit(&mut self) -> Result<bool>;
    /// `BB`
    fn read_2_bits(&mut self) -> Result<u8>;
    /// `RC`
    fn read_raw_char(&mut self) -> Result<u8>;
    /// `RS`, little endian.
    fn read_raw_short(&mut self) -> Result<i16>;
    /// `RL`, little endian.
    fn read_raw_long(&mut self) -> Result<u32>;
    /// `RD`
    fn read_double(&mut self) -> Result<f64>;

    /// `BS`
    fn read_bit_short(&mut self) -> Result<i16>;
    /// `BL`
    fn read_bit_long(&mut self) -> Result<i32>;
    /// `BD`
    fn read_bit_double(&mut self) -> Result<f64>;

    /// `MC`, signed.
    fn read_modular_char(&mut self) -> Result<i64>;
    /// `MS`
    fn read_modular_short(&mut self) -> Result<u32>;

    /// `H`
    fn read_handle(&mut self) -> Result<Handle>;
    /// `TV`
    fn read_variable_text(&mut self) -> Result<String>;
    /// `CMC` color index.
    fn read_cm_color(&mut self) -> Result<i16>;

    fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>>;
    fn read_sentinel(&mut self) -> Result<[u8; 16]>;

    /// Scan forward for `sentinel`, leaving the cursor right after it.
    fn search_sentinel(&mut self, sentinel: &[u8; 16]) -> bool;
}
