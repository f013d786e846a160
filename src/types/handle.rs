//! Handles as stored in the bit stream.

use std::fmt;

/// A handle as read from the stream: reference code, byte count and value.
///
/// The code tells how the value relates to the handle of the record that
/// owns the reference (see [`Handle::resolve`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    pub code: u8,
    pub size: u8,
    pub value: u64,
}

impl Handle {
    /// Soft pointer, owner-independent.
    pub const SOFT_POINTER: u8 = 0x02;
    /// Hard pointer, owner-independent.
    pub const HARD_POINTER: u8 = 0x03;
    /// Soft owner, owner-independent.
    pub const SOFT_OWNER: u8 = 0x04;
    /// Hard owner, owner-independent.
    pub const HARD_OWNER: u8 = 0x05;
    /// Owner handle plus one.
    pub const NEXT: u8 = 0x06;
    /// Owner handle minus one.
    pub const PREVIOUS: u8 = 0x08;
    /// Owner handle plus the value.
    pub const FORWARD_OFFSET: u8 = 0x0A;
    /// Owner handle minus the value.
    pub const BACKWARD_OFFSET: u8 = 0x0C;

    pub fn new(code: u8, value: u64) -> Self {
        let size = (8 - value.leading_zeros() / 8) as u8;
        Self { code, size, value }
    }

    /// `true` for the null handle.
    pub fn is_null(&self) -> bool {
        self.value == 0
    }

    /// Absolute handle this reference points to.
    ///
    /// Without an owner the raw value is taken as absolute. Arithmetic wraps
    /// so that hostile values never panic.
    pub fn resolve(&self, owner: Option<&Handle>) -> u64 {
        let Some(owner) = owner else {
            return self.value;
        };
        match self.code {
            Self::NEXT => owner.value.wrapping_add(1),
            Self::PREVIOUS => owner.value.wrapping_sub(1),
            Self::FORWARD_OFFSET => owner.value.wrapping_add(self.value),
            Self::BACKWARD_OFFSET => owner.value.wrapping_sub(self.value),
            _ => self.value,
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{:X}", self.code, self.size, self.value)
    }
}
