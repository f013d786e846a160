//! Bit writer used by the reader unit tests.

/// MSB-first bit packer producing the encodings the cursor reads.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bit: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_written(&self) -> u64 {
        if self.bit == 0 {
            self.bytes.len() as u64 * 8
        } else {
            (self.bytes.len() as u64 - 1) * 8 + self.bit as u64
        }
    }

    pub fn push(&mut self, value: u64, count: u8) -> &mut Self {
        for i in (0..count).rev() {
            if self.bit == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> self.bit;
            }
            self.bit = (self.bit + 1) % 8;
        }
        self
    }

    pub fn b(&mut self, value: bool) -> &mut Self {
        self.push(value as u64, 1)
    }

    pub fn bb(&mut self, value: u8) -> &mut Self {
        self.push(value as u64, 2)
    }

    pub fn rc(&mut self, value: u8) -> &mut Self {
        self.push(value as u64, 8)
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        for &b in data {
            self.rc(b);
        }
        self
    }

    pub fn rs(&mut self, value: u16) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn rl(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn rd(&mut self, value: f64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn bs(&mut self, value: u16) -> &mut Self {
        match value {
            0 => self.bb(0b10),
            256 => self.bb(0b11),
            1..=255 => self.bb(0b01).rc(value as u8),
            _ => self.bb(0b00).rs(value),
        }
    }

    pub fn bl(&mut self, value: u32) -> &mut Self {
        match value {
            0 => self.bb(0b10),
            1..=255 => self.bb(0b01).rc(value as u8),
            _ => self.bb(0b00).rl(value),
        }
    }

    pub fn bd(&mut self, value: f64) -> &mut Self {
        if value == 0.0 {
            self.bb(0b10)
        } else if value == 1.0 {
            self.bb(0b01)
        } else {
            self.bb(0b00).rd(value)
        }
    }

    /// Handle with the minimal number of value bytes.
    pub fn h(&mut self, code: u8, value: u64) -> &mut Self {
        let size = (8 - value.leading_zeros() / 8) as u8;
        let size = if value == 0 { 0 } else { size };
        self.rc((code << 4) | size);
        for i in (0..size).rev() {
            self.rc((value >> (i * 8)) as u8);
        }
        self
    }

    pub fn tv(&mut self, text: &str) -> &mut Self {
        self.bs(text.len() as u16);
        self.bytes(text.as_bytes())
    }

    pub fn finish(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}
