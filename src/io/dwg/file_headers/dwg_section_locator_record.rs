//! Section locator records of the direct-layout (R13 to R2000) file header.

use std::fmt;

/// Location and size of one section in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DwgSectionLocatorRecord {
    /// Record number: 0 header, 1 classes, 2 object map, 3 free space,
    /// 4 template, 5 auxiliary header.
    pub number: u8,
    /// Absolute byte offset of the section.
    pub seeker: u64,
    /// Size in bytes.
    pub size: u64,
}

impl DwgSectionLocatorRecord {
    pub fn new(number: u8, seeker: u64, size: u64) -> Self {
        Self {
            number,
            seeker,
            size,
        }
    }

    /// One past the last byte of the section.
    pub fn end(&self) -> u64 {
        self.seeker.saturating_add(self.size)
    }

    /// Check if a position falls within this record.
    pub fn is_in_the_record(&self, position: u64) -> bool {
        position >= self.seeker && position < self.end()
    }

    /// `true` when the whole range lies inside a buffer of `length` bytes.
    pub fn fits(&self, length: u64) -> bool {
        self.seeker.checked_add(self.size).is_some_and(|end| end <= length)
    }
}

impl fmt::Display for DwgSectionLocatorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number : {} | Seeker : {} | Size : {}",
            self.number, self.seeker, self.size
        )
    }
}
