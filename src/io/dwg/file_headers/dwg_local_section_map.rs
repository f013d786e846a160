//! Pages of R2004 paged sections.

/// One page of the file.
///
/// Entries of the page map only carry `page_number`, `seeker` and `size`.
/// Pages listed by a section descriptor additionally carry the compressed
/// `data_size` and the `offset` of their data inside the rebuilt section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DwgLocalSectionMap {
    /// Page number; negative numbers mark gaps in the page map.
    pub page_number: i32,
    /// Absolute file position of the page.
    pub seeker: u64,
    /// Size of the page in the file.
    pub size: u64,
    /// Compressed bytes stored in the page.
    pub data_size: u32,
    /// Offset of this page within the section data.
    pub offset: u64,
}

impl DwgLocalSectionMap {
    pub fn new(page_number: i32, seeker: u64, size: u64) -> Self {
        Self {
            page_number,
            seeker,
            size,
            ..Default::default()
        }
    }

    /// `true` for gap entries of the page map.
    pub fn is_gap(&self) -> bool {
        self.page_number < 0
    }
}
