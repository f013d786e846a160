//! DWG section descriptor for R2004 page-based sections.

use super::DwgLocalSectionMap;

/// Page type marker of data pages.
pub const DATA_PAGE_TYPE: u32 = 0x4163043B;

/// Describes a named section of an R2004 file.
///
/// The section data is the concatenation of its pages, each page being
/// decompressed into a block of `max_decompressed_size` bytes placed at the
/// page's offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DwgSectionDescriptor {
    /// Section name (e.g., `"AcDb:Header"`).
    pub name: String,
    /// Total section size once rebuilt.
    pub size: u64,
    /// Number of pages for this section.
    pub page_count: u32,
    /// Decompressed size of one page (usually `0x7400`).
    pub max_decompressed_size: u32,
    /// Compression code: 1 = uncompressed, 2 = compressed.
    pub compressed_code: u32,
    /// Section id.
    pub section_id: u32,
    /// Encryption flag.
    pub encrypted: u32,
    /// Pages that belong to this section.
    pub local_sections: Vec<DwgLocalSectionMap>,
}

impl Default for DwgSectionDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: 0,
            page_count: 0,
            max_decompressed_size: 0x7400,
            compressed_code: 2,
            section_id: 0,
            encrypted: 0,
            local_sections: Vec::new(),
        }
    }
}

impl DwgSectionDescriptor {
    /// Create a new section descriptor with a given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns `true` if this section uses compression (code == 2).
    pub fn is_compressed(&self) -> bool {
        self.compressed_code == 2
    }
}
