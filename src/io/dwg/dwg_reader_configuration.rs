//! Configuration for reading DWG files.

/// Configuration options for the DWG reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwgReaderConfiguration {
    /// Compare stored section checksums with recomputed ones.
    /// Default: `true`.
    ///
    /// The checksum bytes are read either way so the cursor lands on the
    /// same position; only the comparison is skipped.
    pub crc_check: bool,

    /// Read the preview (thumbnail) section when the header points at one.
    /// Default: `true`.
    pub read_preview: bool,

    /// Link object references to objects after the object map is read.
    /// Default: `true`.
    pub resolve_references: bool,
}

impl Default for DwgReaderConfiguration {
    fn default() -> Self {
        Self {
            crc_check: true,
            read_preview: true,
            resolve_references: true,
        }
    }
}
