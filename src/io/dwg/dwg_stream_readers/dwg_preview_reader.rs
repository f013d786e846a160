use tracing::{debug, trace};

use crate::error::{DwgError, Result};
use crate::io::dwg::dwg_section_io::{check_sentinel_from_reader, DwgSectionContext};
use crate::io::dwg::file_headers::{end_sentinel, start_sentinel, DwgSectionDefinition};
use crate::notification::{NotificationCollection, NotificationType};

use super::idwg_stream_reader::DwgStreamReader;

/// Format of the preview image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewType {
    #[default]
    Unknown,
    Bmp,
    Wmf,
}

/// Thumbnail stored in the preview section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DwgPreview {
    pub code: PreviewType,
    /// Header entry (code 1), usually 80 bytes.
    pub raw_header: Vec<u8>,
    pub raw_image: Vec<u8>,
}

impl DwgPreview {
    pub fn is_empty(&self) -> bool {
        self.raw_header.is_empty() && self.raw_image.is_empty()
    }
}

/// One entry of the preview directory.
#[derive(Debug, Clone, Copy)]
struct PreviewEntry {
    code: u8,
    start: u64,
    size: u64,
}

/// Reads the preview section.
///
/// Layout: start sentinel, `RL` overall size, `RC` entry count, then per
/// entry `RC` code, `RL` start and `RL` size. Entry starts are file
/// offsets; `base` is the file offset of the reader's first byte.
pub struct DwgPreviewReader {
    ctx: DwgSectionContext,
    base: u64,
}

impl DwgPreviewReader {
    pub fn new(ctx: DwgSectionContext, base: u64) -> Self {
        Self { ctx, base }
    }

    pub fn read(
        &self,
        reader: &mut dyn DwgStreamReader,
        address: u64,
        notifications: &mut NotificationCollection,
    ) -> Result<DwgPreview> {
        let section = DwgSectionDefinition::PREVIEW;
        reader.set_position(address);
        check_sentinel_from_reader(reader, &start_sentinel(section), &self.ctx, notifications);

        let overall_size = reader.read_raw_long()? as u64;
        let data_start = reader.position();
        let count = reader.read_raw_char()?;
        trace!(overall_size, count, "preview directory");

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(PreviewEntry {
                code: reader.read_raw_char()?,
                start: reader.read_raw_long()? as u64,
                size: reader.read_raw_long()? as u64,
            });
        }

        let mut preview = DwgPreview::default();
        for entry in entries {
            let kind = match entry.code {
                1 => None,
                2 => Some(PreviewType::Bmp),
                3 => Some(PreviewType::Wmf),
                other => {
                    notifications.notify(
                        NotificationType::Warning,
                        format!("Preview entry with unknown code {other} skipped"),
                    );
                    continue;
                }
            };

            let bytes = self.entry_bytes(reader, &entry)?;
            match kind {
                None => preview.raw_header = bytes,
                Some(kind) => {
                    preview.code = kind;
                    preview.raw_image = bytes;
                }
            }
        }

        let end = data_start.saturating_add(overall_size);
        if end < reader.length() {
            reader.set_position(end);
            check_sentinel_from_reader(reader, &end_sentinel(section), &self.ctx, notifications);
        }
        debug!(
            kind = ?preview.code,
            header = preview.raw_header.len(),
            image = preview.raw_image.len(),
            "preview read"
        );
        Ok(preview)
    }

    fn entry_bytes(&self, reader: &mut dyn DwgStreamReader, entry: &PreviewEntry) -> Result<Vec<u8>> {
        let position = entry
            .start
            .checked_sub(self.base)
            .filter(|p| p.saturating_add(entry.size) <= reader.length())
            .ok_or_else(|| {
                DwgError::malformed(
                    DwgSectionDefinition::PREVIEW,
                    entry.start,
                    format!("entry {} of {} bytes is outside the section", entry.code, entry.size),
                )
            })?;
        reader.set_position(position);
        reader.read_bytes(entry.size as usize)
    }
}
