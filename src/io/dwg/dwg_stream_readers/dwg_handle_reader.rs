use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace};

use crate::document::DwgDocument;
use crate::error::{DwgError, Result};
use crate::io::dwg::dwg_checksum_calculator::{crc8, CRC_SEED};
use crate::io::dwg::dwg_section_transport::DwgSectionTransport;
use crate::io::dwg::file_headers::{DwgFileHeaderAC18, DwgSectionDefinition, DwgSectionLocatorRecord};
use crate::notification::NotificationType;
use crate::types::DwgVersion;

use super::dwg_object_reader::DwgObjectReader;
use super::dwg_stream_reader_base::DwgStreamReaderBase;
use super::idwg_stream_reader::DwgStreamReader;

/// Largest object map chunk of a direct-layout file.
pub const MAX_CHUNK_SIZE: u64 = 2035;
/// Largest object map chunk of a compressed-section file.
pub const MAX_COMPRESSED_CHUNK_SIZE: u64 = 2034;

/// Walks the object map (handle section) and decodes every record it points
/// at.
///
/// The map is a run of chunks. Each chunk starts with its big-endian byte
/// size (the size field included), holds `MC` handle and offset deltas that
/// restart from zero in every chunk, and ends with a big-endian CRC.
pub struct DwgHandleReader {
    version: DwgVersion,
    crc_check: bool,
}

/// Limits that differ between the two file layouts.
struct MapRules {
    max_chunk_size: u64,
    /// An oversized chunk aborts the map instead of being reported.
    oversize_is_fatal: bool,
    check_crc: bool,
}

impl DwgHandleReader {
    pub fn new(version: DwgVersion, crc_check: bool) -> Self {
        Self { version, crc_check }
    }

    /// Read the object map of an R13–R2000 file.
    ///
    /// `reader` spans the whole file; record offsets are absolute. Returns
    /// the number of records added. Records decoded before an error stay in
    /// the drawing.
    pub fn read_r13_r15(
        &self,
        reader: &DwgStreamReaderBase,
        locator: &DwgSectionLocatorRecord,
        doc: &mut DwgDocument,
    ) -> Result<usize> {
        if !locator.fits(reader.length()) {
            return Err(DwgError::malformed(
                DwgSectionDefinition::HANDLES,
                locator.seeker,
                format!("object map of {} bytes does not fit the file", locator.size),
            ));
        }

        let mut map = reader.fork();
        map.set_position(locator.seeker);
        let mut objects = reader.fork();
        let rules = MapRules {
            max_chunk_size: MAX_CHUNK_SIZE,
            oversize_is_fatal: true,
            check_crc: self.crc_check,
        };
        self.walk(&mut map, locator.end(), &mut objects, &rules, doc)
    }

    /// Read the object map of an R2004 file.
    ///
    /// Both the object data and the handle section are rebuilt first; if
    /// either fails nothing is decoded. Record offsets are relative to the
    /// object data section.
    pub fn read_compressed(
        &self,
        transport: &DwgSectionTransport<'_>,
        header: &DwgFileHeaderAC18,
        doc: &mut DwgDocument,
    ) -> Result<usize> {
        let mut objects = transport.read_section(header, DwgSectionDefinition::ACDB_OBJECTS)?;
        let mut map = transport.read_section(header, DwgSectionDefinition::HANDLES)?;
        let end = map.length();
        let rules = MapRules {
            max_chunk_size: MAX_COMPRESSED_CHUNK_SIZE,
            oversize_is_fatal: false,
            check_crc: false,
        };
        self.walk(&mut map, end, &mut objects, &rules, doc)
    }

    fn walk(
        &self,
        map: &mut DwgStreamReaderBase,
        map_end: u64,
        objects: &mut DwgStreamReaderBase,
        rules: &MapRules,
        doc: &mut DwgDocument,
    ) -> Result<usize> {
        let section = DwgSectionDefinition::HANDLES;
        let object_reader = DwgObjectReader::new(self.version);
        let mut added = 0usize;

        loop {
            let chunk_start = map.position();
            let size = BigEndian::read_u16(&map.read_bytes(2)?) as u64;
            trace!(offset = chunk_start, size, "object map chunk");

            if size > rules.max_chunk_size {
                if rules.oversize_is_fatal {
                    return Err(DwgError::malformed(
                        section,
                        chunk_start,
                        format!("chunk size {size} exceeds {}", rules.max_chunk_size),
                    ));
                }
                doc.notifications.notify(
                    NotificationType::Warning,
                    format!(
                        "Object map chunk at 0x{chunk_start:X}: size {size} exceeds {}",
                        rules.max_chunk_size
                    ),
                );
            }

            let mut last_handle: i64 = 0;
            let mut last_offset: i64 = 0;
            let mut stalled = false;
            while map.position() - chunk_start < size {
                let before = map.position_in_bits();
                last_handle = last_handle.wrapping_add(map.read_modular_char()?);
                last_offset = last_offset.wrapping_add(map.read_modular_char()?);
                if last_offset < 0 {
                    return Err(DwgError::malformed(
                        section,
                        map.position(),
                        format!("negative object offset {last_offset}"),
                    ));
                }

                let index = object_reader.add_object(objects, last_offset as u64, doc);
                added += 1;
                trace!(handle = last_handle, offset = last_offset, index, "map entry");

                if map.position_in_bits() == before {
                    stalled = true;
                    break;
                }
            }
            if stalled {
                break;
            }

            map.align_to_byte();
            let crc_position = map.position();
            let stored = BigEndian::read_u16(&map.read_bytes(2)?);
            if rules.check_crc {
                let chunk = map
                    .buffer()
                    .get(chunk_start as usize..(chunk_start + size) as usize)
                    .ok_or_else(|| {
                        DwgError::malformed(section, chunk_start, "chunk overruns the section")
                    })?;
                let computed = crc8(CRC_SEED, chunk);
                if stored != computed {
                    return Err(DwgError::SectionIntegrity {
                        section: section.to_string(),
                        offset: crc_position,
                        expected: stored,
                        actual: computed,
                    });
                }
            }

            if map.position() >= map_end || size <= 2 {
                break;
            }
        }

        debug!(objects = added, "object map read");
        Ok(added)
    }
}
