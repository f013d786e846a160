use tracing::{debug, trace};

use crate::classes::DwgClass;
use crate::document::DwgDocument;
use crate::error::{DwgError, Result};
use crate::io::dwg::dwg_checksum_calculator::{crc8, CRC_SEED};
use crate::io::dwg::dwg_section_io::{check_sentinel_from_reader, DwgSectionContext};
use crate::io::dwg::file_headers::{end_sentinel, start_sentinel, DwgSectionDefinition, DwgSectionLocatorRecord};

use super::idwg_stream_reader::DwgStreamReader;

/// Bytes outside the class data of a direct-layout classes section: start
/// sentinel, size, CRC and end sentinel.
const R13_FRAME_SIZE: u64 = 16 + 4 + 2 + 16;

/// Reads DWG class records.
pub struct DwgClassesReader {
    ctx: DwgSectionContext,
    crc_check: bool,
}

impl DwgClassesReader {
    pub fn new(ctx: DwgSectionContext, crc_check: bool) -> Self {
        Self { ctx, crc_check }
    }

    /// Read the classes section of an R13–R2000 file.
    ///
    /// `reader` spans the whole file. Classes are appended to `doc` as they
    /// are read; a checksum mismatch is returned after the loop, so every
    /// class read so far stays in the table.
    pub fn read_r13_r15(
        &self,
        reader: &mut dyn DwgStreamReader,
        locator: &DwgSectionLocatorRecord,
        doc: &mut DwgDocument,
    ) -> Result<()> {
        let section = DwgSectionDefinition::CLASSES;
        if locator.size < R13_FRAME_SIZE || !locator.fits(reader.length()) {
            return Err(DwgError::malformed(
                section,
                locator.seeker,
                format!("section of {} bytes does not fit the file", locator.size),
            ));
        }

        reader.set_position(locator.seeker);
        check_sentinel_from_reader(
            reader,
            &start_sentinel(section),
            &self.ctx,
            &mut doc.notifications,
        );

        let size = reader.read_raw_long()? as u64;
        let lasta = reader.position() + size;
        if lasta > locator.end() {
            return Err(DwgError::malformed(
                section,
                locator.seeker,
                format!("class data of {size} bytes overruns the section"),
            ));
        }
        trace!(size, lasta, "classes data");

        while reader.position() < lasta.saturating_sub(1) {
            let class = self.read_class(reader, false)?;
            doc.classes.add(class);
        }
        debug!(count = doc.classes.len(), "classes read");

        // The CRC covers the size field and the class data.
        let crc_position = locator.seeker + locator.size - 18;
        reader.set_position(crc_position);
        let stored = reader.read_raw_short()? as u16;
        if self.crc_check {
            let start = (locator.seeker + 16) as usize;
            let computed = crc8(CRC_SEED, &reader_bytes(reader, start, crc_position as usize)?);
            if stored != computed {
                return Err(DwgError::SectionIntegrity {
                    section: section.to_string(),
                    offset: crc_position,
                    expected: stored,
                    actual: computed,
                });
            }
        }

        check_sentinel_from_reader(
            reader,
            &end_sentinel(section),
            &self.ctx,
            &mut doc.notifications,
        );
        Ok(())
    }

    /// Read the classes section of an R2004 file from its rebuilt buffer.
    pub fn read_r2004(&self, reader: &mut dyn DwgStreamReader, doc: &mut DwgDocument) -> Result<()> {
        let section = DwgSectionDefinition::CLASSES;
        if !reader.search_sentinel(&start_sentinel(section)) {
            return Err(DwgError::malformed(section, 0, "start sentinel not found"));
        }

        let size = reader.read_raw_long()? as u64;
        let end = reader.position() + size;
        if end > reader.length() {
            return Err(DwgError::malformed(
                section,
                reader.position(),
                format!("class data of {size} bytes overruns the section"),
            ));
        }

        let max_num = reader.read_bit_short()?;
        // Two zero bytes and a flag bit.
        reader.read_raw_char()?;
        reader.read_raw_char()?;
        reader.read_bit()?;
        trace!(size, max_num, "classes data");
        doc.classes.set_max_class_number(max_num);

        while reader.position() < end.saturating_sub(1) {
            let class = self.read_class(reader, true)?;
            doc.classes.add(class);
        }
        debug!(count = doc.classes.len(), "classes read");
        Ok(())
    }

    fn read_class(&self, reader: &mut dyn DwgStreamReader, extended: bool) -> Result<DwgClass> {
        let mut class = DwgClass {
            number: reader.read_bit_short()?,
            version: reader.read_bit_short()?,
            app_name: reader.read_variable_text()?,
            cpp_name: reader.read_variable_text()?,
            dxf_name: reader.read_variable_text()?,
            was_zombie: reader.read_bit()?,
            item_class_id: reader.read_bit_short()?,
            ..Default::default()
        };

        if extended {
            class.num_objects = reader.read_bit_long()?;
            class.dwg_version = reader.read_bit_short()?;
            class.maintenance_version = reader.read_bit_short()?;
            let _unknown1 = reader.read_bit_long()?;
            let _unknown2 = reader.read_bit_long()?;
        }

        trace!(
            number = class.number,
            dxf_name = %class.dxf_name,
            item_class_id = class.item_class_id,
            "class"
        );
        Ok(class)
    }
}

/// Copy bytes `[start, end)` without moving the cursor.
fn reader_bytes(reader: &mut dyn DwgStreamReader, start: usize, end: usize) -> Result<Vec<u8>> {
    let saved = reader.position_in_bits();
    reader.set_position(start as u64);
    let bytes = reader.read_bytes(end.saturating_sub(start));
    reader.set_position_in_bits(saved);
    bytes
}
