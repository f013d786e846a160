//! DWG file reader: version dispatch and section orchestration.
//!
//! The reader detects the release from the first six bytes, parses the file
//! header of that release family and then decodes the sections it knows
//! about: preview, classes and the object map (which pulls in every object
//! record). Section failures are recorded as notifications on the returned
//! [`DwgDocument`]; only an unusable file header or an unknown version tag
//! make a read fail.

use std::fs;
use std::io::Read;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::document::{DwgDocument, DwgSectionInfo};
use crate::error::{DwgError, Result};
use crate::notification::NotificationType;
use crate::types::DwgVersion;

use super::dwg_reader_configuration::DwgReaderConfiguration;
use super::dwg_section_io::{check_sentinel, DwgSectionContext};
use super::dwg_section_transport::DwgSectionTransport;
use super::dwg_stream_readers::{
    DwgClassesReader, DwgHandleReader, DwgPreviewReader, DwgStreamReader, DwgStreamReaderBase,
};
use super::file_headers::{
    DwgFileHeader, DwgFileHeaderAC15, DwgFileHeaderAC18, DwgSectionDefinition,
    DwgSectionLocatorRecord, FILE_HEADER_END_SENTINEL,
};

/// Locator number of the record holding the MEASUREMENT value.
const MEASUREMENT_LOCATOR: u8 = 4;

/// Reads DWG drawings into [`DwgDocument`]s.
///
/// # Usage
///
/// ```rust,no_run
/// use dwg_tools_rs::{DwgReader, DwgReaderConfiguration};
///
/// let doc = DwgReader::read_from_file("drawing.dwg", DwgReaderConfiguration::default()).unwrap();
/// println!("{} objects", doc.num_objects());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DwgReader {
    configuration: DwgReaderConfiguration,
}

impl DwgReader {
    pub fn new(configuration: DwgReaderConfiguration) -> Self {
        Self { configuration }
    }

    /// Read a drawing from disk.
    pub fn read_from_file(
        path: impl AsRef<Path>,
        configuration: DwgReaderConfiguration,
    ) -> Result<DwgDocument> {
        let bytes = fs::read(path.as_ref())?;
        Self::new(configuration).read(&bytes)
    }

    /// Read a drawing from any byte stream.
    pub fn read_from_stream<R: Read>(
        mut stream: R,
        configuration: DwgReaderConfiguration,
    ) -> Result<DwgDocument> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Self::new(configuration).read(&bytes)
    }

    /// Read a drawing held in memory.
    pub fn read_from_bytes(
        bytes: &[u8],
        configuration: DwgReaderConfiguration,
    ) -> Result<DwgDocument> {
        Self::new(configuration).read(bytes)
    }

    /// Decode independent drawings in parallel.
    ///
    /// Each drawing gets its own document and reference table; results are in
    /// input order.
    pub fn read_batch<B>(buffers: &[B], configuration: DwgReaderConfiguration) -> Vec<Result<DwgDocument>>
    where
        B: AsRef<[u8]> + Sync,
    {
        buffers
            .par_iter()
            .map(|buffer| Self::new(configuration).read(buffer.as_ref()))
            .collect()
    }

    /// Release of the drawing in `buffer`, from its six byte tag.
    pub fn detect_version(buffer: &[u8]) -> Result<DwgVersion> {
        let tag = buffer
            .get(..6)
            .ok_or_else(|| DwgError::InvalidHeader(format!("{} bytes is too short for a version tag", buffer.len())))?;
        DwgVersion::from_tag(tag)
            .ok_or_else(|| DwgError::UnsupportedVersion(String::from_utf8_lossy(tag).into_owned()))
    }

    /// Decode one drawing.
    pub fn read(&self, buffer: &[u8]) -> Result<DwgDocument> {
        let version = Self::detect_version(buffer)?;
        info!(version = version.as_str(), release = version.release_name(), "reading drawing");

        let mut doc = DwgDocument::new();
        doc.header.version = Some(version);
        if version.r13_14_only() {
            doc.notifications.notify(
                NotificationType::Warning,
                format!(
                    "Unverified version {} ({}), decoded with R13/R14 rules",
                    version.as_str(),
                    version.release_name()
                ),
            );
        }

        let mut header = DwgFileHeader::parse(buffer, version)?;
        doc.header.maintenance_version = header.maintenance_version;
        doc.header.code_page = header.code_page;
        doc.header.preview_address = header.preview_address;

        if version.r2007_plus() {
            self.decode_r2007(&header, &mut doc);
        } else if version.r2004_plus() {
            self.decode_r2004(buffer, &mut header, &mut doc);
        } else {
            self.decode_r13_r15(buffer, &header, &mut doc);
        }

        if self.configuration.resolve_references && !doc.object_refs.is_empty() {
            let linked = doc.resolve_object_refs();
            debug!(linked, refs = doc.num_object_refs(), "references resolved");
        }

        info!(
            classes = doc.num_classes(),
            objects = doc.num_objects(),
            refs = doc.num_object_refs(),
            notifications = doc.notifications.len(),
            "drawing read"
        );
        Ok(doc)
    }

    fn decode_r13_r15(&self, buffer: &[u8], header: &DwgFileHeader, doc: &mut DwgDocument) {
        let Some(ac15) = header.as_ac15() else {
            return;
        };
        let version = header.version;
        self.check_ac15_header(ac15, doc);

        let mut locators = Vec::with_capacity(ac15.records.len());
        for record in &ac15.records {
            if !record.fits(buffer.len() as u64) {
                doc.notifications.notify(
                    NotificationType::Warning,
                    format!("Section locator {record} lies outside the file, dropped"),
                );
                continue;
            }
            let name = DwgSectionDefinition::get_section_name_by_locator(record.number)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Section{}", record.number));
            doc.header.sections.insert(
                name,
                DwgSectionInfo {
                    number: record.number as u32,
                    address: record.seeker,
                    size: record.size,
                },
            );
            locators.push(*record);
        }
        let locator = |number: u8| -> Option<DwgSectionLocatorRecord> {
            locators.iter().find(|r| r.number == number).copied()
        };

        let mut reader = DwgStreamReaderBase::new(buffer, version);
        reader.set_code_page(header.code_page);

        if self.configuration.read_preview && header.preview_address > 0 {
            let preview_reader = DwgPreviewReader::new(
                DwgSectionContext::new(version, DwgSectionDefinition::PREVIEW),
                0,
            );
            match preview_reader.read(&mut reader, header.preview_address, &mut doc.notifications) {
                Ok(preview) => doc.preview = Some(preview),
                Err(error) => doc.notifications.notify_error(&error),
            }
        }

        match locator(1) {
            Some(classes) => {
                let classes_reader = DwgClassesReader::new(
                    DwgSectionContext::new(version, DwgSectionDefinition::CLASSES),
                    self.configuration.crc_check,
                );
                if let Err(error) = classes_reader.read_r13_r15(&mut reader, &classes, doc) {
                    doc.notifications.notify_error(&error);
                }
            }
            None => Self::missing_section(doc, DwgSectionDefinition::CLASSES),
        }

        match locator(2) {
            Some(handles) => {
                let handle_reader = DwgHandleReader::new(version, self.configuration.crc_check);
                if let Err(error) = handle_reader.read_r13_r15(&reader, &handles, doc) {
                    doc.notifications.notify_error(&error);
                }
            }
            None => Self::missing_section(doc, DwgSectionDefinition::HANDLES),
        }

        if let Some(record) = locator(MEASUREMENT_LOCATOR).filter(|r| r.size >= 4) {
            reader.set_position(record.seeker);
            match reader.read_raw_long() {
                Ok(measurement) => doc.header.measurement = Some(measurement),
                Err(error) => doc.notifications.notify_error(&error),
            }
        }
    }

    fn check_ac15_header(&self, ac15: &DwgFileHeaderAC15, doc: &mut DwgDocument) {
        if self.configuration.crc_check && !ac15.crc_matches() {
            doc.notifications.notify(
                NotificationType::Warning,
                format!(
                    "File header CRC mismatch: stored 0x{:04X}, computed 0x{:04X}",
                    ac15.stored_crc, ac15.computed_crc
                ),
            );
        }
        if !check_sentinel(&ac15.end_sentinel, &FILE_HEADER_END_SENTINEL) {
            doc.notifications.notify(
                NotificationType::Warning,
                "File header end sentinel does not match",
            );
        }
    }

    fn decode_r2004(&self, buffer: &[u8], header: &mut DwgFileHeader, doc: &mut DwgDocument) {
        let version = header.version;
        let code_page = header.code_page;
        let preview_address = header.preview_address;
        let Some(ac18) = header.as_ac18_mut() else {
            return;
        };
        doc.header.dwg_version = ac18.dwg_version;
        doc.header.app_release_version = ac18.app_release_version;
        doc.header.security_type = ac18.security_type;
        doc.header.summary_info_address = ac18.summary_info_addr as u64;
        doc.header.vba_project_address = ac18.vba_project_addr as u64;
        doc.header.app_info_address = ac18.app_info_addr as u64;
        if !ac18.file_id_matches() {
            doc.notifications.notify(
                NotificationType::Warning,
                "Encrypted file header does not carry the expected file id",
            );
        }

        let transport = DwgSectionTransport::new(buffer, version, code_page, self.configuration.crc_check);
        if let Err(error) = transport
            .read_page_map(ac18)
            .and_then(|_| transport.read_section_map(ac18))
        {
            doc.notifications.notify_error(&error);
            return;
        }
        let ac18: &DwgFileHeaderAC18 = ac18;

        for descriptor in ac18.descriptors.values() {
            doc.header.sections.insert(
                descriptor.name.clone(),
                DwgSectionInfo {
                    number: descriptor.section_id,
                    address: 0,
                    size: descriptor.size,
                },
            );
        }

        if self.configuration.read_preview && ac18.descriptors.contains_key(DwgSectionDefinition::PREVIEW) {
            let preview = transport
                .read_section(ac18, DwgSectionDefinition::PREVIEW)
                .and_then(|mut section| {
                    DwgPreviewReader::new(
                        DwgSectionContext::new(version, DwgSectionDefinition::PREVIEW),
                        preview_address,
                    )
                    .read(&mut section, 0, &mut doc.notifications)
                });
            match preview {
                Ok(preview) => doc.preview = Some(preview),
                Err(error) => doc.notifications.notify_error(&error),
            }
        }

        let classes = transport
            .read_section(ac18, DwgSectionDefinition::CLASSES)
            .and_then(|mut section| {
                DwgClassesReader::new(
                    DwgSectionContext::new(version, DwgSectionDefinition::CLASSES),
                    self.configuration.crc_check,
                )
                .read_r2004(&mut section, doc)
            });
        if let Err(error) = classes {
            doc.notifications.notify_error(&error);
        }

        let handle_reader = DwgHandleReader::new(version, self.configuration.crc_check);
        if let Err(error) = handle_reader.read_compressed(&transport, ac18, doc) {
            doc.notifications.notify_error(&error);
        }
    }

    fn decode_r2007(&self, header: &DwgFileHeader, doc: &mut DwgDocument) {
        if let Some(ac21) = header.as_ac21() {
            doc.header.dwg_version = ac21.dwg_version;
            doc.header.app_release_version = ac21.app_release_version;
            doc.header.security_type = ac21.security_type;
            doc.header.summary_info_address = ac21.summary_info_addr as u64;
            doc.header.vba_project_address = ac21.vba_project_addr as u64;
            doc.header.app_info_address = ac21.app_info_addr as u64;
            debug!(
                security_type = ac21.security_type,
                summary_info = ac21.summary_info_addr,
                app_info = ac21.app_info_addr,
                "r2007 file header"
            );
        }
        warn!("R2007 section streams are not decoded");
        doc.notifications.notify_error(&DwgError::NotImplemented(
            "R2007 (AC1021) sections are not decoded; only the file header was read".to_string(),
        ));
    }

    fn missing_section(doc: &mut DwgDocument, name: &str) {
        doc.notifications.notify(
            NotificationType::Warning,
            format!("Section {name} is not in the file header"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_version_tags() {
        for (tag, version) in [
            (b"AC1012", DwgVersion::AC1012),
            (b"AC1014", DwgVersion::AC1014),
            (b"AC1015", DwgVersion::AC1015),
            (b"AC1018", DwgVersion::AC1018),
            (b"AC1021", DwgVersion::AC1021),
        ] {
            let mut buffer = tag.to_vec();
            buffer.extend([0u8; 10]);
            assert_eq!(DwgReader::detect_version(&buffer).unwrap(), version);
        }
    }

    #[test]
    fn test_detect_version_unsupported() {
        assert!(matches!(
            DwgReader::detect_version(b"AC1024\0\0"),
            Err(DwgError::UnsupportedVersion(tag)) if tag == "AC1024"
        ));
        assert!(matches!(
            DwgReader::detect_version(b"NOTDWG"),
            Err(DwgError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_detect_version_too_short() {
        assert!(matches!(
            DwgReader::detect_version(b"AC10"),
            Err(DwgError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_r2007_is_header_only() {
        let mut buffer = b"AC1021".to_vec();
        buffer.resize(0x100, 0);
        let doc = DwgReader::read_from_bytes(&buffer, DwgReaderConfiguration::default()).unwrap();
        assert_eq!(doc.version(), Some(DwgVersion::AC1021));
        assert_eq!(doc.notifications.of_type(NotificationType::NotImplemented).count(), 1);
        assert_eq!(doc.num_objects(), 0);
    }

    #[test]
    fn test_r2007_header_fields_are_kept() {
        let mut buffer = b"AC1021".to_vec();
        buffer.resize(0x100, 0);
        buffer[0x0B] = 3; // maintenance release
        buffer[0x11] = 0x1F; // dwg version
        buffer[0x12] = 0x19; // app release
        buffer[0x13..0x15].copy_from_slice(&30u16.to_le_bytes());
        buffer[0x18..0x1C].copy_from_slice(&1u32.to_le_bytes());
        buffer[0x20..0x24].copy_from_slice(&0x1C0u32.to_le_bytes());
        buffer[0x24..0x28].copy_from_slice(&0x2A0u32.to_le_bytes());
        buffer[0x2C..0x30].copy_from_slice(&0x200u32.to_le_bytes());

        let doc = DwgReader::read_from_bytes(&buffer, DwgReaderConfiguration::default()).unwrap();
        let header = &doc.header;
        assert_eq!(header.maintenance_version, 3);
        assert_eq!(header.dwg_version, 0x1F);
        assert_eq!(header.app_release_version, 0x19);
        assert_eq!(header.code_page.0, 30);
        assert_eq!(header.security_type, 1);
        assert_eq!(header.summary_info_address, 0x1C0);
        assert_eq!(header.vba_project_address, 0x2A0);
        assert_eq!(header.app_info_address, 0x200);
        assert_eq!(doc.notifications.of_type(NotificationType::NotImplemented).count(), 1);
    }
}
