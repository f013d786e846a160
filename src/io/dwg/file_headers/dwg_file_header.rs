//! DWG file header structures for all supported versions.
//!
//! The DWG binary format has different file header layouts depending on the
//! AutoCAD version:
//!
//! - **AC15** (R13 / R14 / R2000): record-based section locators
//! - **AC18** (R2004): encrypted header pointing at a page map and a section map
//! - **AC21** (R2007): fixed fields only; the remainder is Reed-Solomon coded
//!
//! All layouts share the first 0x15 bytes. Parsing is done with `nom` on the
//! raw bytes; no bit cursor is involved.

use indexmap::IndexMap;
use nom::bytes::complete::take;
use nom::number::complete::{le_i32, le_u16, le_u32, le_u64, le_u8};
use nom::IResult;

use crate::error::{DwgError, Result};
use crate::io::dwg::dwg_checksum_calculator::{self, MAGIC_SEQUENCE};
use crate::types::{CodePage, DwgVersion};

use super::{DwgLocalSectionMap, DwgSectionDescriptor, DwgSectionLocatorRecord};

/// Offset of the encrypted R2004 header.
pub const AC18_ENCRYPTED_HEADER_OFFSET: usize = 0x80;
/// Size of the encrypted R2004 header.
pub const AC18_ENCRYPTED_HEADER_SIZE: usize = 0x6C;
/// File id at the start of the decrypted R2004 header.
pub const AC18_FILE_ID: &[u8; 12] = b"AcFssFcAJMB\0";

type NomError<'a> = nom::Err<nom::error::Error<&'a [u8]>>;

fn header_error(context: &str) -> impl Fn(NomError<'_>) -> DwgError + '_ {
    move |e| DwgError::InvalidHeader(format!("{context}: {:?}", e.map(|inner| inner.code)))
}

// ── Shared prefix ─────────────────────────────────────────────────────────

/// Fields at 0x00..0x15, identical in every release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CommonPrefix {
    maintenance_version: u8,
    preview_address: u32,
    dwg_version: u8,
    app_release_version: u8,
    code_page: u16,
}

fn common_prefix(input: &[u8]) -> IResult<&[u8], CommonPrefix> {
    let (input, _tag) = take(6usize)(input)?;
    let (input, _zeros) = take(5usize)(input)?;
    let (input, maintenance_version) = le_u8(input)?;
    let (input, _one) = le_u8(input)?;
    let (input, preview_address) = le_u32(input)?;
    let (input, dwg_version) = le_u8(input)?;
    let (input, app_release_version) = le_u8(input)?;
    let (input, code_page) = le_u16(input)?;
    Ok((
        input,
        CommonPrefix {
            maintenance_version,
            preview_address,
            dwg_version,
            app_release_version,
            code_page,
        },
    ))
}

// ── AC15 file header (R13 / R14 / R2000) ──────────────────────────────────

/// File header data specific to AC15 (R13/R14/R2000).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwgFileHeaderAC15 {
    /// Section locators in file order.
    pub records: Vec<DwgSectionLocatorRecord>,
    /// CRC stored after the records.
    pub stored_crc: u16,
    /// CRC recomputed over the header bytes, with the record-count mask applied.
    pub computed_crc: u16,
    /// Sentinel following the CRC.
    pub end_sentinel: [u8; 16],
}

impl DwgFileHeaderAC15 {
    /// Locator with the given number.
    pub fn record(&self, number: u8) -> Option<&DwgSectionLocatorRecord> {
        self.records.iter().find(|r| r.number == number)
    }

    pub fn crc_matches(&self) -> bool {
        self.stored_crc == self.computed_crc
    }

    fn parse(buffer: &[u8]) -> Result<(CommonPrefix, Self)> {
        let (rest, prefix) = common_prefix(buffer).map_err(header_error("file header"))?;
        let (mut rest, count) = le_u32::<_, nom::error::Error<&[u8]>>(rest)
            .map_err(header_error("locator count"))?;

        // Each record takes 9 bytes; refuse counts the buffer cannot hold.
        if count as usize > rest.len() / 9 {
            return Err(DwgError::InvalidHeader(format!(
                "{count} section locators do not fit in {} bytes",
                buffer.len()
            )));
        }

        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (next, (number, seeker, size)) = locator(rest).map_err(header_error("locator"))?;
            records.push(DwgSectionLocatorRecord::new(number, seeker as u64, size as u64));
            rest = next;
        }

        let crc_position = buffer.len() - rest.len();
        let (rest, stored_crc) = le_u16::<_, nom::error::Error<&[u8]>>(rest)
            .map_err(header_error("header CRC"))?;
        let (_, sentinel) = take::<_, _, nom::error::Error<&[u8]>>(16usize)(rest)
            .map_err(header_error("header sentinel"))?;

        let computed_crc = dwg_checksum_calculator::crc8(
            dwg_checksum_calculator::CRC_SEED,
            &buffer[..crc_position],
        ) ^ dwg_checksum_calculator::header_crc_mask(count);

        let mut end_sentinel = [0u8; 16];
        end_sentinel.copy_from_slice(sentinel);

        Ok((
            prefix,
            Self {
                records,
                stored_crc,
                computed_crc,
                end_sentinel,
            },
        ))
    }
}

fn locator(input: &[u8]) -> IResult<&[u8], (u8, u32, u32)> {
    let (input, number) = le_u8(input)?;
    let (input, seeker) = le_u32(input)?;
    let (input, size) = le_u32(input)?;
    Ok((input, (number, seeker, size)))
}

// ── AC18 file header (R2004) ──────────────────────────────────────────────

/// File header data for AC18 (R2004).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwgFileHeaderAC18 {
    /// DWG internal version byte.
    pub dwg_version: u8,
    /// Application release version byte.
    pub app_release_version: u8,
    /// Security type flag.
    pub security_type: u32,
    /// Address of the summary info section.
    pub summary_info_addr: u32,
    /// Address of the VBA project section.
    pub vba_project_addr: u32,
    /// Address of the app info section.
    pub app_info_addr: u32,
    /// File id from the decrypted header.
    pub file_id: [u8; 12],
    /// Root tree node gap.
    pub root_tree_node_gap: i32,
    /// Left gap.
    pub left_gap: i32,
    /// Right gap.
    pub right_gap: i32,
    /// Last page id.
    pub last_page_id: i32,
    /// Last section address.
    pub last_section_addr: u64,
    /// Second header address.
    pub second_header_addr: u64,
    /// Number of gaps.
    pub gap_amount: u32,
    /// Number of sections.
    pub section_amount: u32,
    /// Section page map id.
    pub section_page_map_id: u32,
    /// Page map address, already shifted by 0x100.
    pub page_map_address: u64,
    /// Section map id.
    pub section_map_id: u32,
    /// Section array page size.
    pub section_array_page_size: u32,
    /// Gap array size.
    pub gap_array_size: u32,
    /// CRC32 of the decrypted header.
    pub crc32: u32,
    /// Page map entries in file order.
    pub page_map: Vec<DwgLocalSectionMap>,
    /// Named section descriptors in section map order.
    pub descriptors: IndexMap<String, DwgSectionDescriptor>,
}

impl DwgFileHeaderAC18 {
    /// `true` when the decrypted header starts with the expected file id.
    pub fn file_id_matches(&self) -> bool {
        &self.file_id == AC18_FILE_ID
    }

    /// Page map entry of a page number.
    pub fn page(&self, page_number: i32) -> Option<&DwgLocalSectionMap> {
        self.page_map.iter().find(|p| p.page_number == page_number)
    }

    fn parse(buffer: &[u8]) -> Result<(CommonPrefix, Self)> {
        let (rest, prefix) = common_prefix(buffer).map_err(header_error("file header"))?;
        let (_, tail) = fixed_tail(rest).map_err(header_error("file header"))?;

        let encrypted = buffer
            .get(AC18_ENCRYPTED_HEADER_OFFSET..AC18_ENCRYPTED_HEADER_OFFSET + AC18_ENCRYPTED_HEADER_SIZE)
            .ok_or_else(|| {
                DwgError::InvalidHeader(format!(
                    "file of {} bytes is too short for the encrypted header",
                    buffer.len()
                ))
            })?;
        let decrypted: Vec<u8> = encrypted
            .iter()
            .zip(MAGIC_SEQUENCE.iter())
            .map(|(b, m)| b ^ m)
            .collect();

        let (_, mut header) =
            encrypted_header(&decrypted).map_err(header_error("encrypted header"))?;
        header.dwg_version = prefix.dwg_version;
        header.app_release_version = prefix.app_release_version;
        header.security_type = tail.security_type;
        header.summary_info_addr = tail.summary_info_addr;
        header.vba_project_addr = tail.vba_project_addr;
        header.app_info_addr = tail.app_info_addr;
        Ok((prefix, header))
    }
}

/// Fields at 0x15..0x30 of R2004 and R2007 files.
#[derive(Debug, Clone, Copy, Default)]
struct FixedTail {
    security_type: u32,
    summary_info_addr: u32,
    vba_project_addr: u32,
    app_info_addr: u32,
}

fn fixed_tail(input: &[u8]) -> IResult<&[u8], FixedTail> {
    let (input, _zeros) = take(3usize)(input)?;
    let (input, security_type) = le_u32(input)?;
    let (input, _unknown) = le_u32(input)?;
    let (input, summary_info_addr) = le_u32(input)?;
    let (input, vba_project_addr) = le_u32(input)?;
    let (input, _x80) = le_u32(input)?;
    let (input, app_info_addr) = le_u32(input)?;
    Ok((
        input,
        FixedTail {
            security_type,
            summary_info_addr,
            vba_project_addr,
            app_info_addr,
        },
    ))
}

fn encrypted_header(input: &[u8]) -> IResult<&[u8], DwgFileHeaderAC18> {
    let (input, id) = take(12usize)(input)?;
    let (input, _zero) = le_u32(input)?;
    let (input, _x6c) = le_u32(input)?;
    let (input, _x04) = le_u32(input)?;
    let (input, root_tree_node_gap) = le_i32(input)?;
    let (input, left_gap) = le_i32(input)?;
    let (input, right_gap) = le_i32(input)?;
    let (input, _unknown) = le_u32(input)?;
    let (input, last_page_id) = le_i32(input)?;
    let (input, last_section_addr) = le_u64(input)?;
    let (input, second_header_addr) = le_u64(input)?;
    let (input, gap_amount) = le_u32(input)?;
    let (input, section_amount) = le_u32(input)?;
    let (input, _x20) = le_u32(input)?;
    let (input, _x80) = le_u32(input)?;
    let (input, _x40) = le_u32(input)?;
    let (input, section_page_map_id) = le_u32(input)?;
    let (input, page_map_address) = le_u64(input)?;
    let (input, section_map_id) = le_u32(input)?;
    let (input, section_array_page_size) = le_u32(input)?;
    let (input, gap_array_size) = le_u32(input)?;
    let (input, crc32) = le_u32(input)?;

    let mut file_id = [0u8; 12];
    file_id.copy_from_slice(id);

    Ok((
        input,
        DwgFileHeaderAC18 {
            file_id,
            root_tree_node_gap,
            left_gap,
            right_gap,
            last_page_id,
            last_section_addr,
            second_header_addr,
            gap_amount,
            section_amount,
            section_page_map_id,
            page_map_address: page_map_address.saturating_add(0x100),
            section_map_id,
            section_array_page_size,
            gap_array_size,
            crc32,
            ..Default::default()
        },
    ))
}

// ── AC21 file header (R2007) ──────────────────────────────────────────────

/// Fixed file header fields of AC21 (R2007).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwgFileHeaderAC21 {
    pub dwg_version: u8,
    pub app_release_version: u8,
    pub security_type: u32,
    pub summary_info_addr: u32,
    pub vba_project_addr: u32,
    pub app_info_addr: u32,
}

impl DwgFileHeaderAC21 {
    fn parse(buffer: &[u8]) -> Result<(CommonPrefix, Self)> {
        let (rest, prefix) = common_prefix(buffer).map_err(header_error("file header"))?;
        let (_, tail) = fixed_tail(rest).map_err(header_error("file header"))?;
        Ok((
            prefix,
            Self {
                dwg_version: prefix.dwg_version,
                app_release_version: prefix.app_release_version,
                security_type: tail.security_type,
                summary_info_addr: tail.summary_info_addr,
                vba_project_addr: tail.vba_project_addr,
                app_info_addr: tail.app_info_addr,
            },
        ))
    }
}

// ── Unified DWG file header ────────────────────────────────────────────────

/// Unified DWG file header that holds version-specific data.
#[derive(Debug, Clone, PartialEq)]
pub struct DwgFileHeader {
    /// The AutoCAD version of this file.
    pub version: DwgVersion,
    /// Address of the preview image (0 if absent).
    pub preview_address: u64,
    /// AutoCAD maintenance version number.
    pub maintenance_version: u8,
    /// Drawing code page.
    pub code_page: CodePage,
    /// Version-specific header data.
    pub data: DwgFileHeaderData,
}

/// Version-specific portion of a [`DwgFileHeader`].
#[derive(Debug, Clone, PartialEq)]
pub enum DwgFileHeaderData {
    /// AC15 (R13 / R14 / R2000) header data.
    AC15(DwgFileHeaderAC15),
    /// AC18 (R2004) header data.
    AC18(DwgFileHeaderAC18),
    /// AC21 (R2007) header data.
    AC21(DwgFileHeaderAC21),
}

impl DwgFileHeader {
    /// Parse the file header of `buffer` for an already detected version.
    pub fn parse(buffer: &[u8], version: DwgVersion) -> Result<Self> {
        let (prefix, data) = if version.r2007_plus() {
            let (prefix, data) = DwgFileHeaderAC21::parse(buffer)?;
            (prefix, DwgFileHeaderData::AC21(data))
        } else if version.r2004_plus() {
            let (prefix, data) = DwgFileHeaderAC18::parse(buffer)?;
            (prefix, DwgFileHeaderData::AC18(data))
        } else {
            let (prefix, data) = DwgFileHeaderAC15::parse(buffer)?;
            (prefix, DwgFileHeaderData::AC15(data))
        };

        Ok(Self {
            version,
            preview_address: prefix.preview_address as u64,
            maintenance_version: prefix.maintenance_version,
            code_page: CodePage(prefix.code_page),
            data,
        })
    }

    /// Get a reference to the AC15 data, if this is an AC15 header.
    pub fn as_ac15(&self) -> Option<&DwgFileHeaderAC15> {
        match &self.data {
            DwgFileHeaderData::AC15(ac15) => Some(ac15),
            _ => None,
        }
    }

    /// Get a reference to the AC18 data, if available.
    pub fn as_ac18(&self) -> Option<&DwgFileHeaderAC18> {
        match &self.data {
            DwgFileHeaderData::AC18(ac18) => Some(ac18),
            _ => None,
        }
    }

    /// Get a mutable reference to the AC18 data, if available.
    pub fn as_ac18_mut(&mut self) -> Option<&mut DwgFileHeaderAC18> {
        match &mut self.data {
            DwgFileHeaderData::AC18(ac18) => Some(ac18),
            _ => None,
        }
    }

    /// Get a reference to the AC21 data, if this is an AC21 header.
    pub fn as_ac21(&self) -> Option<&DwgFileHeaderAC21> {
        match &self.data {
            DwgFileHeaderData::AC21(ac21) => Some(ac21),
            _ => None,
        }
    }

    /// Get a section descriptor by name.
    ///
    /// Returns `None` for AC15 headers or if the section is not found.
    pub fn get_descriptor(&self, name: &str) -> Option<&DwgSectionDescriptor> {
        self.as_ac18().and_then(|ac18| ac18.descriptors.get(name))
    }
}
