//! Page-based section transport of R2004 files.
//!
//! An R2004 file is a sequence of pages starting at 0x100. Two system pages
//! describe the rest: the page map (page number → file position) and the
//! section map (section name → ordered list of pages). A named section is
//! rebuilt by decrypting each data page header, decompressing the page and
//! placing it at its offset in a fresh buffer.

use nom::bytes::complete::take;
use nom::number::complete::{le_i32, le_u32, le_u64};
use nom::IResult;
use tracing::{debug, trace};

use crate::error::{DwgError, Result};
use crate::types::{CodePage, DwgVersion};

use super::dwg_checksum_calculator;
use super::dwg_stream_readers::{DwgLz77Ac18Decompressor, DwgStreamReader, DwgStreamReaderBase};
use super::file_headers::{
    DwgFileHeaderAC18, DwgLocalSectionMap, DwgSectionDescriptor, DATA_PAGE_TYPE,
};

/// System page type of the page map.
pub const PAGE_MAP_TYPE: u32 = 0x4163_0E3B;
/// System page type of the section map.
pub const SECTION_MAP_TYPE: u32 = 0x4163_003B;
/// XOR key of data page headers, combined with the page address.
pub const DATA_PAGE_HEADER_KEY: u32 = 0x4164_536B;
/// Encrypted header in front of every data page.
pub const DATA_PAGE_HEADER_SIZE: u64 = 32;
/// Largest section buffer the transport will allocate.
pub const MAX_SECTION_SIZE: u64 = 0x1000_0000;

const SYSTEM_PAGE_HEADER_SIZE: u64 = 20;

type NomError<'a> = nom::Err<nom::error::Error<&'a [u8]>>;

fn parse_error<'a>(section: &'a str) -> impl Fn(NomError<'_>) -> DwgError + 'a {
    move |e| DwgError::transport(section, format!("{:?}", e.map(|inner| inner.code)))
}

/// Header of a system page (page map or section map).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemPageHeader {
    pub page_type: u32,
    pub decompressed_size: u32,
    pub compressed_size: u32,
    pub compression_type: u32,
    pub checksum: u32,
}

fn system_page_header(input: &[u8]) -> IResult<&[u8], SystemPageHeader> {
    let (input, page_type) = le_u32(input)?;
    let (input, decompressed_size) = le_u32(input)?;
    let (input, compressed_size) = le_u32(input)?;
    let (input, compression_type) = le_u32(input)?;
    let (input, checksum) = le_u32(input)?;
    Ok((
        input,
        SystemPageHeader {
            page_type,
            decompressed_size,
            compressed_size,
            compression_type,
            checksum,
        },
    ))
}

/// Decrypted header of a data page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPageHeader {
    pub page_type: u32,
    pub section_number: u32,
    pub compressed_size: u32,
    pub page_size: u32,
    pub start_offset: u32,
    pub header_checksum: u32,
    pub data_checksum: u32,
}

impl DataPageHeader {
    /// Decrypt the 32 header bytes of the page stored at `address`.
    pub fn decrypt(raw: &[u8], address: u64) -> Option<Self> {
        if raw.len() < DATA_PAGE_HEADER_SIZE as usize {
            return None;
        }
        let key = DATA_PAGE_HEADER_KEY ^ (address as u32);
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(raw.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ key;
        }
        Some(Self {
            page_type: words[0],
            section_number: words[1],
            compressed_size: words[2],
            page_size: words[3],
            start_offset: words[4],
            header_checksum: words[5],
            data_checksum: words[6],
        })
    }
}

/// Rebuilds named sections of an R2004 file.
pub struct DwgSectionTransport<'a> {
    buffer: &'a [u8],
    version: DwgVersion,
    code_page: CodePage,
    crc_check: bool,
}

impl<'a> DwgSectionTransport<'a> {
    pub fn new(buffer: &'a [u8], version: DwgVersion, code_page: CodePage, crc_check: bool) -> Self {
        Self {
            buffer,
            version,
            code_page,
            crc_check,
        }
    }

    fn slice(&self, section: &str, start: u64, length: u64) -> Result<&'a [u8]> {
        let end = start
            .checked_add(length)
            .filter(|&end| end <= self.buffer.len() as u64)
            .ok_or_else(|| {
                DwgError::transport(
                    section,
                    format!(
                        "range 0x{start:X}+{length} exceeds file of {} bytes",
                        self.buffer.len()
                    ),
                )
            })?;
        Ok(&self.buffer[start as usize..end as usize])
    }

    /// Read and decompress a system page at `address`.
    fn read_system_page(&self, section: &str, address: u64, expected_type: u32) -> Result<Vec<u8>> {
        let raw = self.slice(section, address, SYSTEM_PAGE_HEADER_SIZE)?;
        let (_, header) = system_page_header(raw).map_err(parse_error(section))?;

        if header.page_type != expected_type {
            return Err(DwgError::transport(
                section,
                format!(
                    "page type 0x{:08X} at 0x{address:X}, expected 0x{expected_type:08X}",
                    header.page_type
                ),
            ));
        }
        if header.decompressed_size as u64 > MAX_SECTION_SIZE {
            return Err(DwgError::transport(
                section,
                format!("declared size {} is too large", header.decompressed_size),
            ));
        }

        let data = self.slice(
            section,
            address + SYSTEM_PAGE_HEADER_SIZE,
            header.compressed_size as u64,
        )?;
        trace!(
            section,
            address,
            compressed = header.compressed_size,
            decompressed = header.decompressed_size,
            "system page"
        );

        match header.compression_type {
            2 => DwgLz77Ac18Decompressor::decompress(data, header.decompressed_size as usize)
                .map_err(|e| DwgError::transport(section, e.to_string())),
            _ => Ok(data.to_vec()),
        }
    }

    /// Fill `header.page_map` from the page map system page.
    pub fn read_page_map(&self, header: &mut DwgFileHeaderAC18) -> Result<()> {
        const SECTION: &str = "PageMap";
        let data = self.read_system_page(SECTION, header.page_map_address, PAGE_MAP_TYPE)?;

        let mut pages = Vec::new();
        let mut address: u64 = 0x100;
        let mut input = data.as_slice();
        while input.len() >= 8 {
            let (rest, (number, size)) = page_map_entry(input).map_err(parse_error(SECTION))?;
            input = rest;
            pages.push(DwgLocalSectionMap::new(number, address, size as u64));
            address = address.saturating_add(size as u64);

            if number < 0 {
                // Gap entries carry parent, left, right and a zero.
                let (rest, _) = take::<_, _, nom::error::Error<&[u8]>>(16usize)(input)
                    .map_err(parse_error(SECTION))?;
                input = rest;
            }
        }

        debug!(pages = pages.len(), "page map read");
        header.page_map = pages;
        Ok(())
    }

    /// Fill `header.descriptors` from the section map system page.
    ///
    /// The page map must have been read first.
    pub fn read_section_map(&self, header: &mut DwgFileHeaderAC18) -> Result<()> {
        const SECTION: &str = "SectionMap";
        let page = header
            .page(header.section_map_id as i32)
            .copied()
            .ok_or_else(|| {
                DwgError::transport(
                    SECTION,
                    format!("page {} is not in the page map", header.section_map_id),
                )
            })?;
        let data = self.read_system_page(SECTION, page.seeker, SECTION_MAP_TYPE)?;

        let (mut input, count) = section_map_header(&data).map_err(parse_error(SECTION))?;
        header.descriptors.clear();

        for _ in 0..count {
            let (rest, mut descriptor) = section_descriptor(input).map_err(parse_error(SECTION))?;
            input = rest;

            // 16 bytes per page entry; refuse counts the data cannot hold.
            if descriptor.page_count as usize > input.len() / 16 {
                return Err(DwgError::transport(
                    SECTION,
                    format!(
                        "section {} declares {} pages",
                        descriptor.name, descriptor.page_count
                    ),
                ));
            }

            for _ in 0..descriptor.page_count {
                let (rest, (number, data_size, offset)) =
                    section_page(input).map_err(parse_error(SECTION))?;
                input = rest;

                let mut local = header
                    .page(number)
                    .copied()
                    .unwrap_or_else(|| DwgLocalSectionMap::new(number, 0, 0));
                local.data_size = data_size;
                local.offset = offset;
                descriptor.local_sections.push(local);
            }

            trace!(
                name = %descriptor.name,
                id = descriptor.section_id,
                pages = descriptor.page_count,
                size = descriptor.size,
                "section descriptor"
            );
            header.descriptors.insert(descriptor.name.clone(), descriptor);
        }

        debug!(sections = header.descriptors.len(), "section map read");
        Ok(())
    }

    /// Rebuild the named section into a private cursor positioned at 0.
    pub fn read_section(
        &self,
        header: &DwgFileHeaderAC18,
        name: &str,
    ) -> Result<DwgStreamReaderBase> {
        let descriptor = header
            .descriptors
            .get(name)
            .ok_or_else(|| DwgError::transport(name, "section is not in the section map"))?;

        let data = self.rebuild(descriptor)?;
        let mut reader = DwgStreamReaderBase::new(data, self.version);
        reader.set_code_page(self.code_page);
        Ok(reader)
    }

    fn rebuild(&self, descriptor: &DwgSectionDescriptor) -> Result<Vec<u8>> {
        let name = descriptor.name.as_str();
        let page_size = descriptor.max_decompressed_size as u64;
        let capacity = page_size
            .checked_mul(descriptor.page_count as u64)
            .filter(|&total| total <= MAX_SECTION_SIZE)
            .ok_or_else(|| {
                DwgError::transport(
                    name,
                    format!(
                        "{} pages of {page_size} bytes exceed the allocation limit",
                        descriptor.page_count
                    ),
                )
            })?;

        let mut buffer = vec![0u8; capacity as usize];
        let mut page_output = Vec::with_capacity(page_size as usize);

        for page in &descriptor.local_sections {
            if page.seeker == 0 {
                return Err(DwgError::transport(
                    name,
                    format!("page {} is not in the page map", page.page_number),
                ));
            }

            let raw_header = self.slice(name, page.seeker, DATA_PAGE_HEADER_SIZE)?;
            let page_header = DataPageHeader::decrypt(raw_header, page.seeker)
                .ok_or_else(|| DwgError::transport(name, "truncated data page header"))?;
            if page_header.page_type != DATA_PAGE_TYPE {
                return Err(DwgError::transport(
                    name,
                    format!(
                        "page {} at 0x{:X} has type 0x{:08X}",
                        page.page_number, page.seeker, page_header.page_type
                    ),
                ));
            }

            let data = self.slice(
                name,
                page.seeker + DATA_PAGE_HEADER_SIZE,
                page_header.compressed_size as u64,
            )?;

            if self.crc_check && page_header.data_checksum != 0 {
                let computed = dwg_checksum_calculator::calculate(0, data);
                if computed != page_header.data_checksum {
                    debug!(
                        section = name,
                        page = page.page_number,
                        stored = page_header.data_checksum,
                        computed,
                        "data page checksum differs"
                    );
                }
            }

            page_output.clear();
            if descriptor.is_compressed() {
                DwgLz77Ac18Decompressor::decompress_to_dest(
                    data,
                    &mut page_output,
                    page_size as usize,
                )
                .map_err(|e| DwgError::transport(name, e.to_string()))?;
            } else {
                page_output.extend_from_slice(data);
            }

            let start = page.offset;
            let end = start
                .checked_add(page_output.len() as u64)
                .filter(|&end| end <= capacity)
                .ok_or_else(|| {
                    DwgError::transport(
                        name,
                        format!(
                            "page {} at offset 0x{start:X} overruns the section",
                            page.page_number
                        ),
                    )
                })?;
            buffer[start as usize..end as usize].copy_from_slice(&page_output);
        }

        if descriptor.size > 0 && descriptor.size < capacity {
            buffer.truncate(descriptor.size as usize);
        }
        debug!(section = name, bytes = buffer.len(), "section rebuilt");
        Ok(buffer)
    }
}

fn page_map_entry(input: &[u8]) -> IResult<&[u8], (i32, u32)> {
    let (input, number) = le_i32(input)?;
    let (input, size) = le_u32(input)?;
    Ok((input, (number, size)))
}

fn section_map_header(input: &[u8]) -> IResult<&[u8], u32> {
    let (input, count) = le_u32(input)?;
    let (input, _x02) = le_u32(input)?;
    let (input, _x7400) = le_u32(input)?;
    let (input, _x00) = le_u32(input)?;
    let (input, _unknown) = le_u32(input)?;
    Ok((input, count))
}

fn section_descriptor(input: &[u8]) -> IResult<&[u8], DwgSectionDescriptor> {
    let (input, size) = le_u64(input)?;
    let (input, page_count) = le_u32(input)?;
    let (input, max_decompressed_size) = le_u32(input)?;
    let (input, _unknown) = le_u32(input)?;
    let (input, compressed_code) = le_u32(input)?;
    let (input, section_id) = le_u32(input)?;
    let (input, encrypted) = le_u32(input)?;
    let (input, raw_name) = take(64usize)(input)?;

    let end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
    let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

    Ok((
        input,
        DwgSectionDescriptor {
            name,
            size,
            page_count,
            max_decompressed_size,
            compressed_code,
            section_id,
            encrypted,
            local_sections: Vec::with_capacity(page_count.min(1024) as usize),
        },
    ))
}

fn section_page(input: &[u8]) -> IResult<&[u8], (i32, u32, u64)> {
    let (input, number) = le_i32(input)?;
    let (input, data_size) = le_u32(input)?;
    let (input, offset) = le_u64(input)?;
    Ok((input, (number, data_size, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_page_header(words: [u32; 8], address: u64) -> Vec<u8> {
        let key = DATA_PAGE_HEADER_KEY ^ address as u32;
        words.iter().flat_map(|w| (w ^ key).to_le_bytes()).collect()
    }

    /// File with a raw page map at 0x100, a raw section map page and one
    /// uncompressed data page holding "HELLO".
    fn build_file() -> (Vec<u8>, DwgFileHeaderAC18) {
        let mut file = vec![0u8; 0x100];

        // Page map: page 1 (itself), page 2 (section map), page 3 (data).
        let page_map: Vec<u8> = [(1i32, 0x40u32), (2, 0xC0), (3, 0x40)]
            .iter()
            .flat_map(|(n, s)| {
                let mut e = n.to_le_bytes().to_vec();
                e.extend_from_slice(&s.to_le_bytes());
                e
            })
            .collect();
        let mut page = Vec::new();
        for w in [PAGE_MAP_TYPE, page_map.len() as u32, page_map.len() as u32, 1, 0] {
            page.extend_from_slice(&w.to_le_bytes());
        }
        page.extend_from_slice(&page_map);
        page.resize(0x40, 0);
        file.extend_from_slice(&page);

        // Section map at 0x140.
        let mut map = Vec::new();
        for w in [1u32, 2, 0x7400, 0, 1] {
            map.extend_from_slice(&w.to_le_bytes());
        }
        map.extend_from_slice(&5u64.to_le_bytes());
        for w in [1u32, 0x10, 1, 1, 4, 0] {
            map.extend_from_slice(&w.to_le_bytes());
        }
        let mut name = b"AcDb:Test".to_vec();
        name.resize(64, 0);
        map.extend_from_slice(&name);
        map.extend_from_slice(&3i32.to_le_bytes());
        map.extend_from_slice(&5u32.to_le_bytes());
        map.extend_from_slice(&0u64.to_le_bytes());
        let mut page = Vec::new();
        for w in [SECTION_MAP_TYPE, map.len() as u32, map.len() as u32, 1, 0] {
            page.extend_from_slice(&w.to_le_bytes());
        }
        page.extend_from_slice(&map);
        page.resize(0xC0, 0);
        file.extend_from_slice(&page);

        // Data page at 0x200.
        let address = file.len() as u64;
        file.extend(encrypt_page_header(
            [DATA_PAGE_TYPE, 4, 5, 0x10, 0, 0, 0, 0],
            address,
        ));
        file.extend_from_slice(b"HELLO");
        file.resize(address as usize + 0x40, 0);

        let header = DwgFileHeaderAC18 {
            page_map_address: 0x100,
            section_map_id: 2,
            ..Default::default()
        };
        (file, header)
    }

    #[test]
    fn test_data_page_header_decrypt() {
        let raw = encrypt_page_header([DATA_PAGE_TYPE, 1, 2, 3, 4, 5, 6, 7], 0x1C0);
        let header = DataPageHeader::decrypt(&raw, 0x1C0).unwrap();
        assert_eq!(header.page_type, DATA_PAGE_TYPE);
        assert_eq!(header.compressed_size, 2);
        assert_eq!(header.data_checksum, 6);
        assert!(DataPageHeader::decrypt(&raw[..31], 0x1C0).is_none());
    }

    #[test]
    fn test_read_maps_and_section() {
        let (file, mut header) = build_file();
        let transport = DwgSectionTransport::new(&file, DwgVersion::AC1018, CodePage::default(), true);
        transport.read_page_map(&mut header).unwrap();
        assert_eq!(header.page_map.len(), 3);
        assert_eq!(header.page(2).unwrap().seeker, 0x140);
        assert_eq!(header.page(3).unwrap().seeker, 0x200);

        transport.read_section_map(&mut header).unwrap();
        let descriptor = header.descriptors.get("AcDb:Test").unwrap();
        assert_eq!(descriptor.section_id, 4);
        assert_eq!(descriptor.local_sections[0].seeker, 0x200);

        let mut reader = transport.read_section(&header, "AcDb:Test").unwrap();
        assert_eq!(reader.length(), 5);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_bytes(5).unwrap(), b"HELLO");
    }

    #[test]
    fn test_missing_section_is_transport_error() {
        let (file, mut header) = build_file();
        let transport = DwgSectionTransport::new(&file, DwgVersion::AC1018, CodePage::default(), true);
        transport.read_page_map(&mut header).unwrap();
        transport.read_section_map(&mut header).unwrap();
        assert!(matches!(
            transport.read_section(&header, "AcDb:Handles"),
            Err(DwgError::SectionTransport { .. })
        ));
    }

    #[test]
    fn test_wrong_page_type() {
        let (file, mut header) = build_file();
        header.page_map_address = 0x140;
        let transport = DwgSectionTransport::new(&file, DwgVersion::AC1018, CodePage::default(), true);
        assert!(transport.read_page_map(&mut header).is_err());
    }

    #[test]
    fn test_oversized_section_rejected() {
        let (file, mut header) = build_file();
        let transport = DwgSectionTransport::new(&file, DwgVersion::AC1018, CodePage::default(), true);
        transport.read_page_map(&mut header).unwrap();
        transport.read_section_map(&mut header).unwrap();
        if let Some(d) = header.descriptors.get_mut("AcDb:Test") {
            d.max_decompressed_size = u32::MAX;
            d.page_count = u32::MAX;
        }
        assert!(transport.read_section(&header, "AcDb:Test").is_err());
    }
}
