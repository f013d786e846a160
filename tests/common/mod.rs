//! Builders for synthetic DWG files.
#![allow(dead_code)]

use dwg_tools_rs::io::dwg::dwg_checksum_calculator::{crc8, header_crc_mask, CRC_SEED, MAGIC_SEQUENCE};
use dwg_tools_rs::io::dwg::dwg_section_transport::{
    DATA_PAGE_HEADER_KEY, PAGE_MAP_TYPE, SECTION_MAP_TYPE,
};
use dwg_tools_rs::io::dwg::file_headers::{
    end_sentinel, start_sentinel, DwgSectionDefinition, AC18_FILE_ID, DATA_PAGE_TYPE,
    FILE_HEADER_END_SENTINEL,
};

/// MSB-first bit packer producing the encodings of the bit cursor.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_written(&self) -> u64 {
        if self.bit == 0 {
            self.bytes.len() as u64 * 8
        } else {
            (self.bytes.len() as u64 - 1) * 8 + self.bit as u64
        }
    }

    pub fn push(&mut self, value: u64, count: u8) -> &mut Self {
        for i in (0..count).rev() {
            if self.bit == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> self.bit;
            }
            self.bit = (self.bit + 1) % 8;
        }
        self
    }

    pub fn b(&mut self, value: bool) -> &mut Self {
        self.push(value as u64, 1)
    }

    pub fn bb(&mut self, value: u8) -> &mut Self {
        self.push(value as u64, 2)
    }

    pub fn rc(&mut self, value: u8) -> &mut Self {
        self.push(value as u64, 8)
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        for &b in data {
            self.rc(b);
        }
        self
    }

    pub fn rs(&mut self, value: u16) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn rl(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn bs(&mut self, value: u16) -> &mut Self {
        match value {
            0 => self.bb(0b10),
            256 => self.bb(0b11),
            1..=255 => self.bb(0b01).rc(value as u8),
            _ => self.bb(0b00).rs(value),
        }
    }

    pub fn bl(&mut self, value: u32) -> &mut Self {
        match value {
            0 => self.bb(0b10),
            1..=255 => self.bb(0b01).rc(value as u8),
            _ => self.bb(0b00).rl(value),
        }
    }

    pub fn bd(&mut self, value: f64) -> &mut Self {
        if value == 1.0 {
            self.bb(0b01)
        } else if value == 0.0 {
            self.bb(0b10)
        } else {
            self.bb(0b00).bytes(&value.to_le_bytes())
        }
    }

    pub fn h(&mut self, code: u8, value: u64) -> &mut Self {
        let size = if value == 0 {
            0
        } else {
            (8 - value.leading_zeros() / 8) as u8
        };
        self.rc((code << 4) | size);
        for i in (0..size).rev() {
            self.rc((value >> (i * 8)) as u8);
        }
        self
    }

    pub fn tv(&mut self, text: &str) -> &mut Self {
        self.bs(text.len() as u16);
        self.bytes(text.as_bytes())
    }

    pub fn finish(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Signed modular char.
pub fn mc(value: i64) -> Vec<u8> {
    let sign = if value < 0 { 0x40 } else { 0 };
    let mut rest = value.unsigned_abs();
    let mut out = Vec::new();
    while rest >= 0x40 {
        out.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    out.push(rest as u8 | sign);
    out
}

/// One object record: `MS` size, type, `RL` bitsize, `data`, then the handle
/// stream written by `handles` starting exactly at bitsize.
pub fn object_record(
    type_code: u16,
    data: impl Fn(&mut BitWriter),
    handles: impl Fn(&mut BitWriter),
) -> Vec<u8> {
    let build = |bitsize: u32| {
        let mut w = BitWriter::new();
        w.rs(0).bs(type_code).rl(bitsize);
        data(&mut w);
        let data_bits = (w.bits_written() - 16) as u32;
        handles(&mut w);
        (w.finish(), data_bits)
    };
    let (_, bitsize) = build(0);
    let (mut bytes, _) = build(bitsize);
    let size = (bytes.len() - 2) as u16;
    bytes[..2].copy_from_slice(&size.to_le_bytes());
    bytes
}

/// DICTIONARY object owned by `owner`. R2004 records carry the
/// xdictionary-missing bit, set here.
pub fn dictionary(handle: u64, owner: u64, r2004: bool) -> Vec<u8> {
    object_record(
        0x2A,
        |w| {
            w.h(0, handle).bs(0).bl(0);
            if r2004 {
                w.b(true);
            }
        },
        |w| {
            w.h(4, owner).h(3, 0);
        },
    )
}

/// R2000 LINE entity on `layer` with one EED chain of `eed_size` bytes.
pub fn line(handle: u64, layer: u64, eed_size: u16) -> Vec<u8> {
    object_record(
        0x13,
        |w| {
            w.h(0, handle);
            if eed_size > 0 {
                w.bs(eed_size).h(5, 0x12);
                w.bytes(&vec![0xEE; eed_size as usize]);
            }
            w.bs(0).b(false);
            w.bb(2).bl(0).b(true); // model space, no reactors, no links
            w.bs(7).bd(1.0).bb(0).bb(0).bs(0).rc(0x1D);
        },
        |w| {
            w.h(3, 0).h(5, layer);
        },
    )
}

/// R2000 LINE entity carrying a preview picture. `declared` is the `RL`
/// size written after the picture bit, `picture` the bytes that follow it.
pub fn line_with_picture(handle: u64, layer: u64, declared: u32, picture: &[u8]) -> Vec<u8> {
    object_record(
        0x13,
        |w| {
            w.h(0, handle).bs(0);
            w.b(true).rl(declared).bytes(picture);
            w.bb(2).bl(0).b(true);
            w.bs(7).bd(1.0).bb(0).bb(0).bs(0).rc(0x1D);
        },
        |w| {
            w.h(3, 0).h(5, layer);
        },
    )
}

/// R13/R14 LINE entity in model space with colour index `color`.
///
/// `linetype` writes an explicit linetype handle (clearing the
/// by-layer bit), `links` the previous and next entity handles.
pub fn r13_line(
    handle: u64,
    layer: u64,
    color: u16,
    linetype: Option<u64>,
    links: Option<(u64, u64)>,
) -> Vec<u8> {
    let build = |bitsize: u32| {
        let mut w = BitWriter::new();
        w.rs(0).bs(0x13).h(0, handle).bs(0).b(false);
        w.rl(bitsize);
        w.bb(2).bl(0).b(linetype.is_none()).b(links.is_none());
        w.bs(color).bd(1.0).bs(0);
        let data_bits = (w.bits_written() - 16) as u32;

        w.h(3, 0).h(5, layer);
        if let Some(linetype) = linetype {
            w.h(5, linetype);
        }
        if let Some((prev, next)) = links {
            w.h(4, prev).h(4, next);
        }
        (w.finish(), data_bits)
    };
    let (_, bitsize) = build(0);
    let (mut bytes, _) = build(bitsize);
    let size = (bytes.len() - 2) as u16;
    bytes[..2].copy_from_slice(&size.to_le_bytes());
    bytes
}

/// Class records of the R13 to R2000 layout.
pub fn class_data(classes: &[(u16, &str, u16)]) -> Vec<u8> {
    let mut w = BitWriter::new();
    for &(number, name, item_class_id) in classes {
        w.bs(number).bs(0).tv("ObjectDBX Classes").tv("AcDbThing").tv(name);
        w.b(false).bs(item_class_id);
    }
    w.finish()
}

/// Object map chunks for `(handle, offset)` entries, `per_chunk` entries per
/// chunk, closed by an empty chunk.
pub fn object_map(entries: &[(u64, u64)], per_chunk: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for group in entries.chunks(per_chunk.max(1)) {
        let mut body = Vec::new();
        let (mut last_handle, mut last_offset) = (0i64, 0i64);
        for &(handle, offset) in group {
            body.extend(mc(handle as i64 - last_handle));
            body.extend(mc(offset as i64 - last_offset));
            last_handle = handle as i64;
            last_offset = offset as i64;
        }
        out.extend(map_chunk(&body));
    }
    out.extend(map_chunk(&[]));
    out
}

/// Size (big endian, counting itself), body, big-endian CRC.
pub fn map_chunk(body: &[u8]) -> Vec<u8> {
    let mut chunk = ((body.len() + 2) as u16).to_be_bytes().to_vec();
    chunk.extend_from_slice(body);
    let crc = crc8(CRC_SEED, &chunk);
    chunk.extend(crc.to_be_bytes());
    chunk
}

fn prefix(tag: &[u8; 6], preview_address: u32) -> Vec<u8> {
    let mut data = tag.to_vec();
    data.extend_from_slice(&[0; 5]);
    data.push(0x00); // maintenance
    data.push(0x01);
    data.extend_from_slice(&preview_address.to_le_bytes());
    data.push(0x1F);
    data.push(0x08);
    data.extend_from_slice(&30u16.to_le_bytes());
    data
}

/// Synthetic R13 to R2000 drawing.
#[derive(Debug, Clone)]
pub struct R2000File {
    pub tag: [u8; 6],
    pub classes: Vec<(u16, &'static str, u16)>,
    /// Object records, each paired with the handle placed in the map.
    pub objects: Vec<(u64, Vec<u8>)>,
    pub per_chunk: usize,
    pub measurement: Option<u32>,
    pub corrupt_header_crc: bool,
    pub corrupt_classes_crc: bool,
}

impl Default for R2000File {
    fn default() -> Self {
        Self {
            tag: *b"AC1015",
            classes: Vec::new(),
            objects: Vec::new(),
            per_chunk: 64,
            measurement: Some(1),
            corrupt_header_crc: false,
            corrupt_classes_crc: false,
        }
    }
}

impl R2000File {
    pub fn build(&self) -> Vec<u8> {
        const RECORDS: u32 = 5;
        let header_len = 0x15 + 4 + 9 * RECORDS as usize + 2 + 16;

        // Body laid out after the header: classes, objects, map, measurement.
        let mut body = Vec::new();
        let classes_at = header_len;
        let data = class_data(&self.classes);
        let mut classes = start_sentinel(DwgSectionDefinition::CLASSES).to_vec();
        classes.extend((data.len() as u32).to_le_bytes());
        classes.extend(&data);
        let mut crc = crc8(CRC_SEED, &classes[16..]);
        if self.corrupt_classes_crc {
            crc ^= 0x5555;
        }
        classes.extend(crc.to_le_bytes());
        classes.extend(end_sentinel(DwgSectionDefinition::CLASSES));
        body.extend(&classes);

        let mut entries = Vec::new();
        for (handle, record) in &self.objects {
            entries.push((*handle, (header_len + body.len()) as u64));
            body.extend(record);
        }

        let map_at = header_len + body.len();
        let map = object_map(&entries, self.per_chunk);
        body.extend(&map);

        let measurement_at = header_len + body.len();
        let measurement_size = if let Some(value) = self.measurement {
            body.extend(value.to_le_bytes());
            4
        } else {
            0
        };

        let mut file = prefix(&self.tag, 0);
        file.extend(RECORDS.to_le_bytes());
        for (number, seeker, size) in [
            (0u8, header_len, 0usize),
            (1, classes_at, classes.len()),
            (2, map_at, map.len()),
            (3, measurement_at, 0),
            (4, measurement_at, measurement_size),
        ] {
            file.push(number);
            file.extend((seeker as u32).to_le_bytes());
            file.extend((size as u32).to_le_bytes());
        }
        let mut crc = crc8(CRC_SEED, &file) ^ header_crc_mask(RECORDS);
        if self.corrupt_header_crc {
            crc ^= 1;
        }
        file.extend(crc.to_le_bytes());
        file.extend(FILE_HEADER_END_SENTINEL);
        assert_eq!(file.len(), header_len);

        file.extend(body);
        file
    }
}

/// R2004 class section data (sentinel, size, extended class records, CRC).
pub fn r2004_classes(classes: &[(u16, &str, u16)]) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.bs(classes.len() as u16).rc(0).rc(0).b(true);
    for &(number, name, item_class_id) in classes {
        w.bs(number).bs(0).tv("ObjectDBX Classes").tv("AcDbThing").tv(name);
        w.b(false).bs(item_class_id);
        w.bl(1).bs(0x18).bs(0).bl(0).bl(0);
    }
    let data = w.finish();

    let mut out = start_sentinel(DwgSectionDefinition::CLASSES).to_vec();
    out.extend((data.len() as u32).to_le_bytes());
    out.extend(data);
    out.extend([0, 0]);
    out
}

fn pad_to(data: &mut Vec<u8>, align: usize) {
    let len = data.len().div_ceil(align) * align;
    data.resize(len, 0);
}

fn system_page(page_type: u32, content: &[u8]) -> Vec<u8> {
    let mut page = Vec::new();
    for word in [page_type, content.len() as u32, content.len() as u32, 1, 0] {
        page.extend(word.to_le_bytes());
    }
    page.extend_from_slice(content);
    pad_to(&mut page, 0x20);
    page
}

fn data_page(address: u64, section_number: u32, content: &[u8]) -> Vec<u8> {
    let key = DATA_PAGE_HEADER_KEY ^ address as u32;
    let words = [
        DATA_PAGE_TYPE,
        section_number,
        content.len() as u32,
        content.len() as u32,
        0,
        0,
        0,
        0,
    ];
    let mut page: Vec<u8> = words.iter().flat_map(|w| (w ^ key).to_le_bytes()).collect();
    page.extend_from_slice(content);
    pad_to(&mut page, 0x20);
    page
}

/// Synthetic R2004 drawing holding uncompressed classes, objects and object
/// map sections. Object offsets in `objects` are relative to the object data.
pub fn r2004_file(classes: &[(u16, &str, u16)], objects: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let classes = r2004_classes(classes);
    let mut object_data = Vec::new();
    let mut entries = Vec::new();
    for (handle, record) in objects {
        entries.push((*handle, object_data.len() as u64));
        object_data.extend(record);
    }
    let handles = object_map(&entries, 64);

    let sections: [(&str, u32, &[u8]); 3] = [
        (DwgSectionDefinition::CLASSES, 2, &classes),
        (DwgSectionDefinition::HANDLES, 3, &handles),
        (DwgSectionDefinition::ACDB_OBJECTS, 4, &object_data),
    ];

    // Section map: pages 3, 4 and 5 carry the three sections.
    let mut section_map = Vec::new();
    for word in [3u32, 2, 0x7400, 0, 3] {
        section_map.extend(word.to_le_bytes());
    }
    for (index, (name, id, content)) in sections.iter().enumerate() {
        section_map.extend((content.len() as u64).to_le_bytes());
        for word in [1u32, 0x7400, 1, 1, *id, 0] {
            section_map.extend(word.to_le_bytes());
        }
        let mut padded = name.as_bytes().to_vec();
        padded.resize(64, 0);
        section_map.extend(padded);
        section_map.extend((index as i32 + 3).to_le_bytes());
        section_map.extend((content.len() as u32).to_le_bytes());
        section_map.extend(0u64.to_le_bytes());
    }
    let section_map_page = system_page(SECTION_MAP_TYPE, &section_map);

    // The page map size depends only on the entry count.
    let page_map_len = system_page(PAGE_MAP_TYPE, &[0u8; 5 * 8]).len();
    let mut address = 0x100 + page_map_len as u64 + section_map_page.len() as u64;
    let mut data_pages = Vec::new();
    for (_, id, content) in &sections {
        let page = data_page(address, *id, content);
        address += page.len() as u64;
        data_pages.push(page);
    }

    let mut page_map = Vec::new();
    let sizes = [page_map_len, section_map_page.len()]
        .into_iter()
        .chain(data_pages.iter().map(Vec::len));
    for (number, size) in (1i32..).zip(sizes) {
        page_map.extend(number.to_le_bytes());
        page_map.extend((size as u32).to_le_bytes());
    }
    let page_map_page = system_page(PAGE_MAP_TYPE, &page_map);
    assert_eq!(page_map_page.len(), page_map_len);

    // File header with the encrypted block at 0x80.
    let mut file = prefix(b"AC1018", 0);
    file.extend([0u8; 3]);
    // Security, unknown, summary info, VBA project, 0x80, app info.
    for word in [0u32, 0, 0x60, 0, 0x80, 0x70] {
        file.extend(word.to_le_bytes());
    }
    file.resize(0x80, 0);

    let mut plain = AC18_FILE_ID.to_vec();
    for word in [0u32, 0x6C, 0x04, 0, 0, 0, 0, 5] {
        plain.extend(word.to_le_bytes());
    }
    plain.extend(0u64.to_le_bytes());
    plain.extend(0u64.to_le_bytes());
    for word in [0u32, 3, 0x20, 0x80, 0x40, 1] {
        plain.extend(word.to_le_bytes());
    }
    plain.extend(0u64.to_le_bytes()); // page map at 0x100
    for word in [2u32, 0, 0, 0] {
        plain.extend(word.to_le_bytes());
    }
    file.extend(plain.iter().zip(MAGIC_SEQUENCE.iter()).map(|(b, m)| b ^ m));
    file.resize(0x100, 0);

    file.extend(page_map_page);
    file.extend(section_map_page);
    for page in data_pages {
        file.extend(page);
    }
    file
}
