//! DWG file header structures and related types.
//!
//! - [`DwgFileHeader`]: unified file header with version dispatch
//! - [`DwgSectionLocatorRecord`]: direct-layout section locator
//! - [`DwgSectionDescriptor`]: R2004 named section descriptor
//! - [`DwgLocalSectionMap`]: R2004 page mapping
//! - [`DwgSectionDefinition`]: well-known section names and sentinels

mod dwg_file_header;
mod dwg_local_section_map;
mod dwg_section_definition;
mod dwg_section_descriptor;
mod dwg_section_locator_record;

pub use dwg_file_header::{
    DwgFileHeader, DwgFileHeaderAC15, DwgFileHeaderAC18, DwgFileHeaderAC21, DwgFileHeaderData,
    AC18_ENCRYPTED_HEADER_OFFSET, AC18_ENCRYPTED_HEADER_SIZE, AC18_FILE_ID,
};
pub use dwg_local_section_map::DwgLocalSectionMap;
pub use dwg_section_definition::{
    end_sentinel, start_sentinel, DwgSectionDefinition, END_SENTINELS, FILE_HEADER_END_SENTINEL,
    START_SENTINELS,
};
pub use dwg_section_descriptor::{DwgSectionDescriptor, DATA_PAGE_TYPE};
pub use dwg_section_locator_record::DwgSectionLocatorRecord;
