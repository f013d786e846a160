//! DWG read support.

pub mod dwg_checksum_calculator;
pub mod dwg_reader;
pub mod dwg_reader_configuration;
pub mod dwg_section_io;
pub mod dwg_section_transport;
pub mod dwg_stream_readers;
pub mod file_headers;

pub use dwg_reader::DwgReader;
pub use dwg_reader_configuration::DwgReaderConfiguration;
pub use dwg_section_io::DwgSectionContext;
pub use dwg_section_transport::DwgSectionTransport;

pub use dwg_stream_readers::{
    DwgClassesReader, DwgHandleReader, DwgLz77Ac18Decompressor, DwgObjectReader, DwgPreview,
    DwgPreviewReader, DwgReferenceReader, DwgStreamReader, DwgStreamReaderBase, DwgXDataReader,
    PreviewType,
};

pub use file_headers::{
    DwgFileHeader, DwgFileHeaderAC15, DwgFileHeaderAC18, DwgFileHeaderAC21, DwgFileHeaderData,
    DwgLocalSectionMap, DwgSectionDefinition, DwgSectionDescriptor, DwgSectionLocatorRecord,
    END_SENTINELS, FILE_HEADER_END_SENTINEL, START_SENTINELS,
};
