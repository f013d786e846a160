//! Bit cursor and the section readers built on it.

pub mod dwg_classes_reader;
pub mod dwg_handle_reader;
pub mod dwg_lz77_ac18_decompressor;
pub mod dwg_object_reader;
pub mod dwg_preview_reader;
pub mod dwg_reference_reader;
pub mod dwg_stream_reader_base;
pub mod dwg_xdata_reader;
pub mod idwg_stream_reader;

#[cfg(test)]
pub(crate) mod test_support;

pub use dwg_classes_reader::DwgClassesReader;
pub use dwg_handle_reader::{DwgHandleReader, MAX_CHUNK_SIZE, MAX_COMPRESSED_CHUNK_SIZE};
pub use dwg_lz77_ac18_decompressor::DwgLz77Ac18Decompressor;
pub use dwg_object_reader::{DwgObjectReader, MAX_EED_SIZE, MAX_PICTURE_SIZE};
pub use dwg_preview_reader::{DwgPreview, DwgPreviewReader, PreviewType};
pub use dwg_reference_reader::DwgReferenceReader;
pub use dwg_stream_reader_base::DwgStreamReaderBase;
pub use dwg_xdata_reader::DwgXDataReader;
pub use idwg_stream_reader::DwgStreamReader;
