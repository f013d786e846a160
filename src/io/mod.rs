//! I/O module for reading CAD files in DWG format

pub mod dwg;

pub use dwg::{DwgReader, DwgReaderConfiguration};
