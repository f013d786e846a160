//! # dwg-tools-rs
//!
//! Decoder for AutoCAD DWG drawings from R13 (AC1012) to R2004 (AC1018),
//! with header-only support for R2007 (AC1021).
//!
//! Decoding produces a [`DwgDocument`] holding the class table, every record
//! of the object map with its common header and handle references, and the
//! notifications raised on the way. Malformed records and sections are
//! reported, not fatal: only an unknown version tag or an unreadable file
//! header make [`DwgReader`] return an error.
//!
//! ```rust,no_run
//! use dwg_tools_rs::{DwgReader, DwgReaderConfiguration};
//!
//! let doc = DwgReader::read_from_file("drawing.dwg", DwgReaderConfiguration::default())?;
//! for object in &doc.objects {
//!     println!("{:X} {:?}", object.handle.value, object.type_name);
//! }
//! # Ok::<(), dwg_tools_rs::DwgError>(())
//! ```

pub mod classes;
pub mod document;
pub mod error;
pub mod io;
pub mod notification;
pub mod objects;
pub mod types;
pub mod xdata;

pub use classes::{DwgClass, DwgClassCollection};
pub use document::{DwgDocument, DwgHeaderInfo, DwgSectionInfo};
pub use error::{DwgError, Result, Severity};
pub use io::dwg::{DwgPreview, DwgReader, DwgReaderConfiguration};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use objects::{DwgObject, DwgObjectType, ObjectRef, ObjectRefTable, ObjectStatus, SuperType};
pub use types::{CodePage, DwgVersion, Handle};
pub use xdata::{XDataChain, XDataValue, XDataValueType};
