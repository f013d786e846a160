//! Error types for DWG decoding.
//!
//! Every failure carries enough context to locate it in the file (byte or
//! bit offset, section name, record handle). [`DwgError::severity`] tells the
//! caller how far a failure reaches: a single record, a whole section, or the
//! whole drawing.

use std::io;

use thiserror::Error;

/// How far a failure propagates through a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Reported, decoding continues unchanged.
    Warning,
    /// The current record is abandoned; the map walk continues.
    Record,
    /// The current section is abandoned; other sections are still decoded.
    Section,
    /// Nothing can be decoded.
    File,
}

/// Errors produced while decoding a DWG drawing.
#[derive(Debug, Error)]
pub enum DwgError {
    /// I/O failure while loading the drawing bytes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The six byte version tag is not one of the supported releases.
    #[error("Unsupported DWG version: {0}")]
    UnsupportedVersion(String),

    /// The file header could not be parsed.
    #[error("Invalid file header: {0}")]
    InvalidHeader(String),

    /// A cursor read ran past the end of its buffer.
    #[error("Unexpected end of stream at bit {position} (buffer is {length} bytes)")]
    EndOfStream { position: u64, length: u64 },

    /// Structurally invalid value inside a record.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Stored section checksum does not match the recomputed one.
    #[error(
        "Checksum mismatch in {section} at 0x{offset:X}: stored 0x{expected:04X}, computed 0x{actual:04X}"
    )]
    SectionIntegrity {
        section: String,
        offset: u64,
        expected: u16,
        actual: u16,
    },

    /// A compressed section is missing from the directory or cannot be rebuilt.
    #[error("Cannot transport section {section}: {reason}")]
    SectionTransport { section: String, reason: String },

    /// A section violates a hard structural limit.
    #[error("Malformed {section} at 0x{offset:X}: {reason}")]
    MalformedSection {
        section: String,
        offset: u64,
        reason: String,
    },

    /// An EED chain or preview blob declares more bytes than allowed.
    #[error("Record {handle:X}: {field} size {size} exceeds limit {limit}")]
    RecordSizeExceeded {
        handle: u64,
        field: &'static str,
        size: u64,
        limit: u64,
    },

    /// A record's own handle could not be decoded.
    #[error("Cannot decode handle at bit {position}: {reason}")]
    HandleDecode { position: u64, reason: String },

    /// A reference carries a different code than the one its field expects.
    #[error("Reference code 0x{actual:X} where 0x{expected:X} was expected ({context})")]
    ReferenceCodeMismatch {
        expected: u8,
        actual: u8,
        context: String,
    },

    /// An xdata group code maps to no value kind.
    #[error("Unclassifiable group code {code} at byte 0x{offset:X}")]
    UnclassifiableGroupCode { code: i16, offset: u64 },

    /// LZ77 page data is corrupt.
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// A release path that is only partially decoded.
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl DwgError {
    /// Reach of this failure within a decode session.
    pub fn severity(&self) -> Severity {
        match self {
            DwgError::UnsupportedVersion(_) | DwgError::Io(_) => Severity::File,
            DwgError::InvalidHeader(_)
            | DwgError::SectionIntegrity { .. }
            | DwgError::SectionTransport { .. }
            | DwgError::MalformedSection { .. }
            | DwgError::Decompression(_) => Severity::Section,
            DwgError::EndOfStream { .. }
            | DwgError::Parse(_)
            | DwgError::RecordSizeExceeded { .. }
            | DwgError::HandleDecode { .. } => Severity::Record,
            DwgError::ReferenceCodeMismatch { .. }
            | DwgError::UnclassifiableGroupCode { .. }
            | DwgError::NotImplemented(_) => Severity::Warning,
        }
    }

    pub(crate) fn transport(section: &str, reason: impl Into<String>) -> Self {
        DwgError::SectionTransport {
            section: section.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(section: &str, offset: u64, reason: impl Into<String>) -> Self {
        DwgError::MalformedSection {
            section: section.to_string(),
            offset,
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DwgError>;
