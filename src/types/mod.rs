//! Core types used throughout dwg-tools-rs

pub mod code_page;
pub mod color;
pub mod handle;

pub use code_page::CodePage;
pub use color::{ColorFlags, EntityColor};
pub use handle::Handle;

/// DWG release identified by the six byte tag at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DwgVersion {
    /// AutoCAD R13 (AC1012)
    AC1012,
    /// AutoCAD R14 (AC1014)
    AC1014,
    /// AutoCAD 2000 (AC1015)
    AC1015,
    /// AutoCAD 2004 (AC1018)
    AC1018,
    /// AutoCAD 2007 (AC1021)
    AC1021,
}

/// File layout shared by one or more releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseFamily {
    /// R13 and R14: direct layout, read as a subset of R2000.
    R13R14,
    /// R2000: direct layout with locator records.
    R2000,
    /// R2004: paged, LZ77 compressed sections.
    R2004,
    /// R2007: paged sections with a variable width stream.
    R2007,
}

impl DwgVersion {
    /// Get the version string (e.g., "AC1015")
    pub fn as_str(&self) -> &'static str {
        match self {
            DwgVersion::AC1012 => "AC1012",
            DwgVersion::AC1014 => "AC1014",
            DwgVersion::AC1015 => "AC1015",
            DwgVersion::AC1018 => "AC1018",
            DwgVersion::AC1021 => "AC1021",
        }
    }

    /// Parse version from string (e.g., "AC1015")
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AC1012" => Some(DwgVersion::AC1012),
            "AC1014" => Some(DwgVersion::AC1014),
            "AC1015" => Some(DwgVersion::AC1015),
            "AC1018" => Some(DwgVersion::AC1018),
            "AC1021" => Some(DwgVersion::AC1021),
            _ => None,
        }
    }

    /// Match the raw tag bytes.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        std::str::from_utf8(tag).ok().and_then(Self::parse)
    }

    /// Get the numeric version code
    pub fn version_code(&self) -> u16 {
        match self {
            DwgVersion::AC1012 => 1012,
            DwgVersion::AC1014 => 1014,
            DwgVersion::AC1015 => 1015,
            DwgVersion::AC1018 => 1018,
            DwgVersion::AC1021 => 1021,
        }
    }

    /// Marketing name of the release.
    pub fn release_name(&self) -> &'static str {
        match self {
            DwgVersion::AC1012 => "R13",
            DwgVersion::AC1014 => "R14",
            DwgVersion::AC1015 => "R2000",
            DwgVersion::AC1018 => "R2004",
            DwgVersion::AC1021 => "R2007",
        }
    }

    pub fn family(&self) -> ReleaseFamily {
        match self {
            DwgVersion::AC1012 | DwgVersion::AC1014 => ReleaseFamily::R13R14,
            DwgVersion::AC1015 => ReleaseFamily::R2000,
            DwgVersion::AC1018 => ReleaseFamily::R2004,
            DwgVersion::AC1021 => ReleaseFamily::R2007,
        }
    }

    /// R13 or R14.
    pub fn r13_14_only(&self) -> bool {
        *self <= DwgVersion::AC1014
    }

    pub fn r2000_plus(&self) -> bool {
        *self >= DwgVersion::AC1015
    }

    pub fn r2004_plus(&self) -> bool {
        *self >= DwgVersion::AC1018
    }

    pub fn r2007_plus(&self) -> bool {
        *self >= DwgVersion::AC1021
    }
}

impl std::fmt::Display for DwgVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
