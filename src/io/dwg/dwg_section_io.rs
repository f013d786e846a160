//! Shared state of DWG section readers.

use crate::notification::{NotificationCollection, NotificationType};
use crate::types::DwgVersion;

use super::dwg_stream_readers::DwgStreamReader;

/// Version flags and diagnostics context of one section reader.
///
/// Section readers embed a `DwgSectionContext` instead of re-deriving the
/// release checks at every field.
#[derive(Debug, Clone)]
pub struct DwgSectionContext {
    /// The AutoCAD version being processed.
    pub version: DwgVersion,
    /// Section name (for diagnostics).
    pub section_name: String,

    /// R13–R14 only (`AC1012` or `AC1014`).
    pub r13_14_only: bool,
    /// R13–R15 only (`AC1012`..=`AC1015`).
    pub r13_15_only: bool,
    /// R2000+ (`>= AC1015`).
    pub r2000_plus: bool,
    /// Pre-2004 (`< AC1018`).
    pub r2004_pre: bool,
    /// R2004+ (`>= AC1018`).
    pub r2004_plus: bool,
    /// R2007+ (`>= AC1021`).
    pub r2007_plus: bool,
}

impl DwgSectionContext {
    pub fn new(version: DwgVersion, section_name: impl Into<String>) -> Self {
        Self {
            section_name: section_name.into(),
            r13_14_only: version.r13_14_only(),
            r13_15_only: version <= DwgVersion::AC1015,
            r2000_plus: version.r2000_plus(),
            r2004_pre: !version.r2004_plus(),
            r2004_plus: version.r2004_plus(),
            r2007_plus: version.r2007_plus(),
            version,
        }
    }
}

/// Check whether two sentinel byte arrays are identical.
pub fn check_sentinel(actual: &[u8], expected: &[u8]) -> bool {
    actual.len() == expected.len() && actual.iter().zip(expected.iter()).all(|(a, b)| a == b)
}

/// Read a 16-byte sentinel and compare it with `expected`.
///
/// A mismatch or a short read is recorded as a warning; decoding goes on.
pub fn check_sentinel_from_reader(
    reader: &mut dyn DwgStreamReader,
    expected: &[u8; 16],
    ctx: &DwgSectionContext,
    notifications: &mut NotificationCollection,
) -> bool {
    let position = reader.position();
    match reader.read_sentinel() {
        Ok(actual) if check_sentinel(&actual, expected) => true,
        Ok(_) => {
            notifications.notify(
                NotificationType::Warning,
                format!(
                    "Invalid section sentinel found in {} at 0x{position:X}",
                    ctx.section_name
                ),
            );
            false
        }
        Err(_) => {
            notifications.notify(
                NotificationType::Warning,
                format!(
                    "Failed to read sentinel in {} at 0x{position:X}",
                    ctx.section_name
                ),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::dwg_stream_readers::DwgStreamReaderBase;

    #[test]
    fn test_check_sentinel() {
        assert!(check_sentinel(&[1, 2, 3, 4], &[1, 2, 3, 4]));
        assert!(!check_sentinel(&[1, 2, 3, 4], &[1, 2, 3, 5]));
        assert!(!check_sentinel(&[1, 2, 3], &[1, 2, 3, 4]));
    }

    #[test]
    fn test_sentinel_from_reader() {
        let expected = [7u8; 16];
        let mut reader = DwgStreamReaderBase::new(vec![7u8; 20], DwgVersion::AC1015);
        let ctx = DwgSectionContext::new(DwgVersion::AC1015, "AcDb:Classes");
        let mut notes = NotificationCollection::new();
        assert!(check_sentinel_from_reader(&mut reader, &expected, &ctx, &mut notes));
        assert!(notes.is_empty());

        // Only 4 bytes left.
        assert!(!check_sentinel_from_reader(&mut reader, &expected, &ctx, &mut notes));
        assert!(notes.contains("AcDb:Classes"));
    }

    #[test]
    fn test_version_flags() {
        let ctx = DwgSectionContext::new(DwgVersion::AC1015, "Test");
        assert!(!ctx.r13_14_only);
        assert!(ctx.r13_15_only);
        assert!(ctx.r2000_plus);
        assert!(ctx.r2004_pre);
        assert!(!ctx.r2004_plus);

        let ctx = DwgSectionContext::new(DwgVersion::AC1012, "Test");
        assert!(ctx.r13_14_only);
        assert!(!ctx.r2000_plus);

        let ctx = DwgSectionContext::new(DwgVersion::AC1021, "Test");
        assert!(ctx.r2007_plus);
        assert!(ctx.r2004_plus);
        assert!(!ctx.r2004_pre);
        assert!(!ctx.r13_15_only);
    }
}
