//! The decoded drawing.

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::classes::DwgClassCollection;
use crate::io::dwg::DwgPreview;
use crate::notification::{NotificationCollection, NotificationType};
use crate::objects::{DwgObject, ObjectRefTable};
use crate::types::{CodePage, DwgVersion};

/// Location of one section in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DwgSectionInfo {
    /// Locator number (direct layout) or section id (R2004).
    pub number: u32,
    /// Absolute byte offset; 0 for sections rebuilt from pages.
    pub address: u64,
    /// Size in bytes.
    pub size: u64,
}

/// File header values kept on the drawing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DwgHeaderInfo {
    pub version: Option<DwgVersion>,
    pub maintenance_version: u8,
    pub code_page: CodePage,
    pub preview_address: u64,
    /// Internal version and application release bytes (R2004+).
    pub dwg_version: u8,
    pub app_release_version: u8,
    /// Security flags (R2004+); nonzero for password protected drawings.
    pub security_type: u32,
    /// Addresses of the summary info, VBA project and app info sections
    /// (R2004+); 0 when absent.
    pub summary_info_address: u64,
    pub vba_project_address: u64,
    pub app_info_address: u64,
    /// Section directory in file order, keyed by section name.
    pub sections: IndexMap<String, DwgSectionInfo>,
    /// MEASUREMENT value (0 English, 1 metric) when the file carries it.
    pub measurement: Option<u32>,
}

/// A drawing decoded by [`crate::DwgReader`].
///
/// Each drawing owns its tables; nothing is shared between two decodes.
#[derive(Debug, Clone, Default)]
pub struct DwgDocument {
    pub header: DwgHeaderInfo,
    pub classes: DwgClassCollection,
    pub objects: Vec<DwgObject>,
    pub object_refs: ObjectRefTable,
    pub preview: Option<DwgPreview>,
    pub notifications: NotificationCollection,
}

impl DwgDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Option<DwgVersion> {
        self.header.version
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn num_object_refs(&self) -> usize {
        self.object_refs.len()
    }

    /// First object carrying the given handle value.
    pub fn object_by_handle(&self, handle: u64) -> Option<&DwgObject> {
        self.objects.iter().find(|o| o.handle.value == handle)
    }

    /// Link every reference to the object it points at.
    ///
    /// Returns the number of linked references. Running it again gives the
    /// same links.
    pub fn resolve_object_refs(&mut self) -> usize {
        let mut by_handle: AHashMap<u64, usize> = AHashMap::with_capacity(self.objects.len());
        for (index, object) in self.objects.iter().enumerate() {
            by_handle.entry(object.handle.value).or_insert(index);
        }
        self.object_refs.resolve(&by_handle)
    }

    /// `true` when any error notification was recorded.
    pub fn has_errors(&self) -> bool {
        self.notifications
            .of_type(NotificationType::Error)
            .next()
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Handle;

    #[test]
    fn test_counters_follow_tables() {
        let mut doc = DwgDocument::new();
        assert_eq!(doc.num_objects(), 0);
        doc.objects.push(DwgObject {
            handle: Handle::new(0, 0x10),
            ..Default::default()
        });
        doc.object_refs.push(Handle::new(5, 0x10), None);
        assert_eq!(doc.num_objects(), 1);
        assert_eq!(doc.num_object_refs(), 1);
        assert_eq!(doc.num_classes(), 0);
    }

    #[test]
    fn test_resolve_object_refs_is_idempotent() {
        let mut doc = DwgDocument::new();
        for value in [0x10, 0x11] {
            let index = doc.objects.len();
            doc.objects.push(DwgObject {
                index,
                handle: Handle::new(0, value),
                ..Default::default()
            });
        }
        let owner = Handle::new(0, 0x10);
        doc.object_refs.push(Handle::new(0x06, 0), Some(&owner));
        doc.object_refs.push(Handle::new(0x05, 0x99), None);

        assert_eq!(doc.resolve_object_refs(), 1);
        assert_eq!(doc.object_refs.get(0).unwrap().obj, Some(1));
        assert_eq!(doc.object_refs.get(1).unwrap().obj, None);
        assert_eq!(doc.resolve_object_refs(), 1);
        assert_eq!(doc.object_by_handle(0x11).unwrap().index, 1);
    }

    #[test]
    fn test_has_errors() {
        let mut doc = DwgDocument::new();
        doc.notifications.notify(NotificationType::Warning, "unverified version");
        assert!(!doc.has_errors());
        doc.notifications.notify(NotificationType::Error, "bad checksum");
        assert!(doc.has_errors());
    }
}
