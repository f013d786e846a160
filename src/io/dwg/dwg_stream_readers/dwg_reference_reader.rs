use crate::error::DwgError;
use crate::notification::{NotificationCollection, NotificationType};
use crate::objects::ObjectRefTable;
use crate::types::Handle;

use super::idwg_stream_reader::DwgStreamReader;

/// Reads handle references and registers them in the session's reference
/// table.
pub struct DwgReferenceReader<'a> {
    refs: &'a mut ObjectRefTable,
    notifications: &'a mut NotificationCollection,
}

impl<'a> DwgReferenceReader<'a> {
    pub fn new(refs: &'a mut ObjectRefTable, notifications: &'a mut NotificationCollection) -> Self {
        Self {
            refs,
            notifications,
        }
    }

    /// Read one reference for a record whose own handle is `owner`.
    ///
    /// `None` as owner means the reference belongs to the header variables
    /// and is absolute. Returns the reference's index in the table, or
    /// `None` when it could not be read.
    pub fn read(&mut self, reader: &mut dyn DwgStreamReader, owner: Option<&Handle>) -> Option<usize> {
        match reader.read_handle() {
            Ok(handle) => Some(self.refs.push(handle, owner)),
            Err(error) => {
                let context = match owner {
                    Some(owner) => format!("object {owner}"),
                    None => "header variables".to_string(),
                };
                self.notifications.notify(
                    NotificationType::Error,
                    format!("Could not read handle reference in {context}: {error}"),
                );
                None
            }
        }
    }

    /// Read one reference that should carry `expected` as its code.
    ///
    /// A different code is reported and the reference is kept.
    pub fn read_with_code(
        &mut self,
        reader: &mut dyn DwgStreamReader,
        owner: Option<&Handle>,
        expected: u8,
    ) -> Option<usize> {
        let index = self.read(reader, owner)?;
        if let Some(reference) = self.refs.get(index) {
            if reference.absolute_ref == 0 && reference.handleref.code != expected {
                let context = match owner {
                    Some(owner) => format!("object {owner}"),
                    None => "header variables".to_string(),
                };
                self.notifications.notify_error(&DwgError::ReferenceCodeMismatch {
                    expected,
                    actual: reference.handleref.code,
                    context,
                });
            }
        }
        Some(index)
    }
}
