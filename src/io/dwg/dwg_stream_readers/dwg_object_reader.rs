use tracing::{debug, trace};

use crate::classes::{DwgClassCollection, ENTITY_CLASS_ID, LAYOUT_CLASS_NAME, OBJECT_CLASS_ID};
use crate::document::DwgDocument;
use crate::error::{DwgError, Result};
use crate::io::dwg::dwg_section_io::DwgSectionContext;
use crate::notification::{NotificationCollection, NotificationType};
use crate::objects::{
    CommonData, CommonHandleRefs, DwgObject, DwgObjectType, EntityCommon, ExtendedData,
    ObjectCommon, ObjectPayload, ObjectRefTable, ObjectStatus, SuperType,
};
use crate::types::{ColorFlags, DwgVersion, EntityColor, Handle};

use super::dwg_reference_reader::DwgReferenceReader;
use super::dwg_stream_reader_base::DwgStreamReaderBase;
use super::dwg_xdata_reader::DwgXDataReader;
use super::idwg_stream_reader::DwgStreamReader;

/// Largest EED chain accepted for one record.
pub const MAX_EED_SIZE: u64 = 10210;
/// Pictures of this size or more are not read.
pub const MAX_PICTURE_SIZE: u32 = 210210;

/// Decodes single records of the object data section.
///
/// Only the part shared by all records is decoded: the envelope, the own
/// handle, extended entity data, the entity or object common fields and the
/// common handle references. XRECORD data is the one payload read beyond that.
pub struct DwgObjectReader {
    ctx: DwgSectionContext,
}

impl DwgObjectReader {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            ctx: DwgSectionContext::new(version, "AcDb:AcDbObjects"),
        }
    }

    /// Decode the record at byte `address` and append it to the drawing.
    ///
    /// The record is appended whatever the outcome; failures are kept in its
    /// status and in the drawing's notifications. The cursor is left where it
    /// was. Returns the record's index.
    pub fn add_object(
        &self,
        reader: &mut DwgStreamReaderBase,
        address: u64,
        doc: &mut DwgDocument,
    ) -> usize {
        let saved = reader.position_in_bits();
        let DwgDocument {
            classes,
            objects,
            object_refs,
            notifications,
            ..
        } = doc;

        let mut object = DwgObject {
            index: objects.len(),
            address,
            ..Default::default()
        };
        self.decode(reader, &mut object, classes, object_refs, notifications);
        trace!(
            index = object.index,
            address,
            handle = object.handle.value,
            status = ?object.status,
            "object"
        );

        let index = object.index;
        objects.push(object);
        reader.set_position_in_bits(saved);
        index
    }

    fn decode(
        &self,
        reader: &mut DwgStreamReaderBase,
        object: &mut DwgObject,
        classes: &DwgClassCollection,
        refs: &mut ObjectRefTable,
        notifications: &mut NotificationCollection,
    ) {
        let start_bits = match Self::read_envelope(reader, object) {
            Ok(start_bits) => start_bits,
            Err(error) => {
                object.status = ObjectStatus::Truncated(error.to_string());
                notifications.notify(
                    NotificationType::Error,
                    format!("Object at 0x{:X}: {error}", object.address),
                );
                return;
            }
        };

        classify(object, classes);
        let result = match object.supertype {
            SuperType::Entity => self.read_entity(reader, object, start_bits, refs, notifications),
            SuperType::Object => self.read_object(reader, object, start_bits, refs, notifications),
            SuperType::Unknown => {
                debug!(
                    object_type = object.object_type.0,
                    address = object.address,
                    "unknown object type"
                );
                object.status = ObjectStatus::Unknown;
                return;
            }
        };

        if let Err(error) = result {
            object.status = match &error {
                DwgError::HandleDecode { .. } => {
                    object.reset_header();
                    ObjectStatus::HandleError
                }
                DwgError::RecordSizeExceeded { .. } => {
                    object.reset_header();
                    ObjectStatus::SizeExceeded
                }
                other => ObjectStatus::Truncated(other.to_string()),
            };
            notifications.notify_error(&error);
        }
    }

    /// `MS` size and `BS` type. Returns the bit position right after the size,
    /// which is where `bitsize` counts from.
    fn read_envelope(reader: &mut DwgStreamReaderBase, object: &mut DwgObject) -> Result<u64> {
        reader.set_position(object.address);
        object.size = reader.read_modular_short()?;
        let start_bits = reader.position_in_bits();
        object.object_type = DwgObjectType(reader.read_bit_short()? as u16);
        Ok(start_bits)
    }

    fn read_handle_and_eed(
        &self,
        reader: &mut DwgStreamReaderBase,
        object: &mut DwgObject,
        notifications: &mut NotificationCollection,
    ) -> Result<()> {
        if self.ctx.r2000_plus {
            object.bitsize = reader.read_raw_long()?;
        }
        object.handle = reader.read_handle()?;
        self.read_eed(reader, object, notifications)
    }

    fn read_eed(
        &self,
        reader: &mut DwgStreamReaderBase,
        object: &mut DwgObject,
        notifications: &mut NotificationCollection,
    ) -> Result<()> {
        loop {
            let size = reader.read_bit_short()? as u16 as u64;
            if size == 0 {
                return Ok(());
            }
            if size > MAX_EED_SIZE {
                return Err(DwgError::RecordSizeExceeded {
                    handle: object.handle.value,
                    field: "EED",
                    size,
                    limit: MAX_EED_SIZE,
                });
            }

            let app_handle = match reader.read_handle() {
                Ok(handle) => handle,
                Err(error) => {
                    notifications.notify(
                        NotificationType::Warning,
                        format!(
                            "Object {:X}: cannot read EED application handle: {error}",
                            object.handle.value
                        ),
                    );
                    Handle::default()
                }
            };
            let data = reader.read_bytes(size as usize)?;
            object.eed.push(ExtendedData { app_handle, data });
        }
    }

    fn read_entity(
        &self,
        reader: &mut DwgStreamReaderBase,
        object: &mut DwgObject,
        start_bits: u64,
        refs: &mut ObjectRefTable,
        notifications: &mut NotificationCollection,
    ) -> Result<()> {
        self.read_handle_and_eed(reader, object, notifications)?;

        let mut entity = EntityCommon::default();
        if reader.read_bit()? {
            let size = reader.read_raw_long()?;
            if size < MAX_PICTURE_SIZE {
                entity.picture = Some(reader.read_bytes(size as usize)?);
            } else {
                notifications.notify(
                    NotificationType::Warning,
                    format!(
                        "Object {:X}: invalid picture size {size}, skipped",
                        object.handle.value
                    ),
                );
                reader.advance_bits(-33)?;
            }
        }

        if self.ctx.r13_14_only {
            object.bitsize = reader.read_raw_long()?;
        }

        entity.entity_mode = reader.read_2_bits()?;
        entity.num_reactors = reader.read_bit_long()? as u32;
        if self.ctx.r2004_plus {
            entity.xdic_missing = reader.read_bit()?;
        }
        if self.ctx.r13_14_only {
            entity.is_bylayer_linetype = reader.read_bit()?;
        }
        entity.no_links = reader.read_bit()?;
        entity.color = self.read_entity_color(reader, entity.no_links)?;
        entity.linetype_scale = reader.read_bit_double()?;

        if self.ctx.r2000_plus {
            entity.linetype_flags = reader.read_2_bits()?;
            entity.plotstyle_flags = reader.read_2_bits()?;
        }
        if self.ctx.r2007_plus {
            entity.material_flags = reader.read_2_bits()?;
            entity.shadow_flags = reader.read_raw_char()?;
        }
        entity.invisible = reader.read_bit_short()?;
        if self.ctx.r2000_plus {
            entity.lineweight = reader.read_raw_char()?;
        }

        object.common = CommonData::Entity(entity);
        self.read_common_handles(reader, object, start_bits, refs, notifications);
        Ok(())
    }

    fn read_entity_color(
        &self,
        reader: &mut DwgStreamReaderBase,
        no_links: bool,
    ) -> Result<EntityColor> {
        if !self.ctx.r2004_plus {
            return Ok(EntityColor::Index(reader.read_cm_color()?));
        }
        if no_links {
            return Ok(EntityColor::Flag(reader.read_bit()?));
        }
        if reader.read_bit()? {
            return Ok(EntityColor::Indexed(reader.read_raw_char()?));
        }

        let word = reader.read_raw_short()? as u16;
        let flags = ColorFlags::from_bits_truncate(word);
        let (rgb, name) = if flags.contains(ColorFlags::RGB) {
            let mut rgb = [0u8; 4];
            for b in rgb.iter_mut() {
                *b = reader.read_raw_char()?;
            }
            (Some(rgb), Some(reader.read_variable_text()?))
        } else {
            (None, None)
        };
        let transparency = if flags.contains(ColorFlags::TRANSPARENCY) {
            Some(reader.read_bit_long()? as u32)
        } else {
            None
        };

        Ok(EntityColor::Complex {
            flags,
            index: word & 0x1FFF,
            rgb,
            name,
            transparency,
        })
    }

    fn read_object(
        &self,
        reader: &mut DwgStreamReaderBase,
        object: &mut DwgObject,
        start_bits: u64,
        refs: &mut ObjectRefTable,
        notifications: &mut NotificationCollection,
    ) -> Result<()> {
        self.read_handle_and_eed(reader, object, notifications)?;
        if self.ctx.r13_14_only {
            object.bitsize = reader.read_raw_long()?;
        }

        let mut common = ObjectCommon {
            num_reactors: reader.read_bit_long()? as u32,
            ..Default::default()
        };
        if self.ctx.r2004_plus {
            common.xdic_missing = reader.read_bit()?;
        }
        object.common = CommonData::Object(common);

        if object.type_name.as_deref() == Some("XRECORD") {
            object.payload = self.read_xrecord(reader, notifications)?;
        }

        self.read_common_handles(reader, object, start_bits, refs, notifications);
        Ok(())
    }

    fn read_xrecord(
        &self,
        reader: &mut DwgStreamReaderBase,
        notifications: &mut NotificationCollection,
    ) -> Result<ObjectPayload> {
        let size = reader.read_bit_long()?;
        if size < 0 {
            return Err(DwgError::Parse(format!("negative XRECORD data size {size}")));
        }
        let data = DwgXDataReader::read(reader, size as u64, notifications);
        let cloning_flags = if self.ctx.r2000_plus {
            Some(reader.read_bit_short()?)
        } else {
            None
        };
        Ok(ObjectPayload::XRecord {
            data,
            cloning_flags,
        })
    }

    /// Read the references at the start of the record's handle stream.
    ///
    /// Stops at the first reference that cannot be read; the references read
    /// before it are kept.
    fn read_common_handles(
        &self,
        reader: &DwgStreamReaderBase,
        object: &mut DwgObject,
        start_bits: u64,
        refs: &mut ObjectRefTable,
        notifications: &mut NotificationCollection,
    ) {
        let handles_start = start_bits + object.bitsize as u64;
        if handles_start >= reader.length() * 8 {
            notifications.notify(
                NotificationType::Warning,
                format!(
                    "Object {:X}: handle stream at bit {handles_start} is past the section end",
                    object.handle.value
                ),
            );
            return;
        }

        let mut stream = reader.fork();
        stream.set_position_in_bits(handles_start);

        let DwgObject {
            handle,
            common,
            handle_refs,
            ..
        } = object;
        let owner = Some(&*handle);
        let mut refs_reader = DwgReferenceReader::new(refs, notifications);
        let complete = match common {
            CommonData::Entity(entity) => {
                self.entity_handles(&mut stream, &mut refs_reader, owner, entity, handle_refs)
            }
            CommonData::Object(common) => {
                Self::object_handles(&mut stream, &mut refs_reader, owner, common, handle_refs)
            }
            CommonData::None => Some(()),
        };
        if complete.is_none() {
            debug!(handle = handle.value, "common handle data incomplete");
        }
    }

    fn read_reactors_and_xdic(
        stream: &mut DwgStreamReaderBase,
        refs_reader: &mut DwgReferenceReader<'_>,
        owner: Option<&Handle>,
        num_reactors: u32,
        xdic_missing: bool,
        handle_refs: &mut CommonHandleRefs,
    ) -> Option<()> {
        for _ in 0..num_reactors {
            let reactor = refs_reader.read_with_code(stream, owner, Handle::SOFT_OWNER)?;
            handle_refs.reactors.push(reactor);
        }
        if !xdic_missing {
            handle_refs.xdictionary =
                Some(refs_reader.read_with_code(stream, owner, Handle::HARD_POINTER)?);
        }
        Some(())
    }

    fn object_handles(
        stream: &mut DwgStreamReaderBase,
        refs_reader: &mut DwgReferenceReader<'_>,
        owner: Option<&Handle>,
        common: &ObjectCommon,
        handle_refs: &mut CommonHandleRefs,
    ) -> Option<()> {
        handle_refs.owner = Some(refs_reader.read_with_code(stream, owner, Handle::SOFT_OWNER)?);
        Self::read_reactors_and_xdic(
            stream,
            refs_reader,
            owner,
            common.num_reactors,
            common.xdic_missing,
            handle_refs,
        )
    }

    fn entity_handles(
        &self,
        stream: &mut DwgStreamReaderBase,
        refs_reader: &mut DwgReferenceReader<'_>,
        owner: Option<&Handle>,
        entity: &EntityCommon,
        handle_refs: &mut CommonHandleRefs,
    ) -> Option<()> {
        if entity.entity_mode == 0 {
            handle_refs.owner =
                Some(refs_reader.read_with_code(stream, owner, Handle::SOFT_OWNER)?);
        }
        Self::read_reactors_and_xdic(
            stream,
            refs_reader,
            owner,
            entity.num_reactors,
            entity.xdic_missing,
            handle_refs,
        )?;

        if self.ctx.r13_14_only {
            handle_refs.layer = Some(refs_reader.read_with_code(stream, owner, Handle::HARD_OWNER)?);
            if !entity.is_bylayer_linetype {
                handle_refs.linetype =
                    Some(refs_reader.read_with_code(stream, owner, Handle::HARD_OWNER)?);
            }
        }

        if self.ctx.r2004_pre && !entity.no_links {
            handle_refs.prev_entity =
                Some(refs_reader.read_with_code(stream, owner, Handle::SOFT_OWNER)?);
            handle_refs.next_entity =
                Some(refs_reader.read_with_code(stream, owner, Handle::SOFT_OWNER)?);
        }

        if self.ctx.r2004_plus && entity.color.has_reference() {
            handle_refs.color_book = Some(refs_reader.read(stream, owner)?);
        }

        if self.ctx.r2000_plus {
            handle_refs.layer = Some(refs_reader.read_with_code(stream, owner, Handle::HARD_OWNER)?);
            if entity.linetype_flags == 3 {
                handle_refs.linetype =
                    Some(refs_reader.read_with_code(stream, owner, Handle::HARD_OWNER)?);
            }
            if self.ctx.r2007_plus && entity.material_flags == 3 {
                handle_refs.material = Some(refs_reader.read(stream, owner)?);
            }
            if entity.plotstyle_flags == 3 {
                handle_refs.plotstyle =
                    Some(refs_reader.read_with_code(stream, owner, Handle::HARD_OWNER)?);
            }
        }
        Some(())
    }
}

/// Pick the supertype and record name of a record from its type code.
fn classify(object: &mut DwgObject, classes: &DwgClassCollection) {
    let object_type = object.object_type;
    if !object_type.is_variable() {
        object.supertype = object_type.fixed_supertype();
        object.type_name = object_type.name().map(str::to_string);
        return;
    }

    let Some(class) = classes.for_type(object_type.0) else {
        object.supertype = SuperType::Unknown;
        return;
    };
    object.supertype = if class.dxf_name == LAYOUT_CLASS_NAME {
        SuperType::Object
    } else if class.item_class_id == ENTITY_CLASS_ID {
        SuperType::Entity
    } else if class.item_class_id == OBJECT_CLASS_ID {
        SuperType::Object
    } else {
        SuperType::Unknown
    };
    object.type_name = Some(class.dxf_name.clone());
}
