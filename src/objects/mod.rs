//! Decoded records of the object table.
//!
//! Every record in the object data section starts with the same prefix: a
//! size, a type code, the record's own handle, extended entity data, and a
//! block of common fields that differs between entities (graphical) and
//! objects (non-graphical). Only that prefix, the common handle references,
//! and the XRECORD payload are decoded here.

pub mod object_ref;

pub use object_ref::{ObjectRef, ObjectRefTable};

use crate::types::{EntityColor, Handle};
use crate::xdata::XDataChain;

/// Type code of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DwgObjectType(pub u16);

impl DwgObjectType {
    pub const TEXT: Self = Self(0x01);
    pub const INSERT: Self = Self(0x07);
    pub const LINE: Self = Self(0x13);
    pub const DICTIONARY: Self = Self(0x2A);
    pub const BLOCK_HEADER: Self = Self(0x31);
    pub const LAYER: Self = Self(0x33);
    pub const XRECORD: Self = Self(0x4F);
    pub const LAYOUT: Self = Self(0x52);
    pub const PROXY_ENTITY: Self = Self(0x1F2);
    pub const PROXY_OBJECT: Self = Self(0x1F3);

    /// First type code described by the class table.
    pub const FIRST_CLASS_TYPE: u16 = 500;

    /// `true` for codes resolved through the class table.
    pub fn is_variable(&self) -> bool {
        self.0 >= Self::FIRST_CLASS_TYPE
    }

    /// Supertype of a fixed type code.
    pub fn fixed_supertype(&self) -> SuperType {
        match self.0 {
            0x01..=0x08 | 0x0A..=0x29 | 0x2C..=0x2F | 0x4A | 0x4C..=0x4E | 0x1F2 => {
                SuperType::Entity
            }
            0x2A | 0x30..=0x49 | 0x4F..=0x52 | 0x1F3 => SuperType::Object,
            _ => SuperType::Unknown,
        }
    }

    /// Record name of a fixed type code.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self.0 {
            0x01 => "TEXT",
            0x02 => "ATTRIB",
            0x03 => "ATTDEF",
            0x04 => "BLOCK",
            0x05 => "ENDBLK",
            0x06 => "SEQEND",
            0x07 => "INSERT",
            0x08 => "MINSERT",
            0x0A => "VERTEX_2D",
            0x0B => "VERTEX_3D",
            0x0C => "VERTEX_MESH",
            0x0D => "VERTEX_PFACE",
            0x0E => "VERTEX_PFACE_FACE",
            0x0F => "POLYLINE_2D",
            0x10 => "POLYLINE_3D",
            0x11 => "ARC",
            0x12 => "CIRCLE",
            0x13 => "LINE",
            0x14 => "DIMENSION_ORDINATE",
            0x15 => "DIMENSION_LINEAR",
            0x16 => "DIMENSION_ALIGNED",
            0x17 => "DIMENSION_ANG3PT",
            0x18 => "DIMENSION_ANG2LN",
            0x19 => "DIMENSION_RADIUS",
            0x1A => "DIMENSION_DIAMETER",
            0x1B => "POINT",
            0x1C => "3DFACE",
            0x1D => "POLYLINE_PFACE",
            0x1E => "POLYLINE_MESH",
            0x1F => "SOLID",
            0x20 => "TRACE",
            0x21 => "SHAPE",
            0x22 => "VIEWPORT",
            0x23 => "ELLIPSE",
            0x24 => "SPLINE",
            0x25 => "REGION",
            0x26 => "3DSOLID",
            0x27 => "BODY",
            0x28 => "RAY",
            0x29 => "XLINE",
            0x2A => "DICTIONARY",
            0x2C => "MTEXT",
            0x2D => "LEADER",
            0x2E => "TOLERANCE",
            0x2F => "MLINE",
            0x30 => "BLOCK_CONTROL",
            0x31 => "BLOCK_HEADER",
            0x32 => "LAYER_CONTROL",
            0x33 => "LAYER",
            0x34 => "STYLE_CONTROL",
            0x35 => "STYLE",
            0x38 => "LTYPE_CONTROL",
            0x39 => "LTYPE",
            0x3C => "VIEW_CONTROL",
            0x3D => "VIEW",
            0x3E => "UCS_CONTROL",
            0x3F => "UCS",
            0x40 => "VPORT_CONTROL",
            0x41 => "VPORT",
            0x42 => "APPID_CONTROL",
            0x43 => "APPID",
            0x44 => "DIMSTYLE_CONTROL",
            0x45 => "DIMSTYLE",
            0x46 => "VP_ENT_HDR_CONTROL",
            0x47 => "VP_ENT_HDR",
            0x48 => "GROUP",
            0x49 => "MLINESTYLE",
            0x4A => "OLE2FRAME",
            0x4C => "LONG_TRANSACTION",
            0x4D => "LWPOLYLINE",
            0x4E => "HATCH",
            0x4F => "XRECORD",
            0x50 => "ACDBPLACEHOLDER",
            0x51 => "VBA_PROJECT",
            0x52 => "LAYOUT",
            0x1F2 => "PROXY_ENTITY",
            0x1F3 => "PROXY_OBJECT",
            _ => return None,
        };
        Some(name)
    }
}

/// Graphical or non-graphical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SuperType {
    Entity,
    Object,
    /// Type code not in the fixed table and not described by a class.
    #[default]
    Unknown,
}

/// Outcome of decoding one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ObjectStatus {
    #[default]
    Decoded,
    /// The record's own handle could not be read.
    HandleError,
    /// An EED chain declared more than the allowed number of bytes.
    SizeExceeded,
    /// The record ran past its buffer or held an invalid value.
    Truncated(String),
    /// Type not recognized; only the envelope was read.
    Unknown,
}

/// One extended entity data chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedData {
    /// APPID the data belongs to.
    pub app_handle: Handle,
    pub data: Vec<u8>,
}

/// Common fields of graphical records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityCommon {
    pub picture: Option<Vec<u8>>,
    /// 0: owner in the handle stream, 1: paper space, 2: model space.
    pub entity_mode: u8,
    pub num_reactors: u32,
    pub xdic_missing: bool,
    pub is_bylayer_linetype: bool,
    pub no_links: bool,
    pub color: EntityColor,
    pub linetype_scale: f64,
    pub linetype_flags: u8,
    pub plotstyle_flags: u8,
    pub material_flags: u8,
    pub shadow_flags: u8,
    pub invisible: i16,
    pub lineweight: u8,
}

/// Common fields of non-graphical records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectCommon {
    pub num_reactors: u32,
    pub xdic_missing: bool,
}

/// Supertype specific part of the common header.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CommonData {
    #[default]
    None,
    Entity(EntityCommon),
    Object(ObjectCommon),
}

/// References read from the handle stream, as indices into the drawing's
/// reference table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommonHandleRefs {
    pub owner: Option<usize>,
    pub reactors: Vec<usize>,
    pub xdictionary: Option<usize>,
    pub layer: Option<usize>,
    pub linetype: Option<usize>,
    pub prev_entity: Option<usize>,
    pub next_entity: Option<usize>,
    pub color_book: Option<usize>,
    pub material: Option<usize>,
    pub plotstyle: Option<usize>,
}

/// Type specific data decoded for a few record kinds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ObjectPayload {
    #[default]
    None,
    XRecord {
        data: XDataChain,
        cloning_flags: Option<i16>,
    },
}

/// A record of the object table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DwgObject {
    /// Position in the object table.
    pub index: usize,
    /// Byte offset of the record in the object data section.
    pub address: u64,
    /// Byte size from the `MS` prefix.
    pub size: u32,
    pub object_type: DwgObjectType,
    pub supertype: SuperType,
    /// Record name: fixed type name or class record name.
    pub type_name: Option<String>,
    pub handle: Handle,
    /// Bit length of the data stream; the handle stream starts there.
    pub bitsize: u32,
    pub eed: Vec<ExtendedData>,
    pub common: CommonData,
    pub handle_refs: CommonHandleRefs,
    pub payload: ObjectPayload,
    pub status: ObjectStatus,
}

impl DwgObject {
    pub fn is_entity(&self) -> bool {
        self.supertype == SuperType::Entity
    }

    /// Total number of EED bytes over all chains.
    pub fn eed_size(&self) -> usize {
        self.eed.iter().map(|e| e.data.len()).sum()
    }

    pub fn entity(&self) -> Option<&EntityCommon> {
        match &self.common {
            CommonData::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn picture(&self) -> Option<&[u8]> {
        self.entity().and_then(|e| e.picture.as_deref())
    }

    /// Drop everything derived from the record's handle.
    pub fn reset_header(&mut self) {
        self.handle = Handle::default();
        self.bitsize = 0;
        self.eed.clear();
        self.common = CommonData::None;
        self.handle_refs = CommonHandleRefs::default();
    }
}
