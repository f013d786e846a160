//! DWG class definitions (AcDb:Classes section)
//!
//! Classes declare the object types with numbers 500 and up. A record whose
//! type code is `500 + n` is described by the `n`-th class of the table. The
//! class named `LAYOUT` is remembered so layout objects can be recognized
//! without a name lookup.

use ahash::AHashMap;

/// Item class id of classes whose instances are entities.
pub const ENTITY_CLASS_ID: i16 = 0x1F2;
/// Item class id of classes whose instances are non-graphical objects.
pub const OBJECT_CLASS_ID: i16 = 0x1F3;

/// Record name of the layout class.
pub const LAYOUT_CLASS_NAME: &str = "LAYOUT";

/// A single class record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwgClass {
    /// Class number, the type code of its instances (500 and up).
    pub number: i16,
    /// Proxy capability flags of the class.
    pub version: i16,
    pub app_name: String,
    pub cpp_name: String,
    /// Record (DXF) name, e.g. `LAYOUT` or `ACDBPLACEHOLDER`.
    pub dxf_name: String,
    pub was_zombie: bool,
    /// [`ENTITY_CLASS_ID`] or [`OBJECT_CLASS_ID`].
    pub item_class_id: i16,
    /// Instance count (R2004+).
    pub num_objects: i32,
    /// Release that introduced the class (R2004+).
    pub dwg_version: i16,
    /// Maintenance release (R2004+).
    pub maintenance_version: i16,
}

impl DwgClass {
    pub fn is_entity(&self) -> bool {
        self.item_class_id == ENTITY_CLASS_ID
    }
}

/// The class table of one drawing.
#[derive(Debug, Clone, Default)]
pub struct DwgClassCollection {
    entries: Vec<DwgClass>,
    name_index: AHashMap<String, usize>,
    layout_class: Option<i16>,
    max_class_number: Option<i16>,
}

impl DwgClassCollection {
    /// Create an empty class collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a class. The first class named exactly `LAYOUT` becomes the
    /// layout class.
    pub fn add(&mut self, class: DwgClass) {
        if class.dxf_name == LAYOUT_CLASS_NAME && self.layout_class.is_none() {
            self.layout_class = Some(class.number);
        }
        self.name_index
            .entry(class.dxf_name.clone())
            .or_insert(self.entries.len());
        self.entries.push(class);
    }

    /// Class describing records of type `type_code`, if any.
    pub fn for_type(&self, type_code: u16) -> Option<&DwgClass> {
        let index = (type_code as usize).checked_sub(500)?;
        self.entries.get(index)
    }

    /// Get a class by its record name (exact match)
    pub fn get_by_name(&self, dxf_name: &str) -> Option<&DwgClass> {
        self.name_index.get(dxf_name).map(|&idx| &self.entries[idx])
    }

    /// Class number of the `LAYOUT` class.
    pub fn layout_class(&self) -> Option<i16> {
        self.layout_class
    }

    /// Highest class number declared by the section header (R2004+).
    pub fn max_class_number(&self) -> Option<i16> {
        self.max_class_number
    }

    pub fn set_max_class_number(&mut self, number: i16) {
        self.max_class_number = Some(number);
    }

    /// Number of class definitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all class definitions
    pub fn iter(&self) -> impl Iterator<Item = &DwgClass> {
        self.entries.iter()
    }

    /// Clear all class definitions
    pub fn clear(&mut self) {
        self.entries.clear();
        self.name_index.clear();
        self.layout_class = None;
        self.max_class_number = None;
    }
}

impl<'a> IntoIterator for &'a DwgClassCollection {
    type Item = &'a DwgClass;
    type IntoIter = std::slice::Iter<'a, DwgClass>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
