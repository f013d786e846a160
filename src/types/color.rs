//! Entity color as stored in the common entity header.

use bitflags::bitflags;

bitflags! {
    /// High bits of the inline color word used from R2004 on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColorFlags: u16 {
        /// Four RGB bytes and a color name follow.
        const RGB = 0x8000;
        /// The color comes from an AcDbColor object in the handle stream.
        const REFERENCE = 0x4000;
        /// A transparency value follows.
        const TRANSPARENCY = 0x2000;
    }
}

/// Color of an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EntityColor {
    /// No color was decoded.
    #[default]
    None,
    /// Color index from the pre-R2004 `CMC` field.
    Index(i16),
    /// R2004+ single byte index (color mode 1).
    Indexed(u8),
    /// R2004+ flag word with optional parts.
    Complex {
        flags: ColorFlags,
        index: u16,
        rgb: Option<[u8; 4]>,
        name: Option<String>,
        transparency: Option<u32>,
    },
    /// R2004+ single bit stored when the entity has links disabled.
    Flag(bool),
}

impl EntityColor {
    /// `true` when the color refers to an AcDbColor object.
    pub fn has_reference(&self) -> bool {
        matches!(self, EntityColor::Complex { flags, .. } if flags.contains(ColorFlags::REFERENCE))
    }

    /// ACI index when one is available.
    pub fn index(&self) -> Option<i16> {
        match self {
            EntityColor::Index(index) => Some(*index),
            EntityColor::Indexed(index) => Some(*index as i16),
            EntityColor::Complex { index, .. } => Some(*index as i16),
            EntityColor::None | EntityColor::Flag(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_split_word() {
        let word = 0xE000 | 7u16;
        let flags = ColorFlags::from_bits_truncate(word);
        assert!(flags.contains(ColorFlags::RGB));
        assert!(flags.contains(ColorFlags::REFERENCE));
        assert!(flags.contains(ColorFlags::TRANSPARENCY));
        assert_eq!(word & 0x1FFF, 7);
    }

    #[test]
    fn test_reference_and_index() {
        let color = EntityColor::Complex {
            flags: ColorFlags::REFERENCE,
            index: 3,
            rgb: None,
            name: None,
            transparency: None,
        };
        assert!(color.has_reference());
        assert_eq!(color.index(), Some(3));
        assert!(!EntityColor::Index(1).has_reference());
        assert_eq!(EntityColor::Flag(true).index(), None);
    }
}
