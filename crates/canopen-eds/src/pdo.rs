// crates/canopen-eds/src/pdo.rs

use crate::types::parse_int;
use alloc::format;
use alloc::string::String;

/// A single PDO mapping entry, packed into a 32-bit value.
/// (CiA 301, PDO mapping parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdoMappingEntry {
    /// Object Dictionary index of the mapped object.
    pub index: u16,
    /// Object Dictionary sub-index of the mapped object.
    pub sub_index: u8,
    /// Length of the mapped object in bits.
    pub length_bits: u8,
}

impl PdoMappingEntry {
    pub const fn from_u32(value: u32) -> Self {
        Self {
            index: (value >> 16) as u16,
            sub_index: ((value >> 8) & 0xFF) as u8,
            length_bits: (value & 0xFF) as u8,
        }
    }

    pub const fn to_u32(&self) -> u32 {
        ((self.index as u32) << 16) | ((self.sub_index as u32) << 8) | self.length_bits as u32
    }

    /// Decodes a mapping entry from its `DefaultValue` text.
    ///
    /// Returns `None` for anything that is not an integer literal fitting in
    /// 32 bits (e.g. `$NODEID` expressions or an empty string).
    pub fn parse(value: &str) -> Option<Self> {
        let raw = parse_int(value).ok()?;
        u32::try_from(raw).ok().map(Self::from_u32)
    }

    /// The all-zero sentinel marking an unused mapping slot.
    pub const fn is_unused(&self) -> bool {
        self.to_u32() == 0
    }

    /// Canonical `DefaultValue` text, e.g. `0x60000108`.
    pub fn to_default_value(&self) -> String {
        format!("0x{:08X}", self.to_u32())
    }
}

/// `true` for the reserved dummy-object indexes, which may be mapped to pad
/// a PDO without referencing a real object.
pub const fn is_dummy_index(index: u16) -> bool {
    index >= 0x0001 && index <= 0x001B
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_mapping_value() {
        let entry = PdoMappingEntry::from_u32(0x6000_0108);
        assert_eq!(entry.index, 0x6000);
        assert_eq!(entry.sub_index, 0x01);
        assert_eq!(entry.length_bits, 8);
        assert_eq!(entry.to_u32(), 0x6000_0108);
    }

    #[test]
    fn test_parse_default_value_text() {
        let entry = PdoMappingEntry::parse("0x20010020").unwrap();
        assert_eq!(entry.index, 0x2001);
        assert_eq!(entry.sub_index, 0);
        assert_eq!(entry.length_bits, 32);

        assert!(PdoMappingEntry::parse("0").unwrap().is_unused());
        assert!(PdoMappingEntry::parse("0x100000000").is_none());
        assert!(PdoMappingEntry::parse("$NODEID+0x180").is_none());
        assert!(PdoMappingEntry::parse("").is_none());
    }

    #[test]
    fn test_canonical_text_is_eight_hex_digits() {
        let entry = PdoMappingEntry {
            index: 0x6401,
            sub_index: 0x02,
            length_bits: 0x10,
        };
        assert_eq!(entry.to_default_value(), "0x64010210");
        let zero = PdoMappingEntry::from_u32(0);
        assert_eq!(zero.to_default_value(), "0x00000000");
    }

    #[test]
    fn test_dummy_index_range() {
        assert!(is_dummy_index(0x0005));
        assert!(is_dummy_index(0x001B));
        assert!(!is_dummy_index(0x0000));
        assert!(!is_dummy_index(0x1000));
    }
}
