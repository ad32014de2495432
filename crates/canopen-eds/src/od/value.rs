// crates/canopen-eds/src/od/value.rs

//! Typed views of the string-encoded `DefaultValue` field.
//!
//! The dictionary keeps every value as the text found in (or destined for)
//! the file. These helpers are the single place where that text is decoded
//! according to the variable's data type.

use crate::types::{DataType, parse_int};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// The decoded form of a `DefaultValue` string.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// No value was given.
    Empty,
    Integer(i128),
    Real(f64),
    /// VISIBLE_STRING, UNICODE_STRING and DOMAIN text, verbatim.
    Text(String),
    /// OCTET_STRING bytes.
    Bytes(Vec<u8>),
}

impl DefaultValue {
    /// Decodes `text` as a value of `data_type`.
    ///
    /// `$NODEID` terms are not resolved here; strip them first with
    /// [`strip_node_id`] when a numeric value is needed.
    /// Returns `None` if the text does not fit the data type.
    pub fn decode(data_type: DataType, text: &str) -> Option<Self> {
        let trimmed = text.trim();
        match data_type {
            DataType::VisibleString | DataType::UnicodeString | DataType::Domain => {
                Some(DefaultValue::Text(text.to_string()))
            }
            _ if trimmed.is_empty() => Some(DefaultValue::Empty),
            DataType::OctetString => octet_string_bytes(trimmed).map(DefaultValue::Bytes),
            DataType::Real32 | DataType::Real64 => trimmed.parse::<f64>().ok().map(DefaultValue::Real),
            DataType::Boolean => match trimmed {
                t if t.eq_ignore_ascii_case("true") => Some(DefaultValue::Integer(1)),
                t if t.eq_ignore_ascii_case("false") => Some(DefaultValue::Integer(0)),
                t => parse_int(t).ok().map(DefaultValue::Integer),
            },
            _ => parse_int(trimmed).ok().map(DefaultValue::Integer),
        }
    }

    /// Little-endian bytes of an integer value truncated to `width` bytes.
    ///
    /// Negative values are encoded in two's complement.
    pub fn le_bytes(&self, width: usize) -> Option<Vec<u8>> {
        match self {
            DefaultValue::Integer(v) => Some(v.to_le_bytes()[..width.min(16)].to_vec()),
            DefaultValue::Empty => Some(alloc::vec![0; width.min(16)]),
            _ => None,
        }
    }
}

impl fmt::Display for DefaultValue {
    /// Canonical text form; OCTET_STRING bytes become `A1 B2 C3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Empty => Ok(()),
            DefaultValue::Integer(v) => write!(f, "{}", v),
            DefaultValue::Real(v) => write!(f, "{:?}", v),
            DefaultValue::Text(s) => f.write_str(s),
            DefaultValue::Bytes(bytes) => {
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// Decodes OCTET_STRING text (`A1B2C3`, `a1 b2 c3`, ...) into bytes.
pub fn octet_string_bytes(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).ok()
}

/// Rewrites OCTET_STRING text as space separated upper-case byte pairs.
///
/// Returns `None` if the text is not an even number of hex digits.
pub fn normalize_octet_string(text: &str) -> Option<String> {
    octet_string_bytes(text).map(|bytes| DefaultValue::Bytes(bytes).to_string())
}

/// Removes a `$NODEID` term from a value such as `$NODEID+0x180`.
pub fn strip_node_id(text: &str) -> String {
    if !text.contains('+') {
        return text.to_string();
    }
    let kept: Vec<&str> = text
        .split('+')
        .map(str::trim)
        .filter(|term| !term.eq_ignore_ascii_case("$NODEID"))
        .collect();
    kept.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_octet_string_normalization() {
        assert_eq!(normalize_octet_string("A1B2C3").as_deref(), Some("A1 B2 C3"));
        assert_eq!(normalize_octet_string("a1 b2c3").as_deref(), Some("A1 B2 C3"));
        assert_eq!(normalize_octet_string("").as_deref(), Some(""));
        assert!(normalize_octet_string("A1B").is_none());
        assert!(normalize_octet_string("ZZ").is_none());
    }

    #[test]
    fn test_decode_by_data_type() {
        assert_eq!(
            DefaultValue::decode(DataType::Unsigned16, "0x10"),
            Some(DefaultValue::Integer(16))
        );
        assert_eq!(
            DefaultValue::decode(DataType::Integer8, "-3"),
            Some(DefaultValue::Integer(-3))
        );
        assert_eq!(
            DefaultValue::decode(DataType::Real32, "1.5"),
            Some(DefaultValue::Real(1.5))
        );
        assert_eq!(
            DefaultValue::decode(DataType::Boolean, "TRUE"),
            Some(DefaultValue::Integer(1))
        );
        assert_eq!(
            DefaultValue::decode(DataType::VisibleString, "hello"),
            Some(DefaultValue::Text("hello".to_string()))
        );
        assert_eq!(
            DefaultValue::decode(DataType::OctetString, "0102"),
            Some(DefaultValue::Bytes(vec![1, 2]))
        );
        assert_eq!(
            DefaultValue::decode(DataType::Unsigned32, ""),
            Some(DefaultValue::Empty)
        );
        assert!(DefaultValue::decode(DataType::Unsigned32, "$NODEID+0x180").is_none());
    }

    #[test]
    fn test_odd_width_little_endian_bytes() {
        let value = DefaultValue::Integer(0x0A0B0C);
        assert_eq!(value.le_bytes(3), Some(vec![0x0C, 0x0B, 0x0A]));
        let negative = DefaultValue::Integer(-2);
        assert_eq!(negative.le_bytes(5), Some(vec![0xFE, 0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(DefaultValue::Empty.le_bytes(6), Some(vec![0; 6]));
        assert!(DefaultValue::Real(1.0).le_bytes(4).is_none());
    }

    #[test]
    fn test_strip_node_id() {
        assert_eq!(strip_node_id("$NODEID+0x180"), "0x180");
        assert_eq!(strip_node_id("$NODEID + 0x200"), "0x200");
        assert_eq!(strip_node_id("0x580+$NODEID"), "0x580");
        assert_eq!(strip_node_id("0x80"), "0x80");
    }
}
