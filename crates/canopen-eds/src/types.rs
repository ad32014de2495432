// crates/canopen-eds/src/types.rs

//! Schema enumerations shared by every EDS/DCF reader and writer.
//!
//! Each enum has one canonical text encoding (its `Display` impl) and a
//! `FromStr` impl accepting everything the canonical encoding produces plus
//! the decimal/hex spellings found in real-world files.

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

/// Parses an integer literal as written in EDS files.
///
/// Both bare decimal (`1000`, `-5`) and `0x`-prefixed hexadecimal
/// (`0x3E8`, `-0x10`) forms are accepted. Surrounding whitespace is ignored.
/// A single leading `-` is the only sign allowed.
pub fn parse_int(s: &str) -> Result<i128, ParseIntError> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => unsigned_digits(hex, 16)?,
        None => unsigned_digits(digits, 10)?,
    };
    Ok(if negative { -value } else { value })
}

fn unsigned_digits(digits: &str, radix: u32) -> Result<i128, ParseIntError> {
    match digits.get(..1) {
        // Fails with InvalidDigit: a second sign is not a digit.
        Some(sign @ ("+" | "-")) => i128::from_str_radix(sign, radix),
        _ => i128::from_str_radix(digits, radix),
    }
}

/// A schema value (object type, data type, access type) was not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSchemaValue;

impl fmt::Display for InvalidSchemaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value is not a valid schema value")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidSchemaValue {}

impl From<ParseIntError> for InvalidSchemaValue {
    fn from(_: ParseIntError) -> Self {
        InvalidSchemaValue
    }
}

/// The structural kind of an object dictionary entry (CiA 306 `ObjectType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ObjectType {
    Var = 0x07,
    Array = 0x08,
    Record = 0x09,
}

impl TryFrom<u8> for ObjectType {
    type Error = InvalidSchemaValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x07 => Ok(ObjectType::Var),
            0x08 => Ok(ObjectType::Array),
            0x09 => Ok(ObjectType::Record),
            _ => Err(InvalidSchemaValue),
        }
    }
}

impl FromStr for ObjectType {
    type Err = InvalidSchemaValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = u8::try_from(parse_int(s)?).map_err(|_| InvalidSchemaValue)?;
        ObjectType::try_from(raw)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", *self as u8)
    }
}

/// CiA 301 data types, keyed by their object dictionary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum DataType {
    Boolean = 0x0001,
    Integer8 = 0x0002,
    Integer16 = 0x0003,
    Integer32 = 0x0004,
    Unsigned8 = 0x0005,
    Unsigned16 = 0x0006,
    Unsigned32 = 0x0007,
    Real32 = 0x0008,
    VisibleString = 0x0009,
    OctetString = 0x000A,
    UnicodeString = 0x000B,
    TimeOfDay = 0x000C,
    TimeDifference = 0x000D,
    // 0x000E reserved
    Domain = 0x000F,
    Integer24 = 0x0010,
    Real64 = 0x0011,
    Integer40 = 0x0012,
    Integer48 = 0x0013,
    Integer56 = 0x0014,
    Integer64 = 0x0015,
    Unsigned24 = 0x0016,
    // 0x0017 reserved
    Unsigned40 = 0x0018,
    Unsigned48 = 0x0019,
    Unsigned56 = 0x001A,
    Unsigned64 = 0x001B,
}

impl DataType {
    /// Size of one value in bits.
    ///
    /// Returns 0 for variable-length types, whose size is derived from the
    /// encoded value instead.
    pub const fn bit_size(self) -> u32 {
        match self {
            // Stored as a full byte by every consumer of the generated sources.
            DataType::Boolean => 8,
            DataType::Integer8 | DataType::Unsigned8 => 8,
            DataType::Integer16 | DataType::Unsigned16 => 16,
            DataType::Integer24 | DataType::Unsigned24 => 24,
            DataType::Integer32 | DataType::Unsigned32 | DataType::Real32 => 32,
            DataType::Integer40 | DataType::Unsigned40 => 40,
            DataType::Integer48 | DataType::Unsigned48 => 48,
            DataType::TimeOfDay | DataType::TimeDifference => 48,
            DataType::Integer56 | DataType::Unsigned56 => 56,
            DataType::Integer64 | DataType::Unsigned64 | DataType::Real64 => 64,
            DataType::VisibleString
            | DataType::OctetString
            | DataType::UnicodeString
            | DataType::Domain => 0,
        }
    }

    /// `true` for types whose size comes from the value rather than the type.
    pub const fn is_variable_length(self) -> bool {
        self.bit_size() == 0
    }

    /// `true` for the two text string types.
    pub const fn is_text(self) -> bool {
        matches!(self, DataType::VisibleString | DataType::UnicodeString)
    }

    /// `true` for signed integer types.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::Integer8
                | DataType::Integer16
                | DataType::Integer24
                | DataType::Integer32
                | DataType::Integer40
                | DataType::Integer48
                | DataType::Integer56
                | DataType::Integer64
        )
    }

    /// The upper-case CiA 301 name, e.g. `UNSIGNED32`.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Integer8 => "INTEGER8",
            DataType::Integer16 => "INTEGER16",
            DataType::Integer32 => "INTEGER32",
            DataType::Unsigned8 => "UNSIGNED8",
            DataType::Unsigned16 => "UNSIGNED16",
            DataType::Unsigned32 => "UNSIGNED32",
            DataType::Real32 => "REAL32",
            DataType::VisibleString => "VISIBLE_STRING",
            DataType::OctetString => "OCTET_STRING",
            DataType::UnicodeString => "UNICODE_STRING",
            DataType::TimeOfDay => "TIME_OF_DAY",
            DataType::TimeDifference => "TIME_DIFFERENCE",
            DataType::Domain => "DOMAIN",
            DataType::Integer24 => "INTEGER24",
            DataType::Real64 => "REAL64",
            DataType::Integer40 => "INTEGER40",
            DataType::Integer48 => "INTEGER48",
            DataType::Integer56 => "INTEGER56",
            DataType::Integer64 => "INTEGER64",
            DataType::Unsigned24 => "UNSIGNED24",
            DataType::Unsigned40 => "UNSIGNED40",
            DataType::Unsigned48 => "UNSIGNED48",
            DataType::Unsigned56 => "UNSIGNED56",
            DataType::Unsigned64 => "UNSIGNED64",
        }
    }
}

impl TryFrom<u16> for DataType {
    type Error = InvalidSchemaValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let data_type = match value {
            0x0001 => DataType::Boolean,
            0x0002 => DataType::Integer8,
            0x0003 => DataType::Integer16,
            0x0004 => DataType::Integer32,
            0x0005 => DataType::Unsigned8,
            0x0006 => DataType::Unsigned16,
            0x0007 => DataType::Unsigned32,
            0x0008 => DataType::Real32,
            0x0009 => DataType::VisibleString,
            0x000A => DataType::OctetString,
            0x000B => DataType::UnicodeString,
            0x000C => DataType::TimeOfDay,
            0x000D => DataType::TimeDifference,
            0x000F => DataType::Domain,
            0x0010 => DataType::Integer24,
            0x0011 => DataType::Real64,
            0x0012 => DataType::Integer40,
            0x0013 => DataType::Integer48,
            0x0014 => DataType::Integer56,
            0x0015 => DataType::Integer64,
            0x0016 => DataType::Unsigned24,
            0x0018 => DataType::Unsigned40,
            0x0019 => DataType::Unsigned48,
            0x001A => DataType::Unsigned56,
            0x001B => DataType::Unsigned64,
            _ => return Err(InvalidSchemaValue),
        };
        Ok(data_type)
    }
}

impl FromStr for DataType {
    type Err = InvalidSchemaValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = u16::try_from(parse_int(s)?).map_err(|_| InvalidSchemaValue)?;
        DataType::try_from(raw)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", *self as u16)
    }
}

/// Access rights of a variable (CiA 306 `AccessType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// read only access
    Ro,
    /// write only access
    Wo,
    /// read and write access
    Rw,
    /// read and write access, mapped into RPDOs
    Rwr,
    /// read and write access, mapped into TPDOs
    Rww,
    /// read only access, value is constant
    Const,
}

impl AccessType {
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessType::Ro => "ro",
            AccessType::Wo => "wo",
            AccessType::Rw => "rw",
            AccessType::Rwr => "rwr",
            AccessType::Rww => "rww",
            AccessType::Const => "const",
        }
    }
}

impl FromStr for AccessType {
    type Err = InvalidSchemaValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [
            AccessType::Ro,
            AccessType::Wo,
            AccessType::Rw,
            AccessType::Rwr,
            AccessType::Rww,
            AccessType::Const,
        ]
        .into_iter()
        .find(|a| a.as_str().eq_ignore_ascii_case(s))
        .ok_or(InvalidSchemaValue)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    const ALL_DATA_TYPES: [DataType; 25] = [
        DataType::Boolean,
        DataType::Integer8,
        DataType::Integer16,
        DataType::Integer32,
        DataType::Unsigned8,
        DataType::Unsigned16,
        DataType::Unsigned32,
        DataType::Real32,
        DataType::VisibleString,
        DataType::OctetString,
        DataType::UnicodeString,
        DataType::TimeOfDay,
        DataType::TimeDifference,
        DataType::Domain,
        DataType::Integer24,
        DataType::Real64,
        DataType::Integer40,
        DataType::Integer48,
        DataType::Integer56,
        DataType::Integer64,
        DataType::Unsigned24,
        DataType::Unsigned40,
        DataType::Unsigned48,
        DataType::Unsigned56,
        DataType::Unsigned64,
    ];

    #[test]
    fn test_parse_int_decimal_and_hex() {
        assert_eq!(parse_int("1000"), Ok(1000));
        assert_eq!(parse_int("0x3E8"), Ok(1000));
        assert_eq!(parse_int("0X3e8"), Ok(1000));
        assert_eq!(parse_int(" -5 "), Ok(-5));
        assert_eq!(parse_int("0xFFFFFFFFFFFFFFFF"), Ok(u64::MAX as i128));
        assert!(parse_int("").is_err());
        assert!(parse_int("0x").is_err());
        assert!(parse_int("12ab").is_err());
        assert!(parse_int("$NODEID+0x180").is_err());
        assert_eq!(parse_int("-0x10"), Ok(-16));
    }

    #[test]
    fn test_parse_int_rejects_extra_signs() {
        for text in ["--5", "+5", "-+5", "0x-5", "0x+5", "-0x-5", "+", "-"] {
            assert!(parse_int(text).is_err(), "{:?} should not parse", text);
        }
    }

    #[test]
    fn test_data_type_text_is_inverse() {
        for data_type in ALL_DATA_TYPES {
            let text = data_type.to_string();
            assert_eq!(text.len(), 6, "{} is not 0xNNNN", text);
            assert_eq!(text.parse::<DataType>(), Ok(data_type));
        }
        // Short and decimal spellings found in the wild.
        assert_eq!("0x7".parse::<DataType>(), Ok(DataType::Unsigned32));
        assert_eq!("7".parse::<DataType>(), Ok(DataType::Unsigned32));
        assert!("0x0E".parse::<DataType>().is_err());
        assert!("0x10000".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_bit_sizes() {
        assert_eq!(DataType::Unsigned8.bit_size(), 8);
        assert_eq!(DataType::Integer24.bit_size(), 24);
        assert_eq!(DataType::Unsigned40.bit_size(), 40);
        assert_eq!(DataType::Integer56.bit_size(), 56);
        assert_eq!(DataType::Real64.bit_size(), 64);
        assert!(DataType::OctetString.is_variable_length());
        assert!(DataType::Domain.is_variable_length());
        assert!(!DataType::Unsigned64.is_variable_length());
    }

    #[test]
    fn test_object_type_text() {
        assert_eq!(ObjectType::Var.to_string(), "0x07");
        assert_eq!(ObjectType::Record.to_string(), "0x09");
        assert_eq!("0x7".parse::<ObjectType>(), Ok(ObjectType::Var));
        assert_eq!("8".parse::<ObjectType>(), Ok(ObjectType::Array));
        assert!("0x2".parse::<ObjectType>().is_err());
        assert!("0x109".parse::<ObjectType>().is_err());
    }

    #[test]
    fn test_access_type_text() {
        assert_eq!("RO".parse::<AccessType>(), Ok(AccessType::Ro));
        assert_eq!("const".parse::<AccessType>(), Ok(AccessType::Const));
        assert_eq!(" Rww".parse::<AccessType>(), Ok(AccessType::Rww));
        assert_eq!(AccessType::Rwr.to_string(), "rwr");
        assert!("readwrite".parse::<AccessType>().is_err());
    }
}
