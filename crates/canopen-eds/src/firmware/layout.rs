// crates/canopen-eds/src/firmware/layout.rs

//! Byte-accurate C storage for a single variable.

use crate::od::{DefaultValue, Variable, octet_string_bytes, strip_node_id};
use crate::types::{AccessType, DataType};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use log::warn;

/// How one variable is stored in a generated struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Field {
    pub c_type: &'static str,
    /// Element count when the member is a C array (`char[n]`, `uint8_t[n]`).
    pub elements: Option<usize>,
    /// Bytes reported to the stack as `dataLength`.
    pub data_length: usize,
    /// C initializer expression.
    pub initializer: String,
}

impl Field {
    /// `type name;` or `type name[n];`
    pub fn declaration(&self, name: &str) -> String {
        match self.elements {
            Some(n) => format!("{} {}[{}];", self.c_type, name, n),
            None => format!("{} {};", self.c_type, name),
        }
    }

    /// Address expression for `dataOrig`.
    pub fn address(&self, path: &str) -> String {
        match self.elements {
            Some(_) => format!("&{}[0]", path),
            None => format!("&{}", path),
        }
    }

    /// `sizeof` of one element when used as an array element type.
    pub fn element_sizeof(&self) -> String {
        match self.elements {
            Some(n) => format!("{}", n),
            None => format!("sizeof({})", self.c_type),
        }
    }
}

/// C type of a fixed-width scalar the target compiler has a native type for.
fn scalar_c_type(data_type: DataType) -> Option<&'static str> {
    Some(match data_type {
        DataType::Boolean => "bool",
        DataType::Integer8 => "int8_t",
        DataType::Integer16 => "int16_t",
        DataType::Integer32 => "int32_t",
        DataType::Integer64 => "int64_t",
        DataType::Unsigned8 => "uint8_t",
        DataType::Unsigned16 => "uint16_t",
        DataType::Unsigned32 => "uint32_t",
        DataType::Unsigned64 => "uint64_t",
        DataType::Real32 => "float",
        DataType::Real64 => "double",
        _ => return None,
    })
}

/// Storage for `variable`, or `None` for DOMAIN, which has no storage.
pub(super) fn field(variable: &Variable, context: &str) -> Option<Field> {
    let data_type = variable.data_type;
    let field = match data_type {
        DataType::Domain => return None,
        DataType::VisibleString | DataType::UnicodeString => {
            let text = &variable.default_value;
            Field {
                c_type: "char",
                elements: Some(text.len() + 1),
                data_length: text.len(),
                initializer: c_string_literal(text),
            }
        }
        DataType::OctetString => {
            let bytes = octet_string_bytes(&variable.default_value).unwrap_or_else(|| {
                warn!("{}: invalid OCTET_STRING value, stored as empty", context);
                Vec::new()
            });
            Field {
                c_type: "uint8_t",
                elements: Some(bytes.len().max(1)),
                data_length: bytes.len(),
                initializer: byte_list(if bytes.is_empty() { &[0u8][..] } else { &bytes[..] }),
            }
        }
        _ => {
            let width = (data_type.bit_size() / 8) as usize;
            let value = decode_numeric(variable, context);
            match scalar_c_type(data_type) {
                Some(c_type) => Field {
                    c_type,
                    elements: None,
                    data_length: width,
                    initializer: scalar_literal(data_type, width, &value, context),
                },
                // Odd widths have no C type; store them as little-endian bytes.
                None => {
                    let bytes = value.le_bytes(width).unwrap_or_else(|| alloc::vec![0; width]);
                    Field {
                        c_type: "uint8_t",
                        elements: Some(width),
                        data_length: width,
                        initializer: byte_list(&bytes),
                    }
                }
            }
        }
    };
    Some(field)
}

fn decode_numeric(variable: &Variable, context: &str) -> DefaultValue {
    let text = strip_node_id(&variable.default_value);
    DefaultValue::decode(variable.data_type, &text).unwrap_or_else(|| {
        warn!(
            "{}: DefaultValue \"{}\" is not a valid {}, stored as 0",
            context,
            variable.default_value,
            variable.data_type.name()
        );
        DefaultValue::Empty
    })
}

fn scalar_literal(data_type: DataType, width: usize, value: &DefaultValue, context: &str) -> String {
    match (data_type, value) {
        (DataType::Boolean, DefaultValue::Integer(v)) if *v != 0 => String::from("true"),
        (DataType::Boolean, _) => String::from("false"),
        (DataType::Real32 | DataType::Real64, DefaultValue::Real(v)) if v.is_finite() => format!("{:?}", v),
        (DataType::Real32 | DataType::Real64, DefaultValue::Real(v)) => {
            warn!("{}: DefaultValue {} has no C literal, stored as 0.0", context, v);
            String::from("0.0")
        }
        (DataType::Real32 | DataType::Real64, _) => String::from("0.0"),
        (dt, DefaultValue::Integer(v)) if dt.is_signed() => format!("{}", v),
        (_, DefaultValue::Integer(v)) => {
            let mask = if width >= 16 { u128::MAX } else { (1u128 << (width * 8)) - 1 };
            format!("0x{:0w$X}", (*v as u128) & mask, w = width * 2)
        }
        (dt, _) if dt.is_signed() => String::from("0"),
        _ => format!("0x{:0w$X}", 0, w = width * 2),
    }
}

fn byte_list(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| format!("0x{:02X}", b)).collect();
    format!("{{{}}}", items.join(", "))
}

fn c_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// CANopenNode `ODA_*` attribute flags of a variable.
pub(super) fn attribute(variable: &Variable) -> String {
    let mut flags = String::from(match variable.access_type {
        AccessType::Ro | AccessType::Const => "ODA_SDO_R",
        AccessType::Wo => "ODA_SDO_W",
        AccessType::Rw | AccessType::Rwr | AccessType::Rww => "ODA_SDO_RW",
    });
    if variable.pdo_mapping {
        flags.push_str(match variable.access_type {
            AccessType::Ro | AccessType::Const => " | ODA_TPDO",
            AccessType::Wo => " | ODA_RPDO",
            AccessType::Rw | AccessType::Rwr | AccessType::Rww => " | ODA_TRPDO",
        });
    }
    if variable.data_type.is_text() {
        flags.push_str(" | ODA_STR");
    } else if variable.data_type.bit_size() > 8 {
        flags.push_str(" | ODA_MB");
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(data_type: DataType, default: &str) -> Variable {
        Variable::new("v", data_type, AccessType::Rw).with_default(default)
    }

    #[test]
    fn test_scalar_fields() {
        let f = field(&var(DataType::Unsigned32, "$NODEID+0x180"), "t").unwrap();
        assert_eq!(f.c_type, "uint32_t");
        assert_eq!(f.initializer, "0x00000180");
        assert_eq!(f.data_length, 4);
        assert_eq!(f.declaration("x1800"), "uint32_t x1800;");

        let f = field(&var(DataType::Integer16, "-12"), "t").unwrap();
        assert_eq!(f.initializer, "-12");
        let f = field(&var(DataType::Unsigned8, ""), "t").unwrap();
        assert_eq!(f.initializer, "0x00");
        let f = field(&var(DataType::Boolean, "1"), "t").unwrap();
        assert_eq!(f.initializer, "true");
        let f = field(&var(DataType::Real32, "2.5"), "t").unwrap();
        assert_eq!(f.initializer, "2.5");
    }

    #[test]
    fn test_non_finite_reals_are_stored_as_zero() {
        for text in ["NaN", "inf", "-inf"] {
            let f = field(&var(DataType::Real32, text), "t").unwrap();
            assert_eq!(f.initializer, "0.0", "REAL32 {}", text);
            let f = field(&var(DataType::Real64, text), "t").unwrap();
            assert_eq!(f.initializer, "0.0", "REAL64 {}", text);
        }
        let f = field(&var(DataType::Real64, "-1e3"), "t").unwrap();
        assert_eq!(f.initializer, "-1000.0");
    }

    #[test]
    fn test_variable_length_fields() {
        let f = field(&var(DataType::VisibleString, "abc"), "t").unwrap();
        assert_eq!(f.declaration("name"), "char name[4];");
        assert_eq!(f.data_length, 3);
        assert_eq!(f.initializer, "\"abc\"");
        assert_eq!(f.address("OD_RAM.name"), "&OD_RAM.name[0]");

        let f = field(&var(DataType::OctetString, "A1 B2 C3"), "t").unwrap();
        assert_eq!(f.declaration("key"), "uint8_t key[3];");
        assert_eq!(f.initializer, "{0xA1, 0xB2, 0xC3}");
        assert_eq!(f.data_length, 3);

        let f = field(&var(DataType::OctetString, ""), "t").unwrap();
        assert_eq!(f.elements, Some(1));
        assert_eq!(f.data_length, 0);

        assert!(field(&var(DataType::Domain, "x"), "t").is_none());
    }

    #[test]
    fn test_odd_width_fields_are_byte_arrays() {
        let f = field(&var(DataType::Unsigned24, "0x123456"), "t").unwrap();
        assert_eq!(f.declaration("v"), "uint8_t v[3];");
        assert_eq!(f.initializer, "{0x56, 0x34, 0x12}");
        assert_eq!(f.element_sizeof(), "3");

        let f = field(&var(DataType::TimeOfDay, ""), "t").unwrap();
        assert_eq!(f.elements, Some(6));
    }

    #[test]
    fn test_attribute_flags() {
        let mut v = var(DataType::Unsigned16, "0");
        assert_eq!(attribute(&v), "ODA_SDO_RW | ODA_MB");
        v.pdo_mapping = true;
        assert_eq!(attribute(&v), "ODA_SDO_RW | ODA_TRPDO | ODA_MB");
        v.access_type = AccessType::Const;
        v.data_type = DataType::Unsigned8;
        assert_eq!(attribute(&v), "ODA_SDO_R | ODA_TPDO");
        v.access_type = AccessType::Wo;
        v.data_type = DataType::VisibleString;
        assert_eq!(attribute(&v), "ODA_SDO_W | ODA_RPDO | ODA_STR");
    }
}
