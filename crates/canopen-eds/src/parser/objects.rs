// crates/canopen-eds/src/parser/objects.rs

//! Readers for index (`[XXXX]`) and subindex (`[XXXXsubY]`) sections.

use super::section::{FieldReader, Notes, Section, flag};
use crate::od::{Array, DEFAULT_STORAGE_LOCATION, Record, Variable, normalize_octet_string};
use crate::types::{AccessType, DataType, ObjectType, parse_int};
use alloc::string::{String, ToString};

/// Keys valid in a VAR section.
const VARIABLE_ENTRIES: [&str; 9] = [
    "ParameterName",
    "Denotation",
    "ObjectType",
    "DataType",
    "LowLimit",
    "HighLimit",
    "DefaultValue",
    "AccessType",
    "PDOMapping",
];

/// Keys valid in an ARRAY or RECORD section.
const CONTAINER_ENTRIES: [&str; 4] = ["ParameterName", "Denotation", "ObjectType", "SubNumber"];

/// The `ObjectType` of an index section; VAR when absent or invalid.
pub(super) fn object_type(section: &Section, notes: &mut Notes) -> ObjectType {
    FieldReader::new(section, notes).optional(
        "ObjectType",
        |s| s.parse::<ObjectType>().ok(),
        ObjectType::Var,
    )
}

/// Reads a VAR section, top-level or subindex.
pub(super) fn read_variable(section: &Section, notes: &mut Notes) -> Variable {
    let mut reader = FieldReader::new(section, notes);
    let defaults = Variable::default();

    let parameter_name = reader.required(
        "ParameterName",
        |s| Some(s.to_string()),
        defaults.parameter_name.clone(),
    );
    let denotation = reader.optional_text("Denotation");
    let data_type = reader.required(
        "DataType",
        |s| s.parse::<DataType>().ok(),
        defaults.data_type,
    );
    let access_type = reader.required(
        "AccessType",
        |s| s.parse::<AccessType>().ok(),
        defaults.access_type,
    );
    let low_limit = reader.optional_text("LowLimit");
    let high_limit = reader.optional_text("HighLimit");
    let default_value = if data_type == DataType::OctetString {
        reader.optional("DefaultValue", normalize_octet_string, String::new())
    } else {
        reader.optional_text("DefaultValue")
    };
    let pdo_mapping = reader.optional("PDOMapping", flag, false);
    reader.reject_unknown_keys(&VARIABLE_ENTRIES);

    Variable {
        parameter_name,
        denotation,
        comments: section.comment.clone(),
        data_type,
        low_limit,
        high_limit,
        default_value,
        access_type,
        pdo_mapping,
        storage_location: section
            .storage_location
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE_LOCATION.to_string()),
    }
}

/// Fields shared by ARRAY and RECORD sections.
pub(super) struct ContainerFields {
    pub parameter_name: String,
    pub denotation: String,
    pub sub_number: Option<usize>,
}

pub(super) fn read_container_fields(
    section: &Section,
    notes: &mut Notes,
    fallback_name: &str,
) -> ContainerFields {
    let mut reader = FieldReader::new(section, notes);
    let parameter_name = reader.required(
        "ParameterName",
        |s| Some(s.to_string()),
        fallback_name.to_string(),
    );
    let denotation = reader.optional_text("Denotation");
    let sub_number = reader.required(
        "SubNumber",
        |s| parse_int(s).ok().and_then(|v| usize::try_from(v).ok()).map(Some),
        None,
    );
    reader.reject_unknown_keys(&CONTAINER_ENTRIES);
    ContainerFields {
        parameter_name,
        denotation,
        sub_number,
    }
}

pub(super) fn read_record(section: &Section, notes: &mut Notes) -> (Record, Option<usize>) {
    let fields = read_container_fields(section, notes, "Unknown record name");
    let mut record = Record::new(&fields.parameter_name);
    record.denotation = fields.denotation;
    record.comments = section.comment.clone();
    if let Some(tag) = &section.storage_location {
        record.set_storage_location(tag);
    }
    (record, fields.sub_number)
}

pub(super) fn read_array(section: &Section, notes: &mut Notes) -> (Array, Option<usize>) {
    let fields = read_container_fields(section, notes, "Unknown array name");
    let mut array = Array::new(&fields.parameter_name);
    array.denotation = fields.denotation;
    array.comments = section.comment.clone();
    if let Some(tag) = &section.storage_location {
        array.set_storage_location(tag);
    }
    (array, fields.sub_number)
}

/// Splits `[XXXX]` into its index.
pub(super) fn parse_index_header(name: &str) -> Option<u16> {
    if name.len() == 4 && name.bytes().all(|b| b.is_ascii_hexdigit()) {
        u16::from_str_radix(name, 16).ok()
    } else {
        None
    }
}

/// Splits `[XXXXsubY]` / `[XXXXsubYY]` into index and subindex.
pub(super) fn parse_subindex_header(name: &str) -> Option<(u16, u8)> {
    let index = parse_index_header(name.get(..4)?)?;
    let rest = name.get(4..)?;
    let marker = rest.get(..3)?;
    let sub = rest.get(3..)?;
    if !marker.eq_ignore_ascii_case("sub")
        || sub.is_empty()
        || sub.len() > 2
        || !sub.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    let subindex = u8::from_str_radix(sub, 16).ok()?;
    Some((index, subindex))
}
