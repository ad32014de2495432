// crates/canopen-eds/src/parser/validate.rs

//! Consistency passes run once every section of a file has been read.

use super::info::DeclaredPdoCounts;
use super::section::Notes;
use crate::error::EdsError;
use crate::od::constants::is_pdo_mapping_index;
use crate::od::{Object, ObjectDictionary};
use crate::pdo::{PdoMappingEntry, is_dummy_index};
use crate::types::{DataType, parse_int};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use log::{debug, warn};

/// The three object list sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ObjectList {
    Mandatory,
    Optional,
    Manufacturer,
}

impl ObjectList {
    pub const ALL: [ObjectList; 3] = [
        ObjectList::Mandatory,
        ObjectList::Optional,
        ObjectList::Manufacturer,
    ];

    pub fn header(self) -> &'static str {
        match self {
            ObjectList::Mandatory => "[MandatoryObjects]",
            ObjectList::Optional => "[OptionalObjects]",
            ObjectList::Manufacturer => "[ManufacturerObjects]",
        }
    }

    pub fn computed(self, od: &ObjectDictionary) -> Vec<u16> {
        match self {
            ObjectList::Mandatory => od.mandatory_objects(),
            ObjectList::Optional => od.optional_objects(),
            ObjectList::Manufacturer => od.manufacturer_objects(),
        }
    }
}

/// Facts gathered while reading sections, checked after the last one.
#[derive(Debug, Default)]
pub(super) struct Declarations {
    pub lists: BTreeMap<ObjectList, Vec<u16>>,
    /// `SubNumber` per container index, with the section header.
    pub sub_numbers: BTreeMap<u16, (String, usize)>,
    /// Subindex 0 `DefaultValue` text per container index, as found in the file.
    pub counters: BTreeMap<u16, String>,
    pub pdo_counts: DeclaredPdoCounts,
    pub seen_file_info: bool,
    pub seen_device_info: bool,
}

pub(super) fn run_all(od: &mut ObjectDictionary, declared: &Declarations, notes: &mut Notes) {
    check_required_sections(declared, notes);
    check_subindex_counters(od, declared, notes);
    check_sub_numbers(od, declared, notes);
    check_pdo_mappings(od, notes);
    check_pdo_counts(od, declared, notes);
    check_object_lists(od, declared, notes);
}

fn check_required_sections(declared: &Declarations, notes: &mut Notes) {
    if !declared.seen_file_info {
        notes.push(String::from("[FileInfo] was missing"));
    }
    if !declared.seen_device_info {
        notes.push(String::from("[DeviceInfo] was missing"));
    }
}

/// Enforces the "highest sub-index" value of every container that has
/// subindexes beyond 0; a container with only subindex 0 keeps the value
/// found in the file.
fn check_subindex_counters(od: &mut ObjectDictionary, declared: &Declarations, notes: &mut Notes) {
    for (index, object) in od.objects_mut().iter_mut() {
        let (highest, sub0) = match object {
            Object::Variable(_) => continue,
            Object::Record(r) => (r.subindexes().last(), r.get(0).cloned()),
            Object::Array(a) => (a.subindexes().last(), a.get(0).cloned()),
        };
        let (Some(highest), Some(mut sub0)) = (highest, sub0) else {
            continue;
        };
        if highest == 0 {
            continue;
        }
        let expected = format!("0x{:02X}", highest);
        if let Some(text) = declared.counters.get(index) {
            if parse_int(text).ok() != Some(i128::from(highest)) {
                notes.push(format!(
                    "DefaultValue of [{:04X}sub0] was \"{}\", corrected to {}",
                    index, text, expected
                ));
            }
        }
        if sub0.default_value != expected {
            sub0.default_value = expected;
            match object {
                Object::Record(r) => r.replace_subindex0(sub0),
                Object::Array(a) => a.replace_subindex0(sub0),
                Object::Variable(_) => {}
            }
        }
    }
}

fn check_sub_numbers(od: &ObjectDictionary, declared: &Declarations, notes: &mut Notes) {
    for (index, (header, sub_number)) in &declared.sub_numbers {
        let Some(object) = od.get(*index) else {
            continue;
        };
        let found = object.sub_count();
        if found != *sub_number {
            notes.push(format!(
                "SubNumber of {} was {}, but {} subindexes were found",
                header, sub_number, found
            ));
        }
    }
}

/// Bit length an object must be mapped with, if it has a fixed one.
fn mapped_object_bits(od: &ObjectDictionary, entry: &PdoMappingEntry) -> Result<Option<u32>, ()> {
    if is_dummy_index(entry.index) {
        return DataType::try_from(entry.index)
            .map(|dt| Some(dt.bit_size()).filter(|b| *b != 0))
            .map_err(|_| ());
    }
    let variable = match od.get(entry.index) {
        Some(Object::Variable(v)) if entry.sub_index == 0 => Some(v),
        Some(Object::Variable(_)) | None => None,
        Some(object) => object.subindex(entry.sub_index),
    };
    match variable {
        Some(v) if v.data_type == DataType::Boolean => Ok(None),
        Some(v) => Ok(Some(v.data_type.bit_size()).filter(|b| *b != 0)),
        None => Err(()),
    }
}

/// Cross-checks every populated PDO mapping entry against the bit size of
/// the object it references and rewrites wrong lengths in place.
fn check_pdo_mappings(od: &mut ObjectDictionary, notes: &mut Notes) {
    let mut corrections: Vec<(u16, u8, String)> = Vec::new();

    let mapping_indexes: Vec<u16> = od
        .indexes()
        .filter(|i| is_pdo_mapping_index(*i))
        .collect();
    for index in mapping_indexes {
        let Some(object) = od.get(index) else {
            continue;
        };
        let subs: Vec<(u8, String)> = match object {
            Object::Record(r) => r
                .iter()
                .skip(1)
                .map(|(s, v)| (s, v.default_value.clone()))
                .collect(),
            Object::Array(a) => a
                .iter()
                .skip(1)
                .map(|(s, v)| (s, v.default_value.clone()))
                .collect(),
            Object::Variable(_) => continue,
        };
        for (sub, text) in subs {
            if text.trim().is_empty() {
                continue;
            }
            let Some(entry) = PdoMappingEntry::parse(&text) else {
                notes.push(format!(
                    "DefaultValue of [{:04X}sub{:X}] is not a valid PDO mapping",
                    index, sub
                ));
                continue;
            };
            if entry.is_unused() {
                continue;
            }
            match mapped_object_bits(od, &entry) {
                Err(()) => notes.push(format!(
                    "[{:04X}sub{:X}] maps 0x{:04X}sub{:X}, which does not exist",
                    index, sub, entry.index, entry.sub_index
                )),
                Ok(Some(bits)) if u32::from(entry.length_bits) != bits => {
                    let fixed = PdoMappingEntry {
                        length_bits: bits as u8,
                        ..entry
                    };
                    notes.push(format!(
                        "[{:04X}sub{:X}] mapped 0x{:04X}sub{:X} with {} bits, corrected to {}",
                        index, sub, entry.index, entry.sub_index, entry.length_bits, bits
                    ));
                    corrections.push((index, sub, fixed.to_default_value()));
                }
                Ok(_) => {}
            }
        }
    }

    for (index, sub, value) in corrections {
        debug!("Rewriting PDO mapping 0x{:04X}sub{:X} to {}", index, sub, value);
        if let Err(e) = rewrite_mapping(od, index, sub, value) {
            warn!("PDO mapping 0x{:04X}sub{:X} was not rewritten: {}", index, sub, e);
            notes.push(format!("[{:04X}sub{:X}] could not be corrected: {}", index, sub, e));
        }
    }
}

fn rewrite_mapping(
    od: &mut ObjectDictionary,
    index: u16,
    sub: u8,
    value: String,
) -> Result<(), EdsError> {
    match od.objects_mut().get_mut(&index) {
        Some(Object::Record(r)) => match r.get_mut(sub) {
            Some(v) => {
                v.default_value = value;
                Ok(())
            }
            None => Err(EdsError::dictionary(format!("subindex 0x{:X} is not editable", sub))),
        },
        Some(Object::Array(a)) => a.update(sub, |v| v.default_value = value),
        _ => Err(EdsError::dictionary(format!("0x{:04X} is not a record or array", index))),
    }
}

fn check_pdo_counts(od: &ObjectDictionary, declared: &Declarations, notes: &mut Notes) {
    let checks = [
        ("NrOfRXPDO", declared.pdo_counts.rpdos, od.rpdos()),
        ("NrOfTXPDO", declared.pdo_counts.tpdos, od.tpdos()),
    ];
    for (key, declared, found) in checks {
        if let Some(declared) = declared {
            if declared != found {
                notes.push(format!(
                    "{} in [DeviceInfo] was {}, corrected to {}",
                    key, declared, found
                ));
            }
        }
    }
}

/// Diffs each declared object list against the one computed from content.
fn check_object_lists(od: &ObjectDictionary, declared: &Declarations, notes: &mut Notes) {
    for list in ObjectList::ALL {
        let computed = list.computed(od);
        let Some(listed) = declared.lists.get(&list) else {
            if !computed.is_empty() {
                notes.push(format!("{} was missing", list.header()));
            }
            continue;
        };
        for index in computed.iter().filter(|i| !listed.contains(i)) {
            notes.push(format!(
                "0x{:04X} was missing from {}",
                index,
                list.header()
            ));
        }
        for index in listed.iter().filter(|i| !computed.contains(i)) {
            notes.push(format!(
                "0x{:04X} was listed in {} but is not defined there",
                index,
                list.header()
            ));
        }
    }
}
