// crates/canopen-eds/src/parser/mod.rs

//! EDS/DCF text reader.
//!
//! Data problems never abort a read: each missing or malformed value is
//! replaced by its default and reported as one message in the returned list.
//! Only structural problems (a block without a header, an unknown header,
//! an unreadable file) produce an `EdsError`.

mod info;
mod objects;
mod section;
mod validate;

pub(crate) use info::dummy_key;
pub(crate) use section::STORAGE_LOCATION_MARKER;
pub(crate) use validate::ObjectList;

use crate::error::EdsError;
use crate::od::constants::FIRST_OBJECT_INDEX;
use crate::od::{Object, ObjectDictionary};
use crate::types::ObjectType;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{debug, error, trace};
use section::{Notes, Section, split_sections};
use validate::Declarations;

/// What a section header refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Index(u16),
    SubIndex(u16, u8),
    FileInfo,
    DeviceInfo,
    DeviceCommissioning,
    DummyUsage,
    Comments,
    List(ObjectList),
}

fn classify(section: &Section) -> Option<Header> {
    let name = section.name();
    if let Some(index) = objects::parse_index_header(name) {
        return Some(Header::Index(index));
    }
    if let Some((index, sub)) = objects::parse_subindex_header(name) {
        return Some(Header::SubIndex(index, sub));
    }
    let literal = [
        ("FileInfo", Header::FileInfo),
        ("DeviceInfo", Header::DeviceInfo),
        // The CiA 306 header is spelled with a single "m".
        ("DeviceComissioning", Header::DeviceCommissioning),
        ("DeviceCommissioning", Header::DeviceCommissioning),
        ("DummyUsage", Header::DummyUsage),
        ("Comments", Header::Comments),
        ("MandatoryObjects", Header::List(ObjectList::Mandatory)),
        ("OptionalObjects", Header::List(ObjectList::Optional)),
        ("ManufacturerObjects", Header::List(ObjectList::Manufacturer)),
    ];
    literal
        .into_iter()
        .find(|(text, _)| text.eq_ignore_ascii_case(name))
        .map(|(_, header)| header)
}

/// Parses EDS/DCF text into an object dictionary plus the list of
/// recoverable problems found, in file order.
///
/// # Errors
/// Returns `EdsError::MissingHeader` for a block of entries without a
/// `[header]` line and `EdsError::UnknownHeader` for an unrecognized header.
pub fn load_eds_from_str(text: &str) -> Result<(ObjectDictionary, Vec<String>), EdsError> {
    let mut notes = Notes::default();
    let sections = split_sections(text, &mut notes)?;

    // 1. Route every section before touching the dictionary, so an unknown
    //    header fails the whole read.
    let mut routed = Vec::with_capacity(sections.len());
    for section in &sections {
        let header = classify(section).ok_or_else(|| {
            error!("Unknown section header: {}", section.header);
            EdsError::UnknownHeader {
                header: section.header.clone(),
            }
        })?;
        routed.push((header, section));
    }

    // 2. Read sections in file order.
    let mut od = ObjectDictionary::new();
    let mut declared = Declarations::default();
    for (header, section) in routed {
        debug!("Reading section {}", section.header);
        read_section(&mut od, &mut declared, header, section, &mut notes);
    }

    // 3. Cross-section consistency.
    validate::run_all(&mut od, &declared, &mut notes);

    let notes = notes.into_vec();
    debug!(
        "Parsed {} objects with {} problems",
        od.len(),
        notes.len()
    );
    Ok((od, notes))
}

fn read_section(
    od: &mut ObjectDictionary,
    declared: &mut Declarations,
    header: Header,
    section: &Section,
    notes: &mut Notes,
) {
    if section.storage_location.is_some() {
        od.firmware_export = true;
    }
    match header {
        Header::Index(index) => read_index(od, declared, index, section, notes),
        Header::SubIndex(index, sub) => read_subindex(od, declared, index, sub, section, notes),
        Header::FileInfo => {
            od.file_info = info::read_file_info(section, notes);
            declared.seen_file_info = true;
        }
        Header::DeviceInfo => {
            let (device_info, pdo_counts) = info::read_device_info(section, notes);
            od.device_info = device_info;
            declared.pdo_counts = pdo_counts;
            declared.seen_device_info = true;
        }
        Header::DeviceCommissioning => {
            od.device_commissioning = Some(info::read_device_commissioning(section, notes));
        }
        Header::DummyUsage => od.dummy_usage = info::read_dummy_usage(section, notes),
        Header::Comments => od.comment = info::read_comments(section, notes),
        Header::List(list) => {
            let indexes = info::read_object_list(section, notes);
            declared.lists.insert(list, indexes);
        }
    }
}

fn read_index(
    od: &mut ObjectDictionary,
    declared: &mut Declarations,
    index: u16,
    section: &Section,
    notes: &mut Notes,
) {
    if index < FIRST_OBJECT_INDEX {
        notes.push(format!(
            "{} is reserved for data type definitions and was skipped",
            section.header
        ));
        return;
    }

    let object: Object = match objects::object_type(section, notes) {
        ObjectType::Var => objects::read_variable(section, notes).into(),
        ObjectType::Record => {
            let (record, sub_number) = objects::read_record(section, notes);
            if let Some(n) = sub_number {
                declared.sub_numbers.insert(index, (section.header.clone(), n));
            }
            record.into()
        }
        ObjectType::Array => {
            let (array, sub_number) = objects::read_array(section, notes);
            if let Some(n) = sub_number {
                declared.sub_numbers.insert(index, (section.header.clone(), n));
            }
            array.into()
        }
    };

    if od.insert(index, None, object).is_err() {
        notes.push(format!(
            "{} was defined more than once, the later definition was skipped",
            section.header
        ));
    }
}

fn read_subindex(
    od: &mut ObjectDictionary,
    declared: &mut Declarations,
    index: u16,
    sub: u8,
    section: &Section,
    notes: &mut Notes,
) {
    if index < FIRST_OBJECT_INDEX {
        notes.push(format!(
            "{} is reserved for data type definitions and was skipped",
            section.header
        ));
        return;
    }

    let parent_location = match od.get(index) {
        Some(Object::Record(r)) => r.storage_location().to_string(),
        Some(Object::Array(a)) => a.storage_location().to_string(),
        Some(Object::Variable(_)) | None => {
            notes.push(format!(
                "{} has no record or array at 0x{:04X} and was skipped",
                section.header, index
            ));
            return;
        }
    };
    let mut variable = objects::read_variable(section, notes);
    if section.storage_location.is_none() {
        variable.storage_location = parent_location;
    }
    let location = variable.storage_location.clone();

    if sub == 0 {
        if variable.data_type != crate::types::DataType::Unsigned8 {
            notes.push(format!("DataType of {} was not UNSIGNED8", section.header));
        }
        declared
            .counters
            .insert(index, variable.default_value.clone());
        match od.objects_mut().get_mut(&index) {
            Some(Object::Record(r)) => r.replace_subindex0(variable),
            Some(Object::Array(a)) => a.replace_subindex0(variable),
            _ => {}
        }
        od.add_storage_location(&location);
        return;
    }

    let result = match od.objects_mut().get_mut(&index) {
        Some(Object::Array(a)) => {
            if let Some(element_type) = a.data_type() {
                if element_type != variable.data_type {
                    notes.push(format!(
                        "DataType of {} does not match the array and was changed to {}",
                        section.header,
                        element_type.name()
                    ));
                    variable.data_type = element_type;
                }
            }
            a.insert(sub, variable)
        }
        Some(Object::Record(r)) => r.insert(sub, variable),
        _ => return,
    };
    match result {
        Ok(()) => {
            od.add_storage_location(&location);
            trace!("Added {}", section.header);
        }
        Err(_) => notes.push(format!(
            "{} was defined more than once, the later definition was skipped",
            section.header
        )),
    }
}

/// Reads an EDS or DCF file from disk.
///
/// A file with the `.dcf` extension is always treated as a DCF, even if it
/// lacks a `[DeviceComissioning]` section.
#[cfg(feature = "std")]
pub fn load_eds(
    path: impl AsRef<std::path::Path>,
) -> Result<(ObjectDictionary, Vec<String>), EdsError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        error!("Could not read {}: {}", path.display(), e);
        EdsError::Io(e)
    })?;
    let (mut od, mut notes) = load_eds_from_str(&text)?;

    let is_dcf_path = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcf"));
    if is_dcf_path && od.device_commissioning.is_none() {
        let message = String::from("[DeviceComissioning] was missing");
        log::warn!("{}", message);
        notes.push(message);
        od.device_commissioning = Some(Default::default());
    }
    Ok((od, notes))
}

/// Parses a file and writes it straight back in canonical form, relying on
/// the parser's default substitution. Returns the problems found.
#[cfg(feature = "std")]
pub fn repair_eds(path: impl AsRef<std::path::Path>) -> Result<Vec<String>, EdsError> {
    let path = path.as_ref();
    let (mut od, notes) = load_eds(path)?;
    let dcf = od.is_dcf();
    crate::builder::save_eds(&mut od, path, dcf)?;
    Ok(notes)
}
