// crates/canopen-eds/src/firmware/mod.rs

//! CANopenNode (v4) `OD.c` / `OD.h` generator.
//!
//! Objects are grouped by storage location. Every group becomes one struct
//! type `OD_{TAG}_t` with a single initialized instance `OD_{TAG}`; the object
//! descriptors (`ODObjs`) and the flat object list (`ODList`) point into
//! those instances.

mod layout;
mod naming;

pub use naming::camel_case;

use crate::error::EdsError;
use crate::od::constants::{
    IDX_PREDEFINED_ERROR_FIELD_ARR, IDX_RESTORE_DEFAULT_PARAMETERS_REC, IDX_STORE_PARAMETERS_REC,
};
use crate::od::{Object, ObjectDictionary};
use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Write;
use layout::Field;
use log::{debug, trace};

const INDENT4: &str = "    ";
const INDENT8: &str = "        ";
const INDENT12: &str = "            ";

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareOptions {
    /// Indexes whose data (all subindexes except 0) is given `NULL` storage
    /// instead of a struct member, regardless of data type. The stack keeps
    /// this data itself.
    pub null_storage_indexes: Vec<u16>,
}

impl Default for FirmwareOptions {
    fn default() -> Self {
        Self {
            null_storage_indexes: vec![
                IDX_PREDEFINED_ERROR_FIELD_ARR,
                IDX_STORE_PARAMETERS_REC,
                IDX_RESTORE_DEFAULT_PARAMETERS_REC,
            ],
        }
    }
}

/// The generated source pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareSources {
    /// Content of `OD.c`.
    pub source: String,
    /// Content of `OD.h`.
    pub header: String,
}

/// One variable slot of an object.
struct Member {
    subindex: u8,
    /// Struct member name (`x1000_deviceType`, or a record field name).
    name: String,
    field: Field,
    /// `false` for `NULL` storage.
    stored: bool,
    attribute: String,
}

enum Layout {
    Var(Member),
    Array {
        sub0: Member,
        /// Shared element storage, `None` for an array without elements.
        element: Option<Field>,
        initializers: Vec<String>,
        attribute: String,
        stored: bool,
    },
    Record(Vec<Member>),
}

/// One generated object.
struct Entry {
    index: u16,
    /// camelCase parameter name.
    name: String,
    /// Sanitized storage tag.
    tag: String,
    layout: Layout,
}

impl Entry {
    fn member(&self) -> String {
        naming::object_member("x", self.index, &self.name)
    }

    fn descriptor(&self) -> String {
        naming::object_member("o_", self.index, &self.name)
    }

    /// Number of sub-entries announced in `ODList`.
    fn sub_entries(&self) -> usize {
        match &self.layout {
            Layout::Var(_) => 1,
            Layout::Array { initializers, .. } => initializers.len() + 1,
            Layout::Record(members) => members.len(),
        }
    }

    fn has_storage(&self) -> bool {
        match &self.layout {
            Layout::Var(m) => m.stored,
            Layout::Array { .. } => true,
            Layout::Record(members) => members.iter().any(|m| m.stored),
        }
    }
}

fn build_entries(od: &ObjectDictionary, options: &FirmwareOptions) -> Vec<Entry> {
    let mut entries = Vec::new();
    for (index, object) in od.iter() {
        let null_storage = options.null_storage_indexes.contains(&index);
        let name = camel_case(object.parameter_name());
        let tag = naming::storage_tag(object.storage_location());
        let context = format!("0x{:04X}", index);

        let layout = match object {
            Object::Variable(v) => {
                let Some(field) = layout::field(v, &context) else {
                    trace!("Skipping DOMAIN object {}", context);
                    continue;
                };
                Layout::Var(Member {
                    subindex: 0,
                    name: naming::object_member("x", index, &name),
                    field,
                    stored: !null_storage,
                    attribute: layout::attribute(v),
                })
            }
            Object::Array(a) => {
                if a.data_type() == Some(DataType::Domain) {
                    trace!("Skipping DOMAIN array {}", context);
                    continue;
                }
                let Some(sub0) = a.get(0).and_then(|v| layout::field(v, &context)) else {
                    continue;
                };
                let fields: Vec<Field> = a
                    .iter()
                    .skip(1)
                    .filter_map(|(_, v)| layout::field(v, &context))
                    .collect();
                let element = fields.first().map(|first| Field {
                    elements: first
                        .elements
                        .map(|_| fields.iter().filter_map(|f| f.elements).max().unwrap_or(1)),
                    data_length: fields.iter().map(|f| f.data_length).max().unwrap_or(0),
                    ..first.clone()
                });
                let attribute = a
                    .iter()
                    .nth(1)
                    .map(|(_, v)| layout::attribute(v))
                    .unwrap_or_else(|| String::from("ODA_SDO_RW"));
                Layout::Array {
                    sub0: Member {
                        subindex: 0,
                        name: format!("{}_sub0", naming::object_member("x", index, &name)),
                        field: sub0,
                        stored: true,
                        attribute: String::from("ODA_SDO_R"),
                    },
                    initializers: fields.into_iter().map(|f| f.initializer).collect(),
                    element,
                    attribute,
                    stored: !null_storage,
                }
            }
            Object::Record(r) => {
                let present: Vec<_> = r
                    .iter()
                    .filter_map(|(sub, v)| layout::field(v, &context).map(|f| (sub, v, f)))
                    .collect();
                let names =
                    naming::record_member_names(present.iter().map(|(sub, v, _)| (*sub, v.parameter_name.as_str())));
                let members = present
                    .into_iter()
                    .zip(names)
                    .map(|((sub, v, field), (_, member))| Member {
                        subindex: sub,
                        name: member,
                        field,
                        stored: !(null_storage && sub != 0),
                        attribute: layout::attribute(v),
                    })
                    .collect();
                Layout::Record(members)
            }
        };
        entries.push(Entry {
            index,
            name,
            tag,
            layout,
        });
    }
    entries
}

/// Storage tags in first-seen order, restricted to tags that own storage.
fn storage_groups(od: &ObjectDictionary, entries: &[Entry]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let known = od.storage_locations().iter().map(naming::storage_tag);
    let used = entries.iter().map(|e| e.tag.clone());
    for tag in known.chain(used) {
        if !tags.contains(&tag) && entries.iter().any(|e| e.tag == tag && e.has_storage()) {
            tags.push(tag);
        }
    }
    tags
}

/// Renders `OD.c` and `OD.h` for CANopenNode v4.
///
/// DOMAIN objects have no storage and are left out entirely. Objects listed
/// in `options.null_storage_indexes` get `NULL` data pointers.
pub fn render_firmware_sources(
    od: &ObjectDictionary,
    options: &FirmwareOptions,
) -> Result<FirmwareSources, EdsError> {
    let entries = build_entries(od, options);
    let groups = storage_groups(od, &entries);
    debug!(
        "Generating CANopenNode sources for {} objects in {} storage groups",
        entries.len(),
        groups.len()
    );

    let header = render_header(od, &entries, &groups)?;
    let source = render_source(&entries, &groups)?;
    Ok(FirmwareSources { source, header })
}

/// Writes `OD.c` and `OD.h` into `dir` using the default options.
#[cfg(feature = "std")]
pub fn generate_firmware_sources(
    od: &ObjectDictionary,
    dir: impl AsRef<std::path::Path>,
) -> Result<(), EdsError> {
    let dir = dir.as_ref();
    let sources = render_firmware_sources(od, &FirmwareOptions::default())?;
    for (file, text) in [("OD.c", &sources.source), ("OD.h", &sources.header)] {
        let path = dir.join(file);
        std::fs::write(&path, text).map_err(|e| {
            log::error!("Could not write {}: {}", path.display(), e);
            EdsError::Io(e)
        })?;
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

fn render_header(od: &ObjectDictionary, entries: &[Entry], groups: &[String]) -> Result<String, EdsError> {
    let mut out = String::new();
    writeln!(out, "#ifndef OD_H")?;
    writeln!(out, "#define OD_H")?;
    writeln!(out)?;

    // 1. Counters
    for name in [
        "NMT", "EM", "SYNC", "SYNC_PROD", "STORAGE", "EM_PROD", "HB_CONS", "HB_PROD", "SDO_SRV",
    ] {
        writeln!(out, "#define OD_CNT_{} 1", name)?;
    }
    writeln!(out, "#define OD_CNT_RPDO {}", od.rpdos())?;
    writeln!(out, "#define OD_CNT_TPDO {}", od.tpdos())?;
    writeln!(out)?;

    for entry in entries {
        if let Layout::Array { initializers, .. } = &entry.layout {
            writeln!(out, "#define OD_CNT_ARR_{:X} {}", entry.index, initializers.len())?;
        }
    }
    writeln!(out)?;

    // 2. One struct type per storage group
    for tag in groups {
        writeln!(out, "typedef struct {{")?;
        for entry in entries.iter().filter(|e| &e.tag == tag) {
            write_declarations(&mut out, entry)?;
        }
        writeln!(out, "}} OD_{}_t;", tag)?;
        writeln!(out)?;
    }

    for tag in groups {
        writeln!(out, "#ifndef OD_ATTR_{}", tag)?;
        writeln!(out, "#define OD_ATTR_{}", tag)?;
        writeln!(out, "#endif")?;
        writeln!(out, "extern OD_ATTR_{0} OD_{0}_t OD_{0};", tag)?;
        writeln!(out)?;
    }

    writeln!(out, "#ifndef OD_ATTR_OD")?;
    writeln!(out, "#define OD_ATTR_OD")?;
    writeln!(out, "#endif")?;
    writeln!(out, "extern OD_ATTR_OD OD_t *OD;")?;
    writeln!(out)?;

    // 3. Entry handles by position in ODList
    for (position, entry) in entries.iter().enumerate() {
        writeln!(out, "#define OD_ENTRY_H{:X} &OD->list[{}]", entry.index, position)?;
    }
    writeln!(out)?;
    for (position, entry) in entries.iter().enumerate() {
        if !entry.name.is_empty() {
            writeln!(
                out,
                "#define OD_ENTRY_H{:X}_{} &OD->list[{}]",
                entry.index, entry.name, position
            )?;
        }
    }
    writeln!(out)?;

    writeln!(out, "#endif /* OD_H */")?;
    Ok(out)
}

fn write_declarations(out: &mut String, entry: &Entry) -> Result<(), EdsError> {
    match &entry.layout {
        Layout::Var(m) => {
            if m.stored {
                writeln!(out, "{}{}", INDENT4, m.field.declaration(&m.name))?;
            }
        }
        Layout::Array {
            sub0,
            element,
            stored,
            ..
        } => {
            writeln!(out, "{}{}", INDENT4, sub0.field.declaration(&sub0.name))?;
            if let (Some(element), true) = (element, *stored) {
                let dims = match element.elements {
                    Some(n) => format!("[OD_CNT_ARR_{:X}][{}]", entry.index, n),
                    None => format!("[OD_CNT_ARR_{:X}]", entry.index),
                };
                writeln!(out, "{}{} {}{};", INDENT4, element.c_type, entry.member(), dims)?;
            }
        }
        Layout::Record(members) => {
            writeln!(out, "{}struct {{", INDENT4)?;
            for m in members.iter().filter(|m| m.stored) {
                writeln!(out, "{}{}", INDENT8, m.field.declaration(&m.name))?;
            }
            writeln!(out, "{}}} {};", INDENT4, entry.member())?;
        }
    }
    Ok(())
}

fn render_source(entries: &[Entry], groups: &[String]) -> Result<String, EdsError> {
    let mut out = String::new();
    writeln!(out, "#define OD_DEFINITION")?;
    writeln!(out, "#include \"301/CO_ODinterface.h\"")?;
    writeln!(out, "#include \"OD.h\"")?;
    writeln!(out)?;
    writeln!(out, "#if CO_VERSION_MAJOR < 4")?;
    writeln!(
        out,
        "#error This Object dictionary is compatible with CANopenNode V4.0 and above!"
    )?;
    writeln!(out, "#endif")?;
    writeln!(out)?;

    // 1. Initialized storage instances
    for tag in groups {
        writeln!(out, "OD_ATTR_{0} OD_{0}_t OD_{0} = {{", tag)?;
        for entry in entries.iter().filter(|e| &e.tag == tag) {
            write_initializers(&mut out, entry)?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;
    }

    // 2. Object descriptors
    writeln!(out, "typedef struct {{")?;
    for entry in entries {
        match &entry.layout {
            Layout::Var(_) => writeln!(out, "{}OD_obj_var_t {};", INDENT4, entry.descriptor())?,
            Layout::Array { .. } => {
                writeln!(out, "{}OD_obj_array_t {};", INDENT4, entry.descriptor())?
            }
            Layout::Record(members) => writeln!(
                out,
                "{}OD_obj_record_t {}[{}];",
                INDENT4,
                entry.descriptor(),
                members.len()
            )?,
        }
    }
    writeln!(out, "}} ODObjs_t;")?;
    writeln!(out)?;

    writeln!(out, "static CO_PROGMEM ODObjs_t ODObjs = {{")?;
    for entry in entries {
        write_descriptor(&mut out, entry)?;
    }
    writeln!(out, "}};")?;
    writeln!(out)?;

    // 3. Flat object list
    writeln!(out, "static OD_ATTR_OD OD_entry_t ODList[] = {{")?;
    for entry in entries {
        let kind = match entry.layout {
            Layout::Var(_) => "ODT_VAR",
            Layout::Array { .. } => "ODT_ARR",
            Layout::Record(_) => "ODT_REC",
        };
        writeln!(
            out,
            "{}{{0x{:04X}, 0x{:02X}, {}, &ODObjs.{}, NULL}},",
            INDENT4,
            entry.index,
            entry.sub_entries(),
            kind,
            entry.descriptor()
        )?;
    }
    writeln!(out, "{}{{0x0000, 0x00, 0, NULL, NULL}}", INDENT4)?;
    writeln!(out, "}};")?;
    writeln!(out)?;

    writeln!(out, "static OD_t _OD = {{")?;
    writeln!(out, "{}(sizeof(ODList) / sizeof(ODList[0])) - 1,", INDENT4)?;
    writeln!(out, "{}&ODList[0]", INDENT4)?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "OD_t *OD = &_OD;")?;
    Ok(out)
}

fn write_initializers(out: &mut String, entry: &Entry) -> Result<(), EdsError> {
    match &entry.layout {
        Layout::Var(m) => {
            if m.stored {
                writeln!(out, "{}.{} = {},", INDENT4, m.name, m.field.initializer)?;
            }
        }
        Layout::Array {
            sub0,
            element,
            initializers,
            stored,
            ..
        } => {
            writeln!(out, "{}.{} = {},", INDENT4, sub0.name, sub0.field.initializer)?;
            if element.is_some() && *stored {
                writeln!(
                    out,
                    "{}.{} = {{{}}},",
                    INDENT4,
                    entry.member(),
                    initializers.join(", ")
                )?;
            }
        }
        Layout::Record(members) => {
            writeln!(out, "{}.{} = {{", INDENT4, entry.member())?;
            for m in members.iter().filter(|m| m.stored) {
                writeln!(out, "{}.{} = {},", INDENT8, m.name, m.field.initializer)?;
            }
            writeln!(out, "{}}},", INDENT4)?;
        }
    }
    Ok(())
}

fn write_descriptor(out: &mut String, entry: &Entry) -> Result<(), EdsError> {
    let base = format!("OD_{}.{}", entry.tag, entry.member());
    writeln!(out, "{}.{} = {{", INDENT4, entry.descriptor())?;
    match &entry.layout {
        Layout::Var(m) => {
            let origin = if m.stored {
                m.field.address(&base)
            } else {
                String::from("NULL")
            };
            writeln!(out, "{}.dataOrig = {},", INDENT8, origin)?;
            writeln!(out, "{}.attribute = {},", INDENT8, m.attribute)?;
            writeln!(out, "{}.dataLength = {}", INDENT8, m.field.data_length)?;
        }
        Layout::Array {
            sub0,
            element,
            attribute,
            stored,
            ..
        } => {
            let sub0_path = format!("OD_{}.{}", entry.tag, sub0.name);
            writeln!(out, "{}.dataOrig0 = {},", INDENT8, sub0.field.address(&sub0_path))?;
            let origin = match element {
                Some(_) if *stored => format!("&{}[0]", base),
                _ => String::from("NULL"),
            };
            writeln!(out, "{}.dataOrig = {},", INDENT8, origin)?;
            writeln!(out, "{}.attribute0 = {},", INDENT8, sub0.attribute)?;
            writeln!(out, "{}.attribute = {},", INDENT8, attribute)?;
            let (length, size) = element
                .as_ref()
                .map(|e| (e.data_length, e.element_sizeof()))
                .unwrap_or((0, String::from("0")));
            writeln!(out, "{}.dataElementLength = {},", INDENT8, length)?;
            writeln!(out, "{}.dataElementSizeof = {}", INDENT8, size)?;
        }
        Layout::Record(members) => {
            for m in members {
                let origin = if m.stored {
                    m.field.address(&format!("{}.{}", base, m.name))
                } else {
                    String::from("NULL")
                };
                writeln!(out, "{}{{", INDENT8)?;
                writeln!(out, "{}.dataOrig = {},", INDENT12, origin)?;
                writeln!(out, "{}.subIndex = {},", INDENT12, m.subindex)?;
                writeln!(out, "{}.attribute = {},", INDENT12, m.attribute)?;
                writeln!(out, "{}.dataLength = {}", INDENT12, m.field.data_length)?;
                writeln!(out, "{}}},", INDENT8)?;
            }
        }
    }
    writeln!(out, "{}}},", INDENT4)?;
    Ok(())
}
