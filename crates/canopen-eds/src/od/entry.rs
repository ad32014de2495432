// crates/canopen-eds/src/od/entry.rs

use super::record::{Array, Record};
use super::value::DefaultValue;
use crate::types::{AccessType, DataType, ObjectType};
use alloc::string::{String, ToString};

/// Storage-location tag given to objects that do not declare one.
pub const DEFAULT_STORAGE_LOCATION: &str = "RAM";

/// A leaf entry of the object dictionary, either a top-level VAR object or
/// one subindex of a Record/Array.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub parameter_name: String,
    /// DCF-only display name chosen by the integrator.
    pub denotation: String,
    /// Free-text `;` comment lines found before the section header.
    pub comments: String,
    pub data_type: DataType,
    pub low_limit: String,
    pub high_limit: String,
    /// Value text exactly as stored in the file (see [`DefaultValue`]).
    pub default_value: String,
    pub access_type: AccessType,
    pub pdo_mapping: bool,
    /// Firmware-export placement tag, e.g. `RAM` or `PERSIST_COMM`.
    pub storage_location: String,
}

impl Default for Variable {
    fn default() -> Self {
        Self {
            parameter_name: "New Variable".to_string(),
            denotation: String::new(),
            comments: String::new(),
            data_type: DataType::Unsigned32,
            low_limit: String::new(),
            high_limit: String::new(),
            default_value: String::new(),
            access_type: AccessType::Rw,
            pdo_mapping: false,
            storage_location: DEFAULT_STORAGE_LOCATION.to_string(),
        }
    }
}

impl Variable {
    pub fn new(parameter_name: &str, data_type: DataType, access_type: AccessType) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            data_type,
            access_type,
            ..Default::default()
        }
    }

    /// Sets the default value text, builder style.
    pub fn with_default(mut self, default_value: &str) -> Self {
        self.default_value = default_value.to_string();
        self
    }

    /// The default value decoded for this variable's data type.
    pub fn value(&self) -> Option<DefaultValue> {
        DefaultValue::decode(self.data_type, &self.default_value)
    }
}

/// One object dictionary entry: a tagged union over the three object kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Variable(Variable),
    Array(Array),
    Record(Record),
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Variable(_) => ObjectType::Var,
            Object::Array(_) => ObjectType::Array,
            Object::Record(_) => ObjectType::Record,
        }
    }

    pub fn parameter_name(&self) -> &str {
        match self {
            Object::Variable(v) => &v.parameter_name,
            Object::Array(a) => &a.parameter_name,
            Object::Record(r) => &r.parameter_name,
        }
    }

    pub fn storage_location(&self) -> &str {
        match self {
            Object::Variable(v) => &v.storage_location,
            Object::Array(a) => a.storage_location(),
            Object::Record(r) => r.storage_location(),
        }
    }

    /// Moves the object (and all of its subindexes) to another storage location.
    pub fn set_storage_location(&mut self, tag: &str) {
        match self {
            Object::Variable(v) => v.storage_location = tag.to_string(),
            Object::Array(a) => a.set_storage_location(tag),
            Object::Record(r) => r.set_storage_location(tag),
        }
    }

    /// Number of entries, counting subindex 0. A Variable counts as one.
    pub fn sub_count(&self) -> usize {
        match self {
            Object::Variable(_) => 1,
            Object::Array(a) => a.len(),
            Object::Record(r) => r.len(),
        }
    }

    /// Looks up a subindex of a Record/Array; always `None` for a Variable.
    pub fn subindex(&self, subindex: u8) -> Option<&Variable> {
        match self {
            Object::Variable(_) => None,
            Object::Array(a) => a.get(subindex),
            Object::Record(r) => r.get(subindex),
        }
    }
}

impl From<Variable> for Object {
    fn from(v: Variable) -> Self {
        Object::Variable(v)
    }
}

impl From<Array> for Object {
    fn from(a: Array) -> Self {
        Object::Array(a)
    }
}

impl From<Record> for Object {
    fn from(r: Record) -> Self {
        Object::Record(r)
    }
}
