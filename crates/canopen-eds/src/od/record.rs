// crates/canopen-eds/src/od/record.rs

//! Record and Array containers.
//!
//! Both keep subindex 0 as an UNSIGNED8 CONST "Highest sub-index supported"
//! entry whose default value always equals the largest non-zero subindex
//! present, formatted as `0xNN`.

use super::entry::{DEFAULT_STORAGE_LOCATION, Variable};
use crate::error::EdsError;
use crate::types::{AccessType, DataType};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use log::{error, trace};

fn highest_subindex_entry() -> Variable {
    Variable::new(
        "Highest sub-index supported",
        DataType::Unsigned8,
        AccessType::Const,
    )
    .with_default("0x00")
}

/// Subindex storage shared by Record and Array.
#[derive(Debug, Clone, PartialEq)]
struct SubObjects {
    entries: BTreeMap<u8, Variable>,
}

impl SubObjects {
    fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(0, highest_subindex_entry());
        Self { entries }
    }

    /// Checks that `subindex` may receive a new entry.
    fn check_free(&self, subindex: u8) -> Result<(), EdsError> {
        if subindex != 0 && self.entries.contains_key(&subindex) {
            error!("Rejected insert: subindex 0x{:X} already exists", subindex);
            return Err(EdsError::dictionary(format!(
                "subindex 0x{:X} already exists",
                subindex
            )));
        }
        Ok(())
    }

    /// Inserts after `check_free` succeeded.
    fn insert_unchecked(&mut self, subindex: u8, variable: Variable) {
        if subindex == 0 {
            if let Some(sub0) = self.entries.get_mut(&0) {
                sub0.parameter_name = variable.parameter_name;
                sub0.access_type = variable.access_type;
            }
        } else {
            self.entries.insert(subindex, variable);
        }
        self.refresh_counter();
    }

    fn remove(&mut self, subindex: u8) -> Result<Variable, EdsError> {
        if subindex == 0 {
            error!("Rejected removal of subindex 0");
            return Err(EdsError::dictionary("cannot remove subindex 0"));
        }
        let removed = self.entries.remove(&subindex).ok_or_else(|| {
            error!("Rejected removal: subindex 0x{:X} does not exist", subindex);
            EdsError::dictionary(format!("subindex 0x{:X} does not exist", subindex))
        })?;
        self.refresh_counter();
        Ok(removed)
    }

    fn refresh_counter(&mut self) {
        let highest = self.entries.keys().next_back().copied().unwrap_or(0);
        if let Some(sub0) = self.entries.get_mut(&0) {
            sub0.default_value = format!("0x{:02X}", highest);
            trace!("Subindex 0 counter set to {}", sub0.default_value);
        }
    }

    /// Replaces subindex 0 wholesale, as read from a file.
    fn replace_subindex0(&mut self, mut variable: Variable) {
        variable.data_type = DataType::Unsigned8;
        self.entries.insert(0, variable);
    }
}

/// A RECORD object: subindexes of independent data types.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub parameter_name: String,
    pub denotation: String,
    pub comments: String,
    storage_location: String,
    subs: SubObjects,
}

/// An ARRAY object: subindexes 1..N share one data type.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub parameter_name: String,
    pub denotation: String,
    pub comments: String,
    storage_location: String,
    data_type: Option<DataType>,
    subs: SubObjects,
}

/// Read-only accessors and storage handling common to both containers.
macro_rules! sub_object_accessors {
    ($ty:ident) => {
        impl $ty {
            pub fn get(&self, subindex: u8) -> Option<&Variable> {
                self.subs.entries.get(&subindex)
            }

            pub fn contains(&self, subindex: u8) -> bool {
                self.subs.entries.contains_key(&subindex)
            }

            /// Subindexes in ascending order, subindex 0 included.
            pub fn subindexes(&self) -> impl Iterator<Item = u8> + '_ {
                self.subs.entries.keys().copied()
            }

            pub fn iter(&self) -> impl Iterator<Item = (u8, &Variable)> + '_ {
                self.subs.entries.iter().map(|(k, v)| (*k, v))
            }

            /// Number of entries including subindex 0 (the `SubNumber` field).
            pub fn len(&self) -> usize {
                self.subs.entries.len()
            }

            /// `true` when only subindex 0 is present.
            pub fn is_empty(&self) -> bool {
                self.subs.entries.len() <= 1
            }

            pub fn storage_location(&self) -> &str {
                &self.storage_location
            }

            /// Sets the storage location of the object and every subindex.
            pub fn set_storage_location(&mut self, tag: &str) {
                for variable in self.subs.entries.values_mut() {
                    variable.storage_location = tag.to_string();
                }
                self.storage_location = tag.to_string();
            }

            /// Removes a non-zero subindex and returns it.
            pub fn remove(&mut self, subindex: u8) -> Result<Variable, EdsError> {
                self.subs.remove(subindex)
            }

            /// Takes subindex 0 from a parsed file, keeping its counter text.
            pub(crate) fn replace_subindex0(&mut self, variable: Variable) {
                self.subs.replace_subindex0(variable);
            }
        }
    };
}

sub_object_accessors!(Record);
sub_object_accessors!(Array);

impl Record {
    pub fn new(parameter_name: &str) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            denotation: String::new(),
            comments: String::new(),
            storage_location: DEFAULT_STORAGE_LOCATION.to_string(),
            subs: SubObjects::new(),
        }
    }

    /// Inserts a subindex.
    ///
    /// Inserting at subindex 0 only takes the name and access type of
    /// `variable`; the counter is never overwritten.
    pub fn insert(&mut self, subindex: u8, variable: Variable) -> Result<(), EdsError> {
        self.subs.check_free(subindex)?;
        self.subs.insert_unchecked(subindex, variable);
        Ok(())
    }

    /// Mutable access to a non-zero subindex.
    pub fn get_mut(&mut self, subindex: u8) -> Option<&mut Variable> {
        if subindex == 0 {
            return None;
        }
        self.subs.entries.get_mut(&subindex)
    }
}

impl Array {
    pub fn new(parameter_name: &str) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            denotation: String::new(),
            comments: String::new(),
            storage_location: DEFAULT_STORAGE_LOCATION.to_string(),
            data_type: None,
            subs: SubObjects::new(),
        }
    }

    /// The element type, fixed by the first non-zero insert or by
    /// [`Array::set_data_type`].
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Sets the element type and re-types every non-zero subindex.
    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = Some(data_type);
        for (_, variable) in self.subs.entries.range_mut(1..) {
            variable.data_type = data_type;
        }
    }

    /// Inserts a subindex.
    ///
    /// Fails without touching the array if the subindex is taken or if the
    /// variable's data type differs from the element type.
    pub fn insert(&mut self, subindex: u8, variable: Variable) -> Result<(), EdsError> {
        self.subs.check_free(subindex)?;
        if subindex != 0 {
            match self.data_type {
                Some(dt) if dt != variable.data_type => {
                    error!(
                        "Rejected insert at subindex 0x{:X}: {} does not match array type {}",
                        subindex,
                        variable.data_type.name(),
                        dt.name()
                    );
                    return Err(EdsError::dictionary(format!(
                        "data type {} does not match the array's data type {}",
                        variable.data_type.name(),
                        dt.name()
                    )));
                }
                Some(_) => {}
                None => self.data_type = Some(variable.data_type),
            }
        }
        self.subs.insert_unchecked(subindex, variable);
        Ok(())
    }

    /// Edits a non-zero subindex in place.
    ///
    /// The edit is discarded if it changes the element data type.
    pub fn update(
        &mut self,
        subindex: u8,
        edit: impl FnOnce(&mut Variable),
    ) -> Result<(), EdsError> {
        let current = self
            .subs
            .entries
            .get(&subindex)
            .filter(|_| subindex != 0)
            .ok_or_else(|| {
                error!("Rejected update: subindex 0x{:X} is not editable", subindex);
                EdsError::dictionary(format!("subindex 0x{:X} is not editable", subindex))
            })?;
        let mut edited = current.clone();
        edit(&mut edited);
        if Some(edited.data_type) != self.data_type {
            error!("Rejected update of subindex 0x{:X}: data type changed", subindex);
            return Err(EdsError::dictionary(
                "cannot change the data type of a single array element",
            ));
        }
        self.subs.entries.insert(subindex, edited);
        Ok(())
    }
}
