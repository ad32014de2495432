// crates/canopen-eds/src/od/mod.rs

pub mod constants;
mod entry;
mod info;
mod predefined;
mod record;
mod storage;
mod value;

pub use entry::{DEFAULT_STORAGE_LOCATION, Object, Variable};
pub use info::{
    BAUD_RATES, DUMMY_OBJECTS, DeviceCommissioning, DeviceInfo, DummyUsage, FileInfo, parse_date,
    parse_time,
};
pub(crate) use info::{DATE_FORMAT, TIME_FORMAT};
pub use predefined::PDO_MAPPING_ENTRIES;
pub use record::{Array, Record};
pub use storage::StorageLocations;
pub use value::{DefaultValue, normalize_octet_string, octet_string_bytes, strip_node_id};

use crate::error::EdsError;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use constants::{
    COMMUNICATION_AREA, DEVICE_PROFILE_AREA, FIRST_OBJECT_INDEX, IDX_RPDO_COMM_PARAM_BASE,
    IDX_RPDO_MAPPING_PARAM_BASE, IDX_TPDO_COMM_PARAM_BASE, IDX_TPDO_MAPPING_PARAM_BASE,
    MANDATORY_OBJECTS, MANUFACTURER_AREA, PDO_SLOTS, RPDO_COMM_RANGE, TPDO_COMM_RANGE,
};
use log::{debug, error, trace};
use predefined::PdoDirection;

/// An in-memory EDS/DCF document.
///
/// Objects are keyed by index and kept in ascending index order. All
/// structural edits go through [`insert`](Self::insert),
/// [`remove`](Self::remove) and [`copy_object`](Self::copy_object), which
/// enforce index/subindex uniqueness.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDictionary {
    objects: BTreeMap<u16, Object>,
    pub file_info: FileInfo,
    pub device_info: DeviceInfo,
    /// Present only for DCF documents.
    pub device_commissioning: Option<DeviceCommissioning>,
    pub dummy_usage: DummyUsage,
    /// Content of the `[Comments]` section, one line per `\n`.
    pub comment: String,
    storage_locations: StorageLocations,
    /// Set when the document carries `;StorageLocation=` markers for
    /// firmware export; the serializer then writes them back.
    pub firmware_export: bool,
}

impl Default for ObjectDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectDictionary {
    /// Creates an empty dictionary with default metadata.
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            file_info: FileInfo::default(),
            device_info: DeviceInfo::default(),
            device_commissioning: None,
            dummy_usage: DummyUsage::default(),
            comment: String::new(),
            storage_locations: StorageLocations::default(),
            firmware_export: false,
        }
    }

    /// Creates a dictionary holding the mandatory objects 0x1000, 0x1001 and
    /// 0x1018, the starting point for a new EDS.
    pub fn with_mandatory_objects() -> Result<Self, EdsError> {
        let mut od = Self::new();
        for (index, object) in predefined::mandatory_objects()? {
            od.insert(index, None, object)?;
        }
        Ok(od)
    }

    /// `true` if the document is a DCF (has a commissioning block).
    pub fn is_dcf(&self) -> bool {
        self.device_commissioning.is_some()
    }

    pub fn get(&self, index: u16) -> Option<&Object> {
        self.objects.get(&index)
    }

    /// Mutable access to a whole object.
    ///
    /// Record/Array invariants stay protected by their own methods.
    pub fn get_mut(&mut self, index: u16) -> Option<&mut Object> {
        self.objects.get_mut(&index)
    }

    /// Looks up a leaf: the object itself for `subindex == None`, otherwise
    /// the subindex of a Record/Array.
    pub fn variable(&self, index: u16, subindex: Option<u8>) -> Option<&Variable> {
        match (self.objects.get(&index)?, subindex) {
            (Object::Variable(v), None) => Some(v),
            (object, Some(sub)) => object.subindex(sub),
            _ => None,
        }
    }

    pub fn contains(&self, index: u16, subindex: Option<u8>) -> bool {
        match subindex {
            None => self.objects.contains_key(&index),
            Some(sub) => self.variable(index, Some(sub)).is_some(),
        }
    }

    /// All indexes in ascending order.
    pub fn indexes(&self) -> impl Iterator<Item = u16> + '_ {
        self.objects.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Object)> + '_ {
        self.objects.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Storage-location tags used by the document, in first-seen order.
    pub fn storage_locations(&self) -> &StorageLocations {
        &self.storage_locations
    }

    /// Registers a storage-location tag without assigning it to any object.
    pub fn add_storage_location(&mut self, tag: &str) -> bool {
        self.storage_locations.insert(tag)
    }

    fn register_storage_locations(&mut self, object: &Object) {
        let mut added = self.storage_locations.insert(object.storage_location());
        match object {
            Object::Variable(_) => {}
            Object::Array(a) => a.iter().for_each(|(_, v)| {
                added |= self.storage_locations.insert(&v.storage_location);
            }),
            Object::Record(r) => r.iter().for_each(|(_, v)| {
                added |= self.storage_locations.insert(&v.storage_location);
            }),
        }
        if added {
            trace!("Storage locations now {:?}", self.storage_locations);
        }
    }

    /// Inserts an object at `index`, or a Variable into a Record/Array when
    /// `subindex` is given.
    ///
    /// # Errors
    /// Fails if the index is reserved for data types (< 0x1000), if the slot
    /// is occupied, or if the subindex target is not a Record/Array.
    pub fn insert(
        &mut self,
        index: u16,
        subindex: Option<u8>,
        object: impl Into<Object>,
    ) -> Result<(), EdsError> {
        let object = object.into();
        if index < FIRST_OBJECT_INDEX {
            error!("Rejected insert at reserved index 0x{:04X}", index);
            return Err(EdsError::dictionary(format!(
                "index 0x{:04X} is reserved for data type definitions",
                index
            )));
        }

        let Some(sub) = subindex else {
            if self.objects.contains_key(&index) {
                error!("Rejected insert: index 0x{:04X} already exists", index);
                return Err(EdsError::dictionary(format!(
                    "index 0x{:04X} already exists",
                    index
                )));
            }
            self.register_storage_locations(&object);
            self.objects.insert(index, object);
            trace!("Inserted object at 0x{:04X}", index);
            return Ok(());
        };

        let Object::Variable(variable) = object else {
            error!("Rejected insert: only a variable fits subindex 0x{:04X}sub{:X}", index, sub);
            return Err(EdsError::dictionary(
                "only a variable can be inserted at a subindex",
            ));
        };
        let tag = variable.storage_location.clone();
        let inserted = match self.objects.get_mut(&index) {
            Some(Object::Record(r)) => r.insert(sub, variable),
            Some(Object::Array(a)) => a.insert(sub, variable),
            Some(Object::Variable(_)) => {
                error!("Rejected insert: 0x{:04X} is a variable", index);
                Err(EdsError::dictionary(format!(
                    "index 0x{:04X} is a variable and has no subindexes",
                    index
                )))
            }
            None => {
                error!("Rejected insert: index 0x{:04X} does not exist", index);
                Err(EdsError::dictionary(format!(
                    "index 0x{:04X} does not exist",
                    index
                )))
            }
        };
        if inserted.is_ok() {
            self.storage_locations.insert(&tag);
        }
        inserted
    }

    /// Removes a whole object, or one subindex of a Record/Array.
    ///
    /// Mandatory objects and subindex 0 cannot be removed.
    pub fn remove(&mut self, index: u16, subindex: Option<u8>) -> Result<Object, EdsError> {
        match subindex {
            None => {
                if MANDATORY_OBJECTS.contains(&index) {
                    error!("Rejected removal of mandatory object 0x{:04X}", index);
                    return Err(EdsError::dictionary(format!(
                        "index 0x{:04X} is mandatory and cannot be removed",
                        index
                    )));
                }
                self.objects.remove(&index).ok_or_else(|| {
                    error!("Rejected removal: index 0x{:04X} does not exist", index);
                    EdsError::dictionary(format!("index 0x{:04X} does not exist", index))
                })
            }
            Some(sub) => {
                let removed = match self.objects.get_mut(&index) {
                    Some(Object::Record(r)) => r.remove(sub)?,
                    Some(Object::Array(a)) => a.remove(sub)?,
                    _ => {
                        error!("Rejected removal: 0x{:04X} has no subindexes", index);
                        return Err(EdsError::dictionary(format!(
                            "index 0x{:04X} has no subindex 0x{:X}",
                            index, sub
                        )));
                    }
                };
                Ok(Object::Variable(removed))
            }
        }
    }

    /// Copies (or moves, when `move_` is set) a Variable or a whole
    /// Record/Array to a new location.
    ///
    /// With `subindex == None` the whole object at `index` is copied;
    /// otherwise one subindex Variable. The copy is always deep. The whole
    /// request is validated before anything is changed.
    pub fn copy_object(
        &mut self,
        index: u16,
        subindex: Option<u8>,
        new_index: u16,
        new_subindex: Option<u8>,
        move_: bool,
    ) -> Result<(), EdsError> {
        let source: Object = match subindex {
            None => self.objects.get(&index).cloned(),
            Some(sub) => self.variable(index, Some(sub)).cloned().map(Object::Variable),
        }
        .ok_or_else(|| {
            error!("Rejected copy: source 0x{:04X}/{:?} does not exist", index, subindex);
            EdsError::dictionary(format!(
                "source index 0x{:04X} subindex {:?} does not exist",
                index, subindex
            ))
        })?;

        match new_subindex {
            None => {
                if self.objects.contains_key(&new_index) {
                    error!("Rejected copy: destination 0x{:04X} is occupied", new_index);
                    return Err(EdsError::dictionary(format!(
                        "destination index 0x{:04X} already exists",
                        new_index
                    )));
                }
            }
            Some(new_sub) => {
                match (self.objects.get(&new_index), &source) {
                    (Some(Object::Variable(_)), _) => {
                        error!("Rejected copy: destination 0x{:04X} is a variable", new_index);
                        return Err(EdsError::dictionary(format!(
                            "destination index 0x{:04X} is a variable and has no subindexes",
                            new_index
                        )));
                    }
                    (None, _) => {
                        error!("Rejected copy: destination 0x{:04X} does not exist", new_index);
                        return Err(EdsError::dictionary(format!(
                            "destination index 0x{:04X} does not exist",
                            new_index
                        )));
                    }
                    (Some(_), Object::Array(_) | Object::Record(_)) => {
                        error!("Rejected copy: a record or array cannot become a subindex");
                        return Err(EdsError::dictionary(
                            "a record or array cannot be copied into a subindex",
                        ));
                    }
                    (Some(parent), Object::Variable(variable)) => {
                        let occupied = new_sub != 0 && parent.subindex(new_sub).is_some();
                        let type_clash = matches!(parent, Object::Array(a)
                            if new_sub != 0 && a.data_type().is_some_and(|dt| dt != variable.data_type));
                        if occupied || type_clash {
                            error!(
                                "Rejected copy: destination 0x{:04X}sub{:X} cannot take the variable",
                                new_index, new_sub
                            );
                            return Err(EdsError::dictionary(format!(
                                "destination 0x{:04X} subindex 0x{:X} cannot take the variable",
                                new_index, new_sub
                            )));
                        }
                    }
                }
            }
        }

        if move_ {
            // The source must be removable before anything is inserted.
            if subindex.is_none() && MANDATORY_OBJECTS.contains(&index)
                || subindex == Some(0)
            {
                error!("Rejected move of protected entry 0x{:04X}/{:?}", index, subindex);
                return Err(EdsError::dictionary(format!(
                    "index 0x{:04X} subindex {:?} cannot be moved",
                    index, subindex
                )));
            }
        }

        self.insert(new_index, new_subindex, source)?;
        if move_ {
            self.remove(index, subindex)?;
        }
        debug!(
            "{} 0x{:04X}/{:?} to 0x{:04X}/{:?}",
            if move_ { "Moved" } else { "Copied" },
            index,
            subindex,
            new_index,
            new_subindex
        );
        Ok(())
    }

    fn add_pdo(&mut self, direction: PdoDirection) -> Result<u16, EdsError> {
        let (comm_base, mapping_base) = match direction {
            PdoDirection::Receive => (IDX_RPDO_COMM_PARAM_BASE, IDX_RPDO_MAPPING_PARAM_BASE),
            PdoDirection::Transmit => (IDX_TPDO_COMM_PARAM_BASE, IDX_TPDO_MAPPING_PARAM_BASE),
        };
        let slot = (0..PDO_SLOTS)
            .find(|slot| {
                !self.objects.contains_key(&(comm_base + slot))
                    && !self.objects.contains_key(&(mapping_base + slot))
            })
            .ok_or_else(|| {
                error!("No free {:?} PDO slot left", direction);
                EdsError::dictionary(format!("all {} {:?} PDO slots are used", PDO_SLOTS, direction))
            })?;

        let communication = predefined::pdo_communication(direction, slot)?;
        let mapping = predefined::pdo_mapping(direction)?;
        self.insert(comm_base + slot, None, communication)?;
        self.insert(mapping_base + slot, None, mapping)?;
        debug!("Added {:?} PDO in slot {}", direction, slot);
        Ok(slot)
    }

    /// Adds the next free RPDO communication/mapping pair and returns its
    /// slot number (0 for 0x1400/0x1600).
    pub fn add_rpdo(&mut self) -> Result<u16, EdsError> {
        self.add_pdo(PdoDirection::Receive)
    }

    /// Adds the next free TPDO communication/mapping pair and returns its
    /// slot number (0 for 0x1800/0x1A00).
    pub fn add_tpdo(&mut self) -> Result<u16, EdsError> {
        self.add_pdo(PdoDirection::Transmit)
    }

    /// Number of RPDO communication objects present.
    pub fn rpdos(&self) -> usize {
        self.objects.range(RPDO_COMM_RANGE).count()
    }

    /// Number of TPDO communication objects present.
    pub fn tpdos(&self) -> usize {
        self.objects.range(TPDO_COMM_RANGE).count()
    }

    /// Mandatory objects present, in canonical order.
    pub fn mandatory_objects(&self) -> Vec<u16> {
        MANDATORY_OBJECTS
            .iter()
            .copied()
            .filter(|i| self.objects.contains_key(i))
            .collect()
    }

    /// Communication-area and device-profile objects that are not mandatory.
    pub fn optional_objects(&self) -> Vec<u16> {
        self.indexes()
            .filter(|i| {
                (COMMUNICATION_AREA.contains(i) && !MANDATORY_OBJECTS.contains(i))
                    || DEVICE_PROFILE_AREA.contains(i)
            })
            .collect()
    }

    /// Manufacturer-specific objects (0x2000 - 0x5FFF).
    pub fn manufacturer_objects(&self) -> Vec<u16> {
        self.objects.range(MANUFACTURER_AREA).map(|(i, _)| *i).collect()
    }

    /// Mutable Record/Array lookup used while a file is being read.
    pub(crate) fn objects_mut(&mut self) -> &mut BTreeMap<u16, Object> {
        &mut self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessType, DataType};

    fn u8_var(name: &str) -> Variable {
        Variable::new(name, DataType::Unsigned8, AccessType::Rw)
    }

    #[test]
    fn test_index_uniqueness() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2000, None, u8_var("first")).unwrap();
        let err = od.insert(0x2000, None, u8_var("second")).unwrap_err();
        assert!(matches!(err, EdsError::Dictionary(_)));
        assert_eq!(od.get(0x2000).unwrap().parameter_name(), "first");
    }

    #[test]
    fn test_reserved_index_rejected() {
        let mut od = ObjectDictionary::new();
        assert!(od.insert(0x0005, None, u8_var("dummy")).is_err());
        assert!(od.is_empty());
    }

    #[test]
    fn test_insert_subindex_requires_container() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2000, None, u8_var("var")).unwrap();
        assert!(od.insert(0x2000, Some(1), u8_var("x")).is_err());
        assert!(od.insert(0x2001, Some(1), u8_var("x")).is_err());
        od.insert(0x2002, None, Record::new("rec")).unwrap();
        assert!(od.insert(0x2002, Some(1), Record::new("nested")).is_err());
        od.insert(0x2002, Some(1), u8_var("x")).unwrap();
        assert!(od.contains(0x2002, Some(1)));
    }

    #[test]
    fn test_mandatory_objects_cannot_be_removed() {
        let mut od = ObjectDictionary::with_mandatory_objects().unwrap();
        assert!(od.remove(0x1018, None).is_err());
        assert!(od.remove(0x1018, Some(0)).is_err());
        assert!(od.remove(0x1018, Some(4)).is_ok());
        assert_eq!(od.variable(0x1018, Some(0)).unwrap().default_value, "0x03");
        assert_eq!(od.mandatory_objects(), [0x1000, 0x1001, 0x1018]);
    }

    #[test]
    fn test_classification_ranges() {
        let mut od = ObjectDictionary::with_mandatory_objects().unwrap();
        for index in [0x1017, 0x2000, 0x5FFF, 0x6000, 0xA000] {
            od.insert(index, None, u8_var("x")).unwrap();
        }
        assert_eq!(od.optional_objects(), [0x1017, 0x6000, 0xA000]);
        assert_eq!(od.manufacturer_objects(), [0x2000, 0x5FFF]);
    }

    #[test]
    fn test_copy_variable_is_deep() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2000, None, u8_var("orig")).unwrap();
        od.copy_object(0x2000, None, 0x2001, None, false).unwrap();
        if let Some(Object::Variable(v)) = od.get_mut(0x2001) {
            v.parameter_name = String::from("changed");
        }
        assert_eq!(od.get(0x2000).unwrap().parameter_name(), "orig");
        assert_eq!(od.get(0x2001).unwrap().parameter_name(), "changed");
    }

    #[test]
    fn test_copy_failures_leave_dictionary_unchanged() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2000, None, u8_var("var")).unwrap();
        od.insert(0x2001, None, Record::new("rec")).unwrap();
        od.insert(0x2001, Some(1), u8_var("sub")).unwrap();
        let before = od.clone();

        // missing source
        assert!(od.copy_object(0x3000, None, 0x3001, None, false).is_err());
        // destination is a variable
        assert!(od.copy_object(0x2001, Some(1), 0x2000, Some(1), false).is_err());
        // destination occupied
        assert!(od.copy_object(0x2000, None, 0x2001, None, true).is_err());
        assert!(od.copy_object(0x2000, None, 0x2001, Some(1), true).is_err());
        // record into a subindex
        assert!(od.copy_object(0x2001, None, 0x2001, Some(2), false).is_err());
        assert_eq!(od, before);
    }

    #[test]
    fn test_move_subindex_between_records() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2001, None, Record::new("a")).unwrap();
        od.insert(0x2002, None, Record::new("b")).unwrap();
        od.insert(0x2001, Some(1), u8_var("moving")).unwrap();

        od.copy_object(0x2001, Some(1), 0x2002, Some(3), true).unwrap();
        assert!(!od.contains(0x2001, Some(1)));
        assert_eq!(od.variable(0x2001, Some(0)).unwrap().default_value, "0x00");
        assert_eq!(od.variable(0x2002, Some(3)).unwrap().parameter_name, "moving");
        assert_eq!(od.variable(0x2002, Some(0)).unwrap().default_value, "0x03");
    }

    #[test]
    fn test_move_whole_record() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2001, None, Record::new("rec")).unwrap();
        od.insert(0x2001, Some(2), u8_var("x")).unwrap();
        od.copy_object(0x2001, None, 0x2100, None, true).unwrap();
        assert!(od.get(0x2001).is_none());
        assert_eq!(od.variable(0x2100, Some(2)).unwrap().parameter_name, "x");
    }

    #[test]
    fn test_move_mandatory_rejected() {
        let mut od = ObjectDictionary::with_mandatory_objects().unwrap();
        assert!(od.copy_object(0x1000, None, 0x2000, None, true).is_err());
        assert!(od.get(0x2000).is_none());
        od.copy_object(0x1000, None, 0x2000, None, false).unwrap();
        assert!(od.get(0x1000).is_some());
    }

    #[test]
    fn test_pdo_allocation() {
        let mut od = ObjectDictionary::new();
        for n in 0..5u16 {
            assert_eq!(od.add_rpdo().unwrap(), n);
        }
        assert_eq!(od.rpdos(), 5);
        assert_eq!(od.tpdos(), 0);
        let cob_ids: Vec<String> = (0x1400..0x1405)
            .map(|i| od.variable(i, Some(1)).unwrap().default_value.clone())
            .collect();
        assert_eq!(
            cob_ids,
            [
                "$NODEID + 0x200",
                "$NODEID + 0x300",
                "$NODEID + 0x400",
                "$NODEID + 0x500",
                "$NODEID + 0x200"
            ]
        );
        assert!(od.get(0x1604).is_some());

        assert_eq!(od.add_tpdo().unwrap(), 0);
        assert_eq!(od.variable(0x1800, Some(1)).unwrap().default_value, "$NODEID + 0x180");
        assert!(od.get(0x1A00).is_some());
    }

    #[test]
    fn test_pdo_slot_capacity() {
        let mut od = ObjectDictionary::new();
        for _ in 0..512 {
            od.add_rpdo().unwrap();
        }
        assert_eq!(od.rpdos(), 512);
        let err = od.add_rpdo().unwrap_err();
        assert!(matches!(err, EdsError::Dictionary(_)));
        assert_eq!(od.rpdos(), 512);
    }

    #[test]
    fn test_pdo_reuses_free_slot() {
        let mut od = ObjectDictionary::new();
        od.add_tpdo().unwrap();
        od.add_tpdo().unwrap();
        od.remove(0x1800, None).unwrap();
        od.remove(0x1A00, None).unwrap();
        assert_eq!(od.add_tpdo().unwrap(), 0);
    }

    #[test]
    fn test_storage_locations_follow_inserts() {
        let mut od = ObjectDictionary::new();
        let mut var = u8_var("persisted");
        var.storage_location = String::from("PERSIST_COMM");
        od.insert(0x2000, None, var).unwrap();
        let tags: Vec<&str> = od.storage_locations().iter().collect();
        assert_eq!(tags, ["RAM", "PERSIST_COMM"]);
    }
}
