// crates/canopen-eds/src/merge.rs

//! Copies objects from one dictionary into another.

use crate::od::constants::{RPDO_COMM_RANGE, RPDO_MAPPING_RANGE, TPDO_COMM_RANGE, TPDO_MAPPING_RANGE};
use crate::od::{Object, ObjectDictionary};
use alloc::vec::Vec;
use core::fmt;
use log::{debug, warn};

/// How objects present in both dictionaries are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Keep the target's objects; add only indexes and non-zero subindexes
    /// it lacks.
    #[default]
    Diff,
    /// Replace every shared index wholesale with the source's object.
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub strategy: MergeStrategy,
    /// Leave RPDO communication and mapping objects (0x1400 - 0x17FF) alone.
    pub skip_rpdo: bool,
    /// Leave TPDO communication and mapping objects (0x1800 - 0x1BFF) alone.
    pub skip_tpdo: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::Diff,
            skip_rpdo: true,
            skip_tpdo: true,
        }
    }
}

/// An index or subindex written into the target by [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedEntry {
    pub index: u16,
    /// `None` when the whole object was copied.
    pub subindex: Option<u8>,
}

impl fmt::Display for MergedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subindex {
            Some(sub) => write!(f, "0x{:04X} sub 0x{:02X}", self.index, sub),
            None => write!(f, "0x{:04X}", self.index),
        }
    }
}

impl MergeOptions {
    fn skips(&self, index: u16) -> bool {
        (self.skip_rpdo && (RPDO_COMM_RANGE.contains(&index) || RPDO_MAPPING_RANGE.contains(&index)))
            || (self.skip_tpdo
                && (TPDO_COMM_RANGE.contains(&index) || TPDO_MAPPING_RANGE.contains(&index)))
    }
}

/// Merges the objects of `from` into `into` and returns what was written,
/// in ascending index order.
///
/// Running the same merge twice reports nothing the second time. When an
/// EDS is merged into a DCF, `into.file_info.last_eds` records the EDS file
/// name.
pub fn merge(from: &ObjectDictionary, into: &mut ObjectDictionary, options: &MergeOptions) -> Vec<MergedEntry> {
    let mut merged = Vec::new();

    for (index, object) in from.iter() {
        if options.skips(index) {
            continue;
        }

        // 1. Whole objects
        let replace = match into.get(index) {
            None => true,
            Some(existing) => options.strategy == MergeStrategy::Override && existing != object,
        };
        if replace {
            into.objects_mut().remove(&index);
            if let Err(e) = into.insert(index, None, object.clone()) {
                warn!("Could not merge 0x{:04X}: {}", index, e);
                continue;
            }
            merged.push(MergedEntry { index, subindex: None });
            continue;
        }
        if options.strategy == MergeStrategy::Override {
            continue;
        }

        // 2. Missing subindexes of shared containers
        let subs = match object {
            Object::Variable(_) => continue,
            Object::Array(a) => a.iter().collect::<Vec<_>>(),
            Object::Record(r) => r.iter().collect::<Vec<_>>(),
        };
        for (sub, variable) in subs.into_iter().filter(|(sub, _)| *sub != 0) {
            if into.contains(index, Some(sub)) {
                continue;
            }
            match into.insert(index, Some(sub), variable.clone()) {
                Ok(()) => merged.push(MergedEntry {
                    index,
                    subindex: Some(sub),
                }),
                Err(e) => warn!("Could not merge 0x{:04X}sub{:X}: {}", index, sub, e),
            }
        }
    }

    if from.file_info.file_name.to_ascii_lowercase().ends_with(".eds") && into.is_dcf() {
        into.file_info.last_eds = from.file_info.file_name.clone();
    }
    debug!("Merged {} entries", merged.len());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::od::{Array, DeviceCommissioning, Record, Variable};
    use crate::types::{AccessType, DataType};
    use alloc::format;
    use alloc::string::{String, ToString};

    fn u16_var(name: &str, default: &str) -> Variable {
        Variable::new(name, DataType::Unsigned16, AccessType::Rw).with_default(default)
    }

    fn record(subs: &[u8]) -> Record {
        let mut r = Record::new("Settings");
        for &sub in subs {
            r.insert(sub, u16_var(&format!("Setting {}", sub), "0")).unwrap();
        }
        r
    }

    #[test]
    fn test_missing_index_is_copied_once() {
        let mut a = ObjectDictionary::with_mandatory_objects().unwrap();
        a.insert(0x2100, None, record(&[1, 2])).unwrap();
        let mut b = ObjectDictionary::with_mandatory_objects().unwrap();

        let merged = merge(&a, &mut b, &MergeOptions::default());
        assert_eq!(merged, [MergedEntry { index: 0x2100, subindex: None }]);
        assert_eq!(b.get(0x2100), a.get(0x2100));

        assert!(merge(&a, &mut b, &MergeOptions::default()).is_empty());
    }

    #[test]
    fn test_diff_adds_missing_subindexes_only() {
        let mut a = ObjectDictionary::new();
        a.insert(0x2100, None, record(&[1, 2, 3])).unwrap();
        let mut b = ObjectDictionary::new();
        let mut existing = record(&[1]);
        existing.get_mut(1).unwrap().default_value = String::from("7");
        b.insert(0x2100, None, existing).unwrap();

        let merged = merge(&a, &mut b, &MergeOptions::default());
        assert_eq!(
            merged,
            [
                MergedEntry { index: 0x2100, subindex: Some(2) },
                MergedEntry { index: 0x2100, subindex: Some(3) },
            ]
        );
        // Existing data is kept and the counter follows the new subindexes.
        assert_eq!(b.variable(0x2100, Some(1)).unwrap().default_value, "7");
        assert_eq!(b.variable(0x2100, Some(0)).unwrap().default_value, "0x03");
    }

    #[test]
    fn test_override_replaces_whole_objects() {
        let mut a = ObjectDictionary::new();
        a.insert(0x2000, None, u16_var("Speed", "100")).unwrap();
        let mut b = ObjectDictionary::new();
        b.insert(0x2000, None, u16_var("Speed", "5")).unwrap();
        let options = MergeOptions {
            strategy: MergeStrategy::Override,
            ..MergeOptions::default()
        };

        let merged = merge(&a, &mut b, &options);
        assert_eq!(merged, [MergedEntry { index: 0x2000, subindex: None }]);
        assert_eq!(b.variable(0x2000, None).unwrap().default_value, "100");
        assert!(merge(&a, &mut b, &options).is_empty());
    }

    #[test]
    fn test_pdo_ranges_are_skipped_by_default() {
        let mut a = ObjectDictionary::new();
        a.add_rpdo().unwrap();
        a.add_tpdo().unwrap();
        let mut b = ObjectDictionary::new();

        assert!(merge(&a, &mut b, &MergeOptions::default()).is_empty());
        assert_eq!(b.rpdos(), 0);

        let options = MergeOptions {
            skip_tpdo: false,
            ..MergeOptions::default()
        };
        let merged = merge(&a, &mut b, &options);
        let indexes: Vec<u16> = merged.iter().map(|e| e.index).collect();
        assert_eq!(indexes, [0x1800, 0x1A00]);
        assert_eq!(b.tpdos(), 1);
    }

    #[test]
    fn test_array_type_clash_is_skipped() {
        let mut a = ObjectDictionary::new();
        let mut wide = Array::new("Values");
        wide.insert(1, u16_var("Value", "0")).unwrap();
        wide.insert(2, u16_var("Value", "0")).unwrap();
        a.insert(0x2200, None, wide).unwrap();

        let mut b = ObjectDictionary::new();
        let mut narrow = Array::new("Values");
        narrow
            .insert(1, Variable::new("Value", DataType::Unsigned8, AccessType::Rw))
            .unwrap();
        b.insert(0x2200, None, narrow).unwrap();

        assert!(merge(&a, &mut b, &MergeOptions::default()).is_empty());
        assert!(!b.contains(0x2200, Some(2)));
    }

    #[test]
    fn test_last_eds_is_recorded_for_dcf_targets() {
        let mut eds = ObjectDictionary::new();
        eds.file_info.file_name = String::from("device.eds");
        let mut dcf = ObjectDictionary::new();
        dcf.device_commissioning = Some(DeviceCommissioning::default());

        merge(&eds, &mut dcf, &MergeOptions::default());
        assert_eq!(dcf.file_info.last_eds, "device.eds");

        let mut plain = ObjectDictionary::new();
        merge(&eds, &mut plain, &MergeOptions::default());
        assert_eq!(plain.file_info.last_eds, "");
    }

    #[test]
    fn test_merged_entry_display() {
        let entry = MergedEntry { index: 0x2100, subindex: Some(3) };
        assert_eq!(entry.to_string(), "0x2100 sub 0x03");
        let entry = MergedEntry { index: 0x2100, subindex: None };
        assert_eq!(entry.to_string(), "0x2100");
    }
}
