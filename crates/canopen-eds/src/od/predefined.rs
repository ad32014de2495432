// crates/canopen-eds/src/od/predefined.rs

//! Templates for the mandatory objects and the PDO parameter records.

use super::constants::{
    IDX_DEVICE_TYPE_U32, IDX_ERROR_REGISTER_U8, IDX_IDENTITY_OBJECT_REC,
    RPDO_COB_ID_BASES, SUBIDX_IDENTITY_PRODUCT_CODE, SUBIDX_IDENTITY_REVISION_NUMBER,
    SUBIDX_IDENTITY_SERIAL_NUMBER, SUBIDX_IDENTITY_VENDOR_ID, TPDO_COB_ID_BASES,
};
use super::entry::{Object, Variable};
use super::record::Record;
use crate::error::EdsError;
use crate::types::{AccessType, DataType};
use alloc::format;
use alloc::vec::Vec;

/// Number of mapping entries in every PDO mapping record.
pub const PDO_MAPPING_ENTRIES: u8 = 8;

/// Builds a record from `(subindex, variable)` pairs known to be distinct.
fn record_with(name: &str, subs: Vec<(u8, Variable)>) -> Result<Record, EdsError> {
    let mut record = Record::new(name);
    for (subindex, variable) in subs {
        record.insert(subindex, variable)?;
    }
    Ok(record)
}

/// The three objects every EDS must define: 0x1000, 0x1001 and 0x1018.
pub(super) fn mandatory_objects() -> Result<Vec<(u16, Object)>, EdsError> {
    let device_type = Variable::new("Device type", DataType::Unsigned32, AccessType::Ro)
        .with_default("0x00000000");
    let error_register = Variable::new("Error register", DataType::Unsigned8, AccessType::Ro)
        .with_default("0x00");

    let identity_entry = |name: &str| {
        Variable::new(name, DataType::Unsigned32, AccessType::Ro).with_default("0x00000000")
    };
    let identity = record_with(
        "Identity",
        alloc::vec![
            (SUBIDX_IDENTITY_VENDOR_ID, identity_entry("Vendor-ID")),
            (SUBIDX_IDENTITY_PRODUCT_CODE, identity_entry("Product code")),
            (SUBIDX_IDENTITY_REVISION_NUMBER, identity_entry("Revision number")),
            (SUBIDX_IDENTITY_SERIAL_NUMBER, identity_entry("Serial number")),
        ],
    )?;

    Ok(alloc::vec![
        (IDX_DEVICE_TYPE_U32, device_type.into()),
        (IDX_ERROR_REGISTER_U8, error_register.into()),
        (IDX_IDENTITY_OBJECT_REC, identity.into()),
    ])
}

/// Which side of the link a PDO belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PdoDirection {
    Receive,
    Transmit,
}

impl PdoDirection {
    fn prefix(self) -> &'static str {
        match self {
            PdoDirection::Receive => "RPDO",
            PdoDirection::Transmit => "TPDO",
        }
    }

    /// Default COB-ID expression for the PDO in `slot`.
    fn cob_id(self, slot: u16) -> alloc::string::String {
        let bases = match self {
            PdoDirection::Receive => RPDO_COB_ID_BASES,
            PdoDirection::Transmit => TPDO_COB_ID_BASES,
        };
        format!("$NODEID + 0x{:X}", bases[usize::from(slot % 4)])
    }
}

/// Communication parameter record (0x14xx / 0x18xx) for `slot`.
pub(super) fn pdo_communication(direction: PdoDirection, slot: u16) -> Result<Record, EdsError> {
    let prefix = direction.prefix();
    let rw = |name: &str, data_type: DataType, default: &str| {
        Variable::new(name, data_type, AccessType::Rw).with_default(default)
    };

    let mut subs = alloc::vec![
        (
            1,
            rw(
                &format!("COB-ID used by {}", prefix),
                DataType::Unsigned32,
                &direction.cob_id(slot),
            ),
        ),
        (2, rw("Transmission type", DataType::Unsigned8, "0xFE")),
        (3, rw("Inhibit time", DataType::Unsigned16, "0")),
    ];
    // Subindex 4 is reserved for TPDOs.
    if direction == PdoDirection::Receive {
        subs.push((4, rw("Compatibility entry", DataType::Unsigned8, "0")));
    }
    subs.push((5, rw("Event timer", DataType::Unsigned16, "0")));
    subs.push((6, rw("SYNC start value", DataType::Unsigned8, "0")));

    record_with(&format!("{} communication parameter", prefix), subs)
}

/// Mapping parameter record (0x16xx / 0x1Axx) with all entries unused.
pub(super) fn pdo_mapping(direction: PdoDirection) -> Result<Record, EdsError> {
    let subs = (1..=PDO_MAPPING_ENTRIES)
        .map(|i| {
            let entry = Variable::new(
                &format!("Application object {}", i),
                DataType::Unsigned32,
                AccessType::Rw,
            )
            .with_default("0x00000000");
            (i, entry)
        })
        .collect();
    record_with(&format!("{} mapping parameter", direction.prefix()), subs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_objects() {
        let objects = mandatory_objects().unwrap();
        let indexes: Vec<u16> = objects.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, [0x1000, 0x1001, 0x1018]);
        match &objects[2].1 {
            Object::Record(identity) => {
                assert_eq!(identity.len(), 5);
                assert_eq!(identity.get(0).unwrap().default_value, "0x04");
            }
            other => panic!("Identity should be a record, got {:?}", other),
        }
    }

    #[test]
    fn test_cob_id_cycle() {
        assert_eq!(PdoDirection::Receive.cob_id(0), "$NODEID + 0x200");
        assert_eq!(PdoDirection::Receive.cob_id(3), "$NODEID + 0x500");
        assert_eq!(PdoDirection::Receive.cob_id(4), "$NODEID + 0x200");
        assert_eq!(PdoDirection::Transmit.cob_id(1), "$NODEID + 0x280");
        assert_eq!(PdoDirection::Transmit.cob_id(511), "$NODEID + 0x480");
    }

    #[test]
    fn test_tpdo_communication_skips_subindex_4() {
        let rpdo = pdo_communication(PdoDirection::Receive, 0).unwrap();
        let tpdo = pdo_communication(PdoDirection::Transmit, 0).unwrap();
        assert!(rpdo.contains(4));
        assert!(!tpdo.contains(4));
        assert_eq!(tpdo.get(0).unwrap().default_value, "0x06");
        assert_eq!(tpdo.get(1).unwrap().parameter_name, "COB-ID used by TPDO");
    }

    #[test]
    fn test_mapping_record_has_eight_unused_entries() {
        let mapping = pdo_mapping(PdoDirection::Transmit).unwrap();
        assert_eq!(mapping.len(), 9);
        assert_eq!(mapping.parameter_name, "TPDO mapping parameter");
        assert!(mapping
            .iter()
            .skip(1)
            .all(|(_, v)| v.default_value == "0x00000000"));
    }
}
