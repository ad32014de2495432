// crates/canopen-eds/src/parser/info.rs

//! Readers for the metadata sections and the object list sections.

use super::section::{FieldReader, Notes, Section, flag, int};
use crate::od::{
    BAUD_RATES, DUMMY_OBJECTS, DeviceCommissioning, DeviceInfo, DummyUsage, FileInfo, parse_date,
    parse_time,
};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

pub(super) fn read_file_info(section: &Section, notes: &mut Notes) -> FileInfo {
    let mut reader = FieldReader::new(section, notes);
    let defaults = FileInfo::default();

    FileInfo {
        file_name: reader.required("FileName", |s| Some(s.to_string()), defaults.file_name),
        file_version: reader.required("FileVersion", int::<u8>, defaults.file_version),
        file_revision: reader.required("FileRevision", int::<u8>, defaults.file_revision),
        last_eds: reader.optional_text("LastEDS"),
        // A file without EDSVersion predates 4.0.
        eds_version: reader.optional("EDSVersion", |s| Some(s.to_string()), "3.0".to_string()),
        description: reader.required_text("Description"),
        creation_time: reader.required("CreationTime", parse_time, defaults.creation_time),
        creation_date: reader.required("CreationDate", parse_date, defaults.creation_date),
        created_by: reader.required_text("CreatedBy"),
        modification_time: reader.required(
            "ModificationTime",
            parse_time,
            defaults.modification_time,
        ),
        modification_date: reader.required(
            "ModificationDate",
            parse_date,
            defaults.modification_date,
        ),
        modified_by: reader.required_text("ModifiedBy"),
    }
}

/// `NrOfRXPDO` / `NrOfTXPDO` as declared in the file.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct DeclaredPdoCounts {
    pub rpdos: Option<usize>,
    pub tpdos: Option<usize>,
}

pub(super) fn read_device_info(section: &Section, notes: &mut Notes) -> (DeviceInfo, DeclaredPdoCounts) {
    let mut reader = FieldReader::new(section, notes);
    let defaults = DeviceInfo::default();

    let mut baud_rates = defaults.baud_rates;
    for (supported, rate) in baud_rates.iter_mut().zip(BAUD_RATES) {
        *supported = reader.required(&format!("BaudRate_{}", rate), flag, *supported);
    }

    let info = DeviceInfo {
        vendor_name: reader.required_text("VendorName"),
        vendor_number: reader.required("VendorNumber", int::<u32>, defaults.vendor_number),
        product_name: reader.required_text("ProductName"),
        product_number: reader.required("ProductNumber", int::<u32>, defaults.product_number),
        revision_number: reader.required("RevisionNumber", int::<u32>, defaults.revision_number),
        order_code: reader.required_text("OrderCode"),
        baud_rates,
        simple_boot_up_master: reader.required(
            "SimpleBootUpMaster",
            flag,
            defaults.simple_boot_up_master,
        ),
        simple_boot_up_slave: reader.required(
            "SimpleBootUpSlave",
            flag,
            defaults.simple_boot_up_slave,
        ),
        granularity: reader.required("Granularity", int::<u8>, defaults.granularity),
        dynamic_channels_supported: reader.required(
            "DynamicChannelsSupported",
            flag,
            defaults.dynamic_channels_supported,
        ),
        group_messaging: reader.required("GroupMessaging", flag, defaults.group_messaging),
        lss_supported: reader.required("LSS_Supported", flag, defaults.lss_supported),
    };
    let declared = DeclaredPdoCounts {
        rpdos: reader.required("NrOfRXPDO", |s| int::<usize>(s).map(Some), None),
        tpdos: reader.required("NrOfTXPDO", |s| int::<usize>(s).map(Some), None),
    };
    (info, declared)
}

pub(super) fn read_device_commissioning(section: &Section, notes: &mut Notes) -> DeviceCommissioning {
    let mut reader = FieldReader::new(section, notes);
    let defaults = DeviceCommissioning::default();

    DeviceCommissioning {
        node_id: reader.required("NodeID", int::<u8>, defaults.node_id),
        node_name: reader.required_text("NodeName"),
        // Keys match case-insensitively, so `BaudRate` is accepted too.
        baud_rate: reader.required("Baudrate", int::<u16>, defaults.baud_rate),
        net_number: reader.required("NetNumber", int::<u32>, defaults.net_number),
        network_name: reader.required_text("NetworkName"),
        canopen_manager: reader.optional("CANopenManager", flag, defaults.canopen_manager),
        lss_serial_number: reader.optional(
            "LSS_SerialNumber",
            int::<u32>,
            defaults.lss_serial_number,
        ),
    }
}

pub(super) fn read_dummy_usage(section: &Section, notes: &mut Notes) -> DummyUsage {
    let mut reader = FieldReader::new(section, notes);
    let mut usage = DummyUsage::default();
    for (n, used) in usage.dummies.iter_mut().enumerate() {
        *used = reader.optional(&dummy_key(n), flag, *used);
    }
    usage
}

/// `Dummy0001` for `n == 0`.
pub(crate) fn dummy_key(n: usize) -> String {
    debug_assert!(n < DUMMY_OBJECTS);
    format!("Dummy{:04X}", n + 1)
}

/// `[Comments]`: `Lines=N` followed by `Line1`..`LineN`.
pub(super) fn read_comments(section: &Section, notes: &mut Notes) -> String {
    let mut reader = FieldReader::new(section, notes);
    let lines = reader.required("Lines", int::<usize>, 0);
    let mut comment = Vec::with_capacity(lines);
    for n in 1..=lines {
        comment.push(reader.required_text(&format!("Line{}", n)));
    }
    comment.join("\n")
}

/// `[MandatoryObjects]` and friends: `SupportedObjects=N` then `1=0xXXXX`..
pub(super) fn read_object_list(section: &Section, notes: &mut Notes) -> Vec<u16> {
    let mut reader = FieldReader::new(section, notes);
    let count = reader.required("SupportedObjects", int::<usize>, 0);
    let mut indexes = Vec::with_capacity(count);
    for n in 1..=count {
        if let Some(index) = reader.required(&n.to_string(), |s| int::<u16>(s).map(Some), None) {
            indexes.push(index);
        }
    }
    indexes
}
