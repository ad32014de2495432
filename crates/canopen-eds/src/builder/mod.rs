// crates/canopen-eds/src/builder/mod.rs

//! Canonical EDS/DCF writer, the inverse of the parser.

mod objects;

use crate::error::EdsError;
use crate::od::{
    BAUD_RATES, DATE_FORMAT, DeviceCommissioning, DeviceInfo, DummyUsage, FileInfo,
    ObjectDictionary, TIME_FORMAT,
};
use crate::parser::{ObjectList, dummy_key};
use alloc::string::String;
use core::fmt::Write;
use log::{debug, error};

/// Serializes an `ObjectDictionary` into EDS (or DCF) text.
///
/// Sections are written in canonical order: `[FileInfo]`, `[DeviceInfo]`,
/// `[DeviceComissioning]` (DCF only), `[DummyUsage]`, `[Comments]`, then each
/// object list followed by its objects in ascending index order.
///
/// # Arguments
/// * `od` - The dictionary to serialize.
/// * `dcf` - Write a DCF: adds `LastEDS`, the commissioning block and
///   `Denotation` fields.
///
/// # Errors
/// Returns `EdsError::Dictionary` if a DCF is requested but the dictionary
/// has no commissioning block.
pub fn save_eds_to_string(od: &ObjectDictionary, dcf: bool) -> Result<String, EdsError> {
    let mut out = String::new();

    // 1. Metadata
    write_file_info(&mut out, &od.file_info, dcf)?;
    write_device_info(&mut out, &od.device_info, od.rpdos(), od.tpdos())?;
    if dcf {
        let commissioning = od.device_commissioning.as_ref().ok_or_else(|| {
            error!("Cannot write a DCF without a [DeviceComissioning] block");
            EdsError::dictionary("a DCF requires a device commissioning block")
        })?;
        write_device_commissioning(&mut out, commissioning)?;
    }
    write_dummy_usage(&mut out, &od.dummy_usage)?;
    write_comments(&mut out, &od.comment)?;

    // 2. Object lists, each followed by its objects
    let writer = objects::ObjectWriter {
        dcf,
        storage_markers: od.firmware_export,
    };
    for list in ObjectList::ALL {
        let indexes = list.computed(od);
        writeln!(out, "{}", list.header())?;
        writeln!(out, "SupportedObjects={}", indexes.len())?;
        for (n, index) in indexes.iter().enumerate() {
            writeln!(out, "{}=0x{:04X}", n + 1, index)?;
        }
        writeln!(out)?;
        for index in indexes {
            if let Some(object) = od.get(index) {
                writer.write_object(&mut out, index, object)?;
            }
        }
    }

    debug!("Serialized {} objects (dcf: {})", od.len(), dcf);
    Ok(out)
}

fn write_file_info(out: &mut String, info: &FileInfo, dcf: bool) -> Result<(), EdsError> {
    writeln!(out, "[FileInfo]")?;
    writeln!(out, "FileName={}", info.file_name)?;
    writeln!(out, "FileVersion={}", info.file_version)?;
    writeln!(out, "FileRevision={}", info.file_revision)?;
    if dcf {
        writeln!(out, "LastEDS={}", info.last_eds)?;
    }
    writeln!(out, "EDSVersion={}", info.eds_version)?;
    writeln!(out, "Description={}", info.description)?;
    writeln!(out, "CreationTime={}", info.creation_time.strftime(TIME_FORMAT))?;
    writeln!(out, "CreationDate={}", info.creation_date.strftime(DATE_FORMAT))?;
    writeln!(out, "CreatedBy={}", info.created_by)?;
    writeln!(
        out,
        "ModificationTime={}",
        info.modification_time.strftime(TIME_FORMAT)
    )?;
    writeln!(
        out,
        "ModificationDate={}",
        info.modification_date.strftime(DATE_FORMAT)
    )?;
    writeln!(out, "ModifiedBy={}", info.modified_by)?;
    writeln!(out)?;
    Ok(())
}

fn write_device_info(
    out: &mut String,
    info: &DeviceInfo,
    rpdos: usize,
    tpdos: usize,
) -> Result<(), EdsError> {
    writeln!(out, "[DeviceInfo]")?;
    writeln!(out, "VendorName={}", info.vendor_name)?;
    writeln!(out, "VendorNumber={}", info.vendor_number)?;
    writeln!(out, "ProductName={}", info.product_name)?;
    writeln!(out, "ProductNumber={}", info.product_number)?;
    writeln!(out, "RevisionNumber={}", info.revision_number)?;
    writeln!(out, "OrderCode={}", info.order_code)?;
    for (rate, supported) in BAUD_RATES.iter().zip(info.baud_rates) {
        writeln!(out, "BaudRate_{}={}", rate, u8::from(supported))?;
    }
    writeln!(out, "SimpleBootUpMaster={}", u8::from(info.simple_boot_up_master))?;
    writeln!(out, "SimpleBootUpSlave={}", u8::from(info.simple_boot_up_slave))?;
    writeln!(out, "Granularity={}", info.granularity)?;
    writeln!(
        out,
        "DynamicChannelsSupported={}",
        u8::from(info.dynamic_channels_supported)
    )?;
    writeln!(out, "GroupMessaging={}", u8::from(info.group_messaging))?;
    writeln!(out, "NrOfRXPDO={}", rpdos)?;
    writeln!(out, "NrOfTXPDO={}", tpdos)?;
    writeln!(out, "LSS_Supported={}", u8::from(info.lss_supported))?;
    writeln!(out)?;
    Ok(())
}

fn write_device_commissioning(
    out: &mut String,
    commissioning: &DeviceCommissioning,
) -> Result<(), EdsError> {
    // CiA 306 spells the header with a single "m".
    writeln!(out, "[DeviceComissioning]")?;
    writeln!(out, "NodeID=0x{:X}", commissioning.node_id)?;
    writeln!(out, "NodeName={}", commissioning.node_name)?;
    writeln!(out, "BaudRate={}", commissioning.baud_rate)?;
    writeln!(out, "NetNumber={}", commissioning.net_number)?;
    writeln!(out, "NetworkName={}", commissioning.network_name)?;
    writeln!(out, "CANopenManager={}", u8::from(commissioning.canopen_manager))?;
    writeln!(out, "LSS_SerialNumber={}", commissioning.lss_serial_number)?;
    writeln!(out)?;
    Ok(())
}

fn write_dummy_usage(out: &mut String, usage: &DummyUsage) -> Result<(), EdsError> {
    writeln!(out, "[DummyUsage]")?;
    for (n, used) in usage.dummies.iter().enumerate() {
        writeln!(out, "{}={}", dummy_key(n), u8::from(*used))?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_comments(out: &mut String, comment: &str) -> Result<(), EdsError> {
    writeln!(out, "[Comments]")?;
    if comment.is_empty() {
        writeln!(out, "Lines=0")?;
    } else {
        let lines: alloc::vec::Vec<&str> = comment.split('\n').collect();
        writeln!(out, "Lines={}", lines.len())?;
        for (n, line) in lines.iter().enumerate() {
            writeln!(out, "Line{}={}", n + 1, line)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Writes `od` to `path` and returns the path actually written.
///
/// A `.dcf` path always produces a DCF. Asking for a DCF at an `.eds` path
/// records the EDS name in `LastEDS` and writes next to it with the `.dcf`
/// extension instead. `FileName` is set to the written file's name and the
/// modification stamp to the current time.
#[cfg(feature = "std")]
pub fn save_eds(
    od: &mut ObjectDictionary,
    path: impl AsRef<std::path::Path>,
    dcf: bool,
) -> Result<std::path::PathBuf, EdsError> {
    let mut path = path.as_ref().to_path_buf();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    let dcf = dcf || extension.as_deref() == Some("dcf");
    if dcf && od.device_commissioning.is_none() {
        error!("Cannot write {} without a [DeviceComissioning] block", path.display());
        return Err(EdsError::dictionary(
            "a DCF requires a device commissioning block",
        ));
    }
    if dcf && extension.as_deref() == Some("eds") {
        od.file_info.last_eds = file_name(&path);
        path.set_extension("dcf");
    }

    od.file_info.file_name = file_name(&path);
    od.file_info.touch();
    let text = save_eds_to_string(od, dcf)?;
    std::fs::write(&path, text).map_err(|e| {
        error!("Could not write {}: {}", path.display(), e);
        EdsError::Io(e)
    })?;
    debug!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(feature = "std")]
fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::od::{Record, Variable};
    use crate::parser::load_eds_from_str;
    use crate::types::{AccessType, DataType};
    use alloc::string::ToString;
    use alloc::vec::Vec;

    fn sample() -> ObjectDictionary {
        let mut od = ObjectDictionary::with_mandatory_objects().unwrap();
        od.file_info.file_name = "sample.eds".to_string();
        od.file_info.creation_date = jiff::civil::date(2024, 3, 5);
        od.file_info.creation_time = jiff::civil::time(14, 7, 0, 0);
        od.device_info.vendor_name = "ACME".to_string();
        od.comment = "first line\nsecond line".to_string();
        let mut speed = Variable::new("Speed", DataType::Integer16, AccessType::Rww)
            .with_default("-5");
        speed.pdo_mapping = true;
        speed.low_limit = "-100".to_string();
        speed.denotation = "Wheel speed".to_string();
        speed.comments = "Measured speed".to_string();
        od.insert(0x2000, None, speed).unwrap();
        od.insert(0x2001, None, Record::new("Settings")).unwrap();
        od.insert(
            0x2001,
            Some(2),
            Variable::new("Key", DataType::OctetString, AccessType::Ro).with_default("A1B2C3"),
        )
        .unwrap();
        od
    }

    #[test]
    fn test_section_order() {
        let text = save_eds_to_string(&sample(), false).unwrap();
        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(
            headers,
            [
                "[FileInfo]",
                "[DeviceInfo]",
                "[DummyUsage]",
                "[Comments]",
                "[MandatoryObjects]",
                "[1000]",
                "[1001]",
                "[1018]",
                "[1018sub0]",
                "[1018sub1]",
                "[1018sub2]",
                "[1018sub3]",
                "[1018sub4]",
                "[OptionalObjects]",
                "[ManufacturerObjects]",
                "[2000]",
                "[2001]",
                "[2001sub0]",
                "[2001sub2]",
            ]
        );
        assert!(text.contains("CreationTime=02:07PM\nCreationDate=03-05-2024\n"));
        assert!(text.contains("[Comments]\nLines=2\nLine1=first line\nLine2=second line\n"));
        assert!(text.contains("[MandatoryObjects]\nSupportedObjects=3\n1=0x1000\n2=0x1001\n3=0x1018\n"));
        assert!(text.contains("[OptionalObjects]\nSupportedObjects=0\n\n"));
    }

    #[test]
    fn test_variable_layout() {
        let text = save_eds_to_string(&sample(), false).unwrap();
        assert!(text.contains(
            ";Measured speed\n[2000]\nParameterName=Speed\nObjectType=0x07\nDataType=0x0003\nAccessType=rww\nDefaultValue=-5\nPDOMapping=1\nLowLimit=-100\n\n"
        ));
        assert!(text.contains("[2001]\nParameterName=Settings\nObjectType=0x09\nSubNumber=2\n\n"));
        assert!(text.contains("DataType=0x000A\nAccessType=ro\nDefaultValue=A1 B2 C3\n"));
        assert!(!text.contains("Denotation"));
        assert!(!text.contains("StorageLocation"));
    }

    #[test]
    fn test_dcf_needs_commissioning() {
        let mut od = sample();
        let err = save_eds_to_string(&od, true).unwrap_err();
        assert!(matches!(err, EdsError::Dictionary(_)));

        od.device_commissioning = Some(DeviceCommissioning {
            node_id: 0x22,
            ..Default::default()
        });
        od.file_info.last_eds = "sample.eds".to_string();
        let text = save_eds_to_string(&od, true).unwrap();
        assert!(text.contains("FileRevision=0\nLastEDS=sample.eds\nEDSVersion=4.0\n"));
        assert!(text.contains("[DeviceComissioning]\nNodeID=0x22\n"));
        assert!(text.contains("Denotation=Wheel speed\n"));
    }

    #[test]
    fn test_storage_markers_written_when_flagged() {
        let mut od = sample();
        od.firmware_export = true;
        let text = save_eds_to_string(&od, false).unwrap();
        assert!(text.contains("ObjectType=0x07\n;StorageLocation=RAM\nDataType=0x0003\n"));
        assert!(text.contains("ObjectType=0x09\n;StorageLocation=RAM\nSubNumber=2\n"));
    }

    #[test]
    fn test_output_parses_back_to_same_dictionary() {
        let od = sample();
        let text = save_eds_to_string(&od, false).unwrap();
        let (parsed, notes) = load_eds_from_str(&text).unwrap();
        assert!(notes.is_empty(), "unexpected notes: {:?}", notes);
        assert_eq!(parsed.file_info, od.file_info);
        assert_eq!(parsed.device_info, od.device_info);
        assert_eq!(parsed.comment, od.comment);
        let parsed_speed = parsed.variable(0x2000, None).unwrap();
        let mut expected = od.variable(0x2000, None).unwrap().clone();
        // Denotation is only written to DCFs.
        expected.denotation.clear();
        assert_eq!(parsed_speed, &expected);
        assert_eq!(
            parsed.variable(0x2001, Some(2)).unwrap().default_value,
            "A1 B2 C3"
        );
        assert_eq!(parsed.get(0x1018), od.get(0x1018));
        assert_eq!(parsed.variable(0x2001, Some(0)), od.variable(0x2001, Some(0)));
        assert_eq!(save_eds_to_string(&parsed, false).unwrap(), text);
    }
}
