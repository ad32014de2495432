//! Integration tests focused on damaged input.
//!
//! Structural problems (no header, unknown header) abort the parse. Every
//! other problem is corrected, reported as a note and must not panic.

use canopen_eds::{DataType, EdsError, load_eds_from_str, save_eds_to_string};

/// An EDS with one problem of each recoverable kind.
const DAMAGED_EDS: &str = "\
[FileInfo]
FileName=damaged.eds
FileVersion=one
FileRevision=1
Description=Damaged
CreationTime=09:15AM
CreationDate=03-14-2024
CreatedBy=me
ModificationTime=09:15AM
ModificationDate=03-14-2024
ModifiedBy=me

[MandatoryObjects]
SupportedObjects=2
1=0x1000
2=0x1018

[1000]
ParameterName=Device type
ObjectType=0x7
DataType=0x0007
AccessType=ro
DefaultValue=0
Bogus=1

[1018]
ParameterName=Identity
ObjectType=0x9
SubNumber=3

[1018sub0]
ParameterName=Highest sub-index supported
ObjectType=0x7
DataType=0x0007
AccessType=const
DefaultValue=4

[1018sub1]
ParameterName=Vendor-ID
ObjectType=0x7
DataType=0x0007
AccessType=sometimes
DefaultValue=0x1

[1019sub1]
ParameterName=Orphan
DataType=0x0005
AccessType=ro

[0005]
ParameterName=UNSIGNED8
DataType=0x0007
AccessType=ro
";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_damaged_file_is_corrected_with_notes() {
    init_logger();
    let (od, notes) = load_eds_from_str(DAMAGED_EDS).expect("Damaged file should still parse");

    let expected = [
        "FileVersion was incorrectly formatted in [FileInfo]",
        "Unknown entry \"Bogus\" in [1000]",
        "DataType of [1018sub0] was not UNSIGNED8",
        "AccessType was incorrectly formatted in [1018sub1]",
        "[1019sub1] has no record or array at 0x1019 and was skipped",
        "[0005] is reserved for data type definitions and was skipped",
        "[DeviceInfo] was missing",
        "DefaultValue of [1018sub0] was \"4\", corrected to 0x01",
        "SubNumber of [1018] was 3, but 2 subindexes were found",
    ];
    for message in expected {
        assert!(
            notes.iter().any(|n| n == message),
            "Missing note {:?} in {:?}",
            message,
            notes
        );
    }
    assert_eq!(notes.len(), expected.len(), "Unexpected notes: {:?}", notes);

    // Defaults were substituted and the dictionary is consistent again.
    assert_eq!(od.file_info.file_version, 0);
    assert_eq!(od.file_info.eds_version, "3.0");
    let counter = od.variable(0x1018, Some(0)).unwrap();
    assert_eq!(counter.data_type, DataType::Unsigned8);
    assert_eq!(counter.default_value, "0x01");
    assert!(!od.contains(0x1019, None));
    assert_eq!(od.indexes().collect::<Vec<_>>(), [0x1000, 0x1018]);
}

#[test]
fn test_corrected_dictionary_parses_cleanly() {
    init_logger();
    let (od, _) = load_eds_from_str(DAMAGED_EDS).unwrap();
    let text = save_eds_to_string(&od, false).unwrap();
    let (reparsed, notes) = load_eds_from_str(&text).unwrap();
    assert!(notes.is_empty(), "Unexpected notes: {:?}", notes);
    assert_eq!(reparsed.variable(0x1018, Some(0)), od.variable(0x1018, Some(0)));
}

#[test]
fn test_block_without_header_is_fatal() {
    init_logger();
    let text = "[FileInfo]\nFileName=a.eds\n\nVendorName=Nobody\n";
    let err = load_eds_from_str(text).unwrap_err();
    assert!(matches!(err, EdsError::MissingHeader { section: 2 }));
}

#[test]
fn test_unknown_header_is_fatal() {
    init_logger();
    let text = "[FileInfo]\nFileName=a.eds\n\n[Bogus]\nKey=1\n";
    match load_eds_from_str(text) {
        Err(EdsError::UnknownHeader { header }) => assert_eq!(header, "[Bogus]"),
        other => panic!("Expected UnknownHeader, got {:?}", other),
    }
}

#[test]
fn test_empty_input_reports_missing_sections() {
    init_logger();
    let (od, notes) = load_eds_from_str("").unwrap();
    assert!(od.is_empty());
    assert_eq!(notes, ["[FileInfo] was missing", "[DeviceInfo] was missing"]);
}

#[test]
fn test_invalid_octet_string_falls_back_to_empty() {
    init_logger();
    let text = "[2000]\nParameterName=Key\nObjectType=0x7\nDataType=0x000A\nAccessType=ro\nDefaultValue=XYZ\n";
    let (od, notes) = load_eds_from_str(text).unwrap();
    assert!(notes.contains(&"DefaultValue was incorrectly formatted in [2000]".to_string()));
    assert_eq!(od.variable(0x2000, None).unwrap().default_value, "");
}
