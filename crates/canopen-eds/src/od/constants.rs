// crates/canopen-eds/src/od/constants.rs
//! Well-known object dictionary indexes and index ranges (CiA 301 / CiA 306).

use core::ops::RangeInclusive;

// --- 0x1000 - 0x1FFF: Communication Profile Area ---

pub const IDX_DEVICE_TYPE_U32: u16 = 0x1000;
pub const IDX_ERROR_REGISTER_U8: u16 = 0x1001;
pub const IDX_PREDEFINED_ERROR_FIELD_ARR: u16 = 0x1003;
pub const IDX_STORE_PARAMETERS_REC: u16 = 0x1010;
pub const IDX_RESTORE_DEFAULT_PARAMETERS_REC: u16 = 0x1011;
pub const IDX_IDENTITY_OBJECT_REC: u16 = 0x1018;
pub const SUBIDX_IDENTITY_VENDOR_ID: u8 = 1;
pub const SUBIDX_IDENTITY_PRODUCT_CODE: u8 = 2;
pub const SUBIDX_IDENTITY_REVISION_NUMBER: u8 = 3;
pub const SUBIDX_IDENTITY_SERIAL_NUMBER: u8 = 4;

/// Objects every EDS must contain, in their canonical list order.
pub const MANDATORY_OBJECTS: [u16; 3] = [
    IDX_DEVICE_TYPE_U32,
    IDX_ERROR_REGISTER_U8,
    IDX_IDENTITY_OBJECT_REC,
];

// 0x14xx - 0x1Bxx: PDO parameters, 512 slots each
pub const IDX_RPDO_COMM_PARAM_BASE: u16 = 0x1400;
pub const IDX_RPDO_MAPPING_PARAM_BASE: u16 = 0x1600;
pub const IDX_TPDO_COMM_PARAM_BASE: u16 = 0x1800;
pub const IDX_TPDO_MAPPING_PARAM_BASE: u16 = 0x1A00;
pub const PDO_SLOTS: u16 = 0x200;

pub const RPDO_COMM_RANGE: RangeInclusive<u16> = 0x1400..=0x15FF;
pub const RPDO_MAPPING_RANGE: RangeInclusive<u16> = 0x1600..=0x17FF;
pub const TPDO_COMM_RANGE: RangeInclusive<u16> = 0x1800..=0x19FF;
pub const TPDO_MAPPING_RANGE: RangeInclusive<u16> = 0x1A00..=0x1BFF;

/// COB-ID base offsets cycled through by consecutive RPDO slots.
pub const RPDO_COB_ID_BASES: [u16; 4] = [0x200, 0x300, 0x400, 0x500];
/// COB-ID base offsets cycled through by consecutive TPDO slots.
pub const TPDO_COB_ID_BASES: [u16; 4] = [0x180, 0x280, 0x380, 0x480];

// --- Classification areas ---

pub const COMMUNICATION_AREA: RangeInclusive<u16> = 0x1000..=0x1FFF;
pub const MANUFACTURER_AREA: RangeInclusive<u16> = 0x2000..=0x5FFF;
pub const DEVICE_PROFILE_AREA: RangeInclusive<u16> = 0x6000..=0xFFFF;

/// Indexes below this hold data type definitions and cannot be edited.
pub const FIRST_OBJECT_INDEX: u16 = 0x1000;

/// `true` if `index` holds a PDO mapping parameter record.
pub fn is_pdo_mapping_index(index: u16) -> bool {
    RPDO_MAPPING_RANGE.contains(&index) || TPDO_MAPPING_RANGE.contains(&index)
}
