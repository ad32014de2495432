// crates/canopen-eds/src/od/info.rs

//! Non-object metadata blocks of an EDS/DCF file.

use alloc::string::{String, ToString};
use jiff::civil::{Date, Time};

/// Baud rates (kbit/s) listed in `[DeviceInfo]` as `BaudRate_<rate>` flags.
pub const BAUD_RATES: [u16; 8] = [10, 20, 50, 125, 250, 500, 800, 1000];

/// Number of `DummyNNNN` flags in `[DummyUsage]`.
pub const DUMMY_OBJECTS: usize = 7;

pub(crate) const DATE_FORMAT: &str = "%m-%d-%Y";
pub(crate) const TIME_FORMAT: &str = "%I:%M%p";

/// Parses a `mm-dd-yyyy` date.
pub fn parse_date(text: &str) -> Option<Date> {
    Date::strptime(DATE_FORMAT, text.trim()).ok()
}

/// Parses a `hh:mm(AM|PM)` time.
pub fn parse_time(text: &str) -> Option<Time> {
    Time::strptime(TIME_FORMAT, text.trim()).ok()
}

/// Current local date and time, or the Unix epoch without `std`.
fn now() -> (Date, Time) {
    #[cfg(feature = "std")]
    {
        let now = jiff::Zoned::now();
        let time = now.time();
        // Files only carry minute resolution.
        let time = Time::new(time.hour(), time.minute(), 0, 0).unwrap_or(Time::midnight());
        (now.date(), time)
    }
    #[cfg(not(feature = "std"))]
    {
        (jiff::civil::date(1970, 1, 1), Time::midnight())
    }
}

/// `[FileInfo]`
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub file_name: String,
    pub file_version: u8,
    pub file_revision: u8,
    /// Name of the EDS a DCF was derived from. Empty for an EDS.
    pub last_eds: String,
    pub eds_version: String,
    pub description: String,
    pub creation_date: Date,
    pub creation_time: Time,
    pub created_by: String,
    pub modification_date: Date,
    pub modification_time: Time,
    pub modified_by: String,
}

impl Default for FileInfo {
    fn default() -> Self {
        let (date, time) = now();
        Self {
            file_name: "new_file.eds".to_string(),
            file_version: 0,
            file_revision: 0,
            last_eds: String::new(),
            eds_version: "4.0".to_string(),
            description: String::new(),
            creation_date: date,
            creation_time: time,
            created_by: String::new(),
            modification_date: date,
            modification_time: time,
            modified_by: String::new(),
        }
    }
}

impl FileInfo {
    /// Stamps the modification date and time with the current time.
    pub fn touch(&mut self) {
        let (date, time) = now();
        self.modification_date = date;
        self.modification_time = time;
    }
}

/// `[DeviceInfo]`
///
/// `NrOfRXPDO`/`NrOfTXPDO` are not stored; they are always derived from the
/// dictionary content when writing.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub vendor_name: String,
    pub vendor_number: u32,
    pub product_name: String,
    pub product_number: u32,
    pub revision_number: u32,
    pub order_code: String,
    /// Support flag per entry of [`BAUD_RATES`].
    pub baud_rates: [bool; 8],
    pub simple_boot_up_master: bool,
    pub simple_boot_up_slave: bool,
    pub granularity: u8,
    pub dynamic_channels_supported: bool,
    pub group_messaging: bool,
    pub lss_supported: bool,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            vendor_name: String::new(),
            vendor_number: 0,
            product_name: String::new(),
            product_number: 0,
            revision_number: 0,
            order_code: String::new(),
            baud_rates: [true; 8],
            simple_boot_up_master: false,
            simple_boot_up_slave: false,
            granularity: 8,
            dynamic_channels_supported: false,
            group_messaging: false,
            lss_supported: false,
        }
    }
}

/// `[DeviceComissioning]`, present in DCF files only.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommissioning {
    pub node_id: u8,
    pub node_name: String,
    /// kbit/s
    pub baud_rate: u16,
    pub net_number: u32,
    pub network_name: String,
    pub canopen_manager: bool,
    pub lss_serial_number: u32,
}

impl Default for DeviceCommissioning {
    fn default() -> Self {
        Self {
            node_id: 1,
            node_name: String::new(),
            baud_rate: 1000,
            net_number: 0,
            network_name: String::new(),
            canopen_manager: false,
            lss_serial_number: 0,
        }
    }
}

/// `[DummyUsage]`: which dummy data-type objects may be mapped into PDOs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyUsage {
    /// `dummies[n]` is the flag of `Dummy000{n+1}`.
    pub dummies: [bool; DUMMY_OBJECTS],
}

impl Default for DummyUsage {
    fn default() -> Self {
        Self {
            dummies: [true; DUMMY_OBJECTS],
        }
    }
}
