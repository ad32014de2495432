// crates/canopen-eds/src/lib.rs

#![cfg_attr(not(feature = "std"), no_std)]
#![doc = "Reads, repairs, writes and merges CANopen EDS/DCF files (CiA 306)."]
#![doc = ""]
#![doc = "The core works on `no_std + alloc`. It provides:"]
#![doc = "- `load_eds_from_str`: fault-tolerant parsing into an `ObjectDictionary`,"]
#![doc = "  returning every corrected field problem as a note."]
#![doc = "- `save_eds_to_string`: canonical EDS/DCF text."]
#![doc = "- `render_firmware_sources`: CANopenNode v4 `OD.c` / `OD.h` sources."]
#![doc = "- `merge`: copying objects from one dictionary into another."]
#![doc = ""]
#![doc = "The default `std` feature adds the path-based `load_eds`, `save_eds`,"]
#![doc = "`repair_eds` and `generate_firmware_sources`."]

extern crate alloc;

// --- Crate Modules ---

mod builder;
mod error;
mod firmware;
mod merge;
pub mod od;
mod parser;
mod pdo;
mod types;

// --- Public API Re-exports ---

pub use builder::save_eds_to_string;
pub use error::EdsError;
pub use firmware::{FirmwareOptions, FirmwareSources, camel_case, render_firmware_sources};
pub use merge::{MergeOptions, MergeStrategy, MergedEntry, merge};
pub use od::{
    Array, DeviceCommissioning, DeviceInfo, DummyUsage, FileInfo, Object, ObjectDictionary,
    Record, Variable,
};
pub use parser::load_eds_from_str;
pub use pdo::PdoMappingEntry;
pub use types::{AccessType, DataType, InvalidSchemaValue, ObjectType, parse_int};

#[cfg(feature = "std")]
pub use builder::save_eds;
#[cfg(feature = "std")]
pub use firmware::generate_firmware_sources;
#[cfg(feature = "std")]
pub use parser::{load_eds, repair_eds};
