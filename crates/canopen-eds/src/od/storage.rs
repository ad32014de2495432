// crates/canopen-eds/src/od/storage.rs

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Distinct storage-location tags in first-seen order.
///
/// The firmware generator emits one struct per tag in this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocations {
    tags: Vec<String>,
}

impl Default for StorageLocations {
    fn default() -> Self {
        Self {
            tags: alloc::vec![super::entry::DEFAULT_STORAGE_LOCATION.to_string()],
        }
    }
}

impl StorageLocations {
    /// Adds `tag` if it is not already present. Returns `true` if it was new.
    pub fn insert(&mut self, tag: &str) -> bool {
        if self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
