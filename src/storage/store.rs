//! Single-Owner Key-Value Store
//!
//! The in-memory map one core worker executes against. Every operation
//! returns a typed result; the protocol layer never inspects the map
//! directly.
//!
//! The `exptime` field is stored with each value but not enforced here;
//! expiry sweeping belongs to the storage-engine layer, which is outside
//! this front end's scope.

use bytes::Bytes;
use std::collections::HashMap;

/// A stored value with its client-supplied metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// The value bytes.
    pub data: Bytes,
    /// Opaque 32-bit client flags, kept verbatim.
    pub flags: u32,
    /// Expiration in seconds as declared by the client (0 = never).
    pub exptime: u32,
}

impl StoredValue {
    pub fn new(data: Bytes, flags: u32, exptime: u32) -> Self {
        Self {
            data,
            flags,
            exptime,
        }
    }
}

/// The per-core key-value map.
///
/// Owned exclusively by one worker task; no interior synchronization.
#[derive(Debug, Default)]
pub struct Store {
    map: HashMap<Bytes, StoredValue>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently stored on this core.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up a key.
    pub fn get(&self, key: &[u8]) -> Option<&StoredValue> {
        self.map.get(key)
    }

    /// Unconditionally stores a value. `set` always succeeds.
    pub fn set(&mut self, key: Bytes, value: StoredValue) {
        self.map.insert(key, value);
    }

    /// Stores only if the key does not exist. Returns whether it stored.
    pub fn add(&mut self, key: Bytes, value: StoredValue) -> bool {
        match self.map.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Stores only if the key already exists. Returns whether it stored.
    pub fn replace(&mut self, key: Bytes, value: StoredValue) -> bool {
        match self.map.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.insert(value);
                true
            }
            std::collections::hash_map::Entry::Vacant(_) => false,
        }
    }

    /// Removes a key. Returns whether it existed.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.map.remove(key).is_some()
    }

    /// Applies a signed delta to a stored decimal counter.
    ///
    /// Returns the new value, or `None` if the key is missing or the
    /// stored bytes do not parse as a signed 64-bit integer; the protocol
    /// renders both as `NOT_FOUND`. The new value is written back as
    /// decimal text, keeping the entry's flags and exptime.
    pub fn apply_delta(&mut self, key: &[u8], delta: i64) -> Option<i64> {
        let entry = self.map.get_mut(key)?;
        let current: i64 = std::str::from_utf8(&entry.data).ok()?.parse().ok()?;
        let updated = current.wrapping_add(delta);
        entry.data = Bytes::from(updated.to_string());
        Some(updated)
    }
}
