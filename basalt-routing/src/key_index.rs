//! Key range index - region names to regions, with floor lookup.
//!
//! Region names sort the way `hbase:meta` rows sort, so the region holding
//! a row is the entry at or just before the row's search key. The index
//! does not validate what it returns; the resolver checks the table and
//! stop key of the match.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use basalt_core::RegionInfo;
use bytes::Bytes;

/// Ordered map from region name to region.
///
/// Entries are inserted on discovery and overwritten by a later discovery
/// under the same name. Nothing is ever removed.
#[derive(Debug, Default)]
pub struct KeyRangeIndex {
    /// Map from region name to region.
    /// Using `BTreeMap` allows floor lookups.
    regions: Mutex<BTreeMap<Bytes, Arc<RegionInfo>>>,
}

impl KeyRangeIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry with the greatest key at or before `search_key`.
    ///
    /// A search key past every stored key yields the last entry. Returns
    /// `None` if the index is empty or `search_key` sorts before the first
    /// entry.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn get(&self, search_key: &[u8]) -> Option<(Bytes, Arc<RegionInfo>)> {
        let regions = self.regions.lock().expect("index lock poisoned");
        regions
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(search_key)))
            .next_back()
            .map(|(key, region)| (key.clone(), Arc::clone(region)))
    }

    /// Inserts or overwrites the entry for `key`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn put(&self, key: Bytes, region: Arc<RegionInfo>) -> Option<Arc<RegionInfo>> {
        self.regions
            .lock()
            .expect("index lock poisoned")
            .insert(key, region)
    }

    /// Returns the number of indexed regions.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.lock().expect("index lock poisoned").len()
    }

    /// Returns true if no region is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
