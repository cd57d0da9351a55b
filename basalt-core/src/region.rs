//! Region metadata and `hbase:meta` key helpers.
//!
//! Every region is named `table,start_key,region_id`. Region names sort
//! byte-lexicographically, which is the order of rows in `hbase:meta` and
//! the order of the client's region index.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::types::RegionId;

/// Name of the meta table.
pub const META_TABLE_NAME: &[u8] = b"hbase:meta";

/// Name of the single meta region.
pub const META_REGION_NAME: &[u8] = b"hbase:meta,,1";

/// Column family holding region locations in meta.
pub const INFO_FAMILY: &[u8] = b"info";

/// Qualifier of the serialized `RegionInfo` cell.
pub const REGION_INFO_QUALIFIER: &[u8] = b"regioninfo";

/// Qualifier of the `host:port` cell.
pub const SERVER_QUALIFIER: &[u8] = b"server";

/// Separator between the components of a region name.
const FIELD_SEPARATOR: u8 = b',';

/// First byte greater than `'9'`.
const SEARCH_KEY_SUFFIX: u8 = b':';

/// Identifies one region: a contiguous key range of one table.
///
/// Immutable once built. The client shares regions as `Arc<RegionInfo>`
/// and replaces them on rediscovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    table: Bytes,
    region_name: Bytes,
    start_key: Bytes,
    stop_key: Bytes,
    region_id: RegionId,
    offline: bool,
    split: bool,
    replica_id: u32,
}

impl RegionInfo {
    /// Creates a region, deriving its name from the table, start key and id.
    #[must_use]
    pub fn new(
        table: impl Into<Bytes>,
        start_key: impl Into<Bytes>,
        stop_key: impl Into<Bytes>,
        region_id: RegionId,
    ) -> Self {
        let table = table.into();
        let start_key = start_key.into();
        let region_name = build_region_name(&table, &start_key, region_id);
        Self {
            table,
            region_name,
            start_key,
            stop_key: stop_key.into(),
            region_id,
            offline: false,
            split: false,
            replica_id: 0,
        }
    }

    /// Returns the well-known meta region.
    #[must_use]
    pub fn meta() -> Self {
        Self {
            table: Bytes::from_static(META_TABLE_NAME),
            region_name: Bytes::from_static(META_REGION_NAME),
            start_key: Bytes::new(),
            stop_key: Bytes::new(),
            region_id: RegionId::new(1),
            offline: false,
            split: false,
            replica_id: 0,
        }
    }

    /// Replaces the derived region name, e.g. with the meta row key it was read from.
    #[must_use]
    pub fn with_region_name(mut self, region_name: impl Into<Bytes>) -> Self {
        self.region_name = region_name.into();
        self
    }

    /// Sets the offline and split flags.
    #[must_use]
    pub fn with_state(mut self, offline: bool, split: bool) -> Self {
        self.offline = offline;
        self.split = split;
        self
    }

    /// Sets the replica id.
    #[must_use]
    pub fn with_replica_id(mut self, replica_id: u32) -> Self {
        self.replica_id = replica_id;
        self
    }

    /// Returns the owning table name.
    #[must_use]
    pub const fn table(&self) -> &Bytes {
        &self.table
    }

    /// Returns the region name, the key under which the region is indexed.
    #[must_use]
    pub const fn region_name(&self) -> &Bytes {
        &self.region_name
    }

    /// Returns the first key of the region (inclusive).
    #[must_use]
    pub const fn start_key(&self) -> &Bytes {
        &self.start_key
    }

    /// Returns the end of the region (exclusive); empty for the last region.
    #[must_use]
    pub const fn stop_key(&self) -> &Bytes {
        &self.stop_key
    }

    /// Returns the region creation timestamp.
    #[must_use]
    pub const fn region_id(&self) -> RegionId {
        self.region_id
    }

    /// Returns true if meta marks the region offline.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        self.offline
    }

    /// Returns true if the region is the parent of a split.
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.split
    }

    /// Returns the replica id (0 for the primary).
    #[must_use]
    pub const fn replica_id(&self) -> u32 {
        self.replica_id
    }

    /// Returns true if this is the last region of its table.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.stop_key.is_empty()
    }

    /// Returns true if `key` falls below this region's stop key.
    ///
    /// The start side is not checked: callers reach a region through a
    /// floor lookup, which already guarantees `start_key <= key`.
    #[must_use]
    pub fn covers(&self, key: &[u8]) -> bool {
        self.stop_key.is_empty() || key < self.stop_key.as_ref()
    }
}

impl fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.region_name))
    }
}

/// Builds `table,start_key,region_id`.
fn build_region_name(table: &[u8], start_key: &[u8], region_id: RegionId) -> Bytes {
    let id = region_id.get().to_string();
    let mut name = BytesMut::with_capacity(table.len() + start_key.len() + id.len() + 2);
    name.put_slice(table);
    name.put_u8(FIELD_SEPARATOR);
    name.put_slice(start_key);
    name.put_u8(FIELD_SEPARATOR);
    name.put_slice(id.as_bytes());
    name.freeze()
}

/// Builds the meta key to search for in order to locate `key` in `table`.
///
/// The result is `table,key,:`. Region ids are decimal timestamps and `:` is
/// the first byte after `'9'`, so a floor lookup on this key lands on the
/// newest region whose start key is at or before `key`.
#[must_use]
pub fn region_search_key(table: &[u8], key: &[u8]) -> Bytes {
    let mut search_key = BytesMut::with_capacity(table.len() + key.len() + 3);
    search_key.put_slice(table);
    search_key.put_u8(FIELD_SEPARATOR);
    search_key.put_slice(key);
    search_key.put_u8(FIELD_SEPARATOR);
    search_key.put_u8(SEARCH_KEY_SUFFIX);
    search_key.freeze()
}

/// Returns true if `cache_key` is a region name belonging to exactly `table`.
///
/// A plain prefix match is not enough: `foo` is a prefix of `foobar,...`.
/// The byte after the table prefix must be the field separator, so a key
/// that is exactly the table name (no separator at all) is rejected.
#[must_use]
pub fn is_cache_key_for_table(table: &[u8], cache_key: &[u8]) -> bool {
    cache_key.len() > table.len()
        && cache_key.starts_with(table)
        && cache_key[table.len()] == FIELD_SEPARATOR
}

/// Returns true if `table` is the meta table.
#[must_use]
pub fn is_meta_table(table: &[u8]) -> bool {
    table == META_TABLE_NAME
}
