//! Connection registry - region identity to region-server connection.
//!
//! Keys are compared by pointer, not by value: two byte-identical regions
//! produced by independent discoveries are distinct entries. An index
//! entry whose exact `Arc` has no registry entry yet is treated as a miss.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use basalt_core::RegionInfo;

use crate::connection::RegionConnection;

/// Hashes and compares a region by the address of its allocation.
///
/// Holding the `Arc` keeps the allocation alive, so the address cannot be
/// reused while the entry exists.
#[derive(Debug, Clone)]
struct RegionKey(Arc<RegionInfo>);

impl PartialEq for RegionKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RegionKey {}

impl Hash for RegionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

/// Map from region identity to the connection serving it.
///
/// Many regions may share one connection. Nothing is ever removed.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<RegionKey, Arc<dyn RegionConnection>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the connection registered for exactly this region.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn get(&self, region: &Arc<RegionInfo>) -> Option<Arc<dyn RegionConnection>> {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections
            .get(&RegionKey(Arc::clone(region)))
            .map(Arc::clone)
    }

    /// Registers `connection` for `region`, replacing any previous entry.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn put(&self, region: Arc<RegionInfo>, connection: Arc<dyn RegionConnection>) {
        self.connections
            .lock()
            .expect("registry lock poisoned")
            .insert(RegionKey(region), connection);
    }

    /// Returns the number of registered regions.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.lock().expect("registry lock poisoned").len()
    }

    /// Returns true if no region is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
