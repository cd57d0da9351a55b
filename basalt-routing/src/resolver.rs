//! Region resolver - routes `(table, row)` to a region and its connection.
//!
//! The resolver combines the key range index (row -> region) with the
//! connection registry (region -> connection), and falls back to reading
//! `hbase:meta` on a miss. The meta connection itself is bootstrapped once
//! through the [`MetaLocator`].
//!
//! Newly discovered regions are published registry first, then index. A
//! concurrent resolver that finds the index entry therefore also finds its
//! connection; one that runs before publication sees a miss and repeats the
//! discovery, which is harmless.

use std::sync::Arc;
use std::time::Duration;

use basalt_core::limits::META_LOOKUP_TIMEOUT_MS_DEFAULT;
use basalt_core::{
    is_cache_key_for_table, is_meta_table, region_search_key, Call, CallContext, ClientError,
    ClientResult, Families, RegionInfo, Request, ResolutionFailure, Response, INFO_FAMILY,
    META_TABLE_NAME,
};
use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionFactory, RegionConnection};
use crate::key_index::KeyRangeIndex;
use crate::meta::{discover_region, MetaLocator};
use crate::registry::ConnectionRegistry;

/// Configuration for the region resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Coordination service quorum handed to the meta locator.
    pub quorum: String,
    /// Deadline for one `hbase:meta` lookup.
    pub meta_lookup_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            quorum: String::from("localhost"),
            meta_lookup_timeout: Duration::from_millis(META_LOOKUP_TIMEOUT_MS_DEFAULT),
        }
    }
}

/// Result of a resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The region holding the row.
    pub region: Arc<RegionInfo>,
    /// The connection serving that region.
    pub connection: Arc<dyn RegionConnection>,
}

/// Resolves rows to regions and connections.
///
/// Safe to share across tasks. Holds no lock across an await.
pub struct RegionResolver {
    /// Configuration.
    config: ResolverConfig,
    /// Region name -> region.
    index: KeyRangeIndex,
    /// Region identity -> connection.
    registry: ConnectionRegistry,
    /// The well-known meta region.
    meta_region: Arc<RegionInfo>,
    /// Connection to the meta server, established on first use.
    meta_connection: OnceCell<Arc<dyn RegionConnection>>,
    /// Finds the meta server.
    locator: Arc<dyn MetaLocator>,
    /// Opens region-server connections.
    factory: Arc<dyn ConnectionFactory>,
}

impl std::fmt::Debug for RegionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionResolver")
            .field("config", &self.config)
            .field("cached_regions", &self.index.len())
            .field("cached_connections", &self.registry.len())
            .field("meta_connected", &self.meta_connection.initialized())
            .finish_non_exhaustive()
    }
}

impl RegionResolver {
    /// Creates a resolver with empty caches.
    #[must_use]
    pub fn new(
        config: ResolverConfig,
        locator: Arc<dyn MetaLocator>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            config,
            index: KeyRangeIndex::new(),
            registry: ConnectionRegistry::new(),
            meta_region: Arc::new(RegionInfo::meta()),
            meta_connection: OnceCell::new(),
            locator,
            factory,
        }
    }

    /// Returns the region holding `key` in `table` and its connection.
    ///
    /// Serves from the caches when possible; otherwise queries meta,
    /// connects to the server it names, and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns `Resolution` if meta cannot be located or queried, or does
    /// not describe a usable region, and `Connection` if the region server
    /// cannot be reached.
    pub async fn resolve(&self, table: &[u8], key: &[u8]) -> ClientResult<Resolved> {
        if is_meta_table(table) {
            let connection = self.meta_connection(table).await?;
            return Ok(Resolved {
                region: Arc::clone(&self.meta_region),
                connection,
            });
        }

        if let Some(resolved) = self.cached(table, key) {
            debug!(region = %resolved.region, "Region cache hit");
            return Ok(resolved);
        }

        debug!(
            table = %String::from_utf8_lossy(table),
            key = %String::from_utf8_lossy(key),
            "Region cache miss"
        );
        self.locate_region(table, key).await
    }

    /// Looks the row up in the caches.
    ///
    /// A match for another table, a match whose stop key does not cover the
    /// row, or a region with no registered connection is a miss.
    fn cached(&self, table: &[u8], key: &[u8]) -> Option<Resolved> {
        let (matched_key, region) = self.index.get(&region_search_key(table, key))?;
        if !is_cache_key_for_table(table, &matched_key) || !region.covers(key) {
            return None;
        }
        let connection = self.registry.get(&region)?;
        Some(Resolved { region, connection })
    }

    /// Queries meta for the region holding the row, then connects and publishes.
    async fn locate_region(&self, table: &[u8], key: &[u8]) -> ClientResult<Resolved> {
        let meta = self.meta_connection(table).await?;

        let families = Families::from([(Bytes::from_static(INFO_FAMILY), Vec::new())]);
        let call = Arc::new(Call::new(
            Bytes::from_static(META_TABLE_NAME),
            region_search_key(table, key),
            Request::Get {
                families,
                closest_row_before: true,
            },
            CallContext::with_timeout(self.config.meta_lookup_timeout),
        ));
        call.set_region(
            self.meta_region.region_name().clone(),
            self.meta_region.stop_key().clone(),
        );

        let response = meta.send(call).await.map_err(|e| {
            ClientError::resolution(table, ResolutionFailure::MetaQuery(Box::new(e)))
        })?;
        let row = match response {
            Response::Get(row) => row,
            other => {
                return Err(ClientError::resolution(
                    table,
                    ResolutionFailure::UnexpectedMetaResponse {
                        actual: other.name(),
                    },
                ))
            }
        };

        let (region, addr) =
            discover_region(row.as_ref()).map_err(|reason| ClientError::resolution(table, reason))?;
        // Closest-row-before lands on the previous table when this one has no rows.
        if region.table().as_ref() != table {
            return Err(ClientError::resolution(table, ResolutionFailure::TableNotFound));
        }

        let connection = self.factory.connect(&addr).await?;
        let region = Arc::new(region);
        self.publish(&region, &connection);

        debug!(region = %region, server = %addr, "Region discovered");
        Ok(Resolved { region, connection })
    }

    /// Makes a discovered region visible: registry first, then index.
    fn publish(&self, region: &Arc<RegionInfo>, connection: &Arc<dyn RegionConnection>) {
        self.registry.put(Arc::clone(region), Arc::clone(connection));
        self.index.put(region.region_name().clone(), Arc::clone(region));
    }

    /// Returns the meta connection, bootstrapping it on first use.
    ///
    /// Concurrent first callers share one bootstrap. A failed bootstrap
    /// leaves the cell empty so a later call tries again.
    async fn meta_connection(&self, table: &[u8]) -> ClientResult<Arc<dyn RegionConnection>> {
        self.meta_connection
            .get_or_try_init(|| self.bootstrap_meta(table))
            .await
            .map(Arc::clone)
    }

    async fn bootstrap_meta(&self, table: &[u8]) -> ClientResult<Arc<dyn RegionConnection>> {
        let addr = match self.locator.locate_meta(&self.config.quorum).await {
            Ok(addr) => addr,
            Err(e) => {
                warn!(quorum = %self.config.quorum, error = %e, "Error while locating meta");
                return Err(ClientError::resolution(
                    table,
                    ResolutionFailure::MetaLocation(Box::new(e)),
                ));
            }
        };
        info!(host = %addr.host, port = addr.port, "Meta located");

        self.factory.connect(&addr).await.inspect_err(|e| {
            warn!(server = %addr, error = %e, "Failed to connect to meta");
        })
    }

    /// Returns the meta region.
    #[must_use]
    pub const fn meta_region(&self) -> &Arc<RegionInfo> {
        &self.meta_region
    }

    /// Returns the number of regions in the index.
    #[must_use]
    pub fn cached_region_count(&self) -> usize {
        self.index.len()
    }

    /// Returns the number of regions with a registered connection.
    #[must_use]
    pub fn cached_connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }
}
