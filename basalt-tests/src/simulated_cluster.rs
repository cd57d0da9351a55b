//! In-memory cluster for integration tests.
//!
//! [`SimulatedCluster`] plays both the meta server and every region server.
//! Connections built by [`SimulatedConnectionFactory`] answer calls from the
//! shared cluster state and deliver results from a spawned task, so every
//! result arrives asynchronously the way a real connection's would.
//!
//! Region servers check the region stamped on each call and answer
//! `NotServingRegionException` when it does not match what they host.
//! Scanners always report `more_results = true`.
//!
//! Fault knobs:
//! - [`SimulatedCluster::set_unresponsive`]: accept calls, never answer
//! - [`SimulatedCluster::set_server_value`]: raw `info:server` override
//! - [`SimulatedCluster::fail_scans_on`]: scanner calls fail remotely
//! - [`SimulatedConnectionFactory::refuse`]: connection attempts fail

#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use basalt_client::{Client, ClientConfig, ConfigError};
use basalt_core::{
    encode_region_info, Call, CallResult, Cell, ClientError, ClientResult, Families,
    MutateResult, MutationKind, MutationValues, RegionId, RegionInfo, Request, Response,
    RowResult, ScanBatch, ScannerId, ServerAddr, INFO_FAMILY, META_REGION_NAME, META_TABLE_NAME,
    REGION_INFO_QUALIFIER, SERVER_QUALIFIER,
};
use basalt_routing::{ConnectionFactory, MetaLocator, RegionConnection};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

/// Host and port of the simulated meta server.
pub const META_SERVER: (&str, u16) = ("meta.sim", 16020);

/// Exception returned when a call reaches a server that does not host its region.
pub const NOT_SERVING_REGION: &str = "NotServingRegionException";

/// Exception returned for an unknown or closed scanner.
pub const UNKNOWN_SCANNER: &str = "UnknownScannerException";

/// Exception returned by servers whose scans are set to fail.
pub const SCAN_FAILURE: &str = "RegionTooBusyException";

/// Column family used by the fixtures.
pub const FIXTURE_FAMILY: &[u8] = b"cf";

/// Column qualifier used by the fixtures.
pub const FIXTURE_QUALIFIER: &[u8] = b"v";

/// One call as seen by a simulated server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// The server that received the call.
    pub server: ServerAddr,
    /// The request kind.
    pub request: &'static str,
    /// The region stamped on the call.
    pub region_name: Option<Bytes>,
    /// The call's row key.
    pub key: Bytes,
}

#[derive(Debug, Clone)]
struct HostedRegion {
    region: RegionInfo,
    server: ServerAddr,
}

#[derive(Debug)]
struct OpenScanner {
    rows: Vec<RowResult>,
    position: usize,
}

impl OpenScanner {
    fn next_batch(&mut self, batch_rows: u32) -> Vec<RowResult> {
        let end = self
            .rows
            .len()
            .min(self.position.saturating_add(batch_rows as usize));
        let batch = self.rows[self.position..end].to_vec();
        self.position = end;
        batch
    }
}

type Row = BTreeMap<(Bytes, Bytes), Bytes>;

#[derive(Debug, Default)]
struct ClusterState {
    /// Hosted regions by region name.
    regions: BTreeMap<Bytes, HostedRegion>,
    /// Table -> row key -> (family, qualifier) -> value.
    tables: HashMap<Bytes, BTreeMap<Bytes, Row>>,
    server_overrides: HashMap<Bytes, Bytes>,
    unresponsive: HashSet<ServerAddr>,
    failing_scans: HashSet<ServerAddr>,
    scanners: HashMap<ScannerId, OpenScanner>,
    next_scanner_id: u64,
    closed_scanners: Vec<ScannerId>,
    meta_queries: usize,
    calls: Vec<CallRecord>,
}

/// Shared state of the meta server and all region servers.
#[derive(Debug, Clone)]
pub struct SimulatedCluster {
    state: Arc<Mutex<ClusterState>>,
    meta_addr: ServerAddr,
}

impl Default for SimulatedCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCluster {
    /// Creates an empty cluster whose meta server is at [`META_SERVER`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ClusterState::default())),
            meta_addr: ServerAddr::new(META_SERVER.0, META_SERVER.1),
        }
    }

    /// Returns the meta server address.
    #[must_use]
    pub const fn meta_addr(&self) -> &ServerAddr {
        &self.meta_addr
    }

    /// Hosts `region` on `server` and lists it in meta.
    pub fn add_region(&self, region: RegionInfo, server: ServerAddr) {
        let mut state = self.state.lock().expect("lock poisoned");
        state
            .regions
            .insert(region.region_name().clone(), HostedRegion { region, server });
    }

    /// Creates a table split at `split_keys`, assigning regions round-robin
    /// over `servers`. Returns the regions in key order.
    ///
    /// # Panics
    ///
    /// Panics if `servers` is empty.
    pub fn add_table(
        &self,
        table: &[u8],
        split_keys: &[&[u8]],
        servers: &[ServerAddr],
        region_id: RegionId,
    ) -> Vec<RegionInfo> {
        assert!(!servers.is_empty(), "servers cannot be empty");

        let mut bounds: Vec<Bytes> = vec![Bytes::new()];
        bounds.extend(split_keys.iter().map(|k| Bytes::copy_from_slice(k)));
        bounds.push(Bytes::new());

        let mut regions = Vec::with_capacity(bounds.len() - 1);
        for (i, pair) in bounds.windows(2).enumerate() {
            let region = RegionInfo::new(
                Bytes::copy_from_slice(table),
                pair[0].clone(),
                pair[1].clone(),
                region_id,
            );
            self.add_region(region.clone(), servers[i % servers.len()].clone());
            regions.push(region);
        }
        regions
    }

    /// Moves a hosted region to another server.
    pub fn move_region(&self, region_name: &[u8], server: ServerAddr) {
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(hosted) = state.regions.get_mut(region_name) {
            hosted.server = server;
        }
    }

    /// Stores one cell.
    pub fn put_cell(&self, table: &[u8], row: &[u8], family: &[u8], qualifier: &[u8], value: &[u8]) {
        let mut state = self.state.lock().expect("lock poisoned");
        state
            .tables
            .entry(Bytes::copy_from_slice(table))
            .or_default()
            .entry(Bytes::copy_from_slice(row))
            .or_default()
            .insert(
                (Bytes::copy_from_slice(family), Bytes::copy_from_slice(qualifier)),
                Bytes::copy_from_slice(value),
            );
    }

    /// Stores a fixture row: `cf:v = row`.
    pub fn put_row(&self, table: &[u8], row: &[u8]) {
        self.put_cell(table, row, FIXTURE_FAMILY, FIXTURE_QUALIFIER, row);
    }

    /// Replaces the `info:server` value meta reports for a region.
    pub fn set_server_value(&self, region_name: &[u8], value: &[u8]) {
        let mut state = self.state.lock().expect("lock poisoned");
        state
            .server_overrides
            .insert(Bytes::copy_from_slice(region_name), Bytes::copy_from_slice(value));
    }

    /// Makes `server` accept calls without ever answering them.
    pub fn set_unresponsive(&self, server: &ServerAddr) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.unresponsive.insert(server.clone());
    }

    /// Makes every scanner call on `server` fail with [`SCAN_FAILURE`].
    pub fn fail_scans_on(&self, server: &ServerAddr) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.failing_scans.insert(server.clone());
    }

    /// Returns the scanners closed so far, in close order.
    #[must_use]
    pub fn closed_scanners(&self) -> Vec<ScannerId> {
        self.state.lock().expect("lock poisoned").closed_scanners.clone()
    }

    /// Returns the number of scanners currently open.
    #[must_use]
    pub fn open_scanner_count(&self) -> usize {
        self.state.lock().expect("lock poisoned").scanners.len()
    }

    /// Returns the number of closest-row-before lookups meta has answered.
    #[must_use]
    pub fn meta_query_count(&self) -> usize {
        self.state.lock().expect("lock poisoned").meta_queries
    }

    /// Returns every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().expect("lock poisoned").calls.clone()
    }

    /// Returns the calls received by `server`.
    #[must_use]
    pub fn calls_to(&self, server: &ServerAddr) -> Vec<CallRecord> {
        self.calls()
            .into_iter()
            .filter(|record| &record.server == server)
            .collect()
    }

    /// Answers a call received by `server`, or returns `None` if the server
    /// is unresponsive.
    fn handle(&self, server: &ServerAddr, call: &Call) -> Option<CallResult> {
        let mut state = self.state.lock().expect("lock poisoned");
        let region_name = call.region().map(|assignment| assignment.region_name);
        state.calls.push(CallRecord {
            server: server.clone(),
            request: call.request().name(),
            region_name: region_name.clone(),
            key: call.key().clone(),
        });

        if state.unresponsive.contains(server) {
            debug!(server = %server, request = call.request().name(), "Dropping call");
            return None;
        }

        if *server == self.meta_addr {
            return Some(state.handle_meta(call, region_name.as_deref()));
        }
        Some(state.handle_region(server, call, region_name.as_deref()))
    }
}

impl ClusterState {
    fn handle_meta(&mut self, call: &Call, region_name: Option<&[u8]>) -> CallResult {
        if call.table().as_ref() != META_TABLE_NAME || region_name != Some(META_REGION_NAME) {
            return Err(not_serving(region_name));
        }

        match call.request() {
            Request::Get {
                closest_row_before: true,
                ..
            } => {
                self.meta_queries += 1;
                let row = self
                    .regions
                    .range::<[u8], _>((Bound::Unbounded, Bound::Included(call.key().as_ref())))
                    .next_back()
                    .map(|(_, hosted)| self.meta_row(hosted));
                Ok(Response::Get(row))
            }
            Request::Get { .. } => Ok(Response::Get(
                self.regions
                    .get(call.key().as_ref())
                    .map(|hosted| self.meta_row(hosted)),
            )),
            other => Err(remote(
                "UnsupportedOperationException",
                format!("meta does not accept {}", other.name()),
            )),
        }
    }

    fn meta_row(&self, hosted: &HostedRegion) -> RowResult {
        let row = hosted.region.region_name().clone();
        let server = self
            .server_overrides
            .get(&row)
            .cloned()
            .unwrap_or_else(|| Bytes::from(hosted.server.to_string()));
        RowResult::new(vec![
            Cell::new(
                row.clone(),
                INFO_FAMILY,
                REGION_INFO_QUALIFIER,
                encode_region_info(&hosted.region),
            ),
            Cell::new(row, INFO_FAMILY, SERVER_QUALIFIER, server),
        ])
    }

    fn handle_region(
        &mut self,
        server: &ServerAddr,
        call: &Call,
        region_name: Option<&[u8]>,
    ) -> CallResult {
        let hosted = region_name
            .and_then(|name| self.regions.get(name))
            .filter(|hosted| {
                hosted.server == *server && hosted.region.table() == call.table()
            })
            .cloned()
            .ok_or_else(|| not_serving(region_name))?;
        let region = &hosted.region;

        let is_scanner_call = matches!(
            call.request(),
            Request::OpenScanner { .. } | Request::ScanNext { .. } | Request::CloseScanner { .. }
        );
        if is_scanner_call && self.failing_scans.contains(server) {
            return Err(remote(SCAN_FAILURE, format!("{region} is too busy")));
        }

        match call.request() {
            Request::Get { families, .. } => {
                if !in_region(region, call.key()) {
                    return Err(not_serving(region_name));
                }
                let row = self
                    .tables
                    .get(call.table())
                    .and_then(|rows| rows.get(call.key()))
                    .map(|cells| row_result(call.key(), cells, families))
                    .filter(|row| !row.is_empty());
                Ok(Response::Get(row))
            }
            Request::Mutate { kind, values } => {
                if !in_region(region, call.key()) {
                    return Err(not_serving(region_name));
                }
                self.mutate(call.table(), call.key(), *kind, values)
                    .map(Response::Mutate)
            }
            Request::OpenScanner {
                families,
                start_row,
                stop_row,
                batch_rows,
            } => {
                let rows = self.rows_in_range(call.table(), region, start_row, stop_row, families);
                self.next_scanner_id += 1;
                let scanner_id = ScannerId::new(self.next_scanner_id);
                let mut scanner = OpenScanner { rows, position: 0 };
                let batch = scanner.next_batch(*batch_rows);
                self.scanners.insert(scanner_id, scanner);
                Ok(scan_response(scanner_id, batch))
            }
            Request::ScanNext {
                scanner_id,
                batch_rows,
            } => {
                let scanner = self
                    .scanners
                    .get_mut(scanner_id)
                    .ok_or_else(|| remote(UNKNOWN_SCANNER, format!("{scanner_id}")))?;
                let batch = scanner.next_batch(*batch_rows);
                Ok(scan_response(*scanner_id, batch))
            }
            Request::CloseScanner { scanner_id } => {
                self.scanners
                    .remove(scanner_id)
                    .ok_or_else(|| remote(UNKNOWN_SCANNER, format!("{scanner_id}")))?;
                self.closed_scanners.push(*scanner_id);
                Ok(Response::Scan(ScanBatch {
                    scanner_id: *scanner_id,
                    rows: Vec::new(),
                    more_results: false,
                }))
            }
        }
    }

    /// Rows of `table` in `[start_row, stop_row)` clipped to `region`.
    fn rows_in_range(
        &self,
        table: &[u8],
        region: &RegionInfo,
        start_row: &[u8],
        stop_row: &[u8],
        families: &Families,
    ) -> Vec<RowResult> {
        let Some(rows) = self.tables.get(table) else {
            return Vec::new();
        };
        let start = start_row.max(region.start_key().as_ref());
        let stop = match (stop_row.is_empty(), region.stop_key().is_empty()) {
            (true, true) => None,
            (true, false) => Some(region.stop_key().as_ref()),
            (false, true) => Some(stop_row),
            (false, false) => Some(stop_row.min(region.stop_key().as_ref())),
        };
        let upper = stop.map_or(Bound::Unbounded, Bound::Excluded);
        if stop.is_some_and(|stop| stop <= start) {
            return Vec::new();
        }

        rows.range::<[u8], _>((Bound::Included(start), upper))
            .map(|(key, cells)| row_result(key, cells, families))
            .filter(|row| !row.is_empty())
            .collect()
    }

    fn mutate(
        &mut self,
        table: &[u8],
        key: &Bytes,
        kind: MutationKind,
        values: &MutationValues,
    ) -> ClientResult<MutateResult> {
        let rows = self.tables.entry(Bytes::copy_from_slice(table)).or_default();

        if kind == MutationKind::Delete {
            if values.is_empty() {
                rows.remove(key);
            } else if let Some(row) = rows.get_mut(key) {
                for (family, qualifiers) in values {
                    row.retain(|(f, q), _| {
                        f != family || !(qualifiers.is_empty() || qualifiers.contains_key(q))
                    });
                }
            }
            return Ok(MutateResult {
                processed: true,
                result: None,
            });
        }

        let row = rows.entry(key.clone()).or_default();
        let mut touched = Vec::new();
        for (family, qualifiers) in values {
            for (qualifier, value) in qualifiers {
                let column = (family.clone(), qualifier.clone());
                let new_value = match kind {
                    MutationKind::Put | MutationKind::Delete => value.clone(),
                    MutationKind::Append => {
                        let mut joined = BytesMut::new();
                        if let Some(current) = row.get(&column) {
                            joined.put_slice(current);
                        }
                        joined.put_slice(value);
                        joined.freeze()
                    }
                    MutationKind::Increment => {
                        let current = row.get(&column).map_or(Ok(0), |v| decode_counter(v))?;
                        let delta = decode_counter(value)?;
                        Bytes::copy_from_slice(&current.wrapping_add(delta).to_be_bytes())
                    }
                };
                row.insert(column, new_value.clone());
                touched.push(Cell::new(key.clone(), family.clone(), qualifier.clone(), new_value));
            }
        }

        let result = match kind {
            MutationKind::Append | MutationKind::Increment => Some(RowResult::new(touched)),
            MutationKind::Put | MutationKind::Delete => None,
        };
        Ok(MutateResult {
            processed: true,
            result,
        })
    }
}

fn in_region(region: &RegionInfo, key: &[u8]) -> bool {
    key >= region.start_key().as_ref() && region.covers(key)
}

fn row_result(key: &[u8], cells: &Row, families: &Families) -> RowResult {
    let key = Bytes::copy_from_slice(key);
    RowResult::new(
        cells
            .iter()
            .filter(|((family, qualifier), _)| {
                families.is_empty()
                    || families
                        .get(family)
                        .is_some_and(|qs| qs.is_empty() || qs.contains(qualifier))
            })
            .map(|((family, qualifier), value)| {
                Cell::new(key.clone(), family.clone(), qualifier.clone(), value.clone())
            })
            .collect(),
    )
}

fn scan_response(scanner_id: ScannerId, rows: Vec<RowResult>) -> Response {
    Response::Scan(ScanBatch {
        scanner_id,
        rows,
        more_results: true,
    })
}

fn decode_counter(value: &[u8]) -> ClientResult<i64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| {
        remote(
            "DoNotRetryIOException",
            format!("counter value has {} bytes, expected 8", value.len()),
        )
    })?;
    Ok(i64::from_be_bytes(bytes))
}

fn not_serving(region_name: Option<&[u8]>) -> ClientError {
    let name = region_name.map_or_else(
        || String::from("<unassigned>"),
        |name| String::from_utf8_lossy(name).into_owned(),
    );
    remote(NOT_SERVING_REGION, format!("region {name} is not online"))
}

fn remote(exception: &str, message: String) -> ClientError {
    ClientError::Remote {
        exception: exception.to_string(),
        message,
    }
}

// -----------------------------------------------------------------------------
// Connections
// -----------------------------------------------------------------------------

/// A connection to one simulated server.
#[derive(Debug)]
pub struct SimulatedConnection {
    addr: ServerAddr,
    cluster: SimulatedCluster,
    latency: Duration,
}

#[async_trait]
impl RegionConnection for SimulatedConnection {
    fn addr(&self) -> &ServerAddr {
        &self.addr
    }

    async fn enqueue(&self, call: Arc<Call>) -> ClientResult<()> {
        let Some(result) = self.cluster.handle(&self.addr, &call) else {
            return Ok(());
        };
        let latency = self.latency;
        tokio::spawn(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            call.complete(result);
        });
        Ok(())
    }
}

/// Builds [`SimulatedConnection`]s and counts how many it built.
#[derive(Debug)]
pub struct SimulatedConnectionFactory {
    cluster: SimulatedCluster,
    connect_delay: Duration,
    latency: Duration,
    refused: Mutex<HashSet<ServerAddr>>,
    connects: AtomicUsize,
}

impl SimulatedConnectionFactory {
    /// Creates a factory for `cluster` with no delays.
    #[must_use]
    pub fn new(cluster: SimulatedCluster) -> Self {
        Self {
            cluster,
            connect_delay: Duration::ZERO,
            latency: Duration::ZERO,
            refused: Mutex::new(HashSet::new()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Sleeps this long in every `connect`, widening race windows.
    #[must_use]
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Delays every result by this long.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes connection attempts to `addr` fail.
    pub fn refuse(&self, addr: &ServerAddr) {
        self.refused.lock().expect("lock poisoned").insert(addr.clone());
    }

    /// Returns the number of `connect` calls, successful or not.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for SimulatedConnectionFactory {
    async fn connect(&self, addr: &ServerAddr) -> ClientResult<Arc<dyn RegionConnection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.refused.lock().expect("lock poisoned").contains(addr) {
            return Err(ClientError::connection(addr, "connection refused"));
        }
        Ok(Arc::new(SimulatedConnection {
            addr: addr.clone(),
            cluster: self.cluster.clone(),
            latency: self.latency,
        }))
    }
}

/// Meta locator that answers with a fixed address and counts lookups.
#[derive(Debug)]
pub struct SimulatedMetaLocator {
    addr: Option<ServerAddr>,
    lookups: AtomicUsize,
}

impl SimulatedMetaLocator {
    /// Creates a locator that reports meta at `addr`.
    #[must_use]
    pub const fn new(addr: ServerAddr) -> Self {
        Self {
            addr: Some(addr),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Creates a locator that cannot find meta.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            addr: None,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Returns the number of lookups made.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetaLocator for SimulatedMetaLocator {
    async fn locate_meta(&self, quorum: &str) -> ClientResult<ServerAddr> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.addr
            .clone()
            .ok_or_else(|| ClientError::connection(quorum, "no meta location registered"))
    }
}

// -----------------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------------

/// A client wired to a simulated cluster.
#[derive(Debug)]
pub struct TestHarness {
    /// The cluster.
    pub cluster: SimulatedCluster,
    /// The factory the client connects through.
    pub factory: Arc<SimulatedConnectionFactory>,
    /// The locator the client bootstraps meta through.
    pub locator: Arc<SimulatedMetaLocator>,
    /// The client under test.
    pub client: Client,
}

impl TestHarness {
    /// Wires a client with [`ClientConfig::fast_for_testing`] to `cluster`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(cluster: SimulatedCluster) -> Result<Self, ConfigError> {
        let factory = SimulatedConnectionFactory::new(cluster.clone());
        Self::with_parts(cluster, ClientConfig::fast_for_testing(), factory)
    }

    /// Wires a client with the given configuration and factory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_parts(
        cluster: SimulatedCluster,
        config: ClientConfig,
        factory: SimulatedConnectionFactory,
    ) -> Result<Self, ConfigError> {
        let factory = Arc::new(factory);
        let locator = Arc::new(SimulatedMetaLocator::new(cluster.meta_addr().clone()));
        let client = Client::new(
            config,
            Arc::clone(&locator) as Arc<dyn MetaLocator>,
            Arc::clone(&factory) as Arc<dyn ConnectionFactory>,
        )?;
        Ok(Self {
            cluster,
            factory,
            locator,
            client,
        })
    }
}

/// Region server addresses used by the fixtures.
#[must_use]
pub fn fixture_servers() -> Vec<ServerAddr> {
    (1..=3)
        .map(|i| ServerAddr::new(format!("rs{i}.sim"), 16020))
        .collect()
}

/// Row keys stored by [`users_cluster`], in key order.
pub const USERS_ROWS: &[&str] = &[
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
    "mallory", "niaj", "olivia", "peggy", "rupert", "sybil", "trent", "victor", "walter",
];

/// A cluster with table `users` split at `d` and `m` over three servers,
/// holding [`USERS_ROWS`].
#[must_use]
pub fn users_cluster() -> SimulatedCluster {
    let cluster = SimulatedCluster::new();
    cluster.add_table(b"users", &[b"d".as_slice(), b"m".as_slice()], &fixture_servers(), RegionId::new(1));
    for row in USERS_ROWS {
        cluster.put_row(b"users", row.as_bytes());
    }
    cluster
}
