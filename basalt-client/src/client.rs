//! The client facade.
//!
//! [`Client`] owns one resolver (and with it one meta connection and one
//! set of caches) and exposes dispatch, scanning, and thin per-verb helpers.
//! Each helper builds a single call with the configured call timeout and
//! sends it; none retries.

use std::sync::Arc;

use basalt_core::{
    Call, CallContext, CallResult, ClientResult, Families, MutateResult, MutationKind,
    MutationValues, Request, RowResult,
};
use basalt_routing::{ConnectionFactory, MetaLocator, RegionResolver, Resolved};
use bytes::Bytes;

use crate::config::{ClientConfig, ConfigError};
use crate::dispatcher::Dispatcher;
use crate::scan::ScanCoordinator;

/// Row read by [`Client::check_table`].
pub const CHECK_TABLE_PROBE_ROW: &[u8] = b"theKey";

/// Client for a region-partitioned store.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    dispatcher: Dispatcher,
}

impl Client {
    /// Creates a client. No connection is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: ClientConfig,
        locator: Arc<dyn MetaLocator>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = RegionResolver::new(config.resolver_config(), locator, factory);
        Ok(Self {
            config,
            dispatcher: Dispatcher::new(Arc::new(resolver)),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the resolver.
    #[must_use]
    pub const fn resolver(&self) -> &Arc<RegionResolver> {
        self.dispatcher.resolver()
    }

    /// Returns the region holding `key` in `table` and its connection.
    ///
    /// # Errors
    ///
    /// See [`RegionResolver::resolve`].
    pub async fn resolve(&self, table: &[u8], key: &[u8]) -> ClientResult<Resolved> {
        self.resolver().resolve(table, key).await
    }

    /// Routes a call and queues it without waiting.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::enqueue`].
    pub async fn enqueue(&self, call: Arc<Call>) -> ClientResult<()> {
        self.dispatcher.enqueue(call).await
    }

    /// Routes a call and waits for its result or its context.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send_sync`].
    pub async fn send_sync(&self, call: Arc<Call>) -> CallResult {
        self.dispatcher.send_sync(call).await
    }

    /// Returns every row in `[start_row, stop_row)` across all regions.
    ///
    /// An empty `stop_row` scans to the end of the table.
    ///
    /// # Errors
    ///
    /// Returns the first failed call's error.
    pub async fn scan(
        &self,
        table: &[u8],
        families: Families,
        start_row: &[u8],
        stop_row: &[u8],
    ) -> ClientResult<Vec<RowResult>> {
        self.scanner(table, families, start_row, stop_row).run().await
    }

    /// Creates a scan that the caller drives step by step.
    #[must_use]
    pub fn scanner(
        &self,
        table: &[u8],
        families: Families,
        start_row: &[u8],
        stop_row: &[u8],
    ) -> ScanCoordinator {
        ScanCoordinator::new(
            self.dispatcher.clone(),
            &self.config,
            Bytes::copy_from_slice(table),
            families,
            Bytes::copy_from_slice(start_row),
            Bytes::copy_from_slice(stop_row),
        )
    }

    /// Reads one row.
    ///
    /// # Errors
    ///
    /// Returns the resolution, transport, or server error.
    pub async fn get(
        &self,
        table: &[u8],
        row: &[u8],
        families: Families,
    ) -> ClientResult<Option<RowResult>> {
        let request = Request::Get {
            families,
            closest_row_before: false,
        };
        self.send_sync(self.call(table, row, request)).await?.into_get()
    }

    /// Inserts or overwrites values in one row.
    ///
    /// # Errors
    ///
    /// Returns the resolution, transport, or server error.
    pub async fn put(
        &self,
        table: &[u8],
        row: &[u8],
        values: MutationValues,
    ) -> ClientResult<MutateResult> {
        self.mutate(table, row, MutationKind::Put, values).await
    }

    /// Removes values from one row.
    ///
    /// # Errors
    ///
    /// Returns the resolution, transport, or server error.
    pub async fn delete(
        &self,
        table: &[u8],
        row: &[u8],
        values: MutationValues,
    ) -> ClientResult<MutateResult> {
        self.mutate(table, row, MutationKind::Delete, values).await
    }

    /// Appends to the current values of one row.
    ///
    /// # Errors
    ///
    /// Returns the resolution, transport, or server error.
    pub async fn append(
        &self,
        table: &[u8],
        row: &[u8],
        values: MutationValues,
    ) -> ClientResult<MutateResult> {
        self.mutate(table, row, MutationKind::Append, values).await
    }

    /// Adds to the current counter values of one row.
    ///
    /// # Errors
    ///
    /// Returns the resolution, transport, or server error.
    pub async fn increment(
        &self,
        table: &[u8],
        row: &[u8],
        values: MutationValues,
    ) -> ClientResult<MutateResult> {
        self.mutate(table, row, MutationKind::Increment, values).await
    }

    /// Reads a fixed probe row to find out whether `table` exists.
    ///
    /// # Errors
    ///
    /// Returns a `TableNotFound` resolution error if it does not.
    pub async fn check_table(&self, table: &[u8]) -> ClientResult<Option<RowResult>> {
        self.get(table, CHECK_TABLE_PROBE_ROW, Families::new()).await
    }

    async fn mutate(
        &self,
        table: &[u8],
        row: &[u8],
        kind: MutationKind,
        values: MutationValues,
    ) -> ClientResult<MutateResult> {
        let request = Request::Mutate { kind, values };
        self.send_sync(self.call(table, row, request)).await?.into_mutate()
    }

    fn call(&self, table: &[u8], row: &[u8], request: Request) -> Arc<Call> {
        Arc::new(Call::new(
            Bytes::copy_from_slice(table),
            Bytes::copy_from_slice(row),
            request,
            CallContext::with_timeout(self.config.call_timeout),
        ))
    }
}
