//! Multi-region scan pagination.
//!
//! A scan walks the regions covering `[start_row, stop_row)` in key order.
//! In each region it opens a scanner, pages until the server returns an
//! empty batch, closes the scanner, and moves on to the region starting at
//! this region's stop key.
//!
//! The server's `more_results` flag is not trusted; an empty batch is the
//! only end-of-region signal.

use std::sync::Arc;
use std::time::Duration;

use basalt_core::{
    Call, CallContext, ClientError, ClientResult, Families, Request, RowResult, ScanBatch,
    ScannerId,
};
use bytes::Bytes;
use tracing::debug;

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;

/// An open scanner within one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor {
    /// The server-side scanner.
    pub scanner_id: ScannerId,
    /// Row key of the open call; follow-up calls use it to reach the same region.
    pub row_key: Bytes,
    /// Stop key of the region the scanner is open in; empty for the last region.
    pub region_stop: Bytes,
}

/// Where a scan is in its walk over regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// About to open a scanner in the region holding `start_row`.
    OpeningRegion {
        /// First row to scan in the next region.
        start_row: Bytes,
    },
    /// Fetching batches from an open scanner.
    Paging(ScanCursor),
    /// The region is exhausted; its scanner must be closed.
    ClosingRegion(ScanCursor),
    /// Every region has been scanned.
    Done,
}

/// Drives one scan through its states.
///
/// Calls are issued strictly one at a time. Any failed call aborts the
/// scan and leaves it `Done`.
#[derive(Debug)]
pub struct ScanCoordinator {
    dispatcher: Dispatcher,
    table: Bytes,
    families: Families,
    stop_row: Bytes,
    call_timeout: Duration,
    batch_rows: u32,
    state: ScanState,
    rows: Vec<RowResult>,
}

impl ScanCoordinator {
    /// Creates a scan of `[start_row, stop_row)`; an empty `stop_row` scans
    /// to the end of the table.
    #[must_use]
    pub fn new(
        dispatcher: Dispatcher,
        config: &ClientConfig,
        table: impl Into<Bytes>,
        families: Families,
        start_row: impl Into<Bytes>,
        stop_row: impl Into<Bytes>,
    ) -> Self {
        Self {
            dispatcher,
            table: table.into(),
            families,
            stop_row: stop_row.into(),
            call_timeout: config.call_timeout,
            batch_rows: config.scan_batch_rows,
            state: ScanState::OpeningRegion {
                start_row: start_row.into(),
            },
            rows: Vec::new(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    /// Returns the rows collected so far, in fetch order.
    #[must_use]
    pub fn rows(&self) -> &[RowResult] {
        &self.rows
    }

    /// Runs the scan to completion and returns every row.
    ///
    /// # Errors
    ///
    /// Returns the first failed call's error.
    pub async fn run(mut self) -> ClientResult<Vec<RowResult>> {
        while self.state != ScanState::Done {
            self.step().await?;
        }
        Ok(self.rows)
    }

    /// Performs one transition.
    ///
    /// # Errors
    ///
    /// Returns the failed call's error; the scan is then `Done`.
    pub async fn step(&mut self) -> ClientResult<()> {
        let state = std::mem::replace(&mut self.state, ScanState::Done);
        self.state = match state {
            ScanState::OpeningRegion { start_row } => self.open_region(start_row).await?,
            ScanState::Paging(cursor) => self.next_batch(cursor).await?,
            ScanState::ClosingRegion(cursor) => self.close_region(cursor).await?,
            ScanState::Done => ScanState::Done,
        };
        Ok(())
    }

    async fn open_region(&mut self, start_row: Bytes) -> ClientResult<ScanState> {
        let request = Request::OpenScanner {
            families: self.families.clone(),
            start_row: start_row.clone(),
            stop_row: self.stop_row.clone(),
            batch_rows: self.batch_rows,
        };
        let call = self.call(start_row, request);
        let batch = self.send(&call).await?;

        let region_stop = call.region_stop_key().ok_or(ClientError::InvalidCall {
            reason: "scanner opened without a region assignment",
        })?;
        let cursor = ScanCursor {
            scanner_id: batch.scanner_id,
            row_key: call.key().clone(),
            region_stop,
        };
        debug!(
            scanner = %cursor.scanner_id,
            rows = batch.rows.len(),
            "Scanner opened"
        );

        if batch.rows.is_empty() {
            return Ok(ScanState::ClosingRegion(cursor));
        }
        self.rows.extend(batch.rows);
        Ok(ScanState::Paging(cursor))
    }

    async fn next_batch(&mut self, cursor: ScanCursor) -> ClientResult<ScanState> {
        let request = Request::ScanNext {
            scanner_id: cursor.scanner_id,
            batch_rows: self.batch_rows,
        };
        let call = self.call(cursor.row_key.clone(), request);
        let batch = self.send(&call).await?;

        if batch.rows.is_empty() {
            return Ok(ScanState::ClosingRegion(cursor));
        }
        self.rows.extend(batch.rows);
        Ok(ScanState::Paging(cursor))
    }

    async fn close_region(&mut self, cursor: ScanCursor) -> ClientResult<ScanState> {
        let request = Request::CloseScanner {
            scanner_id: cursor.scanner_id,
        };
        let call = self.call(cursor.row_key, request);
        self.dispatcher.send_sync(call).await?;
        debug!(scanner = %cursor.scanner_id, "Scanner closed");

        let region_stop = cursor.region_stop;
        if region_stop.is_empty() || (!self.stop_row.is_empty() && self.stop_row <= region_stop) {
            return Ok(ScanState::Done);
        }
        Ok(ScanState::OpeningRegion {
            start_row: region_stop,
        })
    }

    fn call(&self, row_key: Bytes, request: Request) -> Arc<Call> {
        Arc::new(Call::new(
            self.table.clone(),
            row_key,
            request,
            CallContext::with_timeout(self.call_timeout),
        ))
    }

    async fn send(&self, call: &Arc<Call>) -> ClientResult<ScanBatch> {
        self.dispatcher.send_sync(Arc::clone(call)).await?.into_scan()
    }
}
