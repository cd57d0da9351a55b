//! Strongly-typed identifiers and the request/response model.
//!
//! The wire encoding of these messages belongs to the connection layer; this
//! module only fixes their shape so routing and scanning can reason about
//! them.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

use crate::error::{ClientError, ClientResult};

/// Macro to generate strongly-typed ID wrappers.
///
/// Each ID type wraps a u64 and provides:
/// - Type safety (can't mix `ScannerId` with `RegionId`)
/// - Debug/Display formatting
/// - Zero-cost abstraction (same as raw u64)
macro_rules! define_id {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new ID from a raw u64 value.
            #[inline]
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw u64 value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::new(value)
            }
        }
    };
}

define_id!(ScannerId, "scanner", "Server-assigned handle for one open region scanner.");
define_id!(RegionId, "region", "Region creation timestamp, the last component of a region name.");

/// Column selection: family name to qualifiers (empty means every qualifier).
pub type Families = BTreeMap<Bytes, Vec<Bytes>>;

/// Mutation payload: family name to qualifier to value.
pub type MutationValues = BTreeMap<Bytes, BTreeMap<Bytes, Bytes>>;

/// Address of a region server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerAddr {
    /// Host name or IP.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerAddr {
    /// Creates a new server address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Row key.
    pub row: Bytes,
    /// Column family.
    pub family: Bytes,
    /// Column qualifier.
    pub qualifier: Bytes,
    /// Cell timestamp, if the server reported one.
    pub timestamp: Option<u64>,
    /// Cell value.
    pub value: Bytes,
}

impl Cell {
    /// Creates a cell without a timestamp.
    #[must_use]
    pub fn new(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp: None,
            value: value.into(),
        }
    }
}

/// The cells returned for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowResult {
    /// Cells in server order.
    pub cells: Vec<Cell>,
}

impl RowResult {
    /// Creates a row result from cells.
    #[must_use]
    pub const fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Returns the row key, taken from the first cell.
    #[must_use]
    pub fn row(&self) -> Option<&Bytes> {
        self.cells.first().map(|cell| &cell.row)
    }

    /// Returns the value stored at `family:qualifier`, if any.
    #[must_use]
    pub fn value(&self, family: &[u8], qualifier: &[u8]) -> Option<&Bytes> {
        self.cells
            .iter()
            .find(|cell| cell.family == family && cell.qualifier == qualifier)
            .map(|cell| &cell.value)
    }

    /// Returns true if the row carries no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Kinds of single-row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Insert or overwrite values.
    Put,
    /// Remove values.
    Delete,
    /// Append to current values.
    Append,
    /// Add to current counter values.
    Increment,
}

/// A request routed to one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read one row (or, for meta lookups, the closest row at or before it).
    Get {
        /// Columns to read.
        families: Families,
        /// Return the closest row at or before the key instead of an exact match.
        closest_row_before: bool,
    },
    /// Mutate one row.
    Mutate {
        /// The mutation to apply.
        kind: MutationKind,
        /// Values to apply.
        values: MutationValues,
    },
    /// Open a scanner over `[start_row, stop_row)` within the routed region.
    OpenScanner {
        /// Columns to read.
        families: Families,
        /// First row (inclusive).
        start_row: Bytes,
        /// Upper bound (exclusive); empty means unbounded.
        stop_row: Bytes,
        /// Rows to return in the first batch.
        batch_rows: u32,
    },
    /// Fetch the next batch from an open scanner.
    ScanNext {
        /// The scanner to advance.
        scanner_id: ScannerId,
        /// Rows to return.
        batch_rows: u32,
    },
    /// Release an open scanner.
    CloseScanner {
        /// The scanner to close.
        scanner_id: ScannerId,
    },
}

impl Request {
    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Mutate { kind, .. } => match kind {
                MutationKind::Put => "put",
                MutationKind::Delete => "delete",
                MutationKind::Append => "append",
                MutationKind::Increment => "increment",
            },
            Self::OpenScanner { .. } => "open_scanner",
            Self::ScanNext { .. } => "scan_next",
            Self::CloseScanner { .. } => "close_scanner",
        }
    }
}

/// Outcome of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutateResult {
    /// Whether the server applied the mutation.
    pub processed: bool,
    /// Resulting values, for appends and increments.
    pub result: Option<RowResult>,
}

/// One batch from a region scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBatch {
    /// The scanner this batch came from.
    pub scanner_id: ScannerId,
    /// Rows in key order.
    pub rows: Vec<RowResult>,
    /// The server's continuation hint. Not used for termination.
    pub more_results: bool,
}

/// A response delivered to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Result of a get; `None` when no row matched.
    Get(Option<RowResult>),
    /// Result of a mutation.
    Mutate(MutateResult),
    /// Result of any scanner request.
    Scan(ScanBatch),
}

impl Response {
    /// Returns a short name for errors and logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Get(_) => "get",
            Self::Mutate(_) => "mutate",
            Self::Scan(_) => "scan",
        }
    }

    /// Unwraps a get response.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedResponse` for any other kind.
    pub fn into_get(self) -> ClientResult<Option<RowResult>> {
        match self {
            Self::Get(row) => Ok(row),
            other => Err(ClientError::UnexpectedResponse {
                expected: "get",
                actual: other.name(),
            }),
        }
    }

    /// Unwraps a mutate response.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedResponse` for any other kind.
    pub fn into_mutate(self) -> ClientResult<MutateResult> {
        match self {
            Self::Mutate(result) => Ok(result),
            other => Err(ClientError::UnexpectedResponse {
                expected: "mutate",
                actual: other.name(),
            }),
        }
    }

    /// Unwraps a scan response.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedResponse` for any other kind.
    pub fn into_scan(self) -> ClientResult<ScanBatch> {
        match self {
            Self::Scan(batch) => Ok(batch),
            other => Err(ClientError::UnexpectedResponse {
                expected: "scan",
                actual: other.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = ScannerId::new(7);
        assert_eq!(format!("{id}"), "scanner-7");
        assert_eq!(format!("{id:?}"), "scanner(7)");
    }

    #[test]
    fn test_server_addr_display() {
        assert_eq!(ServerAddr::new("rs1.example.com", 16020).to_string(), "rs1.example.com:16020");
    }

    #[test]
    fn test_row_result_lookup() {
        let row = RowResult::new(vec![
            Cell::new("r1", "cf", "a", "1"),
            Cell::new("r1", "cf", "b", "2"),
        ]);
        assert_eq!(row.row().map(Bytes::as_ref), Some(b"r1".as_slice()));
        assert_eq!(row.value(b"cf", b"b").map(Bytes::as_ref), Some(b"2".as_slice()));
        assert!(row.value(b"cf", b"c").is_none());
        assert!(RowResult::default().row().is_none());
    }

    #[test]
    fn test_response_shape_mismatch() {
        let err = Response::Get(None).into_scan().unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedResponse {
                expected: "scan",
                actual: "get"
            }
        ));
    }

    #[test]
    fn test_request_names() {
        let req = Request::Mutate {
            kind: MutationKind::Increment,
            values: MutationValues::new(),
        };
        assert_eq!(req.name(), "increment");
        assert_eq!(
            Request::CloseScanner {
                scanner_id: ScannerId::new(1)
            }
            .name(),
            "close_scanner"
        );
    }
}
