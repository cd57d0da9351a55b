//! Error types for Basalt client operations.
//!
//! Following `TigerStyle`: all errors must be handled explicitly.
//! Nothing in the routing path retries, swallows, or logs-and-continues;
//! every failure reaches the caller as one of these values.

use thiserror::Error;

use crate::codec::CodecError;

/// The result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by resolution, dispatch, and scanning.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call's deadline or cancellation fired before a result arrived.
    ///
    /// The outcome of the underlying operation is unknown.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// No region could be determined for the requested row.
    #[error("failed to locate region for table {table}: {reason}")]
    Resolution {
        /// The table being resolved (lossy UTF-8).
        table: String,
        /// Why resolution failed.
        reason: ResolutionFailure,
    },

    /// Establishing a connection to a region server failed.
    #[error("failed to connect to region server {addr}: {message}")]
    Connection {
        /// The `host:port` we tried to reach.
        addr: String,
        /// Error message.
        message: String,
    },

    /// The connection went away without delivering a result.
    #[error("result channel closed before a result was delivered")]
    ResultChannelClosed,

    /// The remote call returned an application-level error.
    #[error("remote call failed: {exception}: {message}")]
    Remote {
        /// Remote exception class name.
        exception: String,
        /// Remote error message.
        message: String,
    },

    /// The server answered with a response of the wrong shape.
    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        /// The response kind the request calls for.
        expected: &'static str,
        /// The response kind that arrived.
        actual: &'static str,
    },

    /// A call was used in a way its lifecycle does not allow.
    #[error("invalid call: {reason}")]
    InvalidCall {
        /// What was wrong.
        reason: &'static str,
    },
}

/// Reasons a region lookup can fail.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    /// The coordination service could not tell us where meta lives.
    #[error("meta location lookup failed: {0}")]
    MetaLocation(#[source] Box<ClientError>),

    /// The `hbase:meta` query itself failed.
    #[error("meta query failed: {0}")]
    MetaQuery(#[source] Box<ClientError>),

    /// Meta has no row for the table.
    #[error("table not found")]
    TableNotFound,

    /// The meta row has no `info:regioninfo` cell.
    #[error("broken meta: no info:regioninfo column")]
    MissingRegionInfo,

    /// The `info:regioninfo` cell could not be decoded.
    #[error("broken meta: {0}")]
    RegionInfo(#[from] CodecError),

    /// The region has no server assigned (it is being reassigned).
    #[error("region {region} has no server assigned")]
    NoServer {
        /// Region name (lossy UTF-8).
        region: String,
    },

    /// The `info:server` value is not `host:port`.
    #[error("broken meta: no colon found in info:server {value:?}")]
    MalformedServer {
        /// The offending value (lossy UTF-8).
        value: String,
    },

    /// The port in `info:server` is not a valid 16-bit number.
    #[error("broken meta: invalid port in info:server {value:?}")]
    InvalidPort {
        /// The offending value (lossy UTF-8).
        value: String,
    },

    /// The meta connection answered a lookup with something other than a get.
    #[error("meta lookup returned a {actual} response")]
    UnexpectedMetaResponse {
        /// The response kind that arrived.
        actual: &'static str,
    },
}

/// Coarse error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The deadline fired first.
    DeadlineExceeded,
    /// No region could be determined.
    ResolutionFailure,
    /// A connection could not be built or went away.
    ConnectionFailure,
    /// The remote call returned an error.
    RemoteFailure,
    /// A response or call violated the protocol.
    ProtocolFailure,
}

impl ClientError {
    /// Builds a resolution error for a table.
    #[must_use]
    pub fn resolution(table: &[u8], reason: ResolutionFailure) -> Self {
        Self::Resolution {
            table: String::from_utf8_lossy(table).into_owned(),
            reason,
        }
    }

    /// Builds a connection error for an address.
    #[must_use]
    pub fn connection(addr: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Connection {
            addr: addr.to_string(),
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::Resolution { .. } => ErrorKind::ResolutionFailure,
            Self::Connection { .. } | Self::ResultChannelClosed => ErrorKind::ConnectionFailure,
            Self::Remote { .. } => ErrorKind::RemoteFailure,
            Self::UnexpectedResponse { .. } | Self::InvalidCall { .. } => {
                ErrorKind::ProtocolFailure
            }
        }
    }

    /// Returns true if this is the deadline sentinel.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }

    /// Returns the resolution failure, if this is one.
    #[must_use]
    pub const fn resolution_failure(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Resolution { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
