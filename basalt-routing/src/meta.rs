//! Meta bootstrap and meta-row parsing.
//!
//! The location of `hbase:meta` comes from a coordination service behind
//! [`MetaLocator`]. Every other region is found by reading its row from
//! meta and turning it into a region and a server address with
//! [`discover_region`].

use async_trait::async_trait;
use basalt_core::limits::SERVER_VALUE_BYTES_MAX;
use basalt_core::{
    decode_region_info, ClientResult, RegionInfo, ResolutionFailure, RowResult, ServerAddr,
    INFO_FAMILY, REGION_INFO_QUALIFIER, SERVER_QUALIFIER,
};

// -----------------------------------------------------------------------------
// Meta Locator Trait
// -----------------------------------------------------------------------------

/// Finds the server hosting `hbase:meta`.
#[async_trait]
pub trait MetaLocator: Send + Sync {
    /// Looks up the meta server through the coordination service at `quorum`.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordination service cannot be reached or
    /// does not know where meta is.
    async fn locate_meta(&self, quorum: &str) -> ClientResult<ServerAddr>;
}

/// A locator that always answers with one configured address.
///
/// For deployments where meta never moves, and for tests.
#[derive(Debug, Clone)]
pub struct StaticMetaLocator {
    addr: ServerAddr,
}

impl StaticMetaLocator {
    /// Creates a locator that always returns `addr`.
    #[must_use]
    pub const fn new(addr: ServerAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl MetaLocator for StaticMetaLocator {
    async fn locate_meta(&self, _quorum: &str) -> ClientResult<ServerAddr> {
        Ok(self.addr.clone())
    }
}

// -----------------------------------------------------------------------------
// Meta Rows
// -----------------------------------------------------------------------------

/// Turns a meta row into the region it describes and its server.
///
/// Only `info:regioninfo` and `info:server` are read; other cells
/// (`info:splitA`, `info:splitB`, ...) are ignored.
///
/// # Errors
///
/// - `TableNotFound` if there is no row
/// - `MissingRegionInfo` / `RegionInfo` if the region cell is absent or broken
/// - `NoServer` if the server cell is absent or empty (region in transition)
/// - `MalformedServer` / `InvalidPort` if the server cell is not `host:port`
pub fn discover_region(
    row: Option<&RowResult>,
) -> Result<(RegionInfo, ServerAddr), ResolutionFailure> {
    let row = match row {
        Some(row) if !row.is_empty() => row,
        _ => return Err(ResolutionFailure::TableNotFound),
    };

    let value = row
        .value(INFO_FAMILY, REGION_INFO_QUALIFIER)
        .ok_or(ResolutionFailure::MissingRegionInfo)?;
    let row_key = row.row().map_or(&[][..], |key| key.as_ref());
    let region = decode_region_info(row_key, value)?;

    let server = match row.value(INFO_FAMILY, SERVER_QUALIFIER) {
        Some(server) if !server.is_empty() => server,
        _ => {
            return Err(ResolutionFailure::NoServer {
                region: region.to_string(),
            })
        }
    };
    let addr = parse_server(server)?;

    Ok((region, addr))
}

/// Parses an `info:server` value of the form `host:port`.
///
/// The value is split on the first colon, which must not be the first byte.
///
/// # Errors
///
/// Returns `MalformedServer` if the value is too long, not UTF-8, or has no
/// colon after a non-empty host, and `InvalidPort` if the port is not a
/// 16-bit number.
pub fn parse_server(value: &[u8]) -> Result<ServerAddr, ResolutionFailure> {
    let malformed = || ResolutionFailure::MalformedServer {
        value: String::from_utf8_lossy(value).into_owned(),
    };

    if value.len() > SERVER_VALUE_BYTES_MAX {
        return Err(malformed());
    }
    let text = std::str::from_utf8(value).map_err(|_| malformed())?;

    let (host, port) = match text.split_once(':') {
        Some((host, port)) if !host.is_empty() => (host, port),
        _ => return Err(malformed()),
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| ResolutionFailure::InvalidPort {
            value: text.to_string(),
        })?;

    Ok(ServerAddr::new(host, port))
}
