//! Basalt Routing - Region location and meta discovery.
//!
//! This crate maps a `(table, row)` pair to the region that holds the row
//! and the connection that serves it:
//!
//! - [`KeyRangeIndex`]: floor lookup over region names
//! - [`ConnectionRegistry`]: region identity to connection
//! - [`RegionResolver`]: cache lookup, falling back to an `hbase:meta` query
//! - [`MetaLocator`]: where meta itself lives
//!
//! # Design (`TigerStyle`)
//!
//! - **Short critical sections**: each map has its own lock, held for one
//!   get or put and never across an await
//! - **Tolerate races**: duplicate discoveries are harmless, last writer wins
//! - **No retries**: every failure reaches the caller

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod connection;
mod key_index;
mod meta;
mod registry;
mod resolver;

pub use connection::{ConnectionFactory, RegionConnection};
pub use key_index::KeyRangeIndex;
pub use meta::{discover_region, parse_server, MetaLocator, StaticMetaLocator};
pub use registry::ConnectionRegistry;
pub use resolver::{RegionResolver, Resolved, ResolverConfig};
