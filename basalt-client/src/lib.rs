//! Basalt Client - Dispatch, scanning, and the client facade.
//!
//! This crate turns resolved regions into completed calls:
//!
//! - [`Dispatcher`]: stamps a call with its region and hands it to the
//!   connection, optionally waiting for the result under the call's deadline
//! - [`ScanCoordinator`]: pages a scan across every region it spans
//! - [`Client`]: the public entry point, with per-verb helpers
//!
//! # Example
//!
//! ```ignore
//! let client = Client::new(ClientConfig::new("zk1,zk2,zk3"), locator, factory)?;
//! let row = client.get(b"users", b"alice", Families::new()).await?;
//! let rows = client.scan(b"users", Families::new(), b"a", b"m").await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod dispatcher;
mod scan;

pub use client::{Client, CHECK_TABLE_PROBE_ROW};
pub use config::{ClientConfig, ConfigError};
pub use dispatcher::Dispatcher;
pub use scan::{ScanCoordinator, ScanCursor, ScanState};
