//! Client limits and defaults.
//!
//! Following `TigerStyle`: put limits on everything. Every wait has a
//! deadline and every batch has a bound.

/// Default deadline for a single routed call, in milliseconds (30 seconds).
pub const CALL_TIMEOUT_MS_DEFAULT: u64 = 30_000;

/// Default deadline for one `hbase:meta` lookup, in milliseconds (10 seconds).
pub const META_LOOKUP_TIMEOUT_MS_DEFAULT: u64 = 10_000;

/// Default number of rows requested per scanner fetch.
pub const SCAN_BATCH_ROWS_DEFAULT: u32 = 128;

/// Maximum number of rows requested per scanner fetch.
pub const SCAN_BATCH_ROWS_MAX: u32 = 100_000;

/// Maximum length of a `host:port` value accepted from `info:server`.
pub const SERVER_VALUE_BYTES_MAX: usize = 1024;

/// Maximum length of a `regioninfo` cell value (16 MB).
pub const REGION_INFO_BYTES_MAX: usize = 16 * 1024 * 1024;
