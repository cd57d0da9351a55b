//! Basalt Core - Region metadata, call model, and error types.
//!
//! This crate holds the pieces every other Basalt crate agrees on:
//!
//! - [`RegionInfo`] and the byte-level key helpers used to look regions up
//!   in the `hbase:meta` ordering
//! - The `info:regioninfo` cell codec
//! - [`Call`]: a request in flight, with its deadline, its region
//!   assignment, and its single-slot result channel
//! - The client error taxonomy
//!
//! # Design Principles (`TigerStyle`)
//!
//! - **Immutable metadata**: regions are replaced, never mutated
//! - **Explicit limits**: every default lives in [`limits`]
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod call;
mod codec;
mod error;
pub mod limits;
mod region;
mod types;

pub use call::{Call, CallContext, CallResult, RegionAssignment, ResultReceiver};
pub use codec::{decode_region_info, encode_region_info, CodecError, CodecResult};
pub use error::{ClientError, ClientResult, ErrorKind, ResolutionFailure};
pub use region::{
    is_cache_key_for_table, is_meta_table, region_search_key, RegionInfo, INFO_FAMILY,
    META_REGION_NAME, META_TABLE_NAME, REGION_INFO_QUALIFIER, SERVER_QUALIFIER,
};
pub use types::{
    Cell, Families, MutateResult, MutationKind, MutationValues, RegionId, Request, Response,
    RowResult, ScanBatch, ScannerId, ServerAddr,
};
