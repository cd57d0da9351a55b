//! Codec for the `info:regioninfo` cell of `hbase:meta`.
//!
//! # Wire Format
//!
//! - 4 bytes: the magic `PBUF`
//! - N bytes: a protobuf `RegionInfo` message (see [`RegionInfoProto`])
//!
//! The message types are declared with `prost` derives; unknown fields are
//! skipped by the decoder.

use bytes::Bytes;
use prost::Message;
use thiserror::Error;

use crate::limits::REGION_INFO_BYTES_MAX;
use crate::region::RegionInfo;
use crate::types::RegionId;

/// Magic prefix of protobuf-serialized metadata.
const PBUF_MAGIC: &[u8] = b"PBUF";

/// Namespace whose name is omitted from table names.
const DEFAULT_NAMESPACE: &[u8] = b"default";

/// Separator between namespace and qualifier in a table name.
const NAMESPACE_SEPARATOR: u8 = b':';

/// `TableName` message.
#[derive(Clone, PartialEq, Message)]
struct TableNameProto {
    #[prost(bytes = "bytes", optional, tag = "1")]
    namespace: Option<Bytes>,
    #[prost(bytes = "bytes", optional, tag = "2")]
    qualifier: Option<Bytes>,
}

/// `RegionInfo` message.
#[derive(Clone, PartialEq, Message)]
struct RegionInfoProto {
    #[prost(uint64, optional, tag = "1")]
    region_id: Option<u64>,
    #[prost(message, optional, tag = "2")]
    table_name: Option<TableNameProto>,
    #[prost(bytes = "bytes", optional, tag = "3")]
    start_key: Option<Bytes>,
    #[prost(bytes = "bytes", optional, tag = "4")]
    end_key: Option<Bytes>,
    #[prost(bool, optional, tag = "5")]
    offline: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    split: Option<bool>,
    #[prost(uint32, optional, tag = "7")]
    replica_id: Option<u32>,
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The value does not start with `PBUF`.
    #[error("regioninfo value is missing the PBUF magic")]
    MissingMagic,

    /// The value is larger than [`REGION_INFO_BYTES_MAX`].
    #[error("regioninfo value is {len} bytes, max {max}", max = REGION_INFO_BYTES_MAX)]
    TooLarge {
        /// Length of the value.
        len: usize,
    },

    /// The message is truncated or malformed.
    #[error("malformed regioninfo: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A required field is absent.
    #[error("missing required field {field}")]
    MissingField {
        /// Field name.
        field: &'static str,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Decodes a `regioninfo` cell.
///
/// `row` is the meta row the cell was read from; when non-empty it becomes
/// the region name, since the meta row key is the region name. An empty row
/// falls back to the name derived from the decoded fields.
///
/// # Errors
///
/// Returns an error if the magic is missing, the value is oversized,
/// truncated or malformed, or the region id or table name is absent.
pub fn decode_region_info(row: &[u8], value: &[u8]) -> CodecResult<RegionInfo> {
    if value.len() > REGION_INFO_BYTES_MAX {
        return Err(CodecError::TooLarge { len: value.len() });
    }
    let buf = value
        .strip_prefix(PBUF_MAGIC)
        .ok_or(CodecError::MissingMagic)?;
    let proto = RegionInfoProto::decode(buf)?;

    let region_id = proto
        .region_id
        .ok_or(CodecError::MissingField { field: "region_id" })?;
    let table = proto
        .table_name
        .ok_or(CodecError::MissingField { field: "table_name" })
        .and_then(join_table_name)?;

    let mut region = RegionInfo::new(
        table,
        proto.start_key.unwrap_or_default(),
        proto.end_key.unwrap_or_default(),
        RegionId::new(region_id),
    )
    .with_state(proto.offline.unwrap_or(false), proto.split.unwrap_or(false))
    .with_replica_id(proto.replica_id.unwrap_or(0));
    if !row.is_empty() {
        region = region.with_region_name(Bytes::copy_from_slice(row));
    }
    Ok(region)
}

/// Encodes a region as a `regioninfo` cell value.
#[must_use]
pub fn encode_region_info(region: &RegionInfo) -> Bytes {
    let (namespace, qualifier) = split_table_name(region.table());
    let proto = RegionInfoProto {
        region_id: Some(region.region_id().get()),
        table_name: Some(TableNameProto {
            namespace: Some(Bytes::copy_from_slice(namespace)),
            qualifier: Some(Bytes::copy_from_slice(qualifier)),
        }),
        start_key: Some(region.start_key().clone()),
        end_key: Some(region.stop_key().clone()),
        offline: Some(region.is_offline()),
        split: Some(region.is_split()),
        replica_id: Some(region.replica_id()),
    };

    let mut value = Vec::with_capacity(PBUF_MAGIC.len() + proto.encoded_len());
    value.extend_from_slice(PBUF_MAGIC);
    value.extend_from_slice(&proto.encode_to_vec());
    Bytes::from(value)
}

/// Joins a `TableName` message into `namespace:qualifier` form.
fn join_table_name(name: TableNameProto) -> CodecResult<Bytes> {
    let qualifier = name.qualifier.ok_or(CodecError::MissingField {
        field: "table_name.qualifier",
    })?;
    let namespace = name.namespace.unwrap_or_default();
    if namespace.is_empty() || namespace.as_ref() == DEFAULT_NAMESPACE {
        return Ok(qualifier);
    }

    let mut table = Vec::with_capacity(namespace.len() + qualifier.len() + 1);
    table.extend_from_slice(&namespace);
    table.push(NAMESPACE_SEPARATOR);
    table.extend_from_slice(&qualifier);
    Ok(Bytes::from(table))
}

/// Splits `namespace:qualifier`; a name without a namespace is in `default`.
fn split_table_name(table: &[u8]) -> (&[u8], &[u8]) {
    table
        .iter()
        .position(|&b| b == NAMESPACE_SEPARATOR)
        .map_or((DEFAULT_NAMESPACE, table), |i| (&table[..i], &table[i + 1..]))
}
