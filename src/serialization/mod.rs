//! Bitcoin wire format serialization
//!
//! All integers are little-endian. Hash byte order is documented in
//! `crate::types`.

pub mod block;
pub mod transaction;
pub mod varint;

pub use block::{block_hash, deserialize_block_header, serialize_block_header};
pub use transaction::{has_witness, serialize_legacy, serialize_witness, txid, wtxid};
pub use varint::{decode_i64_le, decode_u32_le, decode_varint, encode_varint, varint_size};
