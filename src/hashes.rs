//! Double-SHA256 and byte-order helpers shared by every id boundary

use crate::error::{MinerError, Result};
use crate::types::Hash;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};

/// SHA256(SHA256(data)), in the order the hash function emits it
pub fn sha256d(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// Flip between display order and wire order
pub fn reverse(hash: &Hash) -> Hash {
    let mut out = *hash;
    out.reverse();
    out
}

/// Hex-encode a hash exactly as held
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Decode a 64-character hex string into a hash, without reordering
pub fn from_hex(s: &str) -> Result<Hash> {
    let bytes = hex::decode(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        MinerError::HashDecodeError(format!("expected 32 bytes, got {len}"))
    })
}
