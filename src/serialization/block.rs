//! 80-byte block header wire format
//!
//! `version(4) | prev_block_hash(32) | merkle_root(32) | timestamp(4) | bits(4) | nonce(4)`,
//! integers little-endian, hashes copied as held (wire order).

use super::varint::decode_u32_le;
use crate::constants::BLOCK_HEADER_SIZE;
use crate::error::{MinerError, Result};
use crate::hashes::{reverse, sha256d};
use crate::types::*;

pub fn serialize_block_header(header: &BlockHeader) -> [u8; BLOCK_HEADER_SIZE] {
    let mut bytes = [0u8; BLOCK_HEADER_SIZE];
    bytes[0..4].copy_from_slice(&header.version.to_le_bytes());
    bytes[4..36].copy_from_slice(&header.prev_block_hash);
    bytes[36..68].copy_from_slice(&header.merkle_root);
    bytes[68..72].copy_from_slice(&header.timestamp.to_le_bytes());
    bytes[72..76].copy_from_slice(&header.bits.to_le_bytes());
    bytes[76..80].copy_from_slice(&header.nonce.to_le_bytes());
    bytes
}

pub fn deserialize_block_header(data: &[u8]) -> Result<BlockHeader> {
    if data.len() < BLOCK_HEADER_SIZE {
        return Err(MinerError::MalformedLength {
            needed: BLOCK_HEADER_SIZE,
            available: data.len(),
        });
    }

    let mut prev_block_hash = [0u8; 32];
    prev_block_hash.copy_from_slice(&data[4..36]);
    let mut merkle_root = [0u8; 32];
    merkle_root.copy_from_slice(&data[36..68]);

    Ok(BlockHeader {
        version: decode_u32_le(&data[0..4])?,
        prev_block_hash,
        merkle_root,
        timestamp: decode_u32_le(&data[68..72])?,
        bits: decode_u32_le(&data[72..76])?,
        nonce: decode_u32_le(&data[76..80])?,
    })
}

/// Display-order block hash
pub fn block_hash(header: &BlockHeader) -> Hash {
    reverse(&sha256d(&serialize_block_header(header)))
}
