//! Bitcoin VarInt (CompactSize) and fixed-width little-endian integers
//!
//! Encoding rules:
//! - If value < 0xfd: single byte
//! - If value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - If value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - Otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! Every length prefix in a transaction goes through here; a size mismatch
//! corrupts every downstream hash.

use crate::error::{MinerError, Result};

/// Encode a u64 value as a Bitcoin VarInt
///
/// # Examples
///
/// ```
/// use mempool_miner::serialization::varint::encode_varint;
///
/// assert_eq!(encode_varint(252), vec![252]);
/// assert_eq!(encode_varint(253), vec![0xfd, 253, 0]);
/// assert_eq!(encode_varint(65536), vec![0xfe, 0, 0, 1, 0]);
/// ```
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

/// Number of bytes `encode_varint(value)` produces
pub fn varint_size(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffffffff => 5,
        _ => 9,
    }
}

/// Decode a Bitcoin VarInt from the start of `data`
///
/// Returns the value and the number of bytes consumed. Fails with
/// `MalformedLength` when `data` is shorter than the declared width, and
/// with `Serialization` for a non-minimal encoding.
///
/// ```
/// use mempool_miner::serialization::varint::decode_varint;
///
/// assert_eq!(decode_varint(&[0xfd, 253, 0]).unwrap(), (253, 3));
/// assert!(decode_varint(&[0xfe, 1]).is_err());
/// ```
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data.first().ok_or(MinerError::MalformedLength {
        needed: 1,
        available: 0,
    })?;

    let (width, min) = match first {
        b if b < 0xfd => return Ok((b as u64, 1)),
        0xfd => (2, 0xfd),
        0xfe => (4, 0x1_0000),
        _ => (8, 0x1_0000_0000),
    };

    let payload = take(&data[1..], width)?;
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(payload);
    let value = u64::from_le_bytes(buf);

    if value < min {
        return Err(MinerError::Serialization(format!(
            "non-canonical varint: {value} encoded in {} bytes",
            width + 1
        )));
    }

    Ok((value, width + 1))
}

/// Little-endian u32 from the first 4 bytes of `data`
pub fn decode_u32_le(data: &[u8]) -> Result<u32> {
    let bytes = take(data, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Little-endian i64 from the first 8 bytes of `data`
pub fn decode_i64_le(data: &[u8]) -> Result<i64> {
    let bytes = take(data, 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(i64::from_le_bytes(buf))
}

fn take(data: &[u8], needed: usize) -> Result<&[u8]> {
    data.get(..needed).ok_or(MinerError::MalformedLength {
        needed,
        available: data.len(),
    })
}
