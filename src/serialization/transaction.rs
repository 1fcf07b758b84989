//! Transaction wire format and identifiers
//!
//! Legacy format:
//! - Version (4 bytes, little-endian)
//! - Input count (VarInt)
//! - For each input:
//!   - Previous txid (32 bytes, wire order)
//!   - Previous output index (4 bytes, little-endian)
//!   - Script length (VarInt) and script bytes
//!   - Sequence (4 bytes, little-endian)
//! - Output count (VarInt)
//! - For each output:
//!   - Value (8 bytes, little-endian)
//!   - Script length (VarInt) and script bytes
//! - Lock time (4 bytes, little-endian)
//!
//! The witness format inserts `0x00 0x01` after the version and one witness
//! stack per input before the lock time, but only when some input carries a
//! witness.

use super::varint::encode_varint;
use crate::hashes::{reverse, sha256d};
use crate::types::*;

/// Serialize without witness data (the txid preimage)
pub fn serialize_legacy(tx: &Transaction) -> Vec<u8> {
    let mut result = Vec::with_capacity(estimated_size(tx));
    result.extend_from_slice(&tx.version.to_le_bytes());
    write_inputs_and_outputs(&mut result, tx);
    result.extend_from_slice(&tx.lock_time.to_le_bytes());
    result
}

/// Serialize with witness data (the wtxid preimage)
///
/// Degenerates to `serialize_legacy` when no input carries a witness.
pub fn serialize_witness(tx: &Transaction) -> Vec<u8> {
    if !has_witness(tx) {
        return serialize_legacy(tx);
    }

    let mut result = Vec::with_capacity(estimated_size(tx) + witness_bytes(tx));
    result.extend_from_slice(&tx.version.to_le_bytes());
    result.push(0x00); // marker
    result.push(0x01); // flag
    write_inputs_and_outputs(&mut result, tx);

    for input in &tx.inputs {
        result.extend_from_slice(&encode_varint(input.witness.len() as u64));
        for item in &input.witness {
            result.extend_from_slice(&encode_varint(item.len() as u64));
            result.extend_from_slice(item);
        }
    }

    result.extend_from_slice(&tx.lock_time.to_le_bytes());
    result
}

/// Display-order txid: reverse(SHA256d(legacy bytes))
pub fn txid(tx: &Transaction) -> Hash {
    reverse(&sha256d(&serialize_legacy(tx)))
}

/// Display-order wtxid: reverse(SHA256d(witness bytes))
pub fn wtxid(tx: &Transaction) -> Hash {
    reverse(&sha256d(&serialize_witness(tx)))
}

/// True when any input carries a non-empty witness stack
pub fn has_witness(tx: &Transaction) -> bool {
    tx.inputs.iter().any(|input| !input.witness.is_empty())
}

fn write_inputs_and_outputs(result: &mut Vec<u8>, tx: &Transaction) {
    result.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        result.extend_from_slice(&reverse(&input.prevout.txid));
        result.extend_from_slice(&input.prevout.index.to_le_bytes());
        result.extend_from_slice(&encode_varint(input.script_sig.len() as u64));
        result.extend_from_slice(&input.script_sig);
        result.extend_from_slice(&input.sequence.to_le_bytes());
    }

    result.extend_from_slice(&encode_varint(tx.outputs.len() as u64));
    for output in &tx.outputs {
        result.extend_from_slice(&output.value.to_le_bytes());
        result.extend_from_slice(&encode_varint(output.script_pubkey.len() as u64));
        result.extend_from_slice(&output.script_pubkey);
    }
}

fn estimated_size(tx: &Transaction) -> usize {
    10 + tx.inputs.iter().map(|i| 41 + i.script_sig.len()).sum::<usize>()
        + tx.outputs.iter().map(|o| 9 + o.script_pubkey.len()).sum::<usize>()
}

fn witness_bytes(tx: &Transaction) -> usize {
    2 + tx
        .inputs
        .iter()
        .map(|i| 1 + i.witness.iter().map(|w| 1 + w.len()).sum::<usize>())
        .sum::<usize>()
}
