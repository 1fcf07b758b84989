//! Segregated Witness accounting and commitments (BIP141)

use crate::constants::*;
use crate::error::Result;
use crate::hashes::{reverse, sha256d};
use crate::merkle::merkle_root;
use crate::serialization::transaction::{has_witness, wtxid};
use crate::types::*;

/// Base size under the block-accounting model
///
/// `8 + Σ_inputs(32 + 4 + 1 + |script_sig| + 4) + Σ_outputs(8 + 1 + |script_pubkey|)`.
/// Length prefixes are counted as one byte each.
pub fn calculate_base_size(tx: &Transaction) -> Natural {
    let inputs: usize = tx
        .inputs
        .iter()
        .map(|input| 32 + 4 + 1 + input.script_sig.len() + 4)
        .sum();
    let outputs: usize = tx
        .outputs
        .iter()
        .map(|output| 8 + 1 + output.script_pubkey.len())
        .sum();
    (8 + inputs + outputs) as Natural
}

/// Witness size: marker and flag plus `1 + |item|` per witness item, or zero
pub fn calculate_witness_size(tx: &Transaction) -> Natural {
    if !has_witness(tx) {
        return 0;
    }
    let items: usize = tx
        .inputs
        .iter()
        .flat_map(|input| input.witness.iter())
        .map(|item| 1 + item.len())
        .sum();
    (2 + items) as Natural
}

/// Weight(tx) = 4 × base_size + witness_size
pub fn calculate_transaction_weight(tx: &Transaction) -> Natural {
    WITNESS_SCALE_FACTOR * calculate_base_size(tx) + calculate_witness_size(tx)
}

/// vsize = ⌈weight / 4⌉
pub fn calculate_vsize(tx: &Transaction) -> Natural {
    calculate_transaction_weight(tx).div_ceil(WITNESS_SCALE_FACTOR)
}

/// Witness merkle root over `[0; 32] ++ wtxids`, display order
///
/// The coinbase slot is the all-zero placeholder.
pub fn compute_witness_merkle_root(transactions: &[Transaction]) -> Result<Hash> {
    let mut leaves = Vec::with_capacity(transactions.len() + 1);
    leaves.push([0u8; 32]);
    leaves.extend(transactions.iter().map(wtxid));
    merkle_root(&leaves)
}

/// SHA256d(witness_root || reserved value), witness root taken in wire order
pub fn compute_witness_commitment(witness_root: &Hash) -> Hash {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&reverse(witness_root));
    preimage[32..].copy_from_slice(&WITNESS_RESERVED_VALUE);
    sha256d(&preimage)
}

/// `OP_RETURN 0x24 aa21a9ed <commitment>`
pub fn witness_commitment_script(commitment: &Hash) -> ByteString {
    let mut script = Vec::with_capacity(38);
    script.push(OP_RETURN);
    script.push(WITNESS_COMMITMENT_PUSH);
    script.extend_from_slice(&WITNESS_COMMITMENT_HEADER);
    script.extend_from_slice(commitment);
    script
}

/// Extract witness commitment from an output script
pub fn extract_witness_commitment(script: &[u8]) -> Option<Hash> {
    if script.len() < 38
        || script[0] != OP_RETURN
        || script[1] != WITNESS_COMMITMENT_PUSH
        || script[2..6] != WITNESS_COMMITMENT_HEADER
    {
        return None;
    }
    let mut commitment = [0u8; 32];
    commitment.copy_from_slice(&script[6..38]);
    Some(commitment)
}

/// Validate witness commitment in coinbase transaction
///
/// The last matching output wins, as in BIP141. A coinbase without a
/// commitment is valid only when no transaction in the block has a witness.
pub fn validate_witness_commitment(
    coinbase_tx: &Transaction,
    witness_root: &Hash,
    block_has_witness: bool,
) -> bool {
    let found = coinbase_tx
        .outputs
        .iter()
        .rev()
        .find_map(|output| extract_witness_commitment(&output.script_pubkey));

    match found {
        Some(commitment) => commitment == compute_witness_commitment(witness_root),
        None => !block_has_witness,
    }
}
