//! Block template assembly and the result sink format

use crate::coinbase::CoinbaseBuilder;
use crate::economic::block_reward;
use crate::error::Result;
use crate::hashes::reverse;
use crate::merkle::merkle_root;
use crate::segwit::{compute_witness_commitment, validate_witness_commitment};
use crate::selection::SelectedSet;
use crate::serialization::block::serialize_block_header;
use crate::serialization::transaction::{has_witness, serialize_witness, txid};
use crate::transaction::is_coinbase;
use crate::types::*;
use log::info;
use std::fmt;

/// Header fields supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderParams {
    pub version: u32,
    /// Display order
    pub prev_block_hash: Hash,
    pub timestamp: u32,
    pub bits: u32,
}

/// An assembled, not yet mined, block
///
/// Interface for the miner:
/// 1. Header with nonce 0 and the final merkle root
/// 2. Coinbase paying subsidy plus fees and committing to the witnesses
/// 3. Selected transactions in block order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    pub header: BlockHeader,
    pub coinbase: Transaction,
    pub transactions: Vec<Transaction>,
    /// Display order, coinbase excluded
    pub txids: Vec<Hash>,
    /// Display order
    pub coinbase_txid: Hash,
    /// Display order
    pub witness_root: Hash,
    pub witness_commitment: Hash,
    pub height: Natural,
    pub total_fee: Integer,
    pub total_weight: Natural,
}

impl BlockTemplate {
    /// Every txid in block order, coinbase first
    pub fn block_txids(&self) -> Vec<Hash> {
        std::iter::once(self.coinbase_txid)
            .chain(self.txids.iter().copied())
            .collect()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len() + 1
    }

    /// Sink output for this block under a solved `header`
    pub fn to_output(&self, header: &BlockHeader) -> BlockOutput {
        BlockOutput {
            header_hex: hex::encode(serialize_block_header(header)),
            coinbase_hex: hex::encode(serialize_witness(&self.coinbase)),
            txids: self.txids.iter().map(hex::encode).collect(),
        }
    }
}

/// AssembleBlock: SelectedSet × CoinbaseBuilder × HeaderParams → BlockTemplate
///
/// 1. Witness root over `[0; 32] ++ wtxids` in selection order
/// 2. Commitment = SHA256d(witness_root || reserved value)
/// 3. Coinbase paying subsidy(height) + total_fee
/// 4. Merkle root over `[coinbase_txid] ++ txids`
/// 5. Header with nonce 0
pub fn assemble_block(
    selected: SelectedSet,
    coinbase_builder: &CoinbaseBuilder,
    params: &HeaderParams,
) -> Result<BlockTemplate> {
    let mut witness_leaves = Vec::with_capacity(selected.len() + 1);
    witness_leaves.push([0u8; 32]);
    witness_leaves.extend(selected.entries.iter().map(|entry| entry.wtxid));
    let witness_root = merkle_root(&witness_leaves)?;
    let witness_commitment = compute_witness_commitment(&witness_root);

    let height = coinbase_builder.height();
    let reward = block_reward(height, selected.total_fee)?;
    let coinbase = coinbase_builder.build(&witness_commitment, reward);
    let coinbase_txid = txid(&coinbase);

    let txids = selected.txids();
    let mut leaves = Vec::with_capacity(txids.len() + 1);
    leaves.push(coinbase_txid);
    leaves.extend_from_slice(&txids);
    let root = merkle_root(&leaves)?;

    let header = BlockHeader {
        version: params.version,
        prev_block_hash: reverse(&params.prev_block_hash),
        merkle_root: reverse(&root),
        timestamp: params.timestamp,
        bits: params.bits,
        nonce: 0,
    };

    info!(
        "assembled block at height {}: {} transactions, weight {}, fees {} sat, reward {} sat, merkle root {}",
        height,
        txids.len() + 1,
        selected.total_weight,
        selected.total_fee,
        reward,
        hex::encode(root)
    );

    Ok(BlockTemplate {
        header,
        coinbase,
        transactions: selected.entries.into_iter().map(|entry| entry.tx).collect(),
        txids,
        coinbase_txid,
        witness_root,
        witness_commitment,
        height,
        total_fee: selected.total_fee,
        total_weight: selected.total_weight,
    })
}

/// Re-derive a template's commitments from its transactions
///
/// Checks coinbase position, the header merkle root and the witness
/// commitment.
pub fn check_block_template(template: &BlockTemplate) -> Result<ValidationResult> {
    if !is_coinbase(&template.coinbase) {
        return Ok(ValidationResult::Invalid("First transaction is not a coinbase".to_string()));
    }
    if let Some(i) = template.transactions.iter().position(is_coinbase) {
        return Ok(ValidationResult::Invalid(format!("Coinbase at position {}", i + 1)));
    }

    let txids: Vec<Hash> = std::iter::once(&template.coinbase)
        .chain(template.transactions.iter())
        .map(txid)
        .collect();
    if txids != template.block_txids() {
        return Ok(ValidationResult::Invalid(
            "Template txids do not match its transactions".to_string(),
        ));
    }
    if reverse(&merkle_root(&txids)?) != template.header.merkle_root {
        return Ok(ValidationResult::Invalid("Merkle root mismatch".to_string()));
    }

    let witness_root = crate::segwit::compute_witness_merkle_root(&template.transactions)?;
    let block_has_witness = template.transactions.iter().any(has_witness);
    if !validate_witness_commitment(&template.coinbase, &witness_root, block_has_witness) {
        return Ok(ValidationResult::Invalid("Witness commitment mismatch".to_string()));
    }

    Ok(ValidationResult::Valid)
}

/// What the result sink receives for one mined block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutput {
    /// 160 hex characters
    pub header_hex: String,
    /// Witness serialization of the coinbase
    pub coinbase_hex: String,
    /// Display order, coinbase excluded
    pub txids: Vec<String>,
}

impl fmt::Display for BlockOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header_hex)?;
        writeln!(f, "{}", self.coinbase_hex)?;
        for txid in &self.txids {
            writeln!(f, "{txid}")?;
        }
        Ok(())
    }
}
