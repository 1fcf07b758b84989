//! Core types for block assembly
//!
//! Byte-order convention: transaction ids (`OutPoint::txid`, `txid()`,
//! `wtxid()`, merkle roots) are held in display order, the byte-reversed
//! form printed by explorers. `BlockHeader` hashes are held in wire order,
//! exactly as they appear in the 80 serialized header bytes.

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type (satoshi amounts)
pub type Integer = i64;

/// Witness stack of one input
pub type Witness = Vec<ByteString>;

/// Script templates accepted in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    #[serde(rename = "p2pkh")]
    P2pkh,
    #[serde(rename = "p2sh")]
    P2sh,
    #[serde(rename = "v0_p2wpkh", alias = "p2wpkh")]
    P2wpkh,
    #[serde(rename = "v0_p2wsh", alias = "p2wsh")]
    P2wsh,
    #[serde(rename = "v1_p2tr", alias = "p2tr")]
    P2tr,
}

/// Reference to a previous transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Previous txid in display order
    pub txid: Hash,
    pub index: u32,
}

/// The output being spent, as supplied by the transaction source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentOutput {
    pub value: Integer,
    pub script_type: ScriptType,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
    /// Empty when the input carries no witness
    pub witness: Witness,
    /// `None` only for the synthetic coinbase input
    pub spent_output: Option<SpentOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Integer,
    pub script_pubkey: ByteString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

/// Block header; hashes in wire order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}
