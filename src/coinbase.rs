//! Coinbase transaction construction

use crate::constants::*;
use crate::error::{MinerError, Result};
use crate::segwit::witness_commitment_script;
use crate::types::*;

/// Largest tag that still fits a single direct push
pub const MAX_COINBASE_TAG_LEN: usize = 75;

const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;

/// Builds the coinbase for one block height
///
/// The script_sig is `<height> <extra_nonce:8> [<tag>]`, the height pushed
/// minimally as BIP34 requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseBuilder {
    height: Natural,
    payout_script: ByteString,
    extra_nonce: u64,
    tag: ByteString,
}

impl CoinbaseBuilder {
    pub fn new(height: Natural, payout_script: ByteString) -> Self {
        Self {
            height,
            payout_script,
            extra_nonce: 0,
            tag: Vec::new(),
        }
    }

    pub fn with_extra_nonce(mut self, extra_nonce: u64) -> Self {
        self.extra_nonce = extra_nonce;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<ByteString>) -> Result<Self> {
        let tag = tag.into();
        if tag.len() > MAX_COINBASE_TAG_LEN {
            return Err(MinerError::Config(format!(
                "coinbase tag is {} bytes, at most {MAX_COINBASE_TAG_LEN} allowed",
                tag.len()
            )));
        }
        self.tag = tag;
        Ok(self)
    }

    pub fn height(&self) -> Natural {
        self.height
    }

    /// Coinbase script_sig
    pub fn script_sig(&self) -> ByteString {
        let mut script = encode_height(self.height);
        script.push(8);
        script.extend_from_slice(&self.extra_nonce.to_le_bytes());
        if !self.tag.is_empty() {
            script.push(self.tag.len() as u8);
            script.extend_from_slice(&self.tag);
        }
        script
    }

    /// Build: Hash × ℤ → 𝒯𝒳
    ///
    /// Outputs are `[reward → payout_script, 0 → witness commitment]`. The
    /// single input carries the witness reserved value as its only witness
    /// item.
    pub fn build(&self, witness_commitment: &Hash, reward: Integer) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TransactionInput {
                prevout: OutPoint {
                    txid: [0u8; 32],
                    index: COINBASE_PREVOUT_INDEX,
                },
                script_sig: self.script_sig(),
                sequence: SEQUENCE_FINAL,
                witness: vec![WITNESS_RESERVED_VALUE.to_vec()],
                spent_output: None,
            }],
            outputs: vec![
                TransactionOutput {
                    value: reward,
                    script_pubkey: self.payout_script.clone(),
                },
                TransactionOutput {
                    value: 0,
                    script_pubkey: witness_commitment_script(witness_commitment),
                },
            ],
            lock_time: 0,
        }
    }
}

/// Minimal script push of a block height
pub fn encode_height(height: Natural) -> ByteString {
    match height {
        0 => vec![OP_0],
        1..=16 => vec![OP_1 + (height as u8 - 1)],
        _ => {
            let mut number = height.to_le_bytes().to_vec();
            while number.last() == Some(&0) {
                number.pop();
            }
            // Keep the script number positive
            if number.last().is_some_and(|b| b & 0x80 != 0) {
                number.push(0);
            }
            let mut push = Vec::with_capacity(number.len() + 1);
            push.push(number.len() as u8);
            push.extend_from_slice(&number);
            push
        }
    }
}
