//! Transaction pool intake
//!
//! Records arrive as JSON in the explorer layout (`vin`/`vout` with hex
//! fields and the spent output attached to every input). A record that
//! cannot be decoded or fails the structural checks is dropped and counted;
//! it never aborts the batch.

use crate::error::{MinerError, Result};
use crate::hashes::from_hex;
use crate::serialization::transaction::txid;
use crate::transaction::{check_transaction, is_coinbase};
use crate::types::*;
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;

/// One pool record as supplied by the transaction source
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub version: u32,
    pub locktime: u32,
    pub vin: Vec<InputRecord>,
    pub vout: Vec<OutputRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputRecord {
    /// Previous txid, display-order hex
    pub txid: String,
    pub vout: u32,
    pub scriptsig: String,
    pub sequence: u32,
    #[serde(default)]
    pub witness: Option<Vec<String>>,
    /// Absent only on coinbase records
    #[serde(default)]
    pub prevout: Option<PrevoutRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrevoutRecord {
    pub value: Integer,
    pub scriptpubkey_type: ScriptType,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputRecord {
    pub value: Integer,
    pub scriptpubkey: String,
}

impl TransactionRecord {
    /// Parse a single JSON record
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode hex fields into a `Transaction`
    pub fn into_transaction(self) -> Result<Transaction> {
        let inputs = self
            .vin
            .into_iter()
            .map(|input| {
                let witness = input
                    .witness
                    .unwrap_or_default()
                    .iter()
                    .map(|item| decode_script(item, "witness item"))
                    .collect::<Result<Witness>>()?;
                Ok(TransactionInput {
                    prevout: OutPoint { txid: from_hex(&input.txid)?, index: input.vout },
                    script_sig: decode_script(&input.scriptsig, "scriptsig")?,
                    sequence: input.sequence,
                    witness,
                    spent_output: input.prevout.map(|prevout| SpentOutput {
                        value: prevout.value,
                        script_type: prevout.scriptpubkey_type,
                        address: prevout.scriptpubkey_address,
                    }),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let outputs = self
            .vout
            .into_iter()
            .map(|output| {
                Ok(TransactionOutput {
                    value: output.value,
                    script_pubkey: decode_script(&output.scriptpubkey, "scriptpubkey")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Transaction {
            version: self.version,
            inputs,
            outputs,
            lock_time: self.locktime,
        })
    }
}

fn decode_script(field: &str, name: &str) -> Result<ByteString> {
    hex::decode(field).map_err(|e| MinerError::MalformedRecord(format!("{name}: {e}")))
}

/// Pool acceptance outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MempoolResult {
    Accepted(Hash),
    Rejected(String),
}

/// Per-category intake counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MempoolStats {
    pub accepted: usize,
    pub malformed_records: usize,
    pub malformed_transactions: usize,
    pub hash_decode_errors: usize,
    pub coinbase_rejected: usize,
    pub duplicates: usize,
    pub conflicts: usize,
}

impl MempoolStats {
    pub fn rejected(&self) -> usize {
        self.malformed_records
            + self.malformed_transactions
            + self.hash_decode_errors
            + self.coinbase_rejected
            + self.duplicates
            + self.conflicts
    }
}

/// Candidate pool in arrival order
///
/// Two pool transactions never spend the same outpoint: the first one seen
/// keeps it.
#[derive(Debug, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
    txids: HashSet<Hash>,
    spent: HashSet<OutPoint>,
    stats: MempoolStats,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, decode and admit one JSON record
    pub fn insert_json(&mut self, json: &str) -> MempoolResult {
        let decoded = TransactionRecord::from_json(json).and_then(TransactionRecord::into_transaction);
        match decoded {
            Ok(tx) => self.accept(tx),
            Err(e) => {
                match &e {
                    MinerError::HashDecodeError(_) => self.stats.hash_decode_errors += 1,
                    _ => self.stats.malformed_records += 1,
                }
                debug!("dropping record: {e}");
                MempoolResult::Rejected(e.to_string())
            }
        }
    }

    /// AcceptToMemoryPool: 𝒯𝒳 → {accepted, rejected}
    ///
    /// 1. Reject coinbase-shaped transactions
    /// 2. Validate transaction structure
    /// 3. Reject a txid already in the pool
    /// 4. Reject a transaction spending an outpoint another pool transaction spends
    pub fn accept(&mut self, tx: Transaction) -> MempoolResult {
        if is_coinbase(&tx) {
            self.stats.coinbase_rejected += 1;
            debug!("dropping coinbase transaction from pool input");
            return MempoolResult::Rejected("Coinbase transaction in pool".to_string());
        }

        match check_transaction(&tx) {
            Ok(ValidationResult::Valid) => {}
            Ok(ValidationResult::Invalid(reason)) => {
                self.stats.malformed_transactions += 1;
                debug!("dropping transaction: {reason}");
                return MempoolResult::Rejected(reason);
            }
            Err(e) => {
                self.stats.malformed_transactions += 1;
                debug!("dropping transaction: {e}");
                return MempoolResult::Rejected(e.to_string());
            }
        }

        let id = txid(&tx);
        if self.txids.contains(&id) {
            self.stats.duplicates += 1;
            debug!("dropping duplicate transaction {}", hex::encode(id));
            return MempoolResult::Rejected("Transaction already in mempool".to_string());
        }

        if let Some(input) = tx.inputs.iter().find(|input| self.spent.contains(&input.prevout)) {
            self.stats.conflicts += 1;
            debug!(
                "dropping {}: outpoint {}:{} already spent in pool",
                hex::encode(id),
                hex::encode(input.prevout.txid),
                input.prevout.index
            );
            return MempoolResult::Rejected("Conflicts with pool transaction".to_string());
        }

        self.spent.extend(tx.inputs.iter().map(|input| input.prevout));
        self.txids.insert(id);
        self.transactions.push(tx);
        self.stats.accepted += 1;
        MempoolResult::Accepted(id)
    }

    /// Admit one raw record; bytes that are not UTF-8 count as a malformed record
    pub fn insert_bytes(&mut self, bytes: &[u8]) -> MempoolResult {
        match std::str::from_utf8(bytes) {
            Ok(json) => self.insert_json(json),
            Err(e) => self.record_unreadable(&e.to_string()),
        }
    }

    /// Count a record whose source could not be read at all
    pub fn record_unreadable(&mut self, reason: &str) -> MempoolResult {
        self.stats.malformed_records += 1;
        debug!("dropping unreadable record: {reason}");
        MempoolResult::Rejected(format!("Unreadable record: {reason}"))
    }

    /// Admit every record, then log the intake summary
    pub fn extend_json<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for record in records {
            self.insert_json(record);
        }
        self.log_summary();
    }

    /// Byte-level counterpart of `extend_json`
    pub fn extend_bytes<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        for record in records {
            self.insert_bytes(record);
        }
        self.log_summary();
    }

    fn log_summary(&self) {
        let stats = self.stats;
        info!(
            "mempool: {} accepted, {} rejected ({} malformed records, {} malformed transactions, {} bad hashes, {} coinbase, {} duplicates, {} conflicts)",
            stats.accepted,
            stats.rejected(),
            stats.malformed_records,
            stats.malformed_transactions,
            stats.hash_decode_errors,
            stats.coinbase_rejected,
            stats.duplicates,
            stats.conflicts
        );
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn stats(&self) -> MempoolStats {
        self.stats
    }
}
