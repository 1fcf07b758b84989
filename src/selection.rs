//! Weight-bounded transaction selection
//!
//! Candidates are weighed once, ordered by the selection policy, then
//! accepted greedily until the first one that would push the running weight
//! over the budget. Nothing after that candidate is tried.

use crate::constants::MAX_MONEY;
use crate::economic::calculate_fee;
use crate::error::Result;
use crate::segwit::calculate_transaction_weight;
use crate::serialization::transaction::{txid, wtxid};
use crate::types::*;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Candidate ordering before the greedy fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Lightest first; ties keep pool order
    #[default]
    AscendingWeight,
    /// Highest fee per vbyte first; ties keep pool order
    FeeRate,
}

/// A candidate with its derived fields computed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTransaction {
    pub tx: Transaction,
    pub weight: Natural,
    pub fee: Integer,
    /// Display order
    pub txid: Hash,
    /// Display order
    pub wtxid: Hash,
}

impl SelectedTransaction {
    pub fn new(tx: Transaction) -> Result<Self> {
        let fee = calculate_fee(&tx)?;
        Ok(Self {
            weight: calculate_transaction_weight(&tx),
            txid: txid(&tx),
            wtxid: wtxid(&tx),
            fee,
            tx,
        })
    }

    pub fn vsize(&self) -> Natural {
        self.weight.div_ceil(crate::constants::WITNESS_SCALE_FACTOR)
    }
}

/// Result of one selection pass; read-only once built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedSet {
    pub entries: Vec<SelectedTransaction>,
    pub total_weight: Natural,
    pub total_fee: Integer,
}

impl SelectedSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().map(|entry| &entry.tx)
    }

    pub fn txids(&self) -> Vec<Hash> {
        self.entries.iter().map(|entry| entry.txid).collect()
    }
}

/// Weigh every candidate in parallel, preserving input order
///
/// Candidates whose fee cannot be computed are dropped.
pub fn weigh_candidates(candidates: Vec<Transaction>) -> Vec<SelectedTransaction> {
    candidates
        .into_par_iter()
        .filter_map(|tx| match SelectedTransaction::new(tx) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping candidate: {e}");
                None
            }
        })
        .collect()
}

/// Order weighed candidates by policy; both sorts are stable
pub fn order_candidates(entries: &mut [SelectedTransaction], policy: SelectionPolicy) {
    match policy {
        SelectionPolicy::AscendingWeight => entries.sort_by_key(|entry| entry.weight),
        SelectionPolicy::FeeRate => entries.sort_by(compare_fee_rate),
    }
}

// fee_a / vsize_a vs fee_b / vsize_b, descending, without floats
fn compare_fee_rate(a: &SelectedTransaction, b: &SelectedTransaction) -> Ordering {
    let lhs = a.fee as i128 * b.vsize().max(1) as i128;
    let rhs = b.fee as i128 * a.vsize().max(1) as i128;
    rhs.cmp(&lhs)
}

/// Select: [𝒯𝒳] × ℕ → SelectedSet
///
/// 1. Weigh every candidate
/// 2. Order by policy
/// 3. Accept in order while total_weight + weight ≤ max_weight
/// 4. Stop at the first candidate that would overflow
///
/// A candidate spending an outpoint an accepted candidate already spends is
/// skipped and the scan continues, as is one whose fee would push the fee
/// total past `MAX_MONEY`.
pub fn select(
    candidates: Vec<Transaction>,
    max_weight: Natural,
    policy: SelectionPolicy,
) -> SelectedSet {
    let offered = candidates.len();
    let mut ordered = weigh_candidates(candidates);
    order_candidates(&mut ordered, policy);

    let mut selected = SelectedSet::default();
    let mut spent: HashSet<OutPoint> = HashSet::new();

    for entry in ordered {
        if selected.total_weight + entry.weight > max_weight {
            debug!(
                "stopping at {} (weight {}): budget {} of {} used",
                hex::encode(entry.txid),
                entry.weight,
                selected.total_weight,
                max_weight
            );
            break;
        }
        if entry.tx.inputs.iter().any(|input| spent.contains(&input.prevout)) {
            debug!("skipping {}: spends an outpoint already selected", hex::encode(entry.txid));
            continue;
        }

        let Some(total_fee) = selected
            .total_fee
            .checked_add(entry.fee)
            .filter(|total| *total <= MAX_MONEY)
        else {
            debug!("skipping {}: fee total leaves the money range", hex::encode(entry.txid));
            continue;
        };

        spent.extend(entry.tx.inputs.iter().map(|input| input.prevout));
        selected.total_weight += entry.weight;
        selected.total_fee = total_fee;
        selected.entries.push(entry);
    }

    info!(
        "selected {} of {} candidates ({:?}): weight {}, fees {} sat",
        selected.len(),
        offered,
        policy,
        selected.total_weight,
        selected.total_fee
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One input, one 25-byte output; weight = 4 * (83 + script_sig_len)
    fn create_transaction(tag: u8, script_sig_len: usize, fee: Integer) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TransactionInput {
                prevout: OutPoint { txid: [tag; 32], index: 0 },
                script_sig: vec![0x00; script_sig_len],
                sequence: 0xffffffff,
                witness: vec![],
                spent_output: Some(SpentOutput {
                    value: 10_000 + fee,
                    script_type: ScriptType::P2tr,
                    address: None,
                }),
            }],
            outputs: vec![TransactionOutput {
                value: 10_000,
                script_pubkey: [vec![0x76, 0xa9, 0x14], vec![tag; 20], vec![0x88, 0xac]].concat(),
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn test_weight_of_test_transaction() {
        let entry = SelectedTransaction::new(create_transaction(1, 17, 500)).unwrap();
        assert_eq!(entry.weight, 400);
        assert_eq!(entry.vsize(), 100);
        assert_eq!(entry.fee, 500);
        assert_eq!(entry.txid, entry.wtxid);
    }

    #[test]
    fn test_select_end_to_end_scenario() {
        let pool = vec![
            create_transaction(1, 49_917, 10),
            create_transaction(2, 74_917, 20),
            create_transaction(3, 999_917, 30),
        ];
        let selected = select(pool, 3_200_000, SelectionPolicy::AscendingWeight);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.entries[0].weight, 200_000);
        assert_eq!(selected.entries[1].weight, 300_000);
        assert_eq!(selected.total_weight, 500_000);
        assert_eq!(selected.total_fee, 30);
    }

    #[test]
    fn test_select_ascending_weight_order() {
        let pool = vec![
            create_transaction(1, 300, 1),
            create_transaction(2, 100, 1),
            create_transaction(3, 200, 1),
        ];
        let selected = select(pool, u64::MAX, SelectionPolicy::AscendingWeight);
        let weights: Vec<_> = selected.entries.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![4 * 183, 4 * 283, 4 * 383]);
    }

    #[test]
    fn test_select_ties_preserve_input_order() {
        let pool = vec![
            create_transaction(5, 100, 1),
            create_transaction(4, 100, 1),
            create_transaction(6, 100, 1),
        ];
        let selected = select(pool, u64::MAX, SelectionPolicy::AscendingWeight);
        let tags: Vec<u8> = selected.entries.iter().map(|e| e.tx.inputs[0].prevout.txid[0]).collect();
        assert_eq!(tags, vec![5, 4, 6]);
    }

    #[test]
    fn test_select_stops_at_first_overflow() {
        // Weights 400, 800, 800 after sorting; 400 + 800 fits, the next 800
        // overflows and ends the scan
        let pool = vec![
            create_transaction(1, 17, 1),
            create_transaction(2, 117, 1),
            create_transaction(3, 117, 1),
        ];
        let selected = select(pool, 1_500, SelectionPolicy::AscendingWeight);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.total_weight, 1_200);
    }

    #[test]
    fn test_select_exact_budget() {
        let pool = vec![create_transaction(1, 17, 1), create_transaction(2, 17, 1)];
        let selected = select(pool, 800, SelectionPolicy::AscendingWeight);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.total_weight, 800);
    }

    #[test]
    fn test_select_empty_pool() {
        let selected = select(vec![], 3_200_000, SelectionPolicy::AscendingWeight);
        assert!(selected.is_empty());
        assert_eq!(selected.total_weight, 0);
        assert_eq!(selected.total_fee, 0);
    }

    #[test]
    fn test_select_nothing_fits() {
        let selected = select(vec![create_transaction(1, 17, 1)], 399, SelectionPolicy::AscendingWeight);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_select_fee_rate_policy() {
        // Same weight, rising fee: fee-rate order reverses the pool
        let pool = vec![
            create_transaction(1, 17, 100),
            create_transaction(2, 17, 300),
            create_transaction(3, 17, 200),
        ];
        let selected = select(pool, u64::MAX, SelectionPolicy::FeeRate);
        let fees: Vec<_> = selected.entries.iter().map(|e| e.fee).collect();
        assert_eq!(fees, vec![300, 200, 100]);
    }

    #[test]
    fn test_fee_rate_prefers_dense_over_large() {
        // 1000 sat over 100 vB beats 2000 sat over 1000 vB
        let dense = create_transaction(1, 17, 1_000);
        let large = create_transaction(2, 917, 2_000);
        let selected = select(vec![large, dense], u64::MAX, SelectionPolicy::FeeRate);
        assert_eq!(selected.entries[0].fee, 1_000);
    }

    #[test]
    fn test_select_skips_conflicting_spend() {
        let a = create_transaction(1, 17, 1);
        let mut b = create_transaction(2, 18, 1);
        b.inputs[0].prevout = a.inputs[0].prevout;
        let c = create_transaction(3, 19, 1);
        let selected = select(vec![a, b, c], u64::MAX, SelectionPolicy::AscendingWeight);
        assert_eq!(selected.len(), 2);
        let outpoints: HashSet<_> = selected
            .transactions()
            .flat_map(|tx| tx.inputs.iter().map(|i| i.prevout))
            .collect();
        assert_eq!(outpoints.len(), 2);
    }

    #[test]
    fn test_weigh_candidates_drops_unfundable() {
        let mut bad = create_transaction(1, 17, 1);
        bad.inputs[0].spent_output = None;
        let entries = weigh_candidates(vec![bad, create_transaction(2, 17, 1)]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tx.inputs[0].prevout.txid, [2; 32]);
    }

    #[test]
    fn test_select_drops_spent_value_above_max_money() {
        let mut huge = create_transaction(1, 17, 1);
        let mut other = create_transaction(2, 18, 1);
        for tx in [&mut huge, &mut other] {
            if let Some(spent) = tx.inputs[0].spent_output.as_mut() {
                spent.value = i64::MAX / 2 + 10;
            }
        }
        let selected = select(
            vec![huge, other, create_transaction(3, 19, 7)],
            3_200_000,
            SelectionPolicy::AscendingWeight,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.total_fee, 7);
    }

    #[test]
    fn test_select_caps_fee_total_at_max_money() {
        let fee = MAX_MONEY - 10_000;
        let pool = vec![
            create_transaction(1, 17, fee),
            create_transaction(2, 18, fee),
            create_transaction(3, 19, 5),
        ];
        let selected = select(pool, u64::MAX, SelectionPolicy::AscendingWeight);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.total_fee, fee + 5);
        assert!(selected.total_fee <= MAX_MONEY);
    }
}
