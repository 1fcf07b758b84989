//! Subsidy schedule and fee accounting

use crate::constants::*;
use crate::error::{MinerError, Result};
use crate::transaction::is_coinbase;
use crate::types::*;

/// GetBlockSubsidy: ℕ → ℤ
///
/// Subsidy halves every 210,000 blocks (HALVING_INTERVAL).
///
/// Formula: subsidy = 50 * C * 2^(-⌊h/H⌋)
/// Where:
/// - h = block height
/// - H = HALVING_INTERVAL (210,000)
/// - C = SATOSHIS_PER_BTC (10^8)
pub fn get_block_subsidy(height: Natural) -> Integer {
    let halving_period = height / HALVING_INTERVAL;

    // After 64 halvings, subsidy becomes 0
    if halving_period >= 64 {
        return 0;
    }

    INITIAL_SUBSIDY >> halving_period
}

/// Fee = Σ spent output values − Σ output values
///
/// Coinbase transactions pay no fee. A non-coinbase input without its spent
/// output, any value outside `[0, MAX_MONEY]`, or a negative balance is a
/// malformed transaction. A returned fee is therefore in `[0, MAX_MONEY]`.
pub fn calculate_fee(tx: &Transaction) -> Result<Integer> {
    if is_coinbase(tx) {
        return Ok(0);
    }

    let mut total_input: Integer = 0;
    for (i, input) in tx.inputs.iter().enumerate() {
        let spent = input.spent_output.as_ref().ok_or_else(|| {
            MinerError::MalformedTransaction(format!("input {i} has no spent output"))
        })?;
        if !(0..=MAX_MONEY).contains(&spent.value) {
            return Err(MinerError::MalformedTransaction(format!(
                "input {i} spends value {} outside the money range",
                spent.value
            )));
        }
        total_input = total_input
            .checked_add(spent.value)
            .filter(|total| *total <= MAX_MONEY)
            .ok_or_else(|| MinerError::MalformedTransaction("input total out of range".to_string()))?;
    }

    let mut total_output: Integer = 0;
    for (i, output) in tx.outputs.iter().enumerate() {
        if !(0..=MAX_MONEY).contains(&output.value) {
            return Err(MinerError::MalformedTransaction(format!(
                "output {i} has value {} outside the money range",
                output.value
            )));
        }
        total_output = total_output
            .checked_add(output.value)
            .filter(|total| *total <= MAX_MONEY)
            .ok_or_else(|| MinerError::MalformedTransaction("output total out of range".to_string()))?;
    }

    let fee = total_input - total_output;
    if fee < 0 {
        return Err(MinerError::MalformedTransaction(format!(
            "outputs exceed inputs by {}",
            -fee
        )));
    }

    Ok(fee)
}

/// Coinbase reward: subsidy at `height` plus collected fees
///
/// Fails when the fee total is negative or the sum leaves the money range.
pub fn block_reward(height: Natural, total_fee: Integer) -> Result<Integer> {
    if total_fee < 0 {
        return Err(MinerError::MalformedTransaction(format!(
            "negative fee total {total_fee}"
        )));
    }
    get_block_subsidy(height)
        .checked_add(total_fee)
        .filter(|reward| *reward <= MAX_MONEY)
        .ok_or_else(|| {
            MinerError::MalformedTransaction(format!("reward with fees {total_fee} out of range"))
        })
}
