//! Structural transaction checks applied before a transaction enters the pool

use crate::constants::*;
use crate::economic::calculate_fee;
use crate::error::Result;
use crate::script::{check_output_script, check_spent_output};
use crate::types::*;
use std::collections::HashSet;

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A non-coinbase transaction tx = (v, ins, outs, lt) is valid if and only if:
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. ∀o ∈ outs: 0 ≤ o.value ≤ M_max
/// 3. ∀i ≠ j ∈ ins: i.prevout ≠ j.prevout
/// 4. ∀i ∈ ins: i.spent_output is present, 0 ≤ i.spent_output.value ≤ M_max,
///    and it matches its script type
/// 5. ∀o ∈ outs: o.script_pubkey is a standard template
/// 6. Σ outs.value ≤ Σ ins.spent_output.value
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    // 1. Check inputs and outputs are not empty
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid("Empty inputs or outputs".to_string()));
    }

    // 2. Check output values are valid
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value < 0 || output.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
    }

    // 3. No outpoint spent twice inside the transaction
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input.prevout) {
            return Ok(ValidationResult::Invalid(format!(
                "Duplicate input {}:{}",
                hex::encode(input.prevout.txid),
                input.prevout.index
            )));
        }
    }

    // 4. Spent outputs
    for (i, input) in tx.inputs.iter().enumerate() {
        let Some(spent) = &input.spent_output else {
            return Ok(ValidationResult::Invalid(format!("Input {i} has no spent output")));
        };
        if spent.value < 0 || spent.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid spent value {} at input {}",
                spent.value, i
            )));
        }
        if let ValidationResult::Invalid(reason) = check_spent_output(spent) {
            return Ok(ValidationResult::Invalid(format!("Input {i}: {reason}")));
        }
    }

    // 5. Output scripts
    for (i, output) in tx.outputs.iter().enumerate() {
        if let ValidationResult::Invalid(reason) = check_output_script(output) {
            return Ok(ValidationResult::Invalid(format!("Output {i}: {reason}")));
        }
    }

    // 6. Value balance
    if let Err(e) = calculate_fee(tx) {
        return Ok(ValidationResult::Invalid(e.to_string()));
    }

    Ok(ValidationResult::Valid)
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1
        && tx.inputs[0].prevout.txid == [0u8; 32]
        && tx.inputs[0].prevout.index == COINBASE_PREVOUT_INDEX
}
