//! Script template recognition and per-template shape rules
//!
//! Only the five standard output templates are accepted. This is a shape
//! check, not script execution.

use crate::types::*;

const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Recognise a standard output template
pub fn classify(script: &[u8]) -> Option<ScriptType> {
    match script {
        [OP_DUP, OP_HASH160, 0x14, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
            Some(ScriptType::P2pkh)
        }
        [OP_HASH160, 0x14, hash @ .., OP_EQUAL] if hash.len() == 20 => Some(ScriptType::P2sh),
        [OP_0, 0x14, program @ ..] if program.len() == 20 => Some(ScriptType::P2wpkh),
        [OP_0, 0x20, program @ ..] if program.len() == 32 => Some(ScriptType::P2wsh),
        [OP_1, 0x20, program @ ..] if program.len() == 32 => Some(ScriptType::P2tr),
        _ => None,
    }
}

impl ScriptType {
    /// Amounts locked to these templates must be strictly positive
    pub fn requires_positive_value(self) -> bool {
        matches!(self, ScriptType::P2pkh | ScriptType::P2wpkh | ScriptType::P2wsh)
    }

    /// Address prefix expected for this template, if one is enforced
    pub fn address_prefix(self) -> Option<&'static str> {
        match self {
            ScriptType::P2pkh => Some("1"),
            ScriptType::P2wpkh | ScriptType::P2wsh => Some("bc1"),
            ScriptType::P2sh | ScriptType::P2tr => None,
        }
    }
}

/// Check a spent output against its declared template
pub fn check_spent_output(spent: &SpentOutput) -> ValidationResult {
    let kind = spent.script_type;
    if kind.requires_positive_value() && spent.value <= 0 {
        return ValidationResult::Invalid(format!(
            "{kind:?} prevout must carry a positive value, got {}",
            spent.value
        ));
    }
    if let Some(prefix) = kind.address_prefix() {
        match spent.address.as_deref() {
            Some(address) if address.starts_with(prefix) => {}
            Some(address) => {
                return ValidationResult::Invalid(format!(
                    "{kind:?} prevout address {address} does not start with {prefix}"
                ))
            }
            None => {
                return ValidationResult::Invalid(format!("{kind:?} prevout is missing its address"))
            }
        }
    }
    ValidationResult::Valid
}

/// Check that an output script is a standard template and its value fits it
pub fn check_output_script(output: &TransactionOutput) -> ValidationResult {
    match classify(&output.script_pubkey) {
        None => ValidationResult::Invalid(format!(
            "non-standard output script {}",
            hex::encode(&output.script_pubkey)
        )),
        Some(kind) if kind.requires_positive_value() && output.value <= 0 => {
            ValidationResult::Invalid(format!("{kind:?} output must carry a positive value"))
        }
        Some(_) => ValidationResult::Valid,
    }
}
