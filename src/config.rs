//! Configuration for mempool-miner
//!
//! Everything the pipeline needs from outside: the weight budget, the chain
//! tip, the difficulty, the coinbase payout and the search parameters. Every
//! field has a default, so a partial JSON file is enough.

use crate::coinbase::{CoinbaseBuilder, MAX_COINBASE_TAG_LEN};
use crate::constants::*;
use crate::error::{MinerError, Result};
use crate::hashes::from_hex;
use crate::mining::HeaderParams;
use crate::pow::expand_target;
use crate::selection::SelectionPolicy;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Coinbase payout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseConfig {
    /// Reward output script, hex
    #[serde(default = "default_payout_script")]
    pub payout_script: String,

    /// ASCII appended to the coinbase script
    #[serde(default)]
    pub tag: String,

    /// Caller-supplied entropy pushed after the height
    #[serde(default)]
    pub extra_nonce: u64,
}

fn default_payout_script() -> String {
    "76a914edf10a7fac6b32e24daa5305c723f3de58db1bc888ac".to_string()
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            payout_script: default_payout_script(),
            tag: String::new(),
            extra_nonce: 0,
        }
    }
}

/// Nonce search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Worker threads; 1 gives a reproducible search order
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Nonces tried between cancellation checks
    #[serde(default = "default_cancel_check_interval")]
    pub cancel_check_interval: u64,
}

fn default_threads() -> usize {
    1
}

fn default_cancel_check_interval() -> u64 {
    DEFAULT_CANCEL_CHECK_INTERVAL
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            cancel_check_interval: default_cancel_check_interval(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Selection budget in weight units
    #[serde(default = "default_max_block_weight")]
    pub max_block_weight: Natural,

    /// Chain tip, display-order hex
    #[serde(default = "default_previous_block_hash")]
    pub previous_block_hash: String,

    /// Compact target, hex
    #[serde(default = "default_bits")]
    pub bits: String,

    #[serde(default)]
    pub block_height: Natural,

    /// Unix seconds
    #[serde(default)]
    pub base_timestamp: u32,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    #[serde(default)]
    pub coinbase: CoinbaseConfig,

    #[serde(default)]
    pub mining: MiningConfig,
}

fn default_max_block_weight() -> Natural {
    DEFAULT_MAX_BLOCK_WEIGHT
}

fn default_previous_block_hash() -> String {
    "00".repeat(32)
}

fn default_bits() -> String {
    format!("{DEFAULT_BITS:08x}")
}

fn default_version() -> u32 {
    DEFAULT_BLOCK_VERSION
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            max_block_weight: default_max_block_weight(),
            previous_block_hash: default_previous_block_hash(),
            bits: default_bits(),
            block_height: 0,
            base_timestamp: 0,
            version: default_version(),
            selection_policy: SelectionPolicy::default(),
            coinbase: CoinbaseConfig::default(),
            mining: MiningConfig::default(),
        }
    }
}

impl MinerConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MinerError::Config(e.to_string()))
    }

    /// Decode every hex field and range-check the numbers
    pub fn validate(&self) -> Result<()> {
        if self.max_block_weight == 0 || self.max_block_weight > MAX_BLOCK_WEIGHT {
            return Err(MinerError::Config(format!(
                "max_block_weight {} outside 1..={MAX_BLOCK_WEIGHT}",
                self.max_block_weight
            )));
        }
        from_hex(&self.previous_block_hash)?;
        expand_target(self.bits_value()?)?;
        self.payout_script()?;
        if self.coinbase.tag.len() > MAX_COINBASE_TAG_LEN {
            return Err(MinerError::Config(format!(
                "coinbase tag longer than {MAX_COINBASE_TAG_LEN} bytes"
            )));
        }
        if self.mining.threads == 0 {
            return Err(MinerError::Config("mining.threads must be at least 1".to_string()));
        }
        if self.mining.cancel_check_interval == 0 {
            return Err(MinerError::Config(
                "mining.cancel_check_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Compact target as a number
    pub fn bits_value(&self) -> Result<u32> {
        let digits = self.bits.trim_start_matches("0x");
        u32::from_str_radix(digits, 16)
            .map_err(|e| MinerError::Config(format!("bits {:?}: {e}", self.bits)))
    }

    pub fn payout_script(&self) -> Result<ByteString> {
        hex::decode(&self.coinbase.payout_script)
            .map_err(|e| MinerError::Config(format!("coinbase.payout_script: {e}")))
    }

    pub fn header_params(&self) -> Result<HeaderParams> {
        Ok(HeaderParams {
            version: self.version,
            prev_block_hash: from_hex(&self.previous_block_hash)?,
            timestamp: self.base_timestamp,
            bits: self.bits_value()?,
        })
    }

    pub fn coinbase_builder(&self) -> Result<CoinbaseBuilder> {
        CoinbaseBuilder::new(self.block_height, self.payout_script()?)
            .with_extra_nonce(self.coinbase.extra_nonce)
            .with_tag(self.coinbase.tag.as_bytes())
    }
}
