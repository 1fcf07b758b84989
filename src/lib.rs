//! # mempool-miner
//!
//! Builds a block candidate from a pool of pending transactions and searches
//! for a proof-of-work solution.
//!
//! The pipeline:
//! - `mempool` decodes pool records and drops malformed or conflicting ones
//! - `selection` weighs candidates and fills a weight budget greedily
//! - `mining` builds the coinbase, the witness commitment and the header
//! - `pow` searches nonce and timestamp for a hash below target
//!
//! Every stage except the search is a pure function of its inputs. The
//! timestamp, height, chain tip and coinbase entropy all come from
//! [`config::MinerConfig`].
//!
//! ## Usage
//!
//! ```rust
//! use mempool_miner::config::MinerConfig;
//! use mempool_miner::pow::CancelToken;
//! use mempool_miner::MempoolMiner;
//!
//! let config = MinerConfig {
//!     bits: "207fffff".to_string(),
//!     base_timestamp: 1_700_000_000,
//!     ..Default::default()
//! };
//! let miner = MempoolMiner::new(config).unwrap();
//!
//! // An empty pool still yields a coinbase-only block
//! let output = miner.build_block(vec![], &CancelToken::new()).unwrap().unwrap();
//! assert_eq!(output.header_hex.len(), 160);
//! assert!(output.txids.is_empty());
//! ```

pub mod coinbase;
pub mod config;
pub mod constants;
pub mod economic;
pub mod error;
pub mod hashes;
pub mod mempool;
pub mod merkle;
pub mod mining;
pub mod pow;
pub mod script;
pub mod segwit;
pub mod selection;
pub mod serialization;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use constants::*;
pub use error::{MinerError, Result};
pub use types::*;

use config::MinerConfig;
use log::warn;
use mining::{assemble_block, BlockOutput, BlockTemplate};
use pow::{mine_parallel, CancelToken, MiningResult};
use selection::{select, SelectedSet};

/// One configured block-building pipeline
///
/// # Examples
///
/// ```
/// use mempool_miner::config::MinerConfig;
/// use mempool_miner::mempool::Mempool;
/// use mempool_miner::MempoolMiner;
///
/// let miner = MempoolMiner::new(MinerConfig::default()).unwrap();
/// let pool = Mempool::new();
/// let selected = miner.select(pool.into_transactions());
/// let template = miner.assemble(selected).unwrap();
/// assert_eq!(template.transaction_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MempoolMiner {
    config: MinerConfig,
}

impl MempoolMiner {
    /// Validate `config` and build a pipeline around it
    pub fn new(config: MinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Fill the configured weight budget from `candidates`
    pub fn select(&self, candidates: Vec<Transaction>) -> SelectedSet {
        select(candidates, self.config.max_block_weight, self.config.selection_policy)
    }

    /// Coinbase, commitments and header for `selected`
    pub fn assemble(&self, selected: SelectedSet) -> Result<BlockTemplate> {
        let builder = self.config.coinbase_builder()?;
        let params = self.config.header_params()?;
        assemble_block(selected, &builder, &params)
    }

    /// Search for a solution to `template`'s header
    pub fn mine(&self, template: &BlockTemplate, cancel: &CancelToken) -> Result<MiningResult> {
        mine_parallel(
            template.header.clone(),
            self.config.mining.threads,
            cancel,
            self.config.mining.cancel_check_interval,
        )
    }

    /// Select, assemble and mine
    ///
    /// Returns `None` when the search was cancelled.
    pub fn build_block(
        &self,
        candidates: Vec<Transaction>,
        cancel: &CancelToken,
    ) -> Result<Option<BlockOutput>> {
        let template = self.assemble(self.select(candidates))?;
        match self.mine(&template, cancel)? {
            MiningResult::Found { header, .. } => Ok(Some(template.to_output(&header))),
            MiningResult::Cancelled { attempts, .. } => {
                warn!("no block produced: search cancelled after {attempts} attempts");
                Ok(None)
            }
        }
    }
}
