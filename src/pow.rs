//! Proof-of-work target handling and the nonce search
//!
//! The search moves `Searching → Found | Cancelled`. It walks the nonce space
//! and, when the nonce wraps, bumps the timestamp and starts over at nonce 0.
//! Nothing bounds the walk except a solution or the cancel token, which is
//! polled every `check_interval` attempts.

use crate::error::{MinerError, Result};
use crate::hashes::reverse;
use crate::serialization::block::{block_hash, serialize_block_header};
use crate::types::*;
use log::{info, warn};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// 256-bit unsigned integer, little-endian limbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);

    pub fn from_u32(value: u32) -> Self {
        U256([value as u64, 0, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0)
    }

    /// Interpret 32 bytes as a big-endian number
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let start = 32 - (i + 1) * 8;
            let mut limb = [0u8; 8];
            limb.copy_from_slice(&bytes[start..start + 8]);
            *word = u64::from_be_bytes(limb);
        }
        U256(words)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            let start = 32 - (i + 1) * 8;
            bytes[start..start + 8].copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Shift left; bits past 2^256 are discarded
    pub fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 {
            if i + word_shift < 4 {
                result.0[i + word_shift] |= self.0[i] << bit_shift;
                if bit_shift > 0 && i + word_shift + 1 < 4 {
                    result.0[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
                }
            }
        }

        result
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in word_shift..4 {
            result.0[i - word_shift] |= self.0[i] >> bit_shift;
            if bit_shift > 0 && i > word_shift {
                result.0[i - word_shift - 1] |= self.0[i] << (64 - bit_shift);
            }
        }

        result
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

/// Expanded proof-of-work threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(U256);

impl Target {
    /// ExpandTarget: ℕ₃₂ → ℕ₂₅₆
    ///
    /// For bits = 0xEEMMMMMM:
    /// - E is the byte-length exponent
    /// - M is the 23-bit mantissa, bit 23 is a sign bit
    ///
    /// target = M × 2^(8 × (E − 3))
    ///
    /// Negative, zero and overflowing encodings are rejected.
    pub fn from_compact(bits: u32) -> Result<Self> {
        let exponent = bits >> 24;
        let mantissa = bits & 0x007f_ffff;

        if bits & 0x0080_0000 != 0 && mantissa != 0 {
            return Err(MinerError::InvalidTarget(format!("{bits:08x}: negative target")));
        }

        let overflow = mantissa != 0
            && (exponent > 34
                || (mantissa > 0xff && exponent > 33)
                || (mantissa > 0xffff && exponent > 32));
        if overflow {
            return Err(MinerError::InvalidTarget(format!("{bits:08x}: target overflows 256 bits")));
        }

        let value = if exponent <= 3 {
            U256::from_u32(mantissa).shr(8 * (3 - exponent))
        } else {
            U256::from_u32(mantissa).shl(8 * (exponent - 3))
        };

        if value.is_zero() {
            return Err(MinerError::InvalidTarget(format!("{bits:08x}: zero target")));
        }

        Ok(Target(value))
    }

    /// Big-endian bytes of the threshold
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// True when a display-order hash, read as a big-endian number, is below
    /// the threshold
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        U256::from_be_bytes(hash) < self.0
    }
}

/// Expand a compact target
pub fn expand_target(bits: u32) -> Result<Target> {
    Target::from_compact(bits)
}

/// CheckProofOfWork: ℋ → {true, false}
///
/// Formula: reverse(SHA256d(header)) < ExpandTarget(header.bits)
pub fn check_proof_of_work(header: &BlockHeader) -> Result<bool> {
    let target = expand_target(header.bits)?;
    Ok(target.is_met_by(&block_hash(header)))
}

/// Shared stop signal for one or more searches
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningResult {
    /// `header` meets its target; `hash` is its display-order block hash
    Found {
        header: BlockHeader,
        hash: Hash,
        attempts: u64,
    },
    /// Stopped by the token; `header` is the next one that would have been tried
    Cancelled { header: BlockHeader, attempts: u64 },
}

impl MiningResult {
    pub fn attempts(&self) -> u64 {
        match self {
            MiningResult::Found { attempts, .. } | MiningResult::Cancelled { attempts, .. } => *attempts,
        }
    }
}

/// Next header in the search order: nonce + 1, or timestamp + 1 and nonce 0
/// when the nonce wraps
pub fn advance_nonce(header: &mut BlockHeader) {
    advance_lane(header, 1, 0);
}

// Steps by `stride`; after a wrap the lane restarts at nonce `lane`
fn advance_lane(header: &mut BlockHeader, stride: u32, lane: u32) {
    match header.nonce.checked_add(stride) {
        Some(nonce) => header.nonce = nonce,
        None => {
            header.timestamp = header.timestamp.wrapping_add(1);
            header.nonce = lane;
        }
    }
}

/// SHA-256 state after the first 64 header bytes
///
/// Those bytes hold the version, previous hash and most of the merkle root,
/// none of which the search touches.
#[derive(Clone)]
struct Midstate {
    state: Sha256,
}

impl Midstate {
    fn new(header_bytes: &[u8; 80]) -> Self {
        let mut state = Sha256::new();
        state.update(&header_bytes[..64]);
        Self { state }
    }

    /// Display-order hash of the header with this tail
    fn hash(&self, header: &BlockHeader) -> Hash {
        let mut tail = [0u8; 16];
        tail[..4].copy_from_slice(&header.merkle_root[28..]);
        tail[4..8].copy_from_slice(&header.timestamp.to_le_bytes());
        tail[8..12].copy_from_slice(&header.bits.to_le_bytes());
        tail[12..].copy_from_slice(&header.nonce.to_le_bytes());

        let mut inner = self.state.clone();
        inner.update(tail);
        let first = inner.finalize();
        let second = Sha256::digest(first);

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&second);
        reverse(&hash)
    }
}

/// MineBlock: ℋ → ℋ × {found, cancelled}
///
/// Searches from `header` as given, single-threaded.
pub fn mine(header: BlockHeader, cancel: &CancelToken, check_interval: u64) -> Result<MiningResult> {
    let target = expand_target(header.bits)?;
    let result = search_lane(header, &target, cancel, check_interval, 1, 0);
    log_result(&result);
    Ok(result)
}

/// Nonce search split across `threads` workers
///
/// Worker `i` tries the nonces congruent to `header.nonce + i` modulo
/// `threads` and owns its own header copy. The first worker to succeed
/// claims the result and cancels the rest; a later solution found inside
/// the same check interval is discarded. With more than one worker the
/// winning nonce depends on scheduling.
pub fn mine_parallel(
    header: BlockHeader,
    threads: usize,
    cancel: &CancelToken,
    check_interval: u64,
) -> Result<MiningResult> {
    if threads <= 1 {
        return mine(header, cancel, check_interval);
    }

    let target = expand_target(header.bits)?;
    let stride = u32::try_from(threads)
        .map_err(|_| MinerError::Config(format!("{threads} mining threads")))?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| MinerError::Config(format!("mining thread pool: {e}")))?;

    // Trips on the caller's signal or on the first solution
    let stop = CancelToken::new();
    let winner = AtomicU32::new(NO_WINNER);
    let results: Vec<MiningResult> = pool.install(|| {
        (0..stride)
            .into_par_iter()
            .map(|lane| {
                let mut start = header.clone();
                if lane > 0 {
                    advance_lane(&mut start, lane, lane);
                }
                let watcher = LinkedCancel { outer: cancel, inner: &stop };
                let result = search_lane(start, &target, &watcher, check_interval, stride, lane);
                if matches!(result, MiningResult::Found { .. }) && claim_win(&winner, lane) {
                    stop.cancel();
                }
                result
            })
            .collect()
    });

    let attempts: u64 = results.iter().map(MiningResult::attempts).sum();
    let winner = winner.into_inner();
    let result = results
        .into_iter()
        .nth(winner as usize)
        .and_then(|result| match result {
            MiningResult::Found { header, hash, .. } => Some(MiningResult::Found { header, hash, attempts }),
            MiningResult::Cancelled { .. } => None,
        })
        .unwrap_or(MiningResult::Cancelled { header, attempts });
    log_result(&result);
    Ok(result)
}

const NO_WINNER: u32 = u32::MAX;

// Only the first lane to call this for a search gets `true`
fn claim_win(winner: &AtomicU32, lane: u32) -> bool {
    winner
        .compare_exchange(NO_WINNER, lane, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

struct LinkedCancel<'a> {
    outer: &'a CancelToken,
    inner: &'a CancelToken,
}

trait StopSignal {
    fn should_stop(&self) -> bool;
}

impl StopSignal for CancelToken {
    fn should_stop(&self) -> bool {
        self.is_cancelled()
    }
}

impl StopSignal for LinkedCancel<'_> {
    fn should_stop(&self) -> bool {
        self.outer.is_cancelled() || self.inner.is_cancelled()
    }
}

fn search_lane<S: StopSignal>(
    mut header: BlockHeader,
    target: &Target,
    stop: &S,
    check_interval: u64,
    stride: u32,
    lane: u32,
) -> MiningResult {
    let check_interval = check_interval.max(1);
    let midstate = Midstate::new(&serialize_block_header(&header));
    let mut attempts: u64 = 0;

    loop {
        if attempts % check_interval == 0 && stop.should_stop() {
            return MiningResult::Cancelled { header, attempts };
        }

        let hash = midstate.hash(&header);
        attempts += 1;
        if target.is_met_by(&hash) {
            return MiningResult::Found { header, hash, attempts };
        }

        advance_lane(&mut header, stride, lane);
    }
}

fn log_result(result: &MiningResult) {
    match result {
        MiningResult::Found { header, hash, attempts } => info!(
            "found block {} at nonce {} timestamp {} after {} attempts",
            hex::encode(hash),
            header.nonce,
            header.timestamp,
            attempts
        ),
        MiningResult::Cancelled { attempts, .. } => {
            warn!("mining cancelled after {attempts} attempts")
        }
    }
}
