//! Bitcoin constants used by block assembly and mining

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Consensus block weight limit
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Default selection budget, leaving headroom for header and coinbase
pub const DEFAULT_MAX_BLOCK_WEIGHT: u64 = 3_200_000;

/// Witness scale factor: base bytes count four times
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Halving interval: 210,000 blocks
pub const HALVING_INTERVAL: u64 = 210_000;

/// Initial block subsidy: 50 BTC
pub const INITIAL_SUBSIDY: i64 = 50 * 100_000_000;

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Previous output index used by the coinbase input
pub const COINBASE_PREVOUT_INDEX: u32 = 0xffffffff;

/// Witness reserved value committed alongside the witness root
pub const WITNESS_RESERVED_VALUE: [u8; 32] = [0u8; 32];

/// OP_RETURN opcode
pub const OP_RETURN: u8 = 0x6a;

/// Push of 36 bytes: 4-byte header plus 32-byte commitment
pub const WITNESS_COMMITMENT_PUSH: u8 = 0x24;

/// BIP141 witness commitment header
pub const WITNESS_COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// Serialized block header length
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Easiest target the miner accepts by default: 0x0000ffff << 224
pub const DEFAULT_BITS: u32 = 0x1f00ffff;

/// Default block version
pub const DEFAULT_BLOCK_VERSION: u32 = 4;

/// Default number of nonces between cancellation checks
pub const DEFAULT_CANCEL_CHECK_INTERVAL: u64 = 65_536;
