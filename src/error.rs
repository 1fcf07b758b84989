//! Error types for block assembly and mining

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MinerError {
    #[error("Malformed length: need {needed} bytes, have {available}")]
    MalformedLength { needed: usize, available: usize },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Hash decode error: {0}")]
    HashDecodeError(String),

    #[error("Cannot compute merkle root of an empty leaf list")]
    EmptyMerkleTree,

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<hex::FromHexError> for MinerError {
    fn from(err: hex::FromHexError) -> Self {
        MinerError::HashDecodeError(err.to_string())
    }
}

impl From<serde_json::Error> for MinerError {
    fn from(err: serde_json::Error) -> Self {
        MinerError::MalformedRecord(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MinerError>;
