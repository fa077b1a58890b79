//! Error types for the core crate

use thiserror::Error;

/// Core blockchain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid chain id: expected {expected}, got {actual}")]
    InvalidChainId { expected: u32, actual: u32 },

    #[error("Transaction hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signer {signer} does not own sender address {from}")]
    SignerMismatch { signer: String, from: String },

    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(u8),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unsupported contract source type: {0}")]
    UnsupportedSourceType(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Uint128 overflow")]
    Uint128Overflow,

    #[error("Uint128 underflow")]
    Uint128Underflow,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Hex decode error: {0}")]
    HexDecode(String),
}

impl From<secp256k1::Error> for CoreError {
    fn from(err: secp256k1::Error) -> Self {
        CoreError::Crypto(err.to_string())
    }
}

impl From<hex::FromHexError> for CoreError {
    fn from(err: hex::FromHexError) -> Self {
        CoreError::HexDecode(err.to_string())
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
