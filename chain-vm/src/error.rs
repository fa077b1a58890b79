//! VM error types

use chain_core::{Address, CoreError};
use thiserror::Error;

/// VM error type
///
/// Variants are plain kinds so that outcomes can be compared with `==`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Gas limit cannot cover the base cost, or the VM ran past its budget
    #[error("Out of gas limit")]
    OutOfGasLimit,

    /// Insufficient balance for gas or value
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// `gas_price * gas` does not fit in 128 bits
    #[error("Gas cost overflow")]
    GasOverflow,

    /// Crediting an account would overflow its balance
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Account or contract not found
    #[error("Account not found: {0}")]
    AccountNotFound(Address),

    /// Payload bytes could not be decoded
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Contract execution error reported by the VM
    #[error("Contract execution error: {0}")]
    ContractExecution(String),

    /// State error
    #[error("State error: {0}")]
    State(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transaction failed an integrity check
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Other error
    #[error("VM error: {0}")]
    Other(String),
}

impl VmError {
    /// Errors that abort an execution attempt outright instead of becoming
    /// part of its outcome
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VmError::GasOverflow | VmError::BalanceOverflow | VmError::State(_)
        )
    }
}

impl From<serde_json::Error> for VmError {
    fn from(err: serde_json::Error) -> Self {
        VmError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for VmError {
    fn from(err: anyhow::Error) -> Self {
        VmError::Other(err.to_string())
    }
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;
