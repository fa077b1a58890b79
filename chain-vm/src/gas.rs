//! Gas metering and scheduling

use crate::{VmError, VmResult};
use chain_core::{Transaction, Uint128};
use serde::{Deserialize, Serialize};

/// Minimum gas charged for any transaction
pub const MIN_GAS_COUNT_PER_TRANSACTION: Uint128 = Uint128::new(20_000);

/// Gas charged per byte of payload
pub const GAS_COUNT_PER_BYTE: Uint128 = Uint128::new(1);

/// Gas costs that do not depend on execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    /// Base transaction cost
    pub min_gas_per_transaction: Uint128,
    /// Cost per byte of transaction payload
    pub gas_per_payload_byte: Uint128,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            min_gas_per_transaction: MIN_GAS_COUNT_PER_TRANSACTION,
            gas_per_payload_byte: GAS_COUNT_PER_BYTE,
        }
    }
}

impl GasSchedule {
    /// Load gas schedule from TOML configuration
    pub fn from_toml(toml_str: &str) -> VmResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| VmError::Config(format!("Failed to parse gas schedule: {}", e)))
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> VmResult<String> {
        toml::to_string(self)
            .map_err(|e| VmError::Config(format!("Failed to serialize gas schedule: {}", e)))
    }

    /// Base cost of a transaction carrying `payload_len` bytes
    pub fn transaction_cost(&self, payload_len: usize) -> VmResult<Uint128> {
        let data_gas = self
            .gas_per_payload_byte
            .checked_mul(Uint128::from(payload_len))
            .map_err(|_| VmError::GasOverflow)?;
        self.min_gas_per_transaction
            .checked_add(data_gas)
            .map_err(|_| VmError::GasOverflow)
    }

    /// Gas every execution of `tx` costs before any contract code runs
    pub fn tx_base_gas(&self, tx: &Transaction) -> VmResult<Uint128> {
        self.transaction_cost(tx.data.payload.len())
    }
}

/// Monetary cost of `gas` units at `gas_price`
pub fn gas_cost(gas_price: Uint128, gas: Uint128) -> VmResult<Uint128> {
    gas_price.checked_mul(gas).map_err(|_| VmError::GasOverflow)
}

/// Gas meter for tracking gas consumption against a limit
#[derive(Debug, Clone)]
pub struct GasMeter {
    /// Gas limit for the transaction
    limit: Uint128,
    /// Gas consumed so far
    consumed: Uint128,
}

impl GasMeter {
    /// Create a new gas meter
    pub fn new(limit: Uint128) -> Self {
        Self {
            limit,
            consumed: Uint128::ZERO,
        }
    }

    /// Get remaining gas
    pub fn remaining(&self) -> Uint128 {
        self.limit
            .checked_sub(self.consumed)
            .unwrap_or(Uint128::ZERO)
    }

    /// Get consumed gas
    pub fn consumed(&self) -> Uint128 {
        self.consumed
    }

    /// Get gas limit
    pub fn limit(&self) -> Uint128 {
        self.limit
    }

    /// Consume `amount`, or nothing at all if it does not fit
    pub fn consume(&mut self, amount: Uint128) -> VmResult<()> {
        if amount > self.remaining() {
            return Err(VmError::OutOfGasLimit);
        }
        self.consumed = self
            .consumed
            .checked_add(amount)
            .map_err(|_| VmError::GasOverflow)?;
        Ok(())
    }

    /// Consume `amount`, clamping at the limit. Clamping is reported as
    /// [`VmError::OutOfGasLimit`] with the meter left full.
    pub fn consume_capped(&mut self, amount: Uint128) -> VmResult<()> {
        if amount > self.remaining() {
            self.consumed = self.limit;
            return Err(VmError::OutOfGasLimit);
        }
        self.consume(amount)
    }

    /// Cost of the gas consumed so far at `gas_price`
    pub fn calculate_cost(&self, gas_price: Uint128) -> VmResult<Uint128> {
        gas_cost(gas_price, self.consumed)
    }
}
