//! Account model

use crate::{VmError, VmResult};
use chain_core::{Address, Nonce, Uint128};
use serde::{Deserialize, Serialize};

/// Account information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address
    pub address: Address,
    /// Account balance
    pub balance: Uint128,
    /// Account nonce (number of transactions sent)
    pub nonce: Nonce,
}

impl Account {
    /// Create a new empty account
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: Uint128::ZERO,
            nonce: 0,
        }
    }

    /// Create an account with initial balance
    pub fn with_balance(address: Address, balance: Uint128) -> Self {
        Self {
            address,
            balance,
            nonce: 0,
        }
    }

    /// Current balance
    pub fn balance(&self) -> Uint128 {
        self.balance
    }

    /// Check if account is empty
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero()
    }

    /// Add to balance
    pub fn add_balance(&mut self, amount: Uint128) -> VmResult<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .map_err(|_| VmError::BalanceOverflow)?;
        Ok(())
    }

    /// Subtract from balance
    pub fn sub_balance(&mut self, amount: Uint128) -> VmResult<()> {
        if self.balance < amount {
            return Err(VmError::InsufficientBalance);
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .map_err(|_| VmError::InsufficientBalance)?;
        Ok(())
    }
}
