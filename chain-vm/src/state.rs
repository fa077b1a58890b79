//! Account state view and transactional scopes

use crate::account::Account;
use crate::event::Event;
use crate::{VmError, VmResult};
use chain_core::{Address, Hash, Uint128};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// State database trait
///
/// Scopes nest: every `begin` must be matched by exactly one `commit` or
/// `rollback`, and a rollback discards every mutation made since the matching
/// `begin`, events included.
pub trait StateDB: Send + Sync {
    /// Get account by address
    fn get_account(&self, address: &Address) -> VmResult<Option<Account>>;

    /// Store account
    fn set_account(&mut self, account: Account) -> VmResult<()>;

    /// Get contract code
    fn get_code(&self, address: &Address) -> VmResult<Option<Vec<u8>>>;

    /// Set contract code
    fn set_code(&mut self, address: Address, code: Vec<u8>) -> VmResult<()>;

    /// Open a mutation scope
    fn begin(&mut self) -> VmResult<()>;

    /// Keep the mutations of the innermost scope
    fn commit(&mut self) -> VmResult<()>;

    /// Discard the mutations of the innermost scope
    fn rollback(&mut self) -> VmResult<()>;

    /// Append an event to a transaction's event log
    fn record_event(&mut self, tx_hash: Hash, event: Event) -> VmResult<()>;

    /// Events recorded for a transaction, in emission order
    fn fetch_events(&self, tx_hash: &Hash) -> VmResult<Vec<Event>>;

    /// Get an account, creating an empty one if it does not exist yet
    fn get_or_create_user_account(&mut self, address: &Address) -> VmResult<Account> {
        match self.get_account(address)? {
            Some(account) => Ok(account),
            None => {
                let account = Account::new(*address);
                self.set_account(account.clone())?;
                Ok(account)
            }
        }
    }

    /// Credit an account
    fn add_balance(&mut self, address: &Address, amount: Uint128) -> VmResult<()> {
        let mut account = self.get_or_create_user_account(address)?;
        account.add_balance(amount)?;
        self.set_account(account)
    }

    /// Debit an account, failing with [`VmError::InsufficientBalance`]
    fn sub_balance(&mut self, address: &Address, amount: Uint128) -> VmResult<()> {
        let mut account = self.get_or_create_user_account(address)?;
        account.sub_balance(amount)?;
        self.set_account(account)
    }
}

/// Guard over a [`StateDB`] scope that rolls back on drop unless committed
pub struct StateScope<'a, S: StateDB + ?Sized> {
    state: &'a mut S,
    open: bool,
}

impl<'a, S: StateDB + ?Sized> StateScope<'a, S> {
    /// Open a scope on `state`
    pub fn begin(state: &'a mut S) -> VmResult<Self> {
        state.begin()?;
        Ok(Self { state, open: true })
    }

    /// Keep the scope's mutations
    pub fn commit(mut self) -> VmResult<()> {
        self.open = false;
        self.state.commit()
    }

    /// Discard the scope's mutations
    pub fn rollback(mut self) -> VmResult<()> {
        self.open = false;
        self.state.rollback()
    }
}

impl<S: StateDB + ?Sized> Deref for StateScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.state
    }
}

impl<S: StateDB + ?Sized> DerefMut for StateScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.state
    }
}

impl<S: StateDB + ?Sized> Drop for StateScope<'_, S> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.state.rollback() {
                warn!("Failed to roll back dropped state scope: {}", e);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct StateLayer {
    accounts: BTreeMap<Address, Account>,
    code: HashMap<Address, Vec<u8>>,
    events: HashMap<Hash, Vec<Event>>,
}

/// In-memory state database implementation
///
/// Each open scope keeps a full copy of the state taken at `begin`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateDB {
    current: StateLayer,
    checkpoints: Vec<StateLayer>,
}

impl MemoryStateDB {
    /// Create new memory state DB
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut db = Self::new();
        for account in accounts {
            db.current.accounts.insert(account.address, account);
        }
        db
    }

    /// Number of open scopes
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Digest of all accounts and code, for comparing two states
    pub fn state_root(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();

        for (address, account) in &self.current.accounts {
            hasher.update(address.as_bytes());
            hasher.update(&account.nonce.to_le_bytes());
            hasher.update(&account.balance.to_be_bytes());
        }

        // Sort code entries for deterministic hashing
        let mut code: Vec<_> = self.current.code.iter().collect();
        code.sort_by_key(|(addr, _)| *addr);
        for (address, bytes) in code {
            hasher.update(address.as_bytes());
            hasher.update(Hash::keccak(bytes).as_bytes());
        }

        Hash::new(*hasher.finalize().as_bytes())
    }
}

impl StateDB for MemoryStateDB {
    fn get_account(&self, address: &Address) -> VmResult<Option<Account>> {
        Ok(self.current.accounts.get(address).cloned())
    }

    fn set_account(&mut self, account: Account) -> VmResult<()> {
        self.current.accounts.insert(account.address, account);
        Ok(())
    }

    fn get_code(&self, address: &Address) -> VmResult<Option<Vec<u8>>> {
        Ok(self.current.code.get(address).cloned())
    }

    fn set_code(&mut self, address: Address, code: Vec<u8>) -> VmResult<()> {
        if code.is_empty() {
            self.current.code.remove(&address);
        } else {
            self.current.code.insert(address, code);
        }
        Ok(())
    }

    fn begin(&mut self) -> VmResult<()> {
        self.checkpoints.push(self.current.clone());
        debug!("State scope opened at depth {}", self.checkpoints.len());
        Ok(())
    }

    fn commit(&mut self) -> VmResult<()> {
        self.checkpoints
            .pop()
            .ok_or_else(|| VmError::State("commit without open scope".to_string()))?;
        Ok(())
    }

    fn rollback(&mut self) -> VmResult<()> {
        self.current = self
            .checkpoints
            .pop()
            .ok_or_else(|| VmError::State("rollback without open scope".to_string()))?;
        Ok(())
    }

    fn record_event(&mut self, tx_hash: Hash, event: Event) -> VmResult<()> {
        self.current.events.entry(tx_hash).or_default().push(event);
        Ok(())
    }

    fn fetch_events(&self, tx_hash: &Hash) -> VmResult<Vec<Event>> {
        Ok(self.current.events.get(tx_hash).cloned().unwrap_or_default())
    }
}
