//! Contract virtual machine interface

use crate::executor::ExecutionContext;
use crate::state::StateDB;
use crate::VmError;
use chain_core::{Address, Hash, TxPayload, Uint128};

/// Arguments for a single contract invocation
#[derive(Debug, Clone)]
pub struct VmCall<'a> {
    /// Decoded Deploy or Call payload
    pub payload: &'a TxPayload,
    /// Hash of the transaction being executed
    pub tx_hash: Hash,
    pub from: Address,
    pub to: Address,
    pub value: Uint128,
    /// Gas left after the base cost
    pub gas_budget: Uint128,
}

/// What the VM reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmExecution {
    /// Gas the VM consumed; may exceed the budget
    pub gas_used: Uint128,
    /// Textual return value of the invoked function
    pub return_value: String,
    /// Set when the contract failed
    pub error: Option<VmError>,
}

impl VmExecution {
    pub fn success(gas_used: Uint128, return_value: impl Into<String>) -> Self {
        Self {
            gas_used,
            return_value: return_value.into(),
            error: None,
        }
    }

    pub fn failure(gas_used: Uint128, error: VmError) -> Self {
        Self {
            gas_used,
            return_value: String::new(),
            error: Some(error),
        }
    }
}

/// Contract execution engine
///
/// The engine may mutate `state` freely. The executor wraps every call in a
/// scope and discards the mutations when `error` is set.
pub trait ContractVm: Send + Sync {
    fn execute(
        &self,
        state: &mut dyn StateDB,
        call: VmCall<'_>,
        context: &ExecutionContext,
    ) -> VmExecution;
}

impl<V: ContractVm + ?Sized> ContractVm for Box<V> {
    fn execute(
        &self,
        state: &mut dyn StateDB,
        call: VmCall<'_>,
        context: &ExecutionContext,
    ) -> VmExecution {
        (**self).execute(state, call, context)
    }
}
