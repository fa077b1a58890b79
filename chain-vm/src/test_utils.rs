//! Scripted contract VM and transaction fixtures for executor tests

use crate::account::Account;
use crate::config::VmConfig;
use crate::executor::{ExecutionContext, TransactionExecutor};
use crate::state::{MemoryStateDB, StateDB};
use crate::vm::{ContractVm, VmCall, VmExecution};
use crate::VmError;
use chain_core::{
    Address, CallPayload, ChainId, DeployPayload, Secp256k1Signer, Signer, Transaction, TxPayload,
    Uint128, DEFAULT_GAS_PRICE, MAX_GAS,
};

pub(crate) const CHAIN_ID: ChainId = 1;

pub(crate) const FUNDS: Uint128 = Uint128::new(1_000_000_000_000_000_000);

pub(crate) const DEPLOY_GAS: Uint128 = Uint128::new(1232);
pub(crate) const MISSING_CONTRACT_GAS: Uint128 = Uint128::new(36);
pub(crate) const READ_GAS: Uint128 = Uint128::new(36);
pub(crate) const FAILED_CALL_GAS: Uint128 = Uint128::new(29);

/// VM with canned behaviour per function name
///
/// - deploy stores the source as code at `to`
/// - `totalSupply` returns a constant
/// - `burnGas` reports more gas than its budget
/// - `writeThenFail` credits `to` and then fails
pub(crate) struct ScriptedVm;

impl ContractVm for ScriptedVm {
    fn execute(
        &self,
        state: &mut dyn StateDB,
        call: VmCall<'_>,
        _context: &ExecutionContext,
    ) -> VmExecution {
        match call.payload {
            TxPayload::Deploy(deploy) => {
                match state.set_code(call.to, deploy.source.clone().into_bytes()) {
                    Ok(()) => VmExecution::success(DEPLOY_GAS, "undefined"),
                    Err(e) => VmExecution::failure(DEPLOY_GAS, e),
                }
            }
            TxPayload::Call(call_payload) => {
                match state.get_code(&call.to) {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        return VmExecution::failure(
                            MISSING_CONTRACT_GAS,
                            VmError::AccountNotFound(call.to),
                        )
                    }
                    Err(e) => return VmExecution::failure(Uint128::ZERO, e),
                }

                match call_payload.function.as_str() {
                    "totalSupply" => VmExecution::success(READ_GAS, "1000000000"),
                    "burnGas" => {
                        let burned = call
                            .gas_budget
                            .checked_add(Uint128::new(1000))
                            .unwrap_or(Uint128::MAX);
                        VmExecution::success(burned, "")
                    }
                    "writeThenFail" => {
                        if let Err(e) = state.add_balance(&call.to, Uint128::new(5)) {
                            return VmExecution::failure(FAILED_CALL_GAS, e);
                        }
                        VmExecution::failure(
                            FAILED_CALL_GAS,
                            VmError::ContractExecution("revert after write".to_string()),
                        )
                    }
                    other => VmExecution::failure(
                        FAILED_CALL_GAS,
                        VmError::ContractExecution(format!("function not found: {}", other)),
                    ),
                }
            }
            TxPayload::Binary(_) => VmExecution::failure(
                Uint128::ZERO,
                VmError::InvalidPayload("binary payload reached the VM".to_string()),
            ),
        }
    }
}

pub(crate) fn coinbase() -> Address {
    Address::new([0xcb; 20])
}

pub(crate) fn context() -> ExecutionContext {
    ExecutionContext::new(1, 0, coinbase())
}

pub(crate) fn executor() -> TransactionExecutor<ScriptedVm> {
    TransactionExecutor::new(VmConfig::default(), ScriptedVm)
}

pub(crate) fn funded_state(balances: &[(Address, Uint128)]) -> MemoryStateDB {
    MemoryStateDB::with_accounts(
        balances
            .iter()
            .map(|(address, balance)| Account::with_balance(*address, *balance)),
    )
}

fn signed(signer: &Secp256k1Signer, mut tx: Transaction) -> Transaction {
    tx.sign(signer).unwrap();
    tx
}

pub(crate) fn mock_normal_tx(signer: &Secp256k1Signer, to: Address, value: Uint128) -> Transaction {
    let tx = Transaction::transfer(
        CHAIN_ID,
        signer.address(),
        to,
        value,
        1,
        DEFAULT_GAS_PRICE,
        MAX_GAS,
    )
    .unwrap();
    signed(signer, tx)
}

pub(crate) fn mock_deploy_tx(
    signer: &Secp256k1Signer,
    contract: Address,
    value: Uint128,
) -> Transaction {
    let payload = DeployPayload::new(
        "'use strict'; var Token = function() {}; module.exports = Token;",
        "js",
        "[\"NAS\", 1000000000]",
    )
    .unwrap();
    let tx = Transaction::with_payload(
        CHAIN_ID,
        signer.address(),
        contract,
        value,
        1,
        payload,
        DEFAULT_GAS_PRICE,
        MAX_GAS,
    )
    .unwrap();
    signed(signer, tx)
}

pub(crate) fn mock_call_tx(
    signer: &Secp256k1Signer,
    contract: Address,
    function: &str,
    value: Uint128,
) -> Transaction {
    let payload = CallPayload::new(function, "").unwrap();
    let tx = Transaction::with_payload(
        CHAIN_ID,
        signer.address(),
        contract,
        value,
        2,
        payload,
        DEFAULT_GAS_PRICE,
        MAX_GAS,
    )
    .unwrap();
    signed(signer, tx)
}
