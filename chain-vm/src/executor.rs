//! Transaction execution engine

use crate::config::VmConfig;
use crate::event::{Event, TransactionEvent};
use crate::gas::{gas_cost, GasMeter};
use crate::state::{StateDB, StateScope};
use crate::vm::{ContractVm, VmCall};
use crate::{VmError, VmResult};
use chain_core::{Address, BlockNumber, CoreError, Timestamp, Transaction, TxPayload, Uint128};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Transaction execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Block number
    pub block_number: BlockNumber,
    /// Block timestamp
    pub timestamp: Timestamp,
    /// Account credited with gas fees
    pub coinbase: Address,
}

impl ExecutionContext {
    pub fn new(block_number: BlockNumber, timestamp: Timestamp, coinbase: Address) -> Self {
        Self {
            block_number,
            timestamp,
            coinbase,
        }
    }
}

/// How an execution attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Executed, gas charged and value moved
    Success,
    /// Executed and gas charged, but every other effect discarded
    FailedButCharged,
    /// Never executed; no balance changed
    RejectedUncharged,
}

/// Result of [`TransactionExecutor::verify_execution`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    /// Gas charged to the sender
    pub gas_used: Uint128,
    /// Return value of the contract function, empty for transfers
    pub return_value: String,
    /// Why the transaction failed or was rejected
    pub error: Option<VmError>,
    /// Events recorded for the transaction by this execution
    pub events: Vec<Event>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// The outcome's error as a `Result`
    pub fn result(&self) -> Result<(), &VmError> {
        match &self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Result of [`TransactionExecutor::local_execution`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub gas_used: Uint128,
    pub return_value: String,
    pub error: Option<VmError>,
}

impl SimulationOutcome {
    fn failure(gas_used: Uint128, error: VmError) -> Self {
        Self {
            gas_used,
            return_value: String::new(),
            error: Some(error),
        }
    }
}

/// Main transaction executor
pub struct TransactionExecutor<V> {
    config: VmConfig,
    vm: V,
}

impl<V: ContractVm> TransactionExecutor<V> {
    /// Create new transaction executor
    pub fn new(config: VmConfig, vm: V) -> Self {
        Self { config, vm }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Gas charged before any contract code runs
    pub fn tx_base_gas(&self, tx: &Transaction) -> VmResult<Uint128> {
        self.config.gas.tx_base_gas(tx)
    }

    /// Admission check against the configured chain
    pub fn validate_transaction(&self, tx: &Transaction) -> VmResult<()> {
        tx.verify_integrity(self.config.chain_id)?;
        Ok(())
    }

    /// Apply a transaction to `state`.
    ///
    /// Rejections and charged failures are reported through the outcome and
    /// leave exactly the effects their status allows. `Err` is returned only
    /// for fatal errors, after which the caller must discard its scope.
    pub fn verify_execution(
        &self,
        tx: &Transaction,
        state: &mut dyn StateDB,
        context: &ExecutionContext,
    ) -> VmResult<ExecutionOutcome> {
        debug!(
            "Executing transaction {} from {} to {} at block {}",
            tx.hash, tx.from, tx.to, context.block_number
        );

        if let Err(e) = self.validate_transaction(tx) {
            return self.reject(tx, state, e);
        }

        let sender = state.get_or_create_user_account(&tx.from)?;

        let base_gas = self.tx_base_gas(tx)?;
        if base_gas > tx.gas_limit {
            return self.reject(tx, state, VmError::OutOfGasLimit);
        }
        let mut meter = GasMeter::new(tx.gas_limit);
        meter.consume(base_gas)?;

        let max_fee = gas_cost(tx.gas_price, tx.gas_limit)?;
        if sender.balance() < max_fee {
            return self.reject(tx, state, VmError::InsufficientBalance);
        }

        let mut scope = StateScope::begin(&mut *state)?;

        let (return_value, mut error) = match tx.load_payload() {
            Ok(payload) => self.run_contract(tx, &payload, &mut *scope, &mut meter, context),
            Err(e) => (String::new(), Some(payload_error(e))),
        };
        if let Some(err) = error.as_ref().filter(|e| e.is_fatal()) {
            return Err(err.clone());
        }

        let gas_used = meter.consumed();
        let fee = gas_cost(tx.gas_price, gas_used)?;

        if error.is_none() {
            settle_gas(&mut *scope, tx, context, fee)?;
            let balance = scope.get_or_create_user_account(&tx.from)?.balance();
            if balance >= tx.value {
                scope.sub_balance(&tx.from, tx.value)?;
                scope.add_balance(&tx.to, tx.value)?;
                scope.commit()?;
            } else {
                debug!(
                    "Sender {} holds {} after gas, cannot move {}",
                    tx.from, balance, tx.value
                );
                error = Some(VmError::InsufficientBalance);
                scope.rollback()?;
            }
        } else {
            scope.rollback()?;
        }

        // Failed executions still pay for the gas they burned
        if error.is_some() {
            settle_gas(state, tx, context, fee)?;
        }

        let status = if error.is_none() {
            info!("Transaction {} executed, gas used {}", tx.hash, gas_used);
            ExecutionStatus::Success
        } else {
            warn!(
                "Transaction {} failed after charging {} gas: {}",
                tx.hash,
                gas_used,
                error.as_ref().map(ToString::to_string).unwrap_or_default()
            );
            ExecutionStatus::FailedButCharged
        };

        self.finish(tx, state, status, gas_used, return_value, error)
    }

    /// Run a transaction without keeping any of its effects.
    ///
    /// No signature is required and no gas is settled. Whatever the contract
    /// does to `state` is rolled back before returning.
    pub fn local_execution(
        &self,
        tx: &Transaction,
        state: &mut dyn StateDB,
        context: &ExecutionContext,
    ) -> VmResult<SimulationOutcome> {
        let payload = match tx.load_payload() {
            Ok(payload) => payload,
            Err(e) => return Ok(SimulationOutcome::failure(Uint128::ZERO, payload_error(e))),
        };

        let base_gas = self.tx_base_gas(tx)?;
        if base_gas > tx.gas_limit {
            return Ok(SimulationOutcome::failure(base_gas, VmError::OutOfGasLimit));
        }
        let mut meter = GasMeter::new(tx.gas_limit);
        meter.consume(base_gas)?;

        let mut scope = StateScope::begin(&mut *state)?;
        scope.get_or_create_user_account(&tx.from)?;
        let (return_value, error) =
            self.run_contract(tx, &payload, &mut *scope, &mut meter, context);
        scope.rollback()?;

        if let Some(err) = error.as_ref().filter(|e| e.is_fatal()) {
            return Err(err.clone());
        }

        debug!(
            "Simulated transaction {}: gas {}, error {:?}",
            tx.hash,
            meter.consumed(),
            error
        );
        Ok(SimulationOutcome {
            gas_used: meter.consumed(),
            return_value,
            error,
        })
    }

    // Invokes the VM for contract payloads and meters what it reports
    fn run_contract(
        &self,
        tx: &Transaction,
        payload: &TxPayload,
        state: &mut dyn StateDB,
        meter: &mut GasMeter,
        context: &ExecutionContext,
    ) -> (String, Option<VmError>) {
        if !payload.payload_type().is_contract() {
            return (String::new(), None);
        }

        let call = VmCall {
            payload,
            tx_hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            gas_budget: meter.remaining(),
        };
        let execution = self.vm.execute(state, call, context);
        debug!(
            "VM ran {} payload of {}: gas {}",
            payload.payload_type(),
            tx.hash,
            execution.gas_used
        );

        match meter.consume_capped(execution.gas_used) {
            Ok(()) => (execution.return_value, execution.error),
            Err(e) => (String::new(), Some(e)),
        }
    }

    fn reject(
        &self,
        tx: &Transaction,
        state: &mut dyn StateDB,
        error: impl Into<VmError>,
    ) -> VmResult<ExecutionOutcome> {
        let error = error.into();
        warn!("Rejected transaction {}: {}", tx.hash, error);
        self.finish(
            tx,
            state,
            ExecutionStatus::RejectedUncharged,
            Uint128::ZERO,
            String::new(),
            Some(error),
        )
    }

    fn finish(
        &self,
        tx: &Transaction,
        state: &mut dyn StateDB,
        status: ExecutionStatus,
        gas_used: Uint128,
        return_value: String,
        error: Option<VmError>,
    ) -> VmResult<ExecutionOutcome> {
        let event = TransactionEvent::new(&tx.hash, gas_used, error.as_ref()).into_event()?;
        state.record_event(tx.hash, event.clone())?;

        Ok(ExecutionOutcome {
            status,
            gas_used,
            return_value,
            error,
            events: vec![event],
        })
    }
}

// Moves the fee from the sender to the coinbase
fn settle_gas(
    state: &mut dyn StateDB,
    tx: &Transaction,
    context: &ExecutionContext,
    fee: Uint128,
) -> VmResult<()> {
    state.sub_balance(&tx.from, fee).map_err(|e| match e {
        VmError::InsufficientBalance => VmError::State(format!(
            "sender {} cannot cover {} of settled gas",
            tx.from, fee
        )),
        other => other,
    })?;
    state.add_balance(&context.coinbase, fee)
}

fn payload_error(err: CoreError) -> VmError {
    match err {
        CoreError::InvalidPayload(msg) => VmError::InvalidPayload(msg),
        other => VmError::InvalidPayload(other.to_string()),
    }
}
