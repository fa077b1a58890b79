//! Transaction execution engine
//!
//! This crate applies transactions to an account state: gas metering and
//! settlement, value transfer, contract dispatch through a pluggable VM,
//! and read-only local execution.

pub mod account;
pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod gas;
pub mod state;
pub mod vm;

#[cfg(test)]
mod test_utils;

pub use account::Account;
pub use config::VmConfig;
pub use error::{VmError, VmResult};
pub use event::{Event, TransactionEvent, TOPIC_EXECUTE_TX_FAILED, TOPIC_EXECUTE_TX_SUCCESS};
pub use executor::{
    ExecutionContext, ExecutionOutcome, ExecutionStatus, SimulationOutcome, TransactionExecutor,
};
pub use gas::{GasMeter, GasSchedule};
pub use state::{MemoryStateDB, StateDB, StateScope};
pub use vm::{ContractVm, VmCall, VmExecution};
