//! Execution events

use crate::{VmError, VmResult};
use chain_core::{Hash, Uint128};
use serde::{Deserialize, Serialize};

/// Topic of the event emitted when a transaction executes successfully
pub const TOPIC_EXECUTE_TX_SUCCESS: &str = "chain.executeTxSuccess";

/// Topic of the event emitted when a transaction is rejected or fails
pub const TOPIC_EXECUTE_TX_FAILED: &str = "chain.executeTxFailed";

/// Event record attached to a transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub data: Vec<u8>,
}

impl Event {
    pub fn new(topic: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            data,
        }
    }
}

/// JSON body of the execute-tx events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Hex transaction hash
    pub hash: String,
    /// 1 on success, 0 otherwise
    pub status: u8,
    /// Gas charged for the execution
    pub gas_used: Uint128,
    /// Error message, empty on success
    pub error: String,
}

impl TransactionEvent {
    pub fn new(tx_hash: &Hash, gas_used: Uint128, error: Option<&VmError>) -> Self {
        Self {
            hash: tx_hash.to_hex(),
            status: u8::from(error.is_none()),
            gas_used,
            error: error.map(ToString::to_string).unwrap_or_default(),
        }
    }

    /// Wrap into an event under the topic matching the status
    pub fn into_event(self) -> VmResult<Event> {
        let topic = if self.status == 1 {
            TOPIC_EXECUTE_TX_SUCCESS
        } else {
            TOPIC_EXECUTE_TX_FAILED
        };
        Ok(Event::new(topic, serde_json::to_vec(&self)?))
    }

    /// Parse the body of an execute-tx event
    pub fn from_event(event: &Event) -> VmResult<Self> {
        Ok(serde_json::from_slice(&event.data)?)
    }
}
