//! Executor configuration

use crate::gas::GasSchedule;
use crate::{VmError, VmResult};
use chain_core::ChainId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Chain id used when none is configured
pub const DEFAULT_CHAIN_ID: ChainId = 1;

/// Transaction executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Chain id transactions must be bound to
    pub chain_id: ChainId,
    /// Base gas costs
    pub gas: GasSchedule,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            gas: GasSchedule::default(),
        }
    }
}

impl VmConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(toml_str: &str) -> VmResult<Self> {
        let config: VmConfig = toml::from_str(toml_str)
            .map_err(|e| VmError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> VmResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| VmError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> VmResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| VmError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> VmResult<()> {
        let content = self.to_toml()?;
        fs::write(path.as_ref(), content)
            .map_err(|e| VmError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> VmResult<()> {
        if self.chain_id == 0 {
            return Err(VmError::Config(
                "Chain id must be greater than 0".to_string(),
            ));
        }

        if self.gas.min_gas_per_transaction.is_zero() {
            return Err(VmError::Config(
                "Minimum gas per transaction must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
