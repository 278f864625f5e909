//! # Bridge Configuration
//!
//! JSON configuration for the EmpirBus bridge. Every field is optional; an
//! empty object yields the defaults below.
//!
//! ```json
//! {
//!   "data_model": 2,
//!   "source_address": 0,
//!   "destination": 255,
//!   "unknown_instance": "reject",
//!   "strict_tags": false,
//!   "serial": { "port": "/dev/ttyUSB0", "baudrate": 115200, "timeout_ms": 5000 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actisense::serial::SerialConfig;
use crate::constants::{BROADCAST_ADDRESS, MAX_SOURCE_ADDRESS};
use crate::error::EmpirBusError;
use crate::nxt::data_model::DataModel;

/// What an outbound command does when its instance has no known state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownInstancePolicy {
    /// Fail the command with `UnknownInstance`
    #[default]
    Reject,
    /// Start from a state with every channel off and dimmers at 0
    AssumeOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub data_model: DataModel,
    /// Source address written on outbound lines
    pub source_address: u8,
    /// Destination address written on outbound lines
    pub destination: u8,
    pub unknown_instance: UnknownInstancePolicy,
    /// Reject inbound payloads whose header is not `30 99`
    pub strict_tags: bool,
    pub serial: SerialConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            data_model: DataModel::Model2,
            source_address: 0,
            destination: BROADCAST_ADDRESS,
            unknown_instance: UnknownInstancePolicy::Reject,
            strict_tags: false,
            serial: SerialConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EmpirBusError> {
        let config: BridgeConfig =
            serde_json::from_str(json).map_err(|e| EmpirBusError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EmpirBusError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| EmpirBusError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), EmpirBusError> {
        if !self.data_model.is_supported() {
            return Err(EmpirBusError::UnsupportedDataModel(self.data_model.number()));
        }
        if self.source_address > MAX_SOURCE_ADDRESS {
            return Err(EmpirBusError::ConfigError(format!(
                "source address {} above {MAX_SOURCE_ADDRESS}",
                self.source_address
            )));
        }
        Ok(())
    }
}
