//! # EmpirBus Error Handling
//!
//! This module defines the EmpirBusError enum, which represents the different error
//! types that can occur in the empirbus-rs crate.

use crate::util::hex::HexError;
use thiserror::Error;

/// Represents the different error types that can occur in the EmpirBus crate.
#[derive(Debug, Error)]
pub enum EmpirBusError {
    /// The payload handed to the decoder is not exactly 8 bytes long.
    #[error("Malformed EmpirBus frame: expected 8 bytes, got {len}")]
    MalformedFrame { len: usize },

    /// A dimmer level lies outside 0..=1000 raw (0.0..=1.0 as a ratio).
    #[error("Dimmer {channel} out of range: {value}")]
    OutOfRangeDimmer { channel: usize, value: f64 },

    /// An instance lies outside 0..=49.
    #[error("Instance {0} out of range (0-49)")]
    OutOfRangeInstance(u8),

    /// The payload does not fit the length field of a serial line.
    #[error("Invalid payload length: {0}")]
    InvalidPayloadLength(usize),

    /// A channel index does not exist in the data model.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// An outbound command targets an instance without known state.
    #[error("Unknown instance {0}: no prior state and no default policy")]
    UnknownInstance(u8),

    /// Bytes 0-1 differ from the canonical proprietary header.
    #[error("Unexpected header tag: {found:02x?}")]
    UnexpectedTag { found: [u8; 2] },

    /// The configured data model has no codec.
    #[error("Unsupported data model: {0}")]
    UnsupportedDataModel(u8),

    /// An Actisense serial line could not be parsed.
    #[error("Error parsing serial line: {0}")]
    SerialLineParse(String),

    /// A command request could not be interpreted.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<HexError> for EmpirBusError {
    fn from(err: HexError) -> Self {
        EmpirBusError::SerialLineParse(err.to_string())
    }
}

impl From<std::io::Error> for EmpirBusError {
    fn from(err: std::io::Error) -> Self {
        EmpirBusError::SerialPortError(err.to_string())
    }
}
