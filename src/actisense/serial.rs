//! # Actisense Serial Communication
//!
//! This module opens the serial port of an Actisense-style NMEA 2000 gateway
//! that speaks the ASCII line format, and splits it into a line reader for
//! the inbound listener and a transport for outbound lines.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{BufReader, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::actisense::transport::WriterTransport;
use crate::constants::ACTISENSE_DEFAULT_BAUDRATE;
use crate::error::EmpirBusError;

/// Configuration for serial connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port path, e.g. `/dev/ttyUSB0`; stdin/stdout are used when unset
    pub port: Option<String>,
    pub baudrate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: None,
            baudrate: ACTISENSE_DEFAULT_BAUDRATE,
            timeout_ms: 5000,
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Buffered inbound side of the gateway
pub type SerialLineReader = BufReader<ReadHalf<SerialStream>>;

/// Outbound side of the gateway
pub type SerialTransport = WriterTransport<WriteHalf<SerialStream>>;

/// Handle to an Actisense gateway on a serial port.
pub struct ActisenseSerial;

impl ActisenseSerial {
    /// Opens `port_name` at 8N1 and splits it into reader and transport.
    pub fn open(
        port_name: &str,
        config: &SerialConfig,
    ) -> Result<(SerialLineReader, SerialTransport), EmpirBusError> {
        let port = tokio_serial::new(port_name, config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(config.timeout())
            .open_native_async()
            .map_err(|e| EmpirBusError::SerialPortError(format!("{port_name}: {e}")))?;

        log::info!("Opened Actisense gateway on {port_name} at {} baud", config.baudrate);

        let (reader, writer) = tokio::io::split(port);
        Ok((BufReader::new(reader), WriterTransport::new(writer)))
    }

    /// Opens the port named in `config`.
    pub fn open_configured(
        config: &SerialConfig,
    ) -> Result<(SerialLineReader, SerialTransport), EmpirBusError> {
        let port = config
            .port
            .as_deref()
            .ok_or_else(|| EmpirBusError::ConfigError("no serial port configured".into()))?;
        Self::open(port, config)
    }
}
