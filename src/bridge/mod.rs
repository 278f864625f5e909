//! # EmpirBus Bridge
//!
//! Glue between the bus and the host framework:
//!
//! - **Inbound**: bus messages for PGN 65280 carrying the EmpirBus
//!   manufacturer code are decoded and turned into one path/value update per
//!   channel. Malformed payloads are logged and dropped.
//! - **Outbound**: a command for one channel is merged into the instance's
//!   last-known state, encoded, wrapped into an Actisense line and handed to
//!   the transport. Failures are returned to the caller and nothing is sent.

pub mod command;
pub mod listener;
pub mod store;
pub mod updates;

use std::sync::Mutex;

use chrono::Utc;

use crate::actisense::format::{format_serial_line, SerialLine};
use crate::actisense::transport::FrameTransport;
use crate::config::{BridgeConfig, UnknownInstancePolicy};
use crate::constants::{EMPIRBUS_MANUFACTURER_CODE, EMPIRBUS_PGN};
use crate::error::EmpirBusError;
use crate::nxt::data_model::FrameCodec;
use crate::nxt::frame::{proprietary_header, ModuleState};
use crate::util::logging::{log_frame_hex, span_frame_processing, suppressed_note, LogThrottle};

pub use command::{Command, RequestedState};
pub use listener::{run_listener, ListenerStats};
pub use store::StateStore;
pub use updates::{ChannelValue, PathValue, StateUpdate};

/// Data field of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawData {
    Bytes(Vec<u8>),
    /// Payload delivered as a number, least significant byte first on the wire
    Integer(u64),
}

impl RawData {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RawData::Bytes(bytes) => bytes.clone(),
            RawData::Integer(value) => value.to_le_bytes().to_vec(),
        }
    }
}

/// A bus message as delivered by the transport's decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub pgn: u32,
    pub manufacturer_code: Option<u16>,
    pub source: u8,
    pub data: RawData,
}

impl InboundMessage {
    /// Builds a message from a parsed Actisense line; the manufacturer code
    /// is read from the proprietary header in bytes 0-1.
    pub fn from_serial_line(line: &SerialLine) -> Self {
        let manufacturer_code = match line.data.as_slice() {
            [b0, b1, ..] => Some(proprietary_header([*b0, *b1]).0),
            _ => None,
        };
        Self {
            pgn: line.pgn,
            manufacturer_code,
            source: line.source,
            data: RawData::Bytes(line.data.clone()),
        }
    }

    /// PGN 65280 with the EmpirBus manufacturer code
    pub fn is_empirbus(&self) -> bool {
        self.pgn == EMPIRBUS_PGN && self.manufacturer_code == Some(EMPIRBUS_MANUFACTURER_CODE)
    }
}

/// Result of handling one inbound message
#[derive(Debug)]
pub enum InboundOutcome {
    /// Not an EmpirBus message
    Ignored,
    /// EmpirBus message whose payload failed to decode
    Dropped(EmpirBusError),
    Published(StateUpdate),
}

impl InboundOutcome {
    pub fn into_update(self) -> Option<StateUpdate> {
        match self {
            InboundOutcome::Published(update) => Some(update),
            _ => None,
        }
    }
}

pub struct Bridge<T> {
    config: BridgeConfig,
    codec: Box<dyn FrameCodec>,
    store: StateStore,
    transport: T,
    malformed_log: Mutex<LogThrottle>,
}

impl<T: FrameTransport> Bridge<T> {
    pub fn new(config: BridgeConfig, transport: T) -> Result<Self, EmpirBusError> {
        config.validate()?;
        let codec = config.data_model.codec(config.strict_tags)?;
        Ok(Self {
            config,
            codec,
            store: StateStore::new(),
            transport,
            malformed_log: Mutex::new(LogThrottle::default()),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Filters, decodes and publishes one inbound message.
    ///
    /// Never fails: a malformed payload is logged (rate limited) and
    /// reported as `Dropped`.
    pub async fn handle_inbound(&self, msg: &InboundMessage) -> InboundOutcome {
        if !msg.is_empirbus() {
            return InboundOutcome::Ignored;
        }

        let payload = msg.data.to_bytes();
        let state = match self.decode_payload(&payload) {
            Ok(state) => state,
            Err(err) => {
                self.warn_malformed(msg.source, &payload, &err);
                return InboundOutcome::Dropped(err);
            }
        };

        if let Err(err) = self.store.record(state).await {
            return InboundOutcome::Dropped(err);
        }

        log::debug!(
            "Instance {} from source {}: dimmers {:?}, switches {:02x}",
            state.instance,
            msg.source,
            state.dimmers,
            state.switch_bits().bits()
        );
        InboundOutcome::Published(StateUpdate::from_state(&state, Utc::now()))
    }

    /// Applies one command and transmits the resulting frame.
    ///
    /// Returns the line handed to the transport. The merged state becomes
    /// the instance's last-known state only once the transport accepted it.
    pub async fn handle_command(&self, cmd: &Command) -> Result<String, EmpirBusError> {
        let mut slot = self.store.lock(cmd.instance).await?;

        let base = match (slot.current(), self.config.unknown_instance) {
            (Some(state), _) => state,
            (None, UnknownInstancePolicy::AssumeOff) => ModuleState::new(cmd.instance)?,
            (None, UnknownInstancePolicy::Reject) => {
                return Err(EmpirBusError::UnknownInstance(cmd.instance));
            }
        };

        let next = cmd.apply(base)?;
        let line = self.format_state(&next)?;

        self.transport.send_line(&line).await?;
        slot.commit(next);

        log::info!(
            "Instance {}: {} set to {}",
            cmd.instance,
            cmd.channel,
            cmd.state
        );
        Ok(line)
    }

    /// Encodes a full state into an outbound Actisense line
    pub fn format_state(&self, state: &ModuleState) -> Result<String, EmpirBusError> {
        let _span = span_frame_processing("outbound", Some(state.instance));
        let payload = self.codec.encode(state)?;
        log_frame_hex("Outbound payload", &payload);
        format_serial_line(
            EMPIRBUS_PGN,
            &payload,
            self.config.source_address,
            Some(self.config.destination),
            Utc::now(),
        )
    }

    fn decode_payload(&self, payload: &[u8]) -> Result<ModuleState, EmpirBusError> {
        let _span = span_frame_processing("inbound", payload.get(2).copied());
        log_frame_hex("Inbound payload", payload);
        self.codec.decode(payload)
    }

    fn warn_malformed(&self, source: u8, payload: &[u8], err: &EmpirBusError) {
        let Ok(mut throttle) = self.malformed_log.lock() else {
            return;
        };
        if let Some(suppressed) = throttle.admit() {
            log::warn!(
                "Dropping EmpirBus frame from source {source} ({} bytes): {err}{}",
                payload.len(),
                suppressed_note(suppressed)
            );
        }
    }
}
