//! # empirbus-rs - A Rust Crate for EmpirBus NXT Switch and Dimmer Control
//!
//! The empirbus-rs crate implements the proprietary NMEA 2000 PGN 65280 used by
//! EmpirBus NXT marine electrical control modules. Each message carries, for one
//! module instance (0-49), the on/off state of 8 switch channels and the level of
//! 2 dimmer channels ("Application Specific PGN Data Model 2").
//!
//! ## Features
//!
//! - Decode and encode the 8-byte EmpirBus payload
//! - Format and parse the Actisense ASCII serial line used by bus tooling
//! - Publish decoded channels as `electrical.empirBusNxt.<instance>...` path/value updates
//! - Merge single-channel commands into the last-known state of an instance and transmit them
//! - Talk to an Actisense gateway over a serial port
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```rust
//! use empirbus_rs::{decode, encode, format_serial_line, EMPIRBUS_PGN};
//!
//! let payload = [0x30, 0x99, 0x07, 0xF4, 0x01, 0x00, 0x00, 0x05];
//! let state = decode(&payload).unwrap();
//! assert_eq!(state.instance, 7);
//! assert_eq!(state.switches[2], true);
//!
//! let bytes = encode(&state).unwrap();
//! let line = format_serial_line(EMPIRBUS_PGN, &bytes, 0, None, chrono::Utc::now()).unwrap();
//! assert!(line.ends_with(",2,65280,0,255,8,30,99,07,f4,01,00,00,05"));
//! ```

pub mod actisense;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod nxt;
pub mod util;

pub use crate::error::EmpirBusError;
pub use crate::logging::init_logger;

// Wire format
pub use constants::{BROADCAST_ADDRESS, EMPIRBUS_MANUFACTURER_CODE, EMPIRBUS_PGN};
pub use nxt::{decode, decode_strict, encode, ChannelId, DataModel, FrameCodec, ModuleState, SwitchState};

// Actisense serial format
pub use actisense::{format_serial_line, ActisenseSerial, FrameTransport, SerialConfig, SerialLine, WriterTransport};

// Bridge
pub use bridge::{Bridge, Command, InboundMessage, InboundOutcome, RawData, StateUpdate};
pub use config::{BridgeConfig, UnknownInstancePolicy};
