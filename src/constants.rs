//! EmpirBus NXT Protocol Constants
//!
//! This module defines constants used by the EmpirBus NXT proprietary PGN,
//! based on the EmpirBus "Application Specific PGN Data Model 2" and the
//! NMEA 2000 proprietary single-frame PGN layout.

/// NMEA 2000 proprietary PGN 65280 (single frame, global destination)
pub const EMPIRBUS_PGN: u32 = 65280;

/// EmpirBus manufacturer code from the NMEA 2000 registration list
pub const EMPIRBUS_MANUFACTURER_CODE: u16 = 304;

/// Industry group code for marine equipment
pub const MARINE_INDUSTRY_CODE: u8 = 4;

/// Reserved bits of the proprietary header, always transmitted as ones
pub const PROPRIETARY_RESERVED_BITS: u16 = 0b11;

// ----------------------------------------------------------------------------
// Proprietary header bit layout (little-endian u16)
// ----------------------------------------------------------------------------

pub const MANUFACTURER_CODE_MASK: u16 = 0x07FF;
pub const RESERVED_SHIFT: u16 = 11;
pub const INDUSTRY_CODE_SHIFT: u16 = 13;
pub const INDUSTRY_CODE_MASK: u16 = 0x07;

/// Proprietary header word: manufacturer 304, reserved 0b11, industry 4
pub const PROPRIETARY_HEADER: u16 = EMPIRBUS_MANUFACTURER_CODE
    | (PROPRIETARY_RESERVED_BITS << RESERVED_SHIFT)
    | ((MARINE_INDUSTRY_CODE as u16) << INDUSTRY_CODE_SHIFT);

/// Canonical tag bytes 0-1 of every EmpirBus payload (`30 99`)
pub const EMPIRBUS_TAG: [u8; 2] = PROPRIETARY_HEADER.to_le_bytes();

// ----------------------------------------------------------------------------
// Data Model 2 payload layout
// ----------------------------------------------------------------------------

/// Payload length of a single-frame EmpirBus message
pub const EMPIRBUS_PAYLOAD_LEN: usize = 8;

/// Offsets inside the payload
pub const OFFSET_INSTANCE: usize = 2;
pub const OFFSET_DIMMER_0: usize = 3;
pub const OFFSET_DIMMER_1: usize = 5;
pub const OFFSET_SWITCHES: usize = 7;

/// Highest addressable NXT component instance
pub const MAX_INSTANCE: u8 = 49;

/// Number of addressable instances (0..=49)
pub const INSTANCE_COUNT: usize = MAX_INSTANCE as usize + 1;

/// Dimmer channels per instance in Data Model 2
pub const DIMMER_COUNT: usize = 2;

/// Switch channels per instance in Data Model 2
pub const SWITCH_COUNT: usize = 8;

/// Raw dimmer value representing 100%
pub const DIMMER_FULL_SCALE: u16 = 1000;

// ----------------------------------------------------------------------------
// Actisense serial format
// ----------------------------------------------------------------------------

/// Priority written on every outbound line
pub const ACTISENSE_PRIORITY: u8 = 2;

/// NMEA 2000 global (broadcast) destination address
pub const BROADCAST_ADDRESS: u8 = 255;

/// Highest unicast source address a node may claim
pub const MAX_SOURCE_ADDRESS: u8 = 252;

/// Default baudrate of Actisense NGT-1 style gateways
pub const ACTISENSE_DEFAULT_BAUDRATE: u32 = 115_200;

/// Root of the published key path
pub const PATH_ROOT: &str = "electrical.empirBusNxt";
