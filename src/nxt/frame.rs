//! # EmpirBus NXT Frame Codec
//!
//! This module decodes and encodes the 8-byte payload of the EmpirBus
//! proprietary PGN 65280 ("Application Specific PGN Data Model 2").
//! It leverages the `nom` crate for parsing and `bytes` for packing.
//!
//! ## Wire layout
//!
//! | Byte | Content                                          |
//! |------|--------------------------------------------------|
//! | 0-1  | Proprietary header, always `30 99`               |
//! | 2    | Instance 0..49                                   |
//! | 3-4  | Dimmer 0, u16 little-endian, 0..1000             |
//! | 5-6  | Dimmer 1, u16 little-endian, 0..1000             |
//! | 7    | Switches, bit *i* = channel *i*, bit 0 is LSB    |
//!
//! ## Usage
//!
//! ```rust
//! use empirbus_rs::nxt::frame::{decode, encode};
//!
//! let payload = [0x30, 0x99, 0x07, 0xF4, 0x01, 0x00, 0x00, 0x05];
//! let state = decode(&payload).unwrap();
//! assert_eq!(state.instance, 7);
//! assert_eq!(state.dimmer_ratio(0), Some(0.5));
//! assert_eq!(encode(&state).unwrap(), payload);
//! ```

use bytes::BufMut;
use nom::{
    bytes::complete::take,
    number::complete::{be_u8, le_u16},
    IResult,
};

use crate::constants::{
    DIMMER_COUNT, DIMMER_FULL_SCALE, EMPIRBUS_PAYLOAD_LEN, EMPIRBUS_TAG, INDUSTRY_CODE_MASK,
    INDUSTRY_CODE_SHIFT, MANUFACTURER_CODE_MASK, MAX_INSTANCE, SWITCH_COUNT,
};
use crate::error::EmpirBusError;
use crate::nxt::channels::{ratio_to_raw, raw_to_ratio, ChannelId, ChannelKind, SwitchBits};

/// Decoded state of one NXT module instance.
///
/// Dimmer levels are kept as raw wire values (0..=1000) so that a decode and
/// re-encode never loses precision; `dimmer_ratio` gives the 0.0..=1.0 view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleState {
    pub instance: u8,
    pub dimmers: [u16; DIMMER_COUNT],
    pub switches: [bool; SWITCH_COUNT],
}

impl ModuleState {
    /// All channels off, dimmers at 0
    pub fn new(instance: u8) -> Result<Self, EmpirBusError> {
        validate_instance(instance)?;
        Ok(Self {
            instance,
            dimmers: [0; DIMMER_COUNT],
            switches: [false; SWITCH_COUNT],
        })
    }

    /// Dimmer level as a ratio, `None` for a channel that does not exist
    pub fn dimmer_ratio(&self, channel: usize) -> Option<f64> {
        self.dimmers.get(channel).copied().map(raw_to_ratio)
    }

    /// Copy of this state with one dimmer set from a ratio
    pub fn with_dimmer_ratio(mut self, channel: usize, ratio: f64) -> Result<Self, EmpirBusError> {
        let id = ChannelId::dimmer(channel)?;
        self.dimmers[id.index()] = ratio_to_raw(channel, ratio)?;
        Ok(self)
    }

    /// Copy of this state with one switch set
    pub fn with_switch(mut self, channel: usize, on: bool) -> Result<Self, EmpirBusError> {
        let id = ChannelId::switch(channel)?;
        self.switches[id.index()] = on;
        Ok(self)
    }

    pub fn switch_bits(&self) -> SwitchBits {
        SwitchBits::from_switches(&self.switches)
    }

    /// Checks the instance and the raw dimmer levels against the wire ranges
    pub fn validate(&self) -> Result<(), EmpirBusError> {
        validate_instance(self.instance)?;
        for (channel, raw) in self.dimmers.iter().enumerate() {
            validate_dimmer(channel, *raw)?;
        }
        Ok(())
    }

    /// Every channel of this state with its published path
    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, ChannelReading)> + '_ {
        let dimmers = self.dimmers.iter().enumerate().filter_map(|(i, raw)| {
            ChannelId::new(ChannelKind::Dimmer, i)
                .ok()
                .map(|id| (id, ChannelReading::Dimmer(raw_to_ratio(*raw))))
        });
        let switches = self.switches.iter().enumerate().filter_map(|(i, on)| {
            ChannelId::new(ChannelKind::Switch, i)
                .ok()
                .map(|id| (id, ChannelReading::Switch(*on)))
        });
        dimmers.chain(switches)
    }
}

/// Value of a single channel read from a decoded state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelReading {
    Dimmer(f64),
    Switch(bool),
}

fn validate_instance(instance: u8) -> Result<(), EmpirBusError> {
    if instance > MAX_INSTANCE {
        return Err(EmpirBusError::OutOfRangeInstance(instance));
    }
    Ok(())
}

fn validate_dimmer(channel: usize, raw: u16) -> Result<(), EmpirBusError> {
    if raw > DIMMER_FULL_SCALE {
        return Err(EmpirBusError::OutOfRangeDimmer {
            channel,
            value: raw_to_ratio(raw),
        });
    }
    Ok(())
}

/// Fields of a payload before range validation
struct RawPayload {
    tag: [u8; 2],
    instance: u8,
    dimmers: [u16; DIMMER_COUNT],
    switches: u8,
}

fn parse_payload(input: &[u8]) -> IResult<&[u8], RawPayload> {
    let (input, tag) = take(2usize)(input)?;
    let (input, instance) = be_u8(input)?;
    let (input, dimmer0) = le_u16(input)?;
    let (input, dimmer1) = le_u16(input)?;
    let (input, switches) = be_u8(input)?;
    Ok((
        input,
        RawPayload {
            tag: [tag[0], tag[1]],
            instance,
            dimmers: [dimmer0, dimmer1],
            switches,
        },
    ))
}

fn parse_exact(payload: &[u8]) -> Result<RawPayload, EmpirBusError> {
    if payload.len() != EMPIRBUS_PAYLOAD_LEN {
        return Err(EmpirBusError::MalformedFrame { len: payload.len() });
    }
    let (_, raw) = parse_payload(payload)
        .map_err(|_| EmpirBusError::MalformedFrame { len: payload.len() })?;
    Ok(raw)
}

fn into_state(raw: RawPayload) -> Result<ModuleState, EmpirBusError> {
    let state = ModuleState {
        instance: raw.instance,
        dimmers: raw.dimmers,
        switches: SwitchBits::from_bits_retain(raw.switches).to_switches(),
    };
    state.validate()?;
    Ok(state)
}

/// Decodes an 8-byte EmpirBus payload.
///
/// The header bytes 0-1 are not inspected; use [`decode_strict`] to reject
/// payloads whose header differs from `30 99`.
pub fn decode(payload: &[u8]) -> Result<ModuleState, EmpirBusError> {
    into_state(parse_exact(payload)?)
}

/// Decodes an 8-byte EmpirBus payload, requiring the canonical header tag.
pub fn decode_strict(payload: &[u8]) -> Result<ModuleState, EmpirBusError> {
    let raw = parse_exact(payload)?;
    if raw.tag != EMPIRBUS_TAG {
        return Err(EmpirBusError::UnexpectedTag { found: raw.tag });
    }
    into_state(raw)
}

/// Encodes a state into the 8-byte EmpirBus payload.
///
/// Always writes the canonical header, so `encode(decode(p)) == p` for any
/// well-formed payload carrying that header.
pub fn encode(state: &ModuleState) -> Result<[u8; EMPIRBUS_PAYLOAD_LEN], EmpirBusError> {
    state.validate()?;

    let mut out = [0u8; EMPIRBUS_PAYLOAD_LEN];
    {
        let mut buf = &mut out[..];
        buf.put_slice(&EMPIRBUS_TAG);
        buf.put_u8(state.instance);
        for raw in state.dimmers {
            buf.put_u16_le(raw);
        }
        buf.put_u8(state.switch_bits().bits());
    }
    Ok(out)
}

/// Splits the proprietary header (bytes 0-1) into manufacturer code and
/// industry code.
pub fn proprietary_header(tag: [u8; 2]) -> (u16, u8) {
    let word = u16::from_le_bytes(tag);
    let manufacturer = word & MANUFACTURER_CODE_MASK;
    let industry = ((word >> INDUSTRY_CODE_SHIFT) & INDUSTRY_CODE_MASK) as u8;
    (manufacturer, industry)
}
