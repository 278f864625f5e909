//! Channel addressing for EmpirBus NXT modules.
//!
//! A Data Model 2 instance exposes two dimmer channels and eight switch
//! channels. Channels are published under
//! `electrical.empirBusNxt.<instance>.<dimmers|switches>.<index>.state`.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::constants::{DIMMER_COUNT, DIMMER_FULL_SCALE, PATH_ROOT, SWITCH_COUNT};
use crate::error::EmpirBusError;
use crate::util::hex::parse_hex_lenient;

bitflags! {
    /// Packed switch byte (payload byte 7). Bit *i* is channel *i*, bit 0 is
    /// the least significant.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SwitchBits: u8 {
        const CH0 = 0b0000_0001;
        const CH1 = 0b0000_0010;
        const CH2 = 0b0000_0100;
        const CH3 = 0b0000_1000;
        const CH4 = 0b0001_0000;
        const CH5 = 0b0010_0000;
        const CH6 = 0b0100_0000;
        const CH7 = 0b1000_0000;
    }
}

impl SwitchBits {
    /// Flag for a single channel; `None` above channel 7
    pub fn channel(index: usize) -> Option<Self> {
        (index < SWITCH_COUNT).then(|| Self::from_bits_retain(1 << index))
    }

    /// Pack eight booleans, channel *i* into bit *i*
    pub fn from_switches(switches: &[bool; SWITCH_COUNT]) -> Self {
        switches
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(Self::empty(), |acc, (i, _)| acc | Self::from_bits_retain(1 << i))
    }

    /// Unpack into eight booleans, each channel independent of the others
    pub fn to_switches(self) -> [bool; SWITCH_COUNT] {
        std::array::from_fn(|i| self.bits() & (1 << i) != 0)
    }

    /// Parse one hex byte such as `0x05` or `a0`. More than one byte is an
    /// error rather than a truncation.
    pub fn from_hex(text: &str) -> Result<Self, EmpirBusError> {
        let bytes = parse_hex_lenient(text)
            .map_err(|err| EmpirBusError::InvalidCommand(format!("switch bits {text:?}: {err}")))?;
        match bytes.as_slice() {
            [bits] => Ok(Self::from_bits_retain(*bits)),
            _ => Err(EmpirBusError::InvalidCommand(format!(
                "switch bits {text:?} must be a single byte, got {}",
                bytes.len()
            ))),
        }
    }
}

/// Categorical switch value as published ("on"/"off")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    Off,
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }
}

impl From<SwitchState> for bool {
    fn from(state: SwitchState) -> Self {
        state == SwitchState::On
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::On => f.write_str("on"),
            SwitchState::Off => f.write_str("off"),
        }
    }
}

/// Kind of channel, also the path segment it is published under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Dimmer,
    Switch,
}

impl ChannelKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            ChannelKind::Dimmer => "dimmers",
            ChannelKind::Switch => "switches",
        }
    }

    /// Number of channels of this kind per instance
    pub fn count(self) -> usize {
        match self {
            ChannelKind::Dimmer => DIMMER_COUNT,
            ChannelKind::Switch => SWITCH_COUNT,
        }
    }
}

/// A validated channel address inside one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    kind: ChannelKind,
    index: usize,
}

impl ChannelId {
    pub fn new(kind: ChannelKind, index: usize) -> Result<Self, EmpirBusError> {
        if index >= kind.count() {
            return Err(EmpirBusError::UnknownChannel(format!(
                "{}.{index}",
                kind.path_segment()
            )));
        }
        Ok(Self { kind, index })
    }

    pub fn dimmer(index: usize) -> Result<Self, EmpirBusError> {
        Self::new(ChannelKind::Dimmer, index)
    }

    pub fn switch(index: usize) -> Result<Self, EmpirBusError> {
        Self::new(ChannelKind::Switch, index)
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Full published key path of this channel on `instance`
    pub fn path(&self, instance: u8) -> String {
        channel_path(instance, self.kind, self.index)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind.path_segment(), self.index)
    }
}

/// Accepts `switches.3`, `switch3`, `dimmers.1` and `dimmer1` (case-insensitive).
impl FromStr for ChannelId {
    type Err = EmpirBusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (kind, rest) = if let Some(rest) = lower.strip_prefix("switches") {
            (ChannelKind::Switch, rest)
        } else if let Some(rest) = lower.strip_prefix("switch") {
            (ChannelKind::Switch, rest)
        } else if let Some(rest) = lower.strip_prefix("dimmers") {
            (ChannelKind::Dimmer, rest)
        } else if let Some(rest) = lower.strip_prefix("dimmer") {
            (ChannelKind::Dimmer, rest)
        } else {
            return Err(EmpirBusError::UnknownChannel(s.to_string()));
        };

        let digits = rest.strip_prefix('.').unwrap_or(rest);
        let index = digits
            .parse::<usize>()
            .map_err(|_| EmpirBusError::UnknownChannel(s.to_string()))?;
        Self::new(kind, index)
    }
}

/// Build `electrical.empirBusNxt.<instance>.<kind>.<index>.state`
pub fn channel_path(instance: u8, kind: ChannelKind, index: usize) -> String {
    format!("{PATH_ROOT}.{instance}.{}.{index}.state", kind.path_segment())
}

/// Raw wire level (0..=1000) to ratio (0.0..=1.0)
pub fn raw_to_ratio(raw: u16) -> f64 {
    f64::from(raw) / f64::from(DIMMER_FULL_SCALE)
}

/// Ratio to raw wire level, a single multiply by 1000 and round
pub fn ratio_to_raw(channel: usize, ratio: f64) -> Result<u16, EmpirBusError> {
    let scaled = (ratio * f64::from(DIMMER_FULL_SCALE)).round();
    if !scaled.is_finite() || scaled < 0.0 || scaled > f64::from(DIMMER_FULL_SCALE) {
        return Err(EmpirBusError::OutOfRangeDimmer {
            channel,
            value: ratio,
        });
    }
    Ok(scaled as u16)
}
