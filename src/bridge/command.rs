//! Outbound command requests: `<bus>/<channel>/<state>`.

use std::fmt;

use crate::error::EmpirBusError;
use crate::nxt::channels::{ratio_to_raw, ChannelId, ChannelKind};
use crate::nxt::frame::ModuleState;

/// Requested value for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestedState {
    Switch(bool),
    /// Dimmer level as a ratio 0.0..=1.0
    Level(f64),
}

impl fmt::Display for RequestedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedState::Switch(true) => f.write_str("on"),
            RequestedState::Switch(false) => f.write_str("off"),
            RequestedState::Level(ratio) => write!(f, "{ratio}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub instance: u8,
    pub channel: ChannelId,
    pub state: RequestedState,
}

impl Command {
    /// Checks that the requested state suits the channel kind and range
    pub fn new(instance: u8, channel: ChannelId, state: RequestedState) -> Result<Self, EmpirBusError> {
        // instance range is checked by ModuleState::new
        ModuleState::new(instance)?;
        match (channel.kind(), state) {
            (ChannelKind::Switch, RequestedState::Switch(_)) => {}
            (ChannelKind::Dimmer, RequestedState::Level(ratio)) => {
                ratio_to_raw(channel.index(), ratio)?;
            }
            (kind, state) => {
                return Err(EmpirBusError::InvalidCommand(format!(
                    "state {state} does not apply to {} channel {channel}",
                    kind.path_segment()
                )));
            }
        }
        Ok(Self {
            instance,
            channel,
            state,
        })
    }

    /// Parses the three textual command fields.
    ///
    /// `bus` is the instance number, `channel` e.g. `switch3` or `dimmers.1`,
    /// `state` one of `on`/`off`/`true`/`false`/`1`/`0` for switches and a
    /// ratio (`0.5`), a percentage (`50%`) or `on`/`off` for dimmers.
    pub fn parse(bus: &str, channel: &str, state: &str) -> Result<Self, EmpirBusError> {
        let instance = bus
            .trim()
            .parse::<u8>()
            .map_err(|_| EmpirBusError::InvalidCommand(format!("bus {bus:?} is not an instance number")))?;
        let channel: ChannelId = channel.parse()?;
        let state = match channel.kind() {
            ChannelKind::Switch => RequestedState::Switch(parse_switch_state(state)?),
            ChannelKind::Dimmer => RequestedState::Level(parse_level(state)?),
        };
        Self::new(instance, channel, state)
    }

    /// Merges this command into the full state of its instance
    pub fn apply(&self, base: ModuleState) -> Result<ModuleState, EmpirBusError> {
        if base.instance != self.instance {
            return Err(EmpirBusError::InvalidCommand(format!(
                "command for instance {} applied to instance {}",
                self.instance, base.instance
            )));
        }
        match self.state {
            RequestedState::Switch(on) => base.with_switch(self.channel.index(), on),
            RequestedState::Level(ratio) => base.with_dimmer_ratio(self.channel.index(), ratio),
        }
    }
}

fn parse_switch_state(text: &str) -> Result<bool, EmpirBusError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(EmpirBusError::InvalidCommand(format!("switch state {text:?}"))),
    }
}

fn parse_level(text: &str) -> Result<f64, EmpirBusError> {
    let text = text.trim().to_ascii_lowercase();
    let invalid = || EmpirBusError::InvalidCommand(format!("dimmer state {text:?}"));
    match text.as_str() {
        "on" => Ok(1.0),
        "off" => Ok(0.0),
        _ => {
            if let Some(percent) = text.strip_suffix('%') {
                let percent: f64 = percent.trim().parse().map_err(|_| invalid())?;
                Ok(percent / 100.0)
            } else {
                text.parse().map_err(|_| invalid())
            }
        }
    }
}
