//! Path/value updates published for decoded module states.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::nxt::channels::SwitchState;
use crate::nxt::frame::{ChannelReading, ModuleState};

/// Published value of one channel: a ratio for dimmers, "on"/"off" for switches
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Ratio(f64),
    Switch(SwitchState),
}

impl From<ChannelReading> for ChannelValue {
    fn from(reading: ChannelReading) -> Self {
        match reading {
            ChannelReading::Dimmer(ratio) => ChannelValue::Ratio(ratio),
            ChannelReading::Switch(on) => ChannelValue::Switch(on.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: String,
    pub value: ChannelValue,
}

/// One update: every channel of one instance, stamped at publish time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub values: Vec<PathValue>,
}

#[derive(Serialize)]
struct Delta<'a> {
    updates: [&'a StateUpdate; 1],
}

impl StateUpdate {
    pub fn from_state(state: &ModuleState, timestamp: DateTime<Utc>) -> Self {
        let values = state
            .channels()
            .map(|(channel, reading)| PathValue {
                path: channel.path(state.instance),
                value: reading.into(),
            })
            .collect();
        Self { timestamp, values }
    }

    /// Value published for `path`
    pub fn get(&self, path: &str) -> Option<&ChannelValue> {
        self.values.iter().find(|v| v.path == path).map(|v| &v.value)
    }

    /// `{"updates":[{"timestamp":..,"values":[..]}]}` envelope
    pub fn to_delta(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(Delta { updates: [self] })
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
